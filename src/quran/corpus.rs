//! Ayah text corpus loaded from JSON.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::normalize::normalize;
use super::surahs::{surah, SURAH_COUNT};
use super::{resolve_range, AyahRef, QuranError};

/// On-disk corpus format.
#[derive(Debug, Deserialize)]
pub struct CorpusFile {
    pub surahs: Vec<CorpusSurah>,
}

#[derive(Debug, Deserialize)]
pub struct CorpusSurah {
    pub number: u16,
    pub ayahs: Vec<CorpusAyah>,
}

#[derive(Debug, Deserialize)]
pub struct CorpusAyah {
    pub number: u16,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AyahText {
    pub surah: u16,
    pub ayah: u16,
    pub text: String,
}

/// Ayah texts indexed by surah, plus a normalised copy for matching.
#[derive(Debug, Default)]
pub struct QuranCorpus {
    pub(super) texts: Vec<Option<Vec<String>>>,
    pub(super) normalized: Vec<Option<Vec<String>>>,
}

impl QuranCorpus {
    /// A corpus with no text loaded.
    pub fn empty() -> Self {
        Self {
            texts: vec![None; usize::from(SURAH_COUNT)],
            normalized: vec![None; usize::from(SURAH_COUNT)],
        }
    }

    pub fn load(path: &Path) -> Result<Self, QuranError> {
        let contents = std::fs::read_to_string(path)?;
        let corpus = Self::from_json(&contents)?;
        tracing::info!(
            "Loaded Quran corpus from {} ({} surahs, {} ayahs)",
            path.display(),
            corpus.loaded_surahs(),
            corpus.loaded_ayahs()
        );
        Ok(corpus)
    }

    pub fn from_json(contents: &str) -> Result<Self, QuranError> {
        let file: CorpusFile = serde_json::from_str(contents)?;
        Self::from_file(file)
    }

    /// Build from a parsed file. Every surah present must be complete and in order.
    pub fn from_file(file: CorpusFile) -> Result<Self, QuranError> {
        let mut corpus = Self::empty();
        for s in file.surahs {
            let info = surah(s.number).ok_or(QuranError::InvalidSurah(s.number))?;
            let idx = usize::from(s.number) - 1;
            if corpus.texts[idx].is_some() {
                return Err(QuranError::CorpusMismatch(format!(
                    "surah {} appears twice",
                    s.number
                )));
            }
            if s.ayahs.len() != usize::from(info.ayah_count) {
                return Err(QuranError::CorpusMismatch(format!(
                    "surah {} has {} ayahs, expected {}",
                    s.number,
                    s.ayahs.len(),
                    info.ayah_count
                )));
            }
            for (i, ayah) in s.ayahs.iter().enumerate() {
                if usize::from(ayah.number) != i + 1 {
                    return Err(QuranError::CorpusMismatch(format!(
                        "surah {} ayah at position {} is numbered {}",
                        s.number,
                        i + 1,
                        ayah.number
                    )));
                }
            }
            let texts: Vec<String> = s.ayahs.into_iter().map(|a| a.text).collect();
            corpus.normalized[idx] = Some(texts.iter().map(|t| normalize(t)).collect());
            corpus.texts[idx] = Some(texts);
        }
        Ok(corpus)
    }

    pub fn is_loaded(&self, surah_number: u16) -> bool {
        surah_number >= 1
            && self
                .texts
                .get(usize::from(surah_number) - 1)
                .map_or(false, Option::is_some)
    }

    pub fn loaded_surahs(&self) -> usize {
        self.texts.iter().filter(|s| s.is_some()).count()
    }

    pub fn loaded_ayahs(&self) -> usize {
        self.texts.iter().flatten().map(Vec::len).sum()
    }

    /// Text of a single ayah.
    pub fn text(&self, r: AyahRef) -> Result<&str, QuranError> {
        let r = r.validate()?;
        self.texts[usize::from(r.surah) - 1]
            .as_ref()
            .map(|ayahs| ayahs[usize::from(r.ayah) - 1].as_str())
            .ok_or(QuranError::TextUnavailable {
                surah: r.surah,
                ayah: r.ayah,
            })
    }

    pub fn ayah(&self, r: AyahRef) -> Result<AyahText, QuranError> {
        Ok(AyahText {
            surah: r.surah,
            ayah: r.ayah,
            text: self.text(r)?.to_string(),
        })
    }

    pub fn range(
        &self,
        surah_number: u16,
        from: Option<u16>,
        to: Option<u16>,
    ) -> Result<Vec<AyahText>, QuranError> {
        let (from, to) = resolve_range(surah_number, from, to)?;
        (from..=to)
            .map(|n| self.ayah(AyahRef::new(surah_number, n)))
            .collect()
    }

    /// Diacritic-insensitive substring search, in mushaf order.
    pub fn search(&self, query: &str, limit: usize) -> Vec<AyahText> {
        let needle = normalize(query);
        if needle.is_empty() || limit == 0 {
            return Vec::new();
        }
        let mut hits = Vec::new();
        for (s_idx, surah_norm) in self.normalized.iter().enumerate() {
            let (Some(norm), Some(texts)) = (surah_norm, &self.texts[s_idx]) else {
                continue;
            };
            for (a_idx, ayah_norm) in norm.iter().enumerate() {
                if ayah_norm.contains(&needle) {
                    hits.push(AyahText {
                        surah: (s_idx + 1) as u16,
                        ayah: (a_idx + 1) as u16,
                        text: texts[a_idx].clone(),
                    });
                    if hits.len() >= limit {
                        return hits;
                    }
                }
            }
        }
        hits
    }
}
