//! Mutashabihat: finding ayahs whose wording closely resembles another ayah.
//!
//! Score is a blend of word-bigram Jaccard (phrase order) and word Jaccard
//! (shared vocabulary) over normalised text. Single-word ayahs have no bigrams,
//! so they are scored on words alone.

use serde::Serialize;
use std::collections::HashSet;

use super::corpus::QuranCorpus;
use super::{AyahRef, QuranError};

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.35;

const BIGRAM_WEIGHT: f64 = 0.6;
const WORD_WEIGHT: f64 = 0.4;

#[derive(Debug, Clone, Serialize)]
pub struct SimilarAyah {
    pub surah: u16,
    pub ayah: u16,
    pub text: String,
    pub score: f64,
}

fn jaccard<T: Eq + std::hash::Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

struct Shingles<'a> {
    words: HashSet<&'a str>,
    bigrams: HashSet<(&'a str, &'a str)>,
}

impl<'a> Shingles<'a> {
    fn of(normalized: &'a str) -> Self {
        let list: Vec<&str> = normalized.split(' ').filter(|w| !w.is_empty()).collect();
        Self {
            words: list.iter().copied().collect(),
            bigrams: list.windows(2).map(|w| (w[0], w[1])).collect(),
        }
    }

    fn similarity(&self, other: &Shingles<'_>) -> f64 {
        let words = jaccard(&self.words, &other.words);
        if self.bigrams.is_empty() || other.bigrams.is_empty() {
            return words;
        }
        BIGRAM_WEIGHT * jaccard(&self.bigrams, &other.bigrams) + WORD_WEIGHT * words
    }
}

impl QuranCorpus {
    /// Ayahs scoring at least `threshold` against `target`, best first.
    pub fn similar_ayahs(
        &self,
        target: AyahRef,
        threshold: f64,
        limit: usize,
    ) -> Result<Vec<SimilarAyah>, QuranError> {
        self.text(target)?;
        let target_norm = &self.normalized[usize::from(target.surah) - 1]
            .as_ref()
            .ok_or(QuranError::TextUnavailable {
                surah: target.surah,
                ayah: target.ayah,
            })?[usize::from(target.ayah) - 1];
        let target_shingles = Shingles::of(target_norm);

        let mut matches = Vec::new();
        for (s_idx, surah_norm) in self.normalized.iter().enumerate() {
            let Some(norm) = surah_norm else { continue };
            for (a_idx, candidate) in norm.iter().enumerate() {
                let r = AyahRef::new((s_idx + 1) as u16, (a_idx + 1) as u16);
                if r == target {
                    continue;
                }
                let score = target_shingles.similarity(&Shingles::of(candidate));
                if score >= threshold {
                    matches.push((r, score));
                }
            }
        }

        matches.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        matches.truncate(limit);

        matches
            .into_iter()
            .map(|(r, score)| {
                Ok(SimilarAyah {
                    surah: r.surah,
                    ayah: r.ayah,
                    text: self.text(r)?.to_string(),
                    score: (score * 1000.0).round() / 1000.0,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quran::corpus::tests::fixture;

    #[test]
    fn test_finds_parallel_opening() {
        let corpus = fixture();
        let similar = corpus
            .similar_ayahs(AyahRef::new(113, 1), 0.5, 5)
            .unwrap();
        assert_eq!(similar.len(), 1);
        assert_eq!((similar[0].surah, similar[0].ayah), (114, 1));
        assert!((similar[0].score - 0.54).abs() < 1e-9);
    }

    #[test]
    fn test_sorted_and_limited() {
        let corpus = fixture();
        let similar = corpus.similar_ayahs(AyahRef::new(113, 3), 0.1, 10).unwrap();
        assert!(!similar.is_empty());
        for pair in similar.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert!(similar.iter().all(|s| (s.surah, s.ayah) != (113, 3)));

        let limited = corpus.similar_ayahs(AyahRef::new(113, 3), 0.1, 1).unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_basmala_matches_ar_rahman_ar_rahim() {
        let corpus = fixture();
        let similar = corpus
            .similar_ayahs(AyahRef::new(1, 1), DEFAULT_SIMILARITY_THRESHOLD, 5)
            .unwrap();
        assert_eq!((similar[0].surah, similar[0].ayah), (1, 3));
    }

    #[test]
    fn test_unloaded_target() {
        let corpus = fixture();
        assert!(matches!(
            corpus.similar_ayahs(AyahRef::new(2, 1), 0.3, 5),
            Err(QuranError::TextUnavailable { .. })
        ));
    }
}
