//! Surah/ayah lookup, text search and mutashabihat detection.
//!
//! Surah metadata is compiled in. Ayah text comes from an optional JSON corpus
//! (`QURAN_DATA_PATH`); surahs missing from the corpus still resolve, but their
//! text lookups report `TextUnavailable`.

mod corpus;
pub mod normalize;
mod similar;
pub mod surahs;

pub use corpus::{AyahText, CorpusFile, QuranCorpus};
pub use similar::{SimilarAyah, DEFAULT_SIMILARITY_THRESHOLD};
pub use surahs::{surah, Revelation, SurahInfo, SURAHS, SURAH_COUNT, TOTAL_AYAHS};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuranError {
    #[error("Surah {0} does not exist (expected 1-114)")]
    InvalidSurah(u16),

    #[error("Ayah {ayah} is out of range for surah {surah}")]
    InvalidAyah { surah: u16, ayah: u16 },

    #[error("Invalid ayah range {from}-{to} in surah {surah}")]
    InvalidRange { surah: u16, from: u16, to: u16 },

    #[error("Text for {surah}:{ayah} is not loaded")]
    TextUnavailable { surah: u16, ayah: u16 },

    #[error("Corpus does not match surah metadata: {0}")]
    CorpusMismatch(String),

    #[error("Failed to read corpus: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse corpus: {0}")]
    Json(#[from] serde_json::Error),
}

/// A `surah:ayah` reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AyahRef {
    pub surah: u16,
    pub ayah: u16,
}

impl AyahRef {
    pub fn new(surah: u16, ayah: u16) -> Self {
        Self { surah, ayah }
    }

    /// Validate this reference against the surah table.
    pub fn validate(self) -> Result<Self, QuranError> {
        let info = surah(self.surah).ok_or(QuranError::InvalidSurah(self.surah))?;
        if self.ayah == 0 || self.ayah > info.ayah_count {
            return Err(QuranError::InvalidAyah {
                surah: self.surah,
                ayah: self.ayah,
            });
        }
        Ok(self)
    }
}

impl std::fmt::Display for AyahRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.surah, self.ayah)
    }
}

/// Resolve an optional `from..=to` window inside a surah, defaulting to the whole surah.
pub fn resolve_range(
    surah_number: u16,
    from: Option<u16>,
    to: Option<u16>,
) -> Result<(u16, u16), QuranError> {
    let info = surah(surah_number).ok_or(QuranError::InvalidSurah(surah_number))?;
    let from = from.unwrap_or(1);
    let to = to.unwrap_or(info.ayah_count);
    if from == 0 || to < from || to > info.ayah_count {
        return Err(QuranError::InvalidRange {
            surah: surah_number,
            from,
            to,
        });
    }
    Ok((from, to))
}

/// The small corpus under `tests/fixtures`, for unit tests elsewhere in the crate.
#[cfg(test)]
pub(crate) fn corpus_fixture() -> QuranCorpus {
    corpus::tests::fixture()
}
