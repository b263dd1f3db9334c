//! Records persisted by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::quiz::{Difficulty, GradeReport, QuizKind, QuizQuestion};

/// Generates `as_str` / `parse` for a fieldless enum stored as TEXT.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }

            pub fn parse(s: &str) -> Option<Self> {
                match s {
                    $($text => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

// ==================== Users ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

text_enum!(UserRole { User => "user", Admin => "admin" });

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub daily_goal_ayahs: u32,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: Option<String>,
    pub role: UserRole,
}

/// Partial profile update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub daily_goal_ayahs: Option<u32>,
}

// ==================== Feedback ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackCategory {
    Bug,
    Feature,
    Content,
    General,
}

text_enum!(FeedbackCategory {
    Bug => "bug",
    Feature => "feature",
    Content => "content",
    General => "general",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackStatus {
    Open,
    Reviewed,
    Resolved,
}

text_enum!(FeedbackStatus {
    Open => "open",
    Reviewed => "reviewed",
    Resolved => "resolved",
});

#[derive(Debug, Clone, Serialize)]
pub struct Feedback {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category: FeedbackCategory,
    pub rating: u8,
    pub message: String,
    pub status: FeedbackStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==================== Quizzes ====================

#[derive(Debug, Clone)]
pub struct StoredQuiz {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: QuizKind,
    pub surah: u16,
    pub from_ayah: u16,
    pub to_ayah: u16,
    pub difficulty: Difficulty,
    pub questions: Vec<QuizQuestion>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizAttempt {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub user_id: Uuid,
    pub kind: QuizKind,
    pub surah: u16,
    pub correct: usize,
    pub total: usize,
    pub percentage: f64,
    pub report: GradeReport,
    pub created_at: DateTime<Utc>,
}

// ==================== Recitation ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// Learning new ayahs; a clean session marks them memorized
    Memorize,
    /// Revising ayahs already memorized
    Revise,
}

text_enum!(SessionMode { Memorize => "memorize", Revise => "revise" });

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Abandoned,
}

text_enum!(SessionStatus {
    InProgress => "in_progress",
    Completed => "completed",
    Abandoned => "abandoned",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MistakeKind {
    Omission,
    Addition,
    Substitution,
    Tajweed,
    Hesitation,
}

text_enum!(MistakeKind {
    Omission => "omission",
    Addition => "addition",
    Substitution => "substitution",
    Tajweed => "tajweed",
    Hesitation => "hesitation",
});

#[derive(Debug, Clone, Serialize)]
pub struct Mistake {
    pub id: i64,
    pub ayah: u16,
    pub kind: MistakeKind,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecitationSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub surah: u16,
    pub from_ayah: u16,
    pub to_ayah: u16,
    pub mode: SessionMode,
    pub status: SessionStatus,
    pub self_rating: Option<u8>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_secs: Option<i64>,
    pub mistakes: Vec<Mistake>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SurahProgress {
    pub surah: u16,
    pub name: &'static str,
    pub memorized: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Progress {
    pub memorized_ayahs: u32,
    pub total_ayahs: u32,
    /// Share of the whole mushaf memorized, one decimal place.
    pub percentage: f64,
    pub surahs: Vec<SurahProgress>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MistakeCounts {
    pub omission: u32,
    pub addition: u32,
    pub substitution: u32,
    pub tajweed: u32,
    pub hesitation: u32,
}

impl MistakeCounts {
    pub fn add(&mut self, kind: MistakeKind, n: u32) {
        let slot = match kind {
            MistakeKind::Omission => &mut self.omission,
            MistakeKind::Addition => &mut self.addition,
            MistakeKind::Substitution => &mut self.substitution,
            MistakeKind::Tajweed => &mut self.tajweed,
            MistakeKind::Hesitation => &mut self.hesitation,
        };
        *slot = slot.saturating_add(n);
    }

    pub fn total(&self) -> u32 {
        self.omission + self.addition + self.substitution + self.tajweed + self.hesitation
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RecitationStats {
    pub total_sessions: u32,
    pub completed_sessions: u32,
    pub ayahs_recited: u32,
    pub total_duration_secs: i64,
    pub mistakes: MistakeCounts,
    pub current_streak_days: u32,
}
