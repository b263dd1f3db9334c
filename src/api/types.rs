//! Request and response bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::quiz::{Difficulty, GradeReport, QuestionView, QuizKind, SubmittedAnswer};
use crate::quran::SurahInfo;
use crate::store::{
    FeedbackCategory, FeedbackStatus, MistakeKind, SessionMode, StoredQuiz, User, UserRole,
};

// ==================== System ====================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub dev_mode: bool,
    pub database: bool,
    /// Number of surahs with ayah text available
    pub quran_surahs_loaded: usize,
    pub ai_quizzes: bool,
}

// ==================== Auth ====================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email
    #[serde(alias = "username", alias = "email")]
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    /// Expiry as unix seconds
    pub exp: i64,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

// ==================== Profiles ====================

#[derive(Debug, Serialize)]
pub struct PublicProfile {
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub role: UserRole,
    pub joined_at: DateTime<Utc>,
    pub memorized_ayahs: u32,
    pub memorized_percentage: f64,
    pub completed_sessions: u32,
    pub ayahs_recited: u32,
    pub current_streak_days: u32,
}

// ==================== Feedback ====================

#[derive(Debug, Deserialize)]
pub struct SubmitFeedbackRequest {
    pub category: FeedbackCategory,
    pub rating: u8,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct FeedbackQuery {
    #[serde(default)]
    pub status: Option<FeedbackStatus>,
}

#[derive(Debug, Deserialize)]
pub struct SetFeedbackStatusRequest {
    pub status: FeedbackStatus,
}

// ==================== Quran ====================

#[derive(Debug, Serialize)]
pub struct SurahResponse {
    #[serde(flatten)]
    pub info: SurahInfo,
    /// Whether ayah text for this surah is available
    pub text_available: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub from: Option<u16>,
    pub to: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SimilarQuery {
    pub threshold: Option<f64>,
    pub limit: Option<usize>,
}

// ==================== Quizzes ====================

#[derive(Debug, Serialize)]
pub struct QuizResponse {
    pub id: Uuid,
    pub kind: QuizKind,
    pub surah: u16,
    pub from_ayah: u16,
    pub to_ayah: u16,
    pub difficulty: Difficulty,
    pub questions: Vec<QuestionView>,
    pub created_at: DateTime<Utc>,
}

impl From<&StoredQuiz> for QuizResponse {
    fn from(quiz: &StoredQuiz) -> Self {
        Self {
            id: quiz.id,
            kind: quiz.kind,
            surah: quiz.surah,
            from_ayah: quiz.from_ayah,
            to_ayah: quiz.to_ayah,
            difficulty: quiz.difficulty,
            questions: quiz
                .questions
                .iter()
                .enumerate()
                .map(|(i, q)| q.view(i))
                .collect(),
            created_at: quiz.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    #[serde(default)]
    pub answers: Vec<SubmittedAnswer>,
}

#[derive(Debug, Serialize)]
pub struct SubmitQuizResponse {
    pub attempt_id: Uuid,
    #[serde(flatten)]
    pub report: GradeReport,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

// ==================== Recitation ====================

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub surah: u16,
    #[serde(default)]
    pub from_ayah: Option<u16>,
    #[serde(default)]
    pub to_ayah: Option<u16>,
    pub mode: SessionMode,
}

#[derive(Debug, Deserialize)]
pub struct RecordMistakeRequest {
    pub ayah: u16,
    pub kind: MistakeKind,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FinishSessionRequest {
    #[serde(default)]
    pub self_rating: Option<u8>,
}
