//! HTTP API.
//!
//! ## Endpoints
//! - `GET /api/health`
//! - `POST /api/auth/register`, `POST /api/auth/login`, `POST /api/auth/password`
//! - `GET|PATCH|DELETE /api/me`, `GET /api/users/:username`
//! - `POST /api/feedback`, `GET /api/feedback/mine`, admin: `GET /api/feedback`, `PATCH /api/feedback/:id`
//! - `GET /api/quran/...` surah and ayah lookup, search, similar ayahs
//! - `POST /api/quizzes`, `GET /api/quizzes/:id`, `POST /api/quizzes/:id/submit`, `GET /api/quiz-attempts`
//! - `POST|GET /api/sessions`, `GET /api/sessions/:id` plus mistakes/finish/abandon
//! - `GET /api/progress`, `GET /api/stats`

pub mod auth;
mod feedback;
mod profile;
mod quiz;
mod quran;
mod recitation;
pub mod routes;
pub mod types;

pub use routes::{build_router, serve, AppState};

use axum::http::StatusCode;

use crate::password::CredentialError;
use crate::quiz::{GradeError, QuizError};
use crate::quran::QuranError;
use crate::store::StoreError;

pub(crate) type ApiError = (StatusCode, String);

pub(crate) fn store_err(e: StoreError) -> ApiError {
    let status = match &e {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::Conflict(_) => StatusCode::CONFLICT,
        StoreError::Invalid(_) => StatusCode::BAD_REQUEST,
        StoreError::Sqlite(_) | StoreError::Serialization(_) => {
            tracing::error!("Store failure: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal storage error".to_string(),
            );
        }
    };
    (status, e.to_string())
}

pub(crate) fn quran_err(e: QuranError) -> ApiError {
    let status = match &e {
        QuranError::InvalidSurah(_)
        | QuranError::InvalidAyah { .. }
        | QuranError::InvalidRange { .. } => StatusCode::BAD_REQUEST,
        QuranError::TextUnavailable { .. } => StatusCode::NOT_FOUND,
        QuranError::CorpusMismatch(_) | QuranError::Io(_) | QuranError::Json(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, e.to_string())
}

pub(crate) fn quiz_err(e: QuizError) -> ApiError {
    match e {
        QuizError::Quran(e) => quran_err(e),
        QuizError::InvalidRequest(_) | QuizError::NotEnoughMaterial(_) => {
            (StatusCode::BAD_REQUEST, e.to_string())
        }
        QuizError::LlmUnavailable => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
        QuizError::Llm(_) | QuizError::Parse(_) => {
            tracing::warn!("AI quiz generation failed: {}", e);
            (StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}

pub(crate) fn grade_err(e: GradeError) -> ApiError {
    (StatusCode::BAD_REQUEST, e.to_string())
}

pub(crate) fn credential_err(e: CredentialError) -> ApiError {
    (StatusCode::BAD_REQUEST, e.to_string())
}
