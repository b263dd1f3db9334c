//! Quiz endpoints: generate, fetch, submit, history.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use super::auth::AuthUser;
use super::routes::AppState;
use super::types::{LimitQuery, QuizResponse, SubmitQuizRequest, SubmitQuizResponse};
use super::{grade_err, quiz_err, quran_err, store_err, ApiError};
use crate::quiz::{grade, QuizRequest};
use crate::quran::resolve_range;
use crate::store::{QuizAttempt, StoredQuiz};

const DEFAULT_HISTORY: usize = 20;
const MAX_HISTORY: usize = 200;

pub async fn generate(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<QuizRequest>,
) -> Result<Json<QuizResponse>, ApiError> {
    let (from_ayah, to_ayah) =
        resolve_range(req.surah, req.from_ayah, req.to_ayah).map_err(quran_err)?;
    let questions = state.quiz.generate(&req).await.map_err(quiz_err)?;

    let quiz = StoredQuiz {
        id: Uuid::new_v4(),
        user_id: auth.id,
        kind: req.kind,
        surah: req.surah,
        from_ayah,
        to_ayah,
        difficulty: req.difficulty,
        questions,
        created_at: Utc::now(),
    };
    state.store.save_quiz(&quiz).await.map_err(store_err)?;

    tracing::info!(
        user = %auth.id,
        quiz = %quiz.id,
        kind = quiz.kind.as_str(),
        questions = quiz.questions.len(),
        "Quiz generated"
    );
    Ok(Json(QuizResponse::from(&quiz)))
}

pub async fn get_quiz(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuizResponse>, ApiError> {
    let quiz = state.store.get_quiz(id, auth.id).await.map_err(store_err)?;
    Ok(Json(QuizResponse::from(&quiz)))
}

pub async fn submit(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmitQuizRequest>,
) -> Result<Json<SubmitQuizResponse>, ApiError> {
    let quiz = state.store.get_quiz(id, auth.id).await.map_err(store_err)?;
    let report = grade(&quiz.questions, &req.answers).map_err(grade_err)?;
    let attempt = state
        .store
        .save_attempt(&quiz, &report)
        .await
        .map_err(store_err)?;
    Ok(Json(SubmitQuizResponse {
        attempt_id: attempt.id,
        report,
    }))
}

pub async fn list_attempts(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<QuizAttempt>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY).clamp(1, MAX_HISTORY);
    let attempts = state
        .store
        .list_attempts(auth.id, limit)
        .await
        .map_err(store_err)?;
    Ok(Json(attempts))
}
