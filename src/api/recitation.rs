//! Recitation session tracking and progress.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use uuid::Uuid;

use super::auth::AuthUser;
use super::routes::AppState;
use super::types::{FinishSessionRequest, LimitQuery, RecordMistakeRequest, StartSessionRequest};
use super::{store_err, ApiError};
use crate::store::{Mistake, Progress, RecitationSession, RecitationStats};

const DEFAULT_LIST: usize = 20;
const MAX_LIST: usize = 200;

pub async fn start_session(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<StartSessionRequest>,
) -> Result<Json<RecitationSession>, ApiError> {
    let session = state
        .store
        .start_session(auth.id, req.surah, req.from_ayah, req.to_ayah, req.mode)
        .await
        .map_err(store_err)?;
    Ok(Json(session))
}

pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<RecitationSession>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST).clamp(1, MAX_LIST);
    let sessions = state
        .store
        .list_sessions(auth.id, limit)
        .await
        .map_err(store_err)?;
    Ok(Json(sessions))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<RecitationSession>, ApiError> {
    let session = state
        .store
        .get_session(auth.id, id)
        .await
        .map_err(store_err)?;
    Ok(Json(session))
}

pub async fn record_mistake(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<RecordMistakeRequest>,
) -> Result<Json<Mistake>, ApiError> {
    let mistake = state
        .store
        .record_mistake(auth.id, id, req.ayah, req.kind, req.note)
        .await
        .map_err(store_err)?;
    Ok(Json(mistake))
}

pub async fn finish_session(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    body: Option<Json<FinishSessionRequest>>,
) -> Result<Json<RecitationSession>, ApiError> {
    let req = body.map(|Json(b)| b).unwrap_or_default();
    let session = state
        .store
        .finish_session(auth.id, id, req.self_rating)
        .await
        .map_err(store_err)?;
    Ok(Json(session))
}

pub async fn abandon_session(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<RecitationSession>, ApiError> {
    let session = state
        .store
        .abandon_session(auth.id, id)
        .await
        .map_err(store_err)?;
    Ok(Json(session))
}

pub async fn progress(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Progress>, ApiError> {
    let progress = state.store.progress(auth.id).await.map_err(store_err)?;
    Ok(Json(progress))
}

pub async fn stats(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<RecitationStats>, ApiError> {
    let stats = state
        .store
        .recitation_stats(auth.id)
        .await
        .map_err(store_err)?;
    Ok(Json(stats))
}
