//! Feedback endpoints. Listing everything and triage are admin-only.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use uuid::Uuid;

use super::auth::{require_admin, AuthUser};
use super::routes::AppState;
use super::types::{FeedbackQuery, SetFeedbackStatusRequest, SubmitFeedbackRequest};
use super::{store_err, ApiError};
use crate::store::Feedback;

pub async fn submit(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<SubmitFeedbackRequest>,
) -> Result<Json<Feedback>, ApiError> {
    let feedback = state
        .store
        .create_feedback(auth.id, req.category, req.rating, &req.message)
        .await
        .map_err(store_err)?;
    Ok(Json(feedback))
}

pub async fn list_mine(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<Feedback>>, ApiError> {
    let items = state
        .store
        .list_feedback_for_user(auth.id)
        .await
        .map_err(store_err)?;
    Ok(Json(items))
}

pub async fn list_all(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<FeedbackQuery>,
) -> Result<Json<Vec<Feedback>>, ApiError> {
    require_admin(&auth)?;
    let items = state
        .store
        .list_all_feedback(query.status)
        .await
        .map_err(store_err)?;
    Ok(Json(items))
}

pub async fn set_status(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetFeedbackStatusRequest>,
) -> Result<Json<Feedback>, ApiError> {
    require_admin(&auth)?;
    let feedback = state
        .store
        .set_feedback_status(id, req.status)
        .await
        .map_err(store_err)?;
    tracing::info!(admin = %auth.id, feedback = %id, status = %req.status, "Feedback triaged");
    Ok(Json(feedback))
}
