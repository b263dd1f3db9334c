//! Profile endpoints.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};

use super::auth::AuthUser;
use super::routes::AppState;
use super::types::PublicProfile;
use super::{store_err, ApiError};
use crate::store::{ProfileUpdate, User};

pub async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<User>, ApiError> {
    let user = state.store.get_user(auth.id).await.map_err(store_err)?;
    Ok(Json(user))
}

pub async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .store
        .update_profile(auth.id, update)
        .await
        .map_err(store_err)?;
    Ok(Json(user))
}

pub async fn delete_me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_user(auth.id).await.map_err(store_err)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_public_profile(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<PublicProfile>, ApiError> {
    let user = state
        .store
        .find_user_by_username(&username)
        .await
        .map_err(store_err)?
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("User {} not found", username)))?;

    let progress = state.store.progress(user.id).await.map_err(store_err)?;
    let stats = state
        .store
        .recitation_stats(user.id)
        .await
        .map_err(store_err)?;

    Ok(Json(PublicProfile {
        username: user.username,
        display_name: user.display_name,
        bio: user.bio,
        role: user.role,
        joined_at: user.created_at,
        memorized_ayahs: progress.memorized_ayahs,
        memorized_percentage: progress.percentage,
        completed_sessions: stats.completed_sessions,
        ayahs_recited: stats.ayahs_recited,
        current_streak_days: stats.current_streak_days,
    }))
}
