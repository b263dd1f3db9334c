//! JWT auth for the API.
//!
//! - Clients register or log in and receive a JWT valid for `JWT_TTL_DAYS`
//! - Protected endpoints require `Authorization: Bearer <jwt>`
//! - With `DEV_MODE=true` every request acts as a local `dev` user
//!
//! # Security notes
//! - Use a strong `JWT_SECRET` in production.
//! - Tokens stay valid until expiry; deleting the account revokes them because
//!   the middleware checks the user still exists.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Extension, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use super::routes::AppState;
use super::types::{AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest};
use super::{credential_err, store_err, ApiError};
use crate::password::{
    hash_password, validate_email, validate_password, validate_username, verify_login,
};
use crate::store::{NewUser, StoreError, User, UserRole};

pub const DEV_USERNAME: &str = "dev";

const INVALID_LOGIN: &str = "Invalid username or password";

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct Claims {
    /// User id
    sub: String,
    /// Username (for display/auditing)
    #[serde(default)]
    usr: String,
    #[serde(default)]
    role: String,
    /// Issued-at unix seconds
    iat: i64,
    /// Expiration unix seconds
    exp: i64,
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

fn issue_jwt(secret: &str, ttl_days: i64, user: &User) -> anyhow::Result<(String, i64)> {
    let now = Utc::now();
    let exp = now + Duration::days(ttl_days.max(1));
    let claims = Claims {
        sub: user.id.to_string(),
        usr: user.username.clone(),
        role: user.role.as_str().to_string(),
        iat: now.timestamp(),
        exp: exp.timestamp(),
    };
    let token = jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok((token, claims.exp))
}

fn verify_jwt(token: &str, secret: &str) -> anyhow::Result<Claims> {
    let validation = Validation::default();
    let token_data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;
    Ok(token_data.claims)
}

// PBKDF2 runs off the async workers.
async fn hash_blocking(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(hashing_failed)
}

async fn verify_blocking(password: String, stored: Option<String>) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || verify_login(&password, stored.as_deref()))
        .await
        .map_err(hashing_failed)
}

fn hashing_failed(e: tokio::task::JoinError) -> ApiError {
    tracing::error!("Password hashing task failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Password hashing failed".to_string(),
    )
}

fn token_response(state: &AppState, user: User) -> Result<Json<AuthResponse>, ApiError> {
    let secret = state.config.auth.jwt_secret.as_deref().ok_or_else(|| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "JWT_SECRET not configured".to_string(),
        )
    })?;
    let (token, exp) = issue_jwt(secret, state.config.auth.jwt_ttl_days, &user)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(AuthResponse { token, exp, user }))
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let username = req.username.trim();
    let email = req.email.trim().to_lowercase();
    validate_username(username).map_err(credential_err)?;
    validate_email(&email).map_err(credential_err)?;
    validate_password(&req.password).map_err(credential_err)?;

    let role = if state.config.auth.is_admin_username(username) {
        UserRole::Admin
    } else {
        UserRole::User
    };
    let display_name = req
        .display_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let password_hash = hash_blocking(req.password).await?;
    let user = state
        .store
        .create_user(NewUser {
            username: username.to_string(),
            email,
            password_hash,
            display_name,
            role,
        })
        .await
        .map_err(store_err)?;

    token_response(&state, user)
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let login = req.login.trim();
    if login.is_empty() {
        return Err((StatusCode::UNAUTHORIZED, "Username required".to_string()));
    }

    // Same message for unknown user and wrong password to prevent username enumeration.
    let user = state
        .store
        .find_user_by_login(login)
        .await
        .map_err(store_err)?;
    // Unknown accounts are checked against a dummy hash at full cost.
    let stored = user.as_ref().map(|u| u.password_hash.clone());
    let valid = verify_blocking(req.password, stored).await?;

    match user {
        Some(user) if valid => {
            tracing::info!(user = %user.id, "Login succeeded");
            token_response(&state, user)
        }
        _ => Err((StatusCode::UNAUTHORIZED, INVALID_LOGIN.to_string())),
    }
}

pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    let user = state.store.get_user(auth.id).await.map_err(store_err)?;
    if !verify_blocking(req.old_password, Some(user.password_hash.clone())).await? {
        return Err((
            StatusCode::UNAUTHORIZED,
            "Current password is incorrect".to_string(),
        ));
    }
    validate_password(&req.new_password).map_err(credential_err)?;

    let password_hash = hash_blocking(req.new_password).await?;
    state
        .store
        .set_password_hash(user.id, &password_hash)
        .await
        .map_err(store_err)?;
    tracing::info!(user = %user.id, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}

/// Reject non-admins with 403.
pub fn require_admin(user: &AuthUser) -> Result<(), ApiError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err((StatusCode::FORBIDDEN, "Admin access required".to_string()))
    }
}

/// The local user every request acts as in dev mode, created on first use.
async fn dev_user(state: &AppState) -> Result<User, ApiError> {
    if let Some(user) = state
        .store
        .find_user_by_username(DEV_USERNAME)
        .await
        .map_err(store_err)?
    {
        return Ok(user);
    }
    let password_hash = hash_blocking(Uuid::new_v4().to_string()).await?;
    let created = state
        .store
        .create_user(NewUser {
            username: DEV_USERNAME.to_string(),
            email: "dev@localhost".to_string(),
            password_hash,
            display_name: Some("Developer".to_string()),
            role: UserRole::Admin,
        })
        .await;
    match created {
        Ok(user) => Ok(user),
        // Lost a race with a concurrent first request
        Err(StoreError::Conflict(_)) => state
            .store
            .find_user_by_username(DEV_USERNAME)
            .await
            .map_err(store_err)?
            .ok_or_else(|| store_err(StoreError::NotFound(DEV_USERNAME.to_string()))),
        Err(e) => Err(store_err(e)),
    }
}

pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    // Dev mode => no auth checks.
    if state.config.dev_mode {
        return match dev_user(&state).await {
            Ok(user) => {
                req.extensions_mut().insert(AuthUser::from(&user));
                next.run(req).await
            }
            Err(e) => e.into_response(),
        };
    }

    // If auth isn't configured, fail closed in non-dev mode.
    let secret = match state.config.auth.jwt_secret.as_deref() {
        Some(s) => s,
        None => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "JWT_SECRET not configured",
            )
                .into_response();
        }
    };

    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    let token = auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
        .unwrap_or("");

    if token.is_empty() {
        return (StatusCode::UNAUTHORIZED, "Missing Authorization header").into_response();
    }

    let claims = match verify_jwt(token, secret) {
        Ok(claims) => claims,
        Err(_) => return (StatusCode::UNAUTHORIZED, "Invalid or expired token").into_response(),
    };
    let Ok(user_id) = Uuid::parse_str(&claims.sub) else {
        return (StatusCode::UNAUTHORIZED, "Invalid token subject").into_response();
    };

    // Role comes from the database, not the token, so demotions apply immediately.
    match state.store.get_user(user_id).await {
        Ok(user) => {
            req.extensions_mut().insert(AuthUser::from(&user));
            next.run(req).await
        }
        Err(StoreError::NotFound(_)) => {
            (StatusCode::UNAUTHORIZED, "Account no longer exists").into_response()
        }
        Err(e) => store_err(e).into_response(),
    }
}
