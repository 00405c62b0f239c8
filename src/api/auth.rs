use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState};
use crate::constants::SESSION_USER_KEY;
use crate::db::PublicUser;
use crate::services::AuthError;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub favorite: Option<String>,
}

/// Username of the signed-in user, inserted by [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

// ============================================================================
// Middleware
// ============================================================================

/// Rejects requests without a session, and sessions whose user no longer exists.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Ok(Some(username)) = session.get::<String>(SESSION_USER_KEY).await else {
        return Ok((StatusCode::UNAUTHORIZED, "Unauthorized").into_response());
    };

    match state.auth().get_user_info(&username).await {
        Ok(_) => {}
        Err(AuthError::UserNotFound) => {
            let _ = session.flush().await;
            return Ok((StatusCode::UNAUTHORIZED, "Unauthorized").into_response());
        }
        Err(e) => return Err(e.into()),
    }

    tracing::Span::current().record("user_id", username.as_str());
    request.extensions_mut().insert(CurrentUser(username));
    Ok(next.run(request).await)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
/// Create an account and sign it in
pub async fn register(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<PublicUser>>, ApiError> {
    let user = state
        .auth()
        .register(&payload.username, &payload.password, payload.favorite)
        .await?;

    start_session(&session, &user.username).await?;

    Ok(Json(ApiResponse::success(user)))
}

/// POST /auth/login
/// Authenticate with username and password
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<PublicUser>>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let user = state
        .auth()
        .login(&payload.username, &payload.password)
        .await?;

    start_session(&session, &user.username).await?;
    tracing::info!("User logged in: {}", user.username);

    Ok(Json(ApiResponse::success(user)))
}

/// POST /auth/logout
/// Invalidate the current session
pub async fn logout(session: Session) -> impl IntoResponse {
    let _ = session.flush().await;
    (StatusCode::OK, "Logged out")
}

/// GET /auth/me
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<PublicUser>>, ApiError> {
    let username = get_session_username(&session).await?;
    let user = state.auth().get_user_info(&username).await?;
    Ok(Json(ApiResponse::success(user)))
}

// ============================================================================
// Helpers
// ============================================================================

async fn start_session(session: &Session, username: &str) -> Result<(), ApiError> {
    session
        .cycle_id()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;
    session
        .insert(SESSION_USER_KEY, username)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))
}

/// Get username from session, returns error if not authenticated
async fn get_session_username(session: &Session) -> Result<String, ApiError> {
    session
        .get::<String>(SESSION_USER_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))
}
