/**
 * Authentication Routes
 * Administrator login, credential validation, and the extractor that gates
 * every moderation route
 */
use axum::{
    extract::{rejection::JsonRejection, FromRequestParts, State},
    http::{request::Parts, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorResponse};
use crate::routes::json_body;
use crate::services::session::{self, extract_bearer_token, Claims};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub message: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
}

// ============================================================================
// Extractor
// ============================================================================

/// Proof that the request carries a valid administrator credential.
///
/// Put it first in a handler's arguments so the check runs before the body
/// is read.
#[derive(Debug, Clone)]
pub struct AdminSession(pub Claims);

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized("No token provided".to_string()))?;

        match state.sessions.verify(token) {
            Ok(claims) => Ok(AdminSession(claims)),
            Err(e) => {
                tracing::debug!("Token verification failed: {}", e);
                Err(AppError::Unauthorized("Invalid or expired token".to_string()))
            }
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/admin/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> impl IntoResponse {
    let payload = match json_body(payload) {
        Ok(payload) => payload,
        Err(e) => return e.into_response(),
    };

    if payload.username.is_empty() || payload.password.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Username and password are required")),
        )
            .into_response();
    }

    match session::login(
        state.admins.as_ref(),
        &state.sessions,
        &payload.username,
        &payload.password,
    )
    .await
    {
        Ok(token) => (
            StatusCode::OK,
            Json(LoginResponse {
                token,
                message: "Login successful".to_string(),
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /api/admin/validate
/// Always 200; the body says whether the bearer credential is valid.
pub async fn validate(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let valid = state.sessions.validate(extract_bearer_token(&headers));
    Json(ValidateResponse { valid })
}
