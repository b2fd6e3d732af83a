//! Authentication middleware: API key for session issuance, session cookie
//! for everything that acts on the current session.

use super::cookies::read_cookie;
use super::AppState;
use crate::error::AuthError;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

/// API key middleware
///
/// If `api_key` is configured in AppState, validates the Authorization header.
/// Expected format: `Authorization: Bearer <api_key>`
///
/// If no `api_key` is configured, all requests are allowed (local mode).
pub async fn api_key_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected_key) = &state.api_key else {
        return next.run(request).await;
    };

    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(provided_key) if provided_key == expected_key => next.run(request).await,
        Some(_) => unauthorized("Invalid API key"),
        None => unauthorized("API key required. Set Authorization: Bearer <api_key>"),
    }
}

/// Session cookie middleware
///
/// Resolves the session cookie through the manager and stores the refreshed
/// [`Session`](crate::session::Session) in the request extensions.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = read_cookie(request.headers(), state.sessions.cookie_name()).unwrap_or_default();

    match state.sessions.authenticate(&token) {
        Ok(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Err(AuthError::MissingCredential) => unauthorized("Session cookie required"),
        Err(AuthError::SessionNotFound) => unauthorized("Session not found"),
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}
