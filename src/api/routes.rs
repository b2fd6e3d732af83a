//! HTTP route handlers for the API

use super::cookies::write_cookie;
use super::AppState;
use crate::session::{CookieDescriptor, Session};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;

// ============================================================================
// Health Check
// ============================================================================

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.sessions.stats();
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "active_sessions": stats.active_sessions,
        "expired_total": stats.expired_total,
        "last_sweep_at": stats.last_sweep_at,
    }))
}

// ============================================================================
// Sessions
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub user_id: i64,
}

/// Issue a session for a user the caller has already authenticated.
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Response {
    let session = state.sessions.create(req.user_id);
    let cookie = state.sessions.cookie_descriptor_for(&session);
    tracing::info!(user_id = req.user_id, "Issued session");

    with_cookie(
        StatusCode::CREATED,
        &cookie,
        Json(serde_json::json!({ "session": session })),
    )
}

pub async fn current_session(Extension(session): Extension<Session>) -> impl IntoResponse {
    Json(serde_json::json!({ "session": session }))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Response {
    state.sessions.logout(session.token().as_str());
    with_cookie(StatusCode::NO_CONTENT, &state.sessions.expired_cookie(), ())
}

pub async fn logout_all(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Response {
    let removed = state.sessions.logout_everywhere(session.user_id());
    with_cookie(
        StatusCode::OK,
        &state.sessions.expired_cookie(),
        Json(serde_json::json!({ "removed": removed })),
    )
}

fn with_cookie(status: StatusCode, cookie: &CookieDescriptor, body: impl IntoResponse) -> Response {
    let mut headers = HeaderMap::new();
    if let Err(e) = write_cookie(&mut headers, cookie) {
        tracing::error!("Failed to set session cookie: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "Failed to set session cookie" })),
        )
            .into_response();
    }
    (status, headers, body).into_response()
}
