//! HTTP API module for sessiond
//!
//! Issues, inspects and revokes cookie sessions.

mod auth;
pub mod cookies;
pub mod routes;

use crate::config::Config;
use crate::error::{CoreError, Result};
use crate::session::SessionManager;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub api_key: Option<String>,
}

/// Start the HTTP API server; returns after a shutdown signal.
pub async fn serve(addr: SocketAddr, sessions: Arc<SessionManager>, config: &Config) -> Result<()> {
    let state = AppState {
        sessions,
        api_key: config.server.api_key.clone(),
    };

    let app = create_router(state);

    // Check if port is already in use (another sessiond instance running)
    if tokio::net::TcpStream::connect(addr).await.is_ok() {
        tracing::error!(
            "Port {} is already in use. Another sessiond instance may be running. \
             Use `curl http://{}/health` to check.",
            addr.port(),
            addr
        );
        return Err(CoreError::Api(format!("Port {} already in use", addr.port())));
    }

    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| CoreError::Api(e.to_string()))?;

    Ok(())
}

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Issuing a session is a trusted call from the login front end
    let issue_routes = Router::new()
        .route("/sessions", post(routes::create_session))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::api_key_middleware,
        ));

    let session_routes = Router::new()
        .route(
            "/session",
            get(routes::current_session).delete(routes::logout),
        )
        .route("/session/all", delete(routes::logout_all))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::session_middleware,
        ));

    Router::new()
        // Health check (public, no auth required)
        .route("/health", get(routes::health))
        .nest("/api", issue_routes.merge(session_routes))
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionOptions;
    use axum::body::Body;
    use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_state(api_key: Option<&str>) -> AppState {
        AppState {
            sessions: Arc::new(SessionManager::start(SessionOptions::new("session", 600)).unwrap()),
            api_key: api_key.map(str::to_string),
        }
    }

    fn issue_request(user_id: i64, bearer: Option<&str>) -> Request<Body> {
        let mut builder = Request::post("/api/sessions").header(CONTENT_TYPE, "application/json");
        if let Some(key) = bearer {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", key));
        }
        builder
            .body(Body::from(format!(r#"{{"user_id": {}}}"#, user_id)))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_issue_then_fetch_session() {
        let state = test_state(None);
        let app = create_router(state.clone());

        let response = app.clone().oneshot(issue_request(5, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let set_cookie = response.headers()[SET_COOKIE].to_str().unwrap().to_string();
        assert!(set_cookie.starts_with("session="));
        assert!(set_cookie.ends_with("; Path=/; Max-Age=600; HttpOnly"));

        let body = json_body(response).await;
        let token = body["session"]["token"].as_str().unwrap().to_string();
        assert_eq!(body["session"]["user_id"], 5);

        let response = app
            .oneshot(
                Request::get("/api/session")
                    .header(COOKIE, format!("session={}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["session"]["token"], token.as_str());

        state.sessions.stop().await;
    }

    #[tokio::test]
    async fn test_session_route_rejects_missing_and_unknown_cookie() {
        let state = test_state(None);
        let app = create_router(state.clone());

        let response = app
            .clone()
            .oneshot(Request::get("/api/session").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(
                Request::get("/api/session")
                    .header(COOKIE, "session=nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Session not found");

        state.sessions.stop().await;
    }

    #[tokio::test]
    async fn test_issue_requires_api_key_when_configured() {
        let state = test_state(Some("secret"));
        let app = create_router(state.clone());

        let response = app.clone().oneshot(issue_request(1, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app.clone().oneshot(issue_request(1, Some("wrong"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app.oneshot(issue_request(1, Some("secret"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(state.sessions.stats().active_sessions, 1);

        state.sessions.stop().await;
    }

    #[tokio::test]
    async fn test_logout_clears_cookie_and_session() {
        let state = test_state(None);
        let app = create_router(state.clone());
        let session = state.sessions.create(8);
        let cookie = format!("session={}", session.token());

        let response = app
            .clone()
            .oneshot(
                Request::delete("/api/session")
                    .header(COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response.headers()[SET_COOKIE],
            "session=; Path=/; Max-Age=0; HttpOnly"
        );
        assert!(state.sessions.store().is_empty());

        let response = app
            .oneshot(
                Request::get("/api/session")
                    .header(COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        state.sessions.stop().await;
    }

    #[tokio::test]
    async fn test_logout_all() {
        let state = test_state(None);
        let app = create_router(state.clone());
        let current = state.sessions.create(8);
        state.sessions.create(8);
        state.sessions.create(9);

        let response = app
            .oneshot(
                Request::delete("/api/session/all")
                    .header(COOKIE, format!("session={}", current.token()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["removed"], 2);
        assert_eq!(state.sessions.stats().active_sessions, 1);

        state.sessions.stop().await;
    }

    #[tokio::test]
    async fn test_health() {
        let state = test_state(Some("secret"));
        let app = create_router(state.clone());
        state.sessions.create(1);

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["active_sessions"], 1);

        state.sessions.stop().await;
    }
}
