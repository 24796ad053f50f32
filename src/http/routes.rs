//! HTTP route definitions

use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeFile, timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::app::AppState;
use crate::util::time::uptime_secs;
use crate::ws::handler::ws_handler;
use crate::ws::sse::{event_stream, post_frame};

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let static_dir = state.config.static_dir.clone();

    // Pages are plain files; the projector page is the site index
    let pages = Router::new()
        .route_service("/projector", ServeFile::new(static_dir.join("index.html")))
        .route_service("/controller", ServeFile::new(static_dir.join("controller.html")));

    // Short request/response routes get a timeout; the long-lived transports must not
    let api = Router::new()
        .route("/health", get(health_handler))
        .route("/healthz", get(health_handler))
        .route("/sse/:id", post(post_frame))
        .layer(TimeoutLayer::new(Duration::from_secs(10)));

    let transports = Router::new()
        .route("/ws", get(ws_handler))
        .route("/sse", get(event_stream));

    Router::new()
        .merge(pages)
        .merge(api)
        .merge(transports)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                // Phones join from whatever origin the projector page was opened on
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    uptime_secs: u64,
    connections: usize,
    named_peers: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        uptime_secs: uptime_secs(),
        connections: state.relay.connection_count(),
        named_peers: state.relay.named_count(),
    })
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn app() -> Router {
        build_router(AppState::new(Config::default()))
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["ok"], true);
        assert_eq!(body["connections"], 0);
    }

    #[tokio::test]
    async fn posting_to_unknown_session_is_not_found() {
        let uri = format!("/sse/{}", Uuid::new_v4());
        let response = app()
            .oneshot(
                Request::post(uri)
                    .body(Body::from(r#"{"event":"aim","data":{"x":0.5,"y":0.5}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
