//! HTTP routing for the relay.

use crate::relay::Relay;
use axum::{
    body::Body,
    extract::State,
    http::Method,
    response::IntoResponse,
    routing::{any, get},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

pub const ANALYZE_PATH: &str = "/api/analyze";
/// Path the browser client used when the relay ran as a Netlify function.
pub const LEGACY_ANALYZE_PATH: &str = "/.netlify/functions/analyze";

/// Two base64 JPEGs from a phone camera fit comfortably in this. Enforced by
/// the handler after the method gate, not by an extractor.
pub const MAX_BODY_BYTES: usize = 6 * 1024 * 1024;

pub fn build_router(relay: Arc<Relay>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Every method reaches the handler; it answers non-POST itself.
        .route(ANALYZE_PATH, any(analyze))
        .route(LEGACY_ANALYZE_PATH, any(analyze))
        .layer(TraceLayer::new_for_http())
        .with_state(relay)
}

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn analyze(State(relay): State<Arc<Relay>>, method: Method, body: Body) -> impl IntoResponse {
    let request_id = Uuid::new_v4();
    relay
        .handle_body(&method, body, MAX_BODY_BYTES)
        .instrument(tracing::info_span!("analyze", %request_id))
        .await
}
