//! HTTP webhook gateway for Heron.
//!
//! A deliberately small surface: a root banner, a health check, and the
//! webhook endpoint. The webhook handler takes the raw body plus
//! headers and defers every decision to the dispatcher, so admission
//! semantics (reject vs. acknowledged no-op) live in one place.
//!
//! Built on Axum.

use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::Json;
use axum::routing::{get, post};
use axum::{Router, body::Bytes};
use heron_admission::RejectReason;
use heron_agent::{DispatchOutcome, Dispatcher};
use heron_config::AppConfig;
use std::sync::Arc;
use tracing::info;

/// Header Telegram echoes back with every webhook delivery.
const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Build the gateway router.
pub fn build_router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/healthz", get(health_handler))
        .route("/telegram-webhook", post(webhook_handler))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(dispatcher)
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: &AppConfig, dispatcher: Arc<Dispatcher>) -> std::io::Result<()> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Gateway listening");
    axum::serve(listener, build_router(dispatcher)).await
}

async fn root_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "heron",
        "status": "running",
    }))
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// The webhook endpoint.
///
/// Uses the raw body rather than a JSON extractor: media-type and
/// parse failures must flow through admission so the reject / no-op
/// distinction is made there, not by the framework.
async fn webhook_handler(
    State(dispatcher): State<Arc<Dispatcher>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<serde_json::Value>) {
    let content_type = header_str(&headers, header::CONTENT_TYPE.as_str());
    let secret = header_str(&headers, SECRET_HEADER);

    match dispatcher.dispatch(content_type, secret, &body).await {
        DispatchOutcome::Handled => (
            StatusCode::OK,
            Json(serde_json::json!({ "ok": true, "result": "handled" })),
        ),
        DispatchOutcome::NoOp(reason) => (
            StatusCode::OK,
            Json(serde_json::json!({ "ok": true, "result": reason.as_str() })),
        ),
        DispatchOutcome::Rejected(reason) => {
            let (status, error) = match reason {
                RejectReason::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
                RejectReason::UnsupportedMediaType => {
                    (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported media type")
                }
                RejectReason::BadRequest => (StatusCode::BAD_REQUEST, "malformed body"),
            };
            (
                status,
                Json(serde_json::json!({ "ok": false, "error": error })),
            )
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
