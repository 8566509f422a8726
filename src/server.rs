//! HTTP surface
//!
//! - `POST /webhook` runs one tracker webhook through the processor
//! - `GET /health` liveness probe

use crate::models::WebhookEvent;
use crate::workflow::WebhookProcessor;
use crate::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<WebhookProcessor>,
}

/// Build the router; split from [`start_server`] so it can be driven in tests
pub fn router(processor: Arc<WebhookProcessor>) -> Router {
    Router::new()
        .route("/webhook", post(handle_webhook))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { processor })
}

pub async fn start_server(host: &str, port: u16, processor: Arc<WebhookProcessor>) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", host, port))?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "Webhook server listening");
    println!("✓ Server listening on http://{}", addr);
    println!("  Webhook endpoint: http://{}/webhook", addr);

    axum::serve(listener, router(processor)).await?;
    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}

/// Malformed bodies are rejected before the processor sees them
async fn handle_webhook(State(state): State<AppState>, body: Bytes) -> Response {
    let event: WebhookEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "Rejected malformed webhook body");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("Invalid webhook body: {}", e) })),
            )
                .into_response();
        }
    };

    let outcome = state.processor.process_webhook(&event).await;
    Json(outcome).into_response()
}
