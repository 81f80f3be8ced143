use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

// ── Health ──────────────────────────────────────────────────────────────

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// ── JSON-RPC ────────────────────────────────────────────────────────────

pub fn mcp_routes() -> Router<AppState> {
    Router::new().route("/mcp", post(mcp))
}

/// The body is taken as text so malformed JSON still gets a JSON-RPC parse error.
async fn mcp(State(state): State<AppState>, body: String) -> Response {
    match state.handler.handle_text(&body).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}
