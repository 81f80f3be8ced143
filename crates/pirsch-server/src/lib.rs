//! Tool protocol transports: JSON-RPC 2.0 over stdio and over HTTP.

pub mod routes;
pub mod rpc;
pub mod state;
pub mod stdio;

#[cfg(test)]
mod test_support;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use pirsch_core::config::ServerConfig;
use pirsch_tools::Dispatcher;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use rpc::McpHandler;
pub use state::AppState;
pub use stdio::serve_stdio;

/// Rejects requests without the configured bearer token. Comparison is constant-time.
async fn auth_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let expected = match &state.config.auth_token {
        Some(t) => t,
        None => return next.run(req).await,
    };

    let provided = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match provided {
        Some(token) if bool::from(token.as_bytes().ct_eq(expected.as_bytes())) => {
            next.run(req).await
        }
        _ => (StatusCode::UNAUTHORIZED, "Invalid or missing bearer token").into_response(),
    }
}

/// Build the axum Router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(routes::mcp_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let public = Router::new().merge(routes::health_routes());

    let mut app = Router::new()
        .merge(protected)
        .merge(public)
        .with_state(state.clone());

    app = app.layer(TraceLayer::new_for_http());

    if state.config.cors {
        let cors = if state.config.auth_token.is_some() {
            CorsLayer::new()
                .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
                .allow_headers([
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::AUTHORIZATION,
                ])
                .allow_origin(Any)
        } else {
            CorsLayer::permissive()
        };
        app = app.layer(cors);
    }

    app
}

/// Serve the tools over HTTP until the process is stopped.
pub async fn serve_http(config: ServerConfig, dispatcher: Arc<Dispatcher>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    if config.auth_token.is_none() {
        tracing::warn!("No auth_token configured, /mcp is unauthenticated");
    }
    let router = build_router(AppState::new(config, dispatcher));

    tracing::info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
