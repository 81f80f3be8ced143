use crate::rpc::McpHandler;
use pirsch_core::config::ServerConfig;
use pirsch_tools::Dispatcher;
use std::sync::Arc;

/// Shared state for the HTTP transport.
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub handler: McpHandler,
}

impl AppState {
    pub fn new(config: ServerConfig, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            config,
            handler: McpHandler::new(dispatcher),
        }
    }
}
