use crate::rpc::McpHandler;
use async_trait::async_trait;
use pirsch_client::{AnalyticsApi, DomainQuery, Filter};
use pirsch_core::types::DomainListing;
use pirsch_core::Result;
use pirsch_tools::Dispatcher;
use serde_json::{json, Number, Value};
use std::sync::Arc;

/// Answers every call with a fixed body naming what was asked.
pub struct StaticApi;

#[async_trait]
impl AnalyticsApi for StaticApi {
    async fn list_domains(&self, _query: &DomainQuery) -> Result<DomainListing> {
        Ok(serde_json::from_value(json!([{ "id": "dom-1", "hostname": "example.com" }]))?)
    }

    async fn get_overview(&self, domain_id: &str) -> Result<Value> {
        Ok(json!({ "id": domain_id, "visitors": 3 }))
    }

    async fn get_statistics(&self, endpoint: &str, _domain_id: &str, _filter: &Filter) -> Result<Value> {
        Ok(json!({ "endpoint": endpoint }))
    }

    async fn get_active(&self, _domain_id: &str, start: Option<Number>) -> Result<Value> {
        Ok(json!({ "start": start }))
    }
}

pub fn dispatcher() -> Arc<Dispatcher> {
    Arc::new(Dispatcher::new(Arc::new(StaticApi), None))
}

pub fn handler() -> McpHandler {
    McpHandler::new(dispatcher())
}
