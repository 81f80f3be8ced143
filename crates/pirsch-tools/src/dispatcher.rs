use crate::request::{
    ActiveArgs, CompareArgs, DomainArgs, FilterArgs, ListDomainsArgs, ToolRequest, UtmArgs,
};
use crate::schema;
use chrono::Local;
use pirsch_analytics::aggregations::{compare_totals, series_from_value, sum_series};
use pirsch_client::client::{AnalyticsApi, DomainQuery};
use pirsch_client::filters::Filter;
use pirsch_core::error::{PirschError, Result};
use pirsch_core::types::{ToolOutput, ToolSchema};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

const TOTAL_ENDPOINT: &str = "/statistics/total";
const VISITOR_ENDPOINT: &str = "/statistics/visitor";
const PAGE_ENDPOINT: &str = "/statistics/page";
const REFERRER_ENDPOINT: &str = "/statistics/referrer";
const GROWTH_ENDPOINT: &str = "/statistics/growth";

/// Routes tool calls to the analytics API and shapes their results.
///
/// Holds no per-call state; one instance serves every transport.
pub struct Dispatcher {
    api: Arc<dyn AnalyticsApi>,
    default_domain_id: Option<String>,
    tools: Vec<ToolSchema>,
}

impl Dispatcher {
    pub fn new(api: Arc<dyn AnalyticsApi>, default_domain_id: Option<String>) -> Self {
        Self {
            api,
            default_domain_id: default_domain_id.filter(|id| !id.is_empty()),
            tools: schema::catalogue(),
        }
    }

    pub fn schemas(&self) -> &[ToolSchema] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool by name. Failures come back in-band as an error payload.
    pub async fn execute(&self, name: &str, args: Value) -> ToolOutput {
        let result = match ToolRequest::parse(name, args) {
            Ok(request) => self.dispatch(request).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(payload) => ToolOutput::success(&payload),
            Err(e) => {
                warn!("Tool {} failed: {}", name, e);
                ToolOutput::error(e.to_string())
            }
        }
    }

    pub async fn dispatch(&self, request: ToolRequest) -> Result<Value> {
        debug!("Dispatching {}", request.name());
        match request {
            ToolRequest::ListDomains(args) => self.list_domains(args).await,
            ToolRequest::Overview(args) => self.overview(args).await,
            ToolRequest::Total(args) => self.statistics(TOTAL_ENDPOINT, "total", args).await,
            ToolRequest::Visitors(args) => self.statistics(VISITOR_ENDPOINT, "series", args).await,
            ToolRequest::Pages(args) => self.statistics(PAGE_ENDPOINT, "pages", args).await,
            ToolRequest::Referrers(args) => {
                self.statistics(REFERRER_ENDPOINT, "referrers", args).await
            }
            ToolRequest::Utm(args) => self.utm(args).await,
            ToolRequest::Growth(args) => self.statistics(GROWTH_ENDPOINT, "growth", args).await,
            ToolRequest::Active(args) => self.active(args).await,
            ToolRequest::Compare(args) => self.compare(args).await,
        }
    }

    /// Pick the domain to query: explicit argument, then the configured
    /// default, then the first domain the credentials can see.
    pub async fn resolve_domain_id(&self, explicit: Option<&str>) -> Result<String> {
        if let Some(id) = explicit.filter(|id| !id.is_empty()) {
            return Ok(id.to_string());
        }
        if let Some(id) = &self.default_domain_id {
            return Ok(id.clone());
        }
        let listing = self.api.list_domains(&DomainQuery::default()).await?;
        match listing.first_id() {
            Some(id) => {
                debug!("Falling back to first listed domain {}", id);
                Ok(id.to_string())
            }
            None => Err(PirschError::validation(
                "No domain found. Set PIRSCH_DEFAULT_DOMAIN_ID or provide domain_id",
            )),
        }
    }

    async fn list_domains(&self, args: ListDomainsArgs) -> Result<Value> {
        let query = match args.search.filter(|s| !s.is_empty()) {
            Some(term) => DomainQuery::search(term),
            None => DomainQuery::default(),
        };
        let domains = self.api.list_domains(&query).await?.into_vec();
        Ok(json!({ "count": domains.len(), "domains": domains }))
    }

    async fn overview(&self, args: DomainArgs) -> Result<Value> {
        let domain_id = self.resolve_domain_id(args.domain_id.as_deref()).await?;
        let overview = self.api.get_overview(&domain_id).await?;
        Ok(json!({ "domain_id": domain_id, "overview": overview }))
    }

    async fn statistics(&self, endpoint: &str, key: &str, args: FilterArgs) -> Result<Value> {
        let domain_id = self.resolve_domain_id(args.domain_id.as_deref()).await?;
        let data = self
            .api
            .get_statistics(endpoint, &domain_id, &args.filter())
            .await?;
        let mut payload = json!({ "domain_id": domain_id });
        payload[key] = data;
        Ok(payload)
    }

    async fn utm(&self, args: UtmArgs) -> Result<Value> {
        let domain_id = self.resolve_domain_id(args.domain_id.as_deref()).await?;
        let filter = args.filter.clone().unwrap_or_default();
        let data = self
            .api
            .get_statistics(&args.dimension.endpoint(), &domain_id, &filter)
            .await?;
        Ok(json!({ "domain_id": domain_id, "type": args.dimension, "utm": data }))
    }

    async fn active(&self, args: ActiveArgs) -> Result<Value> {
        let domain_id = self.resolve_domain_id(args.domain_id.as_deref()).await?;
        let start = args.start_seconds();
        let data = self.api.get_active(&domain_id, Some(start.clone())).await?;
        Ok(json!({ "domain_id": domain_id, "start": start, "active": data }))
    }

    async fn compare(&self, args: CompareArgs) -> Result<Value> {
        let plan = args.plan(Local::now().naive_local())?;
        let domain_id = self.resolve_domain_id(args.domain_id.as_deref()).await?;

        let scale = plan.scale.as_str();
        let current_filter = Filter::window(&plan.current.from, &plan.current.to, scale);
        let previous_filter = Filter::window(&plan.previous.from, &plan.previous.to, scale);
        let (current, previous) = futures::future::try_join(
            self.api
                .get_statistics(VISITOR_ENDPOINT, &domain_id, &current_filter),
            self.api
                .get_statistics(VISITOR_ENDPOINT, &domain_id, &previous_filter),
        )
        .await?;

        let totals = compare_totals(
            &sum_series(&series_from_value(&current)?),
            &sum_series(&series_from_value(&previous)?),
        );
        Ok(json!({
            "period": plan.current,
            "compare_to": plan.previous,
            "totals": totals,
            "series": { "current": current, "previous": previous }
        }))
    }
}
