use crate::filters::{encode, EncodeDefaults, Filter, QueryParams};
use crate::token::{TokenCache, TokenState};
use async_trait::async_trait;
use chrono::Utc;
use pirsch_core::config::PirschConfig;
use pirsch_core::error::{PirschError, Result};
use pirsch_core::types::{DomainListing, TokenResponse};
use reqwest::header::{HeaderValue, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use serde_json::{json, Number, Value};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

/// Fallback backoff step for 429 responses without a usable `Retry-After`.
const RATE_LIMIT_STEP: Duration = Duration::from_millis(1500);

/// Upper bound on a server-requested `Retry-After` wait.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(300);

/// Read operations the tool layer needs from the analytics API.
#[async_trait]
pub trait AnalyticsApi: Send + Sync {
    /// `GET /domain`.
    async fn list_domains(&self, query: &DomainQuery) -> Result<DomainListing>;

    /// `GET /statistics/overview` for one domain.
    async fn get_overview(&self, domain_id: &str) -> Result<Value>;

    /// Any filtered statistics endpoint, e.g. `/statistics/visitor`.
    async fn get_statistics(&self, endpoint: &str, domain_id: &str, filter: &Filter) -> Result<Value>;

    /// `GET /statistics/active`, looking back `start` seconds.
    async fn get_active(&self, domain_id: &str, start: Option<Number>) -> Result<Value>;
}

/// Optional filters for the domain listing.
#[derive(Debug, Clone, Default)]
pub struct DomainQuery {
    pub search: Option<String>,
    pub id: Option<String>,
    pub subdomain: Option<String>,
    pub domain: Option<String>,
    pub access: Option<String>,
}

impl DomainQuery {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            ..Self::default()
        }
    }

    fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        let fields = [
            ("search", &self.search),
            ("id", &self.id),
            ("subdomain", &self.subdomain),
            ("domain", &self.domain),
            ("access", &self.access),
        ];
        for (key, value) in fields {
            if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
                params.set(key, v);
            }
        }
        params
    }
}

/// Authenticated client for the Pirsch REST API.
///
/// Owns the bearer token. Callers never see it: every request goes through
/// [`PirschClient::request`], which refreshes the token when it is missing or
/// inside the skew window, and once more when the API answers 401.
pub struct PirschClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    token: Mutex<TokenCache>,
    skew: chrono::Duration,
    defaults: EncodeDefaults,
    max_retries: u32,
}

impl PirschClient {
    pub fn new(config: &PirschConfig) -> Result<Self> {
        let client_id = config
            .client_id
            .clone()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| PirschError::Config("client_id is required".into()))?;
        let client_secret = config
            .client_secret
            .clone()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| PirschError::Config("client_secret is required".into()))?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| PirschError::Config(format!("Invalid base_url '{}': {}", base_url, e)))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("pirsch-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            client_id,
            client_secret,
            token: Mutex::new(TokenCache::default()),
            skew: chrono::Duration::milliseconds(config.token_skew_ms as i64),
            defaults: EncodeDefaults {
                tz: config.timezone.clone(),
            },
            max_retries: config.max_retries,
        })
    }

    /// Current token state, checked against the wall clock.
    pub async fn token_state(&self) -> TokenState {
        self.token.lock().await.state_at(Utc::now(), self.skew)
    }

    /// Return a usable token, acquiring one if absent or about to expire.
    pub async fn ensure_valid(&self) -> Result<String> {
        let mut cache = self.token.lock().await;
        if let Some(token) = cache.usable_at(Utc::now(), self.skew) {
            return Ok(token.to_string());
        }
        let response = self.fetch_token().await?;
        Ok(cache.store(response))
    }

    /// Drop the cached token and acquire a fresh one.
    pub async fn invalidate(&self) -> Result<String> {
        let mut cache = self.token.lock().await;
        cache.clear();
        let response = self.fetch_token().await?;
        Ok(cache.store(response))
    }

    async fn fetch_token(&self) -> Result<TokenResponse> {
        let url = self.endpoint("/token")?;
        debug!("Requesting access token from {}", url);

        let response = self
            .http
            .post(url)
            .json(&json!({
                "client_id": self.client_id,
                "client_secret": self.client_secret,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PirschError::Authentication {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response.json().await?;
        debug!("Access token valid until {}", token.expires_at);
        Ok(token)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let raw = format!("{}{}", self.base_url, path);
        Url::parse(&raw).map_err(|e| PirschError::Config(format!("Invalid endpoint '{}': {}", raw, e)))
    }

    /// Issue an authenticated request.
    ///
    /// 401 forces a token refresh and 429 backs off; both consume one of
    /// `max_retries` retries. Any other non-2xx status fails immediately.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        params: Option<&QueryParams>,
        body: Option<&Value>,
        max_retries: u32,
    ) -> Result<Value> {
        let mut token = self.ensure_valid().await?;
        let url = self.endpoint(path)?;
        let mut last_status = 0;

        for attempt in 0..=max_retries {
            let mut builder = self
                .http
                .request(method.clone(), url.clone())
                .bearer_auth(&token)
                .header(CONTENT_TYPE, "application/json");
            if let Some(params) = params {
                builder = builder.query(params.pairs());
            }
            if let Some(body) = body {
                builder = builder.json(body);
            }

            debug!("{} {} (attempt {})", method, path, attempt + 1);
            let response = builder.send().await?;
            let status = response.status();
            last_status = status.as_u16();

            match status {
                StatusCode::UNAUTHORIZED => {
                    if attempt < max_retries {
                        warn!("{} {} returned 401, refreshing token", method, path);
                        token = self.invalidate().await?;
                    } else {
                        break;
                    }
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    if attempt < max_retries {
                        let delay = backoff_delay(response.headers().get(RETRY_AFTER), attempt);
                        warn!("{} {} rate limited, retrying in {:?}", method, path, delay);
                        tokio::time::sleep(delay).await;
                    } else {
                        break;
                    }
                }
                StatusCode::NO_CONTENT => return Ok(json!({})),
                s if !s.is_success() => {
                    let body = response.text().await.unwrap_or_default();
                    return Err(PirschError::Upstream {
                        status: s.as_u16(),
                        body,
                    });
                }
                _ => {
                    let bytes = response.bytes().await?;
                    if bytes.is_empty() {
                        return Ok(json!({}));
                    }
                    return Ok(serde_json::from_slice(&bytes)?);
                }
            }
        }

        Err(PirschError::RetryExhausted {
            attempts: max_retries + 1,
            last_status,
        })
    }

    async fn get(&self, path: &str, params: &QueryParams) -> Result<Value> {
        self.request(Method::GET, path, Some(params), None, self.max_retries)
            .await
    }
}

#[async_trait]
impl AnalyticsApi for PirschClient {
    async fn list_domains(&self, query: &DomainQuery) -> Result<DomainListing> {
        let value = self.get("/domain", &query.to_params()).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn get_overview(&self, domain_id: &str) -> Result<Value> {
        let mut params = QueryParams::new();
        params.set("id", domain_id);
        self.get("/statistics/overview", &params).await
    }

    async fn get_statistics(&self, endpoint: &str, domain_id: &str, filter: &Filter) -> Result<Value> {
        let params = encode(filter, domain_id, &self.defaults);
        self.get(endpoint, &params).await
    }

    async fn get_active(&self, domain_id: &str, start: Option<Number>) -> Result<Value> {
        let params = encode(&Filter::active_since(start), domain_id, &self.defaults);
        self.get("/statistics/active", &params).await
    }
}

/// Delay before retrying a 429: `Retry-After` seconds when it parses (capped at
/// five minutes), else a linear step per attempt.
pub fn backoff_delay(retry_after: Option<&HeaderValue>, attempt: u32) -> Duration {
    retry_after
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|secs| Duration::from_secs(secs).min(MAX_RETRY_AFTER))
        .unwrap_or_else(|| RATE_LIMIT_STEP.saturating_mul(attempt.saturating_add(1)))
}
