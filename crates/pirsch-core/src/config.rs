use crate::error::PirschError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.pirsch.io/api/v1";

/// Top-level application configuration, loaded from TOML and overlaid with
/// `PIRSCH_*` environment variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pirsch: PirschConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load configuration from default path (~/.config/pirsch-mcp/config.toml),
    /// falling back to defaults if the file doesn't exist.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Write current configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Default config file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pirsch-mcp")
            .join("config.toml")
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) -> Result<(), PirschError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary lookup. Empty values count as unset.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), PirschError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("PIRSCH_CLIENT_ID") {
            self.pirsch.client_id = Some(v);
        }
        if let Some(v) = get("PIRSCH_CLIENT_SECRET") {
            self.pirsch.client_secret = Some(v);
        }
        if let Some(v) = get("PIRSCH_DEFAULT_DOMAIN_ID") {
            self.pirsch.default_domain_id = Some(v);
        }
        if let Some(v) = get("PIRSCH_TIMEZONE") {
            self.pirsch.timezone = Some(v);
        }
        if let Some(v) = get("PIRSCH_BASE_URL") {
            self.pirsch.base_url = v;
        }
        if let Some(v) = get("PIRSCH_TOKEN_SKEW_MS") {
            self.pirsch.token_skew_ms = v.trim().parse().map_err(|_| {
                PirschError::Config(format!("PIRSCH_TOKEN_SKEW_MS must be an integer, got '{}'", v))
            })?;
        }
        Ok(())
    }

    /// Check that everything needed to talk to the API is present.
    pub fn validate(&self) -> Result<(), PirschError> {
        let missing = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());
        if missing(&self.pirsch.client_id) || missing(&self.pirsch.client_secret) {
            return Err(PirschError::Config(
                "Missing required credentials: PIRSCH_CLIENT_ID or PIRSCH_CLIENT_SECRET".into(),
            ));
        }
        Url::parse(&self.pirsch.base_url)
            .map_err(|e| PirschError::Config(format!("Invalid base_url '{}': {}", self.pirsch.base_url, e)))?;
        Ok(())
    }

    /// Copy suitable for printing, with the client secret masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.pirsch.client_secret.is_some() {
            copy.pirsch.client_secret = Some("********".into());
        }
        if copy.server.auth_token.is_some() {
            copy.server.auth_token = Some("********".into());
        }
        copy
    }
}

/// Upstream API credentials and request defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PirschConfig {
    /// Base URL for the Pirsch REST API.
    pub base_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Domain used when a tool call doesn't name one.
    pub default_domain_id: Option<String>,
    /// Timezone sent as `tz` when a filter doesn't set one.
    pub timezone: Option<String>,
    /// Refresh the bearer token this many milliseconds before it expires.
    pub token_skew_ms: u64,
    /// Retries on 401/429 per request.
    pub max_retries: u32,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for PirschConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            client_id: None,
            client_secret: None,
            default_domain_id: None,
            timezone: None,
            token_skew_ms: 60_000,
            max_retries: 2,
            timeout_secs: 30,
        }
    }
}

/// HTTP transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Port.
    pub port: u16,
    /// Bearer token for authentication (None = no auth).
    pub auth_token: Option<String>,
    /// Enable CORS.
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8787,
            auth_token: None,
            cors: true,
        }
    }
}
