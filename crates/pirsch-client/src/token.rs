use chrono::{DateTime, Duration, Utc};
use pirsch_core::types::TokenResponse;

/// Where the cached bearer token stands relative to a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    NoToken,
    Valid,
    /// Still accepted upstream, but inside the skew window. Refreshed like `NoToken`.
    Expiring,
}

/// Cached bearer token. Starts empty; filled by a refresh; cleared when the
/// API rejects it.
#[derive(Debug, Clone, Default)]
pub(crate) struct TokenCache {
    value: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl TokenCache {
    pub fn state_at(&self, now: DateTime<Utc>, skew: Duration) -> TokenState {
        match (&self.value, self.expires_at) {
            (Some(_), Some(expires_at)) if now + skew < expires_at => TokenState::Valid,
            (Some(_), Some(_)) => TokenState::Expiring,
            _ => TokenState::NoToken,
        }
    }

    /// The token, if it can be used at `now`.
    pub fn usable_at(&self, now: DateTime<Utc>, skew: Duration) -> Option<&str> {
        match self.state_at(now, skew) {
            TokenState::Valid => self.value.as_deref(),
            _ => None,
        }
    }

    pub fn store(&mut self, response: TokenResponse) -> String {
        self.expires_at = Some(response.expires_at);
        self.value = Some(response.access_token.clone());
        response.access_token
    }

    pub fn clear(&mut self) {
        self.value = None;
        self.expires_at = None;
    }
}
