use thiserror::Error;

#[derive(Error, Debug)]
pub enum PirschError {
    /// The token endpoint rejected the client credentials.
    #[error("Pirsch auth failed ({status}): {body}")]
    Authentication { status: u16, body: String },

    /// A data endpoint answered with a non-retryable, non-2xx status.
    #[error("Pirsch API error ({status}): {body}")]
    Upstream { status: u16, body: String },

    /// 401/429 kept coming back until the retry budget ran out.
    #[error("Max retries exceeded after {attempts} attempts (last status {last_status})")]
    RetryExhausted { attempts: u32, last_status: u16 },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown tool: {0}")]
    UnknownOperation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl PirschError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

pub type Result<T> = std::result::Result<T, PirschError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_message_carries_status_and_body() {
        let err = PirschError::Upstream {
            status: 404,
            body: "domain not found".into(),
        };
        assert_eq!(err.to_string(), "Pirsch API error (404): domain not found");
    }

    #[test]
    fn test_retry_exhausted_is_distinct() {
        let err = PirschError::RetryExhausted {
            attempts: 3,
            last_status: 429,
        };
        assert!(err.to_string().starts_with("Max retries exceeded"));
    }
}
