use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Response body of `POST /token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Absolute expiry, ISO-8601 UTC.
    pub expires_at: DateTime<Utc>,
}

/// An analytics property the credentials can read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Domain {
    pub id: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub subdomain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    /// Everything else the API returns, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `GET /domain` answers with either a list or, when filtered by id, a single object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DomainListing {
    Many(Vec<Domain>),
    One(Box<Domain>),
}

impl DomainListing {
    pub fn into_vec(self) -> Vec<Domain> {
        match self {
            DomainListing::Many(domains) => domains,
            DomainListing::One(domain) => vec![*domain],
        }
    }

    pub fn first_id(&self) -> Option<&str> {
        match self {
            DomainListing::Many(domains) => domains.first().map(|d| d.id.as_str()),
            DomainListing::One(domain) => Some(domain.id.as_str()).filter(|id| !id.is_empty()),
        }
    }
}

/// One time bucket of the visitor series. Exactly one of the bucket labels is
/// set, depending on the requested scale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisitorsPoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub visitors: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub views: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sessions: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bounces: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bounce_rate: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cr: f64,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Schema definition for a tool, as advertised to protocol clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Output from a tool execution. Errors are carried in-band.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub content: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(payload: &Value) -> Self {
        Self {
            content: to_pretty_json(payload),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        let payload = serde_json::json!({ "error": true, "message": message.into() });
        Self {
            content: to_pretty_json(&payload),
            is_error: true,
        }
    }
}

pub fn to_pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_response_parses_utc_timestamp() {
        let token: TokenResponse = serde_json::from_value(json!({
            "access_token": "tok",
            "expires_at": "2024-03-15T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(token.expires_at.to_rfc3339(), "2024-03-15T10:00:00+00:00");
    }

    #[test]
    fn test_domain_listing_accepts_both_shapes() {
        let many: DomainListing = serde_json::from_value(json!([
            {"id": "a", "hostname": "a.com", "subdomain": null},
            {"id": "b", "hostname": "b.com", "subdomain": "b"}
        ]))
        .unwrap();
        assert_eq!(many.first_id(), Some("a"));
        assert_eq!(many.into_vec().len(), 2);

        let one: DomainListing =
            serde_json::from_value(json!({"id": "c", "hostname": "c.com", "subdomain": null}))
                .unwrap();
        assert_eq!(one.first_id(), Some("c"));
        assert_eq!(one.into_vec().len(), 1);
    }

    #[test]
    fn test_empty_listing_has_no_first_id() {
        let none: DomainListing = serde_json::from_value(json!([])).unwrap();
        assert_eq!(none.first_id(), None);
    }

    #[test]
    fn test_domain_keeps_unknown_fields() {
        let domain: Domain = serde_json::from_value(json!({
            "id": "a", "hostname": "a.com", "subdomain": null, "public": true
        }))
        .unwrap();
        assert_eq!(domain.extra.get("public"), Some(&json!(true)));
        let back = serde_json::to_value(&domain).unwrap();
        assert_eq!(back["public"], json!(true));
    }

    #[test]
    fn test_visitors_point_tolerates_null_and_missing_counts() {
        let point: VisitorsPoint = serde_json::from_value(json!({
            "day": "2024-03-14",
            "visitors": 12,
            "views": null,
            "bounce_rate": 0.5
        }))
        .unwrap();
        assert_eq!(point.visitors, 12);
        assert_eq!(point.views, 0);
        assert_eq!(point.sessions, 0);
        assert_eq!(point.day.as_deref(), Some("2024-03-14"));
    }

    #[test]
    fn test_error_output_envelope() {
        let out = ToolOutput::error("No domain found");
        assert!(out.is_error);
        let parsed: Value = serde_json::from_str(&out.content).unwrap();
        assert_eq!(parsed["error"], json!(true));
        assert_eq!(parsed["message"], json!("No domain found"));
    }
}
