//! Filter encoding for statistics endpoints.
//!
//! A [`Filter`] is a bag of optional scalars. Encoding turns it into a flat
//! list of query pairs, always injecting the domain `id` and skipping every
//! field that is absent or an empty string. Numbers and flags only survive
//! when they arrived with the right JSON type, so `start = 0` and
//! `include_title = false` are encoded while `limit = "ten"` is dropped.

use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Query filter accepted by the statistics endpoints.
///
/// Deserialization is lenient per field: a value of the wrong type leaves the
/// field unset instead of failing the whole filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filter {
    /// Ignored by the encoder, which always writes the resolved domain id.
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    // Date and time bounds
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub from_time: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub to_time: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub tz: Option<String>,
    /// Seconds into the past for the active-visitors view.
    #[serde(deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub start: Option<Number>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub scale: Option<String>,

    // Dimensions
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub entry_path: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub exit_path: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub event_meta_key: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub referrer_name: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub screen_class: Option<String>,

    // UTM
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub utm_medium: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub utm_campaign: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub utm_content: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub utm_term: Option<String>,

    // Custom metrics and tags
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub custom_metric_type: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub custom_metric_key: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    // Pagination and sorting
    #[serde(deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub offset: Option<Number>,
    #[serde(deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub limit: Option<Number>,
    #[serde(deserialize_with = "lenient::flag", skip_serializing_if = "Option::is_none")]
    pub include_avg_time_on_page: Option<bool>,
    #[serde(deserialize_with = "lenient::flag", skip_serializing_if = "Option::is_none")]
    pub include_title: Option<bool>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,

    // Sessions
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub visitor_id: Option<String>,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl Filter {
    /// Filter for a date window at the given scale.
    pub fn window(from: impl Into<String>, to: impl Into<String>, scale: impl Into<String>) -> Self {
        Self {
            from: Some(from.into()),
            to: Some(to.into()),
            scale: Some(scale.into()),
            ..Self::default()
        }
    }

    /// Filter carrying only the active-visitors lookback.
    pub fn active_since(start: Option<Number>) -> Self {
        Self {
            start,
            ..Self::default()
        }
    }
}

/// Values applied when the filter leaves a field unset.
#[derive(Debug, Clone, Default)]
pub struct EncodeDefaults {
    pub tz: Option<String>,
}

/// Encoded query, one value per key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing any earlier value in place.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// A text field counts only when it holds a non-empty string.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Encode `filter` for `domain_id`.
pub fn encode(filter: &Filter, domain_id: &str, defaults: &EncodeDefaults) -> QueryParams {
    let mut params = QueryParams::new();
    params.set("id", domain_id);

    let tz = present(&filter.tz).or_else(|| present(&defaults.tz));

    let text_fields = [
        ("from", present(&filter.from)),
        ("to", present(&filter.to)),
        ("from_time", present(&filter.from_time)),
        ("to_time", present(&filter.to_time)),
        ("tz", tz),
        ("scale", present(&filter.scale)),
        ("hostname", present(&filter.hostname)),
        ("path", present(&filter.path)),
        ("entry_path", present(&filter.entry_path)),
        ("exit_path", present(&filter.exit_path)),
        ("pattern", present(&filter.pattern)),
        ("event", present(&filter.event)),
        ("event_meta_key", present(&filter.event_meta_key)),
        ("language", present(&filter.language)),
        ("country", present(&filter.country)),
        ("city", present(&filter.city)),
        ("referrer", present(&filter.referrer)),
        ("referrer_name", present(&filter.referrer_name)),
        ("channel", present(&filter.channel)),
        ("os", present(&filter.os)),
        ("browser", present(&filter.browser)),
        ("platform", present(&filter.platform)),
        ("screen_class", present(&filter.screen_class)),
        ("utm_source", present(&filter.utm_source)),
        ("utm_medium", present(&filter.utm_medium)),
        ("utm_campaign", present(&filter.utm_campaign)),
        ("utm_content", present(&filter.utm_content)),
        ("utm_term", present(&filter.utm_term)),
        ("custom_metric_type", present(&filter.custom_metric_type)),
        ("custom_metric_key", present(&filter.custom_metric_key)),
        ("tag", present(&filter.tag)),
        ("sort", present(&filter.sort)),
        ("direction", present(&filter.direction)),
        ("search", present(&filter.search)),
        ("visitor_id", present(&filter.visitor_id)),
        ("session_id", present(&filter.session_id)),
    ];
    for (key, value) in text_fields {
        if let Some(value) = value {
            params.set(key, value);
        }
    }

    let number_fields = [
        ("start", &filter.start),
        ("offset", &filter.offset),
        ("limit", &filter.limit),
    ];
    for (key, value) in number_fields {
        if let Some(n) = value {
            params.set(key, n.to_string());
        }
    }

    let flag_fields = [
        ("include_avg_time_on_page", filter.include_avg_time_on_page),
        ("include_title", filter.include_title),
    ];
    for (key, value) in flag_fields {
        if let Some(flag) = value {
            params.set(key, flag.to_string());
        }
    }

    params
}

/// Per-field deserializers that drop wrong-typed values instead of failing.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::{Number, Value};

    /// Strings pass through; numbers and booleans are stringified.
    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
    }

    pub fn number<'de, D>(deserializer: D) -> Result<Option<Number>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => Some(n),
            _ => None,
        })
    }

    pub fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Bool(b) => Some(b),
            _ => None,
        })
    }
}
