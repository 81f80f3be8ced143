//! Tool catalogue advertised through `tools/list`.

use crate::request::{
    ACTIVE, COMPARE, GROWTH, LIST_DOMAINS, OVERVIEW, PAGES, REFERRERS, TOTAL, UTM, VISITORS,
};
use pirsch_core::types::ToolSchema;
use serde_json::{json, Map, Value};

const STRING_FIELDS: &[&str] = &[
    "tz",
    "hostname",
    "path",
    "entry_path",
    "exit_path",
    "pattern",
    "event",
    "event_meta_key",
    "language",
    "country",
    "city",
    "referrer",
    "referrer_name",
    "channel",
    "os",
    "browser",
    "screen_class",
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_content",
    "utm_term",
    "custom_metric_key",
    "tag",
    "sort",
    "search",
    "visitor_id",
    "session_id",
];

const SCALES: [&str; 4] = ["day", "week", "month", "year"];

/// Properties of the `filter` object shared by the statistics tools.
pub fn filter_properties() -> Map<String, Value> {
    let mut props = Map::new();
    props.insert("from".into(), json!({ "type": "string", "description": "YYYY-MM-DD" }));
    props.insert("to".into(), json!({ "type": "string", "description": "YYYY-MM-DD" }));
    props.insert(
        "from_time".into(),
        json!({ "type": "string", "description": "HH:MM (same-day only)" }),
    );
    props.insert(
        "to_time".into(),
        json!({ "type": "string", "description": "HH:MM (same-day only)" }),
    );
    props.insert(
        "start".into(),
        json!({ "type": "number", "description": "Past seconds for active view" }),
    );
    props.insert("scale".into(), json!({ "type": "string", "enum": SCALES }));
    props.insert(
        "platform".into(),
        json!({ "type": "string", "enum": ["desktop", "mobile", "unknown"] }),
    );
    props.insert(
        "custom_metric_type".into(),
        json!({ "type": "string", "enum": ["integer", "float"] }),
    );
    props.insert("direction".into(), json!({ "type": "string", "enum": ["asc", "desc"] }));
    props.insert("offset".into(), json!({ "type": "number" }));
    props.insert("limit".into(), json!({ "type": "number" }));
    props.insert("include_avg_time_on_page".into(), json!({ "type": "boolean" }));
    props.insert("include_title".into(), json!({ "type": "boolean" }));
    for field in STRING_FIELDS {
        props.insert((*field).into(), json!({ "type": "string" }));
    }
    props
}

fn filtered(extra: Option<(&str, Value)>, required: &[&str]) -> Value {
    let mut props = Map::new();
    props.insert("domain_id".into(), json!({ "type": "string" }));
    if let Some((key, schema)) = extra {
        props.insert(key.into(), schema);
    }
    props.insert(
        "filter".into(),
        json!({ "type": "object", "properties": filter_properties() }),
    );
    let mut schema = json!({ "type": "object", "properties": props });
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

fn tool(name: &str, description: &str, input_schema: Value) -> ToolSchema {
    ToolSchema {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    }
}

/// Every tool the dispatcher serves, in listing order.
pub fn catalogue() -> Vec<ToolSchema> {
    vec![
        tool(
            LIST_DOMAINS,
            "List accessible Pirsch domains to discover domain IDs",
            json!({ "type": "object", "properties": { "search": { "type": "string" } } }),
        ),
        tool(
            OVERVIEW,
            "Get cached overview (visitors, views, members) for a domain",
            json!({ "type": "object", "properties": { "domain_id": { "type": "string" } } }),
        ),
        tool(
            TOTAL,
            "Get totals for visitors, views, sessions, bounces, bounce_rate, cr with filters",
            filtered(None, &[]),
        ),
        tool(
            VISITORS,
            "Get visitors time series with optional scale and filters",
            filtered(None, &[]),
        ),
        tool(
            PAGES,
            "Get page stats with sorting, search, and optional average time on page",
            filtered(None, &[]),
        ),
        tool(
            REFERRERS,
            "Get referrer statistics with filters and sorting",
            filtered(None, &[]),
        ),
        tool(
            UTM,
            "Get UTM stats by dimension (source, medium, campaign, content, term)",
            filtered(
                Some((
                    "type",
                    json!({
                        "type": "string",
                        "enum": ["source", "medium", "campaign", "content", "term"]
                    }),
                )),
                &["type"],
            ),
        ),
        tool(
            GROWTH,
            "Get growth rates across core metrics for the selected period",
            filtered(None, &[]),
        ),
        tool(
            ACTIVE,
            "Get active visitors and pages for the past N seconds (default 600)",
            json!({
                "type": "object",
                "properties": {
                    "domain_id": { "type": "string" },
                    "start": { "type": "number" }
                }
            }),
        ),
        tool(
            COMPARE,
            "Compare visitors time series between two periods and return deltas/growth",
            json!({
                "type": "object",
                "properties": {
                    "domain_id": { "type": "string" },
                    "period": {
                        "type": "string",
                        "enum": ["today", "yesterday", "week", "lastWeek", "month", "lastMonth"]
                    },
                    "compare": {
                        "type": "string",
                        "enum": ["previous", "year", "custom"],
                        "description": "Compare to previous period, same period last year, or custom range"
                    },
                    "from": { "type": "string" },
                    "to": { "type": "string" },
                    "compare_from": { "type": "string" },
                    "compare_to": { "type": "string" },
                    "scale": { "type": "string", "enum": SCALES }
                }
            }),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ToolRequest;

    #[test]
    fn test_catalogue_names_are_unique_and_parseable() {
        let tools = catalogue();
        assert_eq!(tools.len(), 10);
        let mut names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 10);

        // Every advertised tool accepts a call with only optional args or its required ones.
        for tool in &tools {
            let args = if tool.name == UTM {
                json!({ "type": "source" })
            } else {
                json!({})
            };
            assert!(ToolRequest::parse(&tool.name, args).is_ok(), "{}", tool.name);
        }
    }

    #[test]
    fn test_filter_schema_covers_enums() {
        let props = filter_properties();
        assert_eq!(props.len(), 41);
        assert_eq!(props["platform"]["enum"], json!(["desktop", "mobile", "unknown"]));
        assert_eq!(props["direction"]["enum"], json!(["asc", "desc"]));
        assert_eq!(props["include_title"]["type"], "boolean");
        assert!(!props.contains_key("id"));
    }

    #[test]
    fn test_utm_schema_requires_type() {
        let utm = catalogue().into_iter().find(|t| t.name == UTM).unwrap();
        assert_eq!(utm.input_schema["required"], json!(["type"]));
        let serialized = serde_json::to_value(&utm).unwrap();
        assert!(serialized.get("inputSchema").is_some());
    }
}
