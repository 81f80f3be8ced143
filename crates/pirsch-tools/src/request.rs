//! Typed tool requests.
//!
//! The protocol hands us a tool name and a JSON argument bag. [`ToolRequest::parse`]
//! is the only place those are looked at untyped; everything past it matches
//! on the enum.

use chrono::{NaiveDate, NaiveDateTime};
use pirsch_analytics::period::{resolve_at, CompareMode, DateRange, Period};
use pirsch_client::filters::Filter;
use pirsch_core::error::{PirschError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

pub const LIST_DOMAINS: &str = "pirsch_list_domains";
pub const OVERVIEW: &str = "pirsch_overview";
pub const TOTAL: &str = "pirsch_total";
pub const VISITORS: &str = "pirsch_visitors";
pub const PAGES: &str = "pirsch_pages";
pub const REFERRERS: &str = "pirsch_referrers";
pub const UTM: &str = "pirsch_utm";
pub const GROWTH: &str = "pirsch_growth";
pub const ACTIVE: &str = "pirsch_active";
pub const COMPARE: &str = "pirsch_compare";

/// Lookback for the active-visitors tool when none is given.
pub const DEFAULT_ACTIVE_SECONDS: u64 = 600;

#[derive(Debug, Clone, PartialEq)]
pub enum ToolRequest {
    ListDomains(ListDomainsArgs),
    Overview(DomainArgs),
    Total(FilterArgs),
    Visitors(FilterArgs),
    Pages(FilterArgs),
    Referrers(FilterArgs),
    Utm(UtmArgs),
    Growth(FilterArgs),
    Active(ActiveArgs),
    Compare(CompareArgs),
}

impl ToolRequest {
    /// Build a request from a protocol-level tool call.
    pub fn parse(name: &str, args: Value) -> Result<Self> {
        let args = if args.is_null() {
            Value::Object(Default::default())
        } else {
            args
        };
        let request = match name {
            LIST_DOMAINS => ToolRequest::ListDomains(decode(name, args)?),
            OVERVIEW => ToolRequest::Overview(decode(name, args)?),
            TOTAL => ToolRequest::Total(decode(name, args)?),
            VISITORS => ToolRequest::Visitors(decode(name, args)?),
            PAGES => ToolRequest::Pages(decode(name, args)?),
            REFERRERS => ToolRequest::Referrers(decode(name, args)?),
            UTM => ToolRequest::Utm(decode(name, args)?),
            GROWTH => ToolRequest::Growth(decode(name, args)?),
            ACTIVE => ToolRequest::Active(decode(name, args)?),
            COMPARE => ToolRequest::Compare(decode(name, args)?),
            other => return Err(PirschError::UnknownOperation(other.to_string())),
        };
        Ok(request)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolRequest::ListDomains(_) => LIST_DOMAINS,
            ToolRequest::Overview(_) => OVERVIEW,
            ToolRequest::Total(_) => TOTAL,
            ToolRequest::Visitors(_) => VISITORS,
            ToolRequest::Pages(_) => PAGES,
            ToolRequest::Referrers(_) => REFERRERS,
            ToolRequest::Utm(_) => UTM,
            ToolRequest::Growth(_) => GROWTH,
            ToolRequest::Active(_) => ACTIVE,
            ToolRequest::Compare(_) => COMPARE,
        }
    }
}

fn decode<T: DeserializeOwned>(name: &str, args: Value) -> Result<T> {
    serde_json::from_value(args)
        .map_err(|e| PirschError::validation(format!("Invalid arguments for {}: {}", name, e)))
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ListDomainsArgs {
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DomainArgs {
    pub domain_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FilterArgs {
    pub domain_id: Option<String>,
    pub filter: Option<Filter>,
}

impl FilterArgs {
    pub fn filter(&self) -> Filter {
        self.filter.clone().unwrap_or_default()
    }
}

/// UTM breakdown dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UtmDimension {
    Source,
    Medium,
    Campaign,
    Content,
    Term,
}

impl UtmDimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            UtmDimension::Source => "source",
            UtmDimension::Medium => "medium",
            UtmDimension::Campaign => "campaign",
            UtmDimension::Content => "content",
            UtmDimension::Term => "term",
        }
    }

    pub fn endpoint(&self) -> String {
        format!("/statistics/utm/{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UtmArgs {
    #[serde(default)]
    pub domain_id: Option<String>,
    #[serde(rename = "type")]
    pub dimension: UtmDimension,
    #[serde(default)]
    pub filter: Option<Filter>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ActiveArgs {
    pub domain_id: Option<String>,
    /// Any JSON number; passed to the API as given.
    pub start: Option<Number>,
}

impl ActiveArgs {
    pub fn start_seconds(&self) -> Number {
        self.start
            .clone()
            .unwrap_or_else(|| Number::from(DEFAULT_ACTIVE_SECONDS))
    }
}

/// Series bucket size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    #[default]
    Day,
    Week,
    Month,
    Year,
}

impl Scale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scale::Day => "day",
            Scale::Week => "week",
            Scale::Month => "month",
            Scale::Year => "year",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CompareArgs {
    pub domain_id: Option<String>,
    pub period: Option<Period>,
    pub compare: Option<CompareMode>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub compare_from: Option<String>,
    pub compare_to: Option<String>,
    pub scale: Option<Scale>,
}

/// Inclusive `YYYY-MM-DD` bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Window {
    pub from: String,
    pub to: String,
}

impl From<DateRange> for Window {
    fn from(range: DateRange) -> Self {
        Self {
            from: range.from_label(),
            to: range.to_label(),
        }
    }
}

/// The two windows a comparison will fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparePlan {
    pub current: Window,
    pub previous: Window,
    pub scale: Scale,
}

impl CompareArgs {
    /// Work out both windows without touching the network.
    ///
    /// `compare: "custom"` needs all four explicit bounds. Any other mode
    /// needs a named period.
    pub fn plan(&self, now: NaiveDateTime) -> Result<ComparePlan> {
        let scale = self.scale.unwrap_or_default();
        let mode = self.compare.unwrap_or_default();

        if mode == CompareMode::Custom {
            let bounds = [&self.from, &self.to, &self.compare_from, &self.compare_to];
            let given: Vec<&str> = bounds
                .iter()
                .filter_map(|b| b.as_deref().filter(|v| !v.is_empty()))
                .collect();
            if given.len() != bounds.len() {
                return Err(PirschError::validation(
                    "Custom comparison requires from, to, compare_from and compare_to",
                ));
            }
            for value in &given {
                NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
                    PirschError::validation(format!("Invalid date '{}' (use YYYY-MM-DD)", value))
                })?;
            }
            return Ok(ComparePlan {
                current: Window {
                    from: given[0].to_string(),
                    to: given[1].to_string(),
                },
                previous: Window {
                    from: given[2].to_string(),
                    to: given[3].to_string(),
                },
                scale,
            });
        }

        let period = self.period.ok_or_else(|| {
            PirschError::validation(
                "Provide either period or custom from/to + compare_from/compare_to",
            )
        })?;
        let current = resolve_at(period, now);
        let previous = current.comparison(mode).unwrap_or_else(|| current.previous_period());
        Ok(ComparePlan {
            current: current.into(),
            previous: previous.into(),
            scale,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2024-03-13T10:00:00", "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    fn compare(args: Value) -> CompareArgs {
        match ToolRequest::parse(COMPARE, args).unwrap() {
            ToolRequest::Compare(args) => args,
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_tool_is_unknown_operation() {
        let err = ToolRequest::parse("pirsch_nope", json!({})).unwrap_err();
        assert!(matches!(err, PirschError::UnknownOperation(name) if name == "pirsch_nope"));
    }

    #[test]
    fn test_null_arguments_are_empty() {
        let req = ToolRequest::parse(TOTAL, Value::Null).unwrap();
        assert_eq!(req, ToolRequest::Total(FilterArgs::default()));
        assert_eq!(req.name(), TOTAL);
    }

    #[test]
    fn test_filter_args_parse_leniently() {
        let req = ToolRequest::parse(
            PAGES,
            json!({"domain_id": "d", "filter": {"limit": "x", "include_title": false}}),
        )
        .unwrap();
        let ToolRequest::Pages(args) = req else {
            panic!("expected pages request");
        };
        let filter = args.filter();
        assert_eq!(filter.limit, None);
        assert_eq!(filter.include_title, Some(false));
        assert_eq!(args.domain_id.as_deref(), Some("d"));
    }

    #[test]
    fn test_utm_requires_type() {
        let err = ToolRequest::parse(UTM, json!({"domain_id": "d"})).unwrap_err();
        assert!(matches!(err, PirschError::Validation(_)));

        let err = ToolRequest::parse(UTM, json!({"type": "keyword"})).unwrap_err();
        assert!(matches!(err, PirschError::Validation(_)));

        let req = ToolRequest::parse(UTM, json!({"type": "campaign"})).unwrap();
        let ToolRequest::Utm(args) = req else {
            panic!("expected utm request");
        };
        assert_eq!(args.dimension.endpoint(), "/statistics/utm/campaign");
    }

    #[test]
    fn test_active_defaults_to_ten_minutes() {
        let ToolRequest::Active(args) = ToolRequest::parse(ACTIVE, json!({})).unwrap() else {
            panic!("expected active request");
        };
        assert_eq!(args.start_seconds(), Number::from(600u64));
    }

    #[test]
    fn test_active_accepts_any_number() {
        for start in [json!(1.5), json!(-30), json!(0)] {
            let ToolRequest::Active(args) =
                ToolRequest::parse(ACTIVE, json!({ "start": start.clone() })).unwrap()
            else {
                panic!("expected active request");
            };
            assert_eq!(Value::Number(args.start_seconds()), start);
        }

        let err = ToolRequest::parse(ACTIVE, json!({ "start": "ten" })).unwrap_err();
        assert!(matches!(err, PirschError::Validation(_)));
    }

    #[test]
    fn test_unknown_period_is_validation_error() {
        let err = ToolRequest::parse(COMPARE, json!({"period": "fortnight"})).unwrap_err();
        assert!(matches!(err, PirschError::Validation(_)));
    }

    #[test]
    fn test_plan_requires_period_or_custom_bounds() {
        let err = compare(json!({})).plan(now()).unwrap_err();
        assert!(matches!(err, PirschError::Validation(_)));
    }

    #[test]
    fn test_plan_custom_without_compare_bounds_fails() {
        let args = compare(json!({"compare": "custom", "from": "2024-03-01", "to": "2024-03-07"}));
        let err = args.plan(now()).unwrap_err();
        assert!(matches!(err, PirschError::Validation(_)));
    }

    #[test]
    fn test_plan_custom_with_period_still_needs_bounds() {
        let args = compare(json!({"compare": "custom", "period": "week"}));
        assert!(args.plan(now()).is_err());
    }

    #[test]
    fn test_plan_custom_rejects_malformed_dates() {
        let args = compare(json!({
            "compare": "custom",
            "from": "2024-03-01", "to": "March 7",
            "compare_from": "2024-02-01", "compare_to": "2024-02-07"
        }));
        assert!(matches!(args.plan(now()), Err(PirschError::Validation(_))));
    }

    #[test]
    fn test_plan_custom_uses_literal_bounds() {
        let args = compare(json!({
            "compare": "custom",
            "from": "2024-03-01", "to": "2024-03-07",
            "compare_from": "2024-02-01", "compare_to": "2024-02-07",
            "scale": "week"
        }));
        let plan = args.plan(now()).unwrap();
        assert_eq!(plan.current, Window { from: "2024-03-01".into(), to: "2024-03-07".into() });
        assert_eq!(plan.previous, Window { from: "2024-02-01".into(), to: "2024-02-07".into() });
        assert_eq!(plan.scale, Scale::Week);
    }

    #[test]
    fn test_plan_period_defaults_to_previous_window() {
        let plan = compare(json!({"period": "week"})).plan(now()).unwrap();
        assert_eq!(plan.current, Window { from: "2024-03-11".into(), to: "2024-03-17".into() });
        assert_eq!(plan.previous, Window { from: "2024-03-04".into(), to: "2024-03-10".into() });
        assert_eq!(plan.scale, Scale::Day);
    }

    #[test]
    fn test_plan_period_against_last_year() {
        let plan = compare(json!({"period": "yesterday", "compare": "year"}))
            .plan(now())
            .unwrap();
        assert_eq!(plan.current, Window { from: "2024-03-12".into(), to: "2024-03-12".into() });
        assert_eq!(plan.previous, Window { from: "2023-03-12".into(), to: "2023-03-12".into() });
    }
}
