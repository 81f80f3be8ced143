//! Period totals and growth between two periods.
//!
//! Folds a visitor time series into additive totals and compares two totals
//! metric by metric.

use pirsch_core::error::Result;
use pirsch_core::types::VisitorsPoint;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Summed counts over a series.
///
/// `bounce_rate` and `cr` are not summable; they stay at zero and callers
/// that need them derive them from the counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub visitors: u64,
    pub views: u64,
    pub sessions: u64,
    pub bounces: u64,
    pub bounce_rate: f64,
    pub cr: f64,
}

/// Sum the counts of every bucket.
pub fn sum_series(series: &[VisitorsPoint]) -> Totals {
    series.iter().fold(Totals::default(), |acc, p| Totals {
        visitors: acc.visitors + p.visitors,
        views: acc.views + p.views,
        sessions: acc.sessions + p.sessions,
        bounces: acc.bounces + p.bounces,
        bounce_rate: 0.0,
        cr: 0.0,
    })
}

/// Relative change from `previous` to `current`. `None` when there is no
/// baseline to compare against.
pub fn pct_change(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    Some((current - previous) / previous)
}

/// One metric in both periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricChange {
    pub current: u64,
    pub previous: u64,
    /// Serialized as `null` when undefined.
    pub change: Option<f64>,
}

impl MetricChange {
    pub fn new(current: u64, previous: u64) -> Self {
        Self {
            current,
            previous,
            change: pct_change(current as f64, previous as f64),
        }
    }
}

/// Per-metric comparison of two totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalsComparison {
    pub visitors: MetricChange,
    pub views: MetricChange,
    pub sessions: MetricChange,
    pub bounces: MetricChange,
}

pub fn compare_totals(current: &Totals, previous: &Totals) -> TotalsComparison {
    TotalsComparison {
        visitors: MetricChange::new(current.visitors, previous.visitors),
        views: MetricChange::new(current.views, previous.views),
        sessions: MetricChange::new(current.sessions, previous.sessions),
        bounces: MetricChange::new(current.bounces, previous.bounces),
    }
}

/// Read a visitor series from a raw API response. `null` is an empty series.
pub fn series_from_value(value: &Value) -> Result<Vec<VisitorsPoint>> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    Ok(Vec::<VisitorsPoint>::deserialize(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn point(visitors: u64, views: u64, sessions: u64, bounces: u64, bounce_rate: f64) -> VisitorsPoint {
        VisitorsPoint {
            visitors,
            views,
            sessions,
            bounces,
            bounce_rate,
            cr: 0.3,
            ..VisitorsPoint::default()
        }
    }

    #[test]
    fn test_sum_empty_series() {
        assert_eq!(sum_series(&[]), Totals::default());
    }

    #[test]
    fn test_sum_adds_counts() {
        let totals = sum_series(&[point(10, 20, 12, 3, 0.25), point(5, 8, 6, 1, 0.5)]);
        assert_eq!(totals.visitors, 15);
        assert_eq!(totals.views, 28);
        assert_eq!(totals.sessions, 18);
        assert_eq!(totals.bounces, 4);
    }

    #[test]
    fn test_sum_zeroes_rates() {
        let totals = sum_series(&[point(1, 1, 1, 1, 1.0), point(2, 2, 2, 2, 0.9)]);
        assert_eq!(totals.bounce_rate, 0.0);
        assert_eq!(totals.cr, 0.0);
    }

    #[test]
    fn test_pct_change() {
        let change = pct_change(120.0, 100.0).unwrap();
        assert!((change - 0.2).abs() < 1e-9);
        assert!((pct_change(50.0, 100.0).unwrap() + 0.5).abs() < 1e-9);
        assert_eq!(pct_change(0.0, 10.0), Some(-1.0));
    }

    #[test]
    fn test_pct_change_without_baseline() {
        assert_eq!(pct_change(0.0, 0.0), None);
        assert_eq!(pct_change(42.0, 0.0), None);
    }

    #[test]
    fn test_compare_totals_serializes_null_change() {
        let current = Totals {
            visitors: 12,
            views: 30,
            ..Totals::default()
        };
        let previous = Totals {
            visitors: 10,
            ..Totals::default()
        };
        let cmp = compare_totals(&current, &previous);
        let value = serde_json::to_value(&cmp).unwrap();
        assert_eq!(value["visitors"]["current"], json!(12));
        assert_eq!(value["visitors"]["previous"], json!(10));
        assert!((value["visitors"]["change"].as_f64().unwrap() - 0.2).abs() < 1e-9);
        assert_eq!(value["views"]["change"], Value::Null);
    }

    #[test]
    fn test_series_from_value() {
        let series = series_from_value(&json!([
            {"day": "2024-03-10", "visitors": 3, "views": 4, "sessions": 3, "bounces": 1, "bounce_rate": 0.33, "cr": 0},
            {"day": "2024-03-11", "visitors": 2}
        ]))
        .unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(sum_series(&series).visitors, 5);

        assert!(series_from_value(&Value::Null).unwrap().is_empty());
        assert!(series_from_value(&json!({"unexpected": true})).is_err());
    }
}
