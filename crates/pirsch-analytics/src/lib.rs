//! Date ranges and aggregation for period comparisons.
//!
//! Resolves named periods (today, week, lastMonth, ...) into calendar-aligned
//! ranges, derives the window to compare against, and sums visitor series
//! into totals with per-metric growth.

pub mod aggregations;
pub mod period;

pub use aggregations::{compare_totals, pct_change, sum_series, MetricChange, Totals, TotalsComparison};
pub use period::{resolve, resolve_at, CompareMode, DateRange, Period};
