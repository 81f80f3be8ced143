//! Calendar-aligned date ranges for named periods and their comparison windows.
//!
//! All arithmetic is done on local calendar dates; ranges run from 00:00:00.000
//! on the first day to 23:59:59.999 on the last.

use chrono::{Datelike, Duration, Local, Months, NaiveDate, NaiveDateTime, NaiveTime};
use pirsch_core::error::PirschError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named relative period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Period {
    Today,
    Yesterday,
    /// Monday to Sunday of the current week.
    Week,
    LastWeek,
    Month,
    LastMonth,
}

impl Period {
    pub const ALL: [Period; 6] = [
        Period::Today,
        Period::Yesterday,
        Period::Week,
        Period::LastWeek,
        Period::Month,
        Period::LastMonth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Today => "today",
            Period::Yesterday => "yesterday",
            Period::Week => "week",
            Period::LastWeek => "lastWeek",
            Period::Month => "month",
            Period::LastMonth => "lastMonth",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = PirschError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| {
                PirschError::validation(format!(
                    "Unknown period '{}' (expected one of: today, yesterday, week, lastWeek, month, lastMonth)",
                    s
                ))
            })
    }
}

/// How the comparison window is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareMode {
    /// Equal-length window immediately before the current one.
    #[default]
    Previous,
    /// Same dates one year earlier.
    Year,
    /// Caller-supplied bounds.
    Custom,
}

/// Inclusive range of whole local days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    /// Range covering `first` through `last`, both whole days.
    pub fn days(first: NaiveDate, last: NaiveDate) -> Self {
        Self {
            start: first.and_time(NaiveTime::MIN),
            end: end_of_day(last),
        }
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end.date()
    }

    /// Number of calendar days covered, counting both ends.
    pub fn day_count(&self) -> i64 {
        (self.end_date() - self.start_date()).num_days() + 1
    }

    /// `YYYY-MM-DD` of the first day.
    pub fn from_label(&self) -> String {
        self.start_date().format("%Y-%m-%d").to_string()
    }

    /// `YYYY-MM-DD` of the last day.
    pub fn to_label(&self) -> String {
        self.end_date().format("%Y-%m-%d").to_string()
    }

    /// The window of the same length ending the day before this one starts.
    pub fn previous_period(&self) -> Self {
        let len = self.day_count();
        let last = self.start_date() - Duration::days(1);
        let first = last - Duration::days(len - 1);
        Self::days(first, last)
    }

    /// Same month and day one year earlier. Feb 29 lands on Feb 28.
    pub fn previous_year(&self) -> Self {
        Self::days(
            shift_back_one_year(self.start_date()),
            shift_back_one_year(self.end_date()),
        )
    }

    /// Comparison window for `mode`; `None` for custom, which has no derivation.
    pub fn comparison(&self, mode: CompareMode) -> Option<Self> {
        match mode {
            CompareMode::Previous => Some(self.previous_period()),
            CompareMode::Year => Some(self.previous_year()),
            CompareMode::Custom => None,
        }
    }
}

/// Resolve `period` against the current local time.
pub fn resolve(period: Period) -> DateRange {
    resolve_at(period, Local::now().naive_local())
}

/// Resolve `period` against a fixed "now".
pub fn resolve_at(period: Period, now: NaiveDateTime) -> DateRange {
    let today = now.date();
    match period {
        Period::Today => DateRange::days(today, today),
        Period::Yesterday => {
            let yesterday = today - Duration::days(1);
            DateRange::days(yesterday, yesterday)
        }
        Period::Week => {
            let monday = monday_of(today);
            DateRange::days(monday, monday + Duration::days(6))
        }
        Period::LastWeek => {
            let monday = monday_of(today) - Duration::days(7);
            DateRange::days(monday, monday + Duration::days(6))
        }
        Period::Month => {
            let first = first_of_month(today);
            DateRange::days(first, last_of_month(first))
        }
        Period::LastMonth => {
            let this_month = first_of_month(today);
            let first = this_month
                .checked_sub_months(Months::new(1))
                .unwrap_or(this_month);
            DateRange::days(first, last_of_month(first))
        }
    }
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_else(|| date.and_time(NaiveTime::MIN))
}

fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn last_of_month(first: NaiveDate) -> NaiveDate {
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(first)
}

fn shift_back_one_year(date: NaiveDate) -> NaiveDate {
    date.checked_sub_months(Months::new(12)).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn labels(range: DateRange) -> (String, String) {
        (range.from_label(), range.to_label())
    }

    #[test]
    fn test_today_spans_whole_day() {
        let range = resolve_at(Period::Today, now("2024-03-15T10:00:00"));
        assert_eq!(range.start, now("2024-03-15T00:00:00"));
        assert_eq!(range.end, date("2024-03-15").and_hms_milli_opt(23, 59, 59, 999).unwrap());
    }

    #[test]
    fn test_yesterday_starts_and_ends_same_day() {
        let range = resolve_at(Period::Yesterday, now("2024-03-15T10:00:00"));
        assert_eq!(range.start_date(), date("2024-03-14"));
        assert_eq!(range.end_date(), date("2024-03-14"));
        assert_eq!(range.start.time(), NaiveTime::MIN);
        assert_eq!(range.end.format("%H:%M:%S%.3f").to_string(), "23:59:59.999");
    }

    #[test]
    fn test_yesterday_across_month_boundary() {
        let range = resolve_at(Period::Yesterday, now("2024-03-01T00:30:00"));
        assert_eq!(labels(range), ("2024-02-29".into(), "2024-02-29".into()));
    }

    #[test]
    fn test_week_from_wednesday() {
        // 2024-03-13 is a Wednesday.
        let range = resolve_at(Period::Week, now("2024-03-13T12:00:00"));
        assert_eq!(labels(range), ("2024-03-11".into(), "2024-03-17".into()));
    }

    #[test]
    fn test_week_from_sunday_goes_back_six_days() {
        let range = resolve_at(Period::Week, now("2024-03-17T12:00:00"));
        assert_eq!(labels(range), ("2024-03-11".into(), "2024-03-17".into()));
    }

    #[test]
    fn test_week_from_monday() {
        let range = resolve_at(Period::Week, now("2024-03-11T08:00:00"));
        assert_eq!(labels(range), ("2024-03-11".into(), "2024-03-17".into()));
    }

    #[test]
    fn test_last_week_across_year_boundary() {
        // 2024-01-03 is a Wednesday; its week starts on 2024-01-01.
        let range = resolve_at(Period::LastWeek, now("2024-01-03T12:00:00"));
        assert_eq!(labels(range), ("2023-12-25".into(), "2023-12-31".into()));
    }

    #[test]
    fn test_month_in_leap_february() {
        let range = resolve_at(Period::Month, now("2024-02-10T12:00:00"));
        assert_eq!(labels(range), ("2024-02-01".into(), "2024-02-29".into()));
    }

    #[test]
    fn test_month_in_december() {
        let range = resolve_at(Period::Month, now("2023-12-31T23:00:00"));
        assert_eq!(labels(range), ("2023-12-01".into(), "2023-12-31".into()));
    }

    #[test]
    fn test_last_month_from_january() {
        let range = resolve_at(Period::LastMonth, now("2024-01-15T12:00:00"));
        assert_eq!(labels(range), ("2023-12-01".into(), "2023-12-31".into()));
    }

    #[test]
    fn test_last_month_from_end_of_march() {
        // No rollover surprises from the 31st.
        let range = resolve_at(Period::LastMonth, now("2024-03-31T12:00:00"));
        assert_eq!(labels(range), ("2024-02-01".into(), "2024-02-29".into()));
    }

    #[test]
    fn test_previous_period_of_three_days() {
        let current = DateRange::days(date("2024-03-10"), date("2024-03-12"));
        let previous = current.previous_period();
        assert_eq!(labels(previous), ("2024-03-07".into(), "2024-03-09".into()));
        assert_eq!(previous.day_count(), current.day_count());
    }

    #[test]
    fn test_previous_period_of_single_day() {
        let current = DateRange::days(date("2024-03-01"), date("2024-03-01"));
        assert_eq!(labels(current.previous_period()), ("2024-02-29".into(), "2024-02-29".into()));
    }

    #[test]
    fn test_previous_period_of_month_has_equal_length() {
        let current = resolve_at(Period::Month, now("2024-03-20T09:00:00"));
        let previous = current.previous_period();
        assert_eq!(previous.day_count(), 31);
        assert_eq!(labels(previous), ("2024-01-30".into(), "2024-02-29".into()));
    }

    #[test]
    fn test_previous_year_keeps_month_and_day() {
        let current = DateRange::days(date("2024-03-10"), date("2024-03-16"));
        assert_eq!(labels(current.previous_year()), ("2023-03-10".into(), "2023-03-16".into()));
    }

    #[test]
    fn test_previous_year_from_leap_day() {
        let current = resolve_at(Period::Month, now("2024-02-29T12:00:00"));
        assert_eq!(labels(current.previous_year()), ("2023-02-01".into(), "2023-02-28".into()));
    }

    #[test]
    fn test_comparison_modes() {
        let current = DateRange::days(date("2024-03-10"), date("2024-03-12"));
        assert_eq!(current.comparison(CompareMode::Previous), Some(current.previous_period()));
        assert_eq!(current.comparison(CompareMode::Year), Some(current.previous_year()));
        assert_eq!(current.comparison(CompareMode::Custom), None);
    }

    #[test]
    fn test_period_parse() {
        assert_eq!("lastWeek".parse::<Period>().unwrap(), Period::LastWeek);
        assert!(matches!(
            "fortnight".parse::<Period>(),
            Err(PirschError::Validation(_))
        ));
        // Tags are case-sensitive.
        assert!("LastWeek".parse::<Period>().is_err());
    }

    #[test]
    fn test_period_serde_names() {
        let p: Period = serde_json::from_str("\"lastMonth\"").unwrap();
        assert_eq!(p, Period::LastMonth);
        assert_eq!(serde_json::to_string(&Period::LastWeek).unwrap(), "\"lastWeek\"");
        let mode: CompareMode = serde_json::from_str("\"year\"").unwrap();
        assert_eq!(mode, CompareMode::Year);
        assert_eq!(CompareMode::default(), CompareMode::Previous);
    }
}
