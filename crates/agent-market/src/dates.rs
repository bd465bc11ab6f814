//! Look-back window resolution
//!
//! Every fetch tool, whichever tier serves it, turns `days` / `start_date` /
//! `end_date` into a window with [`DateRange::resolve`].

use crate::error::{MarketError, Result};
use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Window used when neither `days` nor both bounds are given
pub const DEFAULT_LOOKBACK_DAYS: i64 = 60;

const COMPACT: &str = "%Y%m%d";

/// Inclusive date window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// `[today - days, today]`
    ///
    /// Fails for negative `days` and for windows reaching past the calendar
    /// range chrono can represent.
    pub fn trailing(days: i64, today: NaiveDate) -> Result<Self> {
        if days < 0 {
            return Err(MarketError::InvalidDate(format!("days must not be negative, got {days}")));
        }
        let start = Duration::try_days(days)
            .and_then(|span| today.checked_sub_signed(span))
            .ok_or_else(|| MarketError::InvalidDate(format!("{days} days back from {today} is out of range")))?;
        Ok(Self { start, end: today })
    }

    /// Resolve the window for a fetch request
    ///
    /// `days` wins when present. Otherwise both bounds must be given, in
    /// `YYYYMMDD` form. Anything else falls back to the trailing 60 days.
    pub fn resolve(
        days: Option<i64>,
        start: Option<&str>,
        end: Option<&str>,
        today: NaiveDate,
    ) -> Result<Self> {
        if let Some(days) = days {
            return Self::trailing(days, today);
        }
        match (start, end) {
            (Some(start), Some(end)) => {
                let range = Self {
                    start: parse_compact(start)?,
                    end: parse_compact(end)?,
                };
                if range.start > range.end {
                    return Err(MarketError::InvalidDate(format!(
                        "start {start} is after end {end}"
                    )));
                }
                Ok(range)
            }
            _ => Self::trailing(DEFAULT_LOOKBACK_DAYS, today),
        }
    }

    /// [`DateRange::resolve`] against the local calendar date
    pub fn resolve_today(days: Option<i64>, start: Option<&str>, end: Option<&str>) -> Result<Self> {
        Self::resolve(days, start, end, Local::now().date_naive())
    }

    /// Start as `YYYYMMDD`
    pub fn start_compact(&self) -> String {
        self.start.format(COMPACT).to_string()
    }

    /// End as `YYYYMMDD`
    pub fn end_compact(&self) -> String {
        self.end.format(COMPACT).to_string()
    }
}

/// Parse a `YYYYMMDD` date
pub fn parse_compact(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), COMPACT)
        .map_err(|_| MarketError::InvalidDate(format!("{raw} (expected YYYYMMDD)")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn test_days_wins_over_bounds() {
        let range = DateRange::resolve(Some(7), Some("20240101"), Some("20240201"), today()).unwrap();
        assert_eq!(range.end_compact(), "20240615");
        assert_eq!(range.start_compact(), "20240608");
        assert_eq!(range.start, range.end - Duration::days(7));
    }

    #[test]
    fn test_explicit_bounds() {
        let range = DateRange::resolve(None, Some("20240101"), Some("20240201"), today()).unwrap();
        assert_eq!(range.start_compact(), "20240101");
        assert_eq!(range.end_compact(), "20240201");
    }

    #[test]
    fn test_single_bound_falls_back_to_default() {
        let range = DateRange::resolve(None, Some("20240101"), None, today()).unwrap();
        assert_eq!(range, DateRange::trailing(60, today()).unwrap());
        assert_eq!(range.start_compact(), "20240416");
    }

    #[test]
    fn test_nothing_given() {
        let range = DateRange::resolve(None, None, None, today()).unwrap();
        assert_eq!(range.end, today());
        assert_eq!((range.end - range.start).num_days(), 60);
    }

    #[test]
    fn test_bad_format() {
        let result = DateRange::resolve(None, Some("2024-01-01"), Some("20240201"), today());
        assert!(matches!(result, Err(MarketError::InvalidDate(_))));
    }

    #[test]
    fn test_huge_days_is_an_error() {
        for days in [1_000_000_000_000_i64, i64::MAX, 4_000_000_000] {
            let result = DateRange::resolve(Some(days), None, None, today());
            assert!(matches!(result, Err(MarketError::InvalidDate(_))), "days = {days}");
        }
        assert!(DateRange::trailing(-1, today()).is_err());
        assert_eq!(DateRange::trailing(0, today()).unwrap().start, today());
    }

    #[test]
    fn test_inverted_bounds() {
        let result = DateRange::resolve(None, Some("20240301"), Some("20240201"), today());
        assert!(result.is_err());
    }
}
