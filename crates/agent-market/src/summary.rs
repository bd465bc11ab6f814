//! Fetch summary reported back to the model

use crate::model::OhlcvSeries;
use serde::{Deserialize, Serialize};

/// Round to `places` decimal places
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Compact description of a stored fetch
///
/// Both dispatch tiers report fetches in this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchSummary {
    pub status: String,
    pub data_id: String,
    pub symbol: String,
    pub name: String,
    pub records: usize,
    /// `YYYY-MM-DD to YYYY-MM-DD`
    pub date_range: String,
    pub latest_price: f64,
    /// Signed percentage change first to last close, e.g. `+3.25%`
    pub period_change: String,
    /// `low - high` over the window
    pub price_range: String,
}

impl FetchSummary {
    /// Summarise a non-empty series; `None` for an empty one
    pub fn from_series(data_id: &str, symbol: &str, name: &str, series: &OhlcvSeries) -> Option<Self> {
        let (first, last) = (series.first()?, series.last()?);
        let (low, high) = series.price_range()?;
        let change_pct = (last.close - first.close) / first.close * 100.0;

        Some(Self {
            status: "success".to_string(),
            data_id: data_id.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
            records: series.len(),
            date_range: format!(
                "{} to {}",
                first.date.format("%Y-%m-%d"),
                last.date.format("%Y-%m-%d")
            ),
            latest_price: round_to(last.close, 2),
            period_change: format!("{change_pct:+.2}%"),
            price_range: format!("{low:.2} - {high:.2}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::tests::series_from_closes;

    #[test]
    fn test_round_to() {
        assert!((round_to(12.3456, 2) - 12.35).abs() < 1e-12);
        assert!((round_to(-0.123_456, 4) + 0.1235).abs() < 1e-12);
    }

    #[test]
    fn test_summary_fields() {
        let series = series_from_closes(&[10.0, 10.5, 11.0]);
        let summary = FetchSummary::from_series("data_1", "600519", "贵州茅台", &series).unwrap();

        assert_eq!(summary.records, 3);
        assert_eq!(summary.date_range, "2024-01-01 to 2024-01-03");
        assert!((summary.latest_price - 11.0).abs() < 1e-12);
        assert_eq!(summary.period_change, "+10.00%");
        assert_eq!(summary.price_range, "9.50 - 11.50");
    }

    #[test]
    fn test_negative_change() {
        let series = series_from_closes(&[20.0, 19.0]);
        let summary = FetchSummary::from_series("data_2", "510300", "510300", &series).unwrap();
        assert_eq!(summary.period_change, "-5.00%");
    }

    #[test]
    fn test_empty_series_has_no_summary() {
        let series = OhlcvSeries::new(Vec::new()).unwrap();
        assert!(FetchSummary::from_series("data_1", "x", "x", &series).is_none());
    }
}
