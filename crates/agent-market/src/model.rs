//! Daily OHLCV data model

use crate::error::{MarketError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One trading day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Turnover, when the source reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

impl Bar {
    /// Bar without turnover
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
            amount: None,
        }
    }
}

/// Time-ordered daily bars with strictly increasing dates
///
/// Never mutated after construction; indicator computation works on copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvSeries {
    bars: Vec<Bar>,
}

impl OhlcvSeries {
    /// Build a series, rejecting out-of-order or duplicate dates
    pub fn new(bars: Vec<Bar>) -> Result<Self> {
        if let Some(pair) = bars.windows(2).find(|pair| pair[0].date >= pair[1].date) {
            return Err(MarketError::InvalidSeries(format!(
                "dates must be strictly increasing: {} then {}",
                pair[0].date, pair[1].date
            )));
        }
        Ok(Self { bars })
    }

    /// All bars in date order
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Number of bars
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// True when the series has no bars
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// First bar
    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    /// Last bar
    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Dates column
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    /// Close column
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Volume column
    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    /// First and last dates
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.first()?.date, self.last()?.date))
    }

    /// Lowest low and highest high
    pub fn price_range(&self) -> Option<(f64, f64)> {
        if self.bars.is_empty() {
            return None;
        }
        let low = self.bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let high = self
            .bars
            .iter()
            .map(|b| b.high)
            .fold(f64::NEG_INFINITY, f64::max);
        Some((low, high))
    }
}

/// Kind of instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentKind {
    Stock,
    Etf,
}

impl InstrumentKind {
    /// Guess the kind from an exchange code
    ///
    /// Shanghai ETFs start with `5`, Shenzhen ETFs with `15`.
    pub fn detect(symbol: &str) -> Self {
        if symbol.starts_with('5') || symbol.starts_with("15") {
            Self::Etf
        } else {
            Self::Stock
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stock => "stock",
            Self::Etf => "etf",
        }
    }
}

impl fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Price adjustment for corporate actions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Adjustment {
    /// Raw prices
    #[serde(rename = "")]
    None,
    /// Forward adjusted (前复权)
    #[default]
    #[serde(rename = "qfq")]
    Forward,
    /// Backward adjusted (后复权)
    #[serde(rename = "hfq")]
    Backward,
}

impl Adjustment {
    /// Parse the conventional short codes; anything unknown is rejected
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "" | "none" => Some(Self::None),
            "qfq" => Some(Self::Forward),
            "hfq" => Some(Self::Backward),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_series_accessors() {
        let series = OhlcvSeries::new(vec![
            Bar::new(day(1), 10.0, 11.0, 9.5, 10.5, 1000.0),
            Bar::new(day(4), 10.5, 12.0, 10.0, 11.8, 1500.0),
        ])
        .unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.closes(), vec![10.5, 11.8]);
        assert_eq!(series.date_range(), Some((day(1), day(4))));
        assert_eq!(series.price_range(), Some((9.5, 12.0)));
    }

    #[test]
    fn test_series_rejects_duplicate_dates() {
        let result = OhlcvSeries::new(vec![
            Bar::new(day(1), 1.0, 1.0, 1.0, 1.0, 1.0),
            Bar::new(day(1), 1.0, 1.0, 1.0, 1.0, 1.0),
        ]);
        assert!(matches!(result, Err(MarketError::InvalidSeries(_))));
    }

    #[test]
    fn test_series_rejects_descending_dates() {
        let result = OhlcvSeries::new(vec![
            Bar::new(day(5), 1.0, 1.0, 1.0, 1.0, 1.0),
            Bar::new(day(2), 1.0, 1.0, 1.0, 1.0, 1.0),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_series() {
        let series = OhlcvSeries::new(Vec::new()).unwrap();
        assert!(series.is_empty());
        assert!(series.date_range().is_none());
        assert!(series.price_range().is_none());
    }

    #[test]
    fn test_instrument_detection() {
        assert_eq!(InstrumentKind::detect("510300"), InstrumentKind::Etf);
        assert_eq!(InstrumentKind::detect("159915"), InstrumentKind::Etf);
        assert_eq!(InstrumentKind::detect("600519"), InstrumentKind::Stock);
        assert_eq!(InstrumentKind::detect("000001"), InstrumentKind::Stock);
        assert_eq!(InstrumentKind::Etf.to_string(), "etf");
    }

    #[test]
    fn test_adjustment_codes() {
        assert_eq!(Adjustment::parse("qfq"), Some(Adjustment::Forward));
        assert_eq!(Adjustment::parse("hfq"), Some(Adjustment::Backward));
        assert_eq!(Adjustment::parse(""), Some(Adjustment::None));
        assert_eq!(Adjustment::parse("xyz"), None);
        assert_eq!(serde_json::to_string(&Adjustment::Forward).unwrap(), "\"qfq\"");
    }
}
