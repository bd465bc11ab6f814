//! In-memory market for tests
//!
//! Enabled for this crate's own tests and, through the `test-util` feature,
//! for the dev-dependencies of the crates built on top of it.

use crate::dates::DateRange;
use crate::error::{MarketError, Result};
use crate::model::{Adjustment, Bar, InstrumentKind, OhlcvSeries};
use crate::provider::MarketDataProvider;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Closes `10.0, 10.1, 10.2, ...` on consecutive days from 2024-01-01
pub fn ramp_series(len: usize) -> Result<OhlcvSeries> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
    let bars = start
        .iter_days()
        .take(len)
        .enumerate()
        .map(|(i, date)| {
            let close = 10.0 + i as f64 * 0.1;
            Bar::new(date, close - 0.05, close + 0.1, close - 0.1, close, 10_000.0 + i as f64)
        })
        .collect();
    OhlcvSeries::new(bars)
}

/// Provider answering every fetch with the same ramp, whatever the symbol
#[derive(Debug, Clone, Default)]
pub struct StubProvider {
    len: usize,
    name: Option<String>,
    error: Option<String>,
}

impl StubProvider {
    pub fn with_len(len: usize) -> Self {
        Self {
            len,
            ..Self::default()
        }
    }

    /// Display name reported for every symbol
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Every fetch fails with a provider error carrying `message`
    pub fn failing(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl MarketDataProvider for StubProvider {
    async fn fetch_instrument_series(
        &self,
        _kind: InstrumentKind,
        _symbol: &str,
        _range: DateRange,
        _adjustment: Adjustment,
    ) -> Result<OhlcvSeries> {
        match &self.error {
            Some(message) => Err(MarketError::Provider(message.clone())),
            None => ramp_series(self.len),
        }
    }

    async fn fetch_display_name(&self, _symbol: &str) -> Option<String> {
        self.name.clone()
    }
}
