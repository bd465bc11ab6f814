//! Market data provider boundary

use crate::dates::DateRange;
use crate::error::Result;
use crate::model::{Adjustment, InstrumentKind, OhlcvSeries};
use async_trait::async_trait;

/// Source of daily bars and display names
///
/// Fetch tools depend on this trait only, so tests can swap in a stub.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Daily bars for `symbol` within `range`
    ///
    /// Fails with [`crate::MarketError::NotFound`] when the window has no rows.
    async fn fetch_instrument_series(
        &self,
        kind: InstrumentKind,
        symbol: &str,
        range: DateRange,
        adjustment: Adjustment,
    ) -> Result<OhlcvSeries>;

    /// Human-readable name, when the source knows one
    async fn fetch_display_name(&self, symbol: &str) -> Option<String>;
}
