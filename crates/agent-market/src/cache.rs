//! Caching layer for market data to reduce API calls

use crate::dates::DateRange;
use crate::error::Result;
use crate::model::{Adjustment, InstrumentKind, OhlcvSeries};
use crate::provider::MarketDataProvider;
use async_trait::async_trait;
use cached::{Cached, TimedCache};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Cache key for a series request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesKey {
    pub kind: InstrumentKind,
    pub symbol: String,
    pub range: (chrono::NaiveDate, chrono::NaiveDate),
    pub adjustment: Adjustment,
}

impl SeriesKey {
    fn new(kind: InstrumentKind, symbol: &str, range: DateRange, adjustment: Adjustment) -> Self {
        Self {
            kind,
            symbol: symbol.to_string(),
            range: (range.start, range.end),
            adjustment,
        }
    }
}

/// Provider decorator that keeps recent answers for a fixed lifespan
///
/// Failures are not cached. Display names are cached only when found.
pub struct CachingProvider<P> {
    inner: P,
    series: Arc<RwLock<TimedCache<SeriesKey, OhlcvSeries>>>,
    names: Arc<RwLock<TimedCache<String, String>>>,
}

impl<P: MarketDataProvider> CachingProvider<P> {
    /// Wrap `inner` with caches of lifespan `ttl`
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            series: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
            names: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    /// Number of cached series
    pub async fn cached_series(&self) -> usize {
        self.series.read().await.cache_size()
    }

    /// Drop every cached entry
    pub async fn clear(&self) {
        self.series.write().await.cache_clear();
        self.names.write().await.cache_clear();
    }
}

#[async_trait]
impl<P: MarketDataProvider> MarketDataProvider for CachingProvider<P> {
    async fn fetch_instrument_series(
        &self,
        kind: InstrumentKind,
        symbol: &str,
        range: DateRange,
        adjustment: Adjustment,
    ) -> Result<OhlcvSeries> {
        let key = SeriesKey::new(kind, symbol, range, adjustment);
        if let Some(series) = self.series.write().await.cache_get(&key).cloned() {
            debug!(symbol, "Cache hit for series");
            return Ok(series);
        }

        debug!(symbol, "Cache miss for series");
        let series = self
            .inner
            .fetch_instrument_series(kind, symbol, range, adjustment)
            .await?;
        let _ = self.series.write().await.cache_set(key, series.clone());
        Ok(series)
    }

    async fn fetch_display_name(&self, symbol: &str) -> Option<String> {
        if let Some(name) = self.names.write().await.cache_get(symbol).cloned() {
            return Some(name);
        }

        let name = self.inner.fetch_display_name(symbol).await?;
        let _ = self
            .names
            .write()
            .await
            .cache_set(symbol.to_string(), name.clone());
        Some(name)
    }
}
