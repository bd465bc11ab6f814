//! Yahoo Finance adapter
//!
//! Six-digit mainland codes are mapped to Yahoo tickers: Shanghai listings
//! (`6`, `5`, `9` prefixes) take `.SS`, everything else `.SZ`. Tickers that
//! already carry a suffix pass through unchanged.

use crate::dates::DateRange;
use crate::error::{MarketError, Result};
use crate::model::{Adjustment, Bar, InstrumentKind, OhlcvSeries};
use crate::provider::MarketDataProvider;
use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, warn};
use yahoo_finance_api as yahoo;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// China Standard Time, the trading calendar of both mainland exchanges
const CST_OFFSET_SECS: i32 = 8 * 3600;

/// Map an exchange code to a Yahoo ticker
pub fn to_yahoo_ticker(symbol: &str) -> String {
    let symbol = symbol.trim();
    if symbol.contains('.') {
        return symbol.to_uppercase();
    }
    if symbol.len() == 6 && symbol.chars().all(|c| c.is_ascii_digit()) {
        let suffix = if symbol.starts_with(['6', '5', '9']) {
            "SS"
        } else {
            "SZ"
        };
        return format!("{symbol}.{suffix}");
    }
    symbol.to_uppercase()
}

/// Raw quote row before adjustment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawQuote {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub adjclose: f64,
}

fn trading_date(timestamp: i64) -> Option<NaiveDate> {
    let offset = FixedOffset::east_opt(CST_OFFSET_SECS)?;
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.with_timezone(&offset).date_naive())
}

/// Convert raw quotes into an ordered, adjusted series
///
/// Rows outside `range`, with non-positive closes, or sharing a date with the
/// previous row (the later row wins) are dropped.
pub fn build_series(quotes: &[RawQuote], range: DateRange, adjustment: Adjustment) -> Result<OhlcvSeries> {
    let first_ratio = quotes
        .iter()
        .find(|q| q.close > 0.0)
        .map_or(1.0, |q| q.adjclose / q.close);

    let mut bars: Vec<Bar> = Vec::with_capacity(quotes.len());
    for quote in quotes {
        if !(quote.close.is_finite() && quote.close > 0.0) {
            continue;
        }
        let Some(date) = trading_date(quote.timestamp) else {
            continue;
        };
        if date < range.start || date > range.end {
            continue;
        }

        let factor = match adjustment {
            Adjustment::None => 1.0,
            Adjustment::Forward => quote.adjclose / quote.close,
            Adjustment::Backward if first_ratio > 0.0 => quote.adjclose / quote.close / first_ratio,
            Adjustment::Backward => 1.0,
        };
        let factor = if factor.is_finite() && factor > 0.0 { factor } else { 1.0 };

        let bar = Bar::new(
            date,
            quote.open * factor,
            quote.high * factor,
            quote.low * factor,
            quote.close * factor,
            quote.volume,
        );
        match bars.last_mut() {
            Some(last) if last.date == date => *last = bar,
            Some(last) if last.date > date => continue,
            _ => bars.push(bar),
        }
    }

    OhlcvSeries::new(bars)
}

/// Yahoo Finance backed provider
#[derive(Clone)]
pub struct YahooProvider {
    rate_limiter: SharedRateLimiter,
}

impl YahooProvider {
    /// Provider allowing `requests_per_minute` outbound calls
    pub fn new(requests_per_minute: u32) -> Self {
        let per_minute = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_minute(per_minute);
        Self {
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    fn connector() -> Result<yahoo::YahooConnector> {
        Ok(yahoo::YahooConnector::new()?)
    }

    fn to_offset(date: NaiveDate) -> Result<OffsetDateTime> {
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| MarketError::InvalidDate(date.to_string()))?
            .and_utc()
            .timestamp()
            - i64::from(CST_OFFSET_SECS);
        OffsetDateTime::from_unix_timestamp(midnight)
            .map_err(|e| MarketError::InvalidDate(format!("{date}: {e}")))
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new(60)
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    async fn fetch_instrument_series(
        &self,
        kind: InstrumentKind,
        symbol: &str,
        range: DateRange,
        adjustment: Adjustment,
    ) -> Result<OhlcvSeries> {
        let ticker = to_yahoo_ticker(symbol);
        debug!(%kind, symbol, ticker = %ticker, start = %range.start, end = %range.end, "Fetching history");

        self.rate_limiter.until_ready().await;
        let start = Self::to_offset(range.start)?;
        let end = Self::to_offset(range.end + Duration::days(1))?;

        let response = Self::connector()?
            .get_quote_history(&ticker, start, end)
            .await?;
        let quotes: Vec<RawQuote> = response
            .quotes()?
            .iter()
            .filter_map(|q| {
                Some(RawQuote {
                    timestamp: i64::try_from(q.timestamp).ok()?,
                    open: q.open,
                    high: q.high,
                    low: q.low,
                    close: q.close,
                    volume: q.volume as f64,
                    adjclose: q.adjclose,
                })
            })
            .collect();

        let series = build_series(&quotes, range, adjustment)?;
        if series.is_empty() {
            return Err(MarketError::NotFound {
                symbol: symbol.to_string(),
                start: range.start_compact(),
                end: range.end_compact(),
            });
        }
        Ok(series)
    }

    async fn fetch_display_name(&self, symbol: &str) -> Option<String> {
        let ticker = to_yahoo_ticker(symbol);
        self.rate_limiter.until_ready().await;

        let connector = Self::connector().ok()?;
        let result = match connector.search_ticker(&ticker).await {
            Ok(result) => result,
            Err(e) => {
                warn!(symbol, error = %e, "Name lookup failed");
                return None;
            }
        };

        result
            .quotes
            .iter()
            .find(|item| item.symbol.eq_ignore_ascii_case(&ticker))
            .or_else(|| result.quotes.first())
            .and_then(|item| {
                [item.short_name.trim(), item.long_name.trim()]
                    .into_iter()
                    .find(|name| !name.is_empty())
                    .map(ToString::to_string)
            })
    }
}
