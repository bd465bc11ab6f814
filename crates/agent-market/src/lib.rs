//! Market data layer for the financial analysis agent
//!
//! This crate covers everything below the tools:
//!
//! - [`model`]: daily OHLCV bars and series
//! - [`provider`] / [`yahoo`]: the market data boundary and its Yahoo adapter
//! - [`dates`]: look-back window resolution shared by every fetch tool
//! - [`indicators`] / [`signals`]: indicator engine and signal generator
//! - [`chart`]: chart rendering
//! - [`store`]: the session-scoped dataset store
//! - [`summary`]: the summary shape reported to the model after a fetch
//!
//! The `test-util` feature adds `testing`, an in-memory provider for tests.

pub mod cache;
pub mod chart;
pub mod dates;
pub mod error;
pub mod indicators;
pub mod model;
pub mod provider;
pub mod signals;
pub mod store;
pub mod summary;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
pub mod yahoo;

pub use cache::CachingProvider;
pub use chart::{ChartKind, ChartRenderer, ChartTheme, SvgChartRenderer};
pub use dates::DateRange;
pub use error::{MarketError, Result};
pub use indicators::{IndicatorFrame, IndicatorSummary, add_all_indicators};
pub use model::{Adjustment, Bar, InstrumentKind, OhlcvSeries};
pub use provider::MarketDataProvider;
pub use signals::{LatestSignals, RsiSignal, Signal, SignalFrame, generate_signals};
pub use store::{DataStore, DatasetMetadata, SharedDataStore, StoredDataset};
pub use summary::{FetchSummary, round_to};
pub use yahoo::YahooProvider;
