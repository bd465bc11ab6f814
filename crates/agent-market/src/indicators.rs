//! Indicator engine
//!
//! Every calculator takes a plain column and returns a column of the same
//! length. Leading rows are `None` until the rolling window is full.

use crate::error::{MarketError, Result};
use crate::model::OhlcvSeries;
use serde::Serialize;
use std::collections::BTreeMap;
use ta::Next;
use ta::indicators::{ExponentialMovingAverage, SimpleMovingAverage};

/// Column of optional values, one per bar
pub type Column = Vec<Option<f64>>;

/// MACD output columns
#[derive(Debug, Clone, PartialEq)]
pub struct MacdColumns {
    pub macd: Column,
    pub signal: Column,
    pub hist: Column,
}

/// Bollinger band columns
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerColumns {
    pub upper: Column,
    pub middle: Column,
    pub lower: Column,
}

/// A series plus named indicator columns
///
/// The wrapped series is a copy; the caller's series is never touched.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorFrame {
    series: OhlcvSeries,
    columns: BTreeMap<String, Column>,
}

impl IndicatorFrame {
    /// Frame with no indicator columns yet
    pub fn new(series: OhlcvSeries) -> Self {
        Self {
            series,
            columns: BTreeMap::new(),
        }
    }

    pub fn series(&self) -> &OhlcvSeries {
        &self.series
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Add or replace a column
    pub fn insert(&mut self, name: impl Into<String>, values: Column) -> Result<()> {
        let name = name.into();
        if values.len() != self.len() {
            return Err(MarketError::Indicator(format!(
                "column {name} has {} rows, series has {}",
                values.len(),
                self.len()
            )));
        }
        self.columns.insert(name, values);
        Ok(())
    }

    /// Column by name
    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn has(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Value of `name` on the last row; `None` if the column is missing or undefined there
    pub fn latest(&self, name: &str) -> Option<f64> {
        self.columns.get(name)?.last().copied().flatten()
    }

    /// Column names in sorted order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Price moving-average columns (`ma_N`) ordered by period
    pub fn ma_columns(&self) -> Vec<(usize, &str)> {
        let mut found: Vec<(usize, &str)> = self
            .column_names()
            .filter_map(|name| Some((name.strip_prefix("ma_")?.parse().ok()?, name)))
            .collect();
        found.sort_unstable();
        found
    }

    /// Latest values of the headline indicators
    pub fn summary(&self) -> IndicatorSummary {
        IndicatorSummary {
            close_price: self.series.last().map(|b| b.close),
            ma_5: self.latest("ma_5"),
            ma_20: self.latest("ma_20"),
            ma_60: self.latest("ma_60"),
            macd: self.latest("macd"),
            macd_signal: self.latest("macd_signal"),
            macd_hist: self.latest("macd_hist"),
            rsi_14: self.latest("rsi_14"),
            bb_upper: self.latest("bb_upper"),
            bb_middle: self.latest("bb_middle"),
            bb_lower: self.latest("bb_lower"),
        }
    }
}

/// Last-row snapshot of the headline indicators
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct IndicatorSummary {
    pub close_price: Option<f64>,
    pub ma_5: Option<f64>,
    pub ma_20: Option<f64>,
    pub ma_60: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_hist: Option<f64>,
    pub rsi_14: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
}

fn period_error(name: &str, period: usize) -> MarketError {
    MarketError::Indicator(format!("invalid {name} period: {period}"))
}

/// Simple moving average, defined once `period` values have been seen
pub fn moving_average(values: &[f64], period: usize) -> Result<Column> {
    let mut sma = SimpleMovingAverage::new(period).map_err(|_| period_error("MA", period))?;
    Ok(values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let mean = sma.next(v);
            (i + 1 >= period).then_some(mean)
        })
        .collect())
}

/// Exponential moving average, alpha `2 / (period + 1)`, seeded with the first value
pub fn ema(values: &[f64], period: usize) -> Result<Vec<f64>> {
    let mut ema = ExponentialMovingAverage::new(period).map_err(|_| period_error("EMA", period))?;
    Ok(values.iter().map(|&v| ema.next(v)).collect())
}

/// MACD line, its signal line and the histogram
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Result<MacdColumns> {
    if fast >= slow {
        return Err(MarketError::Indicator(format!(
            "fast period {fast} must be shorter than slow period {slow}"
        )));
    }
    let fast_ema = ema(closes, fast)?;
    let slow_ema = ema(closes, slow)?;
    let line: Vec<f64> = fast_ema.iter().zip(&slow_ema).map(|(f, s)| f - s).collect();
    let signal_line = ema(&line, signal)?;

    Ok(MacdColumns {
        macd: line.iter().copied().map(Some).collect(),
        signal: signal_line.iter().copied().map(Some).collect(),
        hist: line
            .iter()
            .zip(&signal_line)
            .map(|(m, s)| Some(m - s))
            .collect(),
    })
}

/// Relative strength index over simple rolling means of gains and losses
///
/// The first value lands on row `period`. A window with no losses reads 100;
/// a completely flat window is undefined.
pub fn rsi(closes: &[f64], period: usize) -> Result<Column> {
    if period == 0 {
        return Err(period_error("RSI", period));
    }
    let diffs: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    let mut out = vec![None; closes.len()];
    for end in period..=diffs.len() {
        let window = &diffs[end - period..end];
        let gain = window.iter().map(|d| d.max(0.0)).sum::<f64>() / period as f64;
        let loss = window.iter().map(|d| (-d).max(0.0)).sum::<f64>() / period as f64;
        out[end] = match (gain, loss) {
            (g, l) if g == 0.0 && l == 0.0 => None,
            (_, l) if l == 0.0 => Some(100.0),
            (g, l) => Some(100.0 - 100.0 / (1.0 + g / l)),
        };
    }
    Ok(out)
}

/// Bollinger bands: rolling mean plus/minus `num_std` sample standard deviations
pub fn bollinger_bands(closes: &[f64], period: usize, num_std: f64) -> Result<BollingerColumns> {
    if period < 2 {
        return Err(period_error("Bollinger", period));
    }
    let middle = moving_average(closes, period)?;

    let mut upper = vec![None; closes.len()];
    let mut lower = vec![None; closes.len()];
    for (i, mean) in middle.iter().enumerate() {
        let Some(mean) = *mean else { continue };
        let window = &closes[i + 1 - period..=i];
        let variance =
            window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (period - 1) as f64;
        let width = num_std * variance.sqrt();
        upper[i] = Some(mean + width);
        lower[i] = Some(mean - width);
    }

    Ok(BollingerColumns {
        upper,
        middle,
        lower,
    })
}

/// Price MA periods chosen by series length
pub fn ma_periods_for(len: usize) -> &'static [usize] {
    match len {
        0..20 => &[5, 10],
        20..60 => &[5, 10, 20],
        _ => &[5, 10, 20, 60],
    }
}

/// Compute every indicator the series is long enough for
///
/// - `ma_N` for [`ma_periods_for`], skipping periods longer than the series
/// - `macd`, `macd_signal`, `macd_hist` from 26 rows
/// - `rsi_14` from 14 rows
/// - `bb_upper`, `bb_middle`, `bb_lower` from 20 rows
/// - `vol_ma_5`, `vol_ma_10` from 10 rows
pub fn add_all_indicators(series: &OhlcvSeries) -> Result<IndicatorFrame> {
    let len = series.len();
    let closes = series.closes();
    let mut frame = IndicatorFrame::new(series.clone());

    for &period in ma_periods_for(len).iter().filter(|&&p| p <= len) {
        frame.insert(format!("ma_{period}"), moving_average(&closes, period)?)?;
    }

    if len >= 26 {
        let columns = macd(&closes, 12, 26, 9)?;
        frame.insert("macd", columns.macd)?;
        frame.insert("macd_signal", columns.signal)?;
        frame.insert("macd_hist", columns.hist)?;
    }

    if len >= 14 {
        frame.insert("rsi_14", rsi(&closes, 14)?)?;
    }

    if len >= 20 {
        let bands = bollinger_bands(&closes, 20, 2.0)?;
        frame.insert("bb_upper", bands.upper)?;
        frame.insert("bb_middle", bands.middle)?;
        frame.insert("bb_lower", bands.lower)?;
    }

    if len >= 10 {
        let volumes = series.volumes();
        for period in [5, 10] {
            frame.insert(format!("vol_ma_{period}"), moving_average(&volumes, period)?)?;
        }
    }

    Ok(frame)
}
