//! Trading signal labels derived from indicator crossovers

use crate::indicators::IndicatorFrame;
use serde::{Deserialize, Serialize};
use std::fmt;

/// RSI above this reads overbought
pub const RSI_OVERBOUGHT: f64 = 70.0;
/// RSI below this reads oversold
pub const RSI_OVERSOLD: f64 = 30.0;

/// Crossover label
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl Signal {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RSI zone label
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RsiSignal {
    Overbought,
    Oversold,
    #[default]
    Neutral,
}

impl RsiSignal {
    pub fn from_value(rsi: f64) -> Self {
        if rsi > RSI_OVERBOUGHT {
            Self::Overbought
        } else if rsi < RSI_OVERSOLD {
            Self::Oversold
        } else {
            Self::Neutral
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Overbought => "OVERBOUGHT",
            Self::Oversold => "OVERSOLD",
            Self::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for RsiSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label each row by how `fast` moved against `slow`
///
/// `Buy` when fast rises above slow (was at or below on the previous row),
/// `Sell` on the mirror move. Rows where either side is undefined on this or
/// the previous row are `Hold`, as is the first row.
pub fn crossover_signals(fast: &[Option<f64>], slow: &[Option<f64>]) -> Vec<Signal> {
    let len = fast.len().min(slow.len());
    (0..len)
        .map(|i| {
            if i == 0 {
                return Signal::Hold;
            }
            let (Some(f), Some(s), Some(pf), Some(ps)) = (fast[i], slow[i], fast[i - 1], slow[i - 1])
            else {
                return Signal::Hold;
            };
            if f > s && pf <= ps {
                Signal::Buy
            } else if f < s && pf >= ps {
                Signal::Sell
            } else {
                Signal::Hold
            }
        })
        .collect()
}

/// RSI zone per row, `None` where RSI is undefined
pub fn rsi_signals(rsi: &[Option<f64>]) -> Vec<Option<RsiSignal>> {
    rsi.iter().map(|v| v.map(RsiSignal::from_value)).collect()
}

/// Signal columns for a frame; a column is absent when its inputs are
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalFrame {
    pub macd_cross: Option<Vec<Signal>>,
    pub ma_cross: Option<Vec<Signal>>,
    pub rsi_signal: Option<Vec<Option<RsiSignal>>>,
}

/// Last-row labels, with `HOLD` / `NEUTRAL` standing in for missing columns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LatestSignals {
    pub macd_cross: Signal,
    pub rsi_signal: RsiSignal,
    pub ma_cross: Signal,
}

impl SignalFrame {
    pub fn latest(&self) -> LatestSignals {
        LatestSignals {
            macd_cross: self
                .macd_cross
                .as_ref()
                .and_then(|c| c.last().copied())
                .unwrap_or_default(),
            rsi_signal: self
                .rsi_signal
                .as_ref()
                .and_then(|c| c.last().copied().flatten())
                .unwrap_or_default(),
            ma_cross: self
                .ma_cross
                .as_ref()
                .and_then(|c| c.last().copied())
                .unwrap_or_default(),
        }
    }
}

/// MACD cross, MA(20) cross of the close, and RSI zones
pub fn generate_signals(frame: &IndicatorFrame) -> SignalFrame {
    let macd_cross = match (frame.column("macd"), frame.column("macd_signal")) {
        (Some(macd), Some(signal)) => Some(crossover_signals(macd, signal)),
        _ => None,
    };

    let ma_cross = frame.column("ma_20").map(|ma| {
        let closes: Vec<Option<f64>> = frame.series().closes().into_iter().map(Some).collect();
        crossover_signals(&closes, ma)
    });

    SignalFrame {
        macd_cross,
        ma_cross,
        rsi_signal: frame.column("rsi_14").map(rsi_signals),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::add_all_indicators;
    use crate::indicators::tests::{ramp, series_from_closes};

    #[test]
    fn test_crossover_labels() {
        let fast = [Some(1.0), Some(3.0), Some(3.0), Some(1.0), Some(2.0)];
        let slow = [Some(2.0), Some(2.0), Some(2.0), Some(2.0), Some(2.0)];
        assert_eq!(
            crossover_signals(&fast, &slow),
            vec![
                Signal::Hold,
                Signal::Buy,
                Signal::Hold,
                Signal::Sell,
                Signal::Hold
            ]
        );
    }

    #[test]
    fn test_crossover_from_equal() {
        let fast = [Some(2.0), Some(2.5)];
        let slow = [Some(2.0), Some(2.0)];
        assert_eq!(crossover_signals(&fast, &slow)[1], Signal::Buy);
    }

    #[test]
    fn test_crossover_undefined_rows_hold() {
        let fast = [Some(1.0), Some(3.0), Some(1.0)];
        let slow = [None, Some(2.0), Some(2.0)];
        assert_eq!(
            crossover_signals(&fast, &slow),
            vec![Signal::Hold, Signal::Hold, Signal::Sell]
        );
    }

    #[test]
    fn test_rsi_zones() {
        let labels = rsi_signals(&[None, Some(75.0), Some(20.0), Some(50.0), Some(70.0)]);
        assert_eq!(
            labels,
            vec![
                None,
                Some(RsiSignal::Overbought),
                Some(RsiSignal::Oversold),
                Some(RsiSignal::Neutral),
                Some(RsiSignal::Neutral)
            ]
        );
    }

    #[test]
    fn test_latest_defaults_when_columns_missing() {
        let frame = add_all_indicators(&series_from_closes(&ramp(8))).unwrap();
        let signals = generate_signals(&frame);
        assert!(signals.macd_cross.is_none());
        assert_eq!(
            serde_json::to_value(signals.latest()).unwrap(),
            serde_json::json!({ "macd_cross": "HOLD", "rsi_signal": "NEUTRAL", "ma_cross": "HOLD" })
        );
    }

    /// Oscillating closes on a slow upward drift
    fn wave(len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| {
                let x = i as f64;
                10.0 + 2.0 * (x * 0.35).sin() + 0.05 * x
            })
            .collect()
    }

    #[test]
    fn test_signal_generation_is_repeatable() {
        let frame = add_all_indicators(&series_from_closes(&wave(60))).unwrap();

        let first = generate_signals(&frame);
        let second = generate_signals(&frame);
        assert_eq!(first, second);
        assert_eq!(format!("{first:?}"), format!("{second:?}"));
        assert_eq!(
            serde_json::to_string(&first.latest()).unwrap(),
            serde_json::to_string(&second.latest()).unwrap()
        );

        let macd_cross = first.macd_cross.as_ref().unwrap();
        assert!(macd_cross.contains(&Signal::Buy));
        assert!(macd_cross.contains(&Signal::Sell));

        let macd = frame.column("macd").unwrap();
        let signal = frame.column("macd_signal").unwrap();
        assert_eq!(crossover_signals(macd, signal), crossover_signals(macd, signal));
        assert_eq!(&crossover_signals(macd, signal), macd_cross);
    }

    #[test]
    fn test_signals_on_rising_series() {
        let frame = add_all_indicators(&series_from_closes(&ramp(90))).unwrap();
        let signals = generate_signals(&frame);

        assert_eq!(signals.macd_cross.as_ref().unwrap().len(), 90);
        assert_eq!(signals.latest().rsi_signal, RsiSignal::Overbought);
        // close sits above its MA(20) the whole way, so no fresh cross on the last row
        assert_eq!(signals.latest().ma_cross, Signal::Hold);
    }
}
