//! Technical indicator implementations.
//!
//! Every function here is pure: it takes closing prices ordered oldest to
//! newest and returns a freshly allocated series. Output series are trimmed
//! to their first computable point, so index 0 of an SMA(20) corresponds to
//! input index 19. Too little input yields an empty series, never an error.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod snapshot;

pub use bollinger::{BollingerSeries, calculate_bollinger};
pub use ema::calculate_ema;
pub use macd::{MacdSeries, calculate_macd};
pub use rsi::{RsiZone, calculate_rsi};
pub use sma::calculate_sma;
pub use snapshot::{IndicatorParams, IndicatorSnapshot};

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
}

impl IndicatorType {
    /// Minimum number of closes before the indicator yields its first value.
    pub fn min_history(&self) -> usize {
        match *self {
            IndicatorType::Sma(period) | IndicatorType::Ema(period) => period,
            IndicatorType::Rsi(period) => period + 1,
            IndicatorType::Macd { slow, signal, .. } => slow + signal.saturating_sub(1),
            IndicatorType::Bollinger { period, .. } => period,
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
        }
    }
}

/// Last element of a series, if any.
pub(crate) fn last_value(series: &[f64]) -> Option<f64> {
    series.last().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_type_display_sma() {
        assert_eq!(IndicatorType::Sma(20).to_string(), "SMA(20)");
    }

    #[test]
    fn indicator_type_display_macd() {
        let macd = IndicatorType::Macd {
            fast: 12,
            slow: 26,
            signal: 9,
        };
        assert_eq!(macd.to_string(), "MACD(12,26,9)");
    }

    #[test]
    fn indicator_type_display_bollinger() {
        let boll = IndicatorType::Bollinger {
            period: 20,
            stddev_mult_x100: 250,
        };
        assert_eq!(boll.to_string(), "BOLLINGER(20,2.5)");
    }

    #[test]
    fn min_history_matches_warmup() {
        assert_eq!(IndicatorType::Sma(20).min_history(), 20);
        assert_eq!(IndicatorType::Rsi(14).min_history(), 15);
        let macd = IndicatorType::Macd {
            fast: 12,
            slow: 26,
            signal: 9,
        };
        assert_eq!(macd.min_history(), 34);
    }

    #[test]
    fn last_value_of_empty_series() {
        assert_eq!(last_value(&[]), None);
        assert_eq!(last_value(&[1.0, 2.0]), Some(2.0));
    }
}
