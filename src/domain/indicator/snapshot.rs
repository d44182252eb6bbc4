//! Latest-value aggregation over every indicator.
//!
//! Consumers (CLI output, strategy checks) always receive a number. When a
//! series is empty because the history is too short, a neutral default is
//! substituted:
//! - RSI: 50
//! - MACD line, signal, histogram: 0
//! - SMA, EMA: the current price
//! - Bollinger: current price × 1.02 / current price / current price × 0.98

use serde::{Deserialize, Serialize};

use super::bollinger::{self, calculate_bollinger};
use super::macd::{self, calculate_macd};
use super::rsi::{self, RsiZone, calculate_rsi};
use super::{IndicatorType, calculate_ema, calculate_sma, last_value};

pub const NEUTRAL_RSI: f64 = 50.0;
pub const FALLBACK_BAND_PCT: f64 = 0.02;

/// Periods used when building a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorParams {
    pub sma_period: usize,
    pub ema_period: usize,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_mult: f64,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        IndicatorParams {
            sma_period: 20,
            ema_period: 12,
            rsi_period: rsi::DEFAULT_RSI_PERIOD,
            macd_fast: macd::DEFAULT_FAST,
            macd_slow: macd::DEFAULT_SLOW,
            macd_signal: macd::DEFAULT_SIGNAL,
            bollinger_period: bollinger::DEFAULT_PERIOD,
            bollinger_mult: bollinger::DEFAULT_MULTIPLIER,
        }
    }
}

impl IndicatorParams {
    pub fn indicator_types(&self) -> Vec<IndicatorType> {
        vec![
            IndicatorType::Sma(self.sma_period),
            IndicatorType::Ema(self.ema_period),
            IndicatorType::Rsi(self.rsi_period),
            IndicatorType::Macd {
                fast: self.macd_fast,
                slow: self.macd_slow,
                signal: self.macd_signal,
            },
            IndicatorType::Bollinger {
                period: self.bollinger_period,
                stddev_mult_x100: (self.bollinger_mult * 100.0).round() as u32,
            },
        ]
    }

    /// History needed before every indicator reports a real value.
    pub fn required_history(&self) -> usize {
        self.indicator_types()
            .iter()
            .map(IndicatorType::min_history)
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdValue {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerValue {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub rsi: f64,
    pub macd: MacdValue,
    pub sma: f64,
    pub ema: f64,
    pub bollinger: BollingerValue,
}

impl IndicatorSnapshot {
    pub fn compute(data: &[f64], current_price: f64, params: &IndicatorParams) -> Self {
        let rsi = last_value(&calculate_rsi(data, params.rsi_period)).unwrap_or(NEUTRAL_RSI);

        let macd_series = calculate_macd(
            data,
            params.macd_fast,
            params.macd_slow,
            params.macd_signal,
        );
        let macd = MacdValue {
            macd: last_value(&macd_series.line).unwrap_or(0.0),
            signal: last_value(&macd_series.signal).unwrap_or(0.0),
            histogram: last_value(&macd_series.histogram).unwrap_or(0.0),
        };

        let sma = last_value(&calculate_sma(data, params.sma_period)).unwrap_or(current_price);
        let ema = last_value(&calculate_ema(data, params.ema_period)).unwrap_or(current_price);

        let bands = calculate_bollinger(data, params.bollinger_period, params.bollinger_mult);
        let bollinger = BollingerValue {
            upper: last_value(&bands.upper).unwrap_or(current_price * (1.0 + FALLBACK_BAND_PCT)),
            middle: last_value(&bands.middle).unwrap_or(current_price),
            lower: last_value(&bands.lower).unwrap_or(current_price * (1.0 - FALLBACK_BAND_PCT)),
        };

        IndicatorSnapshot {
            rsi,
            macd,
            sma,
            ema,
            bollinger,
        }
    }

    /// Snapshot using the most recent close as the current price.
    pub fn latest(data: &[f64], params: &IndicatorParams) -> Self {
        let current_price = last_value(data).unwrap_or(0.0);
        Self::compute(data, current_price, params)
    }

    pub fn rsi_zone(&self) -> RsiZone {
        RsiZone::classify(self.rsi)
    }

    pub fn all_finite(&self) -> bool {
        [
            self.rsi,
            self.macd.macd,
            self.macd.signal,
            self.macd.histogram,
            self.sma,
            self.ema,
            self.bollinger.upper,
            self.bollinger.middle,
            self.bollinger.lower,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}
