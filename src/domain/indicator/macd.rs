//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//!
//! Alignment: EMA(fast) has `slow - fast` more points than EMA(slow), so the
//! fast series is read from offset `slow - fast` to line both up on the same
//! input index. The signal line is in turn `signal - 1` points shorter than
//! the MACD line; the histogram follows the signal line's length.

use crate::domain::indicator::calculate_ema;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacdSeries {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

impl MacdSeries {
    pub fn is_empty(&self) -> bool {
        self.line.is_empty()
    }

    /// Index into `line` that corresponds to `signal[0]` and `histogram[0]`.
    pub fn signal_offset(&self) -> usize {
        self.line.len() - self.signal.len()
    }

    /// MACD line value aligned with `signal[i]`.
    pub fn aligned_line(&self, i: usize) -> Option<f64> {
        self.line.get(self.signal_offset() + i).copied()
    }
}

pub fn calculate_macd(data: &[f64], fast: usize, slow: usize, signal_period: usize) -> MacdSeries {
    if fast == 0 || slow == 0 || signal_period == 0 || fast > slow || data.len() < slow {
        return MacdSeries::default();
    }

    let ema_fast = calculate_ema(data, fast);
    let ema_slow = calculate_ema(data, slow);

    let fast_offset = slow - fast;
    let line: Vec<f64> = ema_slow
        .iter()
        .enumerate()
        .map(|(i, slow_value)| ema_fast[i + fast_offset] - slow_value)
        .collect();

    let signal = calculate_ema(&line, signal_period);

    let signal_offset = line.len() - signal.len();
    let histogram = signal
        .iter()
        .enumerate()
        .map(|(i, s)| line[signal_offset + i] - s)
        .collect();

    MacdSeries {
        line,
        signal,
        histogram,
    }
}

pub fn calculate_macd_default(data: &[f64]) -> MacdSeries {
    calculate_macd(data, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}
