//! RSI (Relative Strength Index) indicator.
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over the first n price changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! One value per price change from the seed window onward, so the output
//! length is `len - n`. Fewer than n+1 closes yields an empty series.
//! The latest delta is always smoothed in: with exactly n+1 closes the
//! single value already reflects the newest close.

pub const DEFAULT_RSI_PERIOD: usize = 14;
pub const OVERBOUGHT: f64 = 70.0;
pub const OVERSOLD: f64 = 30.0;

pub fn calculate_rsi(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period + 1 {
        return Vec::new();
    }

    let mut gains: Vec<f64> = Vec::with_capacity(data.len() - 1);
    let mut losses: Vec<f64> = Vec::with_capacity(data.len() - 1);
    for w in data.windows(2) {
        let change = w[1] - w[0];
        gains.push(if change > 0.0 { change } else { 0.0 });
        losses.push(if change < 0.0 { -change } else { 0.0 });
    }

    let mut avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / period as f64;

    let mut values = Vec::with_capacity(gains.len() - period + 1);
    values.push(rsi_from_averages(avg_gain, avg_loss));

    for i in period..gains.len() {
        avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
        values.push(rsi_from_averages(avg_gain, avg_loss));
    }

    values
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

/// Momentum reading of a single RSI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsiZone {
    Overbought,
    Oversold,
    Neutral,
}

impl RsiZone {
    pub fn classify(rsi: f64) -> Self {
        if rsi > OVERBOUGHT {
            RsiZone::Overbought
        } else if rsi < OVERSOLD {
            RsiZone::Oversold
        } else {
            RsiZone::Neutral
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RsiZone::Overbought => "Overbought",
            RsiZone::Oversold => "Oversold",
            RsiZone::Neutral => "Neutral",
        }
    }
}
