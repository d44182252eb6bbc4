//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1)
//! of the same trailing window.
//!
//! Default parameters: period=20, multiplier=2.0. The multiplier is applied
//! as given; a negative value swaps the outer bands.

use crate::domain::indicator::calculate_sma;

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BollingerSeries {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

impl BollingerSeries {
    pub fn is_empty(&self) -> bool {
        self.middle.is_empty()
    }

    pub fn len(&self) -> usize {
        self.middle.len()
    }
}

pub fn calculate_bollinger(data: &[f64], period: usize, multiplier: f64) -> BollingerSeries {
    let middle = calculate_sma(data, period);
    if middle.is_empty() {
        return BollingerSeries::default();
    }

    let mut upper = Vec::with_capacity(middle.len());
    let mut lower = Vec::with_capacity(middle.len());

    for (start, &mid) in middle.iter().enumerate() {
        let window = &data[start..start + period];
        let variance: f64 = window
            .iter()
            .map(|c| {
                let diff = c - mid;
                diff * diff
            })
            .sum::<f64>()
            / period as f64;

        let band = multiplier * variance.sqrt();
        upper.push(mid + band);
        lower.push(mid - band);
    }

    BollingerSeries {
        upper,
        middle,
        lower,
    }
}
