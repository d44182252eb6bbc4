//! Market price port trait.

use crate::domain::error::QuantsimError;
use crate::domain::price_series::PriceSeries;

pub trait PricePort {
    /// Latest known price for `symbol`.
    fn current_price(&self, symbol: &str) -> Result<f64, QuantsimError>;

    /// Up to `days` most recent closes, oldest first.
    fn history(&self, symbol: &str, days: usize) -> Result<PriceSeries, QuantsimError>;
}
