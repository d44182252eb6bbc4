//! Deterministic random-walk price source for demos and tests.
//!
//! Each symbol has an anchor price. A history starts at the anchor and each
//! following close moves by a uniform step within ±1% of the anchor,
//! clamped at zero. The walk is seeded from the adapter seed and the symbol,
//! so the same inputs always produce the same series.

use crate::domain::error::QuantsimError;
use crate::domain::price_series::PriceSeries;
use crate::ports::price_port::PricePort;
use chrono::{NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

pub const DEFAULT_ANCHOR_PRICE: f64 = 100.0;
const STEP_BAND: f64 = 0.02;

pub struct SyntheticPriceAdapter {
    seed: u64,
    anchors: HashMap<String, f64>,
    default_anchor: f64,
    end_date: NaiveDate,
}

impl SyntheticPriceAdapter {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            anchors: HashMap::new(),
            default_anchor: DEFAULT_ANCHOR_PRICE,
            end_date: Utc::now().date_naive(),
        }
    }

    pub fn with_anchor(mut self, symbol: &str, price: f64) -> Self {
        self.anchors.insert(symbol.trim().to_uppercase(), price);
        self
    }

    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = end_date;
        self
    }

    fn anchor(&self, symbol: &str) -> f64 {
        self.anchors
            .get(symbol)
            .copied()
            .unwrap_or(self.default_anchor)
    }

    fn rng_for(&self, symbol: &str) -> StdRng {
        // FNV-1a keeps the per-symbol seed stable across runs and platforms.
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in symbol.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        StdRng::seed_from_u64(self.seed ^ hash)
    }

    /// `days` closes starting at the anchor.
    pub fn generate(&self, symbol: &str, days: usize) -> Vec<f64> {
        let symbol = symbol.trim().to_uppercase();
        let anchor = self.anchor(&symbol);
        let step = anchor * STEP_BAND;
        let mut rng = self.rng_for(&symbol);

        let mut closes = Vec::with_capacity(days);
        if days == 0 {
            return closes;
        }
        closes.push(anchor);
        for i in 1..days {
            let change = (rng.r#gen::<f64>() - 0.5) * step;
            closes.push((closes[i - 1] + change).max(0.0));
        }
        closes
    }
}

impl PricePort for SyntheticPriceAdapter {
    fn current_price(&self, symbol: &str) -> Result<f64, QuantsimError> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(QuantsimError::InvalidSymbol);
        }
        Ok(self.anchor(&symbol))
    }

    fn history(&self, symbol: &str, days: usize) -> Result<PriceSeries, QuantsimError> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(QuantsimError::InvalidSymbol);
        }
        let closes = self.generate(&symbol, days);
        Ok(PriceSeries::from_closes(symbol, &closes, self.end_date))
    }
}
