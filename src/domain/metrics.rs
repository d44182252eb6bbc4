//! Portfolio statistics derived from the transaction log.
//!
//! These are deliberately coarse: the Sharpe figure is the mean signed cash
//! flow over its standard deviation, not a return-based ratio, and drawdown
//! and beta are fixed placeholders until an equity history is tracked.

use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::position::Transaction;

pub const PLACEHOLDER_MAX_DRAWDOWN: f64 = 0.0;
pub const PLACEHOLDER_BETA: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioMetrics {
    pub transaction_count: usize,
    pub mean_cash_flow: f64,
    pub variance: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub beta: f64,
}

impl Default for PortfolioMetrics {
    fn default() -> Self {
        PortfolioMetrics {
            transaction_count: 0,
            mean_cash_flow: 0.0,
            variance: 0.0,
            volatility: 0.0,
            sharpe_ratio: 0.0,
            max_drawdown: PLACEHOLDER_MAX_DRAWDOWN,
            beta: PLACEHOLDER_BETA,
        }
    }
}

impl PortfolioMetrics {
    pub fn from_transactions<'a, I>(transactions: I) -> Self
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let flows: Vec<f64> = transactions
            .into_iter()
            .map(|t| t.cash_flow().to_f64().unwrap_or(0.0))
            .collect();
        if flows.is_empty() {
            return PortfolioMetrics::default();
        }

        let n = flows.len() as f64;
        let mean = flows.iter().sum::<f64>() / n;
        let variance = flows.iter().map(|f| (f - mean).powi(2)).sum::<f64>() / n;
        let volatility = variance.sqrt();
        let sharpe_ratio = if volatility > 0.0 { mean / volatility } else { 0.0 };

        PortfolioMetrics {
            transaction_count: flows.len(),
            mean_cash_flow: mean,
            variance,
            volatility,
            sharpe_ratio,
            ..PortfolioMetrics::default()
        }
    }
}
