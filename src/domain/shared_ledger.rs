//! Thread-safe handle over a [`PortfolioLedger`].
//!
//! Each method takes the lock exactly once, so the sufficiency checks and
//! the mutation of a trade happen under a single guard.

use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

use super::error::QuantsimError;
use super::ledger::{LedgerSnapshot, PortfolioLedger};
use super::metrics::PortfolioMetrics;
use super::portfolio::Portfolio;
use super::position::{Position, TradeRequest, Transaction};

#[derive(Debug, Clone, Default)]
pub struct SharedLedger {
    inner: Arc<Mutex<PortfolioLedger>>,
}

impl SharedLedger {
    pub fn new(ledger: PortfolioLedger) -> Self {
        SharedLedger {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    pub fn initialize(&self, initial_capital: Decimal) -> Result<(), QuantsimError> {
        self.inner.lock().initialize(initial_capital)
    }

    pub fn execute_trade(&self, request: &TradeRequest) -> Result<Transaction, QuantsimError> {
        self.inner.lock().execute_trade(request)
    }

    pub fn revalue_positions(
        &self,
        price_updates: &HashMap<String, Decimal>,
    ) -> Result<usize, QuantsimError> {
        self.inner.lock().revalue_positions(price_updates)
    }

    pub fn portfolio(&self) -> Portfolio {
        self.inner.lock().portfolio().clone()
    }

    pub fn position(&self, symbol: &str) -> Option<Position> {
        self.inner.lock().get_position(symbol).cloned()
    }

    pub fn metrics(&self) -> PortfolioMetrics {
        self.inner.lock().metrics()
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.inner.lock().snapshot()
    }

    /// Runs `f` against the ledger while holding the lock.
    pub fn with<R>(&self, f: impl FnOnce(&mut PortfolioLedger) -> R) -> R {
        f(&mut self.inner.lock())
    }
}
