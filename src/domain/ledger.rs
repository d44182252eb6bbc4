//! Portfolio ledger: cash, positions and the transaction log for one session.
//!
//! Every mutating operation validates first and mutates second, so a
//! rejected call leaves the ledger exactly as it was. Derived values
//! (position market values, portfolio totals) are recomputed at the end of
//! each mutation rather than on read.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use tracing::{debug, info, warn};

use super::error::QuantsimError;
use super::metrics::PortfolioMetrics;
use super::portfolio::{Portfolio, Session};
use super::position::{Position, TradeRequest, TradeSide, Transaction, lot_value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl WatchlistEntry {
    pub fn new(symbol: &str) -> Self {
        WatchlistEntry {
            symbol: normalize_symbol(symbol),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Full persisted state. Restoring it reconstructs the ledger without
/// replaying transactions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub session: Option<Session>,
    pub portfolio: Portfolio,
    pub positions: Vec<Position>,
    /// Newest first.
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub watchlist: Vec<WatchlistEntry>,
}

#[derive(Debug, Clone)]
pub struct PortfolioLedger {
    session: Option<Session>,
    portfolio: Portfolio,
    positions: BTreeMap<String, Position>,
    transactions: VecDeque<Transaction>,
    watchlist: Vec<WatchlistEntry>,
    next_transaction_id: u64,
}

pub(crate) fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

impl Default for PortfolioLedger {
    fn default() -> Self {
        PortfolioLedger {
            session: None,
            portfolio: Portfolio::default(),
            positions: BTreeMap::new(),
            transactions: VecDeque::new(),
            watchlist: Vec::new(),
            next_transaction_id: 1,
        }
    }
}

impl PortfolioLedger {
    /// An uninitialized ledger; mutations fail until [`initialize`](Self::initialize).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initialize(&mut self, initial_capital: Decimal) -> Result<(), QuantsimError> {
        self.initialize_at(initial_capital, Utc::now())
    }

    /// Starts a fresh session. Positions and transactions are cleared; the
    /// watchlist survives.
    pub fn initialize_at(
        &mut self,
        initial_capital: Decimal,
        start_date: DateTime<Utc>,
    ) -> Result<(), QuantsimError> {
        if initial_capital <= Decimal::ZERO {
            return Err(QuantsimError::CapitalOutOfRange {
                capital: initial_capital,
                min: Decimal::ZERO,
                max: Decimal::MAX,
            });
        }

        self.session = Some(Session::new(initial_capital, start_date));
        self.portfolio = Portfolio::new(initial_capital);
        self.positions.clear();
        self.transactions.clear();
        self.next_transaction_id = 1;

        info!(%initial_capital, "portfolio initialized");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn cash(&self) -> Decimal {
        self.portfolio.cash
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    pub fn get_position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(&normalize_symbol(symbol))
    }

    /// Transactions, newest first.
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter()
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    pub fn buy(
        &mut self,
        symbol: &str,
        shares: u64,
        price: Decimal,
    ) -> Result<Transaction, QuantsimError> {
        self.execute_trade(&TradeRequest::buy(symbol, shares, price))
    }

    pub fn sell(
        &mut self,
        symbol: &str,
        shares: u64,
        price: Decimal,
    ) -> Result<Transaction, QuantsimError> {
        self.execute_trade(&TradeRequest::sell(symbol, shares, price))
    }

    pub fn execute_trade(&mut self, request: &TradeRequest) -> Result<Transaction, QuantsimError> {
        self.execute_trade_at(request, Utc::now())
    }

    /// Executes an immediate market trade at the request price.
    pub fn execute_trade_at(
        &mut self,
        request: &TradeRequest,
        timestamp: DateTime<Utc>,
    ) -> Result<Transaction, QuantsimError> {
        let symbol = normalize_symbol(&request.symbol);
        let total = match self.check_trade(&symbol, request) {
            Ok(total) => total,
            Err(e) => {
                warn!(%symbol, side = %request.side, shares = request.shares, price = %request.price, error = %e, "trade rejected");
                return Err(e);
            }
        };

        let initial_capital = match &self.session {
            Some(session) => session.initial_capital,
            None => return Err(QuantsimError::UninitializedSession),
        };

        match request.side {
            TradeSide::Buy => {
                self.portfolio.cash -= total;
                match self.positions.get_mut(&symbol) {
                    Some(position) => position.add_shares(request.shares, request.price),
                    None => {
                        self.positions.insert(
                            symbol.clone(),
                            Position::open(&symbol, request.shares, request.price),
                        );
                    }
                }
            }
            TradeSide::Sell => {
                self.portfolio.cash += total;
                let remaining = self
                    .positions
                    .get_mut(&symbol)
                    .map(|position| position.remove_shares(request.shares, request.price))
                    .unwrap_or(0);
                if remaining == 0 {
                    self.positions.remove(&symbol);
                }
            }
        }

        let transaction = Transaction {
            id: self.next_transaction_id,
            symbol: symbol.clone(),
            side: request.side,
            shares: request.shares,
            price: request.price,
            total,
            timestamp,
        };
        self.next_transaction_id += 1;
        self.transactions.push_front(transaction.clone());

        self.portfolio.recompute(self.positions.values(), initial_capital);

        info!(
            id = transaction.id,
            %symbol,
            side = %transaction.side,
            shares = transaction.shares,
            price = %transaction.price,
            cash = %self.portfolio.cash,
            "trade executed"
        );
        Ok(transaction)
    }

    /// Validates a request against current state and returns its total.
    fn check_trade(&self, symbol: &str, request: &TradeRequest) -> Result<Decimal, QuantsimError> {
        if self.session.is_none() {
            return Err(QuantsimError::UninitializedSession);
        }
        if symbol.is_empty() {
            return Err(QuantsimError::InvalidSymbol);
        }
        if request.shares == 0 {
            return Err(QuantsimError::InvalidTradeQuantity {
                shares: request.shares,
            });
        }
        if request.price <= Decimal::ZERO {
            return Err(QuantsimError::InvalidPrice {
                symbol: symbol.to_string(),
                price: request.price,
            });
        }

        let overflow = || QuantsimError::QuantityOverflow {
            symbol: symbol.to_string(),
            shares: request.shares,
        };
        let total = request.total().ok_or_else(overflow)?;
        let held = self.positions.get(symbol).map(|p| p.shares).unwrap_or(0);

        match request.side {
            TradeSide::Buy => {
                if total > self.portfolio.cash {
                    return Err(QuantsimError::InsufficientFunds {
                        symbol: symbol.to_string(),
                        required: total,
                        available: self.portfolio.cash,
                    });
                }
                let new_shares = held.checked_add(request.shares).ok_or_else(overflow)?;
                lot_value(new_shares, request.price).ok_or_else(overflow)?;
            }
            TradeSide::Sell => {
                if held < request.shares {
                    return Err(QuantsimError::InsufficientShares {
                        symbol: symbol.to_string(),
                        requested: request.shares,
                        held,
                    });
                }
                self.portfolio.cash.checked_add(total).ok_or_else(overflow)?;
            }
        }
        Ok(total)
    }

    /// Marks held positions to the supplied prices without recording a
    /// trade. Symbols not held are ignored, as are non-positive prices and
    /// prices whose market value would not be representable. Returns how
    /// many positions changed price.
    pub fn revalue_positions(
        &mut self,
        price_updates: &HashMap<String, Decimal>,
    ) -> Result<usize, QuantsimError> {
        let initial_capital = self
            .session
            .as_ref()
            .map(|s| s.initial_capital)
            .ok_or(QuantsimError::UninitializedSession)?;

        let normalized: HashMap<String, Decimal> = price_updates
            .iter()
            .map(|(symbol, &price)| (normalize_symbol(symbol), price))
            .collect();

        let mut updated = 0usize;
        for position in self.positions.values_mut() {
            let Some(&price) = normalized.get(&position.symbol) else {
                continue;
            };
            if price <= Decimal::ZERO || lot_value(position.shares, price).is_none() {
                warn!(symbol = %position.symbol, %price, "ignoring invalid price update");
                continue;
            }
            if price != position.current_price {
                position.mark(price);
                updated += 1;
            }
        }

        self.portfolio.recompute(self.positions.values(), initial_capital);
        debug!(updated, total_value = %self.portfolio.total_value, "positions revalued");
        Ok(updated)
    }

    pub fn metrics(&self) -> PortfolioMetrics {
        PortfolioMetrics::from_transactions(self.transactions.iter())
    }

    /// Largest whole share count affordable at `price` with current cash.
    pub fn max_buy_shares(&self, price: Decimal) -> u64 {
        if price <= Decimal::ZERO {
            return 0;
        }
        self.portfolio
            .cash
            .checked_div(price)
            .and_then(|shares| shares.floor().to_u64())
            .unwrap_or(u64::MAX)
    }

    pub fn max_sell_shares(&self, symbol: &str) -> u64 {
        self.get_position(symbol).map(|p| p.shares).unwrap_or(0)
    }

    /// Share of total portfolio value held in `symbol`, in percent.
    pub fn allocation_percent(&self, symbol: &str) -> Decimal {
        self.get_position(symbol)
            .and_then(|position| position.market_value.checked_div(self.portfolio.total_value))
            .and_then(|share| share.checked_mul(dec!(100)))
            .unwrap_or(Decimal::ZERO)
    }

    /// Largest holdings by market value.
    pub fn top_positions(&self, n: usize) -> Vec<&Position> {
        let mut positions: Vec<&Position> = self.positions.values().collect();
        positions.sort_by(|a, b| b.market_value.cmp(&a.market_value));
        positions.truncate(n);
        positions
    }

    pub fn days_since_start(&self, now: DateTime<Utc>) -> Option<i64> {
        self.session.as_ref().map(|s| s.days_since_start(now))
    }

    pub fn watchlist(&self) -> &[WatchlistEntry] {
        &self.watchlist
    }

    /// Adds an entry unless the symbol is already watched.
    pub fn add_to_watchlist(&mut self, entry: WatchlistEntry) -> bool {
        let entry = WatchlistEntry {
            symbol: normalize_symbol(&entry.symbol),
            ..entry
        };
        if entry.symbol.is_empty() || self.watchlist.iter().any(|w| w.symbol == entry.symbol) {
            return false;
        }
        self.watchlist.push(entry);
        true
    }

    pub fn remove_from_watchlist(&mut self, symbol: &str) -> bool {
        let symbol = normalize_symbol(symbol);
        let before = self.watchlist.len();
        self.watchlist.retain(|w| w.symbol != symbol);
        self.watchlist.len() != before
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            session: self.session.clone(),
            portfolio: self.portfolio.clone(),
            positions: self.positions.values().cloned().collect(),
            transactions: self.transactions.iter().cloned().collect(),
            watchlist: self.watchlist.clone(),
        }
    }

    /// Rebuilds a ledger from a persisted snapshot, verbatim.
    pub fn restore(snapshot: LedgerSnapshot) -> Result<Self, QuantsimError> {
        validate_snapshot(&snapshot)?;

        let next_transaction_id = snapshot
            .transactions
            .iter()
            .map(|t| t.id)
            .max()
            .unwrap_or(0)
            + 1;

        let positions = snapshot
            .positions
            .into_iter()
            .map(|p| (p.symbol.clone(), p))
            .collect();

        Ok(PortfolioLedger {
            session: snapshot.session,
            portfolio: snapshot.portfolio,
            positions,
            transactions: snapshot.transactions.into(),
            watchlist: snapshot.watchlist,
            next_transaction_id,
        })
    }
}

fn invalid(reason: impl Into<String>) -> QuantsimError {
    QuantsimError::InvalidSnapshot {
        reason: reason.into(),
    }
}

fn validate_snapshot(snapshot: &LedgerSnapshot) -> Result<(), QuantsimError> {
    if snapshot.session.is_none()
        && (!snapshot.positions.is_empty() || !snapshot.transactions.is_empty())
    {
        return Err(invalid("positions or transactions without a session"));
    }
    if let Some(session) = &snapshot.session {
        if session.initial_capital <= Decimal::ZERO {
            return Err(invalid("initial capital must be positive"));
        }
    }

    let cash = snapshot.portfolio.cash;
    if cash < Decimal::ZERO {
        return Err(invalid(format!("cash {} must be non-negative", cash)));
    }

    let mut seen = HashSet::new();
    for position in &snapshot.positions {
        check_symbol(&position.symbol)?;
        if position.shares == 0 {
            return Err(invalid(format!("position {} has zero shares", position.symbol)));
        }
        if position.avg_price <= Decimal::ZERO || position.current_price <= Decimal::ZERO {
            return Err(invalid(format!("position {} has a non-positive price", position.symbol)));
        }
        if lot_value(position.shares, position.current_price).is_none() {
            return Err(invalid(format!(
                "position {} has an unrepresentable market value",
                position.symbol
            )));
        }
        if !seen.insert(position.symbol.as_str()) {
            return Err(invalid(format!("duplicate position {}", position.symbol)));
        }
    }

    let mut newer_id: Option<u64> = None;
    for t in &snapshot.transactions {
        check_symbol(&t.symbol)?;
        if t.id == 0 || newer_id.is_some_and(|newer| t.id >= newer) {
            return Err(invalid(format!(
                "transaction {} is out of order: ids must be unique and newest first",
                t.id
            )));
        }
        if t.shares == 0 {
            return Err(invalid(format!("transaction {} has zero shares", t.id)));
        }
        if t.price <= Decimal::ZERO {
            return Err(invalid(format!("transaction {} has a non-positive price", t.id)));
        }
        if lot_value(t.shares, t.price) != Some(t.total) {
            return Err(invalid(format!(
                "transaction {} total {} does not equal shares x price",
                t.id, t.total
            )));
        }
        newer_id = Some(t.id);
    }
    Ok(())
}

/// Stored symbols must already be in the form every lookup normalizes to.
fn check_symbol(symbol: &str) -> Result<(), QuantsimError> {
    if symbol.is_empty() || symbol != normalize_symbol(symbol) {
        return Err(invalid(format!("symbol '{}' is not normalized", symbol)));
    }
    Ok(())
}
