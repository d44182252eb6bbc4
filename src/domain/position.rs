//! Positions, trade requests and the immutable transaction record.
//!
//! Money is [`Decimal`]: cash movements are exact, so a buy and a sell of the
//! same lot at the same price cancel out to the cent and beyond.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    /// Sign of the cash flow this side produces: buys spend, sells receive.
    pub fn cash_sign(&self) -> Decimal {
        match self {
            TradeSide::Buy => Decimal::NEGATIVE_ONE,
            TradeSide::Sell => Decimal::ONE,
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "BUY"),
            TradeSide::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for TradeSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BUY" => Ok(TradeSide::Buy),
            "SELL" => Ok(TradeSide::Sell),
            other => Err(format!("unknown trade side '{}'", other)),
        }
    }
}

/// `shares × price`, or `None` when the product does not fit a [`Decimal`].
pub fn lot_value(shares: u64, price: Decimal) -> Option<Decimal> {
    Decimal::from(shares).checked_mul(price)
}

/// Immediate market order at a caller-supplied price.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRequest {
    pub symbol: String,
    pub side: TradeSide,
    pub shares: u64,
    pub price: Decimal,
}

impl TradeRequest {
    pub fn buy(symbol: impl Into<String>, shares: u64, price: Decimal) -> Self {
        TradeRequest {
            symbol: symbol.into(),
            side: TradeSide::Buy,
            shares,
            price,
        }
    }

    pub fn sell(symbol: impl Into<String>, shares: u64, price: Decimal) -> Self {
        TradeRequest {
            symbol: symbol.into(),
            side: TradeSide::Sell,
            shares,
            price,
        }
    }

    pub fn total(&self) -> Option<Decimal> {
        lot_value(self.shares, self.price)
    }
}

/// Holding of one symbol. Derived fields are refreshed by [`Position::mark`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub shares: u64,
    pub avg_price: Decimal,
    pub current_price: Decimal,
    pub market_value: Decimal,
    pub total_return: Decimal,
    pub total_return_percent: Decimal,
}

impl Position {
    pub fn open(symbol: &str, shares: u64, price: Decimal) -> Self {
        let mut position = Position {
            symbol: symbol.to_string(),
            shares,
            avg_price: price,
            current_price: price,
            market_value: Decimal::ZERO,
            total_return: Decimal::ZERO,
            total_return_percent: Decimal::ZERO,
        };
        position.mark(price);
        position
    }

    pub fn cost_basis(&self) -> Decimal {
        Decimal::from(self.shares).saturating_mul(self.avg_price)
    }

    /// Re-prices the position; the cost basis is left untouched.
    pub fn mark(&mut self, price: Decimal) {
        self.current_price = price;
        self.market_value = Decimal::from(self.shares).saturating_mul(price);
        self.total_return = self.market_value.saturating_sub(self.cost_basis());
        self.total_return_percent = (price - self.avg_price)
            .checked_div(self.avg_price)
            .and_then(|ratio| ratio.checked_mul(dec!(100)))
            .unwrap_or(Decimal::ZERO);
    }

    /// Adds shares bought at `price`, blending the average cost. The caller
    /// guarantees the new share count fits in a `u64`.
    pub fn add_shares(&mut self, shares: u64, price: Decimal) {
        let new_shares = self.shares.saturating_add(shares);
        let cost = self
            .cost_basis()
            .saturating_add(Decimal::from(shares).saturating_mul(price));
        self.avg_price = cost / Decimal::from(new_shares);
        self.shares = new_shares;
        self.mark(price);
    }

    /// Removes sold shares. Returns the remaining share count.
    pub fn remove_shares(&mut self, shares: u64, price: Decimal) -> u64 {
        self.shares = self.shares.saturating_sub(shares);
        self.mark(price);
        self.shares
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: u64,
    pub symbol: String,
    pub side: TradeSide,
    pub shares: u64,
    pub price: Decimal,
    pub total: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Signed cash flow: negative for buys, positive for sells.
    pub fn cash_flow(&self) -> Decimal {
        self.side.cash_sign() * self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_position_has_zero_return() {
        let pos = Position::open("AAPL", 10, dec!(150));
        assert_eq!(pos.shares, 10);
        assert_eq!(pos.avg_price, dec!(150));
        assert_eq!(pos.market_value, dec!(1500));
        assert_eq!(pos.total_return, Decimal::ZERO);
        assert_eq!(pos.total_return_percent, Decimal::ZERO);
    }

    #[test]
    fn mark_uses_existing_cost_basis() {
        let mut pos = Position::open("AAPL", 10, dec!(100));
        pos.mark(dec!(110));
        assert_eq!(pos.avg_price, dec!(100));
        assert_eq!(pos.market_value, dec!(1100));
        assert_eq!(pos.total_return, dec!(100));
        assert_eq!(pos.total_return_percent, dec!(10));
    }

    #[test]
    fn add_shares_blends_average_cost() {
        let mut pos = Position::open("AAPL", 10, dec!(100));
        pos.add_shares(10, dec!(200));
        assert_eq!(pos.shares, 20);
        assert_eq!(pos.avg_price, dec!(150));
        assert_eq!(pos.market_value, dec!(4000));
        assert_eq!(pos.total_return, dec!(1000));
    }

    #[test]
    fn remove_shares_keeps_cost_basis() {
        let mut pos = Position::open("AAPL", 100, dec!(10));
        let remaining = pos.remove_shares(40, dec!(12));
        assert_eq!(remaining, 60);
        assert_eq!(pos.avg_price, dec!(10));
        assert_eq!(pos.market_value, dec!(720));
        assert_eq!(pos.total_return, dec!(120));
        assert_eq!(pos.total_return_percent, dec!(20));
    }

    #[test]
    fn huge_mark_saturates_instead_of_panicking() {
        let mut pos = Position::open("X", u64::MAX, dec!(0.0000001));
        pos.mark(Decimal::MAX);
        assert_eq!(pos.market_value, Decimal::MAX);
    }

    #[test]
    fn trade_side_parse_and_display() {
        assert_eq!("buy".parse::<TradeSide>().unwrap(), TradeSide::Buy);
        assert_eq!(" SELL ".parse::<TradeSide>().unwrap(), TradeSide::Sell);
        assert!("hold".parse::<TradeSide>().is_err());
        assert_eq!(TradeSide::Buy.to_string(), "BUY");
    }

    #[test]
    fn trade_side_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&TradeSide::Sell).unwrap(), "\"SELL\"");
    }

    #[test]
    fn transaction_cash_flow_sign() {
        let buy = Transaction {
            id: 1,
            symbol: "AAPL".into(),
            side: TradeSide::Buy,
            shares: 10,
            price: dec!(100),
            total: dec!(1000),
            timestamp: Utc::now(),
        };
        let sell = Transaction {
            side: TradeSide::Sell,
            ..buy.clone()
        };
        assert_eq!(buy.cash_flow(), dec!(-1000));
        assert_eq!(sell.cash_flow(), dec!(1000));
    }

    #[test]
    fn trade_request_total() {
        let req = TradeRequest::buy("AAPL", 3, dec!(12.5));
        assert_eq!(req.total(), Some(dec!(37.5)));
        assert_eq!(req.side, TradeSide::Buy);
        assert_eq!(TradeRequest::buy("AAPL", u64::MAX, Decimal::MAX).total(), None);
    }
}
