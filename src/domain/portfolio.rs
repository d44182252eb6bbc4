//! Portfolio totals and session metadata.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::position::Position;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub initial_capital: Decimal,
    pub start_date: DateTime<Utc>,
}

impl Session {
    pub fn new(initial_capital: Decimal, start_date: DateTime<Utc>) -> Self {
        Session {
            initial_capital,
            start_date,
        }
    }

    pub fn days_since_start(&self, now: DateTime<Utc>) -> i64 {
        (now - self.start_date).num_days().max(0)
    }
}

/// Cash plus derived totals. `day_change` fields are informational and only
/// ever carried through.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Portfolio {
    pub cash: Decimal,
    pub total_value: Decimal,
    pub total_return: Decimal,
    pub total_return_percent: Decimal,
    pub day_change: Decimal,
    pub day_change_percent: Decimal,
}

impl Portfolio {
    pub fn new(initial_capital: Decimal) -> Self {
        Portfolio {
            cash: initial_capital,
            total_value: initial_capital,
            ..Portfolio::default()
        }
    }

    /// Recomputes totals from cash and the given position market values.
    pub fn recompute<'a, I>(&mut self, positions: I, initial_capital: Decimal)
    where
        I: IntoIterator<Item = &'a Position>,
    {
        let position_value = positions
            .into_iter()
            .fold(Decimal::ZERO, |acc, p| acc.saturating_add(p.market_value));
        self.total_value = self.cash.saturating_add(position_value);
        self.total_return = self.total_value.saturating_sub(initial_capital);
        self.total_return_percent = self
            .total_return
            .checked_div(initial_capital)
            .and_then(|ratio| ratio.checked_mul(dec!(100)))
            .unwrap_or(Decimal::ZERO);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_portfolio() {
        let portfolio = Portfolio::new(dec!(100000));
        assert_eq!(portfolio.cash, dec!(100000));
        assert_eq!(portfolio.total_value, dec!(100000));
        assert_eq!(portfolio.total_return, Decimal::ZERO);
        assert_eq!(portfolio.day_change, Decimal::ZERO);
    }

    #[test]
    fn recompute_no_positions() {
        let mut portfolio = Portfolio::new(dec!(100000));
        portfolio.recompute(&Vec::<Position>::new(), dec!(100000));
        assert_eq!(portfolio.total_value, dec!(100000));
        assert_eq!(portfolio.total_return_percent, Decimal::ZERO);
    }

    #[test]
    fn recompute_with_positions() {
        let mut portfolio = Portfolio::new(dec!(50000));
        portfolio.cash = dec!(40000);
        let positions = vec![Position::open("AAPL", 100, dec!(150))];

        portfolio.recompute(&positions, dec!(50000));
        assert_eq!(portfolio.total_value, dec!(55000));
        assert_eq!(portfolio.total_return, dec!(5000));
        assert_eq!(portfolio.total_return_percent, dec!(10));
    }

    #[test]
    fn recompute_preserves_day_change() {
        let mut portfolio = Portfolio::new(dec!(10000));
        portfolio.day_change = dec!(12.5);
        portfolio.recompute(&Vec::<Position>::new(), dec!(10000));
        assert_eq!(portfolio.day_change, dec!(12.5));
    }

    #[test]
    fn days_since_start() {
        let start = Utc::now() - chrono::Duration::days(3);
        let session = Session::new(dec!(10000), start);
        assert_eq!(session.days_since_start(Utc::now()), 3);
        assert_eq!(session.days_since_start(start - chrono::Duration::days(1)), 0);
    }
}
