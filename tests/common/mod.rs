#![allow(dead_code)]

use chrono::NaiveDate;
use quantsim::domain::error::QuantsimError;
use quantsim::domain::ledger::PortfolioLedger;
use quantsim::domain::price_series::PriceSeries;
use quantsim::ports::price_port::PricePort;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::io::Write;
use std::process::ExitCode;

pub struct MockPricePort {
    pub closes: HashMap<String, Vec<f64>>,
    pub errors: HashMap<String, String>,
}

impl MockPricePort {
    pub fn new() -> Self {
        Self {
            closes: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_closes(mut self, symbol: &str, closes: Vec<f64>) -> Self {
        self.closes.insert(symbol.to_string(), closes);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl PricePort for MockPricePort {
    fn current_price(&self, symbol: &str) -> Result<f64, QuantsimError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(QuantsimError::PriceData {
                reason: reason.clone(),
            });
        }
        self.closes
            .get(symbol)
            .and_then(|c| c.last().copied())
            .ok_or_else(|| QuantsimError::NoPriceData {
                symbol: symbol.to_string(),
            })
    }

    fn history(&self, symbol: &str, days: usize) -> Result<PriceSeries, QuantsimError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(QuantsimError::PriceData {
                reason: reason.clone(),
            });
        }
        let closes = self.closes.get(symbol).cloned().unwrap_or_default();
        Ok(PriceSeries::from_closes(symbol, &closes, date(2024, 6, 28)).tail(days))
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Gently oscillating closes around `start_price`.
pub fn wave_closes(count: usize, start_price: f64) -> Vec<f64> {
    (0..count)
        .map(|i| start_price + (i as f64 * 0.35).sin() * start_price * 0.03 + i as f64 * 0.1)
        .collect()
}

pub fn initialized_ledger(capital: Decimal) -> PortfolioLedger {
    let mut ledger = PortfolioLedger::new();
    ledger.initialize(capital).unwrap();
    ledger
}

pub fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub fn assert_exit(code: ExitCode, expected: u8) {
    assert_eq!(
        format!("{:?}", code),
        format!("{:?}", ExitCode::from(expected))
    );
}
