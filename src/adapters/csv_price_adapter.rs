//! CSV file price adapter.
//!
//! One file per symbol, `<dir>/<SYMBOL>.csv`, with a header row containing
//! at least `date` (YYYY-MM-DD) and `close` columns. Other columns are ignored.

use crate::domain::error::QuantsimError;
use crate::domain::price_series::{PricePoint, PriceSeries};
use crate::ports::price_port::PricePort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

pub struct CsvPriceAdapter {
    base_path: PathBuf,
}

impl CsvPriceAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path
            .join(format!("{}.csv", symbol.trim().to_uppercase()))
    }

    fn load_series(&self, symbol: &str) -> Result<PriceSeries, QuantsimError> {
        let path = self.csv_path(symbol);
        if !path.exists() {
            return Err(QuantsimError::NoPriceData {
                symbol: symbol.to_string(),
            });
        }
        debug!(path = %path.display(), "reading price file");

        let content = fs::read_to_string(&path)?;
        let mut rdr = csv::Reader::from_reader(content.as_bytes());

        let headers = rdr
            .headers()
            .map_err(|e| QuantsimError::PriceData {
                reason: format!("CSV header error in {}: {}", path.display(), e),
            })?
            .clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| QuantsimError::PriceData {
                    reason: format!("missing {} column in {}", name, path.display()),
                })
        };
        let date_idx = column("date")?;
        let close_idx = column("close")?;

        let mut points = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| QuantsimError::PriceData {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = record.get(date_idx).unwrap_or_default().trim();
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                QuantsimError::PriceData {
                    reason: format!("invalid date '{}': {}", date_str, e),
                }
            })?;

            let close_str = record.get(close_idx).unwrap_or_default().trim();
            let close: f64 = close_str.parse().map_err(|e| QuantsimError::PriceData {
                reason: format!("invalid close value '{}': {}", close_str, e),
            })?;

            points.push(PricePoint { date, close });
        }

        Ok(PriceSeries::new(symbol.trim().to_uppercase(), points))
    }
}

impl PricePort for CsvPriceAdapter {
    fn current_price(&self, symbol: &str) -> Result<f64, QuantsimError> {
        self.load_series(symbol)?
            .latest()
            .map(|p| p.close)
            .ok_or_else(|| QuantsimError::NoPriceData {
                symbol: symbol.to_string(),
            })
    }

    fn history(&self, symbol: &str, days: usize) -> Result<PriceSeries, QuantsimError> {
        Ok(self.load_series(symbol)?.tail(days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        // Out of order on purpose, with extra OHLCV columns.
        let csv_content = "date,open,high,low,close,volume\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-16,105.0,115.0,100.0,110.0,60000\n";

        fs::write(path.join("BHP.csv"), csv_content).unwrap();
        fs::write(path.join("EMPTY.csv"), "date,close\n").unwrap();
        fs::write(path.join("BAD.csv"), "date,close\n2024-13-45,1.0\n").unwrap();
        fs::write(path.join("NOCLOSE.csv"), "date,open\n2024-01-15,1.0\n").unwrap();

        (dir, path)
    }

    #[test]
    fn history_is_sorted_and_uses_close_column() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);

        let series = adapter.history("bhp", 10).unwrap();
        assert_eq!(series.symbol, "BHP");
        assert_eq!(series.closes(), vec![105.0, 110.0, 115.0]);
        assert_eq!(
            series.points[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
    }

    #[test]
    fn history_returns_most_recent_days() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);
        assert_eq!(adapter.history("BHP", 2).unwrap().closes(), vec![110.0, 115.0]);
    }

    #[test]
    fn current_price_is_last_close() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);
        assert_eq!(adapter.current_price("BHP").unwrap(), 115.0);
    }

    #[test]
    fn missing_or_empty_file_is_no_price_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);
        assert!(matches!(
            adapter.current_price("NOPE"),
            Err(QuantsimError::NoPriceData { .. })
        ));
        assert!(matches!(
            adapter.current_price("EMPTY"),
            Err(QuantsimError::NoPriceData { .. })
        ));
        assert!(adapter.history("EMPTY", 5).unwrap().is_empty());
    }

    #[test]
    fn malformed_rows_are_price_data_errors() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);
        assert!(matches!(
            adapter.history("BAD", 5),
            Err(QuantsimError::PriceData { .. })
        ));
        assert!(matches!(
            adapter.history("NOCLOSE", 5),
            Err(QuantsimError::PriceData { .. })
        ));
    }
}
