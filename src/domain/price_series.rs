//! Closing-price history consumed by the indicator engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Ordered closes for one symbol, oldest first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.date);
        PriceSeries {
            symbol: symbol.into(),
            points,
        }
    }

    /// Builds a series from bare closes, dated one day apart ending at `end`.
    pub fn from_closes(symbol: impl Into<String>, closes: &[f64], end: NaiveDate) -> Self {
        let n = closes.len() as i64;
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                date: end - chrono::Duration::days(n - 1 - i as i64),
                close,
            })
            .collect();
        PriceSeries {
            symbol: symbol.into(),
            points,
        }
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn latest(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Keeps only the most recent `n` points.
    pub fn tail(&self, n: usize) -> PriceSeries {
        let start = self.points.len().saturating_sub(n);
        PriceSeries {
            symbol: self.symbol.clone(),
            points: self.points[start..].to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn new_sorts_points_by_date() {
        let series = PriceSeries::new(
            "AAPL",
            vec![
                PricePoint {
                    date: date(2024, 1, 3),
                    close: 3.0,
                },
                PricePoint {
                    date: date(2024, 1, 1),
                    close: 1.0,
                },
                PricePoint {
                    date: date(2024, 1, 2),
                    close: 2.0,
                },
            ],
        );
        assert_eq!(series.closes(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn from_closes_dates_end_on_last_point() {
        let series = PriceSeries::from_closes("AAPL", &[10.0, 11.0, 12.0], date(2024, 3, 10));
        assert_eq!(series.points[0].date, date(2024, 3, 8));
        assert_eq!(series.latest().unwrap().date, date(2024, 3, 10));
        assert!((series.latest().unwrap().close - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn tail_keeps_most_recent() {
        let series = PriceSeries::from_closes("AAPL", &[1.0, 2.0, 3.0, 4.0], date(2024, 1, 4));
        assert_eq!(series.tail(2).closes(), vec![3.0, 4.0]);
        assert_eq!(series.tail(10).len(), 4);
    }

    #[test]
    fn empty_series() {
        let series = PriceSeries::default();
        assert!(series.is_empty());
        assert!(series.latest().is_none());
    }
}
