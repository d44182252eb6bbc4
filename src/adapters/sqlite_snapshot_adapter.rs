//! SQLite ledger store.
//!
//! Each table holds the current state only; `save` replaces everything in a
//! single SQL transaction. Money columns are decimal strings.

use crate::domain::error::QuantsimError;
use crate::domain::ledger::{LedgerSnapshot, WatchlistEntry};
use crate::domain::portfolio::{Portfolio, Session};
use crate::domain::position::{Position, TradeSide, Transaction};
use crate::ports::snapshot_port::SnapshotPort;
use chrono::{DateTime, SecondsFormat, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, params};
use rust_decimal::Decimal;
use std::path::Path;
use tracing::debug;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS session (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        initial_capital TEXT NOT NULL,
        start_date TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS portfolio (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        cash TEXT NOT NULL,
        total_value TEXT NOT NULL,
        total_return TEXT NOT NULL,
        total_return_percent TEXT NOT NULL,
        day_change TEXT NOT NULL,
        day_change_percent TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS positions (
        symbol TEXT PRIMARY KEY,
        shares INTEGER NOT NULL,
        avg_price TEXT NOT NULL,
        current_price TEXT NOT NULL,
        market_value TEXT NOT NULL,
        total_return TEXT NOT NULL,
        total_return_percent TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS transactions (
        id INTEGER PRIMARY KEY,
        symbol TEXT NOT NULL,
        side TEXT NOT NULL,
        shares INTEGER NOT NULL,
        price TEXT NOT NULL,
        total TEXT NOT NULL,
        timestamp TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS watchlist (
        seq INTEGER PRIMARY KEY,
        symbol TEXT NOT NULL UNIQUE,
        name TEXT
    );";

fn storage_err<E: std::fmt::Display>(e: E) -> QuantsimError {
    QuantsimError::Storage {
        reason: e.to_string(),
    }
}

fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_ts(value: &str) -> Result<DateTime<Utc>, QuantsimError> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| storage_err(format!("invalid timestamp '{}': {}", value, e)))
}

fn parse_money(value: &str) -> Result<Decimal, QuantsimError> {
    value
        .parse()
        .map_err(|e| storage_err(format!("invalid amount '{}': {}", value, e)))
}

pub struct SqliteSnapshotAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteSnapshotAdapter {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, QuantsimError> {
        debug!(path = %path.as_ref().display(), "opening sqlite store");
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .max_size(2)
            .build(manager)
            .map_err(storage_err)?;
        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    pub fn in_memory() -> Result<Self, QuantsimError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(storage_err)?;
        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, QuantsimError> {
        self.pool.get().map_err(storage_err)
    }

    fn initialize_schema(&self) -> Result<(), QuantsimError> {
        self.conn()?.execute_batch(SCHEMA).map_err(storage_err)
    }
}

impl SnapshotPort for SqliteSnapshotAdapter {
    fn load(&self) -> Result<Option<LedgerSnapshot>, QuantsimError> {
        let conn = self.conn()?;

        let portfolio_row: Option<[String; 6]> = conn
            .query_row(
                "SELECT cash, total_value, total_return, total_return_percent,
                        day_change, day_change_percent
                 FROM portfolio WHERE id = 1",
                [],
                |row| {
                    Ok([
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ])
                },
            )
            .optional()
            .map_err(storage_err)?;

        let Some(p) = portfolio_row else {
            return Ok(None);
        };
        let portfolio = Portfolio {
            cash: parse_money(&p[0])?,
            total_value: parse_money(&p[1])?,
            total_return: parse_money(&p[2])?,
            total_return_percent: parse_money(&p[3])?,
            day_change: parse_money(&p[4])?,
            day_change_percent: parse_money(&p[5])?,
        };

        let session_row: Option<(String, String)> = conn
            .query_row(
                "SELECT initial_capital, start_date FROM session WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(storage_err)?;
        let session = match session_row {
            Some((initial_capital, start)) => Some(Session::new(
                parse_money(&initial_capital)?,
                parse_ts(&start)?,
            )),
            None => None,
        };

        let mut stmt = conn
            .prepare(
                "SELECT symbol, shares, avg_price, current_price, market_value,
                        total_return, total_return_percent
                 FROM positions ORDER BY symbol ASC",
            )
            .map_err(storage_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    [
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                    ],
                ))
            })
            .map_err(storage_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(storage_err)?;

        let mut positions = Vec::with_capacity(rows.len());
        for (symbol, shares, money) in rows {
            positions.push(Position {
                symbol,
                shares: shares as u64,
                avg_price: parse_money(&money[0])?,
                current_price: parse_money(&money[1])?,
                market_value: parse_money(&money[2])?,
                total_return: parse_money(&money[3])?,
                total_return_percent: parse_money(&money[4])?,
            });
        }

        let mut stmt = conn
            .prepare(
                "SELECT id, symbol, side, shares, price, total, timestamp
                 FROM transactions ORDER BY id DESC",
            )
            .map_err(storage_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })
            .map_err(storage_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(storage_err)?;

        let mut transactions = Vec::with_capacity(rows.len());
        for (id, symbol, side, shares, price, total, timestamp) in rows {
            let side: TradeSide = side.parse().map_err(storage_err)?;
            transactions.push(Transaction {
                id: id as u64,
                symbol,
                side,
                shares: shares as u64,
                price: parse_money(&price)?,
                total: parse_money(&total)?,
                timestamp: parse_ts(&timestamp)?,
            });
        }

        let mut stmt = conn
            .prepare("SELECT symbol, name FROM watchlist ORDER BY seq ASC")
            .map_err(storage_err)?;
        let watchlist = stmt
            .query_map([], |row| {
                Ok(WatchlistEntry {
                    symbol: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .map_err(storage_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(storage_err)?;

        debug!(
            positions = positions.len(),
            transactions = transactions.len(),
            "state loaded from sqlite"
        );
        Ok(Some(LedgerSnapshot {
            session,
            portfolio,
            positions,
            transactions,
            watchlist,
        }))
    }

    fn save(&self, snapshot: &LedgerSnapshot) -> Result<(), QuantsimError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(storage_err)?;

        tx.execute_batch(
            "DELETE FROM session; DELETE FROM portfolio; DELETE FROM positions;
             DELETE FROM transactions; DELETE FROM watchlist;",
        )
        .map_err(storage_err)?;

        if let Some(session) = &snapshot.session {
            tx.execute(
                "INSERT INTO session (id, initial_capital, start_date) VALUES (1, ?1, ?2)",
                params![
                    session.initial_capital.to_string(),
                    format_ts(&session.start_date)
                ],
            )
            .map_err(storage_err)?;
        }

        let p = &snapshot.portfolio;
        tx.execute(
            "INSERT INTO portfolio (id, cash, total_value, total_return, total_return_percent,
                                    day_change, day_change_percent)
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                p.cash.to_string(),
                p.total_value.to_string(),
                p.total_return.to_string(),
                p.total_return_percent.to_string(),
                p.day_change.to_string(),
                p.day_change_percent.to_string()
            ],
        )
        .map_err(storage_err)?;

        for pos in &snapshot.positions {
            tx.execute(
                "INSERT INTO positions (symbol, shares, avg_price, current_price, market_value,
                                        total_return, total_return_percent)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    pos.symbol,
                    pos.shares as i64,
                    pos.avg_price.to_string(),
                    pos.current_price.to_string(),
                    pos.market_value.to_string(),
                    pos.total_return.to_string(),
                    pos.total_return_percent.to_string()
                ],
            )
            .map_err(storage_err)?;
        }

        for t in &snapshot.transactions {
            tx.execute(
                "INSERT INTO transactions (id, symbol, side, shares, price, total, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    t.id as i64,
                    t.symbol,
                    t.side.to_string(),
                    t.shares as i64,
                    t.price.to_string(),
                    t.total.to_string(),
                    format_ts(&t.timestamp)
                ],
            )
            .map_err(storage_err)?;
        }

        for (seq, entry) in snapshot.watchlist.iter().enumerate() {
            tx.execute(
                "INSERT INTO watchlist (seq, symbol, name) VALUES (?1, ?2, ?3)",
                params![seq as i64, entry.symbol, entry.name],
            )
            .map_err(storage_err)?;
        }

        tx.commit().map_err(storage_err)?;
        debug!("state saved to sqlite");
        Ok(())
    }
}
