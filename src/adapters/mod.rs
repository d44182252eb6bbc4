//! Concrete adapter implementations for ports.

pub mod csv_price_adapter;
pub mod file_config_adapter;
pub mod json_snapshot_adapter;
#[cfg(feature = "sqlite")]
pub mod sqlite_snapshot_adapter;
pub mod synthetic_price_adapter;
