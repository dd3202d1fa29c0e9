//! Database utilities for connections and schema migrations.
//!
//! This module provides:
//! - SQLite connection helpers: [`connection::connect_sqlite`] applies WAL, foreign_keys=ON, and a 5000ms busy_timeout.
//! - Embedded Diesel migrations and runners: [`migrate::run_sqlite`] and [`migrate::run_all`],
//!   which accepts `sqlite:`/`sqlite://` URLs as well as bare file paths.
//!
//! Example:
//! ```no_run
//! use neo_sync::db::{migrate, connection};
//!
//! let db_path = std::env::temp_dir().join("neo_sync_example.db");
//! migrate::run_all(db_path.to_str().unwrap()).expect("migrations");
//!
//! let _conn = connection::connect_sqlite(db_path.to_str().unwrap()).expect("connect");
//! ```

pub mod connection;
pub mod migrate;

/// Strips an optional `sqlite:` / `sqlite://` scheme, leaving what SQLite expects.
///
/// Returns an error for URLs that name another backend.
pub fn sqlite_path(database_url: &str) -> anyhow::Result<&str> {
    if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        anyhow::bail!("Unsupported DATABASE_URL (only SQLite is supported): {database_url}");
    }
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);
    if path.is_empty() {
        anyhow::bail!("Empty SQLite path in DATABASE_URL");
    }
    Ok(path)
}
