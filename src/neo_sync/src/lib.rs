//! Store side of the NEO harvest: persistence, reconciliation and run orchestration.
//!
//! - [`store`]: the [`store::AsteroidStore`] surface and its SQLite implementation.
//! - [`reconcile`]: decides insert / supersede / skip for one fetched object.
//! - [`sync`]: plans pages, runs concurrent batches, reports a [`sync::RunSummary`].
//! - [`config`]: TOML tunables for the engine and its host loop.

#![deny(missing_docs)]

pub mod config;
pub mod db;
pub mod models;
pub mod reconcile;
/// Diesel table definitions for the embedded migrations.
#[allow(missing_docs)]
pub mod schema;
pub mod store;
pub mod sync;
