//! Small helpers shared by the `neo_source` and `neo_sync` crates.

pub mod env;
