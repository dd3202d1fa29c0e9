//! Data-source side of the NEO harvest: payload models, the [`providers::DataSource`]
//! abstraction with its NASA NeoWs implementation, the shared [`rate::RateTracker`]
//! and the [`fetcher::PageFetcher`] that ties the two together.

pub mod fetcher;
pub mod models;
pub mod providers;
pub mod rate;
