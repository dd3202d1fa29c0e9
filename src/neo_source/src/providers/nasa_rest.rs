//! NASA NeoWs REST provider (`/neo/browse`).

pub mod params;
pub mod provider;
pub mod response;

pub use provider::{NasaNeoProvider, NasaProviderOptions};
