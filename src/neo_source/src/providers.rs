//! Provider abstraction for near-Earth-object data sources.
//!
//! This module defines the [`DataSource`] trait, the unified interface the sync
//! engine uses to page through an upstream catalogue of near-Earth objects.
//! [`nasa_rest::NasaNeoProvider`] is the production implementation backed by the
//! NASA NeoWs `browse` endpoint; tests substitute in-memory sources.
//!
//! The trait is async and object safe, so the engine holds sources as
//! `Arc<dyn DataSource + Send + Sync>`.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use neo_source::models::page::BrowsePage;
//! use neo_source::providers::{DataSource, ProviderError};
//!
//! struct EmptySource;
//!
//! #[async_trait]
//! impl DataSource for EmptySource {
//!     async fn browse(&self, page: u32, _size: u32) -> Result<BrowsePage, ProviderError> {
//!         Ok(BrowsePage { page, total_pages: Some(0), ..Default::default() })
//!     }
//! }
//! ```

pub mod nasa_rest;

use async_trait::async_trait;
use shared_utils::env::MissingEnvVarError;
use snafu::{Backtrace, Snafu};

use crate::models::page::BrowsePage;

/// Fetches pages of near-Earth objects from an upstream catalogue.
#[async_trait]
pub trait DataSource {
    /// Fetches one page.
    ///
    /// # Arguments
    ///
    /// * `page` - Zero-based page index.
    /// * `size` - Number of objects per page.
    ///
    /// Implementations must not retry internally; a single call is a single
    /// request against the upstream budget.
    async fn browse(&self, page: u32, size: u32) -> Result<BrowsePage, ProviderError>;
}

/// Errors that can occur during the creation of a provider instance
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// missed environment variable.
    #[snafu(display("Missing environment variable: {source}"))]
    MissingEnvVar {
        source: MissingEnvVarError,
        backtrace: Backtrace,
    },

    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The base URL is not an absolute http(s) URL.
    #[snafu(display("Invalid base URL: {url}"))]
    InvalidBaseUrl { url: String, backtrace: Backtrace },
}

/// Errors that can occur within a `DataSource` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// An error during an API request (e.g., network failure, timeout).
    #[snafu(display("API request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The API answered with a non-success status.
    #[snafu(display("API error ({status}): {message}"))]
    Api {
        status: u16,
        message: String,
        backtrace: Backtrace,
    },

    /// The API refused the call because the rate-limit window is used up.
    #[snafu(display("Rate limit exceeded: {message}"))]
    RateLimited {
        message: String,
        backtrace: Backtrace,
    },

    /// The response body was not the expected JSON document.
    #[snafu(display("Malformed response body for page {page}: {source}"))]
    Decode {
        page: u32,
        source: serde_json::Error,
        backtrace: Backtrace,
    },
}

impl ProviderError {
    /// True when the failure means the upstream call budget is exhausted.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ProviderError::RateLimited { .. })
    }
}
