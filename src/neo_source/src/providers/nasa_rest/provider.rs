use std::{num::NonZeroU32, sync::Arc, time::Duration};

use async_trait::async_trait;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use nonzero_ext::nonzero;
use reqwest::{Client, StatusCode};
use secrecy::SecretString;
use shared_utils::env::get_env_var;
use snafu::{ResultExt, ensure};
use tracing::debug;

use crate::{
    models::page::BrowsePage,
    providers::{
        ApiSnafu, ClientBuildSnafu, DataSource, DecodeSnafu, InvalidBaseUrlSnafu,
        MissingEnvVarSnafu, ProviderError, ProviderInitError, RateLimitedSnafu, ReqwestSnafu,
        nasa_rest::{
            params::{browse_query, browse_url},
            response::{NeoBrowseResponse, RATE_LIMIT_REMAINING_HEADER},
        },
    },
};

/// Public NeoWs endpoint root.
pub const DEFAULT_BASE_URL: &str = "https://api.nasa.gov/neo/rest/v1";

/// Environment variable holding the api.data.gov key.
pub const API_KEY_ENV: &str = "NASA_API_KEY";

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Connection settings for [`NasaNeoProvider`].
#[derive(Debug, Clone)]
pub struct NasaProviderOptions {
    /// Endpoint root, without the `/neo/browse` suffix.
    pub base_url: String,
    /// Client-side pacing. `None` disables pacing entirely.
    pub requests_per_second: Option<u32>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for NasaProviderOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            requests_per_second: Some(5),
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct NasaNeoProvider {
    client: Client,
    base_url: String,
    api_key: SecretString,
    limiter: Option<Arc<DirectLimiter>>,
}

impl NasaNeoProvider {
    /// Creates a new NeoWs provider.
    ///
    /// Reads the API key from the `NASA_API_KEY` environment variable.
    pub fn new(options: NasaProviderOptions) -> Result<Self, ProviderInitError> {
        let api_key = SecretString::from(get_env_var(API_KEY_ENV).context(MissingEnvVarSnafu)?);
        Self::with_api_key(options, api_key)
    }

    /// Creates a provider with an explicitly supplied key.
    pub fn with_api_key(
        options: NasaProviderOptions,
        api_key: SecretString,
    ) -> Result<Self, ProviderInitError> {
        let base_url = options.base_url.trim().to_string();
        ensure!(
            base_url.starts_with("http://") || base_url.starts_with("https://"),
            InvalidBaseUrlSnafu { url: base_url }
        );

        let client = Client::builder()
            .timeout(options.timeout)
            .build()
            .context(ClientBuildSnafu)?;

        let limiter = options.requests_per_second.map(|rps| {
            let rps = NonZeroU32::new(rps).unwrap_or(nonzero!(1u32));
            Arc::new(RateLimiter::direct(Quota::per_second(rps)))
        });

        Ok(Self {
            client,
            base_url,
            api_key,
            limiter,
        })
    }

    fn remaining_budget(headers: &reqwest::header::HeaderMap) -> Option<u32> {
        headers
            .get(RATE_LIMIT_REMAINING_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u32>().ok())
    }
}

#[async_trait]
impl DataSource for NasaNeoProvider {
    async fn browse(&self, page: u32, size: u32) -> Result<BrowsePage, ProviderError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        let url = browse_url(&self.base_url);
        debug!(page, size, "requesting NeoWs browse page");

        let response = self
            .client
            .get(&url)
            .query(&browse_query(page, size, &self.api_key))
            .send()
            .await
            .context(ReqwestSnafu)?;

        let status = response.status();
        let rate_remaining = Self::remaining_budget(response.headers());

        if status == StatusCode::TOO_MANY_REQUESTS {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Too many requests".to_string());
            return RateLimitedSnafu { message }.fail();
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown API error".to_string());
            return ApiSnafu {
                status: status.as_u16(),
                message,
            }
            .fail();
        }

        let body = response.text().await.context(ReqwestSnafu)?;
        let parsed: NeoBrowseResponse =
            serde_json::from_str(&body).context(DecodeSnafu { page })?;

        Ok(BrowsePage {
            page,
            objects: parsed.near_earth_objects,
            total_pages: parsed.page.map(|p| p.total_pages),
            rate_remaining,
        })
    }
}
