//! Single-page fetching against a [`DataSource`], with budget bookkeeping.

use std::sync::Arc;

use snafu::Snafu;
use tracing::{debug, warn};

use crate::{
    models::page::BrowsePage,
    providers::{DataSource, ProviderError},
    rate::RateTracker,
};

/// Objects requested per `browse` call.
pub const PAGE_SIZE: u32 = 20;

/// A page could not be fetched. Callers treat this as "try later", never as fatal.
#[derive(Debug, Snafu)]
#[snafu(display("failed to fetch page {page}: {source}"))]
pub struct FetchFailure {
    /// Page index that failed.
    pub page: u32,
    /// Underlying provider error.
    pub source: ProviderError,
}

impl FetchFailure {
    /// True when the source refused the call for budget reasons.
    pub fn is_rate_limited(&self) -> bool {
        self.source.is_rate_limited()
    }
}

/// Fetches one page at a time and keeps the shared [`RateTracker`] current.
///
/// Never retries: retry and back-off belong to the orchestrator, which reads the
/// tracker this fetcher updates.
#[derive(Clone)]
pub struct PageFetcher {
    source: Arc<dyn DataSource + Send + Sync>,
    tracker: RateTracker,
    page_size: u32,
}

impl PageFetcher {
    pub fn new(source: Arc<dyn DataSource + Send + Sync>, tracker: RateTracker) -> Self {
        Self {
            source,
            tracker,
            page_size: PAGE_SIZE,
        }
    }

    /// Overrides the page size (defaults to [`PAGE_SIZE`]).
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn tracker(&self) -> &RateTracker {
        &self.tracker
    }

    /// Fetches `page`, updating the budget from the response metadata.
    pub async fn fetch(&self, page: u32) -> Result<BrowsePage, FetchFailure> {
        match self.source.browse(page, self.page_size).await {
            Ok(result) => {
                match result.rate_remaining {
                    Some(remaining) => self.tracker.observe(remaining),
                    None => self.tracker.note_call(),
                }
                debug!(
                    page,
                    objects = result.objects.len(),
                    remaining = self.tracker.remaining(),
                    "page fetched"
                );
                Ok(result)
            }
            Err(source) => {
                if source.is_rate_limited() {
                    self.tracker.observe(0);
                }
                warn!(page, error = %source, "page fetch failed");
                Err(FetchFailure { page, source })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::models::neo::NeoObject;
    use crate::providers::{ApiSnafu, RateLimitedSnafu};

    /// Replays canned responses and records which pages were asked for.
    struct Scripted {
        calls: Mutex<Vec<(u32, u32)>>,
        reply: fn(u32) -> Result<BrowsePage, ProviderError>,
    }

    #[async_trait]
    impl DataSource for Scripted {
        async fn browse(&self, page: u32, size: u32) -> Result<BrowsePage, ProviderError> {
            self.calls.lock().unwrap().push((page, size));
            (self.reply)(page)
        }
    }

    fn fetcher_with(
        reply: fn(u32) -> Result<BrowsePage, ProviderError>,
    ) -> (Arc<Scripted>, PageFetcher) {
        let source = Arc::new(Scripted {
            calls: Mutex::new(Vec::new()),
            reply,
        });
        let tracker = RateTracker::new(100, Duration::from_secs(60));
        let fetcher = PageFetcher::new(source.clone(), tracker);
        (source, fetcher)
    }

    #[tokio::test]
    async fn success_updates_budget_from_header() {
        let (source, fetcher) = fetcher_with(|page| {
            Ok(BrowsePage {
                page,
                objects: vec![NeoObject::new("1", "one", Some("2024-01-01 00:00:00"))],
                total_pages: Some(3),
                rate_remaining: Some(42),
            })
        });

        let page = fetcher.fetch(2).await.unwrap();
        assert_eq!(page.objects.len(), 1);
        assert_eq!(fetcher.tracker().remaining(), 42);
        assert_eq!(*source.calls.lock().unwrap(), vec![(2, PAGE_SIZE)]);
    }

    #[tokio::test]
    async fn success_without_header_counts_one_call() {
        let (_, fetcher) = fetcher_with(|page| {
            Ok(BrowsePage {
                page,
                ..Default::default()
            })
        });

        fetcher.fetch(0).await.unwrap();
        fetcher.fetch(1).await.unwrap();
        assert_eq!(fetcher.tracker().remaining(), 98);
    }

    #[tokio::test]
    async fn failure_is_reported_once_without_retry() {
        let (source, fetcher) = fetcher_with(|_| {
            ApiSnafu {
                status: 500u16,
                message: "boom",
            }
            .fail()
        });

        let err = fetcher.fetch(7).await.unwrap_err();
        assert_eq!(err.page, 7);
        assert!(!err.is_rate_limited());
        assert_eq!(source.calls.lock().unwrap().len(), 1);
        assert_eq!(fetcher.tracker().remaining(), 100);
    }

    #[tokio::test]
    async fn rate_limited_failure_exhausts_budget() {
        let (_, fetcher) = fetcher_with(|_| RateLimitedSnafu { message: "slow down" }.fail());

        let err = fetcher.fetch(0).await.unwrap_err();
        assert!(err.is_rate_limited());
        assert!(fetcher.tracker().should_pause());
    }
}
