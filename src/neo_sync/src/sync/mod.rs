//! Run orchestration: page planning, concurrent batches, run summary.
//!
//! ## What a run does
//! 1. Asks the source for page 0 to learn `total_pages`, with the same gate and
//!    rate-limit retries as any other page. If that still fails, the page count
//!    is estimated from the store (`rows / page_size`).
//! 2. Partitions `[0, total_pages]` into batches ([`partition::partition_pages`]).
//! 3. Runs every batch as its own tokio task. Pages inside a batch are strictly
//!    sequential: fetch, reconcile every object, then move on.
//!
//! ## Rate limiting
//! All batches share one [`RateTracker`](neo_source::rate::RateTracker) through
//! their [`PageFetcher`] clones. Each batch passes the tracker's gate before every
//! fetch, so one exhausted budget pauses the whole run for one cool-down.
//!
//! ## Failure isolation
//! A page that cannot be fetched is skipped. A store failure aborts the rest of
//! its own batch only; sibling batches keep going and the summary reports the
//! run as partial.

mod batch;
pub mod partition;

use std::sync::Arc;

use chrono::{Local, NaiveDate, Utc};
use chrono_tz::Tz;
use neo_source::fetcher::PageFetcher;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::{
    reconcile::Reconciler,
    store::{AsteroidStore, StoreError},
    sync::{
        batch::{BatchContext, BatchReport, fetch_gated, run_batch},
        partition::partition_pages,
    },
};

/// Pages per batch unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: u32 = 20;

/// Options for a sync run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Page indices per concurrent batch.
    pub batch_size: u32,
    /// How often a rate-limited page is retried after a cool-down before it is skipped.
    pub max_rate_limit_retries: u32,
    /// Zone used to stamp `fetched_on`; `None` uses the host's local clock.
    pub time_zone: Option<Tz>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_rate_limit_retries: 3,
            time_zone: None,
        }
    }
}

/// Where `total_pages` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PagesSource {
    /// Reported by the source's pagination metadata.
    #[default]
    Api,
    /// Estimated from the number of stored rows.
    StoreEstimate,
}

/// Outcome of one [`SyncEngine::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Highest page index the run planned for.
    pub total_pages: u32,
    /// Where `total_pages` came from.
    pub pages_source: PagesSource,
    /// Batches started.
    pub batches: usize,
    /// Batches aborted by a store failure or a panic.
    pub failed_batches: usize,
    /// Pages fetched and reconciled.
    pub pages_fetched: u64,
    /// Pages that could not be fetched.
    pub pages_skipped: u64,
    /// Objects seen for the first time.
    pub inserted: u64,
    /// Objects whose snapshot was superseded.
    pub superseded: u64,
    /// Objects left unchanged.
    pub skipped: u64,
    /// Stale duplicate latest flags cleared during the run.
    pub repaired: u64,
    /// Rate-limit cool-downs served during the run.
    pub pauses: u64,
}

impl RunSummary {
    /// True when every batch processed its whole range.
    pub fn is_complete(&self) -> bool {
        self.failed_batches == 0
    }

    fn absorb(&mut self, report: BatchReport) {
        self.pages_fetched += report.pages_fetched;
        self.pages_skipped += report.pages_skipped;
        self.inserted += report.inserted;
        self.superseded += report.superseded;
        self.skipped += report.skipped;
        if report.error.is_some() {
            self.failed_batches += 1;
        }
    }
}

/// Errors that stop a run before any batch starts.
#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    /// The store could not be read while planning the run.
    #[error("store unavailable while planning run: {0}")]
    Store(#[from] StoreError),
}

/// Drives one harvest over the whole page space.
pub struct SyncEngine {
    fetcher: PageFetcher,
    store: Arc<dyn AsteroidStore>,
    reconciler: Arc<Reconciler>,
    options: SyncOptions,
}

impl SyncEngine {
    /// Engine fetching through `fetcher` and writing to `store`.
    pub fn new(fetcher: PageFetcher, store: Arc<dyn AsteroidStore>, options: SyncOptions) -> Self {
        let reconciler = Arc::new(Reconciler::new(Arc::clone(&store)));
        Self {
            fetcher,
            store,
            reconciler,
            options,
        }
    }

    /// Today's date in the configured zone.
    pub fn today(&self) -> NaiveDate {
        match self.options.time_zone {
            Some(tz) => Utc::now().with_timezone(&tz).date_naive(),
            None => Local::now().date_naive(),
        }
    }

    /// Runs a full harvest stamped with today's date.
    pub async fn run(&self) -> Result<RunSummary, SyncError> {
        self.run_on(self.today()).await
    }

    /// Runs a full harvest, stamping new snapshots with `fetch_date`.
    pub async fn run_on(&self, fetch_date: NaiveDate) -> Result<RunSummary, SyncError> {
        let tracker = self.fetcher.tracker().clone();
        let pauses_before = tracker.pauses();
        let repaired_before = self.reconciler.repaired();

        let planning = fetch_gated(&self.fetcher, 0, self.options.max_rate_limit_retries).await;
        let (total_pages, pages_source, mut prefetched) = match planning {
            Ok(first) => match first.total_pages {
                Some(total) => (total, PagesSource::Api, Some(first)),
                None => {
                    warn!("page 0 carried no pagination metadata, estimating from store");
                    (self.estimate_total_pages().await?, PagesSource::StoreEstimate, Some(first))
                }
            },
            Err(failure) => {
                warn!(error = %failure, "pagination metadata unavailable, estimating from store");
                (self.estimate_total_pages().await?, PagesSource::StoreEstimate, None)
            }
        };

        let ranges = partition_pages(total_pages, self.options.batch_size);
        info!(
            total_pages,
            ?pages_source,
            batches = ranges.len(),
            %fetch_date,
            "starting sync run"
        );

        let mut summary = RunSummary {
            total_pages,
            pages_source,
            batches: ranges.len(),
            ..Default::default()
        };

        let mut tasks = JoinSet::new();
        for range in ranges {
            let ctx = BatchContext {
                fetcher: self.fetcher.clone(),
                reconciler: Arc::clone(&self.reconciler),
                fetch_date,
                max_rate_limit_retries: self.options.max_rate_limit_retries,
                prefetched: if range.start == 0 { prefetched.take() } else { None },
            };
            tasks.spawn(run_batch(range, ctx));
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => summary.absorb(report),
                Err(e) => {
                    error!(error = %e, "batch task failed");
                    summary.failed_batches += 1;
                }
            }
        }

        summary.pauses = tracker.pauses() - pauses_before;
        summary.repaired = self.reconciler.repaired() - repaired_before;

        info!(
            inserted = summary.inserted,
            superseded = summary.superseded,
            skipped = summary.skipped,
            repaired = summary.repaired,
            pages_fetched = summary.pages_fetched,
            pages_skipped = summary.pages_skipped,
            failed_batches = summary.failed_batches,
            pauses = summary.pauses,
            "sync run finished"
        );
        Ok(summary)
    }

    async fn estimate_total_pages(&self) -> Result<u32, StoreError> {
        let rows = self.store.count().await?;
        let page_size = u64::from(self.fetcher.page_size());
        Ok(u32::try_from(rows / page_size).unwrap_or(u32::MAX))
    }
}
