//! One batch: sequential fetch-then-reconcile over a page range.

use std::sync::Arc;

use chrono::NaiveDate;
use neo_source::{
    fetcher::{FetchFailure, PageFetcher},
    models::page::BrowsePage,
};
use tracing::{error, info, warn};

use crate::{
    reconcile::{Action, Reconciler},
    store::StoreError,
    sync::partition::PageRange,
};

/// Everything a batch task needs; cloned per batch.
pub(crate) struct BatchContext {
    pub(crate) fetcher: PageFetcher,
    pub(crate) reconciler: Arc<Reconciler>,
    pub(crate) fetch_date: NaiveDate,
    pub(crate) max_rate_limit_retries: u32,
    /// Already fetched first page of the range, if the orchestrator has it.
    pub(crate) prefetched: Option<BrowsePage>,
}

/// Counters for one finished (or aborted) batch.
#[derive(Debug, Default)]
pub(crate) struct BatchReport {
    pub(crate) pages_fetched: u64,
    pub(crate) pages_skipped: u64,
    pub(crate) inserted: u64,
    pub(crate) superseded: u64,
    pub(crate) skipped: u64,
    pub(crate) error: Option<StoreError>,
}

/// Fetches `page`, waiting on the shared rate gate first.
///
/// A rate-limited failure exhausts the budget, so the next loop iteration pauses
/// before asking for the same page again.
pub(crate) async fn fetch_gated(
    fetcher: &PageFetcher,
    page: u32,
    max_rate_limit_retries: u32,
) -> Result<BrowsePage, FetchFailure> {
    let mut retries = 0;
    loop {
        fetcher.tracker().gate().await;
        match fetcher.fetch(page).await {
            Err(failure) if failure.is_rate_limited() && retries < max_rate_limit_retries => {
                retries += 1;
                info!(page, retries, "rate limited, retrying page after cool-down");
            }
            other => return other,
        }
    }
}

pub(crate) async fn run_batch(range: PageRange, ctx: BatchContext) -> BatchReport {
    let mut report = BatchReport::default();
    let mut prefetched = ctx.prefetched.filter(|p| p.page == range.start);

    for page in range.pages() {
        let fetched = match prefetched.take() {
            Some(p) => Ok(p),
            None => fetch_gated(&ctx.fetcher, page, ctx.max_rate_limit_retries).await,
        };

        let fetched = match fetched {
            Ok(p) => p,
            Err(failure) => {
                warn!(batch = range.start, page, error = %failure, "skipping page");
                report.pages_skipped += 1;
                continue;
            }
        };

        report.pages_fetched += 1;
        info!(
            batch = range.start,
            page,
            objects = fetched.objects.len(),
            "fetched page"
        );

        for object in &fetched.objects {
            match ctx.reconciler.reconcile(object, ctx.fetch_date).await {
                Ok(Action::Inserted) => report.inserted += 1,
                Ok(Action::SupersededAndInserted) => report.superseded += 1,
                Ok(Action::Skipped) => report.skipped += 1,
                Err(e) => {
                    error!(
                        batch = range.start,
                        page,
                        logical_id = %object.neo_reference_id,
                        error = %e,
                        "store failure, aborting batch"
                    );
                    report.error = Some(e);
                    return report;
                }
            }
        }
    }

    report
}
