//! Shared call-budget tracking for the upstream API.
//!
//! NeoWs reports the calls left in the current hourly window through the
//! `x-ratelimit-remaining` header. Every [`PageFetcher`](crate::fetcher::PageFetcher)
//! feeds that number into one [`RateTracker`] shared by all concurrently running
//! batches. When the budget hits zero, the first batch to notice sleeps through the
//! cool-down while every other batch queues on the same gate, so the whole run
//! pauses once instead of each batch hammering an exhausted key.
//!
//! ```rust
//! use std::time::Duration;
//! use neo_source::rate::RateTracker;
//!
//! # async fn demo() {
//! let tracker = RateTracker::new(1000, Duration::from_secs(3600));
//! tracker.observe(0);
//! assert!(tracker.should_pause());
//! tracker.gate().await; // sleeps one hour, then resets to 1000
//! # }
//! ```

use std::{
    sync::{
        Arc,
        atomic::{AtomicU32, AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::sync::Mutex;
use tracing::info;

/// Hourly call allowance of an api.data.gov key.
pub const DEFAULT_CALLS_PER_WINDOW: u32 = 1000;

/// How long to stay quiet once the budget is used up.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60 * 60);

/// Cheaply clonable handle to a shared call budget.
#[derive(Clone, Debug)]
pub struct RateTracker {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    remaining: AtomicU32,
    calls_per_window: u32,
    cooldown: Duration,
    gate: Mutex<()>,
    pauses: AtomicU64,
}

impl Default for RateTracker {
    fn default() -> Self {
        Self::new(DEFAULT_CALLS_PER_WINDOW, DEFAULT_COOLDOWN)
    }
}

impl RateTracker {
    /// Creates a tracker that starts with a full window.
    pub fn new(calls_per_window: u32, cooldown: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                remaining: AtomicU32::new(calls_per_window),
                calls_per_window,
                cooldown,
                gate: Mutex::new(()),
                pauses: AtomicU64::new(0),
            }),
        }
    }

    /// Records the budget reported by the source. Last observation wins.
    pub fn observe(&self, remaining: u32) {
        self.inner.remaining.store(remaining, Ordering::SeqCst);
    }

    /// Accounts for one successful call whose response carried no budget header.
    pub fn note_call(&self) {
        let _ = self
            .inner
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |r| {
                Some(r.saturating_sub(1))
            });
    }

    /// Current view of the budget.
    pub fn remaining(&self) -> u32 {
        self.inner.remaining.load(Ordering::SeqCst)
    }

    /// True once the budget is exhausted.
    pub fn should_pause(&self) -> bool {
        self.remaining() == 0
    }

    /// Number of cool-downs served so far.
    pub fn pauses(&self) -> u64 {
        self.inner.pauses.load(Ordering::SeqCst)
    }

    /// Configured cool-down.
    pub fn cooldown(&self) -> Duration {
        self.inner.cooldown
    }

    /// Sleeps through the cool-down and refills the budget.
    ///
    /// Callers are serialized on one gate. A caller that acquires the gate after
    /// another caller already refilled the budget returns immediately, so one
    /// exhaustion costs one cool-down no matter how many batches noticed it.
    /// Returns `true` when this call served the cool-down.
    pub async fn pause_and_reset(&self) -> bool {
        let _gate = self.inner.gate.lock().await;
        if !self.should_pause() {
            return false;
        }

        info!(
            cooldown_secs = self.inner.cooldown.as_secs(),
            "rate limit budget exhausted, pausing"
        );
        tokio::time::sleep(self.inner.cooldown).await;

        self.inner
            .remaining
            .store(self.inner.calls_per_window, Ordering::SeqCst);
        self.inner.pauses.fetch_add(1, Ordering::SeqCst);
        info!(
            remaining = self.inner.calls_per_window,
            "rate limit cool-down over, resuming"
        );
        true
    }

    /// Consult-before-fetch helper: pauses only when the budget is exhausted.
    ///
    /// Returns `true` when the caller had to wait on the gate.
    pub async fn gate(&self) -> bool {
        if self.should_pause() {
            self.pause_and_reset().await;
            true
        } else {
            false
        }
    }
}
