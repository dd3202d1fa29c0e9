//! Per-object reconciliation: insert, supersede, or skip.
//!
//! The current snapshot of an object is the most recently inserted row flagged
//! latest. A fetched object whose `orbit_determination_date` differs from the
//! current one produces a new snapshot. The new row is inserted *before* the old
//! one is demoted: a crash in between leaves two latest rows, which the next pass
//! repairs, and never zero.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use chrono::NaiveDate;
use neo_source::models::{close_approach::future_close_approaches, neo::NeoObject};
use tracing::{debug, info, warn};

use crate::store::{AsteroidStore, Lookup, NewSnapshot, StoreError};

/// What [`Reconciler::reconcile`] did with one fetched object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// First snapshot of the object.
    Inserted,
    /// New snapshot inserted and the previous one demoted.
    SupersededAndInserted,
    /// Unchanged; nothing written.
    Skipped,
}

/// Applies fetched objects to an [`AsteroidStore`], counting repairs.
pub struct Reconciler {
    store: Arc<dyn AsteroidStore>,
    repaired: AtomicU64,
}

impl Reconciler {
    /// Reconciler writing to `store`.
    pub fn new(store: Arc<dyn AsteroidStore>) -> Self {
        Self {
            store,
            repaired: AtomicU64::new(0),
        }
    }

    /// Stale latest flags cleared so far by this reconciler.
    pub fn repaired(&self) -> u64 {
        self.repaired.load(Ordering::Relaxed)
    }

    /// Reconciles `fetched` against the store, as observed on `fetch_date`.
    pub async fn reconcile(
        &self,
        fetched: &NeoObject,
        fetch_date: NaiveDate,
    ) -> Result<Action, StoreError> {
        let logical_id = fetched.neo_reference_id.as_str();

        match self.store.find_current(logical_id).await? {
            Lookup::Absent => {
                let storage_id = self
                    .store
                    .insert(NewSnapshot::from_object(fetched, fetch_date)?)
                    .await?;
                info!(
                    logical_id,
                    name = %fetched.name,
                    storage_id,
                    "inserted new asteroid"
                );
                Ok(Action::Inserted)
            }
            Lookup::Found { current, stale } => {
                for storage_id in stale {
                    self.store.demote(storage_id).await?;
                    self.repaired.fetch_add(1, Ordering::Relaxed);
                    warn!(logical_id, storage_id, "demoted stale duplicate latest snapshot");
                }

                let previous = current.orbit_determination_date.as_deref();
                let incoming = fetched.orbit_determination_date();

                if current.is_latest && previous != incoming {
                    let storage_id = self
                        .store
                        .insert(NewSnapshot::from_object(fetched, fetch_date)?)
                        .await?;
                    self.store.demote(current.storage_id).await?;

                    let upcoming = match (incoming, previous) {
                        (Some(new), Some(old)) => {
                            future_close_approaches(&fetched.close_approach_data, new, old)
                                .map_or(0, |a| a.len())
                        }
                        _ => 0,
                    };
                    info!(
                        logical_id,
                        name = %fetched.name,
                        storage_id,
                        superseded = current.storage_id,
                        previous_determination = previous,
                        orbit_determination_date = incoming,
                        upcoming_close_approaches = upcoming,
                        "superseded asteroid with new orbit determination"
                    );
                    Ok(Action::SupersededAndInserted)
                } else {
                    debug!(
                        logical_id,
                        name = %fetched.name,
                        "orbit determination unchanged, skipping"
                    );
                    Ok(Action::Skipped)
                }
            }
        }
    }
}
