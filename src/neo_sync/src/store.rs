//! Document-store surface used by the sync engine, with a SQLite implementation.
//!
//! The engine only needs a handful of operations: look up the current snapshot of
//! an object, insert a snapshot, demote a snapshot, and count rows. Reads for the
//! host's list/detail views ride along on the same trait.

pub mod sqlite;

use async_trait::async_trait;
use chrono::NaiveDate;
use neo_source::models::neo::NeoObject;

pub use sqlite::SqliteStore;

/// Store-assigned identifier of one snapshot row.
pub type StorageId = i64;

/// Date format of `fetched_on`.
pub const FETCHED_ON_FORMAT: &str = "%Y-%m-%d";

/// Errors surfaced by an [`AsteroidStore`].
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// A statement failed.
    #[error("database query failed: {0}")]
    Query(#[from] diesel::result::Error),

    /// The blocking task running the statement died or the handle is unusable.
    #[error("store task failed: {0}")]
    Task(String),

    /// The payload could not be serialized for storage.
    #[error("payload serialization failed: {0}")]
    Payload(#[from] serde_json::Error),

    /// A stored row could not be mapped back to a record.
    #[error("corrupt row {id}: {message}")]
    Corrupt {
        /// Offending row.
        id: StorageId,
        /// What was wrong with it.
        message: String,
    },

    /// An update addressed a row that does not exist.
    #[error("no snapshot with storage id {0}")]
    NotFound(StorageId),
}

/// One stored snapshot of a near-Earth object.
#[derive(Debug, Clone, PartialEq)]
pub struct AsteroidRecord {
    /// Row id assigned by the store.
    pub storage_id: StorageId,
    /// NASA `neo_reference_id`, shared by every snapshot of one object.
    pub logical_id: String,
    /// Display name at fetch time.
    pub name: String,
    /// Orbit solution date the snapshot was taken under.
    pub orbit_determination_date: Option<String>,
    /// Upstream object as stored (JSON text).
    pub payload: String,
    /// Day the snapshot was fetched.
    pub fetched_on: NaiveDate,
    /// Whether this is the current snapshot of its object.
    pub is_latest: bool,
}

/// A snapshot about to be inserted. Always inserted with `is_latest = true`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSnapshot {
    /// NASA `neo_reference_id`.
    pub logical_id: String,
    /// Display name.
    pub name: String,
    /// Change-detection key, if the upstream object carries one.
    pub orbit_determination_date: Option<String>,
    /// Upstream object as JSON text.
    pub payload: String,
    /// Ingestion date.
    pub fetched_on: NaiveDate,
}

impl NewSnapshot {
    /// Captures `object` as observed on `fetched_on`.
    pub fn from_object(object: &NeoObject, fetched_on: NaiveDate) -> Result<Self, StoreError> {
        Ok(Self {
            logical_id: object.neo_reference_id.clone(),
            name: object.name.clone(),
            orbit_determination_date: object.orbit_determination_date().map(str::to_string),
            payload: object.to_payload()?,
            fetched_on,
        })
    }
}

/// Result of looking up the current snapshot of an object.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// No snapshot of the object is flagged latest.
    Absent,
    /// The most recently inserted latest snapshot.
    Found {
        /// The snapshot reconciliation compares against.
        current: AsteroidRecord,
        /// Older snapshots that are still flagged latest after a partial failure.
        stale: Vec<StorageId>,
    },
}

/// Storage operations the sync engine and the host need.
///
/// Implementations must be shareable between concurrently running batches; each
/// operation is individually atomic, but no two operations are atomic as a pair.
#[async_trait]
pub trait AsteroidStore: Send + Sync {
    /// Finds the current snapshot of `logical_id` (`is_latest = true`).
    ///
    /// When several rows are flagged latest, the most recently inserted one is
    /// current and the rest are reported as stale.
    async fn find_current(&self, logical_id: &str) -> Result<Lookup, StoreError>;

    /// Inserts a snapshot flagged latest and returns its id.
    async fn insert(&self, snapshot: NewSnapshot) -> Result<StorageId, StoreError>;

    /// Clears the latest flag of one snapshot.
    async fn demote(&self, storage_id: StorageId) -> Result<(), StoreError>;

    /// Total number of snapshot rows.
    async fn count(&self) -> Result<u64, StoreError>;

    /// One page (zero-based) of latest snapshots ordered by name.
    async fn list_latest(&self, page: u32, per_page: u32)
    -> Result<Vec<AsteroidRecord>, StoreError>;

    /// A single snapshot by id.
    async fn get(&self, storage_id: StorageId) -> Result<Option<AsteroidRecord>, StoreError>;
}
