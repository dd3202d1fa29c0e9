#![allow(dead_code)]

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use chrono::NaiveDate;
use neo_sync::{
    db::migrate,
    store::{AsteroidRecord, AsteroidStore, Lookup, NewSnapshot, SqliteStore, StorageId, StoreError},
};
use tempfile::TempDir;

pub struct TestDb {
    _dir: TempDir,    // keep alive for the life of the test
    pub path: String, // <tmpdir>/test.db
}

pub fn setup_store() -> (TestDb, SqliteStore) {
    let dir = TempDir::new().expect("tempdir");
    let mut p = PathBuf::from(dir.path());
    p.push("test.db");
    let path = p.to_string_lossy().to_string();

    migrate::run_all(&path).expect("migrations");
    let store = SqliteStore::open(&path).expect("open store");
    (TestDb { _dir: dir, path }, store)
}

pub fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Latest snapshots per logical id, across every page of the store.
pub async fn latest_counts(store: &dyn AsteroidStore) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    let mut page = 0;
    loop {
        let rows = store.list_latest(page, 100).await.unwrap();
        if rows.is_empty() {
            return counts;
        }
        for r in rows {
            *counts.entry(r.logical_id).or_insert(0) += 1;
        }
        page += 1;
    }
}

/// In-memory store with switchable failure points.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<AsteroidRecord>>,
    pub fail_demote: AtomicBool,
    pub fail_insert_for: Mutex<Option<String>>,
    pub fail_count: AtomicBool,
}

impl MemoryStore {
    pub fn rows(&self) -> Vec<AsteroidRecord> {
        self.rows.lock().unwrap().clone()
    }

    /// Seeds `n` distinct objects, each with one latest row.
    pub fn seed(&self, n: usize) {
        let mut rows = self.rows.lock().unwrap();
        for i in 0..n {
            let id = rows.len() as StorageId + 1;
            rows.push(AsteroidRecord {
                storage_id: id,
                logical_id: format!("seed-{i}"),
                name: format!("seed {i}"),
                orbit_determination_date: None,
                payload: "{}".to_string(),
                fetched_on: day("2024-01-01"),
                is_latest: true,
            });
        }
    }
}

fn query_failure() -> StoreError {
    StoreError::Task("injected failure".to_string())
}

#[async_trait]
impl AsteroidStore for MemoryStore {
    async fn find_current(&self, logical_id: &str) -> Result<Lookup, StoreError> {
        let rows = self.rows.lock().unwrap();
        let mut latest: Vec<&AsteroidRecord> = rows
            .iter()
            .filter(|r| r.logical_id == logical_id && r.is_latest)
            .collect();
        latest.sort_by_key(|r| std::cmp::Reverse(r.storage_id));
        let mut latest = latest.into_iter();
        Ok(match latest.next() {
            None => Lookup::Absent,
            Some(first) => Lookup::Found {
                current: first.clone(),
                stale: latest.map(|r| r.storage_id).collect(),
            },
        })
    }

    async fn insert(&self, snapshot: NewSnapshot) -> Result<StorageId, StoreError> {
        if self.fail_insert_for.lock().unwrap().as_deref() == Some(snapshot.logical_id.as_str()) {
            return Err(query_failure());
        }
        let mut rows = self.rows.lock().unwrap();
        let id = rows.len() as StorageId + 1;
        rows.push(AsteroidRecord {
            storage_id: id,
            logical_id: snapshot.logical_id,
            name: snapshot.name,
            orbit_determination_date: snapshot.orbit_determination_date,
            payload: snapshot.payload,
            fetched_on: snapshot.fetched_on,
            is_latest: true,
        });
        Ok(id)
    }

    async fn demote(&self, storage_id: StorageId) -> Result<(), StoreError> {
        if self.fail_demote.load(Ordering::SeqCst) {
            return Err(query_failure());
        }
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|r| r.storage_id == storage_id)
            .ok_or(StoreError::NotFound(storage_id))?;
        row.is_latest = false;
        Ok(())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        if self.fail_count.load(Ordering::SeqCst) {
            return Err(query_failure());
        }
        Ok(self.rows.lock().unwrap().len() as u64)
    }

    async fn list_latest(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<AsteroidRecord>, StoreError> {
        let mut latest: Vec<AsteroidRecord> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.is_latest)
            .cloned()
            .collect();
        latest.sort_by(|a, b| a.name.cmp(&b.name).then(a.storage_id.cmp(&b.storage_id)));
        Ok(latest
            .into_iter()
            .skip((page * per_page) as usize)
            .take(per_page as usize)
            .collect())
    }

    async fn get(&self, storage_id: StorageId) -> Result<Option<AsteroidRecord>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.storage_id == storage_id)
            .cloned())
    }
}
