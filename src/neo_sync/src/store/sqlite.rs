//! SQLite-backed [`AsteroidStore`].
//!
//! One connection is shared by every batch. Statements run on tokio's blocking
//! pool while holding the connection mutex, which keeps each statement atomic
//! without any locking on the caller's side.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;

use crate::{
    db::connection::connect_sqlite,
    models::{AsteroidRow, NewAsteroidRow},
    schema::asteroids::dsl as ast,
    store::{
        AsteroidRecord, AsteroidStore, FETCHED_ON_FORMAT, Lookup, NewSnapshot, StorageId,
        StoreError,
    },
};

impl TryFrom<AsteroidRow> for AsteroidRecord {
    type Error = StoreError;

    fn try_from(row: AsteroidRow) -> Result<Self, Self::Error> {
        let fetched_on = NaiveDate::parse_from_str(&row.fetched_on, FETCHED_ON_FORMAT)
            .map_err(|e| StoreError::Corrupt {
                id: row.id,
                message: format!("fetched_on {:?}: {e}", row.fetched_on),
            })?;

        Ok(Self {
            storage_id: row.id,
            logical_id: row.neo_reference_id,
            name: row.name,
            orbit_determination_date: row.orbit_determination_date,
            payload: row.payload,
            fetched_on,
            is_latest: row.is_latest,
        })
    }
}

/// Repository for asteroid snapshots in a SQLite database.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<SqliteConnection>>,
}

impl SqliteStore {
    /// Opens `database_url` with the standard PRAGMAs. Migrations must already be applied.
    pub fn open(database_url: &str) -> anyhow::Result<Self> {
        Ok(Self::from_connection(connect_sqlite(database_url)?))
    }

    /// Wraps an already configured connection.
    pub fn from_connection(conn: SqliteConnection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| StoreError::Task("connection mutex poisoned".to_string()))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

#[async_trait]
impl AsteroidStore for SqliteStore {
    async fn find_current(&self, logical_id: &str) -> Result<Lookup, StoreError> {
        let logical_id = logical_id.to_string();
        self.with_conn(move |conn| {
            let rows: Vec<AsteroidRow> = ast::asteroids
                .filter(ast::neo_reference_id.eq(&logical_id))
                .filter(ast::is_latest.eq(true))
                .order(ast::id.desc())
                .select(AsteroidRow::as_select())
                .load(conn)?;

            let mut rows = rows.into_iter();
            match rows.next() {
                None => Ok(Lookup::Absent),
                Some(first) => Ok(Lookup::Found {
                    current: first.try_into()?,
                    stale: rows.map(|r| r.id).collect(),
                }),
            }
        })
        .await
    }

    async fn insert(&self, snapshot: NewSnapshot) -> Result<StorageId, StoreError> {
        self.with_conn(move |conn| {
            let fetched_on = snapshot.fetched_on.format(FETCHED_ON_FORMAT).to_string();
            let row = NewAsteroidRow {
                neo_reference_id: &snapshot.logical_id,
                name: &snapshot.name,
                orbit_determination_date: snapshot.orbit_determination_date.as_deref(),
                payload: &snapshot.payload,
                fetched_on: &fetched_on,
                is_latest: true,
            };

            // INSERT .. RETURNING id (Sqlite 3.35+)
            let id: i64 = diesel::insert_into(ast::asteroids)
                .values(&row)
                .returning(ast::id)
                .get_result(conn)?;
            Ok(id)
        })
        .await
    }

    async fn demote(&self, storage_id: StorageId) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            let n = diesel::update(ast::asteroids.find(storage_id))
                .set(ast::is_latest.eq(false))
                .execute(conn)?;
            if n == 0 {
                return Err(StoreError::NotFound(storage_id));
            }
            Ok(())
        })
        .await
    }

    async fn count(&self) -> Result<u64, StoreError> {
        self.with_conn(|conn| {
            let n: i64 = ast::asteroids.count().get_result(conn)?;
            Ok(n.max(0) as u64)
        })
        .await
    }

    async fn list_latest(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<AsteroidRecord>, StoreError> {
        let per_page = i64::from(per_page.max(1));
        let offset = i64::from(page) * per_page;
        self.with_conn(move |conn| {
            let rows: Vec<AsteroidRow> = ast::asteroids
                .filter(ast::is_latest.eq(true))
                .order((ast::name.asc(), ast::id.asc()))
                .limit(per_page)
                .offset(offset)
                .select(AsteroidRow::as_select())
                .load(conn)?;
            rows.into_iter().map(AsteroidRecord::try_from).collect()
        })
        .await
    }

    async fn get(&self, storage_id: StorageId) -> Result<Option<AsteroidRecord>, StoreError> {
        self.with_conn(move |conn| {
            let row: Option<AsteroidRow> = ast::asteroids
                .find(storage_id)
                .select(AsteroidRow::as_select())
                .first(conn)
                .optional()?;
            row.map(AsteroidRecord::try_from).transpose()
        })
        .await
    }
}
