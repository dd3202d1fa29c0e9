//! Diesel models mapping to the database schema.
//!
//! These types mirror the `asteroids` table defined in the embedded migrations and
//! in [`crate::schema`]. The store converts them to and from the domain types in
//! [`crate::store`].

use diesel::prelude::*;

use crate::schema::asteroids;

/// A row in [`crate::schema::asteroids`]: one snapshot of one near-Earth object.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = asteroids, check_for_backend(diesel::sqlite::Sqlite))]
pub struct AsteroidRow {
    /// Database primary key. Monotonic, so a larger id is a later insert.
    pub id: i64,
    /// NASA `neo_reference_id`; shared by every snapshot of the same object.
    pub neo_reference_id: String,
    /// Display name at fetch time.
    pub name: String,
    /// Change-detection key copied out of the payload.
    pub orbit_determination_date: Option<String>,
    /// Full upstream JSON object.
    pub payload: String,
    /// Ingestion date, `YYYY-MM-DD`.
    pub fetched_on: String,
    /// Whether this snapshot is the current one for its object.
    pub is_latest: bool,
}

/// Insertable form of [`AsteroidRow`].
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = asteroids)]
pub struct NewAsteroidRow<'a> {
    /// NASA `neo_reference_id`.
    pub neo_reference_id: &'a str,
    /// Display name.
    pub name: &'a str,
    /// Change-detection key, if any.
    pub orbit_determination_date: Option<&'a str>,
    /// Upstream JSON object.
    pub payload: &'a str,
    /// Ingestion date, `YYYY-MM-DD`.
    pub fetched_on: &'a str,
    /// Latest flag; new rows are always inserted as latest.
    pub is_latest: bool,
}
