use diesel::{QueryableByName, prelude::*, sql_query, sql_types::Integer, sql_types::Text};
use neo_sync::db::{connection::connect_sqlite, migrate};
use tempfile::TempDir;

#[derive(QueryableByName)]
struct JournalMode {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}

#[derive(QueryableByName)]
struct BusyTimeout {
    #[diesel(sql_type = Integer, column_name = "timeout")]
    busy_timeout: i32,
}

#[derive(QueryableByName)]
struct TableName {
    #[diesel(sql_type = Text)]
    name: String,
}

#[test]
fn migrated_database_uses_wal_and_busy_timeout() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("neo.db").to_string_lossy().to_string();
    let url = format!("sqlite://{path}");

    migrate::run_all(&url).expect("migrations");
    let mut conn = connect_sqlite(&url).expect("connect");

    let jm: JournalMode = sql_query("PRAGMA journal_mode;").get_result(&mut conn).unwrap();
    assert_eq!(jm.journal_mode.to_lowercase(), "wal");

    let bt: BusyTimeout = sql_query("PRAGMA busy_timeout;").get_result(&mut conn).unwrap();
    assert_eq!(bt.busy_timeout, 5000);

    let tables: Vec<TableName> =
        sql_query("SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'asteroids'")
            .load(&mut conn)
            .unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].name, "asteroids");
}

#[test]
fn non_sqlite_urls_are_rejected() {
    assert!(migrate::run_all("postgres://localhost/neo").is_err());
}
