// Shared test helpers for database setup and test data creation.

use geoip_heatmap::{Location, LocationTable, SqliteStore};
use tempfile::TempDir;

/// Creates a tempfile-backed store. The TempDir must be kept alive for the
/// duration of the test; the database file lives inside it.
#[allow(dead_code)] // Used by other test files
pub async fn create_test_store() -> (TempDir, SqliteStore) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("geoip.db");
    let store = SqliteStore::connect(db_path.to_str().expect("non-UTF-8 temp path"))
        .await
        .expect("Failed to open test database");
    (dir, store)
}

/// Builds a table from (latitude, longitude, quantity) triples.
#[allow(dead_code)] // Used by other test files
pub fn table_of(entries: &[(f64, f64, f64)]) -> LocationTable {
    entries
        .iter()
        .map(|&(latitude, longitude, quantity)| {
            (Location { latitude, longitude }, quantity)
        })
        .collect()
}
