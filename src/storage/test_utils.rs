//! Test utilities for storage initialization
//!
//! Each helper opens a fresh database file in its own temporary directory;
//! keep the returned [`TempDir`] alive for as long as the store is used.

use crate::storage::sqlite::SqliteRecordStore;
use crate::types::{NewRecord, Role};
use tempfile::TempDir;

/// Fresh store stamped by the system clock
pub async fn create_test_store() -> (SqliteRecordStore, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = SqliteRecordStore::open(dir.path().join("food_quality_test.db"))
        .await
        .expect("Failed to create test store");
    (store, dir)
}

/// Branch-submitted record with empty notes
pub fn sample_record(branch: &str, chef: &str, dish: &str, score: i64) -> NewRecord {
    NewRecord {
        branch: branch.to_string(),
        chef_name: chef.to_string(),
        dish_name: dish.to_string(),
        score,
        notes: String::new(),
        submitted_by: Role::Branch,
    }
}
