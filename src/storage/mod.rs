//! Storage layer for quality records
//!
//! Provides the append-only [`RecordStore`] abstraction, the SQLite backend
//! and a TTL snapshot cache that sits in front of it.

pub mod cache;
pub mod sqlite;
#[cfg(test)]
pub mod test_utils;

use crate::error::{Result, ValidationError};
use crate::types::{NewRecord, QualityRecord, RecordId, Scope, MAX_SCORE, MIN_SCORE};
use async_trait::async_trait;

/// Append-only record store
///
/// No update or delete exists; once written, a record is immutable.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Validate and append a record; `created_at` is assigned by the store
    async fn insert(&self, record: NewRecord) -> Result<RecordId>;

    /// A single record by id
    async fn get(&self, id: RecordId) -> Result<Option<QualityRecord>>;

    /// All records, newest first
    async fn load_all(&self) -> Result<Vec<QualityRecord>>;

    /// Records in `scope`, newest first
    async fn load_scope(&self, scope: &Scope) -> Result<Vec<QualityRecord>>;

    /// Number of stored records
    async fn count(&self) -> Result<usize>;
}

/// Trimmed, range-checked input ready to persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRecord {
    pub branch: String,
    pub chef_name: String,
    pub dish_name: String,
    pub score: u8,
    pub notes: String,
    pub submitted_by: &'static str,
}

/// Apply the store-boundary checks: required fields non-empty after
/// trimming, score within 1..=10
pub fn validate_record(record: &NewRecord) -> std::result::Result<ValidRecord, ValidationError> {
    let branch = required("branch", &record.branch)?;
    let chef_name = required("chef_name", &record.chef_name)?;
    let dish_name = required("dish_name", &record.dish_name)?;

    if !(MIN_SCORE..=MAX_SCORE).contains(&record.score) {
        return Err(ValidationError::new(
            "score",
            format!(
                "must be between {} and {}, got {}",
                MIN_SCORE, MAX_SCORE, record.score
            ),
        ));
    }

    Ok(ValidRecord {
        branch,
        chef_name,
        dish_name,
        score: record.score as u8,
        notes: record.notes.trim().to_string(),
        submitted_by: record.submitted_by.as_tag(),
    })
}

fn required(field: &'static str, value: &str) -> std::result::Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::new(field, "must not be empty"))
    } else {
        Ok(trimmed.to_string())
    }
}
