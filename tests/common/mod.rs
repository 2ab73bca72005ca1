//! Common test utilities and helpers

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use food_quality_core::services::{LlmConfig, MirrorDiagnostics, NoopMirror, RecordMirror};
use food_quality_core::{
    error::{QualityError, Result},
    AppConfig, ChatCompletionsGateway, ManualClock, NewRecord, QualityRecord, QualityService,
    RequestContext, Role, SqliteRecordStore, SubmitRequest,
};
use secrecy::SecretString;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub const ADMIN_PASSWORD: &str = "test-admin";

/// Fixed starting instant for clocked tests (a Wednesday)
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 15, 9, 0, 0).unwrap()
}

/// Store on a fresh temp file with a manual clock
pub async fn create_clocked_store(dir: &TempDir) -> (SqliteRecordStore, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(t0()));
    let store =
        SqliteRecordStore::open_with_clock(dir.path().join("food_quality.db"), clock.clone())
            .await
            .expect("Failed to create test store");
    (store, clock)
}

/// Service with no gateway credential and the given mirror
pub async fn create_service_with_mirror(
    db_path: &Path,
    mirror: Box<dyn RecordMirror>,
) -> (QualityService, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(t0()));
    let store = SqliteRecordStore::open_with_clock(db_path, clock.clone())
        .await
        .expect("Failed to create test store");
    let gateway = Arc::new(ChatCompletionsGateway::new(LlmConfig::default()));

    let service = QualityService::new(
        store,
        gateway,
        mirror,
        clock.clone(),
        AppConfig::default(),
        SecretString::from(ADMIN_PASSWORD.to_string()),
    );
    (service, clock)
}

pub async fn create_service(dir: &TempDir) -> (QualityService, Arc<ManualClock>) {
    create_service_with_mirror(&dir.path().join("food_quality.db"), Box::new(NoopMirror)).await
}

pub fn record(branch: &str, chef: &str, dish: &str, score: i64) -> NewRecord {
    NewRecord {
        branch: branch.to_string(),
        chef_name: chef.to_string(),
        dish_name: dish.to_string(),
        score,
        notes: String::new(),
        submitted_by: Role::Headquarters,
    }
}

pub fn check(branch: &str, chef: &str, dish: &str, score: i64) -> SubmitRequest {
    SubmitRequest {
        branch: Some(branch.to_string()),
        chef_name: chef.to_string(),
        dish_name: dish.to_string(),
        score,
        notes: String::new(),
    }
}

pub fn headquarters() -> RequestContext {
    RequestContext::anonymous().sign_in_headquarters()
}

/// Mirror that always fails
pub struct FailingMirror;

#[async_trait]
impl RecordMirror for FailingMirror {
    async fn append(&self, _record: &QualityRecord) -> Result<()> {
        Err(QualityError::Mirror("sheet unreachable".to_string()))
    }

    fn diagnostics(&self) -> MirrorDiagnostics {
        MirrorDiagnostics {
            configured: true,
            sheet_id: Some("test-sheet".to_string()),
            token_present: true,
            sheet_link: None,
        }
    }
}
