//! Application façade
//!
//! [`QualityService`] wires the cached record store, the summarizer, the
//! spreadsheet mirror and the clock together behind the operations a front
//! end needs. Every operation takes the caller's [`RequestContext`].

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{AppConfig, Credentials};
use crate::context::RequestContext;
use crate::error::{QualityError, Result};
use crate::report::{build_report, AggregateReport, ReportRequest};
use crate::services::llm::{ChatCompletionsGateway, LlmConfig, SummarizationGateway};
use crate::services::mirror::{mirror_from_settings, MirrorDiagnostics, RecordMirror};
use crate::services::snapshot::serialize_all;
use crate::services::summary::{Summarizer, UNAVAILABLE_PREFIX};
use crate::storage::cache::{CacheStats, CachedRecordStore};
use crate::storage::sqlite::SqliteRecordStore;
use crate::storage::RecordStore;
use crate::types::{NewRecord, QualityRecord, RecordId, Scope, ScoreBand};

/// Input of a quality check submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    /// Required for headquarters; ignored for branch staff
    pub branch: Option<String>,
    pub chef_name: String,
    pub dish_name: String,
    pub score: i64,

    #[serde(default)]
    pub notes: String,
}

/// Result of a successful submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitOutcome {
    pub id: RecordId,
    pub branch: String,
    pub band: ScoreBand,

    /// Set when the record was stored but the spreadsheet mirror failed
    pub mirror_warning: Option<String>,
}

/// Food quality tracker entry point
pub struct QualityService {
    store: CachedRecordStore<SqliteRecordStore>,
    summarizer: Summarizer,
    mirror: Box<dyn RecordMirror>,
    mirror_diagnostics: MirrorDiagnostics,
    mirror_timeout: Duration,
    clock: Arc<dyn Clock>,
    config: AppConfig,
    admin_password: SecretString,
}

impl QualityService {
    /// Open the database at `db_path` and build every collaborator from
    /// `config` and `credentials`
    pub async fn open<P: AsRef<Path>>(
        db_path: P,
        config: AppConfig,
        credentials: Credentials,
    ) -> Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let store = SqliteRecordStore::open_with_clock(db_path, clock.clone()).await?;

        let Credentials {
            openai_api_key,
            openai_org,
            openai_project,
            sheets_token,
            admin_password,
        } = credentials;

        let gateway = Arc::new(ChatCompletionsGateway::new(LlmConfig::from_settings(
            &config.gateway,
            openai_api_key,
            openai_org,
            openai_project,
        )));
        let (mirror, diagnostics) = mirror_from_settings(&config.mirror, sheets_token);

        let mut service = Self::new(store, gateway, mirror, clock, config, admin_password);
        service.mirror_diagnostics = diagnostics;
        Ok(service)
    }

    /// Assemble a service from explicit parts
    pub fn new(
        store: SqliteRecordStore,
        gateway: Arc<dyn SummarizationGateway>,
        mirror: Box<dyn RecordMirror>,
        clock: Arc<dyn Clock>,
        config: AppConfig,
        admin_password: SecretString,
    ) -> Self {
        let store = CachedRecordStore::new(
            store,
            config.cache.capacity,
            Duration::from_secs(config.cache.ttl_seconds),
        );
        let summarizer = Summarizer::new(gateway, config.gateway.row_cap);
        let mirror_diagnostics = mirror.diagnostics();
        let mirror_timeout = Duration::from_secs(config.mirror.timeout_seconds);

        Self {
            store,
            summarizer,
            mirror,
            mirror_diagnostics,
            mirror_timeout,
            clock,
            config,
            admin_password,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &CachedRecordStore<SqliteRecordStore> {
        &self.store
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.store.stats()
    }

    /// Check the admin password and return the elevated context
    pub fn elevate_admin(&self, ctx: &RequestContext, password: &str) -> Result<RequestContext> {
        ctx.elevate_admin(password, &self.admin_password).map_err(|e| {
            warn!("Admin elevation refused");
            e
        })
    }

    /// Validate and append a quality check, then mirror it
    pub async fn submit(
        &self,
        ctx: &RequestContext,
        request: SubmitRequest,
    ) -> Result<SubmitOutcome> {
        let branch = ctx.submission_branch(request.branch.as_deref())?;
        let submitted_by = ctx
            .role
            .ok_or_else(|| QualityError::NotPermitted("sign in before submitting".to_string()))?;

        let catalog = &self.config.catalog;
        if !catalog.is_known_branch(&branch) {
            warn!("Submission for branch '{}' not in the catalog", branch);
        }
        if !catalog.is_known_dish(request.dish_name.trim()) {
            debug!("Dish '{}' not in the catalog", request.dish_name.trim());
        }

        let id = self
            .store
            .insert(NewRecord {
                branch: branch.clone(),
                chef_name: request.chef_name,
                dish_name: request.dish_name,
                score: request.score,
                notes: request.notes,
                submitted_by,
            })
            .await?;

        let record = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| QualityError::Database(format!("record {} missing after insert", id)))?;

        info!(
            "Quality check {} stored: {} / {} / {} = {} (by {})",
            id, record.branch, record.chef_name, record.dish_name, record.score, submitted_by
        );

        let mirror_warning = self.mirror_record(&record).await;

        Ok(SubmitOutcome {
            id,
            branch: record.branch,
            band: ScoreBand::for_score(record.score),
            mirror_warning,
        })
    }

    async fn mirror_record(&self, record: &QualityRecord) -> Option<String> {
        let appended = tokio::time::timeout(self.mirror_timeout, self.mirror.append(record)).await;
        let result = match appended {
            Ok(result) => result,
            Err(_) => Err(QualityError::Mirror(format!(
                "timed out after {}s",
                self.mirror_timeout.as_secs()
            ))),
        };

        match result {
            Ok(()) => None,
            Err(e) => {
                warn!("Record {} saved locally but not mirrored: {}", record.id, e);
                Some(format!("Saved locally, but not to the spreadsheet: {}", e))
            }
        }
    }

    /// Aggregate view over the cached network snapshot
    pub async fn aggregate_view(
        &self,
        ctx: &RequestContext,
        request: ReportRequest,
    ) -> Result<AggregateReport> {
        debug!("Aggregate view for {} (role {:?})", request.scope, ctx.role);

        let records = self.store.snapshot(&Scope::Network).await?;
        let tz = self.config.window.timezone()?;
        let now = self.clock.now().with_timezone(&tz);

        Ok(build_report(&records, &request, &now, self.config.thresholds))
    }

    /// Report request for the context's default scope and configured window
    pub fn default_request(&self, ctx: &RequestContext) -> Result<ReportRequest> {
        Ok(ReportRequest::new(ctx.default_scope(), self.config.window.to_mode()?))
    }

    /// Natural-language summary or answer; never fails
    pub async fn ask(
        &self,
        ctx: &RequestContext,
        scope: Option<Scope>,
        question: Option<&str>,
    ) -> String {
        let scope = scope.unwrap_or_else(|| ctx.default_scope());

        match self.store.snapshot(&scope).await {
            Ok(records) => self.summarizer.ask(&records, &scope, question).await,
            Err(e) => {
                warn!("Could not load snapshot for summary: {}", e);
                format!("{}{}", UNAVAILABLE_PREFIX, e)
            }
        }
    }

    /// Full table as CSV; admin only
    pub async fn export_csv(&self, ctx: &RequestContext) -> Result<String> {
        ctx.require_admin()?;
        let records = self.store.inner().load_all().await?;
        info!("Exporting {} records", records.len());
        Ok(serialize_all(&records))
    }

    pub fn mirror_diagnostics(&self) -> &MirrorDiagnostics {
        &self.mirror_diagnostics
    }

    pub async fn count(&self) -> Result<usize> {
        self.store.count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::services::llm::MockSummarizationGateway;
    use crate::services::mirror::NoopMirror;
    use crate::types::Role;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    struct FailingMirror;

    #[async_trait]
    impl RecordMirror for FailingMirror {
        async fn append(&self, _record: &QualityRecord) -> Result<()> {
            Err(QualityError::Mirror("sheet unreachable".to_string()))
        }

        fn diagnostics(&self) -> MirrorDiagnostics {
            MirrorDiagnostics {
                configured: true,
                sheet_id: Some("test".to_string()),
                token_present: true,
                sheet_link: None,
            }
        }
    }

    async fn service_with(
        dir: &TempDir,
        mirror: Box<dyn RecordMirror>,
        gateway: MockSummarizationGateway,
    ) -> QualityService {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 15, 9, 0, 0).unwrap()));
        let store = SqliteRecordStore::open_with_clock(dir.path().join("fq.db"), clock.clone())
            .await
            .unwrap();
        QualityService::new(
            store,
            Arc::new(gateway),
            mirror,
            clock,
            AppConfig::default(),
            SecretString::from("secret".to_string()),
        )
    }

    fn check(branch: Option<&str>, score: i64) -> SubmitRequest {
        SubmitRequest {
            branch: branch.map(str::to_string),
            chef_name: "Dana".to_string(),
            dish_name: "Pad Thai".to_string(),
            score,
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn test_branch_staff_submit_for_own_branch() {
        let dir = TempDir::new().unwrap();
        let service =
            service_with(&dir, Box::new(NoopMirror), MockSummarizationGateway::new()).await;
        let ctx = RequestContext::anonymous().sign_in_branch("Haifa").unwrap();

        let outcome = service.submit(&ctx, check(Some("Savyon"), 9)).await.unwrap();
        assert_eq!(outcome.branch, "Haifa");
        assert_eq!(outcome.band, ScoreBand::Excellent);
        assert!(outcome.mirror_warning.is_none());

        let record = service.store().get(outcome.id).await.unwrap().unwrap();
        assert_eq!(record.submitted_by, Role::Branch);
    }

    #[tokio::test]
    async fn test_anonymous_submit_rejected() {
        let dir = TempDir::new().unwrap();
        let service =
            service_with(&dir, Box::new(NoopMirror), MockSummarizationGateway::new()).await;

        let err = service
            .submit(&RequestContext::anonymous(), check(Some("Haifa"), 7))
            .await
            .unwrap_err();
        assert!(matches!(err, QualityError::NotPermitted(_)));
        assert_eq!(service.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_invalid_score_is_validation_error() {
        let dir = TempDir::new().unwrap();
        let service =
            service_with(&dir, Box::new(NoopMirror), MockSummarizationGateway::new()).await;
        let ctx = RequestContext::anonymous().sign_in_headquarters();

        let err = service.submit(&ctx, check(Some("Haifa"), 11)).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(service.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mirror_failure_keeps_record() {
        let dir = TempDir::new().unwrap();
        let service =
            service_with(&dir, Box::new(FailingMirror), MockSummarizationGateway::new()).await;
        let ctx = RequestContext::anonymous().sign_in_headquarters();

        let outcome = service.submit(&ctx, check(Some("Haifa"), 7)).await.unwrap();
        let warning = outcome.mirror_warning.unwrap();
        assert!(warning.contains("sheet unreachable"));
        assert_eq!(service.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_export_requires_admin() {
        let dir = TempDir::new().unwrap();
        let service =
            service_with(&dir, Box::new(NoopMirror), MockSummarizationGateway::new()).await;
        let ctx = RequestContext::anonymous().sign_in_headquarters();
        service.submit(&ctx, check(Some("Haifa"), 7)).await.unwrap();

        assert!(matches!(
            service.export_csv(&ctx).await.unwrap_err(),
            QualityError::NotPermitted(_)
        ));
        assert!(service.elevate_admin(&ctx, "wrong").is_err());

        let admin = service.elevate_admin(&ctx, "secret").unwrap();
        let csv = service.export_csv(&admin).await.unwrap();
        assert_eq!(csv.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_ask_uses_default_scope() {
        let dir = TempDir::new().unwrap();
        let mut gateway = MockSummarizationGateway::new();
        gateway
            .expect_complete()
            .withf(|_, user| user.contains("Haifa") && !user.contains("Savyon"))
            .times(1)
            .returning(|_, _| Ok("Haifa is steady.".to_string()));
        let service = service_with(&dir, Box::new(NoopMirror), gateway).await;

        let hq = RequestContext::anonymous().sign_in_headquarters();
        service.submit(&hq, check(Some("Haifa"), 7)).await.unwrap();
        service.submit(&hq, check(Some("Savyon"), 5)).await.unwrap();

        let branch = RequestContext::anonymous().sign_in_branch("Haifa").unwrap();
        assert_eq!(service.ask(&branch, None, None).await, "Haifa is steady.");
    }
}
