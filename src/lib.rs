//! Food Quality - kitchen quality checks for a restaurant chain
//!
//! Branch staff and headquarters record 1-10 scores per chef and dish. The
//! crate stores those checks append-only and turns them into comparisons:
//! - Network and branch averages, current window vs prior window
//! - Best and worst chef, dish and branch behind minimum-sample gates
//! - A star chef headline that never goes blank while data exists
//! - Natural-language summaries through an LLM gateway
//!
//! # Architecture
//!
//! - **Types**: records, scopes, roles, score bands
//! - **Storage**: SQLite record store behind a TTL snapshot cache
//! - **Window / Aggregate / Report**: pure functions over a snapshot
//! - **Services**: summarization gateway, CSV snapshots, spreadsheet mirror
//! - **Service**: [`QualityService`], the façade a front end talks to
//!
//! # Example
//!
//! ```ignore
//! use food_quality_core::{AppConfig, Credentials, QualityService, RequestContext, SubmitRequest};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::load(None)?;
//!     let credentials = Credentials::from_env();
//!     let service = QualityService::open("food_quality.db", config, credentials).await?;
//!
//!     let ctx = RequestContext::anonymous().sign_in_branch("Haifa")?;
//!     service.submit(&ctx, SubmitRequest {
//!         chef_name: "Dana".to_string(),
//!         dish_name: "Pad Thai".to_string(),
//!         score: 8,
//!         ..Default::default()
//!     }).await?;
//!
//!     let report = service.aggregate_view(&ctx, service.default_request(&ctx)?).await?;
//!     println!("{}", report.render_text());
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod report;
pub mod service;
pub mod services;
pub mod storage;
pub mod types;
pub mod window;

// Re-export commonly used types
pub use aggregate::{AggregateStat, Extreme, GroupField, MinSampleOverrides, MinSamples};
pub use catalog::Catalog;
pub use clock::{Clock, ManualClock, SystemClock};
pub use crate::config::{AppConfig, Credentials};
pub use context::RequestContext;
pub use error::{QualityError, Result, ValidationError};
pub use report::{delta, AggregateReport, Delta, ReportRequest};
pub use service::{QualityService, SubmitOutcome, SubmitRequest};
pub use services::{ChatCompletionsGateway, MirrorDiagnostics, SummarizationGateway, Summarizer};
pub use storage::{cache::CachedRecordStore, sqlite::SqliteRecordStore, RecordStore};
pub use types::{NewRecord, QualityRecord, RecordId, Role, Scope, ScoreBand};
pub use window::{TimeWindow, WindowMode, WindowPair};
