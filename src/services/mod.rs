//! Services layer for the food quality tracker
//!
//! Outbound integrations: the summarization gateway, the prompts built on
//! top of it, CSV snapshots and the spreadsheet mirror.

pub mod llm;
pub mod mirror;
pub mod snapshot;
pub mod summary;

pub use llm::{ChatCompletionsGateway, LlmConfig, SummarizationGateway};
pub use mirror::{mirror_from_settings, MirrorDiagnostics, NoopMirror, RecordMirror, SheetsMirror};
pub use snapshot::{serialize_all, serialize_snapshot, CSV_HEADER};
pub use summary::Summarizer;
