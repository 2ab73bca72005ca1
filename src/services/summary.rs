//! Natural-language summaries of a scoped snapshot
//!
//! [`Summarizer::ask`] always produces display text. Gateway failures are
//! logged and rendered as `Summary unavailable: <reason>`.

use std::sync::Arc;
use tracing::{info, warn};

use crate::services::llm::SummarizationGateway;
use crate::services::snapshot::serialize_snapshot;
use crate::types::{QualityRecord, Scope};

/// Text shown when the scope has no records
pub const NO_DATA_MESSAGE: &str = "No data to analyse yet.";

/// Prefix of every rendered gateway failure
pub const UNAVAILABLE_PREFIX: &str = "Summary unavailable: ";

const SYSTEM_ANALYST: &str = "You are a data analyst for a restaurant chain's kitchen quality checks. \
You are given a table with the columns: id, branch, chef_name, dish_name, score, notes, created_at. \
Scores run from 1 (weak) to 10 (excellent). \
Answer concisely, with highlights and short recommendations.";

/// Builds prompts from a snapshot and calls the gateway
pub struct Summarizer {
    gateway: Arc<dyn SummarizationGateway>,
    row_cap: usize,
}

impl Summarizer {
    pub fn new(gateway: Arc<dyn SummarizationGateway>, row_cap: usize) -> Self {
        Self {
            gateway,
            row_cap: row_cap.max(1),
        }
    }

    pub fn row_cap(&self) -> usize {
        self.row_cap
    }

    /// Summarize `records` restricted to `scope`, or answer `question` about them
    ///
    /// A blank question is treated as no question.
    pub async fn ask(
        &self,
        records: &[QualityRecord],
        scope: &Scope,
        question: Option<&str>,
    ) -> String {
        let scoped: Vec<QualityRecord> = records
            .iter()
            .filter(|r| scope.includes(r))
            .cloned()
            .collect();

        if scoped.is_empty() {
            return NO_DATA_MESSAGE.to_string();
        }

        let table = serialize_snapshot(&scoped, self.row_cap);
        let question = question.map(str::trim).filter(|q| !q.is_empty());
        let user_prompt = match question {
            Some(q) => format!(
                "Question: {}\n\nHere is the table in CSV format (up to {} rows):\n{}\n\
                 Answer with a short justification for each conclusion.",
                q, self.row_cap, table
            ),
            None => format!(
                "Here is the table in CSV format:\n{}\n\
                 Summarize trends, outliers and short recommendations for management.",
                table
            ),
        };

        info!(
            "Requesting summary for {} ({} records, question: {})",
            scope,
            scoped.len().min(self.row_cap),
            question.is_some()
        );

        match self.gateway.complete(SYSTEM_ANALYST, &user_prompt).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => format!("{}empty response", UNAVAILABLE_PREFIX),
            Err(e) => {
                warn!("Summary request failed: {}", e);
                format!("{}{}", UNAVAILABLE_PREFIX, e)
            }
        }
    }
}
