//! Best-effort spreadsheet mirror of submitted records
//!
//! The mirror runs after the primary insert has committed. Its failures never
//! undo or fail the submission; the caller turns them into a warning.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::MirrorSettings;
use crate::error::{QualityError, Result};
use crate::storage::sqlite::format_timestamp;
use crate::types::QualityRecord;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

static SHEET_URL_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/spreadsheets/d/([A-Za-z0-9_-]+)").expect("valid sheet url regex")
});

/// Secondary destination for committed records
#[async_trait]
pub trait RecordMirror: Send + Sync {
    async fn append(&self, record: &QualityRecord) -> Result<()>;

    fn diagnostics(&self) -> MirrorDiagnostics;
}

/// Admin view of the mirror configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MirrorDiagnostics {
    pub configured: bool,
    pub sheet_id: Option<String>,
    pub token_present: bool,
    pub sheet_link: Option<String>,
}

/// Extract the sheet id from a `.../spreadsheets/d/<id>/...` URL
pub fn sheet_id_from_url(url: &str) -> Option<String> {
    SHEET_URL_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Sheet id from settings; an explicit id wins over the URL
pub fn resolve_sheet_id(settings: &MirrorSettings) -> Option<String> {
    settings
        .sheet_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .or_else(|| settings.sheet_url.as_deref().and_then(sheet_id_from_url))
}

/// Mirror used when no sheet is configured
#[derive(Debug, Default)]
pub struct NoopMirror;

#[async_trait]
impl RecordMirror for NoopMirror {
    async fn append(&self, _record: &QualityRecord) -> Result<()> {
        Ok(())
    }

    fn diagnostics(&self) -> MirrorDiagnostics {
        MirrorDiagnostics {
            configured: false,
            sheet_id: None,
            token_present: false,
            sheet_link: None,
        }
    }
}

/// Appends one row per record through the Sheets `values:append` endpoint
pub struct SheetsMirror {
    sheet_id: String,
    range: String,
    token: SecretString,
    api_base: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl SheetsMirror {
    pub fn new(sheet_id: String, range: String, token: SecretString, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build HTTP client ({}); using per-request timeout", e);
                reqwest::Client::new()
            });

        Self {
            sheet_id,
            range,
            token,
            api_base: SHEETS_API_BASE.to_string(),
            timeout,
            client,
        }
    }

    /// Point at a different API host
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn sheet_id(&self) -> &str {
        &self.sheet_id
    }

    fn append_url(&self) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.api_base)
            .map_err(|e| QualityError::Mirror(format!("invalid API base: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| QualityError::Mirror("API base cannot hold a path".to_string()))?
            .push(&self.sheet_id)
            .push("values")
            .push(&format!("{}:append", self.range));
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED")
            .append_pair("insertDataOption", "INSERT_ROWS");
        Ok(url)
    }
}

/// Spreadsheet row: created_at, branch, chef, dish, score, notes
pub fn sheet_row(record: &QualityRecord) -> serde_json::Value {
    json!([
        format_timestamp(&record.created_at),
        record.branch,
        record.chef_name,
        record.dish_name,
        record.score,
        record.notes,
    ])
}

#[async_trait]
impl RecordMirror for SheetsMirror {
    async fn append(&self, record: &QualityRecord) -> Result<()> {
        let url = self.append_url()?;
        debug!("Mirroring record {} to sheet {}", record.id, self.sheet_id);

        let response = self
            .client
            .post(url)
            .bearer_auth(self.token.expose_secret())
            .timeout(self.timeout)
            .json(&json!({ "values": [sheet_row(record)] }))
            .send()
            .await
            .map_err(|e| QualityError::Mirror(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(QualityError::Mirror(format!(
                "append failed with status {}: {}",
                status, error_text
            )));
        }

        Ok(())
    }

    fn diagnostics(&self) -> MirrorDiagnostics {
        MirrorDiagnostics {
            configured: true,
            sheet_id: Some(self.sheet_id.clone()),
            token_present: true,
            sheet_link: Some(format!("https://docs.google.com/spreadsheets/d/{}", self.sheet_id)),
        }
    }
}

/// Pick the mirror implied by settings and the optional token
///
/// Both a sheet id and a token are needed; anything less yields a
/// [`NoopMirror`] and the gap shows up in its diagnostics.
pub fn mirror_from_settings(
    settings: &MirrorSettings,
    token: Option<SecretString>,
) -> (Box<dyn RecordMirror>, MirrorDiagnostics) {
    let sheet_id = resolve_sheet_id(settings);

    match (sheet_id, token) {
        (Some(id), Some(token)) => {
            let mirror = SheetsMirror::new(
                id,
                settings.range.clone(),
                token,
                Duration::from_secs(settings.timeout_seconds),
            );
            let diagnostics = mirror.diagnostics();
            (Box::new(mirror), diagnostics)
        }
        (sheet_id, token) => {
            let diagnostics = MirrorDiagnostics {
                configured: false,
                sheet_link: sheet_id
                    .as_ref()
                    .map(|id| format!("https://docs.google.com/spreadsheets/d/{}", id)),
                sheet_id,
                token_present: token.is_some(),
            };
            (Box::new(NoopMirror), diagnostics)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RecordId, Role};
    use chrono::{TimeZone, Utc};

    fn record() -> QualityRecord {
        QualityRecord {
            id: RecordId(7),
            branch: "Haifa".to_string(),
            chef_name: "Dana".to_string(),
            dish_name: "Pad Thai".to_string(),
            score: 9,
            notes: "crisp".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            submitted_by: Role::Branch,
        }
    }

    #[test]
    fn test_sheet_id_from_url() {
        assert_eq!(
            sheet_id_from_url("https://docs.google.com/spreadsheets/d/1AbC-d_9/edit#gid=0")
                .as_deref(),
            Some("1AbC-d_9")
        );
        assert_eq!(sheet_id_from_url("https://example.com/sheet"), None);
    }

    #[test]
    fn test_explicit_id_wins() {
        let settings = MirrorSettings {
            sheet_id: Some("explicit".to_string()),
            sheet_url: Some("https://docs.google.com/spreadsheets/d/from-url/edit".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_sheet_id(&settings).as_deref(), Some("explicit"));

        let settings = MirrorSettings {
            sheet_id: Some("  ".to_string()),
            ..settings
        };
        assert_eq!(resolve_sheet_id(&settings).as_deref(), Some("from-url"));
    }

    #[test]
    fn test_append_url() {
        let mirror = SheetsMirror::new(
            "abc".to_string(),
            "Sheet1!A1".to_string(),
            SecretString::from("token".to_string()),
            Duration::from_secs(10),
        );
        let url = mirror.append_url().unwrap();
        let expected = "https://sheets.googleapis.com/v4/spreadsheets/abc/values/Sheet1!A1:append?";
        assert!(url.as_str().starts_with(expected));
        assert!(url.as_str().contains("valueInputOption=USER_ENTERED"));
    }

    #[test]
    fn test_sheet_row_order() {
        let row = sheet_row(&record());
        assert_eq!(
            row,
            json!(["2024-05-01T12:00:00.000000Z", "Haifa", "Dana", "Pad Thai", 9, "crisp"])
        );
    }

    #[test]
    fn test_unconfigured_mirror_diagnostics() {
        let settings = MirrorSettings {
            sheet_id: Some("abc".to_string()),
            ..Default::default()
        };
        let (_, diagnostics) = mirror_from_settings(&settings, None);
        assert!(!diagnostics.configured);
        assert_eq!(diagnostics.sheet_id.as_deref(), Some("abc"));
        assert!(!diagnostics.token_present);

        let (_, diagnostics) =
            mirror_from_settings(&settings, Some(SecretString::from("t".to_string())));
        assert!(diagnostics.configured);
    }

    #[tokio::test]
    async fn test_unreachable_sheet_is_an_error() {
        let mirror = SheetsMirror::new(
            "abc".to_string(),
            "Sheet1!A1".to_string(),
            SecretString::from("token".to_string()),
            Duration::from_millis(200),
        )
        .with_api_base("http://127.0.0.1:9/v4/spreadsheets");

        let err = mirror.append(&record()).await.unwrap_err();
        assert!(matches!(err, QualityError::Mirror(_)));
    }

    #[tokio::test]
    async fn test_silent_sheet_times_out() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let mirror = SheetsMirror::new(
            "abc".to_string(),
            "Sheet1!A1".to_string(),
            SecretString::from("token".to_string()),
            Duration::from_millis(200),
        )
        .with_api_base(format!("http://{}/v4/spreadsheets", addr));

        let result = tokio::time::timeout(Duration::from_secs(5), mirror.append(&record()))
            .await
            .expect("mirror append should honour its timeout");
        assert!(matches!(result, Err(QualityError::Mirror(_))));
        drop(listener);
    }
}
