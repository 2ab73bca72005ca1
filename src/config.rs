//! Configuration for the food quality tracker
//!
//! Settings are layered with the `config` crate:
//! built-in defaults, then an optional TOML file, then environment variables
//! with the `FOOD_QUALITY_` prefix (`__` separates nested keys, e.g.
//! `FOOD_QUALITY_CACHE__TTL_SECONDS=30`).
//!
//! # Configuration File Format
//!
//! ```toml
//! [database]
//! path = "/var/lib/food-quality/food_quality.db"
//!
//! [cache]
//! ttl_seconds = 15
//!
//! [thresholds]
//! top_chef = 5
//! leader = 2
//! dish = 2
//!
//! [window]
//! mode = "rolling"
//! length_days = 7
//! utc_offset_minutes = 120
//!
//! [gateway]
//! model = "gpt-4.1-mini"
//! timeout_seconds = 30
//! row_cap = 400
//! ```
//!
//! Credentials never live in the file. They are read from the environment
//! into [`Credentials`].

use chrono::FixedOffset;
use config::{Config, Environment, File};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use tracing::{debug, warn};

use crate::aggregate::MinSamples;
use crate::catalog::Catalog;
use crate::error::{QualityError, Result};
use crate::window::{WindowMode, MAX_WINDOW_DAYS};

/// Admin password used when `ADMIN_PASSWORD` is unset
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub thresholds: MinSamples,

    #[serde(default)]
    pub window: WindowSettings,

    #[serde(default)]
    pub gateway: GatewaySettings,

    #[serde(default)]
    pub mirror: MirrorSettings,

    #[serde(default)]
    pub catalog: Catalog,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file; the CLI falls back to the data directory when unset
    pub path: Option<String>,
}

/// Snapshot cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,

    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

fn default_ttl_seconds() -> u64 {
    15
}

fn default_cache_capacity() -> usize {
    32
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl_seconds(),
            capacity: default_cache_capacity(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowModeSetting {
    Rolling,
    Calendar,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSettings {
    #[serde(default = "default_window_mode")]
    pub mode: WindowModeSetting,

    #[serde(default = "default_length_days")]
    pub length_days: i64,

    /// Offset of the timezone calendar weeks are aligned to
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

fn default_window_mode() -> WindowModeSetting {
    WindowModeSetting::Rolling
}

fn default_length_days() -> i64 {
    7
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            mode: default_window_mode(),
            length_days: default_length_days(),
            utc_offset_minutes: 0,
        }
    }
}

impl WindowSettings {
    /// Window mode for reports that do not ask for one explicitly
    pub fn to_mode(&self) -> Result<WindowMode> {
        match self.mode {
            WindowModeSetting::Calendar => Ok(WindowMode::Calendar),
            WindowModeSetting::Rolling => WindowMode::rolling_days(self.length_days),
        }
    }

    /// Timezone used to align calendar weeks
    pub fn timezone(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .ok_or_else(|| config_error("window.utc_offset_minutes is out of range"))
    }
}

/// Summarization gateway settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_gateway_timeout")]
    pub timeout_seconds: u64,

    /// Rows forwarded per request; oldest rows are dropped first
    #[serde(default = "default_row_cap")]
    pub row_cap: usize,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4.1-mini".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_gateway_timeout() -> u64 {
    30
}

fn default_row_cap() -> usize {
    400
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_seconds: default_gateway_timeout(),
            row_cap: default_row_cap(),
        }
    }
}

/// Spreadsheet mirror settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorSettings {
    pub sheet_id: Option<String>,

    /// Full sheet URL; the id is extracted when `sheet_id` is unset
    pub sheet_url: Option<String>,

    #[serde(default = "default_sheet_range")]
    pub range: String,

    #[serde(default = "default_mirror_timeout")]
    pub timeout_seconds: u64,
}

fn default_sheet_range() -> String {
    "Sheet1!A1".to_string()
}

fn default_mirror_timeout() -> u64 {
    10
}

impl Default for MirrorSettings {
    fn default() -> Self {
        Self {
            sheet_id: None,
            sheet_url: None,
            range: default_sheet_range(),
            timeout_seconds: default_mirror_timeout(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional file and the environment
    ///
    /// A file passed explicitly must exist; otherwise `food-quality.toml` in
    /// the working directory is read when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = Config::try_from(&AppConfig::default())?;

        let mut builder = Config::builder().add_source(defaults);

        builder = match path {
            Some(path) => {
                debug!("Loading config file: {}", path.display());
                builder.add_source(File::from(path).required(true))
            }
            None => builder.add_source(File::with_name("food-quality").required(false)),
        };

        builder = builder
            .add_source(
                Environment::with_prefix("FOOD_QUALITY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("gateway.model", env::var("OPENAI_MODEL").ok())?
            .set_override_option("mirror.sheet_id", env::var("GOOGLE_SHEET_ID").ok())?
            .set_override_option("mirror.sheet_url", env::var("GOOGLE_SHEET_URL").ok())?;

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no report could run with
    pub fn validate(&self) -> Result<()> {
        if self.window.length_days <= 0 || self.window.length_days > MAX_WINDOW_DAYS {
            return Err(config_error(&format!(
                "window.length_days must be between 1 and {}",
                MAX_WINDOW_DAYS
            )));
        }
        self.window.timezone()?;
        if self.cache.capacity == 0 {
            return Err(config_error("cache.capacity must be at least 1"));
        }
        if self.gateway.row_cap == 0 {
            return Err(config_error("gateway.row_cap must be at least 1"));
        }
        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| QualityError::Other(e.to_string()))
    }
}

fn config_error(message: &str) -> QualityError {
    QualityError::Config(config::ConfigError::Message(message.to_string()))
}

/// Secrets read from the environment
pub struct Credentials {
    pub openai_api_key: Option<SecretString>,
    pub openai_org: Option<String>,
    pub openai_project: Option<String>,
    pub sheets_token: Option<SecretString>,
    pub admin_password: SecretString,
}

impl Credentials {
    /// Read credentials from `OPENAI_API_KEY`, `OPENAI_ORG`, `OPENAI_PROJECT`,
    /// `GOOGLE_SHEETS_TOKEN` and `ADMIN_PASSWORD`
    pub fn from_env() -> Self {
        let admin_password = match non_empty_var("ADMIN_PASSWORD") {
            Some(password) => password,
            None => {
                warn!("ADMIN_PASSWORD not set, falling back to the built-in default");
                DEFAULT_ADMIN_PASSWORD.to_string()
            }
        };

        Self {
            openai_api_key: non_empty_var("OPENAI_API_KEY").map(SecretString::from),
            openai_org: non_empty_var("OPENAI_ORG"),
            openai_project: non_empty_var("OPENAI_PROJECT"),
            sheets_token: non_empty_var("GOOGLE_SHEETS_TOKEN").map(SecretString::from),
            admin_password: SecretString::from(admin_password),
        }
    }

    /// No credentials at all, admin password as given
    pub fn empty(admin_password: &str) -> Self {
        Self {
            openai_api_key: None,
            openai_org: None,
            openai_project: None,
            sheets_token: None,
            admin_password: SecretString::from(admin_password.to_string()),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
