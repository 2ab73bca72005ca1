//! Core data types for the food quality tracker
//!
//! This module defines the quality record and the small value types that flow
//! between the record store, the aggregator and the reporting layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ValidationError;

/// Lowest accepted quality score
pub const MIN_SCORE: i64 = 1;

/// Highest accepted quality score
pub const MAX_SCORE: i64 = 10;

/// Store-assigned identifier of a quality record
///
/// Monotonic per database; the SQLite rowid of the `food_quality` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who entered a record
///
/// Stored in the `submitted_by` column as `"branch"` or `"meta"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Staff at a single branch
    #[serde(rename = "branch")]
    Branch,

    /// Headquarters, sees the whole network
    #[serde(rename = "meta")]
    Headquarters,
}

impl Role {
    /// Tag persisted with each record
    pub fn as_tag(&self) -> &'static str {
        match self {
            Role::Branch => "branch",
            Role::Headquarters => "meta",
        }
    }

    /// Parse a persisted tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "branch" => Some(Role::Branch),
            "meta" => Some(Role::Headquarters),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "branch" => Ok(Role::Branch),
            "meta" | "hq" | "headquarters" => Ok(Role::Headquarters),
            other => Err(ValidationError::new(
                "role",
                format!("unknown role '{}', expected branch or hq", other),
            )),
        }
    }
}

/// Reporting scope: the whole network or a single branch
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "name")]
pub enum Scope {
    /// Headquarters view across all branches
    Network,

    /// A single branch
    Branch(String),
}

impl Scope {
    /// Branch name if this is a branch scope
    pub fn branch(&self) -> Option<&str> {
        match self {
            Scope::Network => None,
            Scope::Branch(name) => Some(name),
        }
    }

    /// Whether a record falls in this scope
    pub fn includes(&self, record: &QualityRecord) -> bool {
        match self {
            Scope::Network => true,
            Scope::Branch(name) => record.branch == *name,
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Network => write!(f, "network"),
            Scope::Branch(name) => write!(f, "branch:{}", name),
        }
    }
}

impl FromStr for Scope {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("network") {
            return Ok(Scope::Network);
        }
        match s.strip_prefix("branch:") {
            Some(name) if !name.trim().is_empty() => Ok(Scope::Branch(name.trim().to_string())),
            _ => Err(ValidationError::new(
                "scope",
                format!("expected 'network' or 'branch:<name>', got '{}'", s),
            )),
        }
    }
}

/// Input of the "submit quality check" operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub branch: String,
    pub chef_name: String,
    pub dish_name: String,

    /// Raw score as entered; range is checked by the store
    pub score: i64,

    #[serde(default)]
    pub notes: String,

    pub submitted_by: Role,
}

/// One observation of a quality check
///
/// Created once by the record store and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityRecord {
    pub id: RecordId,
    pub branch: String,
    pub chef_name: String,
    pub dish_name: String,
    pub score: u8,
    pub notes: String,

    /// Assigned at insert time; the sole windowing key
    pub created_at: DateTime<Utc>,

    pub submitted_by: Role,
}

/// Verbal hint shown next to a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Weak,
    Fair,
    Good,
    Excellent,
}

impl ScoreBand {
    pub fn for_score(score: u8) -> Self {
        match score {
            0..=3 => ScoreBand::Weak,
            4..=6 => ScoreBand::Fair,
            7..=8 => ScoreBand::Good,
            _ => ScoreBand::Excellent,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreBand::Weak => "weak",
            ScoreBand::Fair => "fair",
            ScoreBand::Good => "good",
            ScoreBand::Excellent => "excellent",
        }
    }
}

impl std::fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
