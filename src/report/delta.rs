//! Signed comparison between a current and a prior aggregate

use serde::{Deserialize, Serialize};

use crate::aggregate::round2;

/// Rendering when neither period has data
pub const NO_DATA: &str = "no data";

/// Rendering when only the prior period has data
pub const DECREASED_UNKNOWN: &str = "▼ ?";

/// Rendering when only the current period has data
pub const INCREASED_UNKNOWN: &str = "▲ ?";

/// Which of the four presence cases a delta falls in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaKind {
    NoData,
    DecreasedUnknown,
    IncreasedUnknown,
    Change,
}

/// Current vs prior value; either side may be absent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    pub current: Option<f64>,
    pub prior: Option<f64>,

    /// `current - prior` when both are present
    pub signed_difference: Option<f64>,
}

impl Delta {
    pub fn between(current: Option<f64>, prior: Option<f64>) -> Self {
        let signed_difference = match (current, prior) {
            (Some(c), Some(p)) => Some(c - p),
            _ => None,
        };

        Self {
            current,
            prior,
            signed_difference,
        }
    }

    pub fn kind(&self) -> DeltaKind {
        match (self.current, self.prior) {
            (None, None) => DeltaKind::NoData,
            (None, Some(_)) => DeltaKind::DecreasedUnknown,
            (Some(_), None) => DeltaKind::IncreasedUnknown,
            (Some(_), Some(_)) => DeltaKind::Change,
        }
    }

    /// Display string, e.g. `▲ +0.50`, `▼ -1.25`, `▲ ?` or `no data`
    pub fn render(&self) -> String {
        match (self.kind(), self.signed_difference) {
            (DeltaKind::NoData, _) => NO_DATA.to_string(),
            (DeltaKind::DecreasedUnknown, _) => DECREASED_UNKNOWN.to_string(),
            (DeltaKind::IncreasedUnknown, _) => INCREASED_UNKNOWN.to_string(),
            (DeltaKind::Change, Some(diff)) => {
                let rounded = round2(diff);
                if rounded >= 0.0 {
                    format!("▲ +{:.2}", rounded.abs())
                } else {
                    format!("▼ -{:.2}", rounded.abs())
                }
            }
            (DeltaKind::Change, None) => NO_DATA.to_string(),
        }
    }
}

impl std::fmt::Display for Delta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// Render the comparison of two optional values
pub fn delta(current: Option<f64>, prior: Option<f64>) -> String {
    Delta::between(current, prior).render()
}
