//! Grouped score statistics over a record snapshot
//!
//! Every function here is pure and works on a slice of records that the
//! caller has already loaded and, usually, filtered to a window and scope.
//!
//! # Tie-breaking
//!
//! When two groups share the extreme mean, the group whose key sorts first
//! (byte-wise string order) wins. This holds for both `Max` and `Min`, so
//! repeated evaluations over the same snapshot always pick the same group.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::types::QualityRecord;
use crate::window::TimeWindow;

/// Record field used as grouping key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupField {
    Branch,
    Chef,
    Dish,
}

impl GroupField {
    pub fn key_of<'a>(&self, record: &'a QualityRecord) -> &'a str {
        match self {
            GroupField::Branch => &record.branch,
            GroupField::Chef => &record.chef_name,
            GroupField::Dish => &record.dish_name,
        }
    }
}

/// Count and mean score of one group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateStat {
    pub key: String,
    pub n: usize,
    pub mean: f64,
}

impl AggregateStat {
    /// Mean rounded for display
    pub fn rounded_mean(&self) -> f64 {
        round2(self.mean)
    }
}

/// Which end of the ranking to pick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extreme {
    Max,
    Min,
}

/// Minimum group sizes before a group may be reported as best or worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinSamples {
    /// Network-wide star chef headline
    #[serde(default = "default_top_chef")]
    pub top_chef: usize,

    /// Per-window chef and branch leader/laggard
    #[serde(default = "default_leader")]
    pub leader: usize,

    /// Dish leader/laggard
    #[serde(default = "default_dish")]
    pub dish: usize,
}

fn default_top_chef() -> usize {
    5
}

fn default_leader() -> usize {
    2
}

fn default_dish() -> usize {
    2
}

impl Default for MinSamples {
    fn default() -> Self {
        Self {
            top_chef: default_top_chef(),
            leader: default_leader(),
            dish: default_dish(),
        }
    }
}

/// Per-request replacements for [`MinSamples`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinSampleOverrides {
    pub top_chef: Option<usize>,
    pub leader: Option<usize>,
    pub dish: Option<usize>,
}

impl MinSamples {
    pub fn with_overrides(self, overrides: &MinSampleOverrides) -> Self {
        Self {
            top_chef: overrides.top_chef.unwrap_or(self.top_chef),
            leader: overrides.leader.unwrap_or(self.leader),
            dish: overrides.dish.unwrap_or(self.dish),
        }
    }
}

/// Round to two decimals for display
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Records whose `created_at` falls in `window`
pub fn filter_window(records: &[QualityRecord], window: &TimeWindow) -> Vec<QualityRecord> {
    records
        .iter()
        .filter(|r| window.contains(r.created_at))
        .cloned()
        .collect()
}

/// Records of a single branch
pub fn filter_branch(records: &[QualityRecord], branch: &str) -> Vec<QualityRecord> {
    records
        .iter()
        .filter(|r| r.branch == branch)
        .cloned()
        .collect()
}

/// Arithmetic mean of all scores; `None` for an empty slice
pub fn mean_score(records: &[QualityRecord]) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    let total: u64 = records.iter().map(|r| u64::from(r.score)).sum();
    Some(total as f64 / records.len() as f64)
}

/// Mean score of records matching `predicate`; `None` when nothing matches
pub fn mean_where<F>(records: &[QualityRecord], predicate: F) -> Option<f64>
where
    F: Fn(&QualityRecord) -> bool,
{
    let (total, n) = records
        .iter()
        .filter(|r| predicate(r))
        .fold((0u64, 0usize), |(total, n), r| (total + u64::from(r.score), n + 1));

    if n == 0 {
        None
    } else {
        Some(total as f64 / n as f64)
    }
}

/// Group records by `field` and compute count and mean score per group
///
/// Groups come back sorted by key. Empty groups cannot occur.
pub fn group_mean(records: &[QualityRecord], field: GroupField) -> Vec<AggregateStat> {
    let mut groups: BTreeMap<&str, (u64, usize)> = BTreeMap::new();

    for record in records {
        let entry = groups.entry(field.key_of(record)).or_insert((0, 0));
        entry.0 += u64::from(record.score);
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|(key, (total, n))| AggregateStat {
            key: key.to_string(),
            n,
            mean: total as f64 / n as f64,
        })
        .collect()
}

/// Drop groups with fewer than `min_n` records
pub fn filter_min_sample(groups: &[AggregateStat], min_n: usize) -> Vec<AggregateStat> {
    groups.iter().filter(|g| g.n >= min_n).cloned().collect()
}

/// Group with the highest or lowest mean; ties go to the smaller key
pub fn pick_extreme(groups: &[AggregateStat], which: Extreme) -> Option<AggregateStat> {
    groups
        .iter()
        .min_by(|a, b| {
            let by_mean = match which {
                Extreme::Max => b.mean.total_cmp(&a.mean),
                Extreme::Min => a.mean.total_cmp(&b.mean),
            };
            by_mean.then_with(|| a.key.cmp(&b.key))
        })
        .cloned()
}

/// Headline pick that is never blank while any group exists
///
/// Among groups with at least `min_n` records, the highest mean wins
/// (ties: more records, then smaller key). When no group qualifies, the
/// largest group wins (ties: higher mean, then smaller key).
pub fn pick_top_with_fallback(groups: &[AggregateStat], min_n: usize) -> Option<AggregateStat> {
    let qualified = groups
        .iter()
        .filter(|g| g.n >= min_n)
        .min_by(|a, b| {
            b.mean
                .total_cmp(&a.mean)
                .then_with(|| b.n.cmp(&a.n))
                .then_with(|| a.key.cmp(&b.key))
        });

    if let Some(pick) = qualified {
        return Some(pick.clone());
    }

    groups
        .iter()
        .min_by(|a, b| {
            b.n.cmp(&a.n)
                .then_with(|| b.mean.total_cmp(&a.mean))
                .then_with(|| a.key.cmp(&b.key))
        })
        .cloned()
}

/// Suppress the worst dish when it is the same dish as the best one
pub fn worst_of_dish_pair(
    best: Option<&AggregateStat>,
    worst: Option<AggregateStat>,
) -> Option<AggregateStat> {
    match (best, worst) {
        (Some(best), Some(worst)) if best.key == worst.key => None,
        (_, worst) => worst,
    }
}

/// Branch where `chef` recorded the most checks; ties go to the smaller name
pub fn dominant_branch(records: &[QualityRecord], chef: &str) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records.iter().filter(|r| r.chef_name == chef) {
        *counts.entry(record.branch.as_str()).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .min_by(|(a_key, a_n), (b_key, b_n)| match b_n.cmp(a_n) {
            Ordering::Equal => a_key.cmp(b_key),
            other => other,
        })
        .map(|(branch, _)| branch.to_string())
}
