//! Aggregate view: everything a dashboard shows for one scope and window

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::aggregate::{
    dominant_branch, filter_min_sample, filter_window, group_mean, mean_score, mean_where,
    pick_extreme, pick_top_with_fallback, worst_of_dish_pair, AggregateStat, Extreme, GroupField,
    MinSampleOverrides, MinSamples,
};
use crate::report::delta::Delta;
use crate::types::{QualityRecord, Scope};
use crate::window::{window_pair, WindowMode, WindowPair};

/// "Request aggregate view" input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub scope: Scope,
    pub window_mode: WindowMode,

    #[serde(default)]
    pub min_sample_overrides: MinSampleOverrides,

    /// Dish to compare between network and branch
    #[serde(default)]
    pub focus_dish: Option<String>,
}

impl ReportRequest {
    pub fn new(scope: Scope, window_mode: WindowMode) -> Self {
        Self {
            scope,
            window_mode,
            min_sample_overrides: MinSampleOverrides::default(),
            focus_dish: None,
        }
    }
}

/// Mean score in the current and prior window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodComparison {
    pub current: Option<f64>,
    pub current_n: usize,
    pub prior: Option<f64>,
    pub prior_n: usize,
    pub delta: Delta,
}

impl PeriodComparison {
    fn of(current: &[QualityRecord], prior: &[QualityRecord]) -> Self {
        let current_mean = mean_score(current);
        let prior_mean = mean_score(prior);
        Self {
            current: current_mean,
            current_n: current.len(),
            prior: prior_mean,
            prior_n: prior.len(),
            delta: Delta::between(current_mean, prior_mean),
        }
    }
}

/// Network headline chef
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarChef {
    pub chef: String,

    /// Branch where the chef logged most checks
    pub branch: Option<String>,

    pub n: usize,
    pub mean: f64,

    /// False when picked by the largest-group fallback
    pub qualified: bool,
}

/// Network vs branch mean for one dish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DishComparison {
    pub dish: String,
    pub network: Option<f64>,
    pub branch: Option<f64>,
}

/// Structured result of an aggregate view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub scope: Scope,
    pub generated_at: DateTime<Utc>,
    pub windows: WindowPair,
    pub thresholds: MinSamples,

    /// Network mean, current vs prior
    pub network: PeriodComparison,

    /// Branch mean, current vs prior; branch scope only
    pub branch: Option<PeriodComparison>,

    pub star_chef: Option<StarChef>,
    pub best_chef: Option<AggregateStat>,
    pub worst_chef: Option<AggregateStat>,
    pub best_dish: Option<AggregateStat>,
    pub worst_dish: Option<AggregateStat>,

    /// Network scope only
    pub branch_leader: Option<AggregateStat>,
    pub branch_laggard: Option<AggregateStat>,

    /// Unfiltered listings for the current window in scope
    pub chefs: Vec<AggregateStat>,
    pub dishes: Vec<AggregateStat>,
    pub branches: Vec<AggregateStat>,

    pub dish_comparison: Option<DishComparison>,

    /// Records in scope within the current window
    pub records_in_window: usize,
}

/// Compute the aggregate view over a network-wide snapshot
///
/// `records` must cover the whole network: branch scopes still compare
/// against network figures. `now` carries the timezone calendar weeks are
/// aligned to.
pub fn build_report<Tz: TimeZone>(
    records: &[QualityRecord],
    request: &ReportRequest,
    now: &DateTime<Tz>,
    thresholds: MinSamples,
) -> AggregateReport {
    let thresholds = thresholds.with_overrides(&request.min_sample_overrides);
    let windows = window_pair(request.window_mode, now);

    let network_current = filter_window(records, &windows.current);
    let network_prior = filter_window(records, &windows.prior);

    let in_scope = |rs: &[QualityRecord]| -> Vec<QualityRecord> {
        rs.iter().filter(|r| request.scope.includes(r)).cloned().collect()
    };
    let scoped_current = in_scope(&network_current);
    let scoped_prior = in_scope(&network_prior);

    let branch = request
        .scope
        .branch()
        .map(|_| PeriodComparison::of(&scoped_current, &scoped_prior));

    let chefs = group_mean(&scoped_current, GroupField::Chef);
    let dishes = group_mean(&scoped_current, GroupField::Dish);
    let branches = group_mean(&scoped_current, GroupField::Branch);

    let eligible_chefs = filter_min_sample(&chefs, thresholds.leader);
    let best_chef = pick_extreme(&eligible_chefs, Extreme::Max);
    let worst_chef = pick_extreme(&eligible_chefs, Extreme::Min);

    let eligible_dishes = filter_min_sample(&dishes, thresholds.dish);
    let best_dish = pick_extreme(&eligible_dishes, Extreme::Max);
    let worst_dish = worst_of_dish_pair(
        best_dish.as_ref(),
        pick_extreme(&eligible_dishes, Extreme::Min),
    );

    let (branch_leader, branch_laggard) = match request.scope {
        Scope::Network => {
            let eligible = filter_min_sample(&branches, thresholds.leader);
            (
                pick_extreme(&eligible, Extreme::Max),
                pick_extreme(&eligible, Extreme::Min),
            )
        }
        Scope::Branch(_) => (None, None),
    };

    let star_chef = pick_top_with_fallback(
        &group_mean(&network_current, GroupField::Chef),
        thresholds.top_chef,
    )
    .map(|pick| StarChef {
        branch: dominant_branch(&network_current, &pick.key),
        qualified: pick.n >= thresholds.top_chef,
        chef: pick.key,
        n: pick.n,
        mean: pick.mean,
    });

    let dish_comparison = request.focus_dish.as_deref().map(|dish| DishComparison {
        dish: dish.to_string(),
        network: mean_where(&network_current, |r| r.dish_name == dish),
        branch: request
            .scope
            .branch()
            .and_then(|b| mean_where(&network_current, |r| r.branch == b && r.dish_name == dish)),
    });

    AggregateReport {
        scope: request.scope.clone(),
        generated_at: now.with_timezone(&Utc),
        windows,
        thresholds,
        network: PeriodComparison::of(&network_current, &network_prior),
        branch,
        star_chef,
        best_chef,
        worst_chef,
        best_dish,
        worst_dish,
        branch_leader,
        branch_laggard,
        chefs,
        dishes,
        branches,
        dish_comparison,
        records_in_window: scoped_current.len(),
    }
}

fn fmt_mean(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}", v))
}

fn fmt_stat(stat: &Option<AggregateStat>) -> String {
    match stat {
        Some(s) => format!("{} ({:.2}, n={})", s.key, s.mean, s.n),
        None => "no data".to_string(),
    }
}

impl AggregateReport {
    /// Plain-text rendering for terminals
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let w = &self.windows;

        // Writing to a String cannot fail
        let _ = writeln!(out, "Scope: {}", self.scope);
        let _ = writeln!(
            out,
            "Window: {} → {} (prior {} → {})",
            w.current.start.format("%Y-%m-%d %H:%M"),
            w.current.end.format("%Y-%m-%d %H:%M"),
            w.prior.start.format("%Y-%m-%d %H:%M"),
            w.prior.end.format("%Y-%m-%d %H:%M"),
        );
        let _ = writeln!(out, "Records in window: {}", self.records_in_window);
        let _ = writeln!(out);

        let _ = writeln!(
            out,
            "Network average: {}  (prior {})  {}",
            fmt_mean(self.network.current),
            fmt_mean(self.network.prior),
            self.network.delta
        );
        if let (Some(branch), Some(name)) = (&self.branch, self.scope.branch()) {
            let _ = writeln!(
                out,
                "{} average: {}  (prior {})  {}",
                name,
                fmt_mean(branch.current),
                fmt_mean(branch.prior),
                branch.delta
            );
        }

        if let Some(cmp) = &self.dish_comparison {
            let _ = writeln!(
                out,
                "Dish {}: network {} vs branch {}",
                cmp.dish,
                fmt_mean(cmp.network),
                fmt_mean(cmp.branch)
            );
        }
        let _ = writeln!(out);

        match &self.star_chef {
            Some(star) => {
                let _ = writeln!(
                    out,
                    "Star chef: {}{} {:.2} (n={}{})",
                    star.chef,
                    star.branch
                        .as_deref()
                        .map(|b| format!(" · {}", b))
                        .unwrap_or_default(),
                    star.mean,
                    star.n,
                    if star.qualified { "" } else { ", below threshold" }
                );
            }
            None => {
                let _ = writeln!(out, "Star chef: n/a");
            }
        }

        let _ = writeln!(out, "Best chef: {}", fmt_stat(&self.best_chef));
        let _ = writeln!(out, "Worst chef: {}", fmt_stat(&self.worst_chef));
        let _ = writeln!(out, "Best dish: {}", fmt_stat(&self.best_dish));
        let _ = writeln!(out, "Worst dish: {}", fmt_stat(&self.worst_dish));
        if self.scope == Scope::Network {
            let _ = writeln!(out, "Leading branch: {}", fmt_stat(&self.branch_leader));
            let _ = writeln!(out, "Lagging branch: {}", fmt_stat(&self.branch_laggard));
        }

        if !self.chefs.is_empty() {
            let _ = writeln!(out, "\nChefs:");
            for chef in &self.chefs {
                let _ = writeln!(out, "  {:<24} {:>6.2}  n={}", chef.key, chef.mean, chef.n);
            }
        }

        out
    }
}
