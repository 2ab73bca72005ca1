//! Quality check submission command

use food_quality_core::{error::Result, SubmitRequest};
use tracing::debug;

use super::helpers::{open_service, GlobalOpts};

/// Handle a quality check submission
pub async fn handle(
    chef: String,
    dish: String,
    score: i64,
    notes: Option<String>,
    opts: &GlobalOpts,
) -> Result<()> {
    let (service, ctx) = open_service(opts).await?;

    if !service.config().catalog.is_known_dish(dish.trim()) {
        eprintln!("⚠ '{}' is not in the dish catalog; storing it as entered", dish.trim());
    }

    let request = SubmitRequest {
        branch: opts.branch.clone(),
        chef_name: chef,
        dish_name: dish,
        score,
        notes: notes.unwrap_or_default(),
    };
    debug!("Submitting {:?}", request);

    let outcome = service.submit(&ctx, request).await?;

    println!(
        "✓ Saved check #{} for {} ({})",
        outcome.id, outcome.branch, outcome.band
    );
    if let Some(warning) = outcome.mirror_warning {
        eprintln!("⚠ {}", warning);
    }
    Ok(())
}
