//! CSV export command

use food_quality_core::error::Result;
use std::io::Write;
use tracing::debug;

use super::helpers::{open_service, GlobalOpts};

/// Handle CSV export command; requires `--admin-password`
pub async fn handle(output: Option<String>, opts: &GlobalOpts) -> Result<()> {
    let (service, ctx) = open_service(opts).await?;
    let csv = service.export_csv(&ctx).await?;

    match output {
        Some(path) => {
            debug!("Exporting records to {}...", path);
            std::fs::write(&path, csv.as_bytes())?;
            eprintln!("✓ Exported {} records to {}", csv.lines().count().saturating_sub(1), path);
        }
        None => {
            debug!("Exporting records to stdout...");
            std::io::stdout().write_all(csv.as_bytes())?;
        }
    }
    Ok(())
}
