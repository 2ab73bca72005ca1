//! Status command

use food_quality_core::error::Result;

use super::helpers::{open_service, GlobalOpts};

/// Handle status command
pub async fn handle(opts: &GlobalOpts) -> Result<()> {
    let (service, ctx) = open_service(opts).await?;
    let config = service.config();

    println!("Food Quality v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Database:");
    println!("  Path: {}", service.store().inner().path());
    println!("  Records: {}", service.count().await?);
    println!();
    println!("Reporting:");
    println!("  Default scope: {}", ctx.default_scope());
    println!("  Window: {:?}, {} days", config.window.mode, config.window.length_days);
    println!(
        "  Min samples: star chef {}, leaders {}, dishes {}",
        config.thresholds.top_chef, config.thresholds.leader, config.thresholds.dish
    );
    println!("  Cache TTL: {}s", config.cache.ttl_seconds);
    println!();
    println!("Summaries:");
    println!("  Model: {}", config.gateway.model);
    println!("  Row cap: {}", config.gateway.row_cap);

    // Mirror details are admin-only
    if ctx.admin {
        let mirror = service.mirror_diagnostics();
        println!();
        println!("Spreadsheet mirror:");
        println!("  Configured: {}", mirror.configured);
        println!("  Sheet id: {}", mirror.sheet_id.as_deref().unwrap_or("none"));
        println!("  Token present: {}", mirror.token_present);
        if let Some(link) = &mirror.sheet_link {
            println!("  Link: {}", link);
        }
    }
    Ok(())
}
