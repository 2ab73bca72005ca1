//! Database initialization command

use food_quality_core::{error::Result, SqliteRecordStore};
use tracing::debug;

use super::helpers::{get_db_path, load_config, GlobalOpts};

/// Handle database initialization command
pub async fn handle(database: Option<String>, opts: &GlobalOpts) -> Result<()> {
    debug!("Initializing database...");

    let config = load_config(opts.config.as_deref())?;
    let db_path = get_db_path(database.or_else(|| opts.db_path.clone()), &config);
    debug!("Database path: {}", db_path);

    // Opening creates parent directories, the table and its indexes
    let _store = SqliteRecordStore::open(&db_path).await?;

    println!("✓ Database initialized: {}", db_path);
    Ok(())
}
