//! Configuration inspection command

use clap::Subcommand;
use food_quality_core::error::Result;

use super::helpers::{get_db_path, load_config, GlobalOpts};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,

    /// Print the resolved database path
    DbPath,
}

/// Handle configuration command
pub async fn handle(action: ConfigAction, opts: &GlobalOpts) -> Result<()> {
    let config = load_config(opts.config.as_deref())?;

    match action {
        ConfigAction::Show => {
            print!("{}", config.to_toml()?);
        }
        ConfigAction::DbPath => {
            println!("{}", get_db_path(opts.db_path.clone(), &config));
        }
    }
    Ok(())
}
