//! Shared helper functions for CLI commands
//!
//! Database path resolution, config loading and request context
//! construction used by every subcommand.

use food_quality_core::{
    error::Result, AppConfig, Credentials, QualityService, RequestContext, Role,
};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Options shared by every subcommand
#[derive(Debug, Clone, Default)]
pub struct GlobalOpts {
    pub db_path: Option<String>,
    pub config: Option<PathBuf>,
    pub role: Option<Role>,
    pub branch: Option<String>,
    pub admin_password: Option<String>,
}

/// Get the default database path using XDG_DATA_HOME standard
pub fn get_default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("food-quality")
        .join("food_quality.db")
}

/// Database path from CLI arg, env var, config file, or default
pub fn get_db_path(cli_path: Option<String>, config: &AppConfig) -> String {
    cli_path
        .or_else(|| {
            std::env::var("FOOD_QUALITY_DB_PATH")
                .ok()
                .filter(|p| !p.is_empty())
        })
        .or_else(|| config.database.path.clone())
        .unwrap_or_else(|| get_default_db_path().to_string_lossy().to_string())
}

pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    AppConfig::load(path)
}

/// Request context from `--role`, `--branch` and `--admin-password`
pub fn build_context(opts: &GlobalOpts, service: &QualityService) -> Result<RequestContext> {
    let ctx = RequestContext::anonymous();

    let ctx = match (opts.role, opts.branch.as_deref()) {
        (Some(Role::Branch), Some(branch)) => ctx.sign_in_branch(branch)?,
        (Some(Role::Branch), None) => ctx.sign_in_branch("")?,
        (Some(Role::Headquarters), _) => ctx.sign_in_headquarters(),
        (None, _) => ctx,
    };

    let ctx = match opts.admin_password.as_deref() {
        Some(password) => service.elevate_admin(&ctx, password)?,
        None => ctx,
    };

    debug!("Request context: {:?}", ctx);
    Ok(ctx)
}

/// Load config, open the service and build the caller's context
pub async fn open_service(opts: &GlobalOpts) -> Result<(QualityService, RequestContext)> {
    let config = load_config(opts.config.as_deref())?;
    let db_path = get_db_path(opts.db_path.clone(), &config);
    debug!("Database path: {}", db_path);

    let service = QualityService::open(&db_path, config, Credentials::from_env()).await?;
    let ctx = build_context(opts, &service)?;
    Ok((service, ctx))
}
