//! Aggregate view command

use clap::ValueEnum;
use food_quality_core::{error::Result, MinSampleOverrides, Scope, WindowMode};

use super::helpers::{open_service, GlobalOpts};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Rolling,
    Calendar,
}

/// Report options taken from the command line
#[derive(Debug, Clone)]
pub struct ReportArgs {
    pub scope: Option<Scope>,
    pub mode: Option<ModeArg>,
    pub days: Option<i64>,
    pub overrides: MinSampleOverrides,
    pub dish: Option<String>,
    pub format: ReportFormat,
}

/// Handle aggregate view command
pub async fn handle(args: ReportArgs, opts: &GlobalOpts) -> Result<()> {
    let (service, ctx) = open_service(opts).await?;

    let mut request = service.default_request(&ctx)?;
    if let Some(scope) = args.scope {
        request.scope = scope;
    }
    request.window_mode = match (args.mode, args.days) {
        (Some(ModeArg::Calendar), _) => WindowMode::Calendar,
        (_, Some(days)) => WindowMode::rolling_days(days)?,
        (Some(ModeArg::Rolling), None) => {
            WindowMode::rolling_days(service.config().window.length_days)?
        }
        (None, None) => request.window_mode,
    };
    request.min_sample_overrides = args.overrides;
    request.focus_dish = args
        .dish
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    let report = service.aggregate_view(&ctx, request).await?;

    match args.format {
        ReportFormat::Text => print!("{}", report.render_text()),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}
