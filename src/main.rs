//! Food Quality - kitchen quality tracker for a restaurant chain
//!
//! Command-line front end: submit quality checks, view aggregate reports,
//! ask for summaries and export the table.

mod cli;

use clap::{Parser, Subcommand};
use food_quality_core::{error::Result, MinSampleOverrides, Role, Scope};
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::{self, EnvFilter};

use cli::config::ConfigAction;
use cli::helpers::GlobalOpts;
use cli::report::{ModeArg, ReportArgs, ReportFormat};

#[derive(Parser)]
#[command(name = "food-quality")]
#[command(about = "Kitchen quality checks for a restaurant chain", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Set log level
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Database path (overrides FOOD_QUALITY_DB_PATH env var and default)
    #[arg(long, global = true)]
    db_path: Option<String>,

    /// Configuration file (defaults to ./food-quality.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Sign in as `branch` or `hq`
    #[arg(long, global = true)]
    role: Option<Role>,

    /// Branch to sign in as, or the branch headquarters submits for
    #[arg(long, global = true)]
    branch: Option<String>,

    /// Elevate to admin (export, mirror diagnostics)
    #[arg(long, global = true, env = "FOOD_QUALITY_ADMIN", hide_env_values = true)]
    admin_password: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init {
        /// Database path (overrides global --db-path)
        #[arg(long)]
        database: Option<String>,
    },

    /// Record a quality check
    Submit {
        /// Chef name
        #[arg(short, long)]
        chef: String,

        /// Dish name
        #[arg(short, long)]
        dish: String,

        /// Score from 1 to 10
        #[arg(short, long)]
        score: i64,

        /// Free-text notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Show averages, leaders and deltas for a window
    Report {
        /// `network` or `branch:<name>` (defaults to the signed-in branch)
        #[arg(long)]
        scope: Option<Scope>,

        /// Window mode
        #[arg(short, long, value_enum)]
        mode: Option<ModeArg>,

        /// Rolling window length in days
        #[arg(long)]
        days: Option<i64>,

        /// Minimum checks for the star chef headline
        #[arg(long)]
        min_top_chef: Option<usize>,

        /// Minimum checks for best/worst chef and branch
        #[arg(long)]
        min_leader: Option<usize>,

        /// Minimum checks for best/worst dish
        #[arg(long)]
        min_dish: Option<usize>,

        /// Compare one dish between network and branch
        #[arg(long)]
        dish: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: ReportFormat,
    },

    /// Summarize trends, or answer a question about the data
    Ask {
        /// Question (omit for a general summary)
        question: Option<String>,

        /// `network` or `branch:<name>`
        #[arg(long)]
        scope: Option<Scope>,
    },

    /// Export all records as CSV (admin)
    Export {
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Show database and configuration status
    Status,

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Specified level for our crates, WARN for noisy HTTP internals
    let filter = EnvFilter::new(format!(
        "food_quality={lvl},food_quality_core={lvl},hyper=warn,reqwest=warn",
        lvl = level.as_str().to_lowercase()
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // Write logs to stderr, not stdout
        .init();

    debug!("Food Quality v{} starting...", env!("CARGO_PKG_VERSION"));

    let opts = GlobalOpts {
        db_path: cli.db_path,
        config: cli.config,
        role: cli.role,
        branch: cli.branch,
        admin_password: cli.admin_password,
    };

    match cli.command {
        Commands::Init { database } => cli::init::handle(database, &opts).await,
        Commands::Submit {
            chef,
            dish,
            score,
            notes,
        } => cli::submit::handle(chef, dish, score, notes, &opts).await,
        Commands::Report {
            scope,
            mode,
            days,
            min_top_chef,
            min_leader,
            min_dish,
            dish,
            format,
        } => {
            let args = ReportArgs {
                scope,
                mode,
                days,
                overrides: MinSampleOverrides {
                    top_chef: min_top_chef,
                    leader: min_leader,
                    dish: min_dish,
                },
                dish,
                format,
            };
            cli::report::handle(args, &opts).await
        }
        Commands::Ask { question, scope } => cli::ask::handle(question, scope, &opts).await,
        Commands::Export { output } => cli::export::handle(output, &opts).await,
        Commands::Status => cli::status::handle(&opts).await,
        Commands::Config { action } => cli::config::handle(action, &opts).await,
    }
}
