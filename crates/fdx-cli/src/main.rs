use anyhow::Result;
use clap::{Args, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "fdx")]
#[command(about = "EDSM first-discovery harvester", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

/// Options shared by every command that works on the caches.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Layered config paths in merge order (repeatable). Built-in defaults
    /// apply when none are given.
    #[arg(long = "config")]
    pub config_paths: Vec<String>,

    /// Range start (YYYY-MM-DD). Overrides harvest.start_date.
    #[arg(long)]
    pub start: Option<String>,

    /// Range end, exclusive (YYYY-MM-DD or RFC 3339). Defaults to now.
    #[arg(long)]
    pub end: Option<String>,

    /// Trailing weeks re-fetched every run. Overrides harvest.safety_weeks.
    #[arg(long)]
    pub safety_weeks: Option<u32>,

    /// Fail instead of warn when the config carries keys nothing reads.
    #[arg(long, default_value_t = false)]
    pub strict: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> overrides...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Show what a harvest would fetch. No network, nothing persisted.
    Plan {
        #[command(flatten)]
        args: RunArgs,
    },

    /// Reconcile first discoveries, enrich with traffic, export the report
    Harvest {
        #[command(flatten)]
        args: RunArgs,

        /// Stop after the discovery pass
        #[arg(long, default_value_t = false)]
        skip_traffic: bool,
    },

    /// Refresh traffic for every known system and export the report
    Enrich {
        #[command(flatten)]
        args: RunArgs,
    },

    /// Export the report from the caches only (no network)
    Report {
        #[command(flatten)]
        args: RunArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials may live in .env.local (preferred) or .env; real env wins.
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::dotenv();

    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = fdx_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
        Commands::Plan { args } => commands::harvest::run_plan(&args)?,
        Commands::Harvest { args, skip_traffic } => {
            commands::harvest::run_harvest(&args, skip_traffic).await?
        }
        Commands::Enrich { args } => commands::report::run_enrich(&args).await?,
        Commands::Report { args } => commands::report::run_report(&args)?,
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
