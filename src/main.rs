//! AudioBreak Scraper main entry point
//!
//! Command-line interface that loads the configuration and serves the HTTP API.

use anyhow::Context;
use audiobreak_scraper::config::{load_config_with_hash, validate, Config};
use audiobreak_scraper::server::{run_server, AppState};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// AudioBreak Scraper: page extraction and media retrieval API
///
/// Extracts text and media from web pages, following pagination when
/// asked, and bundles selected media into downloadable ZIP archives.
#[derive(Parser, Debug)]
#[command(name = "audiobreak-scraper")]
#[command(version)]
#[command(about = "Page extraction and media retrieval API", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Override the configured bind address
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,

    /// Print the effective configuration and exit
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }
    validate(&config).context("Invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    serve(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("audiobreak_scraper=info,tower_http=info,warn"),
            1 => EnvFilter::new("audiobreak_scraper=debug,tower_http=debug,info"),
            2 => EnvFilter::new("audiobreak_scraper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the configuration the server would run with
fn handle_dry_run(config: &Config) {
    println!("=== AudioBreak Scraper Dry Run ===\n");

    println!("Server:");
    println!("  Bind address: {}", config.server.bind_address);
    println!("  Allowed origins ({}):", config.server.allowed_origins.len());
    for origin in &config.server.allowed_origins {
        println!("    * {}", origin);
    }

    println!("\nFetching:");
    println!("  User agent: {}", config.fetch.user_agent);
    println!("  Page timeout: {}s", config.fetch.page_timeout_secs);
    println!("  Asset timeout: {}s", config.fetch.asset_timeout_secs);
    println!("  Connect timeout: {}s", config.fetch.connect_timeout_secs);

    println!("\nJobs:");
    println!("  Progress poll interval: {}ms", config.jobs.poll_interval_ms);
    println!("  Sweep interval: {}s", config.jobs.sweep_interval_secs);
    println!("  Stale after: {}s", config.jobs.stale_after_secs);
    println!("  SSE keep-alive: {}s", config.jobs.keep_alive_secs);
    println!("  Scratch root: {}", config.jobs.scratch_root().display());
    println!("  Default archive name: {}", config.jobs.default_zip_name);

    println!("\n✓ Configuration is valid");
}

/// Runs the API until Ctrl-C, then stops background jobs
async fn serve(config: Config) -> anyhow::Result<()> {
    let addr = config
        .server
        .socket_addr()
        .context("Invalid bind address")?;

    let state = AppState::new(config).context("Failed to initialize service")?;
    let supervisor = state.supervisor.clone();
    supervisor.start_sweeper();

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    let on_shutdown = supervisor.clone();
    let shutdown = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown requested, stopping background jobs");
        // Workers mark their jobs failed, which ends any open progress streams
        on_shutdown.shutdown().await;
    };

    run_server(listener, state, shutdown)
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}
