//! CLI entry point for the arrival board publisher.
//!
//! `serve` runs the auto-refresh scheduler alongside the HTTP trigger
//! surface; the other subcommands run single steps by hand.

use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use arrival_board::catalog::{CatalogApi, CatalogClient, example_items};
use arrival_board::config::{Board, Config, DEFAULT_FEED_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use arrival_board::fetch::{ApiKey, BasicClient};
use arrival_board::parser::{fetch_feed, parse_feed, trip_updates};
use arrival_board::pipeline::UpdatePipeline;
use arrival_board::scheduler::UpdateScheduler;
use arrival_board::selector::select_arrivals;
use arrival_board::server::{self, AppState};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "arrival_board")]
#[command(about = "Publishes upcoming subway arrivals to a display catalog", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh the catalog on a schedule and serve the trigger endpoints
    Serve,
    /// Run a single fetch-and-publish cycle
    Once,
    /// Print the selected arrivals without publishing
    Arrivals {
        /// Path to a .pb file or URL to fetch (defaults to FEED_URL)
        #[arg(short, long, value_name = "FILE_OR_URL")]
        source: Option<String>,
    },
    /// Publish the fixed example items
    Trigger,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _log_guard = init_tracing()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => serve(Config::from_env()?).await?,
        Commands::Once => {
            let config = Config::from_env()?;
            let pipeline = build_pipeline(&config)?;
            let result = pipeline.run_once().await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Arrivals { source } => {
            let source = source
                .or_else(|| std::env::var("FEED_URL").ok())
                .unwrap_or_else(|| DEFAULT_FEED_URL.to_string());
            print_arrivals(&source).await?;
        }
        Commands::Trigger => {
            let config = Config::from_env()?;
            let catalog = build_catalog(&config)?;
            let result = catalog.publish(&example_items(&config.board)).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

/// Logging setup: colored stderr + JSON rolling log file.
fn init_tracing() -> Result<WorkerGuard> {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/arrival_board.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("arrival_board.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(file_guard)
}

fn build_catalog(config: &Config) -> Result<CatalogClient<ApiKey<BasicClient>>> {
    let http = ApiKey::new(
        BasicClient::new(config.request_timeout)?,
        &config.catalog.api_key_header,
        &config.catalog.api_key,
    )?;
    Ok(CatalogClient::new(
        http,
        &config.catalog.domain,
        &config.catalog.group,
    ))
}

fn build_pipeline(
    config: &Config,
) -> Result<UpdatePipeline<BasicClient, CatalogClient<ApiKey<BasicClient>>>> {
    Ok(UpdatePipeline::new(
        BasicClient::new(config.request_timeout)?,
        &config.feed_url,
        config.board.clone(),
        build_catalog(config)?,
    ))
}

/// Starts the scheduler, serves HTTP until Ctrl+C, then stops the scheduler.
#[tracing::instrument(skip_all, fields(port = config.port, group = %config.catalog.group))]
async fn serve(config: Config) -> Result<()> {
    let mut scheduler = UpdateScheduler::new(build_pipeline(&config)?, config.refresh_interval);

    let state = AppState {
        catalog: Arc::new(build_catalog(&config)?),
        board: config.board.clone(),
        monitor: scheduler.monitor(),
    };

    scheduler.start();

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!(port = config.port, "HTTP server listening");

    axum::serve(listener, server::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop();
    info!(stats = ?scheduler.stats(), "Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

/// Loads feed data from a local file path or fetches it over HTTP, then
/// prints what the board would show.
#[tracing::instrument]
async fn print_arrivals(source: &str) -> Result<()> {
    let feed = if source.starts_with("http") {
        let client = BasicClient::new(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))?;
        fetch_feed(&client, source).await?
    } else {
        parse_feed(&std::fs::read(source)?)?
    };

    let board = Board::greenpoint_av();
    let arrivals = select_arrivals(&trip_updates(&feed), &board, Utc::now().timestamp());
    println!("{}", serde_json::to_string_pretty(&arrivals)?);
    Ok(())
}
