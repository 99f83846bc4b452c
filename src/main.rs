//! TODO service entry point.

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use todo_api::api::{create_router, AppState};
use todo_api::config::Config;
use todo_api::error::AppError;
use todo_api::metrics;
use todo_api::service::{self, TodoService};
use todo_api::utils::shutdown_signal;

/// Minimal TODO list REST service.
#[derive(Parser, Debug)]
#[command(name = "todo-api")]
#[command(about = "REST service for creating, listing, updating and deleting TODOs")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// HTTP listen port (overrides PORT).
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// SQLite URL (overrides DATABASE_URL).
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default).
    Serve,

    /// Create the database and schema, then exit.
    InitDb,

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Loaded before logging starts so RUST_LOG from .env drives the filter.
    let loaded = Config::load();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(log_filter(loaded.as_ref().ok(), args.verbose))
        .init();

    let config = finish_config(&args, loaded)?;

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(&config),
        Some(Command::InitDb) => cmd_init_db(&config).await,
        Some(Command::Serve) | None => cmd_serve(&config).await,
    }
}

/// Build the log filter from the configured level; `--verbose` wins.
fn log_filter(config: Option<&Config>, verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("todo_api=debug,tower_http=debug,info");
    }
    config
        .and_then(|config| EnvFilter::try_new(&config.rust_log).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Apply CLI overrides to the environment configuration and validate it.
fn finish_config(
    args: &Args,
    loaded: Result<Config, envy::Error>,
) -> anyhow::Result<Config> {
    let mut config = loaded.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        AppError::Config(e)
    })?;

    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(url) = &args.database_url {
        config.database_url = url.clone();
    }

    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        AppError::InvalidConfig(e)
    })?;

    Ok(config)
}

/// Print the effective configuration.
fn cmd_check_config(config: &Config) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("TODO API - CONFIGURATION CHECK");
    println!("======================================================================");
    println!("  Database URL: {}", config.database_url);
    println!("  Max Connections: {}", config.db_max_connections);
    println!("  Port: {}", config.port);
    println!("  Request Timeout: {}s", config.request_timeout_secs);
    println!("  Log Level: {}", config.rust_log);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");
    Ok(())
}

/// Create the database file and schema.
async fn cmd_init_db(config: &Config) -> anyhow::Result<()> {
    let pool = service::open(config).await?;
    pool.close().await;

    info!("Database initialized at {}", config.database_url);
    Ok(())
}

/// Serve the HTTP API until a shutdown signal arrives.
async fn cmd_serve(config: &Config) -> anyhow::Result<()> {
    let prometheus = metrics::init_metrics();

    let pool = service::open(config).await?;

    let state = AppState::new(TodoService::new(pool.clone()))
        .with_metrics(prometheus)
        .with_request_timeout(config.request_timeout());
    let router = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await.map_err(AppError::Io)?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    info!("Server stopped");
    Ok(())
}
