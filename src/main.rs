//! Crashprobe process entry point.
//!
//! Reads configuration from the environment once, initializes logging and
//! the telemetry bridge, then serves the HTTP surface until interrupted.

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crashprobe::config::{AppConfig, DEFAULT_BIND_ADDR, DEFAULT_SECRET_KEY};
use crashprobe::error::Result;
use crashprobe::server::{HttpServer, ServerContext};
use crashprobe::telemetry;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Crashprobe - deliberate-crash web app for monitoring pipeline validation
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Telemetry connection string (absence disables telemetry export)
    #[arg(long, env = "TELEMETRY_CONNECTION_STRING", hide_env_values = true)]
    telemetry_connection_string: Option<String>,

    /// Session signing secret; not used by any endpoint, kept for
    /// deployment parity
    #[arg(
        long,
        env = "SECRET_KEY",
        default_value = DEFAULT_SECRET_KEY,
        hide_env_values = true
    )]
    secret_key: String,

    /// Enable debug mode (verbose logging)
    #[arg(long, env = "DEBUG")]
    debug: bool,

    /// HTTP bind address
    #[arg(long, env = "BIND_ADDR", default_value = DEFAULT_BIND_ADDR)]
    bind_addr: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    info!("Starting crashprobe");
    info!("  Bind address: {}", args.bind_addr);
    info!("  Debug mode: {}", args.debug);
    info!("Remember to set TELEMETRY_CONNECTION_STRING for telemetry export.");

    let config = AppConfig {
        telemetry_connection_string: args.telemetry_connection_string.clone(),
        secret_key: args.secret_key.clone(),
        debug: args.debug,
        bind_addr: args.bind_addr.clone(),
    };

    if config.uses_default_secret() {
        warn!("SECRET_KEY left at its development default");
    }

    // Decided once here, frozen for the process lifetime.
    let telemetry = telemetry::init(&config);
    if telemetry.is_enabled() {
        info!("Telemetry middleware initialized successfully.");
    }

    let server = HttpServer::bind(&config.bind_addr).await?;
    let ctx = Arc::new(ServerContext::new(telemetry.sink()));

    tokio::select! {
        result = server.serve(ctx) => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutdown signal received"),
    }

    telemetry.shutdown();
    info!("Shutdown complete");
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = if args.debug {
        Level::DEBUG
    } else {
        match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("reqwest=warn".parse().unwrap());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}
