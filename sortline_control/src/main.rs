//! # SORTLINE Control
//!
//! Runs a simulated inspection lane: carriers are fed onto the route, each
//! station captures a synthetic sample of the carrier dwelling at its capture
//! point, hands it to the configured classifier process and routes the
//! carrier on the verdict.

use clap::Parser;
use sortline_common::config::ConfigError;
use sortline_control::config::{LineConfig, load_config};
use sortline_control::cycle::LineRunner;
use sortline_control::error::LineError;
use std::path::PathBuf;
use std::process;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

/// SORTLINE Control: simulated inspection lane
#[derive(Parser, Debug)]
#[command(name = "sortline_control")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Carrier motion and capture/classify control for an inspection lane")]
struct Args {
    /// Path to the line configuration TOML.
    #[arg(default_value = sortline_common::consts::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,

    /// Override the number of carriers to feed (0 = unbounded).
    #[arg(long)]
    carriers: Option<u64>,

    /// Stop after this many milliseconds.
    #[arg(long, value_name = "MS")]
    run_for_ms: Option<u64>,
}

fn main() {
    let args = Args::parse();
    let loaded = load_config(&args.config);

    let configured = loaded
        .as_ref()
        .map(|c| c.shared.log_level.as_tracing())
        .unwrap_or(Level::INFO);
    setup_tracing(&args, configured);

    info!("SORTLINE Control v{} starting...", env!("CARGO_PKG_VERSION"));

    let result = loaded
        .map_err(|e| config_error(&args, e))
        .and_then(|config| run(&args, config));
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("SORTLINE Control shutdown complete");
}

fn run(args: &Args, mut config: LineConfig) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(count) = args.carriers {
        config.simulation.carrier_count = count;
    }
    if args.run_for_ms.is_some() {
        config.simulation.run_for_ms = args.run_for_ms;
    }

    info!(
        service = %config.shared.service_name,
        stations = config.stations.len(),
        tick_hz = config.scheduler.tick_hz,
        carriers = config.simulation.carrier_count,
        "Config OK"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(LineError::Runtime)?;

    let stats = runtime.block_on(async {
        let mut runner = LineRunner::from_config(&config)?;
        let shutdown = async {
            if tokio::signal::ctrl_c().await.is_err() {
                // No signal handler: run until the feed or run time ends.
                std::future::pending::<()>().await;
            }
            info!("Received shutdown signal");
        };
        Ok::<_, LineError>(runner.run(shutdown).await)
    })?;

    if args.json {
        info!(summary = %serde_json::to_string(&stats)?, "line summary");
    } else {
        stats.log_summary();
    }
    Ok(())
}

fn config_error(args: &Args, e: ConfigError) -> Box<dyn std::error::Error> {
    match e {
        ConfigError::FileNotFound => format!("configuration file not found: {}", args.config.display()).into(),
        other => Box::new(LineError::from(other)),
    }
}

fn setup_tracing(args: &Args, configured: Level) {
    let level = if args.verbose { Level::DEBUG } else { configured };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
