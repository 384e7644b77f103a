//! # Strata - window stacking scenario tool
//!
//! Replays a TOML scenario of stacking operations on a simulated screen and
//! prints the resulting order, the screen's order and the request count.

use anyhow::Result;
use clap::Parser;
use log::{error, info};

use strata::config::StackConfig;
use strata::scenario::{self, Scenario};
use strata::StackingMode;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_COMMIT"),
    ", built ",
    env!("BUILD_DATE"),
    ")"
);

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Replay window stacking scenarios against a simulated screen")]
#[command(version, long_version = LONG_VERSION)]
struct Cli {
    /// Scenario file to replay
    scenario: String,

    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/strata/strata.toml")]
    config: String,

    /// Override the configured stacking mode (eager or deferred)
    #[arg(short, long)]
    mode: Option<StackingMode>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Configuration comes first so its log level can seed the logger
    let loaded = StackConfig::load(&cli.config);
    let config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => StackConfig::default(),
    };

    strata::logging::init(&config.logging, cli.debug);

    info!("Starting Strata v{}", strata::VERSION);
    match loaded {
        Ok(_) => info!("Configuration loaded from: {}", cli.config),
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            info!("Using default configuration");
        }
    }

    let mode = cli.mode.unwrap_or(config.stacking.mode);
    let scenario = Scenario::load(&cli.scenario)?;
    let report = scenario::run(&scenario, config.stacking.layers, mode)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report);
    }

    Ok(())
}
