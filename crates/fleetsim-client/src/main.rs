// ============================================
// File: crates/fleetsim-client/src/main.rs
// ============================================
//! # Fleetsim Entry Point
//!
//! ## Creation Reason
//! CLI for the device fleet simulator: parses arguments, initializes
//! logging, and drives the fleet supervisor.
//!
//! ## Usage
//! ```bash
//! # Run a fleet of 50 devices performing one update each
//! fleetsim-client run --config fleetsim.toml -n 50
//!
//! # Run forever, failing every update with a message
//! fleetsim-client run -c 0 --fail "disk full"
//!
//! # Other commands
//! fleetsim-client validate --config fleetsim.toml
//! fleetsim-client token fleet-state/deadbeef0001.token
//! ```
//!
//! ## Last Modified
//! v0.1.0 - Initial CLI implementation

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fleetsim_api::{Credential, HttpDeviceApi};
use fleetsim_client::{FleetSupervisor, SimulatorConfig};

// ============================================
// CLI Definition
// ============================================

/// Device fleet simulator for a device-management backend.
#[derive(Parser, Debug)]
#[command(name = "fleetsim-client")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the device fleet
    Run {
        /// Path to configuration file
        #[arg(long, default_value = "fleetsim.toml")]
        config: PathBuf,

        /// Number of devices (overrides config)
        #[arg(short = 'n', long)]
        devices: Option<usize>,

        /// Updates per device before exiting, 0 = unlimited (overrides config)
        #[arg(short = 'c', long)]
        updates: Option<u32>,

        /// Fail every update with this message (overrides config)
        #[arg(short = 'f', long)]
        fail: Option<String>,

        /// Maximum wait between update phases in seconds (overrides config)
        #[arg(short = 'w', long)]
        max_wait: Option<u64>,
    },

    /// Validate a configuration file
    Validate {
        /// Path to configuration file
        #[arg(long, default_value = "fleetsim.toml")]
        config: PathBuf,
    },

    /// Inspect a persisted device credential
    Token {
        /// Path to the credential file
        path: PathBuf,
    },
}

// ============================================
// Main
// ============================================

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging("info");

    let result = match cli.command {
        Commands::Run {
            config,
            devices,
            updates,
            fail,
            max_wait,
        } => cmd_run(config, devices, updates, fail, max_wait).await,
        Commands::Validate { config } => cmd_validate(config).await,
        Commands::Token { path } => cmd_token(path),
    };

    if let Err(e) = result {
        error!("{}", e);
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

// ============================================
// Commands
// ============================================

/// Runs the fleet.
async fn cmd_run(
    config_path: PathBuf,
    devices: Option<usize>,
    updates: Option<u32>,
    fail: Option<String>,
    max_wait: Option<u64>,
) -> anyhow::Result<()> {
    let mut config = load_or_default_config(&config_path).await?;

    // CLI flags override the file for quick experiments
    if let Some(n) = devices {
        config.fleet.devices = n;
    }
    if let Some(c) = updates {
        config.fleet.updates = c;
    }
    if let Some(message) = fail {
        config.fleet.fail_message = Some(message);
    }
    if let Some(w) = max_wait {
        config.fleet.max_wait_secs = w;
    }
    config.validate()?;

    // Re-initialize logging with the configured level
    init_logging(&config.logging.level);

    let api = Arc::new(HttpDeviceApi::new(
        config.backend.server_url.clone(),
        Duration::from_secs(config.backend.request_timeout_secs),
    ));
    let settings = Arc::new(config.session_settings()?);

    let supervisor = FleetSupervisor::new(api, settings, config.fleet.devices);
    supervisor.run().await?;

    Ok(())
}

/// Validates a configuration file and prints a summary.
async fn cmd_validate(config_path: PathBuf) -> anyhow::Result<()> {
    if !config_path.exists() {
        println!("⚠️  Config file not found: {}", config_path.display());
        println!("   The simulator will use default values.");
        return Ok(());
    }

    let config = SimulatorConfig::load(&config_path).await?;

    println!("✅ Configuration is valid");
    println!();
    println!("Backend:");
    println!("   URL:          {}", config.backend.server_url);
    println!("   Timeout:      {}s", config.backend.request_timeout_secs);
    println!();
    println!("Fleet:");
    println!("   Devices:      {}", config.fleet.devices);
    match config.fleet.updates {
        0 => println!("   Updates:      unlimited"),
        n => println!("   Updates:      {n} per device"),
    }
    println!("   Max wait:     {}s", config.fleet.max_wait_secs);
    if let Some(message) = &config.fleet.fail_message {
        println!("   Forced fail:  \"{message}\"");
    }
    println!("   State dir:    {}", config.fleet.state_dir.display());
    println!();
    println!("Inventory:");
    println!("   Attributes:   {}", config.inventory.attributes.join(", "));
    println!("   Interval:     {}s", config.inventory.interval_secs);
    println!();

    Ok(())
}

/// Pretty-prints the segments of a persisted device credential.
fn cmd_token(path: PathBuf) -> anyhow::Result<()> {
    let credential = Credential::load(&path)
        .map_err(|e| anyhow::anyhow!("failed to load credential from {}: {e}", path.display()))?;

    let decoded = credential.claims()?;

    println!("type:");
    println!("\t{}", serde_json::to_string_pretty(&decoded.header)?);
    println!("claims:");
    println!("\t{}", serde_json::to_string_pretty(&decoded.claims)?);
    println!("signature:");
    println!("\t{}", decoded.signature);

    Ok(())
}

// ============================================
// Helper Functions
// ============================================

/// Initializes the tracing subscriber.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .try_init()
        .ok();
}

/// Loads config or returns defaults when the file does not exist.
async fn load_or_default_config(path: &PathBuf) -> anyhow::Result<SimulatorConfig> {
    if path.exists() {
        Ok(SimulatorConfig::load(path).await?)
    } else {
        Ok(SimulatorConfig::default())
    }
}
