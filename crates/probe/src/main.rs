//! gimic-usb-test
//!
//! Bulk-transfer smoke test for the GIMIC. Lists USB devices, reports the
//! GIMIC's descriptors, then sends a hard reset and two status queries and
//! dumps the responses.

use anyhow::{Context, Result};
use clap::Parser;
use common::setup_logging;
use gimic_usb_test::config;
use gimic_usb_test::sequencer::{ProbeOptions, Sequencer};
use gimic_usb_test::usb::Transport;
use std::process::ExitCode;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "gimic-usb-test")]
#[command(author, version, about = "GIMIC USB bulk-transfer smoke test")]
#[command(long_about = "
Finds the GIMIC (16c0:05e5), claims interface 0 and runs a fixed
hard-reset / status-query exchange over bulk endpoints 2 and 5.
Responses are printed as hex.

EXAMPLES:
    # Run the probe
    gimic-usb-test

    # Only list devices and descriptors
    gimic-usb-test --list-devices

    # Run with debug logging
    gimic-usb-test --log-level debug

CONFIGURATION:
    The probe looks for configuration in the following order:
    1. Path specified with --config
    2. ~/.config/gimic-usb-test/probe.toml
    3. Built-in defaults

Exit status is 1 when the USB session, device listing, interface claim
or interface release fails, 0 otherwise.
")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<String>,

    /// Save default configuration to default location and exit
    #[arg(long)]
    save_config: bool,

    /// List USB devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let args = Args::parse();

    if args.save_config {
        let config = config::ProbeConfig::default();
        let path = config::ProbeConfig::default_path();
        config.save(&path).context("Failed to save configuration")?;
        println!("Configuration saved to: {}", path.display());
        return Ok(ExitCode::SUCCESS);
    }

    let config = if let Some(ref path) = args.config {
        config::load_config(path).context("Failed to load configuration")?
    } else {
        config::ProbeConfig::load_or_default()
    };

    let log_level = args
        .log_level
        .as_deref()
        .unwrap_or(&config.logging.level);

    setup_logging(log_level).context("Failed to setup logging")?;

    info!("gimic-usb-test v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Target {:04x}:{:04x}",
        config.target.vendor_id, config.target.product_id
    );

    let options = ProbeOptions {
        vendor_id: config.target.vendor_id,
        product_id: config.target.product_id,
        list_only: args.list_devices,
    };

    let stdout = std::io::stdout();
    let mut sequencer = Sequencer::new(options, stdout.lock());

    // The sequencer has already reported and logged whatever stopped it
    match sequencer.run(Transport::initialize(config.libusb_log_level())) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(_) => Ok(ExitCode::FAILURE),
    }
}
