//! # spkplan - per-core resource planning for spiking networks
//!
//! Loads a network description and prints what each core of each population
//! needs: SDRAM by region, working memory, cycles per tick and the
//! ring-buffer shifts it will be loaded with.

use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use spkplan_cli::PlanCli;

fn main() {
    let cli = PlanCli::parse();

    // RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Err(err) = cli.execute() {
        error!("Command failed: {}", err);
        std::process::exit(1);
    }
}
