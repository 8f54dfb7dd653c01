//! CLI command implementations for spkplan

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use spkplan_core::PlanningConfig;

use crate::config::load_planning_config;
use crate::error::{CliError, CliResult};

pub mod estimate;
pub mod shifts;

/// spkplan - per-core resource planning for spiking populations
#[derive(Parser, Debug)]
#[command(
    name = "spkplan",
    version,
    about = "Per-core resource planning for spiking neural networks",
    long_about = "spkplan sizes the memory regions, working memory and cycle budget of \
                  every core a spiking population is split across, and computes the \
                  ring-buffer shifts that keep its synaptic input in range."
)]
pub struct PlanCli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Planning configuration file
    #[arg(short, long, global = true, env = "SPKPLAN_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Estimate the resources of every core of every population
    Estimate(estimate::EstimateCommand),

    /// Print ring-buffer shifts and weight scales
    Shifts(shifts::ShiftsCommand),
}

impl PlanCli {
    /// Execute the CLI command
    pub fn execute(self) -> CliResult<()> {
        let config = self.config.as_deref();
        match self.command {
            Commands::Estimate(cmd) => cmd.execute(config),
            Commands::Shifts(cmd) => cmd.execute(config),
        }
    }
}

/// Load the configuration and apply a command-line timestep override
pub(crate) fn planning_config(
    path: Option<&Path>,
    timestep_us: Option<f64>,
) -> CliResult<PlanningConfig> {
    let mut config = load_planning_config(path)?;
    if let Some(timestep_us) = timestep_us {
        config.simulation.timestep_us = timestep_us;
        config
            .validate()
            .map_err(|e| CliError::config(e.to_string()))?;
    }
    Ok(config)
}
