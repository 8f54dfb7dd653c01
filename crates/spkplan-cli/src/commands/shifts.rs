//! Ring-buffer shift report

use std::path::{Path, PathBuf};

use clap::Args;
use tracing::info;

use super::planning_config;
use crate::error::CliResult;
use crate::network::NetworkSpec;

/// Print ring-buffer shifts and weight scales
#[derive(Args, Debug)]
pub struct ShiftsCommand {
    /// Network description file
    #[arg(short, long)]
    pub network: PathBuf,

    /// Machine timestep in microseconds, overriding the configuration
    #[arg(long)]
    pub timestep_us: Option<f64>,
}

impl ShiftsCommand {
    /// Run the command
    pub fn execute(self, config: Option<&Path>) -> CliResult<()> {
        let config = planning_config(config, self.timestep_us)?;
        let timestep_us = config.simulation.timestep_us;
        let mut populations = NetworkSpec::load(&self.network)?.build(&config)?;
        info!("Solving ring-buffer shifts for {} populations", populations.len());

        for population in populations.iter_mut() {
            println!(
                "{} (sigma {}, {} spikes/s)",
                population.label(),
                population.ring_buffer_sigma(),
                population.spikes_per_second()
            );
            for shift in population.ring_buffer_shifts(timestep_us) {
                println!(
                    "  synapse type {}: shift {}, weight scale {}",
                    shift.synapse_type, shift.shift, shift.weight_scale
                );
            }
        }
        Ok(())
    }
}
