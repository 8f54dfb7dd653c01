//! Per-slice resource estimates

use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;
use spkplan_core::{
    PlanningConfig, Population, ResourceBudgetCalculator, ResourceEstimate, SdramBreakdown,
    VertexSlice,
};
use tracing::{debug, info};

use super::planning_config;
use crate::error::CliResult;
use crate::network::NetworkSpec;

/// Estimate the resources of every core of every population
#[derive(Args, Debug)]
pub struct EstimateCommand {
    /// Network description file
    #[arg(short, long)]
    pub network: PathBuf,

    /// Machine timestep in microseconds, overriding the configuration
    #[arg(long)]
    pub timestep_us: Option<f64>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Estimates for a whole network
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    /// Timestep the estimates were made for
    pub timestep_us: f64,
    /// Run length recording buffers were sized for
    pub n_machine_time_steps: u64,
    /// DTCM one-to-one connections may occupy per core
    pub one_to_one_connection_dtcm_max_bytes: u64,
    /// One entry per population, in file order
    pub populations: Vec<PopulationReport>,
}

/// Estimates for one population
#[derive(Debug, Clone, Serialize)]
pub struct PopulationReport {
    /// Population label
    pub label: String,
    /// Neuron model name
    pub neuron: String,
    /// Number of neurons
    pub n_atoms: u32,
    /// Incoming projections
    pub n_projections: usize,
    /// Incoming spike buffer size
    pub incoming_spike_buffer_size: u32,
    /// Whether late spikes are dropped
    pub drop_late_spikes: bool,
    /// One entry per core
    pub slices: Vec<SliceReport>,
}

/// Estimate for one core
#[derive(Debug, Clone, Serialize)]
pub struct SliceReport {
    /// First atom
    pub lo_atom: u32,
    /// One past the last atom
    pub hi_atom: u32,
    /// SDRAM by region
    pub sdram: SdramBreakdown,
    /// Sum of all regions
    pub sdram_total: u64,
    /// Working memory
    pub dtcm_bytes: u64,
    /// Cycles per tick
    pub cpu_cycles: u64,
    /// Ring-buffer shift of each synapse type
    pub ring_buffer_shifts: Vec<ShiftReport>,
}

/// Shift of one synapse type
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ShiftReport {
    /// Synapse type
    pub synapse_type: u32,
    /// Left shift
    pub shift: u32,
    /// Weight scale
    pub weight_scale: f64,
}

impl From<ResourceEstimate> for SliceReport {
    fn from(estimate: ResourceEstimate) -> Self {
        Self {
            lo_atom: estimate.slice.lo_atom(),
            hi_atom: estimate.slice.hi_atom(),
            sdram_total: estimate.sdram.total(),
            sdram: estimate.sdram,
            dtcm_bytes: estimate.dtcm_bytes,
            cpu_cycles: estimate.cpu_cycles,
            ring_buffer_shifts: estimate
                .ring_buffer_shifts
                .iter()
                .map(|s| ShiftReport {
                    synapse_type: s.synapse_type,
                    shift: s.shift,
                    weight_scale: s.weight_scale,
                })
                .collect(),
        }
    }
}

/// Split every population into cores and estimate each core
pub fn plan_network(
    populations: &mut [Population],
    config: &PlanningConfig,
) -> CliResult<PlanReport> {
    let calculator = ResourceBudgetCalculator::new(config.simulation.timestep_us);
    let mut reports = Vec::with_capacity(populations.len());

    for population in populations.iter_mut() {
        let slices = VertexSlice::split(population.n_atoms(), population.max_atoms_per_core())?;
        debug!("{} split into {} slices", population.label(), slices.len());

        let estimates: Vec<SliceReport> = slices
            .iter()
            .map(|slice| SliceReport::from(calculator.estimate(population, slice)))
            .collect();

        reports.push(PopulationReport {
            label: population.label().to_string(),
            neuron: population.neuron().name().to_string(),
            n_atoms: population.n_atoms(),
            n_projections: population.projections().len(),
            incoming_spike_buffer_size: population.incoming_spike_buffer_size(),
            drop_late_spikes: population.drop_late_spikes(),
            slices: estimates,
        });
    }

    Ok(PlanReport {
        timestep_us: config.simulation.timestep_us,
        n_machine_time_steps: config.simulation.n_machine_time_steps,
        one_to_one_connection_dtcm_max_bytes: config
            .simulation
            .one_to_one_connection_dtcm_max_bytes,
        populations: reports,
    })
}

impl EstimateCommand {
    /// Run the command
    pub fn execute(self, config: Option<&Path>) -> CliResult<()> {
        let config = planning_config(config, self.timestep_us)?;
        let mut populations = NetworkSpec::load(&self.network)?.build(&config)?;
        info!(
            "Estimating {} populations at {} us per tick",
            populations.len(),
            config.simulation.timestep_us
        );

        let report = plan_network(&mut populations, &config)?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_report(&report);
        }
        Ok(())
    }
}

fn print_report(report: &PlanReport) {
    for pop in &report.populations {
        println!(
            "{} ({}, {} atoms, {} projections, {} cores)",
            pop.label,
            pop.neuron,
            pop.n_atoms,
            pop.n_projections,
            pop.slices.len()
        );
        for slice in &pop.slices {
            println!(
                "  [{}:{}) sdram {} bytes, dtcm {} bytes, {} cycles",
                slice.lo_atom, slice.hi_atom, slice.sdram_total, slice.dtcm_bytes, slice.cpu_cycles
            );
            for (region, bytes) in slice.sdram.regions() {
                if bytes > 0 {
                    println!("    {:<20} {:>10}", region, bytes);
                }
            }
        }
    }
}
