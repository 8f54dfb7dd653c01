//! Planner configuration
//!
//! Defaults for the values a population may leave unspecified, and the run
//! parameters that size recording buffers. The layout mirrors the
//! `[simulation]` / `[reports]` sections of a simulator configuration file so
//! it can be loaded straight from TOML.

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};

/// Complete planner configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningConfig {
    /// Simulation defaults
    pub simulation: SimulationConfig,
    /// Reporting options
    pub reports: ReportsConfig,
}

/// `[simulation]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Machine timestep in microseconds
    pub timestep_us: f64,
    /// Standard deviations above the mean used for the ring-buffer bound
    pub ring_buffer_sigma: f64,
    /// Assumed peak firing rate of incoming spikes (Hz)
    pub spikes_per_second: f64,
    /// Size of the incoming spike buffer per core
    pub incoming_spike_buffer_size: u32,
    /// Drop spikes that arrive after their timestep has passed
    pub drop_late_spikes: bool,
    /// DTCM that one-to-one connections may occupy per core
    pub one_to_one_connection_dtcm_max_bytes: u64,
    /// Run length recording buffers are sized for
    pub n_machine_time_steps: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            timestep_us: 1000.0,
            ring_buffer_sigma: 5.0,
            spikes_per_second: 30.0,
            incoming_spike_buffer_size: 256,
            drop_late_spikes: false,
            one_to_one_connection_dtcm_max_bytes: 0,
            n_machine_time_steps: 1000,
        }
    }
}

/// `[reports]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportsConfig {
    /// Number of profiling samples recorded per core
    pub n_profile_samples: u64,
}

impl PlanningConfig {
    /// Check that every value is usable
    pub fn validate(&self) -> Result<()> {
        let sim = &self.simulation;
        if !(sim.timestep_us.is_finite() && sim.timestep_us > 0.0) {
            return Err(PlanError::invalid_config(format!(
                "timestep_us must be finite and > 0, got {}",
                sim.timestep_us
            )));
        }
        if !(sim.ring_buffer_sigma.is_finite() && sim.ring_buffer_sigma > 0.0) {
            return Err(PlanError::invalid_config(format!(
                "ring_buffer_sigma must be finite and > 0, got {}",
                sim.ring_buffer_sigma
            )));
        }
        if !(sim.spikes_per_second.is_finite() && sim.spikes_per_second >= 0.0) {
            return Err(PlanError::invalid_config(format!(
                "spikes_per_second must be finite and >= 0, got {}",
                sim.spikes_per_second
            )));
        }
        Ok(())
    }
}
