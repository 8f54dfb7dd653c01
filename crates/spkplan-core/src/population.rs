//! A population of neurons and everything arriving at it
//!
//! The population owns its incoming projections and caches the ring-buffer
//! shifts derived from them. Every structural change bumps a generation
//! counter; the cache records the generation and timestep it was computed for
//! and is recomputed when either differs.

use std::sync::Arc;

use log::{debug, info};

use crate::config::PlanningConfig;
use crate::dynamics::SynapseDynamics;
use crate::error::{PlanError, Result};
use crate::neuron::NeuronCosts;
use crate::projection::{IncomingProjection, ProjectionId};
use crate::recorder::NeuronRecorder;
use crate::ring_buffer::{RingBufferScaleSolver, RingBufferShift};

/// Atoms per core when the population does not say otherwise
pub const DEFAULT_MAX_ATOMS_PER_CORE: u32 = 256;

/// Change that a placement layer holding cores of this population must react to
#[derive(Debug, Clone, PartialEq)]
pub enum PopulationEvent {
    /// A projection was added; mapping must be redone
    ProjectionAdded(ProjectionId),
    /// The merged synapse dynamics changed
    SynapseDynamicsChanged,
    /// The population was reset to its first timestep; cores must reload
    /// their data, or regenerate it when `data_generation` is set
    ReloadRequired {
        /// Whether synaptic data must be regenerated rather than reloaded
        data_generation: bool,
    },
}

#[derive(Debug, Clone)]
struct ShiftCache {
    generation: u64,
    timestep_bits: u64,
    shifts: Vec<RingBufferShift>,
}

/// Neurons of one model together with their incoming projections
#[derive(Debug, Clone)]
pub struct Population {
    label: String,
    n_atoms: u32,
    max_atoms_per_core: u32,
    neuron: Arc<dyn NeuronCosts>,
    recorder: NeuronRecorder,
    dynamics: SynapseDynamics,
    ring_buffer_sigma: f64,
    spikes_per_second: f64,
    incoming_spike_buffer_size: u32,
    drop_late_spikes: bool,
    n_profile_samples: u64,
    n_machine_time_steps: u64,
    projections: Vec<IncomingProjection>,
    generation: u64,
    shift_cache: Option<ShiftCache>,
    requires_mapping: bool,
    requires_data_generation: bool,
    has_reset_last: bool,
    events: Vec<PopulationEvent>,
}

impl Population {
    /// Create a population, taking unspecified values from `config`
    pub fn new(
        label: impl Into<String>,
        n_atoms: u32,
        neuron: Arc<dyn NeuronCosts>,
        config: &PlanningConfig,
    ) -> Result<Self> {
        if n_atoms == 0 {
            return Err(PlanError::invalid_parameter("n_atoms", "0", "> 0"));
        }
        let sim = &config.simulation;
        let recorder = NeuronRecorder::new(neuron.recordable_variables());
        Ok(Self {
            label: label.into(),
            n_atoms,
            max_atoms_per_core: DEFAULT_MAX_ATOMS_PER_CORE,
            neuron,
            recorder,
            dynamics: SynapseDynamics::Static,
            ring_buffer_sigma: sim.ring_buffer_sigma,
            spikes_per_second: sim.spikes_per_second,
            incoming_spike_buffer_size: sim.incoming_spike_buffer_size,
            drop_late_spikes: sim.drop_late_spikes,
            n_profile_samples: config.reports.n_profile_samples,
            n_machine_time_steps: sim.n_machine_time_steps,
            projections: Vec::new(),
            generation: 0,
            shift_cache: None,
            requires_mapping: true,
            requires_data_generation: false,
            has_reset_last: true,
            events: Vec::new(),
        })
    }

    /// Limit the atoms placed on one core
    pub fn with_max_atoms_per_core(mut self, max_atoms_per_core: u32) -> Result<Self> {
        if max_atoms_per_core == 0 {
            return Err(PlanError::invalid_parameter("max_atoms_per_core", "0", "> 0"));
        }
        self.max_atoms_per_core = max_atoms_per_core;
        Ok(self)
    }

    /// Set the incoming spike buffer size
    pub fn with_incoming_spike_buffer_size(mut self, size: u32) -> Self {
        self.incoming_spike_buffer_size = size;
        self
    }

    /// Set whether late spikes are dropped
    pub fn with_drop_late_spikes(mut self, drop_late_spikes: bool) -> Self {
        self.drop_late_spikes = drop_late_spikes;
        self
    }

    fn invalidate(&mut self) {
        self.generation += 1;
        self.shift_cache = None;
    }

    /// Add a projection, merging its dynamics into the population's
    ///
    /// Nothing changes if the projection is invalid or its dynamics cannot be
    /// merged.
    pub fn add_projection(&mut self, projection: IncomingProjection) -> Result<ProjectionId> {
        projection.validate(self.neuron.n_synapse_types())?;
        let merged = self.dynamics.merge(projection.dynamics())?;
        let id = ProjectionId(self.projections.len() as u32);
        self.replace_dynamics(merged);
        self.projections.push(projection);
        self.requires_mapping = true;
        self.invalidate();
        self.events.push(PopulationEvent::ProjectionAdded(id));
        info!("{}: added {} from {}", self.label, id, self.projections[id.0 as usize].source().label());
        Ok(id)
    }

    /// Merge `dynamics` into the population's synapse dynamics
    pub fn set_synapse_dynamics(&mut self, dynamics: &SynapseDynamics) -> Result<()> {
        let merged = self.dynamics.merge(dynamics)?;
        self.replace_dynamics(merged);
        Ok(())
    }

    fn replace_dynamics(&mut self, merged: SynapseDynamics) {
        if merged != self.dynamics {
            debug!("{}: synapse dynamics {} -> {}", self.label, self.dynamics, merged);
            self.dynamics = merged;
            self.invalidate();
            self.events.push(PopulationEvent::SynapseDynamicsChanged);
        }
    }

    /// Change the number of standard deviations used for the ring-buffer bound
    pub fn set_ring_buffer_sigma(&mut self, sigma: f64) -> Result<()> {
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(PlanError::invalid_parameter(
                "ring_buffer_sigma",
                sigma.to_string(),
                "finite and > 0",
            ));
        }
        self.ring_buffer_sigma = sigma;
        self.invalidate();
        Ok(())
    }

    /// Change the assumed peak rate of sources without a known maximum
    pub fn set_spikes_per_second(&mut self, spikes_per_second: f64) -> Result<()> {
        if !(spikes_per_second.is_finite() && spikes_per_second >= 0.0) {
            return Err(PlanError::invalid_parameter(
                "spikes_per_second",
                spikes_per_second.to_string(),
                "finite and >= 0",
            ));
        }
        self.spikes_per_second = spikes_per_second;
        self.invalidate();
        Ok(())
    }

    /// Turn recording of a channel on or off
    pub fn set_recording(&mut self, name: &str, enabled: bool, sampling_interval: u32) -> Result<()> {
        let was_recording = self.recorder.is_recording(name);
        self.recorder.set_recording(name, enabled, sampling_interval)?;
        if enabled && !was_recording {
            self.requires_mapping = true;
        }
        Ok(())
    }

    /// Ring-buffer shift of every synapse type at `timestep_us`
    pub fn ring_buffer_shifts(&mut self, timestep_us: f64) -> &[RingBufferShift] {
        let timestep_bits = timestep_us.to_bits();
        let fresh = self
            .shift_cache
            .as_ref()
            .is_some_and(|c| c.generation == self.generation && c.timestep_bits == timestep_bits);
        if !fresh {
            debug!(
                "{}: computing ring-buffer shifts (generation {}, timestep {} us)",
                self.label, self.generation, timestep_us
            );
            let shifts = self.compute_ring_buffer_shifts(timestep_us);
            self.shift_cache = Some(ShiftCache {
                generation: self.generation,
                timestep_bits,
                shifts,
            });
        }
        match &self.shift_cache {
            Some(cache) => &cache.shifts,
            None => &[],
        }
    }

    /// Ring-buffer shifts computed afresh, bypassing the cache
    pub fn compute_ring_buffer_shifts(&self, timestep_us: f64) -> Vec<RingBufferShift> {
        RingBufferScaleSolver::new(self.ring_buffer_sigma, self.spikes_per_second).solve(
            &self.projections,
            self.n_atoms,
            self.neuron.as_ref(),
            timestep_us,
        )
    }

    /// Weight scale of every synapse type at `timestep_us`
    pub fn weight_scales(&mut self, timestep_us: f64) -> Vec<f64> {
        self.ring_buffer_shifts(timestep_us)
            .iter()
            .map(|s| s.weight_scale)
            .collect()
    }

    /// Whether the cache holds shifts for the current state at `timestep_us`
    pub fn has_cached_shifts(&self, timestep_us: f64) -> bool {
        self.shift_cache.as_ref().is_some_and(|c| {
            c.generation == self.generation && c.timestep_bits == timestep_us.to_bits()
        })
    }

    /// Whether a change since the last run needs a new mapping
    pub fn requires_mapping(&self) -> bool {
        self.requires_mapping
    }

    /// Whether a change since the last run needs data to be regenerated
    pub fn requires_data_generation(&self) -> bool {
        self.requires_data_generation
    }

    /// Whether a reset happened since the last run
    pub fn has_reset_last(&self) -> bool {
        self.has_reset_last
    }

    /// Record that the current state has been mapped and loaded
    pub fn mark_no_changes(&mut self) {
        self.requires_mapping = false;
        self.requires_data_generation = false;
        self.has_reset_last = false;
    }

    /// Return to the first timestep
    ///
    /// Cores always reload their data. When the synapses change during a run
    /// the data must be generated again.
    pub fn reset_to_first_timestep(&mut self) {
        self.has_reset_last = true;
        let data_generation = self.dynamics.changes_during_run();
        if data_generation {
            self.requires_data_generation = true;
        }
        self.events.push(PopulationEvent::ReloadRequired { data_generation });
    }

    /// Take the events emitted since the last call
    pub fn drain_events(&mut self) -> Vec<PopulationEvent> {
        std::mem::take(&mut self.events)
    }

    /// Label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of atoms
    pub fn n_atoms(&self) -> u32 {
        self.n_atoms
    }

    /// Maximum atoms placed on one core
    pub fn max_atoms_per_core(&self) -> u32 {
        self.max_atoms_per_core
    }

    /// Neuron cost model
    pub fn neuron(&self) -> &dyn NeuronCosts {
        self.neuron.as_ref()
    }

    /// Recorder
    pub fn recorder(&self) -> &NeuronRecorder {
        &self.recorder
    }

    /// Merged synapse dynamics of all projections
    pub fn synapse_dynamics(&self) -> &SynapseDynamics {
        &self.dynamics
    }

    /// Incoming projections in the order they were added
    pub fn projections(&self) -> &[IncomingProjection] {
        &self.projections
    }

    /// Standard deviations used for the ring-buffer bound
    pub fn ring_buffer_sigma(&self) -> f64 {
        self.ring_buffer_sigma
    }

    /// Assumed peak rate of sources without a known maximum
    pub fn spikes_per_second(&self) -> f64 {
        self.spikes_per_second
    }

    /// Incoming spike buffer size
    pub fn incoming_spike_buffer_size(&self) -> u32 {
        self.incoming_spike_buffer_size
    }

    /// Whether late spikes are dropped
    pub fn drop_late_spikes(&self) -> bool {
        self.drop_late_spikes
    }

    /// Profiling samples per core
    pub fn n_profile_samples(&self) -> u64 {
        self.n_profile_samples
    }

    /// Run length recording is sized for
    pub fn n_machine_time_steps(&self) -> u64 {
        self.n_machine_time_steps
    }
}
