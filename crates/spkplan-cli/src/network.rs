//! Network description files
//!
//! A network is a TOML document with three arrays of tables:
//!
//! ```toml
//! [[sources]]
//! label = "input"
//! n_atoms = 100
//! max_atoms_per_core = 64
//! max_spikes = { poisson_rate_hz = 20.0 }
//!
//! [[populations]]
//! label = "exc"
//! n_atoms = 300
//! neuron = "if_curr_exp"
//! record = ["spikes", "v"]
//!
//! [[projections]]
//! source = "input"
//! target = "exc"
//! synapse_type = 0
//! connector = { type = "fixed_probability", p_connect = 0.1 }
//! weights = { low = 0.1, high = 0.5 }
//! delays = 1.0
//! ```
//!
//! A projection's `source` names either an entry of `sources` or another
//! population; `target` always names a population.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;
use spkplan_core::population::DEFAULT_MAX_ATOMS_PER_CORE;
use spkplan_core::{
    AllToAllConnector, Connector, FixedProbabilityConnector, IncomingProjection, MaxSpikeSource,
    NeuronModel, OneToOneConnector, ParameterValue, PlanningConfig, Population, SourceId,
    SourceVertex, SynapseDynamics,
};
use tracing::{debug, info};

use crate::error::{CliError, CliResult};

fn default_true() -> bool {
    true
}

fn default_sampling_interval() -> u32 {
    1
}

/// Whole network file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkSpec {
    /// External spike sources
    #[serde(default)]
    pub sources: Vec<SourceSpec>,
    /// Populations to plan
    #[serde(default)]
    pub populations: Vec<PopulationSpec>,
    /// Projections between them
    #[serde(default)]
    pub projections: Vec<ProjectionSpec>,
}

/// External spike source
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSpec {
    /// Unique label
    pub label: String,
    /// Number of atoms
    pub n_atoms: u32,
    /// Atoms per core of the source
    #[serde(default)]
    pub max_atoms_per_core: Option<u32>,
    /// Machine vertices the source was actually partitioned into
    #[serde(default)]
    pub machine_vertices: Option<u32>,
    /// Known worst-case spike output
    #[serde(default)]
    pub max_spikes: Option<MaxSpikesSpec>,
}

/// Known worst-case output of a source
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MaxSpikesSpec {
    /// Poisson generator
    Poisson {
        /// Highest rate of any atom (Hz)
        poisson_rate_hz: f64,
    },
    /// Fixed spike times
    SpikeArray {
        /// Spike times in milliseconds
        spike_times_ms: Vec<f64>,
    },
}

impl From<&MaxSpikesSpec> for MaxSpikeSource {
    fn from(spec: &MaxSpikesSpec) -> Self {
        match spec {
            MaxSpikesSpec::Poisson { poisson_rate_hz } => MaxSpikeSource::Poisson {
                max_rate_hz: *poisson_rate_hz,
            },
            MaxSpikesSpec::SpikeArray { spike_times_ms } => MaxSpikeSource::SpikeArray {
                spike_times_ms: spike_times_ms.clone(),
            },
        }
    }
}

/// Neuron model: a preset name or explicit per-atom costs
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NeuronSpec {
    /// Built-in model such as `if_curr_exp`
    Preset(String),
    /// Explicit costs
    Explicit(NeuronModel),
}

impl NeuronSpec {
    fn resolve(&self) -> CliResult<NeuronModel> {
        match self {
            Self::Preset(name) => NeuronModel::preset(name)
                .ok_or_else(|| CliError::network(format!("unknown neuron model '{}'", name))),
            Self::Explicit(model) => Ok(model.clone()),
        }
    }
}

/// Population to plan
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PopulationSpec {
    /// Unique label
    pub label: String,
    /// Number of neurons
    pub n_atoms: u32,
    /// Neuron model
    pub neuron: NeuronSpec,
    /// Atoms per core
    #[serde(default)]
    pub max_atoms_per_core: Option<u32>,
    /// Variables to record
    #[serde(default)]
    pub record: Vec<String>,
    /// Timesteps between recorded samples
    #[serde(default = "default_sampling_interval")]
    pub sampling_interval: u32,
    /// Ring-buffer sigma, overriding the configuration
    #[serde(default)]
    pub ring_buffer_sigma: Option<f64>,
    /// Incoming spike rate, overriding the configuration
    #[serde(default)]
    pub spikes_per_second: Option<f64>,
    /// Incoming spike buffer size, overriding the configuration
    #[serde(default)]
    pub incoming_spike_buffer_size: Option<u32>,
    /// Late spike handling, overriding the configuration
    #[serde(default)]
    pub drop_late_spikes: Option<bool>,
    /// Synapse dynamics set before any projection arrives
    #[serde(default)]
    pub synapse_dynamics: Option<SynapseDynamics>,
}

/// Connectivity pattern
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConnectorSpec {
    /// Every source atom to every target atom
    AllToAll {
        /// Whether atom `i` may connect to itself
        #[serde(default = "default_true")]
        allow_self_connections: bool,
    },
    /// Atom `i` to atom `i`
    OneToOne,
    /// Each pair independently with probability `p_connect`
    FixedProbability {
        /// Connection probability
        p_connect: f64,
        /// Whether atom `i` may connect to itself
        #[serde(default = "default_true")]
        allow_self_connections: bool,
    },
}

impl ConnectorSpec {
    fn build(&self) -> CliResult<Arc<dyn Connector>> {
        let connector: Arc<dyn Connector> = match self {
            Self::AllToAll { allow_self_connections } => {
                Arc::new(AllToAllConnector::new(*allow_self_connections))
            }
            Self::OneToOne => Arc::new(OneToOneConnector),
            Self::FixedProbability { p_connect, allow_self_connections } => {
                if !(0.0..=1.0).contains(p_connect) {
                    return Err(CliError::network(format!(
                        "p_connect must lie in [0, 1], got {}",
                        p_connect
                    )));
                }
                Arc::new(FixedProbabilityConnector::new(*p_connect, *allow_self_connections))
            }
        };
        Ok(connector)
    }
}

/// Projection into a population
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectionSpec {
    /// Label of a source or population
    pub source: String,
    /// Label of the target population
    pub target: String,
    /// Synapse type on the target
    #[serde(default)]
    pub synapse_type: u32,
    /// Connectivity
    pub connector: ConnectorSpec,
    /// Weight distribution
    #[serde(default)]
    pub weights: Option<ParameterValue>,
    /// Delay distribution (ms)
    #[serde(default)]
    pub delays: Option<ParameterValue>,
    /// Synapse dynamics
    #[serde(default)]
    pub dynamics: SynapseDynamics,
    /// Explicit number of delay extension stages
    #[serde(default)]
    pub delay_stages: Option<u32>,
}

impl NetworkSpec {
    /// Read and parse a network file
    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Err(CliError::missing_resource(format!(
                "network file {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading network file {}", path.display()))?;
        Ok(toml::from_str(&content)?)
    }

    /// Build the populations described, with their projections attached
    pub fn build(&self, config: &PlanningConfig) -> CliResult<Vec<Population>> {
        let vertices = self.source_vertices()?;

        let mut populations = Vec::with_capacity(self.populations.len());
        let mut index = HashMap::new();
        for spec in &self.populations {
            index.insert(spec.label.as_str(), populations.len());
            populations.push(build_population(spec, config)?);
        }

        for (i, spec) in self.projections.iter().enumerate() {
            let source = vertices.get(spec.source.as_str()).ok_or_else(|| {
                CliError::network(format!(
                    "projection {} has unknown source '{}'",
                    i, spec.source
                ))
            })?;
            let target = *index.get(spec.target.as_str()).ok_or_else(|| {
                CliError::network(format!(
                    "projection {} has unknown target population '{}'",
                    i, spec.target
                ))
            })?;

            let mut projection =
                IncomingProjection::new(Arc::clone(source), spec.synapse_type, spec.connector.build()?)
                    .with_dynamics(spec.dynamics.clone());
            if let Some(weights) = &spec.weights {
                projection = projection.with_weights(weights.clone());
            }
            if let Some(delays) = &spec.delays {
                projection = projection.with_delays(delays.clone());
            }
            if let Some(stages) = spec.delay_stages {
                projection = projection.with_delay_stages(stages);
            }

            let id = populations[target].add_projection(projection)?;
            debug!("{} -> {} added as {}", spec.source, spec.target, id);
        }

        info!(
            "Loaded {} populations, {} sources, {} projections",
            populations.len(),
            self.sources.len(),
            self.projections.len()
        );
        Ok(populations)
    }

    /// Pre-synaptic view of every source and population, keyed by label
    fn source_vertices(&self) -> CliResult<HashMap<&str, Arc<SourceVertex>>> {
        let mut vertices = HashMap::new();
        let mut next_id = 0u32;

        for spec in &self.sources {
            let max_atoms = spec.max_atoms_per_core.unwrap_or(DEFAULT_MAX_ATOMS_PER_CORE);
            let mut vertex =
                SourceVertex::new(SourceId::new(next_id), spec.label.as_str(), spec.n_atoms, max_atoms)?;
            if let Some(n) = spec.machine_vertices {
                vertex = vertex.with_machine_vertices(n);
            }
            if let Some(max_spikes) = &spec.max_spikes {
                vertex = vertex.with_max_spikes(max_spikes.into())?;
            }
            insert_unique(&mut vertices, &spec.label, vertex)?;
            next_id += 1;
        }

        for spec in &self.populations {
            let max_atoms = spec.max_atoms_per_core.unwrap_or(DEFAULT_MAX_ATOMS_PER_CORE);
            let vertex =
                SourceVertex::new(SourceId::new(next_id), spec.label.as_str(), spec.n_atoms, max_atoms)?;
            insert_unique(&mut vertices, &spec.label, vertex)?;
            next_id += 1;
        }

        Ok(vertices)
    }
}

fn insert_unique<'a>(
    vertices: &mut HashMap<&'a str, Arc<SourceVertex>>,
    label: &'a str,
    vertex: SourceVertex,
) -> CliResult<()> {
    if vertices.insert(label, Arc::new(vertex)).is_some() {
        return Err(CliError::network(format!("duplicate label '{}'", label)));
    }
    Ok(())
}

fn build_population(spec: &PopulationSpec, config: &PlanningConfig) -> CliResult<Population> {
    let model = spec.neuron.resolve()?;
    let mut population = Population::new(spec.label.as_str(), spec.n_atoms, Arc::new(model), config)?;

    if let Some(max_atoms) = spec.max_atoms_per_core {
        population = population.with_max_atoms_per_core(max_atoms)?;
    }
    if let Some(size) = spec.incoming_spike_buffer_size {
        population = population.with_incoming_spike_buffer_size(size);
    }
    if let Some(drop_late) = spec.drop_late_spikes {
        population = population.with_drop_late_spikes(drop_late);
    }
    if let Some(sigma) = spec.ring_buffer_sigma {
        population.set_ring_buffer_sigma(sigma)?;
    }
    if let Some(rate) = spec.spikes_per_second {
        population.set_spikes_per_second(rate)?;
    }
    if let Some(dynamics) = &spec.synapse_dynamics {
        population.set_synapse_dynamics(dynamics)?;
    }
    for name in &spec.record {
        population.set_recording(name, true, spec.sampling_interval)?;
    }
    Ok(population)
}
