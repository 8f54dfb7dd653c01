//! Per-atom costs of a neuron implementation

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

/// Memory and time a neuron implementation needs per atom
pub trait NeuronCosts: Debug + Send + Sync {
    /// Name of the model
    fn name(&self) -> &str;

    /// Working memory for `n_atoms` neurons
    fn dtcm_usage_in_bytes(&self, n_atoms: u32) -> u64;

    /// Parameter and state bytes for `n_atoms` neurons
    fn sdram_usage_in_bytes(&self, n_atoms: u32) -> u64;

    /// Cycles per tick to update `n_atoms` neurons
    fn n_cpu_cycles(&self, n_atoms: u32) -> u64;

    /// Number of synapse types (receptor channels) of each neuron
    fn n_synapse_types(&self) -> u32;

    /// Scale applied to weights before fixed-point conversion
    fn global_weight_scale(&self) -> f64;

    /// Names of the state variables that can be recorded
    fn recordable_variables(&self) -> Vec<String>;
}

/// Neuron implementation described by its per-atom costs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuronModel {
    /// Model name
    pub name: String,
    /// Working memory per neuron
    pub dtcm_bytes_per_neuron: u64,
    /// Parameter and state memory per neuron
    pub sdram_bytes_per_neuron: u64,
    /// Update cycles per neuron per tick
    pub cycles_per_neuron: u64,
    /// Synapse types per neuron
    pub n_synapse_types: u32,
    /// Weight scale
    #[serde(default = "default_weight_scale")]
    pub global_weight_scale: f64,
    /// Recordable state variables
    #[serde(default)]
    pub recordables: Vec<String>,
}

fn default_weight_scale() -> f64 {
    1.0
}

impl NeuronModel {
    /// Leaky integrate-and-fire with exponential current synapses
    pub fn if_curr_exp() -> Self {
        Self {
            name: "IF_curr_exp".to_string(),
            dtcm_bytes_per_neuron: 64,
            sdram_bytes_per_neuron: 64,
            cycles_per_neuron: 213,
            n_synapse_types: 2,
            global_weight_scale: 1.0,
            recordables: vec!["v".into(), "gsyn_exc".into(), "gsyn_inh".into()],
        }
    }

    /// Leaky integrate-and-fire with exponential conductance synapses
    pub fn if_cond_exp() -> Self {
        Self {
            name: "IF_cond_exp".to_string(),
            dtcm_bytes_per_neuron: 72,
            sdram_bytes_per_neuron: 72,
            cycles_per_neuron: 261,
            n_synapse_types: 2,
            global_weight_scale: 1024.0,
            recordables: vec!["v".into(), "gsyn_exc".into(), "gsyn_inh".into()],
        }
    }

    /// Look up a preset by its name, ignoring case
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "if_curr_exp" => Some(Self::if_curr_exp()),
            "if_cond_exp" => Some(Self::if_cond_exp()),
            _ => None,
        }
    }
}

impl NeuronCosts for NeuronModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn dtcm_usage_in_bytes(&self, n_atoms: u32) -> u64 {
        self.dtcm_bytes_per_neuron * u64::from(n_atoms)
    }

    fn sdram_usage_in_bytes(&self, n_atoms: u32) -> u64 {
        self.sdram_bytes_per_neuron * u64::from(n_atoms)
    }

    fn n_cpu_cycles(&self, n_atoms: u32) -> u64 {
        self.cycles_per_neuron * u64::from(n_atoms)
    }

    fn n_synapse_types(&self) -> u32 {
        self.n_synapse_types
    }

    fn global_weight_scale(&self) -> f64 {
        self.global_weight_scale
    }

    fn recordable_variables(&self) -> Vec<String> {
        self.recordables.clone()
    }
}
