//! Structural plasticity: synapses that form and eliminate during a run

use std::fmt;

use serde::{Deserialize, Serialize};

use super::stdp::StdpDynamics;
use crate::constants::{BYTES_PER_WORD, N_SYNAPSE_ROW_HEADER_WORDS};
use crate::error::{PlanError, Result};

/// Words of the global rewiring parameters
const REWIRING_DATA_WORDS: u64 = 8;

/// Words of information per pre-synaptic population
const PRE_POP_INFO_BASE_WORDS: u64 = 4;

/// Words of key and atom information per pre-synaptic sub-edge
const KEY_ATOM_INFO_WORDS: u64 = 3;

/// Bytes of one post-to-pre table entry
const POST_TO_PRE_ENTRY_BYTES: u64 = BYTES_PER_WORD;

/// Largest value of a quantised probability
const PROBABILITY_QUANTUM: f64 = 65535.0;

/// How a new partner is chosen for a formation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartnerSelection {
    /// Any pre-synaptic atom at random
    Random,
    /// One of the atoms that spiked in the last tick
    LastNeuron,
}

impl PartnerSelection {
    /// Bytes of parameters per projection
    pub fn parameters_size_in_bytes(&self) -> u64 {
        match self {
            Self::Random => 0,
            Self::LastNeuron => BYTES_PER_WORD,
        }
    }
}

/// Distance-dependent formation on a 2D grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationRule {
    /// Grid the post-synaptic atoms are laid out on
    pub grid: [u32; 2],
    /// Peak formation probability for feed-forward partners
    pub p_form_forward: f64,
    /// Peak formation probability for lateral partners
    pub p_form_lateral: f64,
    /// Spread of feed-forward formation
    pub sigma_form_forward: f64,
    /// Spread of lateral formation
    pub sigma_form_lateral: f64,
}

impl FormationRule {
    /// Bytes of parameters per projection: four words and both probability
    /// tables
    pub fn parameters_size_in_bytes(&self) -> u64 {
        let entries = self.probability_table_len(self.p_form_forward, self.sigma_form_forward)
            + self.probability_table_len(self.p_form_lateral, self.sigma_form_lateral);
        4 * BYTES_PER_WORD + 2 * entries
    }

    /// Entries of a quantised probability table over squared distances,
    /// padded to an even count
    ///
    /// Entry `d` quantises to `probability * exp(-d / 2σ²) * 65535`, which
    /// stays at least 1 up to `d = 2σ² ln(probability * 65535)`.
    fn probability_table_len(&self, probability: f64, sigma: f64) -> u64 {
        let dx = u64::from(self.grid[0].saturating_sub(1));
        let dy = u64::from(self.grid[1].saturating_sub(1));
        let largest_squared_distance = dx * dx + dy * dy;
        let peak = probability * PROBABILITY_QUANTUM;
        if peak.is_nan() || peak < 1.0 {
            return 0;
        }
        let last_distance = (2.0 * sigma * sigma * peak.ln()).floor();
        let n = if last_distance.is_finite() {
            (last_distance as u64)
                .saturating_add(1)
                .min(largest_squared_distance)
        } else {
            largest_squared_distance
        };
        n + n % 2
    }

    fn validate(&self) -> Result<()> {
        for (name, p) in [("p_form_forward", self.p_form_forward), ("p_form_lateral", self.p_form_lateral)] {
            if !(0.0..=1.0).contains(&p) {
                return Err(PlanError::invalid_parameter(name, p.to_string(), "in [0, 1]"));
            }
        }
        for (name, s) in [
            ("sigma_form_forward", self.sigma_form_forward),
            ("sigma_form_lateral", self.sigma_form_lateral),
        ] {
            if !(s.is_finite() && s > 0.0) {
                return Err(PlanError::invalid_parameter(name, s.to_string(), "> 0"));
            }
        }
        Ok(())
    }
}

/// Weight-dependent random elimination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EliminationRule {
    /// Probability of removing a synapse below the threshold
    pub prob_elim_depressed: f64,
    /// Probability of removing a synapse at or above the threshold
    pub prob_elim_potentiated: f64,
    /// Weight separating depressed from potentiated synapses
    pub threshold: f64,
}

impl EliminationRule {
    /// Bytes of parameters per projection
    pub fn parameters_size_in_bytes(&self) -> u64 {
        3 * BYTES_PER_WORD
    }
}

/// Rewiring with optional plastic weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralDynamics {
    /// Maximum synapses per post-synaptic atom; rows are padded to it
    pub s_max: u32,
    /// Rewiring attempts per second
    pub f_rew: f64,
    /// Weight of a newly formed synapse
    pub initial_weight: f64,
    /// Delay of a newly formed synapse (ms)
    pub initial_delay: f64,
    /// Partner selection
    pub partner_selection: PartnerSelection,
    /// Formation rule
    pub formation: FormationRule,
    /// Elimination rule
    pub elimination: EliminationRule,
    /// Weight plasticity of existing synapses; static when absent
    #[serde(default)]
    pub plasticity: Option<StdpDynamics>,
}

impl StructuralDynamics {
    /// Check the rewiring parameters
    pub fn validate(&self) -> Result<()> {
        if self.s_max == 0 {
            return Err(PlanError::invalid_parameter("s_max", "0", "> 0"));
        }
        if !(self.f_rew.is_finite() && self.f_rew > 0.0) {
            return Err(PlanError::invalid_parameter("f_rew", self.f_rew.to_string(), "> 0"));
        }
        self.formation.validate()
    }

    /// Same rewiring with `plasticity` applied to the weights
    pub fn with_plasticity(&self, plasticity: StdpDynamics) -> Self {
        Self {
            plasticity: Some(plasticity),
            ..self.clone()
        }
    }

    /// Whether rewiring parameters match, ignoring weight plasticity
    pub fn same_rewiring(&self, other: &Self) -> bool {
        self.s_max == other.s_max
            && self.f_rew == other.f_rew
            && self.initial_weight == other.initial_weight
            && self.initial_delay == other.initial_delay
            && self.partner_selection == other.partner_selection
            && self.formation == other.formation
            && self.elimination == other.elimination
    }

    /// Bytes of the structural region for `n_atoms` post-synaptic atoms fed by
    /// `n_projections` projections spanning `n_source_sub_edges` sub-edges
    pub fn structural_size_in_bytes(
        &self,
        n_atoms: u32,
        n_projections: u64,
        n_source_sub_edges: u64,
    ) -> u64 {
        let per_projection_params = self.partner_selection.parameters_size_in_bytes()
            + self.formation.parameters_size_in_bytes()
            + self.elimination.parameters_size_in_bytes();
        REWIRING_DATA_WORDS * BYTES_PER_WORD
            + PRE_POP_INFO_BASE_WORDS * BYTES_PER_WORD * n_projections
            + KEY_ATOM_INFO_WORDS * BYTES_PER_WORD * n_source_sub_edges
            + POST_TO_PRE_ENTRY_BYTES * u64::from(n_atoms) * u64::from(self.s_max)
            + per_projection_params * n_projections
    }

    /// Bytes of a row padded to at least `s_max` synapses
    pub fn row_size_in_bytes(&self, n_synapses: u64) -> u64 {
        let n = n_synapses.max(u64::from(self.s_max));
        match &self.plasticity {
            Some(stdp) => stdp.row_size_in_bytes(n),
            None => (N_SYNAPSE_ROW_HEADER_WORDS + n) * BYTES_PER_WORD,
        }
    }
}

impl fmt::Display for StructuralDynamics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.plasticity {
            Some(stdp) => write!(f, "structural(s_max={}, {})", self.s_max, stdp),
            None => write!(f, "structural(s_max={}, static)", self.s_max),
        }
    }
}
