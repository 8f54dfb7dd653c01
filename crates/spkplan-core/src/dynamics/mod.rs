//! Synapse dynamics: how a projection's synapses behave at run time
//!
//! The planner needs the dynamics for three things: the size of a row with a
//! given number of synapses, the size of the dynamics' own memory regions, and
//! the magnitude and sign of weights that ring-buffer scaling must
//! accommodate.

mod stdp;
mod structural;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use stdp::{StdpDynamics, TimingRule, WeightRule, LOOKUP_TABLE_SIZE};
pub use structural::{EliminationRule, FormationRule, PartnerSelection, StructuralDynamics};

use crate::connector::Connector;
use crate::constants::{BYTES_PER_WORD, N_SYNAPSE_ROW_HEADER_WORDS};
use crate::error::{PlanError, Result};
use crate::params::ParameterValue;

/// Behaviour of the synapses of a projection
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SynapseDynamics {
    /// Fixed weights and delays
    #[default]
    Static,
    /// Weights change with spike timing
    Stdp(StdpDynamics),
    /// Synapses form and are eliminated during the run
    Structural(StructuralDynamics),
}

impl SynapseDynamics {
    /// Whether a structural region must be sized for this dynamics
    pub fn supports_structural_sizing(&self) -> bool {
        matches!(self, Self::Structural(_))
    }

    /// Whether a matrix with this dynamics can be generated on the core
    pub fn generates_on_core(&self) -> bool {
        !matches!(self, Self::Structural(_))
    }

    /// Whether weights may become negative
    pub fn are_weights_signed(&self) -> bool {
        match self {
            Self::Static => false,
            Self::Stdp(stdp) => stdp.are_weights_signed(),
            Self::Structural(s) => {
                s.initial_weight < 0.0
                    || s.plasticity.as_ref().is_some_and(StdpDynamics::are_weights_signed)
            }
        }
    }

    /// Whether synaptic data is modified while the simulation runs
    pub fn changes_during_run(&self) -> bool {
        !matches!(self, Self::Static)
    }

    fn plasticity(&self) -> Option<&StdpDynamics> {
        match self {
            Self::Static => None,
            Self::Stdp(stdp) => Some(stdp),
            Self::Structural(s) => s.plasticity.as_ref(),
        }
    }

    /// Bytes of the synapse dynamics parameter region
    pub fn parameters_size_in_bytes(&self, _n_atoms: u32, n_synapse_types: u32) -> u64 {
        self.plasticity()
            .map_or(0, |stdp| stdp.parameters_size_in_bytes(n_synapse_types))
    }

    /// Bytes of the structural plasticity region, 0 without rewiring
    pub fn structural_size_in_bytes(
        &self,
        n_atoms: u32,
        n_projections: u64,
        n_source_sub_edges: u64,
    ) -> u64 {
        match self {
            Self::Structural(s) => {
                s.structural_size_in_bytes(n_atoms, n_projections, n_source_sub_edges)
            }
            _ => 0,
        }
    }

    /// Bytes of on-core matrix generator parameters
    pub fn gen_matrix_params_size_in_bytes(&self) -> u64 {
        match self {
            Self::Static | Self::Structural(_) => 0,
            Self::Stdp(stdp) => stdp.gen_matrix_params_size_in_bytes(),
        }
    }

    /// Bytes of a row holding `n_synapses` synapses, 0 for an empty row
    pub fn row_size_in_bytes(&self, n_synapses: u64) -> u64 {
        match self {
            Self::Static if n_synapses == 0 => 0,
            Self::Static => (N_SYNAPSE_ROW_HEADER_WORDS + n_synapses) * BYTES_PER_WORD,
            Self::Stdp(stdp) => stdp.row_size_in_bytes(n_synapses),
            Self::Structural(s) => s.row_size_in_bytes(n_synapses),
        }
    }

    /// Mean absolute weight a connection contributes
    ///
    /// Plastic weights can move anywhere in their range, so the maximum is
    /// used in place of the mean.
    pub fn weight_mean(
        &self,
        connector: &dyn Connector,
        weights: &ParameterValue,
        n_pre_atoms: u32,
        n_post_atoms: u32,
    ) -> f64 {
        match self.plasticity() {
            Some(_) => self.weight_maximum(connector, weights, n_pre_atoms, n_post_atoms),
            None => connector.weight_mean(weights),
        }
    }

    /// Variance of connection weights; 0 for plastic weights
    pub fn weight_variance(&self, connector: &dyn Connector, weights: &ParameterValue) -> f64 {
        match self.plasticity() {
            Some(_) => 0.0,
            None => connector.weight_variance(weights),
        }
    }

    /// Largest absolute weight any connection can reach
    pub fn weight_maximum(
        &self,
        connector: &dyn Connector,
        weights: &ParameterValue,
        n_pre_atoms: u32,
        n_post_atoms: u32,
    ) -> f64 {
        let initial = connector.weight_maximum(weights, n_pre_atoms, n_post_atoms);
        let formed = match self {
            Self::Structural(s) => s.initial_weight.abs(),
            _ => 0.0,
        };
        let plastic = self.plasticity().map_or(0.0, StdpDynamics::weight_maximum);
        initial.max(formed).max(plastic)
    }

    /// Variance of connection delays
    pub fn delay_variance(&self, connector: &dyn Connector, delays: &ParameterValue) -> f64 {
        connector.delay_variance(delays)
    }

    /// Combine with the dynamics of another projection on the same population
    ///
    /// Static dynamics are absorbed by anything else, identical dynamics merge
    /// to themselves and plastic weights combine with matching rewiring.
    pub fn merge(&self, other: &Self) -> Result<Self> {
        match (self, other) {
            (Self::Static, _) => Ok(other.clone()),
            (_, Self::Static) => Ok(self.clone()),
            (a, b) if a == b => Ok(a.clone()),
            (Self::Structural(s), Self::Stdp(stdp)) | (Self::Stdp(stdp), Self::Structural(s)) => {
                match &s.plasticity {
                    None => Ok(Self::Structural(s.with_plasticity(stdp.clone()))),
                    Some(existing) if existing == stdp => Ok(Self::Structural(s.clone())),
                    Some(_) => Err(PlanError::dynamics_mismatch(self.to_string(), other.to_string())),
                }
            }
            (Self::Structural(a), Self::Structural(b)) if a.same_rewiring(b) => {
                match (&a.plasticity, &b.plasticity) {
                    (None, _) => Ok(Self::Structural(b.clone())),
                    (_, None) => Ok(Self::Structural(a.clone())),
                    _ => Err(PlanError::dynamics_mismatch(self.to_string(), other.to_string())),
                }
            }
            _ => Err(PlanError::dynamics_mismatch(self.to_string(), other.to_string())),
        }
    }
}

impl fmt::Display for SynapseDynamics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static => write!(f, "static"),
            Self::Stdp(stdp) => fmt::Display::fmt(stdp, f),
            Self::Structural(s) => fmt::Display::fmt(s, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::AllToAllConnector;

    fn stdp(w_max: f64) -> StdpDynamics {
        StdpDynamics::new(
            TimingRule::SpikePair { tau_plus: 20.0, tau_minus: 20.0 },
            WeightRule::Additive { w_min: 0.0, w_max, a_plus: 0.01, a_minus: 0.012 },
        )
        .unwrap()
    }

    fn structural() -> StructuralDynamics {
        StructuralDynamics {
            s_max: 4,
            f_rew: 100.0,
            initial_weight: 0.5,
            initial_delay: 1.0,
            partner_selection: PartnerSelection::LastNeuron,
            formation: FormationRule {
                grid: [2, 2],
                p_form_forward: 0.5,
                p_form_lateral: 0.5,
                sigma_form_forward: 1.0,
                sigma_form_lateral: 1.0,
            },
            elimination: EliminationRule {
                prob_elim_depressed: 0.1,
                prob_elim_potentiated: 0.01,
                threshold: 0.25,
            },
            plasticity: None,
        }
    }

    #[test]
    fn test_capabilities() {
        let s = SynapseDynamics::Structural(structural());
        assert!(s.supports_structural_sizing());
        assert!(!s.generates_on_core());
        assert!(s.changes_during_run());
        assert!(SynapseDynamics::Static.generates_on_core());
        assert!(!SynapseDynamics::Static.changes_during_run());
        assert!(SynapseDynamics::Stdp(stdp(1.0)).generates_on_core());
    }

    #[test]
    fn test_static_rows_and_regions() {
        let d = SynapseDynamics::Static;
        assert_eq!(d.row_size_in_bytes(0), 0);
        assert_eq!(d.row_size_in_bytes(10), 52);
        assert_eq!(d.parameters_size_in_bytes(100, 2), 0);
        assert_eq!(d.structural_size_in_bytes(100, 1, 1), 0);
        assert_eq!(d.gen_matrix_params_size_in_bytes(), 0);
    }

    #[test]
    fn test_plastic_weights_report_maximum() {
        let c = AllToAllConnector::new(true);
        let w = ParameterValue::Uniform { low: 0.0, high: 0.5 };
        let d = SynapseDynamics::Stdp(stdp(2.0));
        assert_eq!(d.weight_mean(&c, &w, 10, 10), 2.0);
        assert_eq!(d.weight_variance(&c, &w), 0.0);
        assert_eq!(d.weight_maximum(&c, &w, 10, 10), 2.0);
        assert_eq!(SynapseDynamics::Static.weight_mean(&c, &w, 10, 10), 0.25);
    }

    #[test]
    fn test_merge_rules() {
        let st = SynapseDynamics::Static;
        let a = SynapseDynamics::Stdp(stdp(1.0));
        let b = SynapseDynamics::Stdp(stdp(2.0));
        let s = SynapseDynamics::Structural(structural());

        assert_eq!(st.merge(&a).unwrap(), a);
        assert_eq!(a.merge(&st).unwrap(), a);
        assert_eq!(a.merge(&a).unwrap(), a);
        assert!(matches!(a.merge(&b), Err(PlanError::DynamicsMismatch { .. })));

        let combined = s.merge(&a).unwrap();
        match &combined {
            SynapseDynamics::Structural(c) => assert_eq!(c.plasticity.as_ref(), Some(&stdp(1.0))),
            other => panic!("unexpected {}", other),
        }
        assert_eq!(combined.merge(&a).unwrap(), combined);
        assert!(combined.merge(&b).is_err());
    }

    #[test]
    fn test_serde_tagging() {
        let d: SynapseDynamics = toml::from_str(
            r#"
            kind = "stdp"
            [timing]
            rule = "spike_pair"
            tau_plus = 16.7
            tau_minus = 33.7
            [weight]
            rule = "additive"
            w_min = 0.0
            w_max = 1.0
            a_plus = 0.005
            a_minus = 0.005
            "#,
        )
        .unwrap();
        assert_eq!(d.to_string(), "stdp(spike_pair, additive)");
    }
}
