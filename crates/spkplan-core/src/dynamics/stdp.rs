//! Spike-timing-dependent plasticity rules

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{round_up_to_words, BYTES_PER_WORD, N_SYNAPSE_ROW_HEADER_WORDS};
use crate::error::{PlanError, Result};

/// Entries in each exponential decay lookup table
pub const LOOKUP_TABLE_SIZE: u64 = 256;

/// Bytes per lookup table entry
const LOOKUP_ENTRY_BYTES: u64 = 2;

/// Bytes of the last-spike time stamp in a plastic row header
const TIME_STAMP_BYTES: u64 = 4;

/// Bytes of one trace value
const TRACE_BYTES: u64 = 2;

/// Half-words of plastic state per synapse (the weight)
const HALF_WORDS_PER_SYNAPSE: u64 = 1;

/// Words of the plasticity region header (back-propagation delay, terms)
const PARAMS_HEADER_WORDS: u64 = 2;

/// Words of weight-rule parameters per synapse type
const WEIGHT_RULE_WORDS_PER_TYPE: u64 = 4;

/// Words of on-core matrix generator parameters for a plastic matrix
const GEN_MATRIX_PARAMS_WORDS: u64 = 4;

/// How weight change depends on relative spike timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum TimingRule {
    /// Nearest-pair exponential STDP
    SpikePair {
        /// Potentiation time constant (ms)
        tau_plus: f64,
        /// Depression time constant (ms)
        tau_minus: f64,
    },
    /// Symmetric inhibitory plasticity of Vogels et al. (2011)
    Vogels2011 {
        /// Time constant (ms)
        tau: f64,
        /// Depression factor applied on every pre-synaptic spike
        alpha: f64,
    },
}

impl TimingRule {
    fn name(&self) -> &'static str {
        match self {
            Self::SpikePair { .. } => "spike_pair",
            Self::Vogels2011 { .. } => "vogels_2011",
        }
    }

    /// Bytes of the rule's lookup tables and scalars
    pub fn parameters_size_in_bytes(&self) -> u64 {
        match self {
            Self::SpikePair { .. } => 2 * LOOKUP_TABLE_SIZE * LOOKUP_ENTRY_BYTES,
            Self::Vogels2011 { .. } => LOOKUP_TABLE_SIZE * LOOKUP_ENTRY_BYTES + BYTES_PER_WORD,
        }
    }

    /// Bytes of trace kept per pre-synaptic atom
    pub fn pre_trace_n_bytes(&self) -> u64 {
        TRACE_BYTES
    }

    fn validate(&self) -> Result<()> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(PlanError::invalid_parameter(name, v.to_string(), "> 0"))
            }
        };
        match *self {
            Self::SpikePair { tau_plus, tau_minus } => {
                positive("tau_plus", tau_plus)?;
                positive("tau_minus", tau_minus)
            }
            Self::Vogels2011 { tau, .. } => positive("tau", tau),
        }
    }
}

/// How weight change depends on the current weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum WeightRule {
    /// Change independent of the current weight
    Additive {
        /// Lower weight bound
        w_min: f64,
        /// Upper weight bound
        w_max: f64,
        /// Potentiation amplitude
        a_plus: f64,
        /// Depression amplitude
        a_minus: f64,
    },
    /// Change proportional to the distance from the bounds
    Multiplicative {
        /// Lower weight bound
        w_min: f64,
        /// Upper weight bound
        w_max: f64,
        /// Potentiation amplitude
        a_plus: f64,
        /// Depression amplitude
        a_minus: f64,
    },
}

impl WeightRule {
    fn name(&self) -> &'static str {
        match self {
            Self::Additive { .. } => "additive",
            Self::Multiplicative { .. } => "multiplicative",
        }
    }

    /// Weight bounds `(w_min, w_max)`
    pub fn bounds(&self) -> (f64, f64) {
        match *self {
            Self::Additive { w_min, w_max, .. } | Self::Multiplicative { w_min, w_max, .. } => {
                (w_min, w_max)
            }
        }
    }

    /// Bytes of weight-rule parameters for every synapse type
    pub fn parameters_size_in_bytes(&self, n_synapse_types: u32) -> u64 {
        WEIGHT_RULE_WORDS_PER_TYPE * BYTES_PER_WORD * u64::from(n_synapse_types)
    }

    fn validate(&self) -> Result<()> {
        let (w_min, w_max) = self.bounds();
        if w_min.is_finite() && w_max.is_finite() && w_min <= w_max {
            Ok(())
        } else {
            Err(PlanError::invalid_parameter(
                "w_min/w_max",
                format!("{}/{}", w_min, w_max),
                "finite with w_min <= w_max",
            ))
        }
    }
}

/// Plastic synapses with a timing rule and a weight rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StdpDynamics {
    /// Timing dependence
    pub timing: TimingRule,
    /// Weight dependence
    pub weight: WeightRule,
}

impl StdpDynamics {
    /// Create STDP dynamics, checking the rule parameters
    pub fn new(timing: TimingRule, weight: WeightRule) -> Result<Self> {
        timing.validate()?;
        weight.validate()?;
        Ok(Self { timing, weight })
    }

    /// Whether the weight range reaches below zero
    pub fn are_weights_signed(&self) -> bool {
        self.weight.bounds().0 < 0.0
    }

    /// Largest weight the rule can reach
    pub fn weight_maximum(&self) -> f64 {
        let (w_min, w_max) = self.weight.bounds();
        w_min.abs().max(w_max.abs())
    }

    /// Bytes of the plasticity parameter region
    pub fn parameters_size_in_bytes(&self, n_synapse_types: u32) -> u64 {
        PARAMS_HEADER_WORDS * BYTES_PER_WORD
            + self.timing.parameters_size_in_bytes()
            + self.weight.parameters_size_in_bytes(n_synapse_types)
    }

    /// Bytes of on-core matrix generator parameters
    pub fn gen_matrix_params_size_in_bytes(&self) -> u64 {
        GEN_MATRIX_PARAMS_WORDS * BYTES_PER_WORD
    }

    /// Bytes of the word-aligned plastic row header
    fn row_header_bytes(&self) -> u64 {
        round_up_to_words(TIME_STAMP_BYTES + self.timing.pre_trace_n_bytes())
    }

    /// Bytes of a row holding `n_synapses` plastic synapses
    ///
    /// The row holds the fixed header, a half-word of control data per synapse
    /// and the plastic region (row header plus weights).
    pub fn row_size_in_bytes(&self, n_synapses: u64) -> u64 {
        if n_synapses == 0 {
            return 0;
        }
        let fixed_words = n_synapses.div_ceil(2);
        let plastic_bytes =
            self.row_header_bytes() + HALF_WORDS_PER_SYNAPSE * 2 * n_synapses;
        let plastic_words = plastic_bytes.div_ceil(BYTES_PER_WORD);
        (N_SYNAPSE_ROW_HEADER_WORDS + fixed_words + plastic_words) * BYTES_PER_WORD
    }
}

impl fmt::Display for StdpDynamics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stdp({}, {})", self.timing.name(), self.weight.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair_additive(w_min: f64) -> StdpDynamics {
        StdpDynamics::new(
            TimingRule::SpikePair { tau_plus: 20.0, tau_minus: 20.0 },
            WeightRule::Additive { w_min, w_max: 2.0, a_plus: 0.01, a_minus: 0.012 },
        )
        .unwrap()
    }

    #[test]
    fn test_row_size() {
        let stdp = pair_additive(0.0);
        assert_eq!(stdp.row_size_in_bytes(0), 0);
        // 3 header words, 1 fixed word, 8 header bytes + 4 weight bytes = 3 words
        assert_eq!(stdp.row_size_in_bytes(2), (3 + 1 + 3) * 4);
        // 3 fixed words, 8 + 10 bytes = 5 words
        assert_eq!(stdp.row_size_in_bytes(5), (3 + 3 + 5) * 4);
    }

    #[test]
    fn test_parameter_sizes() {
        let stdp = pair_additive(0.0);
        assert_eq!(stdp.parameters_size_in_bytes(2), 8 + 1024 + 32);
        assert_eq!(stdp.gen_matrix_params_size_in_bytes(), 16);
    }

    #[test]
    fn test_signedness_follows_lower_bound() {
        assert!(!pair_additive(0.0).are_weights_signed());
        assert!(pair_additive(-1.0).are_weights_signed());
        assert_eq!(pair_additive(-3.0).weight_maximum(), 3.0);
    }

    #[test]
    fn test_invalid_rules_rejected() {
        assert!(StdpDynamics::new(
            TimingRule::SpikePair { tau_plus: 0.0, tau_minus: 20.0 },
            WeightRule::Additive { w_min: 0.0, w_max: 1.0, a_plus: 0.1, a_minus: 0.1 },
        )
        .is_err());
        assert!(StdpDynamics::new(
            TimingRule::Vogels2011 { tau: 20.0, alpha: 0.12 },
            WeightRule::Multiplicative { w_min: 2.0, w_max: 1.0, a_plus: 0.1, a_minus: 0.1 },
        )
        .is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(pair_additive(0.0).to_string(), "stdp(spike_pair, additive)");
    }
}
