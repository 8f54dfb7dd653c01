//! Connectors describe which pre-synaptic atoms reach which post-synaptic atoms
//!
//! The planner never builds the connections. It only asks a connector for the
//! worst case: the longest row a source atom can have, the most connections a
//! target atom can receive, and how big its on-core generator parameters are.

use std::fmt::Debug;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::constants::BYTES_PER_WORD;
use crate::params::ParameterValue;

/// Chance of exceeding a probable maximum, spread over all connections
const PROBABLE_MAXIMUM_CHANCE: f64 = 0.01;

/// Inclusive range of delays, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayRange {
    /// Smallest delay in the range
    pub min_ms: f64,
    /// Largest delay in the range
    pub max_ms: f64,
}

impl DelayRange {
    /// Create a delay range
    pub const fn new(min_ms: f64, max_ms: f64) -> Self {
        Self { min_ms, max_ms }
    }
}

/// Worst-case connectivity description of a projection
///
/// Implementations must be deterministic: the same arguments always give the
/// same bounds.
pub trait Connector: Debug + Send + Sync {
    /// Short name used in logs and reports
    fn name(&self) -> &'static str;

    /// Maximum number of connections any single post-synaptic atom receives
    fn max_connections_to_post(&self, n_pre_atoms: u32, n_post_atoms: u32) -> u64;

    /// Maximum number of connections from one pre-synaptic atom into a
    /// post-synaptic slice of `n_post_slice_atoms` atoms, without regard to
    /// delay
    fn max_connections_from_pre(
        &self,
        n_pre_atoms: u32,
        n_post_atoms: u32,
        n_post_slice_atoms: u32,
    ) -> u64;

    /// Upper bound on the number of connections in the whole projection
    fn max_total_connections(&self, n_pre_atoms: u32, n_post_atoms: u32) -> u64;

    /// Size of the connector's on-core generator parameters, or `None` if the
    /// connector cannot be generated on the core
    fn generator_params_size_in_bytes(&self) -> Option<u64>;

    /// Whether the connectivity can be produced on the core
    fn generates_on_core(&self) -> bool {
        self.generator_params_size_in_bytes().is_some()
    }

    /// Maximum row length restricted to connections whose delay falls in
    /// `range`
    fn max_row_length(
        &self,
        n_pre_atoms: u32,
        n_post_atoms: u32,
        n_post_slice_atoms: u32,
        delays: &ParameterValue,
        range: DelayRange,
    ) -> u64 {
        let n_row = self.max_connections_from_pre(n_pre_atoms, n_post_atoms, n_post_slice_atoms);
        if n_row == 0 {
            return 0;
        }
        if let ParameterValue::Fixed(delay) = *delays {
            return if delay >= range.min_ms && delay <= range.max_ms {
                n_row
            } else {
                0
            };
        }
        let prob_in_range = delays.fraction_in_range(range.min_ms, range.max_ms);
        if prob_in_range <= 0.0 {
            return 0;
        }
        let n_total = self.max_total_connections(n_pre_atoms, n_post_atoms);
        probable_maximum_selected(n_total, n_row, prob_in_range)
    }

    /// Mean absolute weight of a connection
    fn weight_mean(&self, weights: &ParameterValue) -> f64 {
        weights.abs_mean()
    }

    /// Variance of the connection weights
    fn weight_variance(&self, weights: &ParameterValue) -> f64 {
        weights.variance()
    }

    /// Largest absolute weight expected in the projection
    fn weight_maximum(&self, weights: &ParameterValue, n_pre_atoms: u32, n_post_atoms: u32) -> f64 {
        weights.probable_abs_maximum(self.max_total_connections(n_pre_atoms, n_post_atoms))
    }

    /// Variance of the connection delays
    fn delay_variance(&self, delays: &ParameterValue) -> f64 {
        delays.variance()
    }
}

/// Number of items expected to be selected out of `n_selected` candidates,
/// each chosen with `selection_prob`, that is only exceeded with a small
/// chance across `n_total_items`
pub fn probable_maximum_selected(n_total_items: u64, n_selected: u64, selection_prob: f64) -> u64 {
    if selection_prob >= 1.0 {
        return n_selected;
    }
    if selection_prob <= 0.0 || n_selected == 0 {
        return 0;
    }
    let p = 1.0 - PROBABLE_MAXIMUM_CHANCE / n_total_items.max(1) as f64;
    match spkplan_math::binomial_quantile(p, n_selected, selection_prob) {
        Ok(n) => n.min(n_selected),
        Err(e) => {
            warn!("Falling back to every candidate being selected: {}", e);
            n_selected
        }
    }
}

/// Every source atom connects to every target atom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllToAllConnector {
    /// Whether an atom connects to itself when source and target coincide
    #[serde(default = "default_true")]
    pub allow_self_connections: bool,
}

impl AllToAllConnector {
    /// Create an all-to-all connector
    pub const fn new(allow_self_connections: bool) -> Self {
        Self {
            allow_self_connections,
        }
    }
}

impl Default for AllToAllConnector {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Connector for AllToAllConnector {
    fn name(&self) -> &'static str {
        "all_to_all"
    }

    fn max_connections_to_post(&self, n_pre_atoms: u32, _n_post_atoms: u32) -> u64 {
        u64::from(n_pre_atoms)
    }

    fn max_connections_from_pre(&self, _n_pre: u32, _n_post: u32, n_post_slice_atoms: u32) -> u64 {
        u64::from(n_post_slice_atoms)
    }

    fn max_total_connections(&self, n_pre_atoms: u32, n_post_atoms: u32) -> u64 {
        u64::from(n_pre_atoms) * u64::from(n_post_atoms)
    }

    fn generator_params_size_in_bytes(&self) -> Option<u64> {
        Some(BYTES_PER_WORD)
    }
}

/// Atom `i` of the source connects to atom `i` of the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OneToOneConnector;

impl Connector for OneToOneConnector {
    fn name(&self) -> &'static str {
        "one_to_one"
    }

    fn max_connections_to_post(&self, n_pre_atoms: u32, _n_post_atoms: u32) -> u64 {
        u64::from(n_pre_atoms.min(1))
    }

    fn max_connections_from_pre(&self, _n_pre: u32, _n_post: u32, n_post_slice_atoms: u32) -> u64 {
        u64::from(n_post_slice_atoms.min(1))
    }

    fn max_total_connections(&self, n_pre_atoms: u32, n_post_atoms: u32) -> u64 {
        u64::from(n_pre_atoms.min(n_post_atoms))
    }

    fn generator_params_size_in_bytes(&self) -> Option<u64> {
        Some(0)
    }
}

/// Each source/target pair is connected independently with `p_connect`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedProbabilityConnector {
    /// Probability of any one pair being connected
    pub p_connect: f64,
    /// Whether an atom connects to itself when source and target coincide
    #[serde(default = "default_true")]
    pub allow_self_connections: bool,
}

impl FixedProbabilityConnector {
    /// Create a fixed-probability connector, clamping `p_connect` into `[0, 1]`
    pub fn new(p_connect: f64, allow_self_connections: bool) -> Self {
        Self {
            p_connect: p_connect.clamp(0.0, 1.0),
            allow_self_connections,
        }
    }
}

impl Connector for FixedProbabilityConnector {
    fn name(&self) -> &'static str {
        "fixed_probability"
    }

    fn max_connections_to_post(&self, n_pre_atoms: u32, n_post_atoms: u32) -> u64 {
        probable_maximum_selected(
            self.max_total_connections(n_pre_atoms, n_post_atoms),
            u64::from(n_pre_atoms),
            self.p_connect,
        )
    }

    fn max_connections_from_pre(
        &self,
        n_pre_atoms: u32,
        n_post_atoms: u32,
        n_post_slice_atoms: u32,
    ) -> u64 {
        probable_maximum_selected(
            self.max_total_connections(n_pre_atoms, n_post_atoms),
            u64::from(n_post_slice_atoms),
            self.p_connect,
        )
    }

    fn max_total_connections(&self, n_pre_atoms: u32, n_post_atoms: u32) -> u64 {
        u64::from(n_pre_atoms) * u64::from(n_post_atoms)
    }

    fn generator_params_size_in_bytes(&self) -> Option<u64> {
        Some(2 * BYTES_PER_WORD)
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const NATIVE: DelayRange = DelayRange::new(0.0, 16.0);
    const DELAYED: DelayRange = DelayRange::new(17.0, 144.0);

    #[test]
    fn test_all_to_all_bounds() {
        let c = AllToAllConnector::new(true);
        assert_eq!(c.max_connections_to_post(100, 50), 100);
        assert_eq!(c.max_connections_from_pre(100, 50, 25), 25);
        assert_eq!(c.max_total_connections(100, 50), 5000);
        assert_eq!(c.generator_params_size_in_bytes(), Some(4));
        assert!(c.generates_on_core());
    }

    #[test]
    fn test_fixed_delay_selects_one_block() {
        let c = AllToAllConnector::new(true);
        let delays = ParameterValue::Fixed(1.0);
        assert_eq!(c.max_row_length(100, 50, 50, &delays, NATIVE), 50);
        assert_eq!(c.max_row_length(100, 50, 50, &delays, DELAYED), 0);
    }

    #[test]
    fn test_spread_delays_split_rows() {
        let c = AllToAllConnector::new(true);
        let delays = ParameterValue::Uniform { low: 1.0, high: 31.0 };
        let native = c.max_row_length(100, 100, 100, &delays, NATIVE);
        let delayed = c.max_row_length(100, 100, 100, &delays, DELAYED);
        assert!(native > 0 && native <= 100);
        assert!(delayed > 0 && delayed <= 100);
    }

    #[test]
    fn test_one_to_one_bounds() {
        let c = OneToOneConnector;
        assert_eq!(c.max_connections_to_post(10, 10), 1);
        assert_eq!(c.max_connections_from_pre(10, 10, 5), 1);
        assert_eq!(c.max_total_connections(10, 4), 4);
        assert_eq!(c.generator_params_size_in_bytes(), Some(0));
    }

    #[test]
    fn test_fixed_probability_bounds() {
        let c = FixedProbabilityConnector::new(0.1, true);
        let to_post = c.max_connections_to_post(1000, 1000);
        assert!(to_post > 100, "probable maximum should exceed the mean");
        assert!(to_post < 1000);
        assert_eq!(FixedProbabilityConnector::new(1.0, true).max_connections_to_post(50, 50), 50);
        assert_eq!(FixedProbabilityConnector::new(0.0, true).max_connections_to_post(50, 50), 0);
    }

    #[test]
    fn test_probable_maximum_selected_edges() {
        assert_eq!(probable_maximum_selected(10, 0, 0.5), 0);
        assert_eq!(probable_maximum_selected(10, 7, 1.0), 7);
        let n = probable_maximum_selected(100, 100, 0.5);
        assert!((50..=100).contains(&n));
    }

    #[test]
    fn test_weight_statistics_use_magnitudes() {
        let c = AllToAllConnector::new(true);
        let w = ParameterValue::Fixed(-0.5);
        assert_eq!(c.weight_mean(&w), 0.5);
        assert_eq!(c.weight_maximum(&w, 10, 10), 0.5);
        assert_eq!(c.weight_variance(&w), 0.0);
    }
}
