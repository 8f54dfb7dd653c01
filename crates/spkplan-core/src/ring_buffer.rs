//! Fixed-point scaling of synaptic input
//!
//! Each synapse type accumulates incoming weights in a ring buffer of 16-bit
//! fixed-point values. The left shift chosen here sets how much of the
//! mantissa is spent on range: too small and the buffer saturates, too large
//! and small weights round to zero. The bound on the accumulated weight is
//! either exact (all delays equal, so every spike of a tick lands in the same
//! slot) or a Poisson tail bound `mean + sigma * sd`.

use log::{debug, trace, warn};
use spkplan_math::{ln_gamma, upper_regularized_gamma, RunningStats};

use crate::constants::{
    GAMMA_LOG_RATIO_LIMIT, MICRO_TO_SECOND_CONVERSION, POISSON_SIGMA_SUMMATION_LIMIT,
    WEIGHT_FIXED_POINT_BITS,
};
use crate::neuron::NeuronCosts;
use crate::projection::IncomingProjection;

/// Shift and weight scale of one synapse type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingBufferShift {
    /// Synapse type
    pub synapse_type: u32,
    /// Left shift from ring buffer to neuron input
    pub shift: u32,
    /// Multiplier converting a weight to its fixed-point value, including
    /// the model's global weight scale
    pub weight_scale: f64,
}

/// Multiplier converting a weight to a 16-bit value that, shifted left by
/// `shift`, yields the neuron input: `2^(16 - (shift + 1))`
pub fn weight_scale_for_shift(shift: u32) -> f64 {
    let exponent = i64::from(WEIGHT_FIXED_POINT_BITS) - (i64::from(shift) + 1);
    2f64.powi(exponent.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
}

/// Smallest shift that represents `bound` with headroom, plus a sign bit when
/// `signed`
///
/// An infinite bound takes the shift of the largest finite `f64`.
pub fn shift_for_bound(bound: f64, signed: bool) -> u32 {
    let mut shift = if bound.is_nan() || bound <= 0.0 {
        0
    } else {
        bound.log2().clamp(0.0, f64::from(f64::MAX_EXP)).ceil() as u32
    };
    // The buffer holds values strictly below 2^shift
    if 2f64.powi(shift as i32) <= bound {
        shift = shift.saturating_add(1);
    }
    if signed {
        shift = shift.saturating_add(1);
    }
    shift
}

/// Upper bound on the weight accumulated in one tick from `n_synapses_in`
/// synapses firing Poisson at `spikes_per_second`, `sigma` standard
/// deviations above the mean
pub fn expected_upper_bound(
    weight_mean: f64,
    weight_std_dev: f64,
    spikes_per_second: f64,
    timestep_us: f64,
    n_synapses_in: u64,
    sigma: f64,
) -> f64 {
    let steps_per_second = MICRO_TO_SECOND_CONVERSION / timestep_us;
    let average_spikes_per_timestep = n_synapses_in as f64 * spikes_per_second / steps_per_second;

    // Variance of the spike count alone
    let poisson_variance = average_spikes_per_timestep * weight_mean * weight_mean;

    let weight_variance = if weight_std_dev > 0.0 && average_spikes_per_timestep > 0.0 {
        weight_variance_term(average_spikes_per_timestep, weight_std_dev)
    } else {
        0.0
    };

    average_spikes_per_timestep * weight_mean + sigma * (poisson_variance + weight_variance).sqrt()
}

/// Variance added by the weight distribution, summed over spike counts up to
/// the Poisson cut-off in closed form
fn weight_variance_term(avg: f64, weight_std_dev: f64) -> f64 {
    let upper_bound = (avg + POISSON_SIGMA_SUMMATION_LIMIT * avg.sqrt()).round_ties_even();
    let big_ratio = avg.ln() * upper_bound - ln_gamma(1.0 + upper_bound);
    let in_range = -GAMMA_LOG_RATIO_LIMIT < big_ratio && big_ratio < GAMMA_LOG_RATIO_LIMIT;
    if !in_range || big_ratio == 0.0 {
        trace!("Skipping weight variance, log ratio {} out of range", big_ratio);
        return 0.0;
    }
    let gammai = match upper_regularized_gamma(1.0 + upper_bound, avg) {
        Ok(g) => g,
        Err(e) => {
            warn!("Dropping weight variance term: {}", e);
            return 0.0;
        }
    };
    let spread = avg.exp() * gammai - big_ratio.exp();
    if !(spread.is_finite() && spread > 0.0) {
        warn!(
            "Dropping weight variance term: non-positive spread {} at {} spikes per tick",
            spread, avg
        );
        return 0.0;
    }
    let log_weight_variance = -avg + avg.ln() + 2.0 * weight_std_dev.ln() + spread.ln();
    let variance = log_weight_variance.exp();
    if variance.is_finite() {
        variance
    } else {
        warn!("Dropping non-finite weight variance term at {} spikes per tick", avg);
        0.0
    }
}

/// Accumulated input statistics of one synapse type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SynapseTypeStats {
    /// Weight means against connection counts
    pub weights: RunningStats,
    /// Delay spread against connection counts
    pub delays: RunningStats,
    /// Source rates against connection counts
    pub rates: RunningStats,
    /// Worst-case weight arriving in one tick
    pub total_weight: f64,
    /// Largest single weight
    pub biggest_weight: f64,
    /// Whether any contributing weight can be negative
    pub signed: bool,
}

impl SynapseTypeStats {
    /// Bound on the accumulated weight in one tick
    pub fn bound(&self, sigma: f64, timestep_us: f64) -> f64 {
        if self.delays.variance() == 0.0 {
            return self.total_weight.max(self.biggest_weight);
        }
        let statistical = expected_upper_bound(
            self.weights.mean(),
            self.weights.standard_deviation(),
            self.rates.mean(),
            timestep_us,
            self.weights.n_items(),
            sigma,
        );
        statistical.min(self.total_weight).max(self.biggest_weight)
    }
}

/// Derives ring-buffer shifts for every synapse type of a population
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingBufferScaleSolver {
    sigma: f64,
    spikes_per_second: f64,
}

impl RingBufferScaleSolver {
    /// Solver bounding at `sigma` standard deviations, assuming sources without
    /// a known maximum fire at `spikes_per_second`
    pub fn new(sigma: f64, spikes_per_second: f64) -> Self {
        Self {
            sigma,
            spikes_per_second,
        }
    }

    /// Accumulate the statistics of each synapse type
    pub fn type_stats(
        &self,
        projections: &[IncomingProjection],
        n_post_atoms: u32,
        neuron: &dyn NeuronCosts,
        timestep_us: f64,
    ) -> Vec<SynapseTypeStats> {
        let weight_scale = neuron.global_weight_scale();
        let steps_per_second = MICRO_TO_SECOND_CONVERSION / timestep_us;
        let mut stats = vec![SynapseTypeStats::default(); neuron.n_synapse_types() as usize];

        for projection in projections {
            let Some(entry) = stats.get_mut(projection.synapse_type() as usize) else {
                warn!(
                    "Ignoring projection from {} onto missing synapse type {}",
                    projection.source().label(),
                    projection.synapse_type()
                );
                continue;
            };
            let connector = projection.connector();
            let dynamics = projection.dynamics();
            let source = projection.source();
            let n_pre = source.n_atoms();

            let n_connections = connector.max_connections_to_post(n_pre, n_post_atoms);
            let weight_mean =
                dynamics.weight_mean(connector, projection.weights(), n_pre, n_post_atoms) * weight_scale;
            let weight_variance =
                dynamics.weight_variance(connector, projection.weights()) * weight_scale * weight_scale;
            entry.weights.add_items(weight_mean, weight_variance, n_connections);

            let delay_variance = dynamics.delay_variance(connector, projection.delays());
            entry.delays.add_items(0.0, delay_variance, n_connections);

            let weight_max =
                dynamics.weight_maximum(connector, projection.weights(), n_pre, n_post_atoms) * weight_scale;
            entry.biggest_weight = entry.biggest_weight.max(weight_max);

            let mut spikes_per_tick = (self.spikes_per_second / steps_per_second).max(1.0);
            let mut spikes_per_second = self.spikes_per_second;
            if let Some(max_spikes) = source.max_spikes() {
                let rate = max_spikes.max_spikes_per_second();
                if rate != 0.0 {
                    spikes_per_second = rate;
                }
                spikes_per_tick = max_spikes.max_spikes_per_tick(timestep_us);
            }
            entry.rates.add_items(spikes_per_second, 0.0, n_connections);
            entry.total_weight += spikes_per_tick * weight_max * n_connections as f64;

            entry.signed |= dynamics.are_weights_signed();
            trace!(
                "{} -> type {}: {} connections, mean {}, max {}, {} spikes/tick",
                source.label(),
                projection.synapse_type(),
                n_connections,
                weight_mean,
                weight_max,
                spikes_per_tick
            );
        }
        stats
    }

    /// Shift and weight scale for every synapse type
    pub fn solve(
        &self,
        projections: &[IncomingProjection],
        n_post_atoms: u32,
        neuron: &dyn NeuronCosts,
        timestep_us: f64,
    ) -> Vec<RingBufferShift> {
        let global_scale = neuron.global_weight_scale();
        self.type_stats(projections, n_post_atoms, neuron, timestep_us)
            .iter()
            .enumerate()
            .map(|(synapse_type, stats)| {
                let bound = stats.bound(self.sigma, timestep_us);
                let shift = shift_for_bound(bound, stats.signed);
                debug!(
                    "Synapse type {}: bound {} (signed {}) -> shift {}",
                    synapse_type, bound, stats.signed, shift
                );
                RingBufferShift {
                    synapse_type: synapse_type as u32,
                    shift,
                    weight_scale: weight_scale_for_shift(shift) * global_scale,
                }
            })
            .collect()
    }
}
