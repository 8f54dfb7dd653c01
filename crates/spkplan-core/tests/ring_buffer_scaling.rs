//! Ring-buffer shifts derived through a population

use std::sync::Arc;

use spkplan_core::dynamics::{StdpDynamics, TimingRule, WeightRule};
use spkplan_core::ring_buffer::{shift_for_bound, weight_scale_for_shift};
use spkplan_core::{
    AllToAllConnector, IncomingProjection, MaxSpikeSource, NeuronModel, ParameterValue,
    PlanningConfig, Population, RingBufferScaleSolver, SourceId, SourceVertex, SynapseDynamics,
};

const TIMESTEP_US: f64 = 1000.0;

fn population() -> Population {
    Population::new("target", 100, Arc::new(NeuronModel::if_curr_exp()), &PlanningConfig::default())
        .unwrap()
}

fn all_to_all(id: u32, n_pre: u32) -> IncomingProjection {
    let source = Arc::new(SourceVertex::new(SourceId(id), format!("src{}", id), n_pre, 256).unwrap());
    IncomingProjection::new(source, 0, Arc::new(AllToAllConnector::new(true)))
}

fn stdp(w_min: f64) -> SynapseDynamics {
    SynapseDynamics::Stdp(
        StdpDynamics::new(
            TimingRule::SpikePair { tau_plus: 20.0, tau_minus: 20.0 },
            WeightRule::Additive { w_min, w_max: 2.0, a_plus: 0.01, a_minus: 0.01 },
        )
        .unwrap(),
    )
}

#[test]
fn concrete_scenario_matches_formula() {
    let mut pop = population();
    pop.set_spikes_per_second(10.0).unwrap();
    // Spread delays take the statistical path
    pop.add_projection(
        all_to_all(0, 100)
            .with_weights(1.0)
            .with_delays(ParameterValue::Uniform { low: 1.0, high: 10.0 }),
    )
    .unwrap();

    let weight_mean = 1.0_f64;
    let sigma = 5.0;
    let avg = 100.0 * 10.0 / (1_000_000.0 / TIMESTEP_US);
    assert_eq!(avg, 1.0);
    let statistical = avg * weight_mean + sigma * (avg * weight_mean * weight_mean).sqrt();
    let total = 1.0 * weight_mean * 100.0;
    let bound = statistical.min(total).max(weight_mean);
    let expected = shift_for_bound(bound, false);

    let shifts = pop.ring_buffer_shifts(TIMESTEP_US).to_vec();
    assert_eq!(shifts[0].shift, expected);
    assert_eq!(shifts[0].shift, 3);
    assert_eq!(shifts[0].weight_scale, weight_scale_for_shift(expected));
    // No input on the inhibitory type
    assert_eq!(shifts[1].shift, 0);
}

#[test]
fn fixed_delay_takes_exact_bound() {
    let mut pop = population();
    pop.add_projection(all_to_all(0, 1000).with_weights(1.0).with_delays(1.0))
        .unwrap();

    let solver = RingBufferScaleSolver::new(pop.ring_buffer_sigma(), pop.spikes_per_second());
    let stats = solver.type_stats(pop.projections(), pop.n_atoms(), pop.neuron(), TIMESTEP_US);
    assert_eq!(stats[0].delays.variance(), 0.0);
    assert_eq!(stats[0].bound(5.0, TIMESTEP_US), 1000.0);

    // The statistical bound would be far lower
    let statistical = 30.0 + 5.0 * 30.0_f64.sqrt();
    assert!(shift_for_bound(statistical, false) < shift_for_bound(1000.0, false));

    let shifts = pop.ring_buffer_shifts(TIMESTEP_US);
    assert_eq!(shifts[0].shift, shift_for_bound(1000.0, false));
    assert_eq!(shifts[0].shift, 10);
}

#[test]
fn signed_weights_add_one_bit() {
    let mut unsigned = population();
    unsigned
        .add_projection(all_to_all(0, 50).with_weights(0.5).with_dynamics(stdp(0.0)))
        .unwrap();
    let mut signed = population();
    signed
        .add_projection(all_to_all(0, 50).with_weights(0.5).with_dynamics(stdp(-1.0)))
        .unwrap();

    let a = unsigned.ring_buffer_shifts(TIMESTEP_US)[0].shift;
    let b = signed.ring_buffer_shifts(TIMESTEP_US)[0].shift;
    assert_eq!(b, a + 1);
}

#[test]
fn adding_projection_changes_shifts() {
    let mut pop = population();
    pop.add_projection(all_to_all(0, 10)).unwrap();
    let before = pop.ring_buffer_shifts(TIMESTEP_US)[0].shift;

    pop.add_projection(all_to_all(1, 1000)).unwrap();
    let after = pop.ring_buffer_shifts(TIMESTEP_US)[0].shift;
    assert!(after > before);
}

#[test]
fn known_source_rate_overrides_default() {
    let slow = Arc::new(
        SourceVertex::new(SourceId(0), "poisson", 100, 256)
            .unwrap()
            .with_max_spikes(MaxSpikeSource::Poisson { max_rate_hz: 1.0 })
            .unwrap(),
    );
    let fast = Arc::new(
        SourceVertex::new(SourceId(0), "poisson", 100, 256)
            .unwrap()
            .with_max_spikes(MaxSpikeSource::Poisson { max_rate_hz: 5000.0 })
            .unwrap(),
    );
    let connector = Arc::new(AllToAllConnector::new(true));

    let mut a = population();
    a.add_projection(IncomingProjection::new(slow, 0, connector.clone())).unwrap();
    let mut b = population();
    b.add_projection(IncomingProjection::new(fast, 0, connector)).unwrap();

    // Fixed delays: bound is spikes per tick times total weight
    let slow_shift = a.ring_buffer_shifts(TIMESTEP_US)[0].shift;
    let fast_shift = b.ring_buffer_shifts(TIMESTEP_US)[0].shift;
    assert_eq!(slow_shift, shift_for_bound(100.0, false));
    assert!(fast_shift > slow_shift);
}

#[test]
fn conductance_model_scales_weights() {
    let mut pop = Population::new(
        "cond",
        10,
        Arc::new(NeuronModel::if_cond_exp()),
        &PlanningConfig::default(),
    )
    .unwrap();
    pop.add_projection(all_to_all(0, 10).with_weights(0.01)).unwrap();
    let shift = pop.ring_buffer_shifts(TIMESTEP_US)[0];
    // 10 connections of 0.01 * 1024 each
    assert_eq!(shift.shift, shift_for_bound(10.0 * 0.01 * 1024.0, false));
    assert_eq!(shift.weight_scale, weight_scale_for_shift(shift.shift) * 1024.0);
}
