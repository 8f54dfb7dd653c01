//! Property tests over randomly shaped inputs

use std::sync::Arc;

use proptest::prelude::*;
use spkplan_core::ring_buffer::{shift_for_bound, weight_scale_for_shift};
use spkplan_core::{
    AllToAllConnector, BinarySearchPopTable, FixedProbabilityConnector, IncomingProjection,
    MasterPopulationTable, NeuronModel, ParameterValue, PlanningConfig, Population,
    ResourceBudgetCalculator, SourceId, SourceVertex, SynapticMatrixLayoutPlanner, VertexSlice,
};

fn population(n_atoms: u32) -> Population {
    Population::new("target", n_atoms, Arc::new(NeuronModel::if_curr_exp()), &PlanningConfig::default())
        .unwrap()
}

fn projection(id: u32, n_pre: u32, max_per_core: u32, p_connect: f64, max_delay: f64) -> IncomingProjection {
    let source = Arc::new(SourceVertex::new(SourceId(id), "src", n_pre, max_per_core).unwrap());
    IncomingProjection::new(source, id % 2, Arc::new(FixedProbabilityConnector::new(p_connect, true)))
        .with_weights(ParameterValue::Normal { mean: 0.5, std_dev: 0.2 })
        .with_delays(ParameterValue::Uniform { low: 1.0, high: max_delay })
}

proptest! {
    #[test]
    fn weight_scale_identity(shift in 0u32..32) {
        prop_assert_eq!(weight_scale_for_shift(shift) * 2f64.powi(shift as i32 + 1), 65536.0);
    }

    #[test]
    fn shift_leaves_headroom(bound in 0.001f64..1.0e9, signed in any::<bool>()) {
        let shift = shift_for_bound(bound, signed);
        let range_bits = if signed { shift - 1 } else { shift };
        prop_assert!(2f64.powi(range_bits as i32) > bound);
    }

    #[test]
    fn shift_monotonic_in_sigma(
        n_pre in 1u32..2000,
        rate in 0.0f64..200.0,
        std_dev in 0.0f64..2.0,
        sigma_a in 0.1f64..10.0,
        sigma_b in 0.1f64..10.0,
    ) {
        let (low, high) = if sigma_a <= sigma_b { (sigma_a, sigma_b) } else { (sigma_b, sigma_a) };
        let shift_at = |sigma: f64| {
            let mut pop = population(100);
            pop.set_ring_buffer_sigma(sigma).unwrap();
            pop.set_spikes_per_second(rate).unwrap();
            let source = Arc::new(SourceVertex::new(SourceId(0), "src", n_pre, 256).unwrap());
            pop.add_projection(
                IncomingProjection::new(source, 0, Arc::new(AllToAllConnector::new(true)))
                    .with_weights(ParameterValue::Normal { mean: 1.0, std_dev })
                    .with_delays(ParameterValue::Uniform { low: 1.0, high: 10.0 }),
            )
            .unwrap();
            pop.ring_buffer_shifts(1000.0)[0].shift
        };
        prop_assert!(shift_at(low) <= shift_at(high));
    }

    #[test]
    fn matrix_blocks_aligned_and_ordered(
        shapes in prop::collection::vec((1u32..400, 1u32..128, 0.05f64..1.0, 2.0f64..60.0), 0..5),
        lo in 0u32..50,
        n in 1u32..100,
    ) {
        let projections: Vec<_> = shapes
            .iter()
            .enumerate()
            .map(|(i, &(n_pre, per_core, p, d))| projection(i as u32, n_pre, per_core, p, d))
            .collect();
        let slice = VertexSlice::new(lo, lo + n).unwrap();
        let table = BinarySearchPopTable;
        let layout = SynapticMatrixLayoutPlanner::new(&table).layout(&projections, 150, &slice, 1000.0);

        let mut cursor = 8;
        for p in &layout.projections {
            for block in p.undelayed.iter().chain(&p.delayed) {
                prop_assert_eq!(block.start_address % 16, 0);
                prop_assert!(block.start_address >= cursor);
                cursor = block.end_address();
            }
        }
        prop_assert_eq!(layout.total_bytes, cursor);
        prop_assert_eq!(table.next_allowed_address(cursor) % 16, 0);
    }

    #[test]
    fn estimate_idempotent(
        shapes in prop::collection::vec((1u32..300, 1u32..128, 0.05f64..1.0, 2.0f64..40.0), 0..4),
        n_atoms in 1u32..300,
    ) {
        let mut pop = population(n_atoms);
        for (i, &(n_pre, per_core, p, d)) in shapes.iter().enumerate() {
            pop.add_projection(projection(i as u32, n_pre, per_core, p, d)).unwrap();
        }
        let calc = ResourceBudgetCalculator::new(1000.0);
        let slice = VertexSlice::whole(n_atoms).unwrap();
        let first = calc.estimate(&mut pop, &slice);
        let second = calc.estimate(&mut pop, &slice);
        prop_assert_eq!(first, second);
    }
}
