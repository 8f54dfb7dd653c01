//! Largest rows a projection can produce on one core

use crate::connector::DelayRange;
use crate::constants::MAX_SUPPORTED_DELAY_TICS;
use crate::projection::IncomingProjection;
use crate::slice::VertexSlice;

/// Longest rows of a projection's undelayed and delayed matrices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MaxRowInfo {
    /// Synapses in the longest undelayed row
    pub undelayed_max_n_synapses: u64,
    /// Bytes of the longest undelayed row
    pub undelayed_max_bytes: u64,
    /// Synapses in the longest delayed row
    pub delayed_max_n_synapses: u64,
    /// Bytes of the longest delayed row
    pub delayed_max_bytes: u64,
}

/// Longest delay the core applies natively, in ms
pub fn max_native_delay_ms(timestep_us: f64) -> f64 {
    f64::from(MAX_SUPPORTED_DELAY_TICS) * timestep_us / 1000.0
}

/// Extra delay stages a delay of `max_delay_ms` needs at `timestep_us`
pub fn n_delay_stages_for(max_delay_ms: f64, timestep_us: f64) -> u32 {
    if !(max_delay_ms.is_finite() && timestep_us > 0.0) {
        return 0;
    }
    let ticks = (max_delay_ms * 1000.0 / timestep_us).ceil();
    let native = f64::from(MAX_SUPPORTED_DELAY_TICS);
    if ticks <= native {
        return 0;
    }
    ((ticks / native).ceil() as u32).saturating_sub(1)
}

/// Maximum row sizes of `projection` targeting `post_slice` of a population
/// of `n_post_atoms` atoms
pub fn max_row_info(
    projection: &IncomingProjection,
    n_post_atoms: u32,
    post_slice: &VertexSlice,
    timestep_us: f64,
) -> MaxRowInfo {
    let connector = projection.connector();
    let dynamics = projection.dynamics();
    let n_pre = projection.source().n_atoms();
    let n_delay_stages = projection.n_delay_stages(timestep_us);

    let max_native = max_native_delay_ms(timestep_us);
    let undelayed_max_n_synapses = connector.max_row_length(
        n_pre,
        n_post_atoms,
        post_slice.n_atoms(),
        projection.delays(),
        DelayRange::new(0.0, max_native),
    );

    let delayed_max_n_synapses = if n_delay_stages == 0 {
        0
    } else {
        let max_delay = max_native * f64::from(n_delay_stages + 1);
        connector.max_row_length(
            n_pre,
            n_post_atoms,
            post_slice.n_atoms(),
            projection.delays(),
            DelayRange::new(max_native * (1.0 + f64::EPSILON), max_delay),
        )
    };

    MaxRowInfo {
        undelayed_max_n_synapses,
        undelayed_max_bytes: dynamics.row_size_in_bytes(undelayed_max_n_synapses),
        delayed_max_n_synapses,
        delayed_max_bytes: dynamics.row_size_in_bytes(delayed_max_n_synapses),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::connector::AllToAllConnector;
    use crate::params::ParameterValue;
    use crate::source::{SourceId, SourceVertex};

    fn projection(delays: ParameterValue) -> IncomingProjection {
        let source = Arc::new(SourceVertex::new(SourceId(0), "in", 100, 50).unwrap());
        IncomingProjection::new(source, 0, Arc::new(AllToAllConnector::new(true))).with_delays(delays)
    }

    #[test]
    fn test_delay_stages() {
        assert_eq!(n_delay_stages_for(1.0, 1000.0), 0);
        assert_eq!(n_delay_stages_for(16.0, 1000.0), 0);
        assert_eq!(n_delay_stages_for(17.0, 1000.0), 1);
        assert_eq!(n_delay_stages_for(32.0, 1000.0), 1);
        assert_eq!(n_delay_stages_for(33.0, 1000.0), 2);
        assert_eq!(n_delay_stages_for(3.5, 100.0), 2);
        assert_eq!(n_delay_stages_for(f64::NAN, 1000.0), 0);
    }

    #[test]
    fn test_short_fixed_delay_only_undelayed() {
        let slice = VertexSlice::new(0, 20).unwrap();
        let info = max_row_info(&projection(ParameterValue::Fixed(1.0)), 40, &slice, 1000.0);
        assert_eq!(info.undelayed_max_n_synapses, 20);
        assert_eq!(info.undelayed_max_bytes, (3 + 20) * 4);
        assert_eq!(info.delayed_max_n_synapses, 0);
        assert_eq!(info.delayed_max_bytes, 0);
    }

    #[test]
    fn test_long_fixed_delay_only_delayed() {
        let slice = VertexSlice::new(0, 20).unwrap();
        let info = max_row_info(&projection(ParameterValue::Fixed(20.0)), 40, &slice, 1000.0);
        assert_eq!(info.undelayed_max_n_synapses, 0);
        assert_eq!(info.delayed_max_n_synapses, 20);
    }
}
