//! The pre-synaptic side of a projection

use log::warn;

use crate::constants::{
    MICRO_TO_SECOND_CONVERSION, POISSON_CHANCE_TICKS, SLOW_RATE_PER_TICK_CUTOFF,
};
use crate::error::{PlanError, Result};

/// Identifier of a source vertex; projections sharing it share routing entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId(pub u32);

impl SourceId {
    /// Create a new source ID
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub const fn raw(&self) -> u32 {
        self.0
    }
}

/// Spike source whose worst-case output is known in advance
#[derive(Debug, Clone, PartialEq)]
pub enum MaxSpikeSource {
    /// Poisson generator with a maximum rate across its atoms
    Poisson {
        /// Highest rate of any atom (Hz)
        max_rate_hz: f64,
    },
    /// Explicit spike times shared by every atom
    SpikeArray {
        /// Spike times in milliseconds
        spike_times_ms: Vec<f64>,
    },
}

impl MaxSpikeSource {
    /// Check that rates and spike times are finite and non-negative
    pub fn validate(&self) -> Result<()> {
        let usable = |v: f64| v.is_finite() && v >= 0.0;
        match self {
            Self::Poisson { max_rate_hz } if !usable(*max_rate_hz) => Err(
                PlanError::invalid_parameter("max_rate_hz", max_rate_hz.to_string(), "finite and >= 0"),
            ),
            Self::SpikeArray { spike_times_ms } => match spike_times_ms.iter().find(|t| !usable(**t)) {
                Some(t) => Err(PlanError::invalid_parameter(
                    "spike_times_ms",
                    t.to_string(),
                    "finite and >= 0",
                )),
                None => Ok(()),
            },
            _ => Ok(()),
        }
    }

    /// Highest number of spikes any atom emits in one second
    pub fn max_spikes_per_second(&self) -> f64 {
        match self {
            Self::Poisson { max_rate_hz } => *max_rate_hz,
            Self::SpikeArray { spike_times_ms } => {
                let mut times = spike_times_ms.clone();
                times.sort_by(f64::total_cmp);
                let mut best = 0usize;
                let mut start = 0usize;
                for end in 0..times.len() {
                    while times[end] - times[start] >= 1000.0 {
                        start += 1;
                    }
                    best = best.max(end - start + 1);
                }
                best as f64
            }
        }
    }

    /// Highest number of spikes any atom emits in one timer tick
    pub fn max_spikes_per_tick(&self, timestep_us: f64) -> f64 {
        match self {
            Self::Poisson { max_rate_hz } => {
                let ticks_per_second = MICRO_TO_SECOND_CONVERSION / timestep_us;
                let rate_per_tick = max_rate_hz / ticks_per_second;
                if rate_per_tick < SLOW_RATE_PER_TICK_CUTOFF {
                    return 1.0;
                }
                let p = 1.0 - 1.0 / POISSON_CHANCE_TICKS;
                match spkplan_math::poisson_quantile(p, rate_per_tick) {
                    Ok(k) => k as f64 + 1.0,
                    Err(e) => {
                        warn!("Poisson quantile unavailable ({}); using mean rate", e);
                        rate_per_tick.ceil() + 1.0
                    }
                }
            }
            Self::SpikeArray { spike_times_ms } => {
                let mut ticks: Vec<i64> = spike_times_ms
                    .iter()
                    .map(|t| (t * 1000.0 / timestep_us).floor() as i64)
                    .collect();
                ticks.sort_unstable();
                ticks
                    .chunk_by(|a, b| a == b)
                    .map(|run| run.len())
                    .max()
                    .unwrap_or(0) as f64
            }
        }
    }
}

/// Source population of a projection, as seen from the target
#[derive(Debug, Clone, PartialEq)]
pub struct SourceVertex {
    id: SourceId,
    label: String,
    n_atoms: u32,
    max_atoms_per_core: u32,
    n_machine_vertices: Option<u32>,
    max_spikes: Option<MaxSpikeSource>,
}

impl SourceVertex {
    /// Create a source of `n_atoms` split into cores of `max_atoms_per_core`
    pub fn new(
        id: SourceId,
        label: impl Into<String>,
        n_atoms: u32,
        max_atoms_per_core: u32,
    ) -> Result<Self> {
        if n_atoms == 0 {
            return Err(PlanError::invalid_parameter("n_atoms", "0", "> 0"));
        }
        if max_atoms_per_core == 0 {
            return Err(PlanError::invalid_parameter("max_atoms_per_core", "0", "> 0"));
        }
        Ok(Self {
            id,
            label: label.into(),
            n_atoms,
            max_atoms_per_core,
            n_machine_vertices: None,
            max_spikes: None,
        })
    }

    /// Record how many machine vertices partitioning actually produced
    pub fn with_machine_vertices(mut self, n_machine_vertices: u32) -> Self {
        self.n_machine_vertices = Some(n_machine_vertices);
        self
    }

    /// Declare a known worst-case spike output
    pub fn with_max_spikes(mut self, max_spikes: MaxSpikeSource) -> Result<Self> {
        max_spikes.validate()?;
        self.max_spikes = Some(max_spikes);
        Ok(self)
    }

    /// Source ID
    pub fn id(&self) -> SourceId {
        self.id
    }

    /// Human readable label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of atoms
    pub fn n_atoms(&self) -> u32 {
        self.n_atoms
    }

    /// Maximum atoms per core
    pub fn max_atoms_per_core(&self) -> u32 {
        self.max_atoms_per_core
    }

    /// Known worst-case spike output, if any
    pub fn max_spikes(&self) -> Option<&MaxSpikeSource> {
        self.max_spikes.as_ref()
    }

    /// Atoms in each sub-edge the source is split into
    pub fn atoms_per_sub_edge(&self) -> u32 {
        self.max_atoms_per_core.min(self.n_atoms)
    }

    /// Number of sub-edges the source will be split into
    pub fn n_sub_edges(&self) -> u32 {
        self.n_atoms.div_ceil(self.atoms_per_sub_edge())
    }

    /// Sub-edges after partitioning: the count partitioning produced when
    /// known, otherwise the computed split
    pub fn n_partitioned_sub_edges(&self) -> u32 {
        match self.n_machine_vertices {
            Some(n) if n > 0 => n,
            _ => self.n_sub_edges(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_edges() {
        let src = SourceVertex::new(SourceId(1), "in", 250, 100).unwrap();
        assert_eq!(src.atoms_per_sub_edge(), 100);
        assert_eq!(src.n_sub_edges(), 3);
        assert_eq!(src.n_partitioned_sub_edges(), 3);

        let small = SourceVertex::new(SourceId(2), "tiny", 10, 256).unwrap();
        assert_eq!(small.atoms_per_sub_edge(), 10);
        assert_eq!(small.n_sub_edges(), 1);
    }

    #[test]
    fn test_partitioned_count_preferred() {
        let src = SourceVertex::new(SourceId(1), "in", 250, 100)
            .unwrap()
            .with_machine_vertices(5);
        assert_eq!(src.n_partitioned_sub_edges(), 5);
        assert_eq!(src.n_sub_edges(), 3);
    }

    #[test]
    fn test_invalid_source() {
        assert!(SourceVertex::new(SourceId(0), "x", 0, 10).is_err());
        assert!(SourceVertex::new(SourceId(0), "x", 10, 0).is_err());
    }

    #[test]
    fn test_slow_poisson_one_spike_per_tick() {
        let src = MaxSpikeSource::Poisson { max_rate_hz: 5.0 };
        assert_eq!(src.max_spikes_per_tick(1000.0), 1.0);
        assert_eq!(src.max_spikes_per_second(), 5.0);
    }

    #[test]
    fn test_fast_poisson_exceeds_mean() {
        let src = MaxSpikeSource::Poisson { max_rate_hz: 2000.0 };
        // two spikes per tick on average
        assert!(src.max_spikes_per_tick(1000.0) > 2.0);
    }

    #[test]
    fn test_spike_array_maxima() {
        let src = MaxSpikeSource::SpikeArray {
            spike_times_ms: vec![0.0, 0.2, 0.7, 5.0, 999.0, 1500.0],
        };
        assert_eq!(src.max_spikes_per_tick(1000.0), 3.0);
        assert_eq!(src.max_spikes_per_second(), 5.0);

        let empty = MaxSpikeSource::SpikeArray { spike_times_ms: vec![] };
        assert_eq!(empty.max_spikes_per_tick(1000.0), 0.0);
        assert_eq!(empty.max_spikes_per_second(), 0.0);
    }

    #[test]
    fn test_unusable_spike_sources_rejected() {
        let src = || SourceVertex::new(SourceId(3), "gen", 10, 10).unwrap();
        assert!(src()
            .with_max_spikes(MaxSpikeSource::Poisson { max_rate_hz: f64::INFINITY })
            .is_err());
        assert!(src()
            .with_max_spikes(MaxSpikeSource::Poisson { max_rate_hz: -1.0 })
            .is_err());
        assert!(src()
            .with_max_spikes(MaxSpikeSource::SpikeArray { spike_times_ms: vec![1.0, f64::NAN] })
            .is_err());
        assert!(src()
            .with_max_spikes(MaxSpikeSource::SpikeArray { spike_times_ms: vec![1.0e300, -2.0] })
            .is_err());
        assert!(src()
            .with_max_spikes(MaxSpikeSource::SpikeArray { spike_times_ms: vec![0.0, 12.5] })
            .is_ok());
    }
}
