//! Per-core resource budgets
//!
//! [`ResourceBudgetCalculator::estimate`] is the entry point of the planner:
//! it sums every memory region a core running one slice of a population will
//! allocate, along with its working memory and cycles per tick. Comparing the
//! totals against what a core offers is left to the caller.

use std::fmt;

use log::{debug, warn};
use serde::Serialize;

use crate::bit_field::{BitFieldEstimator, DefaultBitFieldEstimator};
use crate::constants::{
    BYTES_PER_WORD, BYTES_TILL_START_OF_GLOBAL_PARAMETERS, NEURON_BASE_DTCM_USAGE_IN_BYTES,
    NEURON_BASE_N_CPU_CYCLES, NEURON_BASE_N_CPU_CYCLES_PER_NEURON, PROVENANCE_SYSTEM_WORDS,
    SYSTEM_BYTES_REQUIREMENT, TDMA_N_ELEMENTS,
};
use crate::generator::GeneratorSizePlanner;
use crate::matrix_layout::SynapticMatrixLayoutPlanner;
use crate::pop_table::{BinarySearchPopTable, MasterPopulationTable};
use crate::population::Population;
use crate::ring_buffer::RingBufferShift;
use crate::slice::VertexSlice;

/// Counters a neuron core reports after a run, on top of the system ones
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvenanceEntry {
    /// Spikes received
    PreSynapticEventCount,
    /// Ring-buffer saturations
    SaturationCount,
    /// Input buffer overflows
    BufferOverflowCount,
    /// Timer tick reached
    CurrentTimerTick,
    /// Plastic weight saturations
    PlasticSynapticWeightSaturationCount,
    /// Lookups that found no rows
    GhostPopTableSearches,
    /// Bit fields that could not be read
    FailedToReadBitFields,
    /// DMA transfers completed
    DmaCompletes,
    /// Spikes processed
    SpikeProgressingCount,
    /// Keys missing from the master population table
    InvalidMasterPopHits,
    /// Spikes dropped by bit fields
    BitFieldFilteredCount,
    /// Rewiring attempts
    NRewires,
    /// Spikes arriving after their tick
    NLateSpikes,
    /// Peak input buffer occupancy
    MaxFilledSizeOfInputBuffer,
    /// Missed time-division slots
    TdmaMisses,
}

impl ProvenanceEntry {
    /// Every entry, in the order the core writes them
    pub const ALL: [ProvenanceEntry; 15] = [
        Self::PreSynapticEventCount,
        Self::SaturationCount,
        Self::BufferOverflowCount,
        Self::CurrentTimerTick,
        Self::PlasticSynapticWeightSaturationCount,
        Self::GhostPopTableSearches,
        Self::FailedToReadBitFields,
        Self::DmaCompletes,
        Self::SpikeProgressingCount,
        Self::InvalidMasterPopHits,
        Self::BitFieldFilteredCount,
        Self::NRewires,
        Self::NLateSpikes,
        Self::MaxFilledSizeOfInputBuffer,
        Self::TdmaMisses,
    ];

    /// Bytes of the provenance region
    pub fn region_size_in_bytes() -> u64 {
        (PROVENANCE_SYSTEM_WORDS + Self::ALL.len() as u64) * BYTES_PER_WORD
    }
}

/// Bytes of a profiling region holding `n_samples` samples
pub fn profile_region_size_in_bytes(n_samples: u64) -> u64 {
    BYTES_PER_WORD + n_samples * 2 * BYTES_PER_WORD
}

/// Bytes of every SDRAM region of one core
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SdramBreakdown {
    /// Simulation control
    pub system: u64,
    /// Neuron parameters and state
    pub neuron_params: u64,
    /// Recording header and channel metadata
    pub recording_static: u64,
    /// Recorded data for the run
    pub recording_variable: u64,
    /// Provenance counters
    pub provenance: u64,
    /// Synapse dynamics parameters
    pub synapse_dynamics: u64,
    /// Structural plasticity state
    pub structural_dynamics: u64,
    /// Synaptic matrices
    pub synaptic_matrix: u64,
    /// Master population table
    pub pop_table: u64,
    /// On-core generator parameters
    pub generator: u64,
    /// Profiling samples
    pub profile: u64,
    /// Bit-field filters
    pub bit_field_filter: u64,
    /// Bit-field key map
    pub bit_field_keys: u64,
    /// Bit-field builder
    pub bit_field_builder: u64,
}

impl SdramBreakdown {
    /// Bytes that do not depend on the run length
    pub fn fixed(&self) -> u64 {
        self.total() - self.recording_variable
    }

    /// All regions together
    pub fn total(&self) -> u64 {
        self.system
            + self.neuron_params
            + self.recording_static
            + self.recording_variable
            + self.provenance
            + self.synapse_dynamics
            + self.structural_dynamics
            + self.synaptic_matrix
            + self.pop_table
            + self.generator
            + self.profile
            + self.bit_field_filter
            + self.bit_field_keys
            + self.bit_field_builder
    }

    /// Named regions in the order they are laid out
    pub fn regions(&self) -> [(&'static str, u64); 14] {
        [
            ("system", self.system),
            ("neuron_params", self.neuron_params),
            ("recording_static", self.recording_static),
            ("recording_variable", self.recording_variable),
            ("provenance", self.provenance),
            ("synapse_dynamics", self.synapse_dynamics),
            ("structural_dynamics", self.structural_dynamics),
            ("synaptic_matrix", self.synaptic_matrix),
            ("pop_table", self.pop_table),
            ("generator", self.generator),
            ("profile", self.profile),
            ("bit_field_filter", self.bit_field_filter),
            ("bit_field_keys", self.bit_field_keys),
            ("bit_field_builder", self.bit_field_builder),
        ]
    }
}

/// Resources one core needs for one slice of a population
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceEstimate {
    /// Slice estimated
    pub slice: VertexSlice,
    /// SDRAM by region
    pub sdram: SdramBreakdown,
    /// Working memory
    pub dtcm_bytes: u64,
    /// Cycles per tick
    pub cpu_cycles: u64,
    /// Ring-buffer shifts the core will be loaded with
    pub ring_buffer_shifts: Vec<RingBufferShift>,
}

impl fmt::Display for ResourceEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: sdram {} bytes, dtcm {} bytes, {} cycles",
            self.slice,
            self.sdram.total(),
            self.dtcm_bytes,
            self.cpu_cycles
        )
    }
}

/// Sums the per-core costs of a population slice
#[derive(Debug)]
pub struct ResourceBudgetCalculator {
    timestep_us: f64,
    pop_table: Box<dyn MasterPopulationTable>,
    bit_fields: Box<dyn BitFieldEstimator>,
}

impl Default for ResourceBudgetCalculator {
    fn default() -> Self {
        Self::new(1000.0)
    }
}

impl ResourceBudgetCalculator {
    /// Calculator for a machine ticking every `timestep_us`, with a binary
    /// search population table and bit fields
    pub fn new(timestep_us: f64) -> Self {
        Self {
            timestep_us,
            pop_table: Box::new(BinarySearchPopTable),
            bit_fields: Box::new(DefaultBitFieldEstimator),
        }
    }

    /// Use a different master population table
    pub fn with_pop_table(mut self, pop_table: Box<dyn MasterPopulationTable>) -> Self {
        self.pop_table = pop_table;
        self
    }

    /// Use a different bit-field estimator
    pub fn with_bit_field_estimator(mut self, bit_fields: Box<dyn BitFieldEstimator>) -> Self {
        self.bit_fields = bit_fields;
        self
    }

    /// Timestep the calculator plans for
    pub fn timestep_us(&self) -> f64 {
        self.timestep_us
    }

    /// Working memory of a core running `slice`
    pub fn dtcm_usage_in_bytes(population: &Population, slice: &VertexSlice) -> u64 {
        let n = slice.n_atoms();
        NEURON_BASE_DTCM_USAGE_IN_BYTES
            + population.neuron().dtcm_usage_in_bytes(n)
            + population.recorder().dtcm_usage_in_bytes(n)
    }

    /// Cycles per tick of a core running `slice`
    pub fn cpu_cycles(population: &Population, slice: &VertexSlice) -> u64 {
        let n = slice.n_atoms();
        NEURON_BASE_N_CPU_CYCLES
            + NEURON_BASE_N_CPU_CYCLES_PER_NEURON * u64::from(n)
            + population.neuron().n_cpu_cycles(n)
            + population.recorder().n_cpu_cycles(n)
    }

    /// SDRAM of a core running `slice`, by region
    pub fn sdram_usage(&self, population: &Population, slice: &VertexSlice) -> SdramBreakdown {
        let n = slice.n_atoms();
        let neuron = population.neuron();
        let recorder = population.recorder();
        let dynamics = population.synapse_dynamics();
        let projections = population.projections();

        let structural: Vec<_> = projections
            .iter()
            .filter(|p| p.dynamics().supports_structural_sizing())
            .collect();
        let n_structural_sub_edges: u64 = structural
            .iter()
            .map(|p| u64::from(p.source().n_partitioned_sub_edges()))
            .sum();

        SdramBreakdown {
            system: SYSTEM_BYTES_REQUIREMENT,
            neuron_params: BYTES_TILL_START_OF_GLOBAL_PARAMETERS
                + TDMA_N_ELEMENTS * BYTES_PER_WORD
                + neuron.sdram_usage_in_bytes(n),
            recording_static: recorder.static_sdram_usage(n),
            recording_variable: recorder.variable_sdram_usage(n, population.n_machine_time_steps()),
            provenance: ProvenanceEntry::region_size_in_bytes(),
            synapse_dynamics: dynamics.parameters_size_in_bytes(n, neuron.n_synapse_types()),
            structural_dynamics: dynamics.structural_size_in_bytes(
                n,
                structural.len() as u64,
                n_structural_sub_edges,
            ),
            synaptic_matrix: SynapticMatrixLayoutPlanner::new(self.pop_table.as_ref()).total_bytes(
                projections,
                population.n_atoms(),
                slice,
                self.timestep_us,
            ),
            pop_table: self.pop_table.table_size_in_bytes(projections),
            generator: GeneratorSizePlanner.size_in_bytes(projections, neuron.n_synapse_types()),
            profile: profile_region_size_in_bytes(population.n_profile_samples()),
            bit_field_filter: self.bit_fields.filter_region_bytes(projections),
            bit_field_keys: self.bit_fields.key_region_bytes(projections),
            bit_field_builder: self.bit_fields.builder_region_bytes(),
        }
    }

    /// Every resource of a core running `slice` of `population`
    ///
    /// Fills the population's ring-buffer shift cache if it is stale.
    pub fn estimate(&self, population: &mut Population, slice: &VertexSlice) -> ResourceEstimate {
        if slice.hi_atom() > population.n_atoms() {
            warn!(
                "Slice {} extends past the {} atoms of {}",
                slice,
                population.n_atoms(),
                population.label()
            );
        }
        let ring_buffer_shifts = population.ring_buffer_shifts(self.timestep_us).to_vec();
        let estimate = ResourceEstimate {
            slice: *slice,
            sdram: self.sdram_usage(population, slice),
            dtcm_bytes: Self::dtcm_usage_in_bytes(population, slice),
            cpu_cycles: Self::cpu_cycles(population, slice),
            ring_buffer_shifts,
        };
        debug!("{} {}", population.label(), estimate);
        estimate
    }
}
