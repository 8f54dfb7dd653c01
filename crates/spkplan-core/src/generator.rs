//! Parameters for generating synaptic matrices on the core

use crate::constants::{BYTES_PER_WORD, GENERATOR_BASE_SIZE, SYNAPSES_BASE_GENERATOR_SDRAM_USAGE_IN_BYTES};
use crate::projection::{IncomingProjection, ProjectionId};

/// Generator parameters of one projection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorBlock {
    /// Projection described
    pub projection: ProjectionId,
    /// Bytes of one entry, 0 when the projection cannot be generated
    pub entry_bytes: u64,
    /// Entries, one per source sub-edge
    pub n_sub_edges: u32,
}

impl GeneratorBlock {
    /// Bytes of all entries of the projection
    pub fn size_in_bytes(&self) -> u64 {
        self.entry_bytes * u64::from(self.n_sub_edges)
    }
}

/// Sizes the on-core generator region
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneratorSizePlanner;

impl GeneratorSizePlanner {
    /// Bytes of one generator entry for `projection`, 0 if it cannot be
    /// generated on the core
    pub fn entry_size_in_bytes(projection: &IncomingProjection) -> u64 {
        if !projection.generates_on_core() {
            return 0;
        }
        let Some(connector_bytes) = projection.connector().generator_params_size_in_bytes() else {
            return 0;
        };
        GENERATOR_BASE_SIZE
            + projection.delays().gen_params_size_in_bytes()
            + projection.weights().gen_params_size_in_bytes()
            + connector_bytes
            + projection.dynamics().gen_matrix_params_size_in_bytes()
    }

    /// Generator blocks of every projection
    pub fn blocks(&self, projections: &[IncomingProjection]) -> Vec<GeneratorBlock> {
        projections
            .iter()
            .enumerate()
            .map(|(index, projection)| GeneratorBlock {
                projection: ProjectionId(index as u32),
                entry_bytes: Self::entry_size_in_bytes(projection),
                n_sub_edges: projection.source().n_partitioned_sub_edges(),
            })
            .collect()
    }

    /// Bytes of the generator region for a core with `n_synapse_types` types
    pub fn size_in_bytes(&self, projections: &[IncomingProjection], n_synapse_types: u32) -> u64 {
        let size: u64 = self.blocks(projections).iter().map(GeneratorBlock::size_in_bytes).sum();
        if size == 0 {
            return 0;
        }
        size + SYNAPSES_BASE_GENERATOR_SDRAM_USAGE_IN_BYTES + u64::from(n_synapse_types) * BYTES_PER_WORD
    }
}
