//! Placement of synaptic matrices in a core's synaptic matrix region

use log::trace;

use crate::constants::SYNAPTIC_MATRIX_HEADER_BYTES;
use crate::pop_table::MasterPopulationTable;
use crate::projection::{IncomingProjection, ProjectionId};
use crate::slice::VertexSlice;
use crate::synapse_io::max_row_info;

/// A contiguous run of equally sized rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixBlock {
    /// Offset of the first row from the start of the region
    pub start_address: u64,
    /// Bytes per row
    pub row_stride_bytes: u64,
    /// Number of rows
    pub n_rows: u64,
}

impl MatrixBlock {
    /// Bytes covered by the block
    pub fn size_in_bytes(&self) -> u64 {
        self.row_stride_bytes * self.n_rows
    }

    /// First address after the block
    pub fn end_address(&self) -> u64 {
        self.start_address + self.size_in_bytes()
    }
}

/// Blocks of one projection, one per source sub-edge and matrix kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionMatrixLayout {
    /// Projection the blocks belong to
    pub projection: ProjectionId,
    /// Undelayed blocks, in sub-edge order
    pub undelayed: Vec<MatrixBlock>,
    /// Delayed blocks, in sub-edge order
    pub delayed: Vec<MatrixBlock>,
}

/// Layout of the whole synaptic matrix region of a core
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixLayout {
    /// Per projection, in the order the projections were added
    pub projections: Vec<ProjectionMatrixLayout>,
    /// Bytes of the region including its header
    pub total_bytes: u64,
}

impl MatrixLayout {
    /// Layout of one projection
    pub fn projection(&self, id: ProjectionId) -> Option<&ProjectionMatrixLayout> {
        self.projections.iter().find(|p| p.projection == id)
    }
}

/// Lays matrices out one after another, each block starting on an address
/// the master population table can point at
#[derive(Debug, Clone, Copy)]
pub struct SynapticMatrixLayoutPlanner<'a> {
    pop_table: &'a dyn MasterPopulationTable,
}

impl<'a> SynapticMatrixLayoutPlanner<'a> {
    /// Planner aligning blocks for `pop_table`
    pub fn new(pop_table: &'a dyn MasterPopulationTable) -> Self {
        Self { pop_table }
    }

    /// Lay out `projections` for `post_slice` of a population of
    /// `n_post_atoms` atoms
    pub fn layout(
        &self,
        projections: &[IncomingProjection],
        n_post_atoms: u32,
        post_slice: &VertexSlice,
        timestep_us: f64,
    ) -> MatrixLayout {
        let mut address = SYNAPTIC_MATRIX_HEADER_BYTES;
        let mut layouts = Vec::with_capacity(projections.len());

        for (index, projection) in projections.iter().enumerate() {
            let info = max_row_info(projection, n_post_atoms, post_slice, timestep_us);
            let source = projection.source();
            let n_sub_atoms = u64::from(source.atoms_per_sub_edge());
            let n_sub_edges = source.n_sub_edges();
            let n_delay_stages = u64::from(projection.n_delay_stages(timestep_us));

            let mut place = |stride: u64, n_rows: u64| {
                let start_address = self.pop_table.next_allowed_address(address);
                let block = MatrixBlock {
                    start_address,
                    row_stride_bytes: stride,
                    n_rows,
                };
                address = block.end_address();
                block
            };

            let undelayed = if info.undelayed_max_n_synapses > 0 {
                (0..n_sub_edges)
                    .map(|_| place(info.undelayed_max_bytes, n_sub_atoms))
                    .collect()
            } else {
                Vec::new()
            };
            let delayed = if info.delayed_max_n_synapses > 0 {
                (0..n_sub_edges)
                    .map(|_| place(info.delayed_max_bytes, n_sub_atoms * n_delay_stages))
                    .collect()
            } else {
                Vec::new()
            };

            trace!(
                "Matrix for {} on {}: {} undelayed and {} delayed blocks, cursor at {}",
                source.label(),
                post_slice,
                undelayed.len(),
                delayed.len(),
                address
            );
            layouts.push(ProjectionMatrixLayout {
                projection: ProjectionId(index as u32),
                undelayed,
                delayed,
            });
        }

        MatrixLayout {
            projections: layouts,
            total_bytes: address,
        }
    }

    /// Bytes of the synaptic matrix region
    pub fn total_bytes(
        &self,
        projections: &[IncomingProjection],
        n_post_atoms: u32,
        post_slice: &VertexSlice,
        timestep_us: f64,
    ) -> u64 {
        self.layout(projections, n_post_atoms, post_slice, timestep_us)
            .total_bytes
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::connector::AllToAllConnector;
    use crate::params::ParameterValue;
    use crate::pop_table::BinarySearchPopTable;
    use crate::source::{SourceId, SourceVertex};

    fn all_to_all(n_pre: u32, max_per_core: u32, delays: ParameterValue) -> IncomingProjection {
        let source = Arc::new(SourceVertex::new(SourceId(n_pre), "in", n_pre, max_per_core).unwrap());
        IncomingProjection::new(source, 0, Arc::new(AllToAllConnector::new(true))).with_delays(delays)
    }

    #[test]
    fn test_empty_layout_is_header() {
        let slice = VertexSlice::new(0, 10).unwrap();
        let layout = SynapticMatrixLayoutPlanner::new(&BinarySearchPopTable).layout(&[], 10, &slice, 1000.0);
        assert!(layout.projections.is_empty());
        assert_eq!(layout.total_bytes, 8);
    }

    #[test]
    fn test_sub_edges_aligned() {
        let slice = VertexSlice::new(0, 5).unwrap();
        // 3 sub-edges of 4 atoms; rows of (3 + 5) words
        let projections = vec![all_to_all(10, 4, ParameterValue::Fixed(1.0))];
        let layout = SynapticMatrixLayoutPlanner::new(&BinarySearchPopTable).layout(&projections, 5, &slice, 1000.0);
        let blocks = &layout.projections[0].undelayed;
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].start_address, 16);
        assert_eq!(blocks[0].size_in_bytes(), 4 * 32);
        assert_eq!(blocks[1].start_address, 144);
        assert_eq!(blocks[2].start_address, 272);
        assert_eq!(layout.total_bytes, 400);
        assert!(layout.projections[0].delayed.is_empty());
    }

    #[test]
    fn test_delayed_blocks_follow_undelayed() {
        let slice = VertexSlice::new(0, 4).unwrap();
        let projections = vec![all_to_all(2, 2, ParameterValue::Uniform { low: 1.0, high: 30.0 })];
        let layout = SynapticMatrixLayoutPlanner::new(&BinarySearchPopTable).layout(&projections, 4, &slice, 1000.0);
        let p = &layout.projections[0];
        assert_eq!(p.undelayed.len(), 1);
        assert_eq!(p.delayed.len(), 1);
        assert_eq!(p.delayed[0].n_rows, 2);
        assert!(p.delayed[0].start_address >= p.undelayed[0].end_address());
        assert_eq!(p.delayed[0].start_address % 16, 0);
        assert_eq!(layout.total_bytes, p.delayed[0].end_address());
    }
}
