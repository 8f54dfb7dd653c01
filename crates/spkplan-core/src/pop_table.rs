//! Master population table: routing key to synaptic matrix lookup

use std::collections::BTreeSet;
use std::fmt::Debug;

use crate::constants::{
    ADDRESS_LIST_ENTRY_SIZE_BYTES, MASTER_POP_ADDRESS_SCALE, MASTER_POP_ENTRY_SIZE_BYTES,
    MASTER_POP_HEADER_BYTES,
};
use crate::projection::IncomingProjection;

/// Lookup structure a core uses to find the matrix rows of a spike
pub trait MasterPopulationTable: Debug + Send + Sync {
    /// First address at or after `address` where a matrix may start
    fn next_allowed_address(&self, address: u64) -> u64;

    /// Bytes of the table for all `projections` of a population
    fn table_size_in_bytes(&self, projections: &[IncomingProjection]) -> u64;
}

/// Sorted entries searched by binary search, one per source sub-edge and
/// matrix kind, pointing into an address list with one entry per matrix
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BinarySearchPopTable;

impl MasterPopulationTable for BinarySearchPopTable {
    fn next_allowed_address(&self, address: u64) -> u64 {
        address.div_ceil(MASTER_POP_ADDRESS_SCALE) * MASTER_POP_ADDRESS_SCALE
    }

    fn table_size_in_bytes(&self, projections: &[IncomingProjection]) -> u64 {
        let mut sources = BTreeSet::new();
        let mut n_entries = 0u64;
        for projection in projections {
            let source = projection.source();
            if sources.insert(source.id()) {
                n_entries += u64::from(source.n_sub_edges());
            }
        }
        let n_addresses = projections.len() as u64;
        // Undelayed and delayed matrices each need their own entries
        MASTER_POP_HEADER_BYTES
            + n_entries * 2 * MASTER_POP_ENTRY_SIZE_BYTES
            + n_addresses * 2 * ADDRESS_LIST_ENTRY_SIZE_BYTES
    }
}
