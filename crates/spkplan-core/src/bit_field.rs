//! Space reserved for bit-field filtering of incoming spikes
//!
//! Bit fields mark which source atoms have any synapses on a core so that
//! spikes from the others can be dropped without a matrix lookup. The regions
//! are filled by a later tool; the planner only reserves room for them.

use std::collections::BTreeSet;
use std::fmt::Debug;

use crate::constants::{n_words_for_bits, BYTES_PER_WORD};
use crate::projection::IncomingProjection;

/// Words of each filter's header: key and atom count
const FILTER_HEADER_WORDS: u64 = 2;

/// Words per key-to-atom map entry
const KEY_ENTRY_WORDS: u64 = 2;

/// Words of the builder region
const BUILDER_REGION_WORDS: u64 = 4;

/// Sizes of the regions used for bit-field filtering
pub trait BitFieldEstimator: Debug + Send + Sync {
    /// Bytes of the bit-field filter region
    fn filter_region_bytes(&self, projections: &[IncomingProjection]) -> u64;

    /// Bytes of the key-to-atom map region
    fn key_region_bytes(&self, projections: &[IncomingProjection]) -> u64;

    /// Bytes of the builder's working region
    fn builder_region_bytes(&self) -> u64;

    /// All bit-field regions together
    fn total_bytes(&self, projections: &[IncomingProjection]) -> u64 {
        self.filter_region_bytes(projections)
            + self.key_region_bytes(projections)
            + self.builder_region_bytes()
    }
}

/// One filter per sub-edge of every distinct source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultBitFieldEstimator;

impl DefaultBitFieldEstimator {
    /// Sub-edges of each distinct source with their atom counts
    fn source_sub_edges(projections: &[IncomingProjection]) -> Vec<(u32, u32)> {
        let mut seen = BTreeSet::new();
        projections
            .iter()
            .map(IncomingProjection::source)
            .filter(|s| seen.insert(s.id()))
            .map(|s| (s.n_sub_edges(), s.atoms_per_sub_edge()))
            .collect()
    }
}

impl BitFieldEstimator for DefaultBitFieldEstimator {
    fn filter_region_bytes(&self, projections: &[IncomingProjection]) -> u64 {
        let words: u64 = Self::source_sub_edges(projections)
            .into_iter()
            .map(|(n_sub_edges, n_sub_atoms)| {
                u64::from(n_sub_edges) * (FILTER_HEADER_WORDS + n_words_for_bits(u64::from(n_sub_atoms)))
            })
            .sum();
        (1 + words) * BYTES_PER_WORD
    }

    fn key_region_bytes(&self, projections: &[IncomingProjection]) -> u64 {
        let n_sub_edges: u64 = Self::source_sub_edges(projections)
            .into_iter()
            .map(|(n, _)| u64::from(n))
            .sum();
        (1 + KEY_ENTRY_WORDS * n_sub_edges) * BYTES_PER_WORD
    }

    fn builder_region_bytes(&self) -> u64 {
        BUILDER_REGION_WORDS * BYTES_PER_WORD
    }
}

/// For targets without bit-field support
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoBitFields;

impl BitFieldEstimator for NoBitFields {
    fn filter_region_bytes(&self, _projections: &[IncomingProjection]) -> u64 {
        0
    }

    fn key_region_bytes(&self, _projections: &[IncomingProjection]) -> u64 {
        0
    }

    fn builder_region_bytes(&self) -> u64 {
        0
    }
}
