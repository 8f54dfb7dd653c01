//! Contiguous atom ranges assigned to one core

use core::fmt;

use crate::error::{PlanError, Result};

/// Atom range `[lo_atom, hi_atom)` of a population placed on one core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexSlice {
    lo_atom: u32,
    hi_atom: u32,
}

impl VertexSlice {
    /// Create a slice; the range must be non-empty
    pub fn new(lo_atom: u32, hi_atom: u32) -> Result<Self> {
        if lo_atom >= hi_atom {
            return Err(PlanError::InvalidSlice { lo_atom, hi_atom });
        }
        Ok(Self { lo_atom, hi_atom })
    }

    /// Slice covering atoms `0..n_atoms`
    pub fn whole(n_atoms: u32) -> Result<Self> {
        Self::new(0, n_atoms)
    }

    /// Split `n_atoms` into consecutive slices of at most `max_atoms_per_core`
    pub fn split(n_atoms: u32, max_atoms_per_core: u32) -> Result<Vec<Self>> {
        if max_atoms_per_core == 0 {
            return Err(PlanError::invalid_parameter(
                "max_atoms_per_core",
                "0",
                "> 0",
            ));
        }
        (0..n_atoms)
            .step_by(max_atoms_per_core as usize)
            .map(|lo| Self::new(lo, lo.saturating_add(max_atoms_per_core).min(n_atoms)))
            .collect()
    }

    /// First atom
    pub const fn lo_atom(&self) -> u32 {
        self.lo_atom
    }

    /// One past the last atom
    pub const fn hi_atom(&self) -> u32 {
        self.hi_atom
    }

    /// Number of atoms in the slice
    pub const fn n_atoms(&self) -> u32 {
        self.hi_atom - self.lo_atom
    }

    /// True if `atom` lies inside the slice
    pub const fn contains(&self, atom: u32) -> bool {
        atom >= self.lo_atom && atom < self.hi_atom
    }
}

impl fmt::Display for VertexSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{})", self.lo_atom, self.hi_atom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_basics() {
        let slice = VertexSlice::new(10, 30).unwrap();
        assert_eq!(slice.n_atoms(), 20);
        assert!(slice.contains(10));
        assert!(!slice.contains(30));
        assert_eq!(slice.to_string(), "[10:30)");
    }

    #[test]
    fn test_empty_slice_rejected() {
        assert!(VertexSlice::new(3, 3).is_err());
        assert!(VertexSlice::new(4, 3).is_err());
        assert!(VertexSlice::whole(0).is_err());
    }

    #[test]
    fn test_split_covers_all_atoms() {
        let slices = VertexSlice::split(250, 100).unwrap();
        assert_eq!(slices.len(), 3);
        assert_eq!(slices[2], VertexSlice::new(200, 250).unwrap());
        assert_eq!(slices.iter().map(|s| s.n_atoms()).sum::<u32>(), 250);
        assert!(VertexSlice::split(10, 0).is_err());
    }
}
