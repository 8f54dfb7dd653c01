//! Error types for the planner

use thiserror::Error;

/// Result type for planner operations
pub type Result<T> = std::result::Result<T, PlanError>;

/// Errors raised while building or validating planner inputs.
///
/// Sizing and scaling never fail; these only come from constructing slices,
/// parameters and configuration, or from merging incompatible dynamics.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    /// Math layer error
    #[error("Math error: {source}")]
    Math {
        #[from]
        /// Source math error
        source: spkplan_math::MathError,
    },

    /// Atom range is empty or reversed
    #[error("Invalid slice [{lo_atom}, {hi_atom})")]
    InvalidSlice {
        /// First atom of the slice
        lo_atom: u32,
        /// One past the last atom of the slice
        hi_atom: u32,
    },

    /// Invalid parameter value
    #[error("Invalid parameter {parameter}: {value} (expected {constraint})")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Invalid value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Invalid planner configuration
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Reason for invalid configuration
        reason: String,
    },

    /// Two synapse dynamics on one population cannot be combined
    #[error("Synapse dynamics must match exactly when targeting the same population: {existing} vs {incoming}")]
    DynamicsMismatch {
        /// Dynamics already on the population
        existing: String,
        /// Dynamics being added
        incoming: String,
    },
}

impl PlanError {
    /// Create an invalid parameter error
    pub fn invalid_parameter(
        parameter: impl Into<String>,
        value: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            constraint: constraint.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// Create a dynamics mismatch error
    pub fn dynamics_mismatch(existing: impl Into<String>, incoming: impl Into<String>) -> Self {
        Self::DynamicsMismatch {
            existing: existing.into(),
            incoming: incoming.into(),
        }
    }
}
