//! Numeric support for the spkplan resource planner
//!
//! This crate provides the small amount of statistics the planner needs to
//! bound synaptic input: a weighted running mean/variance combiner, thin
//! wrappers over the log-gamma and regularized incomplete gamma functions,
//! and quantile helpers for the spike-count distributions used to estimate
//! worst-case arrivals.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod special;
pub mod stats;

pub use special::{
    binomial_quantile, ln_gamma, normal_cdf, normal_quantile, poisson_quantile,
    truncated_normal_moments, upper_regularized_gamma,
};
pub use stats::RunningStats;

use thiserror::Error;

/// Result type for math operations
pub type Result<T> = std::result::Result<T, MathError>;

/// Errors raised when a numeric routine is called outside its domain
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    /// Argument outside the domain of the function
    #[error("Domain error in {function}: {reason}")]
    Domain {
        /// Function that rejected its input
        function: &'static str,
        /// Reason for rejection
        reason: String,
    },

    /// Probability argument outside [0, 1]
    #[error("Invalid probability {0} (expected 0 <= p <= 1)")]
    InvalidProbability(f64),
}

impl MathError {
    /// Create a domain error
    pub fn domain(function: &'static str, reason: impl Into<String>) -> Self {
        Self::Domain {
            function,
            reason: reason.into(),
        }
    }
}
