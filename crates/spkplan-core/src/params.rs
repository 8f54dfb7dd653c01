//! Weight and delay values of a projection
//!
//! A projection's weights or delays are either one fixed value or drawn from
//! a distribution. The planner only ever needs summary statistics of them,
//! never the individual draws.

use serde::{Deserialize, Serialize};

use crate::constants::BYTES_PER_WORD;
use crate::error::{PlanError, Result};

/// Chance that the true maximum of `n` draws exceeds the probable maximum
const PROBABLE_MAXIMUM_CHANCE: f64 = 0.01;

/// Standard deviations above the mean taken as the upper end of an
/// unbounded normal
const UNBOUNDED_NORMAL_SPAN: f64 = 6.0;

/// A fixed value or a distribution of values
///
/// Variants are tried in order when deserialising, so the clipped normal
/// must come before the uniform whose fields it contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    /// Every synapse takes the same value
    Fixed(f64),
    /// Normal clipped to `[low, high]`
    NormalClipped {
        /// Mean before clipping
        mean: f64,
        /// Standard deviation before clipping
        std_dev: f64,
        /// Lower bound
        low: f64,
        /// Upper bound
        high: f64,
    },
    /// Uniform on `[low, high]`
    Uniform {
        /// Lower bound
        low: f64,
        /// Upper bound
        high: f64,
    },
    /// Unbounded normal
    Normal {
        /// Mean
        mean: f64,
        /// Standard deviation
        std_dev: f64,
    },
}

impl ParameterValue {
    /// Check that the distribution is well formed
    pub fn validate(&self, name: &str) -> Result<()> {
        let ordered = |low: f64, high: f64| low.is_finite() && high.is_finite() && low <= high;
        let spread = |std_dev: f64| std_dev.is_finite() && std_dev >= 0.0;
        match *self {
            Self::Fixed(v) if !v.is_finite() => {
                Err(PlanError::invalid_parameter(name, v.to_string(), "finite"))
            }
            Self::Uniform { low, high } if !ordered(low, high) => Err(PlanError::invalid_parameter(
                name,
                format!("[{}, {}]", low, high),
                "low <= high",
            )),
            Self::Normal { mean, std_dev } if !(mean.is_finite() && spread(std_dev)) => {
                Err(PlanError::invalid_parameter(
                    format!("{}.std_dev", name),
                    std_dev.to_string(),
                    ">= 0",
                ))
            }
            Self::NormalClipped { mean, std_dev, low, high }
                if !(mean.is_finite() && spread(std_dev) && ordered(low, high)) =>
            {
                Err(PlanError::invalid_parameter(
                    name,
                    format!("std_dev={} [{}, {}]", std_dev, low, high),
                    "std_dev >= 0 and low <= high",
                ))
            }
            _ => Ok(()),
        }
    }

    /// Mean of the values
    pub fn mean(&self) -> f64 {
        match *self {
            Self::Fixed(v) => v,
            Self::Uniform { low, high } => (low + high) / 2.0,
            Self::Normal { mean, .. } => mean,
            Self::NormalClipped { mean, std_dev, low, high } => {
                clipped_moments(mean, std_dev, low, high).0
            }
        }
    }

    /// Variance of the values
    pub fn variance(&self) -> f64 {
        match *self {
            Self::Fixed(_) => 0.0,
            Self::Uniform { low, high } => (high - low).powi(2) / 12.0,
            Self::Normal { std_dev, .. } => std_dev * std_dev,
            Self::NormalClipped { mean, std_dev, low, high } => {
                clipped_moments(mean, std_dev, low, high).1
            }
        }
    }

    /// Absolute mean, as used for scaling
    pub fn abs_mean(&self) -> f64 {
        self.mean().abs()
    }

    /// Largest magnitude expected among `n_draws` values
    pub fn probable_abs_maximum(&self, n_draws: u64) -> f64 {
        match *self {
            Self::Fixed(v) => v.abs(),
            Self::Uniform { low, high } | Self::NormalClipped { low, high, .. } => {
                low.abs().max(high.abs())
            }
            Self::Normal { mean, std_dev } => {
                if n_draws <= 1 || std_dev <= 0.0 {
                    return mean.abs();
                }
                let tail = PROBABLE_MAXIMUM_CHANCE / n_draws as f64;
                let p = if mean < 0.0 { tail } else { 1.0 - tail };
                spkplan_math::normal_quantile(p, mean, std_dev)
                    .map(f64::abs)
                    .unwrap_or_else(|_| mean.abs() + UNBOUNDED_NORMAL_SPAN * std_dev)
            }
        }
    }

    /// Smallest and largest value that can occur
    pub fn bounds(&self) -> (f64, f64) {
        match *self {
            Self::Fixed(v) => (v, v),
            Self::Uniform { low, high } | Self::NormalClipped { low, high, .. } => (low, high),
            Self::Normal { mean, std_dev } => (
                mean - UNBOUNDED_NORMAL_SPAN * std_dev,
                mean + UNBOUNDED_NORMAL_SPAN * std_dev,
            ),
        }
    }

    /// Probability that a value falls inside `[min, max]`
    pub fn fraction_in_range(&self, min: f64, max: f64) -> f64 {
        if min > max {
            return 0.0;
        }
        match *self {
            Self::Fixed(v) => {
                if v >= min && v <= max {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Uniform { low, high } => {
                if high <= low {
                    return if low >= min && low <= max { 1.0 } else { 0.0 };
                }
                let overlap = high.min(max) - low.max(min);
                (overlap / (high - low)).clamp(0.0, 1.0)
            }
            Self::Normal { mean, std_dev } => {
                if std_dev <= 0.0 {
                    return Self::Fixed(mean).fraction_in_range(min, max);
                }
                let cdf = |x| spkplan_math::normal_cdf(x, mean, std_dev).unwrap_or(0.5);
                (cdf(max) - cdf(min)).clamp(0.0, 1.0)
            }
            Self::NormalClipped { mean, std_dev, low, high } => {
                if std_dev <= 0.0 || high <= low {
                    return Self::Fixed(mean.clamp(low, high)).fraction_in_range(min, max);
                }
                let cdf = |x| spkplan_math::normal_cdf(x, mean, std_dev).unwrap_or(0.5);
                let mass = cdf(high) - cdf(low);
                if mass <= 0.0 {
                    return 0.0;
                }
                let (lo, hi) = (min.max(low), max.min(high));
                if lo > hi {
                    return 0.0;
                }
                ((cdf(hi) - cdf(lo)) / mass).clamp(0.0, 1.0)
            }
        }
    }

    /// Bytes of the on-core parameter generator for this value
    pub fn gen_params_size_in_bytes(&self) -> u64 {
        let words = match self {
            Self::Fixed(_) => 1,
            Self::Uniform { .. } | Self::Normal { .. } => 2,
            Self::NormalClipped { .. } => 4,
        };
        words * BYTES_PER_WORD
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        Self::Fixed(value)
    }
}

fn clipped_moments(mean: f64, std_dev: f64, low: f64, high: f64) -> (f64, f64) {
    if std_dev <= 0.0 || high <= low {
        return (mean.clamp(low.min(high), high.max(low)), 0.0);
    }
    spkplan_math::truncated_normal_moments(mean, std_dev, low, high)
        .unwrap_or((mean.clamp(low, high), 0.0))
}
