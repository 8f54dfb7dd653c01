//! Special functions and quantiles
//!
//! Wrappers over `statrs` that turn its domain checks into [`MathError`]s so
//! callers can decide how to degrade instead of panicking.

use statrs::distribution::{Binomial, Continuous, ContinuousCDF, DiscreteCDF, Normal, Poisson};
use statrs::function::gamma;

use crate::{MathError, Result};

/// Natural logarithm of the gamma function
pub fn ln_gamma(x: f64) -> f64 {
    gamma::ln_gamma(x)
}

/// Upper regularized incomplete gamma function `Q(a, x) = Γ(a, x) / Γ(a)`
pub fn upper_regularized_gamma(a: f64, x: f64) -> Result<f64> {
    gamma::checked_gamma_ur(a, x)
        .map_err(|e| MathError::domain("upper_regularized_gamma", e.to_string()))
}

fn check_probability(p: f64) -> Result<()> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(MathError::InvalidProbability(p))
    }
}

/// Smallest `k` with `P(X <= k) >= p` for `X ~ Poisson(lambda)`
pub fn poisson_quantile(p: f64, lambda: f64) -> Result<u64> {
    check_probability(p)?;
    let dist = Poisson::new(lambda)
        .map_err(|e| MathError::domain("poisson_quantile", e.to_string()))?;
    Ok(dist.inverse_cdf(p))
}

/// Smallest `k` with `P(X <= k) >= p` for `X ~ Binomial(n, prob)`
pub fn binomial_quantile(p: f64, n: u64, prob: f64) -> Result<u64> {
    check_probability(p)?;
    let dist = Binomial::new(prob, n)
        .map_err(|e| MathError::domain("binomial_quantile", e.to_string()))?;
    Ok(dist.inverse_cdf(p))
}

/// Inverse CDF of `Normal(mean, std_dev)`
pub fn normal_quantile(p: f64, mean: f64, std_dev: f64) -> Result<f64> {
    check_probability(p)?;
    let dist = Normal::new(mean, std_dev)
        .map_err(|e| MathError::domain("normal_quantile", e.to_string()))?;
    Ok(dist.inverse_cdf(p))
}

/// CDF of `Normal(mean, std_dev)` at `x`
pub fn normal_cdf(x: f64, mean: f64, std_dev: f64) -> Result<f64> {
    let dist = Normal::new(mean, std_dev)
        .map_err(|e| MathError::domain("normal_cdf", e.to_string()))?;
    Ok(dist.cdf(x))
}

/// Mean and variance of `Normal(mean, std_dev)` truncated to `[low, high]`
pub fn truncated_normal_moments(mean: f64, std_dev: f64, low: f64, high: f64) -> Result<(f64, f64)> {
    if !low.is_finite() || !high.is_finite() || low >= high {
        return Err(MathError::domain(
            "truncated_normal_moments",
            format!("bounds [{}, {}] must be finite and increasing", low, high),
        ));
    }
    let unit = Normal::new(0.0, 1.0)
        .map_err(|e| MathError::domain("truncated_normal_moments", e.to_string()))?;
    if std_dev.is_nan() || std_dev <= 0.0 {
        return Err(MathError::domain(
            "truncated_normal_moments",
            format!("std_dev must be > 0, got {}", std_dev),
        ));
    }
    let a = (low - mean) / std_dev;
    let b = (high - mean) / std_dev;
    let z = unit.cdf(b) - unit.cdf(a);
    if z.is_nan() || z <= 0.0 {
        return Err(MathError::domain(
            "truncated_normal_moments",
            "no probability mass inside bounds",
        ));
    }
    let (pa, pb) = (unit.pdf(a), unit.pdf(b));
    let shift = (pa - pb) / z;
    let truncated_mean = mean + std_dev * shift;
    let truncated_var = std_dev * std_dev * (1.0 + (a * pa - b * pb) / z - shift * shift);
    Ok((truncated_mean, truncated_var.max(0.0)))
}
