// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under Mozilla Public License (MPL) 2.0.

//! # **Chi-Squared Mixtures** - *Tail Probabilities of Quadratic Forms*
//!
//! Estimators for `Pr(Q > q)` with `Q = Σ λᵢ·χ²(hᵢ, δᵢ)`, the null law of a
//! quadratic form in normal variables.
//!
//! ## Modules
//! - **`spectral`**: kernel matrix to filtered, ascending mixture weights
//! - **`moments`**: Liu moment matching to a single noncentral chi-squared
//! - **`inversion`**: Davies' characteristic-function inversion
//! - **`davies`**: exact tail probabilities with moment-matching substitution
//! - **`optimal`**: SKAT-O p-value by integration over the correlation grid
//!
//! ## Data Flow
//! ```text
//! kernel matrix ──► spectral ──► WeightSet ──┬──► davies  ──► PValueResult
//!                                            └──► optimal ──► f64
//! ```
//!
//! Every type here is a plain value owned by the caller; no state survives a call.

pub mod davies;
pub mod inversion;
pub mod moments;
pub mod optimal;
pub mod spectral;

use ndarray::Array1;

use crate::errors::KernelError;
use crate::utils::{confirm_equal_len, confirm_finite, confirm_finite_scalar};

/// One term `λ·χ²(h, δ)` of a mixture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChiSquaredComponent {
    pub weight: f64,
    pub noncentrality: f64,
    /// Degrees of freedom. The inversion only accepts nonnegative integers.
    pub dof: f64,
}

impl ChiSquaredComponent {
    #[inline]
    pub const fn new(weight: f64, noncentrality: f64, dof: f64) -> Self {
        ChiSquaredComponent {
            weight,
            noncentrality,
            dof,
        }
    }

    /// `weight·χ²₁`, the term contributed by one kernel eigenvalue.
    #[inline]
    pub const fn central(weight: f64) -> Self {
        ChiSquaredComponent::new(weight, 0.0, 1.0)
    }
}

/// Filtered eigenvalues of a quadratic-form kernel, ascending.
///
/// Every element exceeds `mean(nonnegative eigenvalues) / divisor` and the set
/// is never empty. Built through [`WeightSet::from_kernel`] or
/// [`WeightSet::from_eigenvalues`].
#[derive(Debug, Clone, PartialEq)]
pub struct WeightSet {
    values: Vec<f64>,
}

impl WeightSet {
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The weights as central one degree of freedom components.
    pub fn components(&self) -> Vec<ChiSquaredComponent> {
        self.values
            .iter()
            .map(|&w| ChiSquaredComponent::central(w))
            .collect()
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }
}

impl AsRef<[f64]> for WeightSet {
    fn as_ref(&self) -> &[f64] {
        &self.values
    }
}

/// First four cumulant sums `cₖ = Σ λᵢᵏhᵢ + k·Σ λᵢᵏδᵢ` of a mixture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cumulants {
    pub c1: f64,
    pub c2: f64,
    pub c3: f64,
    pub c4: f64,
}

/// Moments of the mixture and of its matched chi-squared surrogate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MomentParams {
    /// Mean of the mixture.
    pub mu_q: f64,
    /// Standard deviation of the mixture.
    pub sigma_q: f64,
    /// Mean of the surrogate, `l + d`.
    pub mu_x: f64,
    /// Standard deviation of the surrogate, `√(2(l + 2d))`.
    pub sigma_x: f64,
    /// Surrogate degrees of freedom `l`.
    pub dof: f64,
    /// Surrogate noncentrality `d`.
    pub noncentrality: f64,
}

impl MomentParams {
    /// Maps a mixture statistic onto the surrogate's scale, `t*·σx + μx`.
    #[inline]
    pub fn normalise(&self, t: f64) -> f64 {
        (t - self.mu_q) / self.sigma_q * self.sigma_x + self.mu_x
    }
}

/// Diagnostics of a Liu survival evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct LiuInfo {
    pub mu_q: f64,
    pub sigma_q: f64,
    pub mu_x: f64,
    pub sigma_x: f64,
    /// Standardised statistics `(t - μQ)/σQ`, one per input.
    pub t_star: Array1<f64>,
}

/// Result of [`moments::liu_survival`].
#[derive(Debug, Clone, PartialEq)]
pub struct LiuSurvival {
    /// Approximate `Pr(Q > t)`, one per input.
    pub p: Array1<f64>,
    pub dof: f64,
    /// Matched noncentrality, before any floor is applied.
    pub noncentrality: f64,
    pub info: LiuInfo,
}

/// Result of [`moments::mod_liu_pvalue`].
#[derive(Debug, Clone, PartialEq)]
pub struct ModLiuPValue {
    pub p: Array1<f64>,
    pub mu_q: f64,
    pub sigma_q: f64,
    pub dof: f64,
}

/// Davies estimate for a single statistic.
#[derive(Debug, Clone, PartialEq)]
pub struct PValueResult {
    pub p_value: f64,
    /// Moment-matching estimate, substituted when the inversion did not converge.
    pub liu_pvalue: f64,
    pub converged: bool,
    /// Natural log of the moment-matching tail, set when `p_value` underflowed to zero.
    pub log_pvalue: Option<f64>,
    /// `Pvalue < T` message, set when `p_value` underflowed to zero.
    pub message: Option<String>,
}

/// Davies estimates for a batch of statistics.
///
/// The extreme-tail diagnostics refer to the first statistic only.
#[derive(Debug, Clone, PartialEq)]
pub struct PValueBatch {
    pub p_values: Array1<f64>,
    pub liu_pvalues: Array1<f64>,
    pub converged: Vec<bool>,
    pub log_pvalue: Option<f64>,
    pub message: Option<String>,
}

impl PValueBatch {
    #[inline]
    pub fn len(&self) -> usize {
        self.p_values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.p_values.is_empty()
    }

    /// Unpacks the first statistic, carrying the batch diagnostics with it.
    pub fn into_first(self) -> Option<PValueResult> {
        if self.is_empty() {
            return None;
        }
        Some(PValueResult {
            p_value: self.p_values[0],
            liu_pvalue: self.liu_pvalues[0],
            converged: self.converged[0],
            log_pvalue: self.log_pvalue,
            message: self.message,
        })
    }
}

/// Inputs of the SKAT-O optimal-test integrator.
///
/// `q_min`, `tau` and `rho_grid` run over the same correlation grid.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimalTestContext {
    /// Per-grid-point quantile of the minimum p-value statistic.
    pub q_min: Vec<f64>,
    /// Mean of the mixture part of the statistic.
    pub mu: f64,
    /// Variance of the mixture part of the statistic.
    pub var: f64,
    /// Kurtosis of the mixture part; already folded into `df` by the caller.
    pub kurtosis: f64,
    /// Mixture weights (eigenvalues) of the projected kernel.
    pub weights: Vec<f64>,
    /// Variance not carried by the mixture weights.
    pub remaining_variance: f64,
    /// Liu degrees of freedom of the mixture part.
    pub df: f64,
    /// Per-grid-point correlation tilt.
    pub tau: Vec<f64>,
    /// Correlation weights `ρ`.
    pub rho_grid: Vec<f64>,
    /// Smallest single-grid-point p-value, used to clamp the result.
    pub p_min_floor: Option<f64>,
}

impl OptimalTestContext {
    /// Checks shapes and finiteness.
    pub fn validate(&self) -> Result<(), KernelError> {
        let g = self.rho_grid.len();
        if g == 0 {
            return Err(KernelError::InvalidArguments(
                "optimal_test: empty correlation grid".into(),
            ));
        }
        confirm_equal_len("optimal_test: q_min vs rho_grid", self.q_min.len(), g)?;
        confirm_equal_len("optimal_test: tau vs rho_grid", self.tau.len(), g)?;
        if self.weights.is_empty() {
            return Err(KernelError::InvalidArguments(
                "optimal_test: no mixture weights".into(),
            ));
        }
        confirm_finite("optimal_test: q_min", &self.q_min)?;
        confirm_finite("optimal_test: tau", &self.tau)?;
        confirm_finite("optimal_test: rho_grid", &self.rho_grid)?;
        confirm_finite("optimal_test: weights", &self.weights)?;
        confirm_finite_scalar("optimal_test: mu", self.mu)?;
        confirm_finite_scalar("optimal_test: var", self.var)?;
        confirm_finite_scalar("optimal_test: kurtosis", self.kurtosis)?;
        confirm_finite_scalar("optimal_test: remaining_variance", self.remaining_variance)?;
        confirm_finite_scalar("optimal_test: df", self.df)?;
        if let Some(floor) = self.p_min_floor {
            confirm_finite_scalar("optimal_test: p_min_floor", floor)?;
        }
        if self.var <= 0.0 {
            return Err(KernelError::InvalidArguments(format!(
                "optimal_test: variance must be positive, got {}",
                self.var
            )));
        }
        if self.remaining_variance < 0.0 || self.remaining_variance > self.var {
            return Err(KernelError::InvalidArguments(format!(
                "optimal_test: remaining variance {} outside [0, {}]",
                self.remaining_variance, self.var
            )));
        }
        if self.df <= 0.0 {
            return Err(KernelError::InvalidArguments(format!(
                "optimal_test: df must be positive, got {}",
                self.df
            )));
        }
        Ok(())
    }

    /// Number of grid points.
    #[inline]
    pub fn grid_len(&self) -> usize {
        self.rho_grid.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> OptimalTestContext {
        OptimalTestContext {
            q_min: vec![1.5, 3.0],
            mu: -0.5,
            var: 1.0,
            kurtosis: 3.0,
            weights: vec![10.0, 0.2, 0.1, 0.3],
            remaining_variance: 0.5,
            df: 3.4,
            tau: vec![5.1, 0.2],
            rho_grid: vec![0.0, 0.01],
            p_min_floor: None,
        }
    }

    #[test]
    fn context_validation() {
        assert!(fixture().validate().is_ok());

        let mut ctx = fixture();
        ctx.tau.pop();
        assert!(matches!(ctx.validate(), Err(KernelError::LengthMismatch(_))));

        let mut ctx = fixture();
        ctx.weights[1] = f64::NAN;
        assert!(matches!(ctx.validate(), Err(KernelError::NonFiniteInput(_))));

        let mut ctx = fixture();
        ctx.remaining_variance = 2.0;
        assert!(matches!(ctx.validate(), Err(KernelError::InvalidArguments(_))));

        let mut ctx = fixture();
        ctx.rho_grid.clear();
        assert!(ctx.validate().is_err());
    }

    #[test]
    fn batch_unpacks_first_element() {
        let batch = PValueBatch {
            p_values: Array1::from(vec![0.0, 0.3]),
            liu_pvalues: Array1::from(vec![1e-120, 0.31]),
            converged: vec![false, true],
            log_pvalue: Some(-276.3),
            message: Some("Pvalue < 1.000000e-100".into()),
        };
        assert_eq!(batch.len(), 2);
        let first = batch.into_first().unwrap();
        assert_eq!(first.p_value, 0.0);
        assert!(!first.converged);
        assert_eq!(first.message.as_deref(), Some("Pvalue < 1.000000e-100"));
    }

    #[test]
    fn normalise_maps_mean_to_surrogate_mean() {
        let m = MomentParams {
            mu_q: 3.0,
            sigma_q: 2.0,
            mu_x: 5.0,
            sigma_x: 4.0,
            dof: 5.0,
            noncentrality: 0.0,
        };
        assert_eq!(m.normalise(3.0), 5.0);
        assert_eq!(m.normalise(5.0), 9.0);
    }
}
