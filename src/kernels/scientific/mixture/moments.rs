// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under Mozilla Public License (MPL) 2.0.

//! # **Moment Matching** - *Liu's Chi-Squared Surrogate*
//!
//! Approximates `Q = Σ λᵢ·χ²(hᵢ, δᵢ)` by a single scaled and shifted noncentral
//! chi-squared `χ²(l, d)` sharing its mean, variance and either skewness or
//! kurtosis (Liu, Tang & Zhang 2009).
//!
//! ## Matching
//! With cumulant sums `cₖ = Σ λᵢᵏhᵢ + k·Σ λᵢᵏδᵢ`, `s₁ = c₃/c₂^{3/2}` and
//! `s₂ = c₄/c₂²`:
//!
//! | regime | `a` | `d` | `l` |
//! |---|---|---|---|
//! | `s₁² > s₂` | `1/(s₁ − √(s₁² − s₂))` | `s₁a³ − a²` | `a² − 2d` |
//! | otherwise, Liu | `1/s₁` | `0` | `1/s₁²` |
//! | otherwise, kurtosis | `√(1/s₂)` | `0` | `1/s₂` |
//!
//! A statistic `t` is mapped to `t* = (t − μQ)/σQ` and the tail is read off the
//! surrogate at `t*·σX + μX`, with `μX = l + d` and `σX = √(2(l + 2d))`.
//!
//! ## Conventions
//! [`MomentMatching`] picks the degenerate-regime rule and whether the weights
//! are rescaled to sum to one before matching. Rescaling leaves `l`, `d` and
//! every probability unchanged up to rounding; `μQ` and `σQ` are reported on the
//! original scale either way.

use ndarray::Array1;
use tracing::debug;

use crate::config::{MomentMatching, NONCENTRALITY_FLOOR};
use crate::errors::KernelError;
use crate::kernels::scientific::distributions::univariate::chi_squared::chi_square_sf_scalar;
use crate::kernels::scientific::distributions::univariate::common::allocate_and_fill;
use crate::kernels::scientific::distributions::univariate::common::std::univariate_kernel_f64_std_to;
use crate::kernels::scientific::distributions::univariate::noncentral_chi_squared::{
    noncentral_chi_square_log_sf_scalar, noncentral_chi_square_sf_scalar,
};
use crate::kernels::scientific::mixture::{
    Cumulants, LiuInfo, LiuSurvival, ModLiuPValue, MomentParams,
};
use crate::utils::{
    confirm_equal_len, confirm_finite, confirm_finite_masked, confirm_finite_scalar,
    confirm_mask_capacity, has_nulls,
};

impl Cumulants {
    #[inline]
    pub const fn new(c1: f64, c2: f64, c3: f64, c4: f64) -> Self {
        Cumulants { c1, c2, c3, c4 }
    }

    /// Cumulant sums of `Σ λᵢ·χ²₁`.
    pub fn from_weights(weights: &[f64]) -> Result<Self, KernelError> {
        confirm_finite("cumulants: weights", weights)?;
        Ok(central_sums(weights))
    }

    /// Cumulant sums of `Σ λᵢ·χ²(hᵢ, δᵢ)`.
    pub fn from_components(
        weights: &[f64],
        dofs: &[f64],
        deltas: &[f64],
    ) -> Result<Self, KernelError> {
        validate_mixture(weights, dofs, deltas)?;
        Ok(component_sums(weights, dofs, deltas, 1.0))
    }

    /// Matches the surrogate `χ²(l, d)`.
    ///
    /// # Errors
    /// - `InvalidArguments` when the moments are non-finite or `c₂ ≤ 0`
    /// - `NegativeDegreesOfFreedom` when the matched `l` is not positive
    pub fn match_moments(&self, use_kurtosis_matching: bool) -> Result<MomentParams, KernelError> {
        let Cumulants { c1, c2, c3, c4 } = *self;
        if !(c1.is_finite() && c2.is_finite() && c3.is_finite() && c4.is_finite()) {
            return Err(KernelError::InvalidArguments(format!(
                "moment_matching: non-finite cumulants {:?}",
                self
            )));
        }
        if c2 <= 0.0 {
            return Err(KernelError::InvalidArguments(format!(
                "moment_matching: second cumulant must be positive, got {}",
                c2
            )));
        }

        let mu_q = c1;
        let sigma_q = (2.0 * c2).sqrt();
        let s1 = c3 / c2.powf(1.5);
        let s2 = c4 / (c2 * c2);

        let (dof, noncentrality) = if s1 * s1 > s2 {
            let a = 1.0 / (s1 - (s1 * s1 - s2).sqrt());
            let d = s1 * a * a * a - a * a;
            (a * a - 2.0 * d, d)
        } else if use_kurtosis_matching {
            (1.0 / s2, 0.0)
        } else {
            (1.0 / (s1 * s1), 0.0)
        };

        if !dof.is_finite() || !noncentrality.is_finite() {
            return Err(KernelError::InvalidArguments(format!(
                "moment_matching: degenerate moments (s1 = {}, s2 = {})",
                s1, s2
            )));
        }
        if dof <= 0.0 {
            return Err(KernelError::NegativeDegreesOfFreedom(format!(
                "moment_matching: matched dof {} (s1 = {}, s2 = {})",
                dof, s1, s2
            )));
        }

        Ok(MomentParams {
            mu_q,
            sigma_q,
            mu_x: dof + noncentrality,
            sigma_x: (2.0 * (dof + 2.0 * noncentrality)).sqrt(),
            dof,
            noncentrality,
        })
    }
}

#[inline]
fn central_sums(weights: &[f64]) -> Cumulants {
    let mut c = [0.0; 4];
    for &w in weights {
        let mut p = w;
        for ck in c.iter_mut() {
            *ck += p;
            p *= w;
        }
    }
    Cumulants::new(c[0], c[1], c[2], c[3])
}

#[inline]
fn component_sums(weights: &[f64], dofs: &[f64], deltas: &[f64], scale: f64) -> Cumulants {
    let mut c = [0.0; 4];
    for ((&w, &h), &d) in weights.iter().zip(dofs).zip(deltas) {
        let w = w / scale;
        let mut p = w;
        for (k, ck) in c.iter_mut().enumerate() {
            *ck += p * h + (k + 1) as f64 * p * d;
            p *= w;
        }
    }
    Cumulants::new(c[0], c[1], c[2], c[3])
}

fn validate_mixture(weights: &[f64], dofs: &[f64], deltas: &[f64]) -> Result<(), KernelError> {
    if weights.is_empty() {
        return Err(KernelError::InvalidArguments(
            "moment_matching: no weights".into(),
        ));
    }
    confirm_equal_len("moment_matching: weights vs dofs", weights.len(), dofs.len())?;
    confirm_equal_len("moment_matching: weights vs deltas", weights.len(), deltas.len())?;
    confirm_finite("moment_matching: weights", weights)?;
    confirm_finite("moment_matching: dofs", dofs)?;
    confirm_finite("moment_matching: deltas", deltas)?;
    if dofs.iter().any(|&h| h < 0.0) || deltas.iter().any(|&d| d < 0.0) {
        return Err(KernelError::InvalidArguments(
            "moment_matching: dofs and noncentralities must be nonnegative".into(),
        ));
    }
    Ok(())
}

/// Matched surrogate of `Σ λᵢ·χ²(hᵢ, δᵢ)`.
///
/// `dofs` defaults to ones and `deltas` to zeros.
pub fn mixture_moment_params(
    weights: &[f64],
    dofs: Option<&[f64]>,
    deltas: Option<&[f64]>,
    matching: MomentMatching,
) -> Result<MomentParams, KernelError> {
    let ones;
    let zeros;
    let dofs = match dofs {
        Some(h) => h,
        None => {
            ones = vec![1.0; weights.len()];
            ones.as_slice()
        }
    };
    let deltas = match deltas {
        Some(d) => d,
        None => {
            zeros = vec![0.0; weights.len()];
            zeros.as_slice()
        }
    };
    validate_mixture(weights, dofs, deltas)?;

    let scale = if matching.normalize_weights {
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return Err(KernelError::InvalidArguments(format!(
                "moment_matching: cannot normalise weights summing to {}",
                total
            )));
        }
        total
    } else {
        1.0
    };

    let mut params = component_sums(weights, dofs, deltas, scale)
        .match_moments(matching.use_kurtosis_matching)?;
    params.mu_q *= scale;
    params.sigma_q *= scale;
    debug!(
        dof = params.dof,
        noncentrality = params.noncentrality,
        mu_q = params.mu_q,
        sigma_q = params.sigma_q,
        kurtosis = matching.use_kurtosis_matching,
        normalized = matching.normalize_weights,
        "moment matching"
    );
    Ok(params)
}

/// Liu approximation of `Pr(Q > t)` for each `t`.
///
/// The surrogate's noncentrality is floored at `1e-9` before evaluation; the
/// returned `noncentrality` is the unfloored match. Null lanes of `t` come back
/// as NaN in both `p` and `t_star`.
///
/// # Errors
/// - `NonFiniteInput` for a non-finite valid `t` or any non-finite mixture parameter
/// - `LengthMismatch` when `dofs` or `deltas` do not match `weights`
/// - `NegativeDegreesOfFreedom` for inconsistent moments
pub fn liu_survival(
    t: &[f64],
    weights: &[f64],
    dofs: Option<&[f64]>,
    deltas: Option<&[f64]>,
    matching: MomentMatching,
    null_mask: Option<&[bool]>,
    null_count: Option<usize>,
) -> Result<LiuSurvival, KernelError> {
    confirm_mask_capacity(t.len(), null_mask)?;
    confirm_finite_masked("liu_survival: t", t, null_mask, null_count)?;
    let params = mixture_moment_params(weights, dofs, deltas, matching)?;
    let nulls = has_nulls(null_count, null_mask);
    let nc = params.noncentrality.max(NONCENTRALITY_FLOOR);

    let t_star = allocate_and_fill(t.len(), |out| {
        univariate_kernel_f64_std_to(t, out, null_mask, nulls, |ti| {
            (ti - params.mu_q) / params.sigma_q
        });
        Ok(())
    })?;
    let p = allocate_and_fill(t.len(), |out| {
        univariate_kernel_f64_std_to(t, out, null_mask, nulls, |ti| {
            noncentral_chi_square_sf_scalar(params.normalise(ti), params.dof, nc)
        });
        Ok(())
    })?;

    Ok(LiuSurvival {
        p,
        dof: params.dof,
        noncentrality: params.noncentrality,
        info: LiuInfo {
            mu_q: params.mu_q,
            sigma_q: params.sigma_q,
            mu_x: params.mu_x,
            sigma_x: params.sigma_x,
            t_star,
        },
    })
}

/// SKAT's modified Liu p-value, kurtosis matched and central.
///
/// `p = SF_χ²(l)((q − μQ)/σQ·√(2l) + l)`. With `normalize` the weights are
/// rescaled to sum to one before matching.
///
/// # Errors
/// `NegativeDegreesOfFreedom` when the weight moments force `l ≤ 0`.
pub fn mod_liu_pvalue(
    q: &[f64],
    weights: &[f64],
    normalize: bool,
) -> Result<ModLiuPValue, KernelError> {
    confirm_finite("mod_liu_pvalue: q", q)?;
    let matching = if normalize {
        MomentMatching::KURTOSIS.normalized()
    } else {
        MomentMatching::KURTOSIS
    };
    let params = mixture_moment_params(weights, None, None, matching)?;
    Ok(mod_liu_from_params(q, &params))
}

/// [`mod_liu_pvalue`] from cumulant sums the caller already holds.
pub fn mod_liu_pvalue_from_cumulants(
    q: &[f64],
    cumulants: &Cumulants,
) -> Result<ModLiuPValue, KernelError> {
    confirm_finite("mod_liu_pvalue: q", q)?;
    let params = cumulants.match_moments(true)?;
    Ok(mod_liu_from_params(q, &params))
}

fn mod_liu_from_params(q: &[f64], params: &MomentParams) -> ModLiuPValue {
    let l = params.dof;
    let scale = (2.0 * l).sqrt();
    let p = q
        .iter()
        .map(|&qi| chi_square_sf_scalar((qi - params.mu_q) / params.sigma_q * scale + l, l))
        .collect();
    ModLiuPValue {
        p,
        mu_q: params.mu_q,
        sigma_q: params.sigma_q,
        dof: l,
    }
}

/// Kurtosis matched tail `SF(t*·σX + μX; l, d)` of `Σ λᵢ·χ²₁`.
///
/// The substitute the Davies estimator falls back on.
pub fn liu_pvalue_lambda(q: &[f64], weights: &[f64]) -> Result<Array1<f64>, KernelError> {
    confirm_finite("liu_pvalue_lambda: q", q)?;
    let params = mixture_moment_params(weights, None, None, MomentMatching::KURTOSIS)?;
    Ok(q
        .iter()
        .map(|&qi| {
            noncentral_chi_square_sf_scalar(
                params.normalise(qi),
                params.dof,
                params.noncentrality.max(0.0),
            )
        })
        .collect())
}

/// Natural log of [`liu_pvalue_lambda`] at a single statistic.
///
/// Finite where the linear tail underflows to zero.
pub fn liu_log_pvalue_lambda(q: f64, weights: &[f64]) -> Result<f64, KernelError> {
    confirm_finite_scalar("liu_log_pvalue_lambda: q", q)?;
    let params = mixture_moment_params(weights, None, None, MomentMatching::KURTOSIS)?;
    Ok(noncentral_chi_square_log_sf_scalar(
        params.normalise(q),
        params.dof,
        params.noncentrality.max(0.0),
    ))
}
