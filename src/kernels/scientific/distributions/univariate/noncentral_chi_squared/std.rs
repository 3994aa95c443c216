// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under Mozilla Public License (MPL) 2.0.

use ndarray::Array1;

use crate::errors::KernelError;
use crate::kernels::scientific::distributions::shared::constants::*;
use crate::kernels::scientific::distributions::shared::scalar::*;
use crate::kernels::scientific::distributions::univariate::chi_squared::{
    chi_square_cdf_scalar, chi_square_log_sf_scalar, chi_square_sf_scalar,
};
use crate::kernels::scientific::distributions::univariate::common::allocate_and_fill;
use crate::kernels::scientific::distributions::univariate::common::std::univariate_kernel_f64_std_to;
use crate::utils::{confirm_equal_len, confirm_mask_capacity, has_nulls};

#[inline(always)]
fn validate_params(label: &str, df: f64, nc: f64) -> Result<(), KernelError> {
    if df <= 0.0 || !df.is_finite() {
        return Err(KernelError::InvalidArguments(format!(
            "{}: invalid df {}",
            label, df
        )));
    }
    if nc < 0.0 || !nc.is_finite() {
        return Err(KernelError::InvalidArguments(format!(
            "{}: invalid noncentrality {}",
            label, nc
        )));
    }
    Ok(())
}

/// `ln Σ_j Pois(j; half_nc)·e^{ln_term(j)}`.
///
/// The sum is walked outwards from the Poisson mode in both directions until a
/// term falls below `POISSON_TERM_EPS` of the largest term seen.
fn ln_poisson_mixture<F>(half_nc: f64, ln_term: F) -> f64
where
    F: Fn(f64) -> f64,
{
    let cutoff = POISSON_TERM_EPS.ln();
    let ln_at = |j: f64| ln_poisson_pmf(j, half_nc) + ln_term(j);

    let mode = half_nc.floor();
    let mut total = ln_at(mode);
    let mut peak = total;

    let mut j = mode + 1.0;
    for _ in 0..NONCENTRAL_MAX_TERMS {
        let t = ln_at(j);
        total = ln_add_exp(total, t);
        peak = peak.max(t);
        if t == f64::NEG_INFINITY || t < peak + cutoff {
            break;
        }
        j += 1.0;
    }

    let mut j = mode - 1.0;
    while j >= 0.0 {
        let t = ln_at(j);
        total = ln_add_exp(total, t);
        peak = peak.max(t);
        if t == f64::NEG_INFINITY || t < peak + cutoff {
            break;
        }
        j -= 1.0;
    }
    total
}

/// Noncentral chi-square CDF at a single point.
///
/// `F(x; k, λ) = Σ_j Pois(j; λ/2)·P(k/2 + j, x/2)`.
#[inline]
pub fn noncentral_chi_square_cdf_scalar(x: f64, df: f64, nc: f64) -> f64 {
    if nc == 0.0 {
        return chi_square_cdf_scalar(x, df);
    }
    if x.is_nan() {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 0.0;
    }
    if x.is_infinite() {
        return 1.0;
    }
    let half_x = 0.5 * x;
    let half_k = 0.5 * df;
    ln_poisson_mixture(0.5 * nc, |j| ln_reg_lower_gamma(half_k + j, half_x))
        .exp()
        .min(1.0)
}

/// Noncentral chi-square survival function at a single point.
#[inline]
pub fn noncentral_chi_square_sf_scalar(x: f64, df: f64, nc: f64) -> f64 {
    if nc == 0.0 {
        return chi_square_sf_scalar(x, df);
    }
    noncentral_chi_square_log_sf_scalar(x, df, nc).exp()
}

/// Natural log of the noncentral chi-square survival function at a single point.
///
/// Finite far below `f64::MIN_POSITIVE`.
#[inline]
pub fn noncentral_chi_square_log_sf_scalar(x: f64, df: f64, nc: f64) -> f64 {
    if nc == 0.0 {
        return chi_square_log_sf_scalar(x, df);
    }
    if x.is_nan() {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 0.0;
    }
    if x.is_infinite() {
        return f64::NEG_INFINITY;
    }
    let half_x = 0.5 * x;
    let half_k = 0.5 * df;
    ln_poisson_mixture(0.5 * nc, |j| ln_reg_upper_gamma(half_k + j, half_x)).min(0.0)
}

/// Inverse survival function at a single probability.
///
/// Bisection on the log survival function, so upper quantiles as small as
/// `1e-300` resolve.
pub fn noncentral_chi_square_isf_scalar(p: f64, df: f64, nc: f64) -> f64 {
    if !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::INFINITY;
    }
    if p == 1.0 {
        return 0.0;
    }
    let target = p.ln();
    let log_sf = |x: f64| noncentral_chi_square_log_sf_scalar(x, df, nc);

    let mut lo = 0.0;
    let mut hi = (df + nc).max(1.0);
    let mut doublings = 0;
    while log_sf(hi) > target {
        lo = hi;
        hi *= 2.0;
        doublings += 1;
        if doublings == ISF_BRACKET_DOUBLINGS || !hi.is_finite() {
            return f64::INFINITY;
        }
    }

    for _ in 0..ISF_BISECTION_STEPS {
        let mid = 0.5 * (lo + hi);
        if mid <= lo || mid >= hi {
            break;
        }
        if log_sf(mid) > target {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

macro_rules! noncentral_kernel {
    ($to:ident, $alloc:ident, $label:literal, $scalar:ident, $doc:literal) => {
        #[doc = concat!($doc, " (zero-allocation variant).")]
        #[inline(always)]
        pub fn $to(
            x: &[f64],
            df: f64,
            nc: f64,
            output: &mut [f64],
            null_mask: Option<&[bool]>,
            null_count: Option<usize>,
        ) -> Result<(), KernelError> {
            validate_params($label, df, nc)?;
            confirm_equal_len(concat!($label, ": output"), x.len(), output.len())?;
            confirm_mask_capacity(x.len(), null_mask)?;
            if x.is_empty() {
                return Ok(());
            }
            univariate_kernel_f64_std_to(
                x,
                output,
                null_mask,
                has_nulls(null_count, null_mask),
                |xi| $scalar(xi, df, nc),
            );
            Ok(())
        }

        #[doc = concat!($doc, ".")]
        #[inline(always)]
        pub fn $alloc(
            x: &[f64],
            df: f64,
            nc: f64,
            null_mask: Option<&[bool]>,
            null_count: Option<usize>,
        ) -> Result<Array1<f64>, KernelError> {
            allocate_and_fill(x.len(), |out| $to(x, df, nc, out, null_mask, null_count))
        }
    };
}

noncentral_kernel!(
    noncentral_chi_square_cdf_std_to,
    noncentral_chi_square_cdf_std,
    "noncentral_chi_square_cdf",
    noncentral_chi_square_cdf_scalar,
    "Noncentral chi-square CDF"
);

noncentral_kernel!(
    noncentral_chi_square_sf_std_to,
    noncentral_chi_square_sf_std,
    "noncentral_chi_square_sf",
    noncentral_chi_square_sf_scalar,
    "Noncentral chi-square survival function"
);

noncentral_kernel!(
    noncentral_chi_square_log_sf_std_to,
    noncentral_chi_square_log_sf_std,
    "noncentral_chi_square_log_sf",
    noncentral_chi_square_log_sf_scalar,
    "Noncentral chi-square log survival function"
);

noncentral_kernel!(
    noncentral_chi_square_isf_std_to,
    noncentral_chi_square_isf_std,
    "noncentral_chi_square_isf",
    noncentral_chi_square_isf_scalar,
    "Noncentral chi-square inverse survival function"
);
