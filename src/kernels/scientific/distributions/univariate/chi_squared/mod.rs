// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under Mozilla Public License (MPL) 2.0.

//! # **Chi-Squared Distribution** - *Central Chi-Squared Kernels*
//!
//! Density, distribution, survival and log-survival kernels for the central
//! chi-squared distribution. The survival forms are evaluated directly in the
//! upper tail so that p-values keep their relative precision, and the log form
//! stays finite where the linear survival underflows.
//!
//! ### Parameters
//! - **`df` (degrees of freedom)**: Shape parameter `k > 0`
//!
//! ### Moment Properties
//! - **Mean**: `k`
//! - **Variance**: `2k`
//! - **Skewness**: `sqrt(8/k)`
//! - **Support**: `[0, ∞)`
//!
//! ## Applications
//! - **Quadratic forms**: each term of a chi-squared mixture
//! - **Moment matching**: the surrogate law of the Liu approximation
//! - **Optimal-test integrals**: the one degree of freedom weight density
mod std;

pub use self::std::{
    chi_square_cdf_scalar, chi_square_log_sf_scalar, chi_square_pdf1, chi_square_pdf_scalar,
    chi_square_sf_scalar,
};
pub(crate) use self::std::validate_df;

use ndarray::Array1;

use crate::errors::KernelError;

/// Chi-square PDF (zero-allocation variant).
///
/// Writes directly to caller-provided output buffer.
#[inline(always)]
pub fn chi_square_pdf_to(
    x: &[f64],
    df: f64,
    output: &mut [f64],
    null_mask: Option<&[bool]>,
    null_count: Option<usize>,
) -> Result<(), KernelError> {
    std::chi_square_pdf_std_to(x, df, output, null_mask, null_count)
}

/// Chi-square PDF: f(x; k) = 1/(2^{k/2} Γ(k/2)) x^{k/2-1} e^{-x/2}
#[inline(always)]
pub fn chi_square_pdf(
    x: &[f64],
    df: f64,
    null_mask: Option<&[bool]>,
    null_count: Option<usize>,
) -> Result<Array1<f64>, KernelError> {
    std::chi_square_pdf_std(x, df, null_mask, null_count)
}

/// Chi-square CDF (zero-allocation variant).
///
/// Writes directly to caller-provided output buffer.
#[inline(always)]
pub fn chi_square_cdf_to(
    x: &[f64],
    df: f64,
    output: &mut [f64],
    null_mask: Option<&[bool]>,
    null_count: Option<usize>,
) -> Result<(), KernelError> {
    std::chi_square_cdf_std_to(x, df, output, null_mask, null_count)
}

/// Chi-square CDF: F(x; k) = P(k/2, x/2)
#[inline(always)]
pub fn chi_square_cdf(
    x: &[f64],
    df: f64,
    null_mask: Option<&[bool]>,
    null_count: Option<usize>,
) -> Result<Array1<f64>, KernelError> {
    std::chi_square_cdf_std(x, df, null_mask, null_count)
}

/// Chi-square survival function (zero-allocation variant).
#[inline(always)]
pub fn chi_square_sf_to(
    x: &[f64],
    df: f64,
    output: &mut [f64],
    null_mask: Option<&[bool]>,
    null_count: Option<usize>,
) -> Result<(), KernelError> {
    std::chi_square_sf_std_to(x, df, output, null_mask, null_count)
}

/// Chi-square survival function `Pr(X > x)`, computed without `1 - cdf` cancellation.
#[inline(always)]
pub fn chi_square_sf(
    x: &[f64],
    df: f64,
    null_mask: Option<&[bool]>,
    null_count: Option<usize>,
) -> Result<Array1<f64>, KernelError> {
    std::chi_square_sf_std(x, df, null_mask, null_count)
}

/// Chi-square log survival function (zero-allocation variant).
#[inline(always)]
pub fn chi_square_log_sf_to(
    x: &[f64],
    df: f64,
    output: &mut [f64],
    null_mask: Option<&[bool]>,
    null_count: Option<usize>,
) -> Result<(), KernelError> {
    std::chi_square_log_sf_std_to(x, df, output, null_mask, null_count)
}

/// Natural log of the chi-square survival function.
#[inline(always)]
pub fn chi_square_log_sf(
    x: &[f64],
    df: f64,
    null_mask: Option<&[bool]>,
    null_count: Option<usize>,
) -> Result<Array1<f64>, KernelError> {
    std::chi_square_log_sf_std(x, df, null_mask, null_count)
}
