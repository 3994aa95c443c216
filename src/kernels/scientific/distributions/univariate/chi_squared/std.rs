// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under Mozilla Public License (MPL) 2.0.

use ndarray::Array1;

use crate::errors::KernelError;
use crate::kernels::scientific::distributions::shared::constants::HALF_LOG_TWO_PI;
use crate::kernels::scientific::distributions::shared::scalar::*;
use crate::kernels::scientific::distributions::univariate::common::allocate_and_fill;
use crate::kernels::scientific::distributions::univariate::common::std::univariate_kernel_f64_std_to;
use crate::utils::{confirm_equal_len, confirm_mask_capacity, has_nulls};

#[inline(always)]
pub(crate) fn validate_df(label: &str, df: f64) -> Result<(), KernelError> {
    if df <= 0.0 || !df.is_finite() {
        return Err(KernelError::InvalidArguments(format!(
            "{}: invalid df {}",
            label, df
        )));
    }
    Ok(())
}

#[inline(always)]
fn validate_buffers(
    label: &str,
    x: &[f64],
    output: &[f64],
    null_mask: Option<&[bool]>,
) -> Result<(), KernelError> {
    confirm_equal_len(label, x.len(), output.len())?;
    confirm_mask_capacity(x.len(), null_mask)
}

/// Chi-square density at a single point. `df` must be positive and finite.
#[inline(always)]
pub fn chi_square_pdf_scalar(x: f64, df: f64) -> f64 {
    let k2 = 0.5 * df;
    if x.is_nan() {
        f64::NAN
    } else if x < 0.0 || x.is_infinite() {
        0.0
    } else if x == 0.0 {
        if k2 < 1.0 {
            f64::INFINITY
        } else if k2 == 1.0 {
            0.5
        } else {
            0.0
        }
    } else {
        let log_norm = -k2 * std::f64::consts::LN_2 - ln_gamma(k2);
        (log_norm + (k2 - 1.0) * x.ln() - 0.5 * x).exp()
    }
}

/// One degree of freedom density, `e^{-x/2} / √(2πx)`.
#[inline(always)]
pub fn chi_square_pdf1(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x <= 0.0 {
        return if x == 0.0 { f64::INFINITY } else { 0.0 };
    }
    (-0.5 * x - 0.5 * x.ln() - HALF_LOG_TWO_PI).exp()
}

/// Chi-square CDF at a single point, `P(k/2, x/2)`.
#[inline(always)]
pub fn chi_square_cdf_scalar(x: f64, df: f64) -> f64 {
    if x.is_nan() {
        f64::NAN
    } else if x <= 0.0 {
        0.0
    } else {
        reg_lower_gamma(0.5 * df, 0.5 * x)
    }
}

/// Chi-square survival function at a single point, `Q(k/2, x/2)`.
#[inline(always)]
pub fn chi_square_sf_scalar(x: f64, df: f64) -> f64 {
    if x.is_nan() {
        f64::NAN
    } else if x <= 0.0 {
        1.0
    } else {
        reg_upper_gamma(0.5 * df, 0.5 * x)
    }
}

/// Natural log of the chi-square survival function at a single point.
#[inline(always)]
pub fn chi_square_log_sf_scalar(x: f64, df: f64) -> f64 {
    if x.is_nan() {
        f64::NAN
    } else if x <= 0.0 {
        0.0
    } else {
        ln_reg_upper_gamma(0.5 * df, 0.5 * x)
    }
}

/// Chi-square PDF (zero-allocation variant).
///
/// Writes directly to caller-provided output buffer.
#[inline(always)]
pub fn chi_square_pdf_std_to(
    x: &[f64],
    df: f64,
    output: &mut [f64],
    null_mask: Option<&[bool]>,
    null_count: Option<usize>,
) -> Result<(), KernelError> {
    validate_df("chi_square_pdf", df)?;
    validate_buffers("chi_square_pdf: output", x, output, null_mask)?;
    if x.is_empty() {
        return Ok(());
    }
    univariate_kernel_f64_std_to(
        x,
        output,
        null_mask,
        has_nulls(null_count, null_mask),
        |xi| chi_square_pdf_scalar(xi, df),
    );
    Ok(())
}

/// Chi-square PDF: f(x; k) = 1/(2^{k/2} Γ(k/2)) x^{k/2-1} e^{-x/2}
#[inline(always)]
pub fn chi_square_pdf_std(
    x: &[f64],
    df: f64,
    null_mask: Option<&[bool]>,
    null_count: Option<usize>,
) -> Result<Array1<f64>, KernelError> {
    allocate_and_fill(x.len(), |out| {
        chi_square_pdf_std_to(x, df, out, null_mask, null_count)
    })
}

/// Chi-square CDF (zero-allocation variant).
///
/// Writes directly to caller-provided output buffer.
#[inline(always)]
pub fn chi_square_cdf_std_to(
    x: &[f64],
    df: f64,
    output: &mut [f64],
    null_mask: Option<&[bool]>,
    null_count: Option<usize>,
) -> Result<(), KernelError> {
    validate_df("chi_square_cdf", df)?;
    validate_buffers("chi_square_cdf: output", x, output, null_mask)?;
    if x.is_empty() {
        return Ok(());
    }
    univariate_kernel_f64_std_to(
        x,
        output,
        null_mask,
        has_nulls(null_count, null_mask),
        |xi| chi_square_cdf_scalar(xi, df),
    );
    Ok(())
}

/// Chi-square CDF: F(x; k) = P(k/2, x/2)
#[inline(always)]
pub fn chi_square_cdf_std(
    x: &[f64],
    df: f64,
    null_mask: Option<&[bool]>,
    null_count: Option<usize>,
) -> Result<Array1<f64>, KernelError> {
    allocate_and_fill(x.len(), |out| {
        chi_square_cdf_std_to(x, df, out, null_mask, null_count)
    })
}

/// Chi-square survival function (zero-allocation variant).
#[inline(always)]
pub fn chi_square_sf_std_to(
    x: &[f64],
    df: f64,
    output: &mut [f64],
    null_mask: Option<&[bool]>,
    null_count: Option<usize>,
) -> Result<(), KernelError> {
    validate_df("chi_square_sf", df)?;
    validate_buffers("chi_square_sf: output", x, output, null_mask)?;
    if x.is_empty() {
        return Ok(());
    }
    univariate_kernel_f64_std_to(
        x,
        output,
        null_mask,
        has_nulls(null_count, null_mask),
        |xi| chi_square_sf_scalar(xi, df),
    );
    Ok(())
}

/// Chi-square survival function: S(x; k) = Q(k/2, x/2)
#[inline(always)]
pub fn chi_square_sf_std(
    x: &[f64],
    df: f64,
    null_mask: Option<&[bool]>,
    null_count: Option<usize>,
) -> Result<Array1<f64>, KernelError> {
    allocate_and_fill(x.len(), |out| {
        chi_square_sf_std_to(x, df, out, null_mask, null_count)
    })
}

/// Chi-square log survival function (zero-allocation variant).
#[inline(always)]
pub fn chi_square_log_sf_std_to(
    x: &[f64],
    df: f64,
    output: &mut [f64],
    null_mask: Option<&[bool]>,
    null_count: Option<usize>,
) -> Result<(), KernelError> {
    validate_df("chi_square_log_sf", df)?;
    validate_buffers("chi_square_log_sf: output", x, output, null_mask)?;
    if x.is_empty() {
        return Ok(());
    }
    univariate_kernel_f64_std_to(
        x,
        output,
        null_mask,
        has_nulls(null_count, null_mask),
        |xi| chi_square_log_sf_scalar(xi, df),
    );
    Ok(())
}

/// Chi-square log survival function, ln Q(k/2, x/2).
#[inline(always)]
pub fn chi_square_log_sf_std(
    x: &[f64],
    df: f64,
    null_mask: Option<&[bool]>,
    null_count: Option<usize>,
) -> Result<Array1<f64>, KernelError> {
    allocate_and_fill(x.len(), |out| {
        chi_square_log_sf_std_to(x, df, out, null_mask, null_count)
    })
}
