// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under Mozilla Public License (MPL) 2.0.

//! # **Noncentral Chi-Squared Distribution** - *Poisson Mixture Kernels*
//!
//! Distribution, survival, log-survival and inverse-survival kernels for
//! `χ²(k, λ)`, the law of `Σ (Zᵢ + μᵢ)²` with `λ = Σ μᵢ²`.
//!
//! Every evaluation uses the Poisson mixture representation
//! `Σ_j Pois(j; λ/2)·G(k/2 + j, x/2)` with `G` the regularised incomplete gamma,
//! summed in log space outwards from the Poisson mode. A zero noncentrality
//! reduces exactly to the central kernels.
//!
//! ### Parameters
//! - **`df`**: degrees of freedom `k > 0` (fractional values allowed)
//! - **`nc`**: noncentrality `λ ≥ 0`
//!
//! ### Moment Properties
//! - **Mean**: `k + λ`
//! - **Variance**: `2(k + 2λ)`

mod std;

pub use self::std::{
    noncentral_chi_square_cdf_scalar, noncentral_chi_square_isf_scalar,
    noncentral_chi_square_log_sf_scalar, noncentral_chi_square_sf_scalar,
};

use ndarray::Array1;

use crate::errors::KernelError;

/// Noncentral chi-square CDF (zero-allocation variant).
#[inline(always)]
pub fn noncentral_chi_square_cdf_to(
    x: &[f64],
    df: f64,
    nc: f64,
    output: &mut [f64],
    null_mask: Option<&[bool]>,
    null_count: Option<usize>,
) -> Result<(), KernelError> {
    std::noncentral_chi_square_cdf_std_to(x, df, nc, output, null_mask, null_count)
}

/// Noncentral chi-square CDF.
#[inline(always)]
pub fn noncentral_chi_square_cdf(
    x: &[f64],
    df: f64,
    nc: f64,
    null_mask: Option<&[bool]>,
    null_count: Option<usize>,
) -> Result<Array1<f64>, KernelError> {
    std::noncentral_chi_square_cdf_std(x, df, nc, null_mask, null_count)
}

/// Noncentral chi-square survival function (zero-allocation variant).
#[inline(always)]
pub fn noncentral_chi_square_sf_to(
    x: &[f64],
    df: f64,
    nc: f64,
    output: &mut [f64],
    null_mask: Option<&[bool]>,
    null_count: Option<usize>,
) -> Result<(), KernelError> {
    std::noncentral_chi_square_sf_std_to(x, df, nc, output, null_mask, null_count)
}

/// Noncentral chi-square survival function `Pr(X > x)`.
#[inline(always)]
pub fn noncentral_chi_square_sf(
    x: &[f64],
    df: f64,
    nc: f64,
    null_mask: Option<&[bool]>,
    null_count: Option<usize>,
) -> Result<Array1<f64>, KernelError> {
    std::noncentral_chi_square_sf_std(x, df, nc, null_mask, null_count)
}

/// Noncentral chi-square log survival function (zero-allocation variant).
#[inline(always)]
pub fn noncentral_chi_square_log_sf_to(
    x: &[f64],
    df: f64,
    nc: f64,
    output: &mut [f64],
    null_mask: Option<&[bool]>,
    null_count: Option<usize>,
) -> Result<(), KernelError> {
    std::noncentral_chi_square_log_sf_std_to(x, df, nc, output, null_mask, null_count)
}

/// Natural log of the noncentral chi-square survival function.
#[inline(always)]
pub fn noncentral_chi_square_log_sf(
    x: &[f64],
    df: f64,
    nc: f64,
    null_mask: Option<&[bool]>,
    null_count: Option<usize>,
) -> Result<Array1<f64>, KernelError> {
    std::noncentral_chi_square_log_sf_std(x, df, nc, null_mask, null_count)
}

/// Noncentral chi-square inverse survival function (zero-allocation variant).
#[inline(always)]
pub fn noncentral_chi_square_isf_to(
    p: &[f64],
    df: f64,
    nc: f64,
    output: &mut [f64],
    null_mask: Option<&[bool]>,
    null_count: Option<usize>,
) -> Result<(), KernelError> {
    std::noncentral_chi_square_isf_std_to(p, df, nc, output, null_mask, null_count)
}

/// Noncentral chi-square inverse survival function.
///
/// For each `p` returns `x` with `Pr(X > x) = p`; probabilities outside
/// `[0, 1]` map to NaN.
#[inline(always)]
pub fn noncentral_chi_square_isf(
    p: &[f64],
    df: f64,
    nc: f64,
    null_mask: Option<&[bool]>,
    null_count: Option<usize>,
) -> Result<Array1<f64>, KernelError> {
    std::noncentral_chi_square_isf_std(p, df, nc, null_mask, null_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::scientific::distributions::univariate::chi_squared::chi_square_sf;
    use crate::kernels::scientific::distributions::univariate::common::single_null_mask;

    fn assert_rel(a: f64, b: f64, tol: f64) {
        assert!(
            ((a - b) / b).abs() < tol,
            "relative error too large: {a} vs {b} (tol={tol})"
        );
    }

    #[test]
    fn sf_and_cdf_reference() {
        let xs = [0.5, 3.0, 8.0, 25.0];
        // scipy.stats.ncx2.sf([0.5, 3.0, 8.0, 25.0], 3, 2.5)
        let sf = [
            0.97381433365967301,
            0.68889721673577175,
            0.22204518292576035,
            0.0010452050366016077,
        ];
        // scipy.stats.ncx2.cdf([0.5, 3.0, 8.0, 25.0], 3, 2.5)
        let cdf = [
            0.026185666340326989,
            0.31110278326422825,
            0.77795481707423965,
            0.99895479496339839,
        ];
        let s = noncentral_chi_square_sf(&xs, 3.0, 2.5, None, None).unwrap();
        let c = noncentral_chi_square_cdf(&xs, 3.0, 2.5, None, None).unwrap();
        for i in 0..4 {
            assert_rel(s[i], sf[i], 1e-12);
            assert_rel(c[i], cdf[i], 1e-12);
        }
        // scipy.stats.ncx2.cdf(0.01, 4, 1.0)
        assert_rel(
            noncentral_chi_square_cdf_scalar(0.01, 4.0, 1.0),
            7.5627048069310211e-6,
            1e-11,
        );
    }

    #[test]
    fn log_sf_stays_finite_in_the_deep_tail() {
        // ln scipy.stats.ncx2.sf(1500, 2.5, 10) (mpmath, 40 digits)
        assert_rel(
            noncentral_chi_square_log_sf_scalar(1500.0, 2.5, 10.0),
            -705.41452529573591,
            1e-11,
        );
        assert_rel(
            noncentral_chi_square_log_sf_scalar(400.0, 1.5, 40.0),
            -171.65796971504973,
            1e-11,
        );
        assert_eq!(noncentral_chi_square_sf_scalar(1500.0, 2.5, 10.0), 0.0);
    }

    #[test]
    fn zero_noncentrality_is_central() {
        let xs = [0.2, 1.7, 9.0];
        let nc = noncentral_chi_square_sf(&xs, 2.5, 0.0, None, None).unwrap();
        let c = chi_square_sf(&xs, 2.5, None, None).unwrap();
        assert_eq!(nc, c);
    }

    #[test]
    fn isf_inverts_sf() {
        // scipy.stats.ncx2.sf(12.3, 5, 4)
        let p = 0.22628591757575471;
        let x = noncentral_chi_square_isf_scalar(p, 5.0, 4.0);
        assert!((x - 12.3).abs() < 1e-9, "{x}");
        for &t in &[0.05, 1e-10, 1e-50, 1e-100] {
            let x = noncentral_chi_square_isf_scalar(t, 3.2, 1.5);
            let back = noncentral_chi_square_log_sf_scalar(x, 3.2, 1.5);
            assert!((back - t.ln()).abs() < 1e-8, "t={t} back={back}");
        }
        let q = noncentral_chi_square_isf(&[0.0, 1.0, 1.5, f64::NAN], 2.0, 1.0, None, None)
            .unwrap();
        assert!(q[0].is_infinite());
        assert_eq!(q[1], 0.0);
        assert!(q[2].is_nan() && q[3].is_nan());
    }

    #[test]
    fn survival_is_monotone_and_bounded() {
        let xs: Vec<f64> = (0..60).map(|i| i as f64 * 0.75).collect();
        let s = noncentral_chi_square_sf(&xs, 1.0, 7.0, None, None).unwrap();
        assert_eq!(s[0], 1.0);
        for w in s.as_slice().unwrap().windows(2) {
            assert!(w[1] <= w[0] && w[1] >= 0.0);
        }
    }

    #[test]
    fn masks_and_validation() {
        let m = single_null_mask(3, 0);
        let out = noncentral_chi_square_log_sf(&[1.0, 2.0, 3.0], 2.0, 1.0, Some(m.as_slice()), Some(1))
            .unwrap();
        assert!(out[0].is_nan() && out[1].is_finite());
        assert!(noncentral_chi_square_cdf(&[1.0], 0.0, 1.0, None, None).is_err());
        assert!(noncentral_chi_square_sf(&[1.0], 1.0, -1.0, None, None).is_err());
        let mut buf = [0.0; 2];
        assert!(noncentral_chi_square_cdf_to(&[1.0], 1.0, 1.0, &mut buf, None, None).is_err());
    }
}
