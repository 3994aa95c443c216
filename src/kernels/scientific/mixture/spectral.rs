// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under Mozilla Public License (MPL) 2.0.

//! # **Spectral Filter** - *Kernel Matrix to Mixture Weights*
//!
//! A quadratic form `yᵀKy` in independent standard normals is distributed as
//! `Σ λᵢ·χ²₁` over the eigenvalues `λᵢ` of `K`. Tiny and negative eigenvalues
//! are round-off, and they destabilise the moment formulas, so they are dropped
//! with a relative cut-off:
//!
//! 1. sort the spectrum ascending;
//! 2. take the mean `m` of the nonnegative eigenvalues;
//! 3. keep `λ > m / divisor` (default divisor `100000`).
//!
//! An empty result is an error: there is no mixture to evaluate.

use tracing::debug;

use crate::config::EIGEN_RELATIVE_DIVISOR;
use crate::errors::KernelError;
use crate::kernels::scientific::eigen::{NalgebraEigenSolver, SymmetricEigenSolver};
use crate::kernels::scientific::mixture::WeightSet;
use crate::utils::confirm_finite;

impl WeightSet {
    /// Filters the spectrum of the row-major `n × n` symmetric matrix `data`.
    pub fn from_kernel<S: SymmetricEigenSolver>(
        data: &[f64],
        n: usize,
        solver: &S,
        divisor: f64,
    ) -> Result<WeightSet, KernelError> {
        let spectrum = solver.eigenvalues(data, n)?;
        filter_spectrum(spectrum, divisor)
    }

    /// Filters an explicit eigenvalue vector, the spectrum of a diagonal kernel.
    pub fn from_eigenvalues(eigenvalues: &[f64], divisor: f64) -> Result<WeightSet, KernelError> {
        confirm_finite("spectral_filter: eigenvalues", eigenvalues)?;
        filter_spectrum(eigenvalues.to_vec(), divisor)
    }

    /// [`from_kernel`](Self::from_kernel) with the `nalgebra` solver and default divisor.
    pub fn from_kernel_default(data: &[f64], n: usize) -> Result<WeightSet, KernelError> {
        WeightSet::from_kernel(data, n, &NalgebraEigenSolver, EIGEN_RELATIVE_DIVISOR)
    }
}

fn filter_spectrum(mut spectrum: Vec<f64>, divisor: f64) -> Result<WeightSet, KernelError> {
    if divisor.is_nan() || divisor <= 0.0 {
        return Err(KernelError::InvalidArguments(format!(
            "spectral_filter: divisor must be positive, got {}",
            divisor
        )));
    }
    spectrum.sort_by(|a, b| a.total_cmp(b));

    let (sum, count) = spectrum
        .iter()
        .filter(|&&l| l >= 0.0)
        .fold((0.0, 0usize), |(s, c), &l| (s + l, c + 1));
    if count == 0 {
        return Err(KernelError::NoPositiveEigenvalue(format!(
            "spectral_filter: all {} eigenvalues are negative",
            spectrum.len()
        )));
    }
    let cutoff = sum / count as f64 / divisor;
    let total = spectrum.len();
    spectrum.retain(|&l| l > cutoff);

    if spectrum.is_empty() {
        return Err(KernelError::NoPositiveEigenvalue(format!(
            "spectral_filter: no eigenvalue above cut-off {:e}",
            cutoff
        )));
    }
    debug!(
        kept = spectrum.len(),
        dropped = total - spectrum.len(),
        cutoff,
        "spectral filter"
    );
    Ok(WeightSet { values: spectrum })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_negative_and_negligible_eigenvalues() {
        let ev = [3.0, -1e-12, 2.0, 1e-9, 0.0, 1.0];
        let ws = WeightSet::from_eigenvalues(&ev, EIGEN_RELATIVE_DIVISOR).unwrap();
        // mean of {3, 2, 1e-9, 0, 1} is ~1.2, cut-off ~1.2e-5
        assert_eq!(ws.as_slice(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn cutoff_is_relative_to_scale() {
        let small: Vec<f64> = [3.0, 2.0, 1.0, 1e-7].iter().map(|v| v * 1e-20).collect();
        let ws = WeightSet::from_eigenvalues(&small, EIGEN_RELATIVE_DIVISOR).unwrap();
        assert_eq!(ws.len(), 3);
        assert_eq!(ws.as_slice()[0], 1e-20);
    }

    #[test]
    fn kernel_matrix_spectrum() {
        // diag(0.1, 0.4, 0.5) rotated by a permutation stays diagonal
        let k = [0.5, 0.0, 0.0, 0.0, 0.1, 0.0, 0.0, 0.0, 0.4];
        let ws = WeightSet::from_kernel_default(&k, 3).unwrap();
        let v = ws.as_slice();
        assert!((v[0] - 0.1).abs() < 1e-15);
        assert!((v[1] - 0.4).abs() < 1e-15);
        assert!((v[2] - 0.5).abs() < 1e-15);

        // rank-one kernel keeps a single weight
        let x = [1.0, 1.0, 1.0, 1.0];
        let k: Vec<f64> = (0..16).map(|i| x[i / 4] * x[i % 4]).collect();
        let ws = WeightSet::from_kernel_default(&k, 4).unwrap();
        assert_eq!(ws.len(), 1);
        assert!((ws.as_slice()[0] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn empty_spectrum_is_an_error() {
        assert!(matches!(
            WeightSet::from_eigenvalues(&[-1.0, -2.0], EIGEN_RELATIVE_DIVISOR),
            Err(KernelError::NoPositiveEigenvalue(_))
        ));
        assert!(matches!(
            WeightSet::from_eigenvalues(&[0.0, 0.0], EIGEN_RELATIVE_DIVISOR),
            Err(KernelError::NoPositiveEigenvalue(_))
        ));
        assert!(matches!(
            WeightSet::from_kernel_default(&[0.0; 4], 2),
            Err(KernelError::NoPositiveEigenvalue(_))
        ));
        assert!(matches!(
            WeightSet::from_eigenvalues(&[1.0, f64::INFINITY], EIGEN_RELATIVE_DIVISOR),
            Err(KernelError::NonFiniteInput(_))
        ));
        assert!(WeightSet::from_eigenvalues(&[1.0], 0.0).is_err());
    }
}
