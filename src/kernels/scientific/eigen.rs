// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under Mozilla Public License (MPL) 2.0.

//! # **Symmetric Eigenvalues** - *Spectra of Quadratic-Form Kernels*
//!
//! Eigenvalues of dense real symmetric matrices, the first step of turning a
//! kernel matrix into chi-squared mixture weights.
//!
//! Matrices are passed as row-major `n × n` slices. Only the lower triangle
//! (including the diagonal) is read, so a matrix that is symmetric up to
//! round-off gives the same spectrum whichever triangle carries the noise.

use nalgebra::DMatrix;

use crate::config::EIGEN_ITERATIONS_PER_ROW;
use crate::errors::KernelError;
use crate::utils::confirm_finite;

/// Eigenvalues of a dense symmetric matrix.
pub trait SymmetricEigenSolver {
    /// Returns the `n` eigenvalues of the row-major matrix `data`, in ascending order.
    fn eigenvalues(&self, data: &[f64], n: usize) -> Result<Vec<f64>, KernelError>;
}

/// Implicit QL solver from `nalgebra`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NalgebraEigenSolver;

/// Validates an `n × n` row-major buffer.
pub fn confirm_square(label: &str, data: &[f64], n: usize) -> Result<(), KernelError> {
    if n == 0 {
        return Err(KernelError::InvalidArguments(format!(
            "{}: matrix dimension must be positive",
            label
        )));
    }
    match n.checked_mul(n) {
        Some(len) if len == data.len() => {}
        _ => {
            return Err(KernelError::InvalidArguments(format!(
                "{}: expected {}x{} = {} entries, got {}",
                label,
                n,
                n,
                n.saturating_mul(n),
                data.len()
            )))
        }
    }
    confirm_finite(label, data)
}

impl SymmetricEigenSolver for NalgebraEigenSolver {
    fn eigenvalues(&self, data: &[f64], n: usize) -> Result<Vec<f64>, KernelError> {
        confirm_square("symmetric_eigen", data, n)?;
        let m = DMatrix::from_row_slice(n, n, data);
        let eig = m
            .try_symmetric_eigen(f64::EPSILON, EIGEN_ITERATIONS_PER_ROW * n.max(1))
            .ok_or_else(|| {
                KernelError::EigenDecomposition(format!(
                    "symmetric_eigen: no convergence for {}x{} matrix",
                    n, n
                ))
            })?;
        let mut values: Vec<f64> = eig.eigenvalues.iter().copied().collect();
        values.sort_by(|a, b| a.total_cmp(b));
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonal_and_two_by_two_spectra() {
        let solver = NalgebraEigenSolver;
        let d = [3.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 2.0];
        let ev = solver.eigenvalues(&d, 3).unwrap();
        assert_eq!(ev.len(), 3);
        for (a, e) in ev.iter().zip([1.0, 2.0, 3.0].iter()) {
            assert!((a - e).abs() < 1e-14);
        }
        // [[2, 1], [1, 2]] has eigenvalues 1 and 3
        let ev = solver.eigenvalues(&[2.0, 1.0, 1.0, 2.0], 2).unwrap();
        assert!((ev[0] - 1.0).abs() < 1e-14 && (ev[1] - 3.0).abs() < 1e-14);
    }

    #[test]
    fn rank_one_kernel() {
        // v vᵀ with v = (1, 2, 2) has spectrum {0, 0, 9}
        let v = [1.0, 2.0, 2.0];
        let k: Vec<f64> = (0..9).map(|i| v[i / 3] * v[i % 3]).collect();
        let ev = NalgebraEigenSolver.eigenvalues(&k, 3).unwrap();
        assert!(ev[0].abs() < 1e-13 && ev[1].abs() < 1e-13);
        assert!((ev[2] - 9.0).abs() < 1e-13);
    }

    #[test]
    fn malformed_buffers_are_rejected() {
        let solver = NalgebraEigenSolver;
        assert!(matches!(
            solver.eigenvalues(&[1.0, 2.0, 3.0], 2),
            Err(KernelError::InvalidArguments(_))
        ));
        assert!(solver.eigenvalues(&[], 0).is_err());
        assert!(matches!(
            solver.eigenvalues(&[1.0, f64::NAN, f64::NAN, 1.0], 2),
            Err(KernelError::NonFiniteInput(_))
        ));
    }
}
