// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under Mozilla Public License (MPL) 2.0.

//! # **Error Types** - *Kernel Operation Error Handling*
//!
//! Error types for the mixture kernels with structured error reporting.
//! Every variant carries a contextual message, and maps onto one of the four
//! failure classes callers are expected to handle differently.
//!
//! ## Error Categories
//! - **Fatal input**: non-finite inputs, empty spectra, malformed buffers
//! - **Numerical non-convergence**: the characteristic-function inversion faulted
//! - **Integration failure**: bracket search or quadrature tolerance exhausted
//! - **Ill-conditioned moments**: the matched chi-squared would need negative dof
//!
//! Non-convergence is recovered inside the estimators and only reaches callers
//! as a flag on [`PValueResult`](crate::kernels::scientific::mixture::PValueResult).

use core::fmt;
use std::error::Error;

/// Error type for all kernel operations.
#[derive(Debug, Clone, PartialEq)]
pub enum KernelError {
    /// Invalid arguments provided to kernel function.
    InvalidArguments(String),

    /// Array length mismatch between operands.
    LengthMismatch(String),

    /// A statistic, weight or matrix entry is NaN or infinite.
    NonFiniteInput(String),

    /// No eigenvalue survived spectral filtering.
    NoPositiveEigenvalue(String),

    /// The symmetric eigen-solver failed.
    EigenDecomposition(String),

    /// Moment matching produced a negative number of degrees of freedom.
    NegativeDegreesOfFreedom(String),

    /// The characteristic-function inversion reported a fault.
    NonConvergence(String),

    /// The integration upper bound search ran out of iterations.
    UpperBoundNotFound(String),
}

/// Coarse failure classes, one per recovery policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The request cannot be answered; propagate to the caller.
    FatalInput,
    /// Recovered locally by a moment-matching substitute.
    NumericalNonConvergence,
    /// Recovered locally by the Liu integration path.
    IntegrationFailure,
    /// Moment inputs are inconsistent; fatal for the call.
    IllConditionedMoments,
}

impl KernelError {
    /// Failure class of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            KernelError::InvalidArguments(_)
            | KernelError::LengthMismatch(_)
            | KernelError::NonFiniteInput(_)
            | KernelError::NoPositiveEigenvalue(_)
            | KernelError::EigenDecomposition(_) => ErrorCategory::FatalInput,
            KernelError::NonConvergence(_) => ErrorCategory::NumericalNonConvergence,
            KernelError::UpperBoundNotFound(_) => ErrorCategory::IntegrationFailure,
            KernelError::NegativeDegreesOfFreedom(_) => ErrorCategory::IllConditionedMoments,
        }
    }
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::InvalidArguments(msg) => write!(f, "Invalid arguments: {}", msg),
            KernelError::LengthMismatch(msg) => write!(f, "Length mismatch: {}", msg),
            KernelError::NonFiniteInput(msg) => write!(f, "Non-finite input: {}", msg),
            KernelError::NoPositiveEigenvalue(msg) => {
                write!(f, "No eigenvalue is bigger than 0: {}", msg)
            }
            KernelError::EigenDecomposition(msg) => write!(f, "Eigen decomposition failed: {}", msg),
            KernelError::NegativeDegreesOfFreedom(msg) => {
                write!(f, "Negative degrees of freedom: {}", msg)
            }
            KernelError::NonConvergence(msg) => write!(f, "Non-convergence: {}", msg),
            KernelError::UpperBoundNotFound(msg) => write!(f, "Upper bound not found: {}", msg),
        }
    }
}

impl Error for KernelError {}

/// Creates a formatted error message for length mismatches between left-hand side (LHS) and right-hand side (RHS) arrays.
///
/// # Arguments
/// * `fname` - Function name where the mismatch occurred
/// * `lhs` - Length of the left-hand side array
/// * `rhs` - Length of the right-hand side array
///
/// # Returns
/// A formatted error message string
pub fn log_length_mismatch(fname: String, lhs: usize, rhs: usize) -> String {
    return format!("{} => Length mismatch: LHS {} RHS {}", fname, lhs, rhs);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_follow_recovery_policy() {
        assert_eq!(
            KernelError::NoPositiveEigenvalue("k".into()).category(),
            ErrorCategory::FatalInput
        );
        assert_eq!(
            KernelError::NonConvergence("ifault 1".into()).category(),
            ErrorCategory::NumericalNonConvergence
        );
        assert_eq!(
            KernelError::UpperBoundNotFound("80".into()).category(),
            ErrorCategory::IntegrationFailure
        );
        assert_eq!(
            KernelError::NegativeDegreesOfFreedom("l=-1".into()).category(),
            ErrorCategory::IllConditionedMoments
        );
    }

    #[test]
    fn length_mismatch_message() {
        let msg = log_length_mismatch("liu_survival".into(), 3, 2);
        assert_eq!(msg, "liu_survival => Length mismatch: LHS 3 RHS 2");
    }
}
