// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under Mozilla Public License (MPL) 2.0.

//! # **Davies Estimator** - *Exact Tail Probabilities with Liu Substitution*
//!
//! `Pr(Q > q)` for `Q = Σ λᵢ·χ²₁` by characteristic-function inversion, the
//! SKAT p-value of a kernel matrix.
//!
//! ## Convergence policy
//! For each statistic, `p = 1 − F(q)`. The kurtosis-matched Liu estimate is
//! computed alongside and replaces `p` when
//! - the weight set has a single element (the inversion is skipped),
//! - the inversion reports a fault, or
//! - `p` falls outside `(0, 1]`.
//!
//! The last two mark the statistic as not converged.
//!
//! ## Extreme tail
//! When the first p-value is exactly zero the batch also carries the log of the
//! Liu tail and a `Pvalue < T` message, `T` the smallest of
//! `0.05, 1e-10, …, 1e-100` whose surrogate upper quantile lies below the
//! normalised statistic.

use tracing::debug;

use crate::config::{DaviesConfig, MomentMatching, EXTREME_TAIL_THRESHOLDS};
use crate::errors::KernelError;
use crate::kernels::scientific::distributions::univariate::noncentral_chi_squared::noncentral_chi_square_isf_scalar;
use crate::kernels::scientific::eigen::{NalgebraEigenSolver, SymmetricEigenSolver};
use crate::kernels::scientific::mixture::inversion::{ChiSquaredCdf, DaviesInversion};
use crate::kernels::scientific::mixture::moments::{
    liu_log_pvalue_lambda, liu_pvalue_lambda, mixture_moment_params,
};
use crate::kernels::scientific::mixture::{PValueBatch, PValueResult, WeightSet};
use crate::utils::confirm_finite;

/// Where the mixture weights come from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KernelInput<'a> {
    /// Row-major `n × n` symmetric kernel matrix.
    Matrix { data: &'a [f64], n: usize },
    /// Eigenvalues of the kernel, equivalently the diagonal of a diagonal kernel.
    Eigenvalues(&'a [f64]),
}

impl KernelInput<'_> {
    /// Runs the spectral filter over the input.
    pub fn weight_set<S: SymmetricEigenSolver>(
        &self,
        solver: &S,
        divisor: f64,
    ) -> Result<WeightSet, KernelError> {
        match *self {
            KernelInput::Matrix { data, n } => WeightSet::from_kernel(data, n, solver, divisor),
            KernelInput::Eigenvalues(ev) => WeightSet::from_eigenvalues(ev, divisor),
        }
    }
}

/// Davies p-value of a single statistic.
///
/// # Errors
/// - `NonFiniteInput` for a non-finite `q` or kernel entry
/// - `NoPositiveEigenvalue` when the spectral filter leaves nothing
pub fn davies_pvalue(q: f64, input: KernelInput<'_>) -> Result<PValueResult, KernelError> {
    davies_pvalues(&[q], input)?
        .into_first()
        .ok_or_else(|| KernelError::InvalidArguments("davies_pvalue: empty batch".into()))
}

/// Davies p-values of a batch of statistics sharing one kernel.
pub fn davies_pvalues(q: &[f64], input: KernelInput<'_>) -> Result<PValueBatch, KernelError> {
    davies_pvalues_with(
        q,
        input,
        &DaviesConfig::default(),
        &NalgebraEigenSolver,
        &DaviesInversion,
    )
}

/// [`davies_pvalues`] with explicit configuration and collaborators.
pub fn davies_pvalues_with<S, C>(
    q: &[f64],
    input: KernelInput<'_>,
    config: &DaviesConfig,
    solver: &S,
    inversion: &C,
) -> Result<PValueBatch, KernelError>
where
    S: SymmetricEigenSolver,
    C: ChiSquaredCdf,
{
    confirm_finite("davies_pvalues: q", q)?;
    let weights = input.weight_set(solver, config.eigen_divisor)?;
    davies_pvalues_lambda_with(q, &weights, config, inversion)
}

/// Davies p-values against an already filtered weight set.
pub fn davies_pvalues_lambda(
    q: &[f64],
    weights: &WeightSet,
    config: &DaviesConfig,
) -> Result<PValueBatch, KernelError> {
    davies_pvalues_lambda_with(q, weights, config, &DaviesInversion)
}

/// [`davies_pvalues_lambda`] with an explicit inversion routine.
pub fn davies_pvalues_lambda_with<C: ChiSquaredCdf>(
    q: &[f64],
    weights: &WeightSet,
    config: &DaviesConfig,
    inversion: &C,
) -> Result<PValueBatch, KernelError> {
    confirm_finite("davies_pvalues: q", q)?;
    let w = weights.as_slice();
    let liu = liu_pvalue_lambda(q, w)?;
    let components = weights.components();

    let mut p_values = liu.clone();
    let mut converged = vec![true; q.len()];

    for (i, &qi) in q.iter().enumerate() {
        let mut p = liu[i];
        if weights.len() > 1 {
            let out = inversion.cdf(qi, &components, 0.0, config.limit, config.accuracy)?;
            p = 1.0 - out.cdf;
            if !out.fault.is_ok() {
                debug!(index = i, q = qi, fault = out.fault.code(), "davies: inversion fault");
                converged[i] = false;
                p = liu[i];
            }
        }
        if p > 1.0 || p <= 0.0 {
            debug!(index = i, q = qi, p, liu = liu[i], "davies: p-value out of range");
            converged[i] = false;
            p = liu[i];
        }
        p_values[i] = p;
    }

    let (log_pvalue, message) = match p_values.get(0) {
        Some(&p0) if p0 == 0.0 => {
            let log_p = liu_log_pvalue_lambda(q[0], w)?;
            (Some(log_p), extreme_tail_message(q[0], w)?)
        }
        _ => (None, None),
    };

    Ok(PValueBatch {
        p_values,
        liu_pvalues: liu,
        converged,
        log_pvalue,
        message,
    })
}

/// `Pvalue < T` for the smallest listed `T` the normalised statistic clears.
fn extreme_tail_message(q: f64, weights: &[f64]) -> Result<Option<String>, KernelError> {
    let params = mixture_moment_params(weights, None, None, MomentMatching::KURTOSIS)?;
    let q_norm = params.normalise(q);
    let nc = params.noncentrality.max(0.0);
    let idx = EXTREME_TAIL_THRESHOLDS
        .iter()
        .rposition(|&t| noncentral_chi_square_isf_scalar(t, params.dof, nc) < q_norm);
    Ok(idx.map(|i| format!("Pvalue < {}", c_exponent(EXTREME_TAIL_THRESHOLDS[i]))))
}

/// Formats like C's `%e`: six decimals, signed exponent of at least two digits.
fn c_exponent(v: f64) -> String {
    let s = format!("{:.6e}", v);
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exp),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::scientific::mixture::inversion::{QfFault, QfOutcome, QfTrace};
    use crate::kernels::scientific::mixture::ChiSquaredComponent;

    struct Faulting;

    impl ChiSquaredCdf for Faulting {
        fn cdf(
            &self,
            _c: f64,
            _components: &[ChiSquaredComponent],
            _sigma: f64,
            _lim: usize,
            _acc: f64,
        ) -> Result<QfOutcome, KernelError> {
            Ok(QfOutcome {
                cdf: 0.25,
                fault: QfFault::RoundOff,
                trace: QfTrace::default(),
            })
        }
    }

    #[test]
    fn c_style_exponents() {
        assert_eq!(c_exponent(1e-100), "1.000000e-100");
        assert_eq!(c_exponent(0.05), "5.000000e-02");
        assert_eq!(c_exponent(1e-10), "1.000000e-10");
        assert_eq!(c_exponent(250.0), "2.500000e+02");
    }

    #[test]
    fn central_mixture_matches_inversion() {
        let r = davies_pvalue(2.0, KernelInput::Eigenvalues(&[0.5, 0.4, 0.1])).unwrap();
        assert!(r.converged);
        assert!((r.p_value - 0.1229586049742385).abs() < 1e-8, "{r:?}");
        assert!(r.message.is_none() && r.log_pvalue.is_none());
        assert!((r.liu_pvalue - 0.12355245809711383).abs() < 1e-10);
    }

    #[test]
    fn matrix_and_eigenvalue_inputs_agree() {
        let k = [0.4, 0.0, 0.0, 0.0, 0.1, 0.0, 0.0, 0.0, 0.5];
        let a = davies_pvalues(&[0.5, 2.0, 8.0], KernelInput::Matrix { data: &k, n: 3 }).unwrap();
        let b = davies_pvalues(&[0.5, 2.0, 8.0], KernelInput::Eigenvalues(&[0.1, 0.4, 0.5]))
            .unwrap();
        for i in 0..3 {
            assert!((a.p_values[i] - b.p_values[i]).abs() < 1e-12);
        }
        assert_eq!(a.converged, vec![true; 3]);
    }

    #[test]
    fn single_weight_uses_liu() {
        let r = davies_pvalue(3.0, KernelInput::Eigenvalues(&[2.0])).unwrap();
        let liu = liu_pvalue_lambda(&[3.0], &[2.0]).unwrap();
        assert_eq!(r.p_value, liu[0]);
        assert_eq!(r.liu_pvalue, liu[0]);
        assert!(r.converged);
    }

    #[test]
    fn faults_substitute_liu() {
        let ws = WeightSet::from_eigenvalues(&[0.5, 0.4, 0.1], 1e5).unwrap();
        let b = davies_pvalues_lambda_with(&[2.0, 3.0], &ws, &DaviesConfig::default(), &Faulting)
            .unwrap();
        assert_eq!(b.converged, vec![false, false]);
        assert_eq!(b.p_values, b.liu_pvalues);
    }

    #[test]
    fn extreme_tail_reports_threshold_and_log() {
        let r = davies_pvalue(5000.0, KernelInput::Eigenvalues(&[1.0, 0.5])).unwrap();
        assert_eq!(r.p_value, 0.0);
        assert!(!r.converged);
        assert_eq!(r.message.as_deref(), Some("Pvalue < 1.000000e-100"));
        let log_p = r.log_pvalue.unwrap();
        assert!(log_p.is_finite() && log_p < -230.0);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let q = [0.3, 1.7, 4.2, 9.9];
        let w = [0.9, 0.6, 0.3, 0.05];
        let a = davies_pvalues(&q, KernelInput::Eigenvalues(&w)).unwrap();
        let b = davies_pvalues(&q, KernelInput::Eigenvalues(&w)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fatal_inputs() {
        assert!(matches!(
            davies_pvalue(f64::NAN, KernelInput::Eigenvalues(&[1.0, 2.0])),
            Err(KernelError::NonFiniteInput(_))
        ));
        assert!(matches!(
            davies_pvalue(1.0, KernelInput::Eigenvalues(&[-1.0, 0.0])),
            Err(KernelError::NoPositiveEigenvalue(_))
        ));
        assert!(matches!(
            davies_pvalue(1.0, KernelInput::Matrix { data: &[1.0, 0.0, 0.0], n: 2 }),
            Err(KernelError::InvalidArguments(_))
        ));
    }
}
