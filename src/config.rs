// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under Mozilla Public License (MPL) 2.0.

//! # **Configuration Constants** - *Runtime Behaviour Parameters*
//!
//! Named tolerances, iteration caps and thresholds used by the mixture kernels,
//! plus the per-call configuration structs that carry them. The constants are the
//! published SKAT / SKAT-O defaults; the structs let a call site override any of
//! them without touching global state.

/// Iteration cap handed to the characteristic-function inversion.
pub const DAVIES_LIMIT: usize = 10_000;

/// Absolute accuracy requested from the inversion by the Davies estimator.
pub const DAVIES_ACCURACY: f64 = 1e-6;

/// Absolute accuracy requested from the inversion inside the optimal-test integrand.
pub const OPTIMAL_DAVIES_ACCURACY: f64 = 1e-5;

/// Eigenvalues at or below `mean(nonnegative eigenvalues) / EIGEN_RELATIVE_DIVISOR`
/// are dropped by the spectral filter.
pub const EIGEN_RELATIVE_DIVISOR: f64 = 100_000.0;

/// Total QR sweeps allowed per matrix row by the symmetric eigen-solver.
pub const EIGEN_ITERATIONS_PER_ROW: usize = 30;

/// Starting point of the halving search for the integration upper bound.
pub const BRACKET_START: f64 = 80.0;

/// Maximum number of halvings in the upper bound search.
pub const BRACKET_MAX_ITERATIONS: usize = 1000;

/// The integrand must exceed this value at the located upper bound.
pub const BRACKET_MIN_DENSITY: f64 = 1e-14;

/// Subdivision limit for the primary (Davies) quadrature.
pub const QUAD_LIMIT: usize = 1000;

/// Absolute error target for adaptive quadrature.
pub const QUAD_EPSABS: f64 = 1e-12;

/// Relative error target for adaptive quadrature.
pub const QUAD_EPSREL: f64 = 1.49e-8;

/// Error estimate above which the Davies integration is discarded for the Liu path.
pub const QUAD_MAX_ERROR: f64 = 1e-6;

/// Fixed upper limit of the Liu fallback integration.
pub const LIU_QUAD_UPPER: f64 = 40.0;

/// Subdivision limit for the Liu fallback integration.
pub const LIU_QUAD_LIMIT: usize = 2000;

/// Above `Σw · LAMBDA_CUTOFF_FACTOR` the mixture CDF is taken as exactly one.
pub const LAMBDA_CUTOFF_FACTOR: f64 = 1e4;

/// Noncentrality floor used by the Liu survival function.
pub const NONCENTRALITY_FLOOR: f64 = 1e-9;

/// Descending thresholds reported by the extreme-tail message, `Pvalue < T`.
pub const EXTREME_TAIL_THRESHOLDS: [f64; 11] = [
    0.05, 1e-10, 1e-20, 1e-30, 1e-40, 1e-50, 1e-60, 1e-70, 1e-80, 1e-90, 1e-100,
];

/// Moment-matching conventions.
///
/// The two published methods only disagree in the degenerate regime
/// `s1² ≤ s2`, and on whether the weights are rescaled to sum to one first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MomentMatching {
    /// `l = 1/s2` (kurtosis matching) instead of `l = 1/s1²` in the degenerate regime.
    pub use_kurtosis_matching: bool,
    /// Divide the weights by their sum before matching, and scale `mu_q`/`sigma_q` back.
    pub normalize_weights: bool,
}

impl MomentMatching {
    /// Original Liu et al. (2009) convention, raw weights.
    pub const LIU: MomentMatching = MomentMatching {
        use_kurtosis_matching: false,
        normalize_weights: false,
    };

    /// SKAT's modified convention (kurtosis matching), raw weights.
    pub const KURTOSIS: MomentMatching = MomentMatching {
        use_kurtosis_matching: true,
        normalize_weights: false,
    };

    /// Same matching convention with weights normalised to sum to one.
    pub fn normalized(self) -> Self {
        MomentMatching {
            normalize_weights: true,
            ..self
        }
    }
}

/// Parameters of the Davies estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DaviesConfig {
    /// Iteration cap for the inversion.
    pub limit: usize,
    /// Absolute accuracy of the inversion.
    pub accuracy: f64,
    /// Relative eigenvalue cut-off divisor of the spectral filter.
    pub eigen_divisor: f64,
}

impl Default for DaviesConfig {
    fn default() -> Self {
        DaviesConfig {
            limit: DAVIES_LIMIT,
            accuracy: DAVIES_ACCURACY,
            eigen_divisor: EIGEN_RELATIVE_DIVISOR,
        }
    }
}

/// Parameters of the optimal-test integrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimalConfig {
    pub davies_limit: usize,
    pub davies_accuracy: f64,
    pub bracket_start: f64,
    pub bracket_max_iterations: usize,
    pub bracket_min_density: f64,
    pub quad_limit: usize,
    pub quad_epsabs: f64,
    pub quad_epsrel: f64,
    /// Error estimate above which the Liu path is used instead.
    pub max_quad_error: f64,
    pub liu_upper: f64,
    pub liu_limit: usize,
    pub lambda_cutoff_factor: f64,
}

impl Default for OptimalConfig {
    fn default() -> Self {
        OptimalConfig {
            davies_limit: DAVIES_LIMIT,
            davies_accuracy: OPTIMAL_DAVIES_ACCURACY,
            bracket_start: BRACKET_START,
            bracket_max_iterations: BRACKET_MAX_ITERATIONS,
            bracket_min_density: BRACKET_MIN_DENSITY,
            quad_limit: QUAD_LIMIT,
            quad_epsabs: QUAD_EPSABS,
            quad_epsrel: QUAD_EPSREL,
            max_quad_error: QUAD_MAX_ERROR,
            liu_upper: LIU_QUAD_UPPER,
            liu_limit: LIU_QUAD_LIMIT,
            lambda_cutoff_factor: LAMBDA_CUTOFF_FACTOR,
        }
    }
}
