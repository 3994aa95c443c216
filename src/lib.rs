// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under Mozilla Public License (MPL) 2.0.

//! # **chi2mix-kernels** - *Tail Probabilities of Chi-Squared Mixtures*
//!
//! Kernels for `Pr(Q > q)` where `Q = Σ λᵢ·χ²(hᵢ, δᵢ)`, the null distribution of
//! quadratic-form score statistics such as SKAT and SKAT-O.
//!
//! - **Davies estimator**: characteristic-function inversion, with a moment-matching
//!   substitute when the inversion faults.
//! - **Liu moment matching**: skewness or kurtosis matched noncentral chi-squared surrogate.
//! - **Optimal-test integrator**: the SKAT-O p-value as a one dimensional integral over
//!   the correlation grid.
//!
//! Vector kernels take `&[f64]` plus an optional Arrow-style validity mask
//! (`&[bool]`, `true` = valid) and return `ndarray::Array1<f64>`, with null
//! lanes written as NaN.

pub mod kernels {
    pub mod scientific {
        #[cfg(feature = "probability_distributions")]
        pub mod distributions;
        pub mod eigen;
        #[cfg(feature = "probability_distributions")]
        pub mod mixture;
        pub mod quadrature;
    }
}

pub mod config;

pub mod errors;

pub mod utils;

#[cfg(feature = "probability_distributions")]
pub use kernels::scientific::mixture::{
    davies::{
        davies_pvalue, davies_pvalues, davies_pvalues_lambda, davies_pvalues_with, KernelInput,
    },
    moments::{
        liu_log_pvalue_lambda, liu_pvalue_lambda, liu_survival, mixture_moment_params,
        mod_liu_pvalue, mod_liu_pvalue_from_cumulants,
    },
    optimal::{optimal_davies_pvalue, optimal_davies_pvalue_with},
    ChiSquaredComponent, Cumulants, LiuSurvival, ModLiuPValue, MomentParams,
    OptimalTestContext, PValueBatch, PValueResult, WeightSet,
};

pub use config::{DaviesConfig, MomentMatching, OptimalConfig};
pub use errors::KernelError;
