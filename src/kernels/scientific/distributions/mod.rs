// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under Mozilla Public License (MPL) 2.0.

//! # **Probability Distributions Module** - *Chi-Squared Family Kernels*
//!
//! Special functions and vectorised kernels for the central and noncentral
//! chi-squared distributions, the primitives the mixture estimators are built on.
//!
//! ## Numerical Methods
//! - **Series expansions**: convergent series with adaptive truncation for the incomplete gamma
//! - **Continued fractions**: modified Lentz evaluation of the upper incomplete gamma tail
//! - **Poisson mixtures**: noncentral laws summed outward from the Poisson mode
//! - **Log space tails**: survival functions that stay finite far below `f64::MIN_POSITIVE`
//!
//! ### Null Value Philosophy
//! Rather than assume, we choose to recognise inf and NaN as valid float values
//! (consistent with Apache Arrow semantics), leaving it to the user to subsequently
//! treat them as nulls if they wish. Masked lanes come back as NaN with the mask
//! propagated.
//!
//! ## Disclaimer
//! This implementation is provided on a best-effort basis. Reference values in
//! `./tests` are pinned against SciPy; platform specific differences may impact
//! your results at the last few ulps.

/// # **Shared Distribution Utilities**
///
/// ## Modules
/// - **`constants`**: Mathematical constants and precomputed values
/// - **`sampler`**: Seeded random sampling, including chi-squared mixtures
/// - **`scalar`**: Special functions (ln Γ, regularised incomplete gamma)
pub mod shared {
    pub mod constants;
    pub mod sampler;
    pub mod scalar;
}

/// # **Univariate Distributions**
///
/// - **Continuous**: chi-squared, noncentral chi-squared
/// - **Common utilities**: Shared kernel patterns and test helpers
pub mod univariate {
    // common kernel patterns
    pub mod common;

    pub mod chi_squared;
    pub mod noncentral_chi_squared;
}
