// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under Mozilla Public License (MPL) 2.0.

//! # Statistical Sampling Module - Pseudorandom Chi-Squared Mixture Sampling
//!
//! Pseudorandom number generation kernels for the chi-squared family: central and
//! noncentral chi-squared draws, and weighted mixtures `Σ λᵢ·χ²(hᵢ, δᵢ)`.
//! Samplers are generic over the generator so calibration runs can be seeded.

use ndarray::Array1;
use rand::rngs::{StdRng, ThreadRng};
use rand::{rng, Rng, SeedableRng};
use std::f64::consts::PI;

use crate::errors::KernelError;
use crate::utils::{confirm_equal_len, confirm_finite};

/// Largest Poisson mean drawn in one multiplication chain; larger means are split.
const POISSON_CHUNK: f64 = 500.0;

/// Statistical distribution sampler backed by a PRNG.
pub struct Sampler<R: Rng = ThreadRng> {
    rng: R,
}

impl Sampler<ThreadRng> {
    /// Creates a new sampler instance with a thread-local pseudorandom number generator.
    #[inline]
    pub fn new() -> Self {
        Sampler { rng: rng() }
    }
}

impl Default for Sampler<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler<StdRng> {
    /// Reproducible sampler seeded from `seed`.
    #[inline]
    pub fn seeded(seed: u64) -> Self {
        Sampler {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> Sampler<R> {
    /// Wraps an existing generator.
    #[inline]
    pub fn from_rng(rng: R) -> Self {
        Sampler { rng }
    }

    /// Generates a single sample from the standard normal distribution N(0, 1).
    #[inline]
    pub fn sample_standard_normal(&mut self) -> f64 {
        sample_standard_normal(&mut self.rng)
    }

    /// Gamma(shape, scale). Preconditions: shape > 0, scale > 0.
    #[inline]
    pub fn gamma(&mut self, shape: f64, scale: f64) -> f64 {
        sample_gamma(&mut self.rng, shape, scale)
    }

    /// Chi-square(df) == Gamma(df/2, 2). Preconditions: df > 0.
    #[inline]
    pub fn chi2(&mut self, df: f64) -> f64 {
        self.gamma(df * 0.5, 2.0)
    }

    /// Poisson(mean). Preconditions: mean ≥ 0.
    #[inline]
    pub fn poisson(&mut self, mean: f64) -> u64 {
        sample_poisson(&mut self.rng, mean)
    }

    /// Noncentral chi-square χ²(df, nc). Preconditions: df > 0, nc ≥ 0.
    ///
    /// For `df ≥ 1` the draw is `(Z + √nc)² + χ²(df − 1)`; below one degree of
    /// freedom it falls back to the Poisson mixture `χ²(df + 2N)`, `N ~ Poisson(nc/2)`.
    #[inline]
    pub fn noncentral_chi2(&mut self, df: f64, nc: f64) -> f64 {
        if nc == 0.0 {
            return self.chi2(df);
        }
        if df >= 1.0 {
            let z = self.sample_standard_normal() + nc.sqrt();
            let rest = df - 1.0;
            let tail = if rest > 0.0 { self.chi2(rest) } else { 0.0 };
            return z * z + tail;
        }
        let n = self.poisson(0.5 * nc) as f64;
        self.chi2(df + 2.0 * n)
    }

    /// One draw of `Σ λᵢ·χ²(hᵢ, δᵢ)`.
    ///
    /// Terms with a zero weight or zero degrees of freedom and no noncentrality
    /// contribute nothing and are skipped.
    pub fn chi_square_mixture(
        &mut self,
        weights: &[f64],
        dofs: &[f64],
        deltas: &[f64],
    ) -> Result<f64, KernelError> {
        validate_mixture(weights, dofs, deltas)?;
        Ok(self.mixture_unchecked(weights, dofs, deltas))
    }

    /// `n` independent draws of the mixture.
    pub fn chi_square_mixture_vec(
        &mut self,
        n: usize,
        weights: &[f64],
        dofs: &[f64],
        deltas: &[f64],
    ) -> Result<Array1<f64>, KernelError> {
        validate_mixture(weights, dofs, deltas)?;
        Ok(Array1::from_shape_simple_fn(n, || {
            self.mixture_unchecked(weights, dofs, deltas)
        }))
    }

    #[inline]
    fn mixture_unchecked(&mut self, weights: &[f64], dofs: &[f64], deltas: &[f64]) -> f64 {
        let mut acc = 0.0;
        for ((&w, &h), &d) in weights.iter().zip(dofs).zip(deltas) {
            if w == 0.0 || (h == 0.0 && d == 0.0) {
                continue;
            }
            let draw = if h == 0.0 {
                // χ²(0, δ) is a Poisson(δ/2) count of χ²₂ draws
                let n = self.poisson(0.5 * d);
                if n == 0 { 0.0 } else { self.chi2(2.0 * n as f64) }
            } else {
                self.noncentral_chi2(h, d)
            };
            acc += w * draw;
        }
        acc
    }
}

fn validate_mixture(weights: &[f64], dofs: &[f64], deltas: &[f64]) -> Result<(), KernelError> {
    confirm_equal_len("chi_square_mixture: weights vs dofs", weights.len(), dofs.len())?;
    confirm_equal_len("chi_square_mixture: weights vs deltas", weights.len(), deltas.len())?;
    confirm_finite("chi_square_mixture: weights", weights)?;
    confirm_finite("chi_square_mixture: dofs", dofs)?;
    confirm_finite("chi_square_mixture: deltas", deltas)?;
    if dofs.iter().any(|&h| h < 0.0) || deltas.iter().any(|&d| d < 0.0) {
        return Err(KernelError::InvalidArguments(
            "chi_square_mixture: dofs and deltas must be nonnegative".into(),
        ));
    }
    Ok(())
}

// Box–Muller to get one N(0,1)
/// Generates a single sample from the standard normal distribution N(0,1).
#[inline]
pub fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // U1 ∈ (0,1], U2 ∈ [0,1)
    let u1: f64 = rng.random::<f64>().max(f64::MIN_POSITIVE); // avoid log(0)
    let u2: f64 = rng.random::<f64>();
    let r = (-2.0 * u1.ln()).sqrt();
    r * (2.0 * PI * u2).cos()
}

/// Generates a single sample from the Gamma distribution using the Marsaglia–Tsang algorithm.
/// Preconditions: shape > 0, scale > 0.
#[inline]
pub fn sample_gamma<R: Rng + ?Sized>(rng: &mut R, shape: f64, scale: f64) -> f64 {
    debug_assert!(shape.is_finite() && shape > 0.0, "shape must be finite and > 0");
    debug_assert!(scale.is_finite() && scale > 0.0, "scale must be finite and > 0");

    // Handle 0 < shape < 1 by boosting to shape+1, then apply a power-law correction.
    if shape < 1.0 {
        let u: f64 = rng.random::<f64>();
        return sample_gamma(rng, shape + 1.0, scale) * u.powf(1.0 / shape);
    }

    let d = shape - 1.0 / 3.0;
    let c = 1.0 / (9.0 * d).sqrt();

    loop {
        let x = sample_standard_normal(rng);
        let one_plus_cx = 1.0 + c * x;
        if one_plus_cx <= 0.0 {
            continue;
        }
        let v = one_plus_cx * one_plus_cx * one_plus_cx; // (1 + c x)^3
        let u: f64 = rng.random::<f64>();

        // Squeeze step
        if u < 1.0 - 0.0331 * (x * x) * (x * x) {
            return d * v * scale;
        }
        // Log acceptance step
        if u.ln() < 0.5 * x * x + d * (1.0 - v + v.ln()) {
            return d * v * scale;
        }
    }
}

/// Poisson draw by Knuth's multiplication method, splitting large means into
/// independent chunks so `e^{-mean}` never underflows.
#[inline]
pub fn sample_poisson<R: Rng + ?Sized>(rng: &mut R, mean: f64) -> u64 {
    let mut remaining = mean.max(0.0);
    let mut total = 0u64;
    while remaining > 0.0 {
        let m = remaining.min(POISSON_CHUNK);
        remaining -= m;
        let limit = (-m).exp();
        let mut prod: f64 = rng.random::<f64>();
        while prod > limit {
            total += 1;
            prod *= rng.random::<f64>();
        }
    }
    total
}
