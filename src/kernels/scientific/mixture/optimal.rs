// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under Mozilla Public License (MPL) 2.0.

//! # **Optimal-Test Integrator** - *SKAT-O p-values*
//!
//! The SKAT-O statistic takes the smallest p-value over a grid of correlation
//! weights `ρ`. Its null distribution reduces to a one dimensional integral
//! over a `χ²₁` variable `x` (Lee, Wu & Lin 2012):
//!
//! ```text
//! p = 1 − ∫₀^U F_mix(m(x)) · χ²₁pdf(x) dx
//! m(x) = min_ρ (q_ρ − τ_ρ·x) / (1 − ρ)          (ρ = 1 contributes +∞)
//! ```
//!
//! `F_mix` is the Davies CDF of the mixture weights evaluated at `m` rescaled
//! by the share of variance the weights carry.
//!
//! ## Procedure
//! 1. Halve `u` from `80` until the integrand exceeds `1e-14`; `U = 2u`.
//! 2. Integrate with adaptive Gauss–Kronrod, `limit 1000`, `epsabs 1e-12`.
//! 3. If the inversion faults, no bound is found, or the error estimate exceeds
//!    `1e-6`, integrate the Liu surrogate `F_χ²(df)` over `[0, 40]` instead.
//! 4. Clamp to `p_min_floor × grid size` when a floor is given.
//!
//! Both integrals are taken in `t = √x`, which removes the `x^{-1/2}`
//! singularity of the `χ²₁` density at the origin.

use tracing::debug;

use crate::config::OptimalConfig;
use crate::errors::KernelError;
use crate::kernels::scientific::distributions::univariate::chi_squared::{
    chi_square_cdf_scalar, chi_square_pdf1,
};
use crate::kernels::scientific::mixture::inversion::{ChiSquaredCdf, DaviesInversion};
use crate::kernels::scientific::mixture::{ChiSquaredComponent, OptimalTestContext};
use crate::kernels::scientific::quadrature::{GaussKronrod21, Quadrature, QuadratureEstimate};

/// SKAT-O p-value with the default configuration and collaborators.
///
/// # Errors
/// Invalid contexts only. Inversion faults and integration failures are
/// recovered through the Liu path.
pub fn optimal_davies_pvalue(ctx: &OptimalTestContext) -> Result<f64, KernelError> {
    let config = OptimalConfig::default();
    let quad = GaussKronrod21::new(config.quad_epsabs, config.quad_epsrel);
    optimal_davies_pvalue_with(ctx, &config, &DaviesInversion, &quad)
}

/// SKAT-O p-value with explicit configuration, inversion and quadrature.
pub fn optimal_davies_pvalue_with<C, Q>(
    ctx: &OptimalTestContext,
    config: &OptimalConfig,
    inversion: &C,
    quadrature: &Q,
) -> Result<f64, KernelError>
where
    C: ChiSquaredCdf,
    Q: Quadrature,
{
    ctx.validate()?;
    let integrand = DaviesIntegrand::new(ctx, config, inversion);

    let p = match davies_path(&integrand, config, quadrature) {
        Ok(est) if est.abs_error <= config.max_quad_error => 1.0 - est.value,
        Ok(est) => {
            debug!(
                abs_error = est.abs_error,
                intervals = est.intervals,
                "optimal: quadrature error above tolerance, using liu integration"
            );
            liu_path(ctx, config, quadrature)?
        }
        Err(e @ (KernelError::NonConvergence(_) | KernelError::UpperBoundNotFound(_))) => {
            debug!(error = %e, "optimal: davies integration failed, using liu integration");
            liu_path(ctx, config, quadrature)?
        }
        Err(e) => return Err(e),
    };

    Ok(clamp_to_floor(p, ctx))
}

#[inline]
fn clamp_to_floor(p: f64, ctx: &OptimalTestContext) -> f64 {
    match ctx.p_min_floor {
        Some(floor) if floor * (ctx.grid_len() as f64) < p.abs() => floor * ctx.grid_len() as f64,
        _ => p,
    }
}

/// `min_ρ (q_ρ − τ_ρ·x) / (1 − ρ)`, skipping `ρ = 1`.
#[inline]
fn grid_minimum(ctx: &OptimalTestContext, x: f64) -> f64 {
    ctx.q_min
        .iter()
        .zip(&ctx.tau)
        .zip(&ctx.rho_grid)
        .map(|((&q, &tau), &rho)| {
            if rho == 1.0 {
                f64::INFINITY
            } else {
                (q - tau * x) / (1.0 - rho)
            }
        })
        .fold(f64::INFINITY, f64::min)
}

struct DaviesIntegrand<'a, C> {
    ctx: &'a OptimalTestContext,
    inversion: &'a C,
    components: Vec<ChiSquaredComponent>,
    cutoff: f64,
    scale: f64,
    limit: usize,
    accuracy: f64,
}

impl<'a, C: ChiSquaredCdf> DaviesIntegrand<'a, C> {
    fn new(ctx: &'a OptimalTestContext, config: &OptimalConfig, inversion: &'a C) -> Self {
        DaviesIntegrand {
            ctx,
            inversion,
            components: ctx
                .weights
                .iter()
                .map(|&w| ChiSquaredComponent::central(w))
                .collect(),
            cutoff: ctx.weights.iter().sum::<f64>() * config.lambda_cutoff_factor,
            scale: (ctx.var - ctx.remaining_variance).sqrt() / ctx.var.sqrt(),
            limit: config.davies_limit,
            accuracy: config.davies_accuracy,
        }
    }

    /// `(1 − temp)·χ²₁pdf(x)` with `temp = 1 − F_mix(m(x))`.
    fn eval(&self, x: f64) -> Result<f64, KernelError> {
        let m = grid_minimum(self.ctx, x);
        let temp = if m > self.cutoff {
            0.0
        } else {
            let st = (m - self.ctx.mu) * self.scale + self.ctx.mu;
            let out = self
                .inversion
                .cdf(st, &self.components, 0.0, self.limit, self.accuracy)?;
            if !out.fault.is_ok() {
                return Err(KernelError::NonConvergence(format!(
                    "optimal: inversion fault {} at x = {}",
                    out.fault.code(),
                    x
                )));
            }
            1.0 - out.cdf
        };
        if temp >= 1.0 {
            Ok(0.0)
        } else {
            Ok((1.0 - temp) * chi_square_pdf1(x))
        }
    }
}

/// Halving search for the upper integration limit.
fn find_upper_bound<C: ChiSquaredCdf>(
    integrand: &DaviesIntegrand<'_, C>,
    config: &OptimalConfig,
) -> Result<f64, KernelError> {
    let mut u = config.bracket_start;
    for _ in 0..config.bracket_max_iterations {
        u /= 2.0;
        if integrand.eval(u)? > config.bracket_min_density {
            debug!(upper = 2.0 * u, "optimal: integration bound located");
            return Ok(2.0 * u);
        }
    }
    Err(KernelError::UpperBoundNotFound(format!(
        "optimal: integrand below {:e} after {} halvings from {}",
        config.bracket_min_density, config.bracket_max_iterations, config.bracket_start
    )))
}

fn davies_path<C, Q>(
    integrand: &DaviesIntegrand<'_, C>,
    config: &OptimalConfig,
    quadrature: &Q,
) -> Result<QuadratureEstimate, KernelError>
where
    C: ChiSquaredCdf,
    Q: Quadrature,
{
    let upper = find_upper_bound(integrand, config)?;
    quadrature.integrate(
        |t| Ok(2.0 * t * integrand.eval(t * t)?),
        0.0,
        upper.sqrt(),
        config.quad_limit,
    )
}

/// `1 − ∫₀^40 F_χ²(df)((m(x) − μ)/√var·√(2df) + df)·χ²₁pdf(x) dx`.
fn liu_path<Q: Quadrature>(
    ctx: &OptimalTestContext,
    config: &OptimalConfig,
    quadrature: &Q,
) -> Result<f64, KernelError> {
    let df = ctx.df;
    let shift = (2.0 * df).sqrt() / ctx.var.sqrt();
    let integrand = |x: f64| {
        let q = (grid_minimum(ctx, x) - ctx.mu) * shift + df;
        chi_square_cdf_scalar(q, df) * chi_square_pdf1(x)
    };
    let est = quadrature.integrate(
        |t| Ok(2.0 * t * integrand(t * t)),
        0.0,
        config.liu_upper.sqrt(),
        config.liu_limit,
    )?;
    debug!(
        value = est.value,
        abs_error = est.abs_error,
        "optimal: liu integration finished"
    );
    Ok(1.0 - est.value)
}
