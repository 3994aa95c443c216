// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under Mozilla Public License (MPL) 2.0.

//! # **Characteristic-Function Inversion** - *Davies' Algorithm*
//!
//! Distribution function of `Q = Σ λⱼ·χ²(nⱼ, δⱼ) + σ·X`, `X ~ N(0, 1)`, by
//! numerical inversion of the characteristic function (Davies 1980, algorithm
//! AS 155).
//!
//! The integration interval and truncation point are chosen so the total of
//! the truncation and integration errors stays below the requested absolute
//! accuracy. When the algorithm cannot guarantee that, it says so through a
//! [`QfFault`] instead of failing; callers decide whether to trust the value.
//!
//! ## Fault Codes
//! | code | meaning |
//! |---|---|
//! | 0 | ok |
//! | 1 | required accuracy not obtained |
//! | 2 | round-off error possibly significant |
//! | 3 | invalid parameters |
//! | 4 | integration parameters not located within the iteration limit |

use std::f64::consts::PI;

use tracing::trace;

use crate::errors::KernelError;
use crate::kernels::scientific::mixture::ChiSquaredComponent;

const LOG28: f64 = 0.0866;
const FINDU_DIVISORS: [f64; 4] = [2.0, 1.4, 1.2, 1.1];
const ROUNDOFF_SCALES: [f64; 4] = [1.0, 2.0, 4.0, 8.0];

/// Inversion fault status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QfFault {
    None,
    AccuracyNotAchieved,
    RoundOff,
    InvalidParameters,
    IterationLimit,
}

impl QfFault {
    /// Numeric fault code, `0` when the inversion succeeded.
    pub fn code(self) -> u8 {
        match self {
            QfFault::None => 0,
            QfFault::AccuracyNotAchieved => 1,
            QfFault::RoundOff => 2,
            QfFault::InvalidParameters => 3,
            QfFault::IterationLimit => 4,
        }
    }

    #[inline]
    pub fn is_ok(self) -> bool {
        self == QfFault::None
    }
}

/// Diagnostics of one inversion.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct QfTrace {
    /// Absolute value sum of the integrated terms.
    pub abs_error_sum: f64,
    /// Total number of integration terms.
    pub terms: usize,
    /// Number of integrations performed.
    pub integrations: usize,
    /// Integration interval of the main integration.
    pub interval: f64,
    /// Truncation point of the main integration.
    pub truncation_point: f64,
    /// Standard deviation of the convergence factor term.
    pub convergence_sd: f64,
    /// Number of cycles through the error bound routines.
    pub cycles: usize,
}

/// Result of one inversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QfOutcome {
    /// `Pr(Q < c)`, or `-1` when no estimate could be produced.
    pub cdf: f64,
    pub fault: QfFault,
    pub trace: QfTrace,
}

/// Distribution function of a chi-squared mixture.
pub trait ChiSquaredCdf {
    /// Evaluates `Pr(Σ λⱼ·χ²(nⱼ, δⱼ) + σ·X < c)`.
    ///
    /// `lim` bounds the number of integration terms, `acc` is the requested
    /// absolute accuracy.
    fn cdf(
        &self,
        c: f64,
        components: &[ChiSquaredComponent],
        sigma: f64,
        lim: usize,
        acc: f64,
    ) -> Result<QfOutcome, KernelError>;
}

/// Davies' characteristic-function inversion.
#[derive(Debug, Clone, Copy, Default)]
pub struct DaviesInversion;

impl ChiSquaredCdf for DaviesInversion {
    fn cdf(
        &self,
        c: f64,
        components: &[ChiSquaredComponent],
        sigma: f64,
        lim: usize,
        acc: f64,
    ) -> Result<QfOutcome, KernelError> {
        if !c.is_finite() || !sigma.is_finite() {
            return Err(KernelError::NonFiniteInput(format!(
                "davies_inversion: c = {}, sigma = {}",
                c, sigma
            )));
        }
        if acc.is_nan() || acc <= 0.0 || acc.is_infinite() {
            return Err(KernelError::InvalidArguments(format!(
                "davies_inversion: accuracy must be positive, got {}",
                acc
            )));
        }
        if components
            .iter()
            .any(|t| !t.weight.is_finite() || !t.noncentrality.is_finite() || !t.dof.is_finite())
        {
            return Err(KernelError::NonFiniteInput(
                "davies_inversion: component parameters must be finite".into(),
            ));
        }

        let mut trace = QfTrace::default();
        let mut state = Inversion::new(components, c, sigma, lim);
        let (cdf, fault) = match state.run(acc, &mut trace) {
            Ok(result) => result,
            Err(LimitExceeded) => (-1.0, QfFault::IterationLimit),
        };
        trace.cycles = state.count;
        trace!(
            c,
            cdf,
            fault = fault.code(),
            cycles = trace.cycles,
            terms = trace.terms,
            "davies inversion"
        );
        Ok(QfOutcome { cdf, fault, trace })
    }
}

/// The iteration budget was spent before the integration parameters were found.
#[derive(Debug)]
struct LimitExceeded;

#[inline(always)]
fn exp1(x: f64) -> f64 {
    if x < -50.0 {
        0.0
    } else {
        x.exp()
    }
}

/// `ln(1 + x)` when `first`, else `ln(1 + x) - x`, accurate for small `x`.
fn log1(x: f64, first: bool) -> f64 {
    if x.abs() > 0.1 {
        return if first { x.ln_1p() } else { x.ln_1p() - x };
    }
    let mut y = x / (2.0 + x);
    let mut term = 2.0 * y * y * y;
    let mut k = 3.0;
    let mut s = if first { 2.0 } else { -x } * y;
    y *= y;
    let mut s1 = s + term / k;
    while s1 != s {
        k += 2.0;
        term *= y;
        s = s1;
        s1 = s + term / k;
    }
    s
}

struct Inversion<'a> {
    terms: &'a [ChiSquaredComponent],
    c: f64,
    sigma: f64,
    lim: usize,
    count: usize,
    sigsq: f64,
    lmax: f64,
    lmin: f64,
    mean: f64,
    intl: f64,
    ersm: f64,
    fail: bool,
    /// Term indices by descending `|λ|`, built on first use.
    by_magnitude: Option<Vec<usize>>,
}

impl<'a> Inversion<'a> {
    fn new(terms: &'a [ChiSquaredComponent], c: f64, sigma: f64, lim: usize) -> Self {
        Inversion {
            terms,
            c,
            sigma,
            lim,
            count: 0,
            sigsq: 0.0,
            lmax: 0.0,
            lmin: 0.0,
            mean: 0.0,
            intl: 0.0,
            ersm: 0.0,
            fail: false,
            by_magnitude: None,
        }
    }

    #[inline]
    fn counter(&mut self) -> Result<(), LimitExceeded> {
        self.count += 1;
        if self.count > self.lim {
            Err(LimitExceeded)
        } else {
            Ok(())
        }
    }

    /// Bound on the tail probability `Pr(Q > c2)` together with `c2`.
    fn errbd(&mut self, u: f64) -> Result<(f64, f64), LimitExceeded> {
        self.counter()?;
        let mut xconst = u * self.sigsq;
        let mut sum1 = u * xconst;
        let u = 2.0 * u;
        for t in self.terms.iter().rev() {
            let (nj, lj, ncj) = (t.dof, t.weight, t.noncentrality);
            let x = u * lj;
            let y = 1.0 - x;
            xconst += lj * (ncj / y + nj) / y;
            sum1 += ncj * (x / y) * (x / y) + nj * (x * x / y + log1(-x, false));
        }
        Ok((exp1(-0.5 * sum1), xconst))
    }

    /// Finds a cut-off `c2` whose tail probability is below `accx`, updating `upn`.
    fn ctff(&mut self, accx: f64, upn: &mut f64) -> Result<f64, LimitExceeded> {
        let mut u2 = *upn;
        let mut u1 = 0.0;
        let mut c1 = self.mean;
        let rb = 2.0 * if u2 > 0.0 { self.lmax } else { self.lmin };

        let (mut e, mut c2) = self.errbd(u2 / (1.0 + u2 * rb))?;
        while e > accx {
            u1 = u2;
            c1 = c2;
            u2 *= 2.0;
            (e, c2) = self.errbd(u2 / (1.0 + u2 * rb))?;
        }

        let mut ratio = (c1 - self.mean) / (c2 - self.mean);
        while ratio < 0.9 {
            let u = 0.5 * (u1 + u2);
            let (e, xconst) = self.errbd(u / (1.0 + u * rb))?;
            if e > accx {
                u1 = u;
                c1 = xconst;
            } else {
                u2 = u;
                c2 = xconst;
            }
            ratio = (c1 - self.mean) / (c2 - self.mean);
        }
        *upn = u2;
        Ok(c2)
    }

    /// Bound on the truncation error of integrating up to `u`.
    fn truncation(&mut self, u: f64, tausq: f64) -> Result<f64, LimitExceeded> {
        self.counter()?;
        let mut sum1 = 0.0;
        let mut prod2 = 0.0;
        let mut prod3 = 0.0;
        let mut s = 0.0;
        let sum2 = (self.sigsq + tausq) * u * u;
        let mut prod1 = 2.0 * sum2;
        let u = 2.0 * u;

        for t in self.terms {
            let (lj, ncj, nj) = (t.weight, t.noncentrality, t.dof);
            let x = (u * lj) * (u * lj);
            sum1 += ncj * x / (1.0 + x);
            if x > 1.0 {
                prod2 += nj * x.ln();
                prod3 += nj * log1(x, true);
                s += nj;
            } else {
                prod1 += nj * log1(x, true);
            }
        }
        sum1 *= 0.5;
        prod2 += prod1;
        prod3 += prod1;

        let x = exp1(-sum1 - 0.25 * prod2) / PI;
        let y = exp1(-sum1 - 0.25 * prod3) / PI;
        let mut err1 = if s == 0.0 { 1.0 } else { x * 2.0 / s };
        let err2 = if prod3 > 1.0 { 2.5 * y } else { 1.0 };
        if err2 < err1 {
            err1 = err2;
        }
        let x = 0.5 * sum2;
        let err2 = if x <= y { 1.0 } else { y / x };
        Ok(if err1 < err2 { err1 } else { err2 })
    }

    /// Smallest truncation point `u` with truncation error below `accx`, starting from `utx`.
    fn findu(&mut self, utx: f64, accx: f64) -> Result<f64, LimitExceeded> {
        let mut ut = utx;
        let mut u = ut / 4.0;
        if self.truncation(u, 0.0)? > accx {
            u = ut;
            while self.truncation(u, 0.0)? > accx {
                ut *= 4.0;
                u = ut;
            }
        } else {
            ut = u;
            u /= 4.0;
            while self.truncation(u, 0.0)? <= accx {
                ut = u;
                u /= 4.0;
            }
        }
        for d in FINDU_DIVISORS {
            let u = ut / d;
            if self.truncation(u, 0.0)? <= accx {
                ut = u;
            }
        }
        Ok(ut)
    }

    /// Adds `nterm + 1` terms of the inversion integral at spacing `interv`.
    fn integrate(&mut self, nterm: usize, interv: f64, tausq: f64, mainx: bool) {
        let inpi = interv / PI;
        for k in (0..=nterm).rev() {
            let u = (k as f64 + 0.5) * interv;
            let mut sum1 = -2.0 * u * self.c;
            let mut sum2 = sum1.abs();
            let mut sum3 = -0.5 * self.sigsq * u * u;
            for t in self.terms.iter().rev() {
                let nj = t.dof;
                let x = 2.0 * t.weight * u;
                let y = x * x;
                sum3 -= 0.25 * nj * log1(y, true);
                let y = t.noncentrality * x / (1.0 + y);
                let z = nj * x.atan() + y;
                sum1 += z;
                sum2 += z.abs();
                sum3 -= 0.5 * x * y;
            }
            let mut x = inpi * exp1(sum3) / u;
            if !mainx {
                x *= 1.0 - exp1(-0.5 * tausq * u * u);
            }
            self.intl += (0.5 * sum1).sin() * x;
            self.ersm += 0.5 * sum2 * x;
        }
    }

    /// Coefficient of `tausq` in the error when the convergence factor `exp(-tausq·u²/2)` is used at `x`.
    fn cfe(&mut self, x: f64) -> Result<f64, LimitExceeded> {
        self.counter()?;
        let terms = self.terms;
        let order = self.by_magnitude.get_or_insert_with(|| {
            let mut idx: Vec<usize> = (0..terms.len()).collect();
            idx.sort_by(|&a, &b| terms[b].weight.abs().total_cmp(&terms[a].weight.abs()));
            idx
        });

        let mut axl = x.abs();
        let sxl = if x > 0.0 { 1.0 } else { -1.0 };
        let mut sum1 = 0.0;
        for j in (0..order.len()).rev() {
            let t = &terms[order[j]];
            if t.weight * sxl > 0.0 {
                let lj = t.weight.abs();
                let axl1 = axl - lj * (t.dof + t.noncentrality);
                let axl2 = lj / LOG28;
                if axl1 > axl2 {
                    axl = axl1;
                } else {
                    if axl > axl2 {
                        axl = axl2;
                    }
                    sum1 = (axl - axl1) / lj;
                    for &k in order[..j].iter() {
                        sum1 += terms[k].dof + terms[k].noncentrality;
                    }
                    break;
                }
            }
        }
        if sum1 > 100.0 {
            self.fail = true;
            return Ok(1.0);
        }
        Ok(2f64.powf(sum1 / 4.0) / (PI * axl * axl))
    }

    fn run(&mut self, acc: f64, trace: &mut QfTrace) -> Result<(f64, QfFault), LimitExceeded> {
        let c = self.c;
        let mut acc1 = acc;
        let mut xlim = self.lim as f64;
        self.sigsq = self.sigma * self.sigma;
        let mut sd = self.sigsq;

        for t in self.terms {
            let (nj, lj, ncj) = (t.dof, t.weight, t.noncentrality);
            if nj < 0.0 || nj.fract() != 0.0 || ncj < 0.0 {
                return Ok((-1.0, QfFault::InvalidParameters));
            }
            sd += lj * lj * (2.0 * nj + 4.0 * ncj);
            self.mean += lj * (nj + ncj);
            if self.lmax < lj {
                self.lmax = lj;
            } else if self.lmin > lj {
                self.lmin = lj;
            }
        }

        if sd == 0.0 {
            return Ok((if c > 0.0 { 1.0 } else { 0.0 }, QfFault::None));
        }
        if self.lmin == 0.0 && self.lmax == 0.0 && self.sigma == 0.0 {
            return Ok((-1.0, QfFault::InvalidParameters));
        }
        let sd = sd.sqrt();
        let almx = if self.lmax < -self.lmin {
            -self.lmin
        } else {
            self.lmax
        };

        // starting values for findu, ctff
        let mut utx = 16.0 / sd;
        let mut up = 4.5 / sd;
        let mut un = -up;
        utx = self.findu(utx, 0.5 * acc1)?;

        // convergence factor when c is not near the mean and one weight dominates
        if c != 0.0 && almx > 0.07 * sd {
            let tausq = 0.25 * acc1 / self.cfe(c)?;
            if self.fail {
                self.fail = false;
            } else if self.truncation(utx, tausq)? < 0.2 * acc1 {
                self.sigsq += tausq;
                utx = self.findu(utx, 0.25 * acc1)?;
                trace.convergence_sd = tausq.sqrt();
            }
        }
        trace.truncation_point = utx;
        acc1 *= 0.5;

        let (intv, xnt) = loop {
            let d1 = self.ctff(acc1, &mut up)? - c;
            if d1 < 0.0 {
                return Ok((1.0, QfFault::None));
            }
            let d2 = c - self.ctff(acc1, &mut un)?;
            if d2 < 0.0 {
                return Ok((0.0, QfFault::None));
            }
            let intv = 2.0 * PI / d1.max(d2);
            let xnt = utx / intv;
            let xntm = 3.0 / acc1.sqrt();
            if xnt <= xntm * 1.5 {
                break (intv, xnt);
            }

            // auxiliary integration with a convergence factor
            if xntm > xlim {
                return Ok((-1.0, QfFault::AccuracyNotAchieved));
            }
            let ntm = (xntm + 0.5).floor();
            let intv1 = utx / ntm;
            let x = 2.0 * PI / intv1;
            if x <= c.abs() {
                break (intv, xnt);
            }
            let tausq = 0.33 * acc1 / (1.1 * (self.cfe(c - x)? + self.cfe(c + x)?));
            if self.fail {
                break (intv, xnt);
            }
            acc1 *= 0.67;
            self.integrate(ntm as usize, intv1, tausq, false);
            xlim -= xntm;
            self.sigsq += tausq;
            trace.integrations += 1;
            trace.terms += ntm as usize + 1;
            utx = self.findu(utx, 0.25 * acc1)?;
            acc1 *= 0.75;
        };

        trace.interval = intv;
        if xnt > xlim {
            return Ok((-1.0, QfFault::AccuracyNotAchieved));
        }
        let nt = (xnt + 0.5).floor();
        self.integrate(nt as usize, intv, 0.0, true);
        trace.integrations += 1;
        trace.terms += nt as usize + 1;
        let qfval = 0.5 - self.intl;
        trace.abs_error_sum = self.ersm;

        // the error sum must still register an increment of acc/10
        let up = self.ersm;
        let x = up + acc / 10.0;
        let fault = if ROUNDOFF_SCALES.iter().any(|&r| r * x == r * up) {
            QfFault::RoundOff
        } else {
            QfFault::None
        };
        Ok((qfval, fault))
    }
}
