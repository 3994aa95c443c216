// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under Mozilla Public License (MPL) 2.0.

/// Dense kernel helper (zero-allocation variant).
///
/// ### Null handling
/// - A mask reaching the dense path means it was supplied with a
/// null_count of `0`, so every lane is evaluated.
/// - Any `NaN` or `inf` values generated in the kernel function
/// are kept verbatim.
#[inline(always)]
pub fn dense_univariate_kernel_f64_std_to<FScalar>(
    x: &[f64],
    output: &mut [f64],
    scalar_body: FScalar,
) where
    FScalar: Fn(f64) -> f64,
{
    for (o, &xi) in output.iter_mut().zip(x) {
        *o = scalar_body(xi);
    }
}

/// Null-aware masked kernel helper (zero-allocation variant).
///
/// Null lanes are written as `NaN`; valid lanes are evaluated.
/// Callers confirm mask capacity beforehand.
#[inline(always)]
pub fn masked_univariate_kernel_f64_std_to<FScalar>(
    x: &[f64],
    mask: &[bool],
    output: &mut [f64],
    scalar_body: FScalar,
) where
    FScalar: Fn(f64) -> f64,
{
    for ((o, &xi), &valid) in output.iter_mut().zip(x).zip(mask) {
        *o = if valid { scalar_body(xi) } else { f64::NAN };
    }
}

/// Runs `scalar_body` over `x` into `output`, honouring the optional mask.
#[inline(always)]
pub fn univariate_kernel_f64_std_to<FScalar>(
    x: &[f64],
    output: &mut [f64],
    null_mask: Option<&[bool]>,
    has_nulls: bool,
    scalar_body: FScalar,
) where
    FScalar: Fn(f64) -> f64,
{
    match null_mask {
        Some(mask) if has_nulls => {
            masked_univariate_kernel_f64_std_to(x, mask, output, scalar_body)
        }
        _ => dense_univariate_kernel_f64_std_to(x, output, scalar_body),
    }
}
