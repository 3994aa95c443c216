// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under Mozilla Public License (MPL) 2.0.

//! # **Utility Functions** - *Input Validation and Null Handling*
//!
//! Shared helpers for the kernels: null-mask detection, length and capacity
//! checks, and finiteness validation of statistics and weights.
//!
//! Null masks follow the Arrow validity convention: lane `i` is valid when
//! `mask[i]` is `true`.

use crate::errors::{log_length_mismatch, KernelError};

/// Determines whether nulls are present given an optional null count and mask reference.
/// Avoids computing mask cardinality to preserve performance guarantees.
#[inline(always)]
pub fn has_nulls(null_count: Option<usize>, mask: Option<&[bool]>) -> bool {
    match null_count {
        Some(n) => n > 0,
        None => mask.is_some(),
    }
}

/// Checks the mask is long enough to cover `cmp_len` lanes.
#[inline(always)]
pub fn confirm_mask_capacity(cmp_len: usize, mask: Option<&[bool]>) -> Result<(), KernelError> {
    if let Some(m) = mask {
        if m.len() < cmp_len {
            return Err(KernelError::InvalidArguments(format!(
                "mask: capacity mismatch (expected {}, got {})",
                cmp_len,
                m.len()
            )));
        }
    }
    Ok(())
}

/// Validates that two lengths are equal.
///
/// # Returns
/// `Ok(())` if lengths are equal, otherwise `KernelError::LengthMismatch` with diagnostic details.
#[inline(always)]
pub fn confirm_equal_len(label: &str, a: usize, b: usize) -> Result<(), KernelError> {
    if a != b {
        return Err(KernelError::LengthMismatch(log_length_mismatch(
            label.to_string(),
            a,
            b,
        )));
    }
    Ok(())
}

/// Rejects NaN and infinite values, naming the first offending index.
#[inline]
pub fn confirm_finite(label: &str, values: &[f64]) -> Result<(), KernelError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(KernelError::NonFiniteInput(format!(
            "{}: value at index {} is {}",
            label, i, values[i]
        ))),
        None => Ok(()),
    }
}

/// Rejects a non-finite scalar.
#[inline]
pub fn confirm_finite_scalar(label: &str, value: f64) -> Result<(), KernelError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(KernelError::NonFiniteInput(format!("{}: {}", label, value)))
    }
}

/// Like [`confirm_finite`] but skips lanes that are null in `mask`.
#[inline]
pub fn confirm_finite_masked(
    label: &str,
    values: &[f64],
    mask: Option<&[bool]>,
    null_count: Option<usize>,
) -> Result<(), KernelError> {
    let mask = match mask {
        Some(m) if has_nulls(null_count, mask) => m,
        _ => return confirm_finite(label, values),
    };
    confirm_mask_capacity(values.len(), Some(mask))?;
    for (i, (&v, &valid)) in values.iter().zip(mask).enumerate() {
        if valid && !v.is_finite() {
            return Err(KernelError::NonFiniteInput(format!(
                "{}: value at index {} is {}",
                label, i, v
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_checks() {
        assert!(confirm_finite("w", &[1.0, 2.0]).is_ok());
        let err = confirm_finite("w", &[1.0, f64::NAN]).unwrap_err();
        assert!(matches!(err, KernelError::NonFiniteInput(_)));
        assert!(confirm_finite_scalar("q", f64::INFINITY).is_err());
    }

    #[test]
    fn masked_lanes_are_not_validated() {
        let m = [true, false, true];
        let xs = [1.0, f64::NAN, 3.0];
        assert!(confirm_finite_masked("t", &xs, Some(m.as_slice()), Some(1)).is_ok());
        assert!(confirm_finite_masked("t", &xs, None, None).is_err());
        assert!(confirm_finite_masked("t", &xs, Some(&m[..2]), Some(1)).is_err());
    }

    #[test]
    fn null_detection() {
        assert!(!has_nulls(Some(0), None));
        assert!(has_nulls(None, Some([true, true].as_slice())));
        assert!(confirm_equal_len("x", 2, 3).is_err());
    }
}
