// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under Mozilla Public License (MPL) 2.0.

//! # **Common Distribution Utilities** - *Shared Kernel and Test Helpers*
//!
//! Kernel loop helpers shared by the univariate chi-squared kernels, plus the
//! small test helpers their `#[cfg(test)]` modules use.
//!
//! ## Helper Functions
//! - **Allocation**: the allocate-then-fill wrapper every `_to` kernel is exposed through
//! - **Mask creation**: null mask generation for testing scenarios

/// Scalar implementations of common distribution utilities.
pub mod std;

use ndarray::Array1;

use crate::errors::KernelError;

/// Allocates an output buffer and runs the zero-allocation kernel `fill` into it.
#[inline(always)]
pub fn allocate_and_fill<F>(len: usize, fill: F) -> Result<Array1<f64>, KernelError>
where
    F: FnOnce(&mut [f64]) -> Result<(), KernelError>,
{
    let mut out = Array1::<f64>::zeros(len);
    if len == 0 {
        return Ok(out);
    }
    match out.as_slice_mut() {
        Some(buf) => fill(buf)?,
        None => {
            return Err(KernelError::InvalidArguments(
                "allocate_and_fill: output is not contiguous".into(),
            ))
        }
    }
    Ok(out)
}

// Common test helpers

/// Create a validity mask of given length with exactly the lane `idx` null.
pub fn single_null_mask(len: usize, idx: usize) -> Vec<bool> {
    let mut m = vec![true; len];
    m[idx] = false;
    m
}
