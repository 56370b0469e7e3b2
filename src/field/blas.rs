// SPDX-License-Identifier: AGPL-3.0-only

//! Level-1 field arithmetic on views.
//!
//! Every routine checks that its operands share a layout (including the
//! parity subset) and then runs element-wise in parallel.

use rayon::prelude::*;

use crate::error::Result;
use crate::lattice::complex_f64::Complex64;

use super::spinor::{SpinorView, SpinorViewMut};

/// `y ← y + a·x`
///
/// # Errors
///
/// Layout mismatch.
pub fn axpy(a: f64, x: SpinorView<'_>, y: &mut SpinorViewMut<'_>) -> Result<()> {
    y.layout().ensure_matches("axpy", x.layout())?;
    y.data_mut()
        .par_iter_mut()
        .zip(x.data().par_iter())
        .for_each(|(yi, xi)| *yi += xi.scale(a));
    Ok(())
}

/// `y ← y + a·x` with complex `a`.
///
/// # Errors
///
/// Layout mismatch.
pub fn caxpy(a: Complex64, x: SpinorView<'_>, y: &mut SpinorViewMut<'_>) -> Result<()> {
    y.layout().ensure_matches("caxpy", x.layout())?;
    y.data_mut()
        .par_iter_mut()
        .zip(x.data().par_iter())
        .for_each(|(yi, xi)| *yi += a * *xi);
    Ok(())
}

/// `y ← a·x + b·y`
///
/// # Errors
///
/// Layout mismatch.
pub fn axpby(a: f64, x: SpinorView<'_>, b: f64, y: &mut SpinorViewMut<'_>) -> Result<()> {
    y.layout().ensure_matches("axpby", x.layout())?;
    y.data_mut()
        .par_iter_mut()
        .zip(x.data().par_iter())
        .for_each(|(yi, xi)| *yi = xi.scale(a) + yi.scale(b));
    Ok(())
}

/// `y ← x + a·y`
///
/// # Errors
///
/// Layout mismatch.
pub fn xpay(x: SpinorView<'_>, a: f64, y: &mut SpinorViewMut<'_>) -> Result<()> {
    axpby(1.0, x, a, y)
}

/// `y ← a·y`
pub fn scale(a: f64, y: &mut SpinorViewMut<'_>) {
    y.data_mut().par_iter_mut().for_each(|yi| *yi = yi.scale(a));
}

/// `y ← x`
///
/// # Errors
///
/// Layout mismatch.
pub fn copy(y: &mut SpinorViewMut<'_>, x: SpinorView<'_>) -> Result<()> {
    y.copy_from(x)
}

/// `<x | y>`
///
/// # Errors
///
/// Layout mismatch.
pub fn dot(x: SpinorView<'_>, y: SpinorView<'_>) -> Result<Complex64> {
    x.dot(y)
}

/// `‖x‖²`
#[must_use]
pub fn norm2(x: SpinorView<'_>) -> f64 {
    x.norm2()
}
