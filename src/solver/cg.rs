// SPDX-License-Identifier: AGPL-3.0-only

//! Conjugate Gradient for Hermitian positive-definite operators.
//!
//! Works on any [`DiracMatrix`], typically [`crate::dirac::DiracMdagM`] on
//! the reduced or the full lattice.
//!
//! # Algorithm
//!
//! Standard CG with relative residual convergence criterion:
//!   ||r||² / ||b||² < tol²
//!
//! # References
//!
//! - Hestenes & Stiefel (1952)
//! - Gattringer & Lang, "QCD on the Lattice" (2010), Ch. 8.4

use crate::dirac::DiracMatrix;
use crate::error::Result;
use crate::field::blas;
use crate::field::spinor::{SpinorField, SpinorView, SpinorViewMut};

/// CG solver result.
#[derive(Clone, Debug)]
pub struct CgResult {
    pub converged: bool,
    pub iterations: usize,
    pub final_residual: f64,
    pub initial_residual: f64,
}

/// Solve `A x = b` with `A` given by `matrix`.
///
/// `x` holds the initial guess on entry and the solution on exit. `tol` is
/// the relative residual tolerance.
///
/// # Errors
///
/// Shape mismatch between `x`, `b` and the operator, or whatever the
/// operator reports.
pub fn cg_solve(
    matrix: &impl DiracMatrix,
    mut x: SpinorViewMut<'_>,
    b: SpinorView<'_>,
    tol: f64,
    max_iter: usize,
) -> Result<CgResult> {
    let layout = *b.layout();
    layout.ensure_matches("cg_solve", x.layout())?;

    // r = b - A x
    let mut r = SpinorField::zeros(layout);
    matrix.apply(r.view_mut(), x.as_view())?;
    blas::axpby(1.0, b, -1.0, &mut r.view_mut())?;

    let b_norm_sq = blas::norm2(b);
    if b_norm_sq < 1e-30 {
        x.zero();
        return Ok(CgResult {
            converged: true,
            iterations: 0,
            final_residual: 0.0,
            initial_residual: 0.0,
        });
    }

    let mut r_norm_sq = r.norm2();
    let initial_residual = (r_norm_sq / b_norm_sq).sqrt();
    let tol_sq = tol * tol * b_norm_sq;

    if r_norm_sq < tol_sq {
        return Ok(CgResult {
            converged: true,
            iterations: 0,
            final_residual: initial_residual,
            initial_residual,
        });
    }

    // p = r
    let mut p = r.clone();
    let mut ap = SpinorField::zeros(layout);

    let mut iterations = 0;

    for iter in 0..max_iter {
        iterations = iter + 1;

        matrix.apply(ap.view_mut(), p.view())?;

        // alpha = <r|r> / <p|Ap>
        let p_ap = p.dot(&ap)?.re;
        if p_ap.abs() < 1e-30 {
            break;
        }
        let alpha = r_norm_sq / p_ap;

        // x = x + alpha * p
        blas::axpy(alpha, p.view(), &mut x)?;

        // r = r - alpha * Ap
        blas::axpy(-alpha, ap.view(), &mut r.view_mut())?;

        let r_norm_sq_new = r.norm2();

        if r_norm_sq_new < tol_sq {
            r_norm_sq = r_norm_sq_new;
            break;
        }

        let beta = r_norm_sq_new / r_norm_sq;
        r_norm_sq = r_norm_sq_new;

        // p = r + beta * p
        blas::axpby(1.0, r.view(), beta, &mut p.view_mut())?;
    }

    let final_residual = (r_norm_sq / b_norm_sq).sqrt();
    let converged = final_residual < tol;
    if converged {
        log::debug!("cg: {iterations} iterations, residual {final_residual:.3e}");
    } else {
        log::warn!(
            "cg did not converge: {iterations} iterations, residual {final_residual:.3e} (tol {tol:.1e})"
        );
    }

    Ok(CgResult {
        converged,
        iterations,
        final_residual,
        initial_residual,
    })
}
