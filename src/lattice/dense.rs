// SPDX-License-Identifier: AGPL-3.0-only

//! Small dense matrix inversion (clover blocks, fifth-dimension operators).
//!
//! Gauss-Jordan elimination with partial pivoting. Matrices here are at most
//! a few dozen rows, so no blocking or pivot refinement is attempted.

use super::complex_f64::Complex64;
use super::constants::LATTICE_DIVISION_GUARD;

/// Invert an `N×N` complex matrix. `None` if a pivot falls below the
/// division guard.
#[must_use]
pub fn invert_complex<const N: usize>(a: &[[Complex64; N]; N]) -> Option<[[Complex64; N]; N]> {
    let mut m = *a;
    let mut inv = [[Complex64::ZERO; N]; N];
    for (i, row) in inv.iter_mut().enumerate() {
        row[i] = Complex64::ONE;
    }

    for col in 0..N {
        let pivot = (col..N).max_by(|&i, &j| m[i][col].abs_sq().total_cmp(&m[j][col].abs_sq()))?;
        if m[pivot][col].abs() < LATTICE_DIVISION_GUARD {
            return None;
        }
        m.swap(col, pivot);
        inv.swap(col, pivot);

        let d = m[col][col].inv();
        for j in 0..N {
            m[col][j] *= d;
            inv[col][j] *= d;
        }
        for r in 0..N {
            if r == col {
                continue;
            }
            let f = m[r][col];
            if f == Complex64::ZERO {
                continue;
            }
            for j in 0..N {
                let (mc, ic) = (m[col][j], inv[col][j]);
                m[r][j] -= f * mc;
                inv[r][j] -= f * ic;
            }
        }
    }
    Some(inv)
}

/// Invert an `n×n` real matrix stored row-major.
#[must_use]
pub fn invert_real(n: usize, a: &[f64]) -> Option<Vec<f64>> {
    if a.len() != n * n {
        return None;
    }
    let mut m = a.to_vec();
    let mut inv = vec![0.0; n * n];
    for i in 0..n {
        inv[i * n + i] = 1.0;
    }

    for col in 0..n {
        let pivot =
            (col..n).max_by(|&i, &j| m[i * n + col].abs().total_cmp(&m[j * n + col].abs()))?;
        if m[pivot * n + col].abs() < LATTICE_DIVISION_GUARD {
            return None;
        }
        if pivot != col {
            for j in 0..n {
                m.swap(col * n + j, pivot * n + j);
                inv.swap(col * n + j, pivot * n + j);
            }
        }
        let d = 1.0 / m[col * n + col];
        for j in 0..n {
            m[col * n + j] *= d;
            inv[col * n + j] *= d;
        }
        for r in (0..n).filter(|&r| r != col) {
            let f = m[r * n + col];
            if f == 0.0 {
                continue;
            }
            for j in 0..n {
                m[r * n + j] -= f * m[col * n + j];
                inv[r * n + j] -= f * inv[col * n + j];
            }
        }
    }
    Some(inv)
}

/// Row-major real matrix product `a b` for `n×n` operands.
#[must_use]
pub fn mat_mul_real(n: usize, a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut r = vec![0.0; n * n];
    for i in 0..n {
        for k in 0..n {
            let aik = a[i * n + k];
            if aik == 0.0 {
                continue;
            }
            for j in 0..n {
                r[i * n + j] += aik * b[k * n + j];
            }
        }
    }
    r
}
