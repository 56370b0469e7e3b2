// SPDX-License-Identifier: AGPL-3.0-only

//! 3×3 complex color matrices and color vectors.
//!
//! Gauge links `U_μ(x)` are SU(3) parallel transporters. Fat and long links
//! of the improved staggered action use the same type but are general 3×3
//! complex matrices (smearing leaves the group), so nothing here assumes
//! unitarity except [`Su3Matrix::reunitarize`] and the random constructors.
//!
//! Storage: row-major, 9 Complex64 values (18 f64).
//!
//! # References
//!
//! - Gattringer & Lang, "QCD on the Lattice" (2010), Ch. 2
//! - Creutz, "Quarks, Gluons and Lattices" (1983), Ch. 8

use std::ops::{Add, Mul, Sub};

use super::complex_f64::Complex64;
use super::constants::{lcg_gaussian, LATTICE_DIVISION_GUARD, N_COLORS};

/// Color vector at a single site and spin: 3 complex components.
pub type ColorVector = [Complex64; N_COLORS];

/// 3×3 complex matrix: link variable or smeared link.
///
/// Row-major storage: `m[row][col]`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[must_use]
pub struct Su3Matrix {
    /// Matrix elements m[row][col].
    pub m: [[Complex64; 3]; 3],
}

impl Mul for Su3Matrix {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        let mut r = Self::ZERO;
        for i in 0..3 {
            for j in 0..3 {
                r.m[i][j] = (0..3).map(|k| self.m[i][k] * rhs.m[k][j]).sum();
            }
        }
        r
    }
}

impl Add for Su3Matrix {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        let mut r = self;
        for (row, rrow) in r.m.iter_mut().zip(rhs.m.iter()) {
            for (a, b) in row.iter_mut().zip(rrow.iter()) {
                *a += *b;
            }
        }
        r
    }
}

impl Sub for Su3Matrix {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        let mut r = self;
        for (row, rrow) in r.m.iter_mut().zip(rhs.m.iter()) {
            for (a, b) in row.iter_mut().zip(rrow.iter()) {
                *a -= *b;
            }
        }
        r
    }
}

impl Su3Matrix {
    /// 3×3 identity matrix.
    pub const IDENTITY: Self = Self {
        m: [
            [Complex64::ONE, Complex64::ZERO, Complex64::ZERO],
            [Complex64::ZERO, Complex64::ONE, Complex64::ZERO],
            [Complex64::ZERO, Complex64::ZERO, Complex64::ONE],
        ],
    };

    /// Zero matrix (all elements 0).
    pub const ZERO: Self = Self {
        m: [[Complex64::ZERO; 3]; 3],
    };

    /// Conjugate transpose (adjoint / dagger).
    pub fn adjoint(self) -> Self {
        let mut r = Self::ZERO;
        for i in 0..3 {
            for j in 0..3 {
                r.m[i][j] = self.m[j][i].conj();
            }
        }
        r
    }

    /// Trace: Tr(U) = sum\_i `U_ii`
    pub fn trace(self) -> Complex64 {
        self.m[0][0] + self.m[1][1] + self.m[2][2]
    }

    /// Real part of trace.
    #[must_use]
    pub fn re_trace(self) -> f64 {
        self.m[0][0].re + self.m[1][1].re + self.m[2][2].re
    }

    /// Determinant of a 3×3 complex matrix.
    pub fn det(self) -> Complex64 {
        let m = &self.m;
        let a = m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1]);
        let b = m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0]);
        let c = m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0]);
        a - b + c
    }

    /// Scale by a real number.
    pub fn scale(self, s: f64) -> Self {
        self.scale_complex(Complex64::real(s))
    }

    /// Scale by a complex number.
    pub fn scale_complex(self, s: Complex64) -> Self {
        let mut r = self;
        for row in &mut r.m {
            for v in row.iter_mut() {
                *v = *v * s;
            }
        }
        r
    }

    /// Frobenius norm squared: sum |`m_ij`|²
    #[must_use]
    pub fn norm_sq(self) -> f64 {
        self.m.iter().flatten().map(|v| v.abs_sq()).sum()
    }

    /// `U v`
    #[inline]
    #[must_use]
    pub fn mul_vec(&self, v: &ColorVector) -> ColorVector {
        let m = &self.m;
        [
            m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
            m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
            m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
        ]
    }

    /// `U† v` without forming the adjoint.
    #[inline]
    #[must_use]
    pub fn adj_mul_vec(&self, v: &ColorVector) -> ColorVector {
        let m = &self.m;
        [
            m[0][0].conj_mul(v[0]) + m[1][0].conj_mul(v[1]) + m[2][0].conj_mul(v[2]),
            m[0][1].conj_mul(v[0]) + m[1][1].conj_mul(v[1]) + m[2][1].conj_mul(v[2]),
            m[0][2].conj_mul(v[0]) + m[1][2].conj_mul(v[1]) + m[2][2].conj_mul(v[2]),
        ]
    }

    /// Anti-Hermitian traceless part, `(U − U†)/2 − Tr(U − U†)/6`.
    ///
    /// Used to extract the clover field strength from the leaf sum.
    pub fn traceless_antihermitian(self) -> Self {
        let mut r = (self - self.adjoint()).scale(0.5);
        let tr = r.trace().scale(1.0 / 3.0);
        for i in 0..3 {
            r.m[i][i] -= tr;
        }
        r
    }

    /// Project back onto SU(3) via modified Gram-Schmidt reunitarization.
    pub fn reunitarize(self) -> Self {
        let mut u = self;

        let n0 = row_norm(&u, 0);
        if n0 > LATTICE_DIVISION_GUARD {
            let inv = 1.0 / n0;
            for j in 0..3 {
                u.m[0][j] = u.m[0][j].scale(inv);
            }
        }

        let dot01 = row_dot(&u, 0, 1);
        for j in 0..3 {
            let d = u.m[0][j] * dot01;
            u.m[1][j] -= d;
        }
        let n1 = row_norm(&u, 1);
        if n1 > LATTICE_DIVISION_GUARD {
            let inv = 1.0 / n1;
            for j in 0..3 {
                u.m[1][j] = u.m[1][j].scale(inv);
            }
        }

        // Row 2 = conj(row 0 × row 1) so that det = 1
        u.m[2][0] = (u.m[0][1] * u.m[1][2] - u.m[0][2] * u.m[1][1]).conj();
        u.m[2][1] = (u.m[0][2] * u.m[1][0] - u.m[0][0] * u.m[1][2]).conj();
        u.m[2][2] = (u.m[0][0] * u.m[1][1] - u.m[0][1] * u.m[1][0]).conj();

        u
    }

    /// Random SU(3) matrix `exp(i ε H)` with `H` traceless Hermitian.
    ///
    /// Second-order expansion followed by reunitarization; `epsilon` of order
    /// one gives a strongly disordered link.
    pub fn random_near_identity(seed: &mut u64, epsilon: f64) -> Self {
        let mut h = [[Complex64::ZERO; 3]; 3];
        let inv_sqrt3 = 1.0 / 3.0_f64.sqrt();

        let a3 = lcg_gaussian(seed) * epsilon;
        let a8 = lcg_gaussian(seed) * epsilon;
        h[0][0] = Complex64::real(a3 + a8 * inv_sqrt3);
        h[1][1] = Complex64::real(-a3 + a8 * inv_sqrt3);
        h[2][2] = Complex64::real(-2.0 * a8 * inv_sqrt3);

        for (i, j) in [(0, 1), (0, 2), (1, 2)] {
            let re = lcg_gaussian(seed) * epsilon;
            let im = lcg_gaussian(seed) * epsilon;
            h[i][j] = Complex64::new(re, im);
            h[j][i] = Complex64::new(re, -im);
        }

        let mut result = Self::IDENTITY;
        for (i, row) in result.m.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                let h2_ij: Complex64 = (0..3).map(|k| h[i][k] * h[k][j]).sum();
                *cell += h[i][j].mul_i() - h2_ij.scale(0.5);
            }
        }

        result.reunitarize()
    }

    /// Random general complex matrix with Gaussian entries of width `sigma`
    /// around `center · 1`. Stands in for smeared (fat/long) links.
    pub fn random_general(seed: &mut u64, center: f64, sigma: f64) -> Self {
        let mut r = Self::IDENTITY.scale(center);
        for row in &mut r.m {
            for v in row.iter_mut() {
                *v += Complex64::new(lcg_gaussian(seed) * sigma, lcg_gaussian(seed) * sigma);
            }
        }
        r
    }
}

fn row_norm(u: &Su3Matrix, row: usize) -> f64 {
    u.m[row].iter().map(|v| v.abs_sq()).sum::<f64>().sqrt()
}

fn row_dot(u: &Su3Matrix, r1: usize, r2: usize) -> Complex64 {
    (0..3).map(|j| u.m[r1][j].conj_mul(u.m[r2][j])).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn random_vec(seed: &mut u64) -> ColorVector {
        [0; 3].map(|_| Complex64::new(lcg_gaussian(seed), lcg_gaussian(seed)))
    }

    #[test]
    fn identity_properties() {
        let i = Su3Matrix::IDENTITY;
        assert!((i.det().re - 1.0).abs() < 1e-14);
        assert!(i.det().im.abs() < 1e-14);
        assert!((i.re_trace() - 3.0).abs() < 1e-14);
    }

    #[test]
    fn unitarity_check() {
        let mut seed = 123u64;
        let u = Su3Matrix::random_near_identity(&mut seed, 0.2);
        let prod = u * u.adjoint();
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!(
                    (prod.m[i][j].re - expected).abs() < 1e-10,
                    "U U† not identity at ({i},{j}): {:.6e}",
                    prod.m[i][j].re - expected
                );
                assert!(prod.m[i][j].im.abs() < 1e-10);
            }
        }
    }

    #[test]
    fn det_is_one_after_reunitarize() {
        let mut seed = 777u64;
        let u = Su3Matrix::random_near_identity(&mut seed, 1.5);
        let d = u.det();
        assert!((d.re - 1.0).abs() < 1e-10, "det = {d}");
        assert!(d.im.abs() < 1e-10, "det = {d}");
    }

    #[test]
    fn adj_mul_vec_matches_adjoint_then_mul() {
        let mut seed = 5u64;
        let u = Su3Matrix::random_general(&mut seed, 0.3, 1.0);
        let v = random_vec(&mut seed);
        let a = u.adj_mul_vec(&v);
        let b = u.adjoint().mul_vec(&v);
        for c in 0..3 {
            assert!((a[c] - b[c]).abs() < 1e-14, "color {c}: {} vs {}", a[c], b[c]);
        }
    }

    #[test]
    fn mul_vec_agrees_with_matrix_product() {
        let mut seed = 11u64;
        let u = Su3Matrix::random_near_identity(&mut seed, 0.7);
        let w = Su3Matrix::random_near_identity(&mut seed, 0.7);
        let v = random_vec(&mut seed);
        let lhs = (u * w).mul_vec(&v);
        let rhs = u.mul_vec(&w.mul_vec(&v));
        for c in 0..3 {
            assert!((lhs[c] - rhs[c]).abs() < 1e-13);
        }
    }

    #[test]
    fn traceless_antihermitian_projection() {
        let mut seed = 3u64;
        let a = Su3Matrix::random_general(&mut seed, 0.0, 1.0).traceless_antihermitian();
        assert!(a.trace().abs() < 1e-14, "trace = {}", a.trace());
        let sum = a + a.adjoint();
        assert!(sum.norm_sq() < 1e-26, "A + A† = {:e}", sum.norm_sq());
    }
}
