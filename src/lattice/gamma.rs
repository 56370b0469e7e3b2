// SPDX-License-Identifier: AGPL-3.0-only

//! Euclidean gamma matrices in the chiral (DeGrand-Rossi) basis.
//!
//! Directions `mu = 0, 1, 2, 3` are x, y, z, t:
//!
//!   γ_k = [[0, −iσ_k], [iσ_k, 0]],  γ_4 = [[0, 1], [1, 0]],  γ_5 = diag(1, 1, −1, −1)
//!
//! All five are Hermitian and square to one. Each row of γ_μ has exactly one
//! non-zero entry in {±1, ±i}, which is what the stencil kernels exploit:
//! applying a gamma matrix is a permutation of spin components with a phase.
//! γ_5 is diagonal, so chirality `+` is spins 0, 1 and chirality `−` is
//! spins 2, 3.
//!
//! # References
//!
//! - Gattringer & Lang, "QCD on the Lattice" (2010), App. A.2

use super::complex_f64::Complex64;
use super::constants::{N_DIM, N_SPIN_WILSON};
use super::su3::ColorVector;

/// Spin-color vector at one site.
pub type SpinColor = [ColorVector; N_SPIN_WILSON];

/// Dense 4×4 spin matrix.
pub type SpinMatrix = [[Complex64; N_SPIN_WILSON]; N_SPIN_WILSON];

/// Zero spin-color vector.
pub const ZERO_SPINOR: SpinColor = [[Complex64::ZERO; 3]; N_SPIN_WILSON];

/// Permutation-with-phase form of a gamma matrix: row `r` has its non-zero
/// entry `phase[r]` in column `col[r]`.
#[derive(Clone, Copy, Debug)]
pub struct Gamma {
    col: [usize; N_SPIN_WILSON],
    phase: [Complex64; N_SPIN_WILSON],
}

const P1: Complex64 = Complex64::ONE;
const M1: Complex64 = Complex64::new(-1.0, 0.0);
const PI: Complex64 = Complex64::I;
const MI: Complex64 = Complex64::new(0.0, -1.0);

/// γ_μ for μ = 0..3 (x, y, z, t).
pub const GAMMA: [Gamma; N_DIM] = [
    Gamma {
        col: [3, 2, 1, 0],
        phase: [MI, MI, PI, PI],
    },
    Gamma {
        col: [3, 2, 1, 0],
        phase: [M1, P1, P1, M1],
    },
    Gamma {
        col: [2, 3, 0, 1],
        phase: [MI, PI, PI, MI],
    },
    Gamma {
        col: [2, 3, 0, 1],
        phase: [P1, P1, P1, P1],
    },
];

/// γ_5 = γ_1 γ_2 γ_3 γ_4.
pub const GAMMA5: Gamma = Gamma {
    col: [0, 1, 2, 3],
    phase: [P1, P1, M1, M1],
};

impl Gamma {
    /// `γ ψ`
    #[inline]
    #[must_use]
    pub fn apply(&self, psi: &SpinColor) -> SpinColor {
        let mut out = ZERO_SPINOR;
        for (r, row) in out.iter_mut().enumerate() {
            let src = &psi[self.col[r]];
            let ph = self.phase[r];
            for c in 0..3 {
                row[c] = ph * src[c];
            }
        }
        out
    }

    /// Dense 4×4 form.
    #[must_use]
    pub fn dense(&self) -> SpinMatrix {
        let mut m = [[Complex64::ZERO; N_SPIN_WILSON]; N_SPIN_WILSON];
        for r in 0..N_SPIN_WILSON {
            m[r][self.col[r]] = self.phase[r];
        }
        m
    }
}

/// Spin projection `(1 + sign·γ_μ) ψ` with `sign = ±1`.
#[inline]
#[must_use]
pub fn project(mu: usize, sign: f64, psi: &SpinColor) -> SpinColor {
    let g = GAMMA[mu].apply(psi);
    let mut out = *psi;
    for (o, gv) in out.iter_mut().zip(g.iter()) {
        for c in 0..3 {
            o[c] += gv[c].scale(sign);
        }
    }
    out
}

/// Chiral projection `(1 + sign·γ_5) ψ`: keeps (doubled) one chirality.
#[inline]
#[must_use]
pub fn project5(sign: f64, psi: &SpinColor) -> SpinColor {
    let mut out = ZERO_SPINOR;
    let (keep, _) = chirality_spins(sign);
    for s in keep {
        for c in 0..3 {
            out[s][c] = psi[s][c].scale(2.0);
        }
    }
    out
}

/// Spin indices of the chirality selected by `sign` (+1 → upper), and of
/// the opposite one.
#[inline]
#[must_use]
pub fn chirality_spins(sign: f64) -> ([usize; 2], [usize; 2]) {
    if sign > 0.0 {
        ([0, 1], [2, 3])
    } else {
        ([2, 3], [0, 1])
    }
}

/// Product of two dense spin matrices.
#[must_use]
pub fn spin_mul(a: &SpinMatrix, b: &SpinMatrix) -> SpinMatrix {
    let mut r = [[Complex64::ZERO; N_SPIN_WILSON]; N_SPIN_WILSON];
    for i in 0..N_SPIN_WILSON {
        for j in 0..N_SPIN_WILSON {
            r[i][j] = (0..N_SPIN_WILSON).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    r
}

/// `σ_μν = (i/2) [γ_μ, γ_ν]`, Hermitian and block diagonal in chirality.
#[must_use]
pub fn sigma(mu: usize, nu: usize) -> SpinMatrix {
    let gm = GAMMA[mu].dense();
    let gn = GAMMA[nu].dense();
    let ab = spin_mul(&gm, &gn);
    let ba = spin_mul(&gn, &gm);
    let mut r = [[Complex64::ZERO; N_SPIN_WILSON]; N_SPIN_WILSON];
    for i in 0..N_SPIN_WILSON {
        for j in 0..N_SPIN_WILSON {
            r[i][j] = (ab[i][j] - ba[i][j]).mul_i().scale(0.5);
        }
    }
    r
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> SpinMatrix {
        let mut m = [[Complex64::ZERO; 4]; 4];
        for (i, row) in m.iter_mut().enumerate() {
            row[i] = Complex64::ONE;
        }
        m
    }

    fn assert_spin_eq(a: &SpinMatrix, b: &SpinMatrix, what: &str) {
        for i in 0..4 {
            for j in 0..4 {
                assert!(
                    (a[i][j] - b[i][j]).abs() < 1e-14,
                    "{what}: entry ({i},{j}) {} vs {}",
                    a[i][j],
                    b[i][j]
                );
            }
        }
    }

    #[test]
    fn clifford_algebra() {
        for mu in 0..4 {
            for nu in 0..4 {
                let gm = GAMMA[mu].dense();
                let gn = GAMMA[nu].dense();
                let ab = spin_mul(&gm, &gn);
                let ba = spin_mul(&gn, &gm);
                let mut anti = [[Complex64::ZERO; 4]; 4];
                for i in 0..4 {
                    for j in 0..4 {
                        anti[i][j] = ab[i][j] + ba[i][j];
                    }
                }
                let mut expected = [[Complex64::ZERO; 4]; 4];
                if mu == nu {
                    for (i, row) in expected.iter_mut().enumerate() {
                        row[i] = Complex64::real(2.0);
                    }
                }
                assert_spin_eq(&anti, &expected, &format!("{{γ{mu}, γ{nu}}}"));
            }
        }
    }

    #[test]
    fn gamma5_is_product_of_four() {
        let g = (0..4).fold(identity(), |acc, mu| spin_mul(&acc, &GAMMA[mu].dense()));
        assert_spin_eq(&g, &GAMMA5.dense(), "γ1γ2γ3γ4");
    }

    #[test]
    fn gammas_are_hermitian() {
        for g in GAMMA.iter().chain(std::iter::once(&GAMMA5)) {
            let d = g.dense();
            let mut adj = [[Complex64::ZERO; 4]; 4];
            for i in 0..4 {
                for j in 0..4 {
                    adj[i][j] = d[j][i].conj();
                }
            }
            assert_spin_eq(&d, &adj, "γ†");
        }
    }

    #[test]
    fn sigma_commutes_with_gamma5() {
        let g5 = GAMMA5.dense();
        for mu in 0..4 {
            for nu in (mu + 1)..4 {
                let s = sigma(mu, nu);
                assert_spin_eq(&spin_mul(&s, &g5), &spin_mul(&g5, &s), "[σ, γ5]");
            }
        }
    }

    #[test]
    fn projectors_are_complementary() {
        let mut psi = ZERO_SPINOR;
        for (s, row) in psi.iter_mut().enumerate() {
            for (c, v) in row.iter_mut().enumerate() {
                *v = Complex64::new(s as f64 + 0.5, c as f64 - 1.0);
            }
        }
        for mu in 0..4 {
            let plus = project(mu, 1.0, &psi);
            let minus = project(mu, -1.0, &psi);
            for s in 0..4 {
                for c in 0..3 {
                    let sum = plus[s][c] + minus[s][c];
                    assert!((sum - psi[s][c].scale(2.0)).abs() < 1e-14);
                }
            }
        }
        let p5 = project5(1.0, &psi);
        let m5 = project5(-1.0, &psi);
        assert_eq!(p5[2][0], Complex64::ZERO);
        assert_eq!(m5[0][1], Complex64::ZERO);
        assert_eq!(p5[1][2], psi[1][2].scale(2.0));
    }
}
