// SPDX-License-Identifier: AGPL-3.0-only

//! Operators along the fifth dimension for 4D-preconditioned domain wall.
//!
//! Every such operator is block diagonal in chirality and acts on the slice
//! index with a real `Ls×Ls` matrix per chirality (`+`: spins 0, 1; `−`:
//! spins 2, 3). The building block is the wall-coupled shift
//!
//!   `C₊[s][s−1] = 1, C₊[0][Ls−1] = −m_f`
//!   `C₋[s][s+1] = 1, C₋[Ls−1][0] = −m_f`
//!
//! from which
//!
//! - Shamir: `A = 1 − 2κ5 C`
//! - Mobius: `Pre = b + c C`, `A = 2κ5 [(4 + m5) Pre + 1 − C]`
//!
//! with `κ5 = 0.5 / (b₀ (4 + m5) + 1)`, which reduces to `0.5 / (5 + m5)` for
//! Shamir. Inverses are formed densely once at construction. Adjoints are
//! transposes.
//!
//! # References
//!
//! - Brower, Neff & Orginos, Comput. Phys. Commun. 220, 1 (2017)

use rayon::prelude::*;

use crate::error::{DiracError, Result};
use crate::field::spinor::{load_site, store_site, Checkerboard, SpinorView, SpinorViewMut};
use crate::lattice::constants::{flops, MAX_LS, N_COLORS};
use crate::lattice::dense::invert_real;
use crate::lattice::gamma::ZERO_SPINOR;

use super::{check_local, parity_sites};

/// Which fifth-dimension matrix to apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FifthDimTerm {
    /// The local term `A` (`Dslash5`).
    Local,
    /// `A⁻¹`
    LocalInverse,
    /// Mobius pre-hop `b + c C` (`Dslash4pre`).
    Pre,
}

type ChiralPair = [Vec<f64>; 2];

/// Per-chirality dense fifth-dimension matrices.
#[derive(Clone, Debug)]
pub struct FifthDimOperator {
    ls: usize,
    local: ChiralPair,
    local_inv: ChiralPair,
    pre: Option<ChiralPair>,
}

/// Wall-coupled shift `C_χ` (row-major), `chi = 0` for `+`.
#[must_use]
pub fn shift_matrix(ls: usize, mf: f64, chi: usize) -> Vec<f64> {
    let mut c = vec![0.0; ls * ls];
    for s in 0..ls {
        if chi == 0 {
            if s == 0 {
                c[ls - 1] = -mf;
            } else {
                c[s * ls + s - 1] = 1.0;
            }
        } else if s + 1 == ls {
            c[s * ls] = -mf;
        } else {
            c[s * ls + s + 1] = 1.0;
        }
    }
    c
}

fn check_ls(ls: usize) -> Result<()> {
    if ls == 0 || ls > MAX_LS {
        return Err(DiracError::config(format!(
            "Ls = {ls} outside 1..={MAX_LS}"
        )));
    }
    Ok(())
}

impl FifthDimOperator {
    /// Shamir domain wall, `A = 1 − 2κ5 C`.
    ///
    /// # Errors
    ///
    /// Bad `ls` or a singular `A`.
    pub fn domain_wall(ls: usize, mf: f64, kappa5: f64) -> Result<Self> {
        check_ls(ls)?;
        let local = [0, 1].map(|chi| {
            let mut a: Vec<f64> = shift_matrix(ls, mf, chi)
                .into_iter()
                .map(|v| -2.0 * kappa5 * v)
                .collect();
            for s in 0..ls {
                a[s * ls + s] += 1.0;
            }
            a
        });
        Self::with_local(ls, local, None)
    }

    /// Mobius domain wall with per-slice coefficients `b5[s]`, `c5[s]`.
    ///
    /// # Errors
    ///
    /// Coefficient lengths differing from `ls`, bad `ls`, or a singular `A`.
    pub fn mobius(b5: &[f64], c5: &[f64], m5: f64, mf: f64, kappa5: f64) -> Result<Self> {
        let ls = b5.len();
        check_ls(ls)?;
        if c5.len() != ls {
            return Err(DiracError::config(format!(
                "Mobius coefficients: {} b5 values but {} c5 values",
                ls,
                c5.len()
            )));
        }
        let pre = [0, 1].map(|chi| {
            let mut p = shift_matrix(ls, mf, chi);
            for s in 0..ls {
                for v in &mut p[s * ls..(s + 1) * ls] {
                    *v *= c5[s];
                }
                p[s * ls + s] += b5[s];
            }
            p
        });
        let local = [0, 1].map(|chi| {
            let c = shift_matrix(ls, mf, chi);
            let mut a: Vec<f64> = pre[chi]
                .iter()
                .zip(&c)
                .map(|(p, c)| 2.0 * kappa5 * ((4.0 + m5) * p - c))
                .collect();
            for s in 0..ls {
                a[s * ls + s] += 2.0 * kappa5;
            }
            a
        });
        Self::with_local(ls, local, Some(pre))
    }

    fn with_local(ls: usize, local: ChiralPair, pre: Option<ChiralPair>) -> Result<Self> {
        let inv = |m: &[f64]| {
            invert_real(ls, m)
                .ok_or_else(|| DiracError::config("singular fifth-dimension operator"))
        };
        let local_inv = [inv(&local[0])?, inv(&local[1])?];
        Ok(Self {
            ls,
            local,
            local_inv,
            pre,
        })
    }

    #[must_use]
    pub const fn ls(&self) -> usize {
        self.ls
    }

    /// True when a Mobius pre-hop matrix is present.
    #[must_use]
    pub const fn has_pre(&self) -> bool {
        self.pre.is_some()
    }

    /// Row-major matrix of `term` for chirality `chi`.
    #[must_use]
    pub fn matrix(&self, term: FifthDimTerm, chi: usize) -> Option<&[f64]> {
        let pair = match term {
            FifthDimTerm::Local => &self.local,
            FifthDimTerm::LocalInverse => &self.local_inv,
            FifthDimTerm::Pre => self.pre.as_ref()?,
        };
        pair.get(chi).map(Vec::as_slice)
    }

    /// `out = M inp` (`Mᵀ` when `dagger`) for `M` the chosen term, on one
    /// parity of a 4D-checkerboarded field. Returns flops.
    ///
    /// # Errors
    ///
    /// Parity or shape mismatch, a 5D checkerboard, a wrong `ls`, or
    /// [`FifthDimTerm::Pre`] on an operator without one.
    pub fn apply(
        &self,
        term: FifthDimTerm,
        out: &mut SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        dagger: bool,
    ) -> Result<u64> {
        let layout = *out.layout();
        check_local("dslash5", &layout, inp.layout())?;
        if layout.checkerboard != Checkerboard::FourD || layout.ls != self.ls {
            return Err(DiracError::ShapeMismatch(format!(
                "fifth-dimension operator with Ls={} on {layout}",
                self.ls
            )));
        }
        let mats = [
            self.matrix(term, 0)
                .ok_or_else(|| DiracError::config("operator has no Mobius pre-hop term"))?,
            self.matrix(term, 1)
                .ok_or_else(|| DiracError::config("operator has no Mobius pre-hop term"))?,
        ];
        let ls = self.ls;
        let vh = layout.geometry.half_volume();
        let sl = layout.site_len();
        out.data_mut()
            .par_chunks_mut(sl)
            .enumerate()
            .for_each(|(i, site)| {
                let (s, cb) = (i / vh, i % vh);
                let mut v = ZERO_SPINOR;
                for t in 0..ls {
                    let psi = load_site(inp.data(), layout.site_offset(t, cb), layout.n_spin);
                    for (chi, m) in mats.iter().enumerate() {
                        let w = if dagger { m[t * ls + s] } else { m[s * ls + t] };
                        if w == 0.0 {
                            continue;
                        }
                        for spin in 2 * chi..2 * chi + 2 {
                            for c in 0..N_COLORS {
                                v[spin][c] += psi[spin][c].scale(w);
                            }
                        }
                    }
                }
                store_site(site, 0, layout.n_spin, &v);
            });
        Ok(flops::DSLASH5_DENSE_PER_LS * ls as u64 * parity_sites(&layout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::spinor::{FieldLayout, SiteSubset, SpinorField};
    use crate::lattice::dense::mat_mul_real;
    use crate::lattice::geometry::{LatticeGeometry, Parity};

    const LS: usize = 6;

    fn layout() -> FieldLayout {
        let g = LatticeGeometry::new([2, 2, 2, 2]).unwrap();
        FieldLayout::five_d(g, LS, Checkerboard::FourD, SiteSubset::Parity(Parity::Odd))
    }

    #[test]
    fn shift_matrix_walls() {
        let c = shift_matrix(4, 0.1, 0);
        assert_eq!(c[4], 1.0);
        assert_eq!(c[3], -0.1);
        let c = shift_matrix(4, 0.1, 1);
        assert_eq!(c[1], 1.0);
        assert_eq!(c[12], -0.1);
    }

    #[test]
    fn mobius_with_unit_b_reduces_to_shamir() {
        let (m5, mf) = (-1.8, 0.04);
        let k5 = 0.5 / (5.0 + m5);
        let dw = FifthDimOperator::domain_wall(LS, mf, k5).unwrap();
        let mob = FifthDimOperator::mobius(&[1.0; LS], &[0.0; LS], m5, mf, k5).unwrap();
        for term in [FifthDimTerm::Local, FifthDimTerm::LocalInverse] {
            for chi in 0..2 {
                let a = dw.matrix(term, chi).unwrap();
                let b = mob.matrix(term, chi).unwrap();
                for (x, y) in a.iter().zip(b) {
                    assert!((x - y).abs() < 1e-14, "{term:?} chi={chi}: {x} vs {y}");
                }
            }
        }
        assert!(!dw.has_pre());
        assert!(dw.matrix(FifthDimTerm::Pre, 0).is_none());
    }

    #[test]
    fn inverse_is_inverse() {
        let b5: Vec<f64> = (0..LS).map(|s| 1.5 + 0.05 * s as f64).collect();
        let c5: Vec<f64> = (0..LS).map(|s| 0.5 - 0.02 * s as f64).collect();
        let k5 = 0.5 / (b5[0] * (4.0 - 1.4) + 1.0);
        let op = FifthDimOperator::mobius(&b5, &c5, -1.4, 0.01, k5).unwrap();
        for chi in 0..2 {
            let prod = mat_mul_real(
                LS,
                op.matrix(FifthDimTerm::Local, chi).unwrap(),
                op.matrix(FifthDimTerm::LocalInverse, chi).unwrap(),
            );
            for i in 0..LS {
                for j in 0..LS {
                    let want = if i == j { 1.0 } else { 0.0 };
                    assert!((prod[i * LS + j] - want).abs() < 1e-12, "({i},{j})");
                }
            }
        }
    }

    #[test]
    fn transpose_is_adjoint_on_fields() {
        let k5 = 0.5 / (5.0 - 1.6);
        let op = FifthDimOperator::mobius(&[1.4; LS], &[0.4; LS], -1.6, 0.02, k5).unwrap();
        let x = SpinorField::random(layout(), 1);
        let y = SpinorField::random(layout(), 2);
        for term in [FifthDimTerm::Local, FifthDimTerm::Pre, FifthDimTerm::LocalInverse] {
            let mut my = SpinorField::zeros(layout());
            op.apply(term, &mut my.view_mut(), y.view(), false).unwrap();
            let mut mdx = SpinorField::zeros(layout());
            op.apply(term, &mut mdx.view_mut(), x.view(), true).unwrap();
            let lhs = x.dot(&my).unwrap();
            let rhs = mdx.dot(&y).unwrap();
            assert!((lhs - rhs).abs() < 1e-10 * lhs.abs(), "{term:?}: {lhs} vs {rhs}");
        }
    }

    #[test]
    fn rejects_bad_shapes() {
        assert!(FifthDimOperator::domain_wall(0, 0.1, 0.1).is_err());
        assert!(FifthDimOperator::mobius(&[1.0; 4], &[0.0; 3], -1.8, 0.1, 0.1).is_err());
        let op = FifthDimOperator::domain_wall(LS, 0.1, 0.15).unwrap();
        let five = layout().with_checkerboard(Checkerboard::FiveD);
        let x = SpinorField::random(five, 1);
        let mut out = SpinorField::zeros(five);
        assert!(op.apply(FifthDimTerm::Local, &mut out.view_mut(), x.view(), false).is_err());
        let x = SpinorField::random(layout(), 1);
        let mut out = SpinorField::zeros(layout());
        assert!(matches!(
            op.apply(FifthDimTerm::Pre, &mut out.view_mut(), x.view(), false),
            Err(DiracError::Config(_))
        ));
    }
}
