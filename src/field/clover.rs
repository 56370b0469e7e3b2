// SPDX-License-Identifier: AGPL-3.0-only

//! Clover term storage.
//!
//! The Sheikholeslami-Wohlert term is local, Hermitian, and commutes with
//! γ5, so per site it is two 6×6 complex blocks, one per chirality (spins
//! 0, 1 and spins 2, 3, each with three colors). Block row/column index is
//! `spin_in_chirality · 3 + color`.
//!
//!   `A(x) = 1 − κ c_sw Σ_{μ<ν} σ_μν F_μν(x)`
//!
//! with `F_μν` the clover-leaf field strength. Inverses are precomputed per
//! site. [`CloverField::twisted_inverse`] builds `(A + i a γ5)⁻¹` for the
//! twisted-clover operator and records `a` so a mismatched pairing can be
//! detected at operator construction.
//!
//! # References
//!
//! - Sheikholeslami & Wohlert, Nucl. Phys. B259, 572 (1985)
//! - Lüscher, Sint, Sommer & Weisz, Nucl. Phys. B478, 365 (1996)

use rayon::prelude::*;

use crate::error::{DiracError, Result};
use crate::lattice::complex_f64::Complex64;
use crate::lattice::constants::{N_COLORS, N_DIM};
use crate::lattice::dense::invert_complex;
use crate::lattice::gamma::{sigma, SpinColor, ZERO_SPINOR};
use crate::lattice::geometry::{LatticeGeometry, Parity};
use crate::lattice::su3::Su3Matrix;

use super::gauge::GaugeField;

/// Size of one chiral block (2 spins × 3 colors).
pub const CHIRAL_BLOCK: usize = 2 * N_COLORS;

/// One 6×6 chiral block.
pub type CloverBlock = [[Complex64; CHIRAL_BLOCK]; CHIRAL_BLOCK];

/// Per-site clover blocks `[chirality +, chirality −]`.
pub type CloverSite = [CloverBlock; 2];

fn identity_block() -> CloverBlock {
    let mut b = [[Complex64::ZERO; CHIRAL_BLOCK]; CHIRAL_BLOCK];
    for (i, row) in b.iter_mut().enumerate() {
        row[i] = Complex64::ONE;
    }
    b
}

/// Clover term (or its inverse) on every site, stored by parity.
#[derive(Clone, Debug)]
pub struct CloverField {
    geometry: LatticeGeometry,
    /// `sites[parity · Vh + cb]`
    sites: Vec<CloverSite>,
    inverse: bool,
    twist: Option<f64>,
}

impl CloverField {
    /// `A = 1` everywhere.
    #[must_use]
    pub fn unit(geometry: LatticeGeometry) -> Self {
        let id = identity_block();
        Self {
            geometry,
            sites: vec![[id, id]; geometry.volume()],
            inverse: false,
            twist: None,
        }
    }

    /// Blocks from a per-site generator (coordinates in, blocks out).
    pub fn from_blocks<F>(geometry: LatticeGeometry, f: F) -> Self
    where
        F: Fn([usize; 4]) -> CloverSite + Sync,
    {
        let vh = geometry.half_volume();
        let sites = (0..geometry.volume())
            .into_par_iter()
            .map(|i| {
                let p = if i < vh { Parity::Even } else { Parity::Odd };
                f(geometry.cb_coords(p, i % vh))
            })
            .collect();
        Self {
            geometry,
            sites,
            inverse: false,
            twist: None,
        }
    }

    /// Clover term of `gauge` with hopping parameter `kappa` and coefficient
    /// `csw`.
    #[must_use]
    pub fn from_gauge(gauge: &GaugeField, kappa: f64, csw: f64) -> Self {
        let geometry = gauge.geometry();
        let coeff = -kappa * csw;
        let sigmas: Vec<_> = (0..N_DIM)
            .flat_map(|mu| ((mu + 1)..N_DIM).map(move |nu| (mu, nu)))
            .map(|(mu, nu)| ((mu, nu), sigma(mu, nu)))
            .collect();
        Self::from_blocks(geometry, |x| {
            let mut site = [identity_block(), identity_block()];
            for ((mu, nu), s) in &sigmas {
                let f = field_strength(gauge, x, *mu, *nu);
                for (chi, block) in site.iter_mut().enumerate() {
                    for sl in 0..2 {
                        for sr in 0..2 {
                            let sig = s[2 * chi + sl][2 * chi + sr];
                            if sig == Complex64::ZERO {
                                continue;
                            }
                            for a in 0..N_COLORS {
                                for b in 0..N_COLORS {
                                    block[sl * N_COLORS + a][sr * N_COLORS + b] +=
                                        sig * f.m[a][b] * coeff;
                                }
                            }
                        }
                    }
                }
            }
            site
        })
    }

    #[must_use]
    pub const fn geometry(&self) -> LatticeGeometry {
        self.geometry
    }

    /// True for a precomputed inverse.
    #[must_use]
    pub const fn is_inverse(&self) -> bool {
        self.inverse
    }

    /// Twist `a` of a twisted inverse, `None` otherwise.
    #[must_use]
    pub const fn twist(&self) -> Option<f64> {
        self.twist
    }

    /// Blocks of site `cb` in parity `p`.
    #[inline]
    #[must_use]
    pub fn site(&self, p: Parity, cb: usize) -> &CloverSite {
        &self.sites[p.index() * self.geometry.half_volume() + cb]
    }

    /// Precomputed `A⁻¹`.
    ///
    /// # Errors
    ///
    /// [`DiracError::Config`] if a block is singular or the field is already
    /// an inverse.
    pub fn inverse(&self) -> Result<Self> {
        self.invert_with_twist(0.0, None)
    }

    /// Precomputed `(A + i a γ5)⁻¹`.
    ///
    /// # Errors
    ///
    /// [`DiracError::Config`] if a block is singular or the field is already
    /// an inverse.
    pub fn twisted_inverse(&self, a: f64) -> Result<Self> {
        self.invert_with_twist(a, Some(a))
    }

    fn invert_with_twist(&self, a: f64, twist: Option<f64>) -> Result<Self> {
        if self.inverse {
            return Err(DiracError::config("clover field is already an inverse"));
        }
        let sites = self
            .sites
            .par_iter()
            .map(|site| -> Result<CloverSite> {
                let mut out = *site;
                for (chi, block) in out.iter_mut().enumerate() {
                    let shift = Complex64::new(0.0, chirality_sign(chi) * a);
                    let shifted = add_diagonal(&site[chi], shift);
                    *block = invert_complex(&shifted)
                        .ok_or_else(|| DiracError::config("singular clover block"))?;
                }
                Ok(out)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            geometry: self.geometry,
            sites,
            inverse: true,
            twist,
        })
    }

    /// `A ψ` (or `A† ψ` when `dagger`) at one site.
    #[inline]
    #[must_use]
    pub fn apply_site(&self, p: Parity, cb: usize, psi: &SpinColor, dagger: bool) -> SpinColor {
        let site = self.site(p, cb);
        let mut out = ZERO_SPINOR;
        for (chi, block) in site.iter().enumerate() {
            for sl in 0..2 {
                for a in 0..N_COLORS {
                    let row = sl * N_COLORS + a;
                    let mut acc = Complex64::ZERO;
                    for sr in 0..2 {
                        for b in 0..N_COLORS {
                            let col = sr * N_COLORS + b;
                            let v = psi[2 * chi + sr][b];
                            acc += if dagger {
                                block[col][row].conj_mul(v)
                            } else {
                                block[row][col] * v
                            };
                        }
                    }
                    out[2 * chi + sl][a] = acc;
                }
            }
        }
        out
    }
}

/// +1 for the upper chirality block, −1 for the lower.
#[inline]
#[must_use]
pub const fn chirality_sign(chi: usize) -> f64 {
    if chi == 0 {
        1.0
    } else {
        -1.0
    }
}

fn add_diagonal(block: &CloverBlock, d: Complex64) -> CloverBlock {
    let mut b = *block;
    for (i, row) in b.iter_mut().enumerate() {
        row[i] += d;
    }
    b
}

/// Clover-leaf field strength `F_μν(x) = −(i/4) · [Q − Q†]_traceless / 2`,
/// Hermitian and traceless.
fn field_strength(gauge: &GaugeField, x: [usize; 4], mu: usize, nu: usize) -> Su3Matrix {
    let g = gauge.geometry();
    let u = |y: [usize; 4], d: usize| gauge.link(y, d);
    let fwd = |y: [usize; 4], d: usize| g.neighbor(y, d, true);
    let bwd = |y: [usize; 4], d: usize| g.neighbor(y, d, false);

    let x_m = bwd(x, mu);
    let x_n = bwd(x, nu);
    let x_mn = bwd(x_m, nu);

    let leaf1 = u(x, mu) * u(fwd(x, mu), nu) * u(fwd(x, nu), mu).adjoint() * u(x, nu).adjoint();
    let leaf2 = u(x, nu) * u(fwd(x_m, nu), mu).adjoint() * u(x_m, nu).adjoint() * u(x_m, mu);
    let leaf3 = u(x_m, mu).adjoint() * u(x_mn, nu).adjoint() * u(x_mn, mu) * u(x_n, nu);
    let leaf4 = u(x_n, nu).adjoint() * u(x_n, mu) * u(fwd(x_n, mu), nu) * u(x, mu).adjoint();

    let q = leaf1 + leaf2 + leaf3 + leaf4;
    q.traceless_antihermitian()
        .scale_complex(Complex64::new(0.0, -0.25))
}
