// SPDX-License-Identifier: AGPL-3.0-only

//! Staggered hopping term.
//!
//! The Kogut-Susskind operator acts on a color vector per site:
//!
//!   `(D ψ)(x) = Σ_μ η_μ(x) [F_μ(x) ψ(x+μ) − F_μ(x−μ)† ψ(x−μ)]`
//!   `         + Σ_μ η_μ(x) [L_μ(x) ψ(x+3μ) − L_μ(x−3μ)† ψ(x−3μ)]`
//!
//! where `η_μ(x) = (−1)^{x_0 + … + x_{μ−1}}` are the staggered phases. The
//! naive action uses the thin links `F = U` and no three-hop term; the
//! improved (asqtad/HISQ-style) action uses smeared fat links `F` and long
//! links `L`. `D` is anti-Hermitian, so the daggered kernel is `−D`.
//!
//! # References
//!
//! - Kogut & Susskind, PRD 11, 395 (1975)
//! - Orginos, Toussaint & Sugar, PRD 60, 054503 (1999)

use rayon::prelude::*;

use crate::error::Result;
use crate::field::gauge::GaugeField;
use crate::field::spinor::{SpinorView, SpinorViewMut};
use crate::lattice::complex_f64::Complex64;
use crate::lattice::constants::{flops, N_COLORS, N_DIM};
use crate::lattice::su3::ColorVector;

use super::{check_hop, parity_sites};

/// Links the staggered stencil hops through.
#[derive(Clone, Copy, Debug)]
pub struct StaggeredLinks<'a> {
    /// One-hop links (thin or fat).
    pub one_hop: &'a GaugeField,
    /// Three-hop links, improved action only.
    pub three_hop: Option<&'a GaugeField>,
}

/// `η_μ(x) = (−1)^{x_0 + … + x_{μ−1}}`
#[inline]
#[must_use]
pub fn staggered_phase(x: [usize; N_DIM], mu: usize) -> f64 {
    if x[..mu].iter().sum::<usize>() % 2 == 0 {
        1.0
    } else {
        -1.0
    }
}

#[inline]
fn add_scaled(acc: &mut ColorVector, v: &ColorVector, s: f64) {
    for c in 0..N_COLORS {
        acc[c] += v[c].scale(s);
    }
}

fn load(inp: &SpinorView<'_>, cb: usize) -> ColorVector {
    inp.load_color(0, cb)
}

/// `out = D inp` (or `−D inp` when `dagger`). Returns flops.
///
/// # Errors
///
/// Parity or shape mismatch between `out` and `inp`.
pub fn hop(
    links: StaggeredLinks<'_>,
    out: &mut SpinorViewMut<'_>,
    inp: SpinorView<'_>,
    dagger: bool,
) -> Result<u64> {
    let layout = *out.layout();
    let p = check_hop("staggered_hop", &layout, inp.layout())?;
    let g = layout.geometry;
    let overall = if dagger { -1.0 } else { 1.0 };
    let fat = links.one_hop;
    out.data_mut()
        .par_chunks_mut(N_COLORS)
        .enumerate()
        .for_each(|(cb, site)| {
            let x = g.cb_coords(p, cb);
            let mut acc = [Complex64::ZERO; N_COLORS];
            for mu in 0..N_DIM {
                let eta = overall * staggered_phase(x, mu);

                let xf = g.neighbor(x, mu, true);
                let fwd = fat.link(x, mu).mul_vec(&load(&inp, g.cb_index(xf)));
                add_scaled(&mut acc, &fwd, eta * fat.hop_sign(x, mu, true, 1));

                let xb = g.neighbor(x, mu, false);
                let bwd = fat.link(xb, mu).adj_mul_vec(&load(&inp, g.cb_index(xb)));
                add_scaled(&mut acc, &bwd, -eta * fat.hop_sign(x, mu, false, 1));

                if let Some(long) = links.three_hop {
                    let xf3 = g.shift(x, mu, true, 3);
                    let fwd = long.link(x, mu).mul_vec(&load(&inp, g.cb_index(xf3)));
                    add_scaled(&mut acc, &fwd, eta * long.hop_sign(x, mu, true, 3));

                    let xb3 = g.shift(x, mu, false, 3);
                    let bwd = long.link(xb3, mu).adj_mul_vec(&load(&inp, g.cb_index(xb3)));
                    add_scaled(&mut acc, &bwd, -eta * long.hop_sign(x, mu, false, 3));
                }
            }
            site.copy_from_slice(&acc);
        });
    let per_site = if links.three_hop.is_some() {
        flops::IMPROVED_STAGGERED_DSLASH
    } else {
        flops::STAGGERED_DSLASH
    };
    Ok(per_site * parity_sites(&layout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::spinor::{FieldLayout, SiteSubset, SpinorField};
    use crate::lattice::geometry::{LatticeGeometry, Parity};

    #[test]
    fn staggered_phases() {
        assert_eq!(staggered_phase([0, 0, 0, 0], 0), 1.0);
        assert_eq!(staggered_phase([1, 0, 0, 0], 1), -1.0);
        assert_eq!(staggered_phase([1, 1, 0, 0], 2), 1.0);
        assert_eq!(staggered_phase([1, 1, 1, 0], 3), -1.0);
    }

    fn check_anti_hermitian(links: StaggeredLinks<'_>, g: LatticeGeometry) {
        let even = FieldLayout::staggered(g, SiteSubset::Parity(Parity::Even));
        let odd = even.with_subset(SiteSubset::Parity(Parity::Odd));
        let a = SpinorField::random(even, 10);
        let b = SpinorField::random(odd, 11);

        // <a, D_eo b> = −<D_oe a, b>
        let mut db = SpinorField::zeros(even);
        hop(links, &mut db.view_mut(), b.view(), false).unwrap();
        let mut da = SpinorField::zeros(odd);
        hop(links, &mut da.view_mut(), a.view(), false).unwrap();
        let lhs = a.dot(&db).unwrap();
        let rhs = da.dot(&b).unwrap();
        assert!((lhs + rhs).abs() < 1e-10 * lhs.abs().max(1.0), "{lhs} vs −{rhs}");

        let mut ddb = SpinorField::zeros(even);
        hop(links, &mut ddb.view_mut(), b.view(), true).unwrap();
        for (x, y) in db.data().iter().zip(ddb.data()) {
            assert!((*x + *y).abs() < 1e-14);
        }
    }

    #[test]
    fn naive_hop_is_anti_hermitian() {
        let g = LatticeGeometry::new([4, 4, 4, 4]).unwrap();
        let u = GaugeField::hot_start(g, 21);
        check_anti_hermitian(
            StaggeredLinks {
                one_hop: &u,
                three_hop: None,
            },
            g,
        );
    }

    #[test]
    fn improved_hop_is_anti_hermitian() {
        let g = LatticeGeometry::new([4, 4, 4, 6]).unwrap();
        let fat = GaugeField::random_general(g, 1, 0.8, 0.2);
        let long = GaugeField::random_general(g, 2, -0.1, 0.05);
        let links = StaggeredLinks {
            one_hop: &fat,
            three_hop: Some(&long),
        };
        check_anti_hermitian(links, g);

        let even = FieldLayout::staggered(g, SiteSubset::Parity(Parity::Even));
        let b = SpinorField::random(even.with_subset(SiteSubset::Parity(Parity::Odd)), 3);
        let mut out = SpinorField::zeros(even);
        let fl = hop(links, &mut out.view_mut(), b.view(), false).unwrap();
        assert_eq!(fl, flops::IMPROVED_STAGGERED_DSLASH * g.half_volume() as u64);
    }
}
