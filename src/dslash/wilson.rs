// SPDX-License-Identifier: AGPL-3.0-only

//! Wilson hopping term.
//!
//!   `(H ψ)(x) = Σ_μ [(1 − γ_μ) U_μ(x) ψ(x+μ) + (1 + γ_μ) U_μ(x−μ)† ψ(x−μ)]`
//!
//! The daggered kernel swaps the two projectors, which gives `H† = γ5 H γ5`.
//! Hops that wrap the temporal extent pick up the gauge field's boundary
//! phase. For fields with a fifth dimension the 4D hop acts slice by slice;
//! [`hop_5d`] adds the fifth-dimension hop of the Shamir domain-wall
//! operator,
//!
//!   `(1 − γ5) ψ(s+1) + (1 + γ5) ψ(s−1)`
//!
//! with `−m_f` replacing the coupling across the walls at `s = 0, Ls−1`.
//!
//! # References
//!
//! - Wilson, in "New Phenomena in Subnuclear Physics" (1977)
//! - Shamir, Nucl. Phys. B406, 90 (1993)

use rayon::prelude::*;

use crate::error::{DiracError, Result};
use crate::field::gauge::GaugeField;
use crate::field::spinor::{load_site, store_site, Checkerboard, SpinorView, SpinorViewMut};
use crate::lattice::constants::{flops, N_DIM};
use crate::lattice::gamma::{project, project5, SpinColor, ZERO_SPINOR};

use super::{check_hop, parity_sites};

#[inline]
fn accumulate(acc: &mut SpinColor, v: &SpinColor, scale: f64) {
    for (a, b) in acc.iter_mut().zip(v.iter()) {
        for c in 0..3 {
            a[c] += b[c].scale(scale);
        }
    }
}

/// 4D hop of site `x` reading slice `s` of `inp`.
#[inline]
fn hop_site(
    gauge: &GaugeField,
    inp: &SpinorView<'_>,
    x: [usize; N_DIM],
    s: usize,
    dagger: bool,
) -> SpinColor {
    let g = gauge.geometry();
    let ns = inp.layout().n_spin;
    let sign = if dagger { 1.0 } else { -1.0 };
    let mut acc = ZERO_SPINOR;
    for mu in 0..N_DIM {
        let xf = g.neighbor(x, mu, true);
        let u = gauge.link(x, mu);
        let psi = load_site(inp.data(), inp.layout().site_offset(s, g.cb_index(xf)), ns);
        let mut w = ZERO_SPINOR;
        for (wi, pi) in w.iter_mut().zip(psi.iter()) {
            *wi = u.mul_vec(pi);
        }
        accumulate(&mut acc, &project(mu, sign, &w), gauge.hop_sign(x, mu, true, 1));

        let xb = g.neighbor(x, mu, false);
        let ub = gauge.link(xb, mu);
        let psi = load_site(inp.data(), inp.layout().site_offset(s, g.cb_index(xb)), ns);
        for (wi, pi) in w.iter_mut().zip(psi.iter()) {
            *wi = ub.adj_mul_vec(pi);
        }
        accumulate(&mut acc, &project(mu, -sign, &w), gauge.hop_sign(x, mu, false, 1));
    }
    acc
}

/// `out = H inp` (or `H† inp`), slice by slice. Returns flops.
///
/// # Errors
///
/// Parity or shape mismatch between `out` and `inp`.
pub fn hop(
    gauge: &GaugeField,
    out: &mut SpinorViewMut<'_>,
    inp: SpinorView<'_>,
    dagger: bool,
) -> Result<u64> {
    let layout = *out.layout();
    let p = check_hop("wilson_hop", &layout, inp.layout())?;
    let g = layout.geometry;
    let vh = g.half_volume();
    let sl = layout.site_len();
    out.data_mut()
        .par_chunks_mut(sl)
        .enumerate()
        .for_each(|(i, site)| {
            let (s, cb) = (i / vh, i % vh);
            let x = g.cb_coords(layout.slice_site_parity(p, s), cb);
            let v = hop_site(gauge, &inp, x, s, dagger);
            store_site(site, 0, layout.n_spin, &v);
        });
    Ok(flops::WILSON_DSLASH * parity_sites(&layout))
}

/// `out = H₅ inp` with `H₅` the 4D hop plus the fifth-dimension hop, on
/// 5D-checkerboarded fields. Returns flops.
///
/// # Errors
///
/// Parity or shape mismatch, or a 4D-checkerboarded field.
pub fn hop_5d(
    gauge: &GaugeField,
    out: &mut SpinorViewMut<'_>,
    inp: SpinorView<'_>,
    mass: f64,
    dagger: bool,
) -> Result<u64> {
    let layout = *out.layout();
    let p = check_hop("wilson_hop_5d", &layout, inp.layout())?;
    if layout.checkerboard != Checkerboard::FiveD {
        return Err(DiracError::ShapeMismatch(format!(
            "wilson_hop_5d needs a 5D checkerboard, got {layout}"
        )));
    }
    let g = layout.geometry;
    let ls = layout.ls;
    let vh = g.half_volume();
    let sl = layout.site_len();
    // (1 − γ5) couples to s+1 and (1 + γ5) to s−1; the dagger swaps them.
    let up_sign = if dagger { 1.0 } else { -1.0 };
    out.data_mut()
        .par_chunks_mut(sl)
        .enumerate()
        .for_each(|(i, site)| {
            let (s, cb) = (i / vh, i % vh);
            let x = g.cb_coords(layout.slice_site_parity(p, s), cb);
            let mut v = hop_site(gauge, &inp, x, s, dagger);

            let (s_up, w_up) = if s + 1 == ls { (0, -mass) } else { (s + 1, 1.0) };
            let (s_dn, w_dn) = if s == 0 { (ls - 1, -mass) } else { (s - 1, 1.0) };
            let up = load_site(inp.data(), layout.site_offset(s_up, cb), 4);
            let dn = load_site(inp.data(), layout.site_offset(s_dn, cb), 4);
            accumulate(&mut v, &project5(up_sign, &up), w_up);
            accumulate(&mut v, &project5(-up_sign, &dn), w_dn);

            store_site(site, 0, layout.n_spin, &v);
        });
    Ok((flops::WILSON_DSLASH + flops::DSLASH5) * parity_sites(&layout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::spinor::{FieldLayout, SiteSubset, SpinorField};
    use crate::lattice::complex_f64::Complex64;
    use crate::lattice::geometry::{LatticeGeometry, Parity};

    fn geom() -> LatticeGeometry {
        LatticeGeometry::new([4, 4, 2, 4]).unwrap()
    }

    fn gamma5_field(f: &SpinorField) -> SpinorField {
        let mut out = f.clone();
        for chunk in out.data_mut().chunks_mut(12) {
            for v in &mut chunk[6..] {
                *v = -*v;
            }
        }
        out
    }

    #[test]
    fn hop_is_gamma5_hermitian() {
        let g = geom();
        let u = GaugeField::hot_start(g, 3);
        let even = FieldLayout::wilson(g, SiteSubset::Parity(Parity::Even));
        let odd = even.with_subset(SiteSubset::Parity(Parity::Odd));
        let a = SpinorField::random(even, 1);
        let b = SpinorField::random(odd, 2);

        // <a, H_eo b> = <H†_oe a, b>
        let mut hb = SpinorField::zeros(even);
        hop(&u, &mut hb.view_mut(), b.view(), false).unwrap();
        let mut hda = SpinorField::zeros(odd);
        hop(&u, &mut hda.view_mut(), a.view(), true).unwrap();
        let lhs = a.dot(&hb).unwrap();
        let rhs = hda.dot(&b).unwrap();
        assert!((lhs - rhs).abs() < 1e-10 * lhs.abs().max(1.0), "{lhs} vs {rhs}");

        // H† = γ5 H γ5
        let mut h_g5b = SpinorField::zeros(even);
        hop(&u, &mut h_g5b.view_mut(), gamma5_field(&b).view(), false).unwrap();
        let g5_h_g5b = gamma5_field(&h_g5b);
        let mut hdb = SpinorField::zeros(even);
        hop(&u, &mut hdb.view_mut(), b.view(), true).unwrap();
        for (x, y) in g5_h_g5b.data().iter().zip(hdb.data()) {
            assert!((*x - *y).abs() < 1e-12);
        }
    }

    #[test]
    fn free_hop_of_constant_field() {
        // On unit links with periodic time, H applied to a constant spinor
        // gives Σ_μ [(1−γ_μ) + (1+γ_μ)] ψ = 8 ψ.
        let g = geom();
        let u = GaugeField::cold_start(g).with_boundary(crate::field::TimeBoundary::Periodic);
        let even = FieldLayout::wilson(g, SiteSubset::Parity(Parity::Even));
        let odd = even.with_subset(SiteSubset::Parity(Parity::Odd));
        let mut b = SpinorField::zeros(odd);
        for (k, v) in b.data_mut().iter_mut().enumerate() {
            *v = Complex64::new((k % 12) as f64, 1.0);
        }
        let mut out = SpinorField::zeros(even);
        let fl = hop(&u, &mut out.view_mut(), b.view(), false).unwrap();
        assert_eq!(fl, flops::WILSON_DSLASH * g.half_volume() as u64);
        for (o, i) in out.data().iter().zip(b.data()) {
            assert!((*o - i.scale(8.0)).abs() < 1e-12, "{o} vs {}", i.scale(8.0));
        }
    }

    #[test]
    fn five_d_hop_is_gamma5_reflection_hermitian() {
        // <a, H5 b> = <H5† a, b>
        let g = geom();
        let u = GaugeField::hot_start(g, 5);
        let even = FieldLayout::five_d(g, 4, Checkerboard::FiveD, SiteSubset::Parity(Parity::Even));
        let odd = even.with_subset(SiteSubset::Parity(Parity::Odd));
        let a = SpinorField::random(even, 1);
        let b = SpinorField::random(odd, 2);
        let mut hb = SpinorField::zeros(even);
        hop_5d(&u, &mut hb.view_mut(), b.view(), 0.05, false).unwrap();
        let mut hda = SpinorField::zeros(odd);
        hop_5d(&u, &mut hda.view_mut(), a.view(), 0.05, true).unwrap();
        let lhs = a.dot(&hb).unwrap();
        let rhs = hda.dot(&b).unwrap();
        assert!((lhs - rhs).abs() < 1e-10 * lhs.abs().max(1.0), "{lhs} vs {rhs}");
    }

    #[test]
    fn five_d_hop_rejects_four_d_layout() {
        let g = geom();
        let u = GaugeField::cold_start(g);
        let even = FieldLayout::five_d(g, 2, Checkerboard::FourD, SiteSubset::Parity(Parity::Even));
        let odd = even.with_subset(SiteSubset::Parity(Parity::Odd));
        let b = SpinorField::random(odd, 2);
        let mut out = SpinorField::zeros(even);
        assert!(hop_5d(&u, &mut out.view_mut(), b.view(), 0.1, false).is_err());
    }
}
