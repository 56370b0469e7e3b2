// SPDX-License-Identifier: AGPL-3.0-only

//! Site-local clover multiply, optionally with a twist.
//!
//!   `out = (A + i a γ5) inp`   (dagger: `(A† − i a γ5) inp`)
//!
//! `A` may be the clover term itself or a stored inverse; for a stored
//! twisted inverse the twist is already folded in and `a` must be zero.

use rayon::prelude::*;

use crate::error::Result;
use crate::field::clover::CloverField;
use crate::field::spinor::{load_site, store_site, SpinorView, SpinorViewMut};
use crate::lattice::constants::flops;
use crate::lattice::gamma::GAMMA5;

use super::{check_local, parity_sites};

/// `out = (A + i·twist·γ5) inp` on one parity. Returns flops.
///
/// # Errors
///
/// Parity or shape mismatch between `out` and `inp`.
pub fn apply(
    clover: &CloverField,
    out: &mut SpinorViewMut<'_>,
    inp: SpinorView<'_>,
    twist: f64,
    dagger: bool,
) -> Result<u64> {
    let layout = *out.layout();
    let p = check_local("clover", &layout, inp.layout())?;
    let vh = layout.geometry.half_volume();
    let sl = layout.site_len();
    let tw = if dagger { -twist } else { twist };
    out.data_mut()
        .par_chunks_mut(sl)
        .enumerate()
        .for_each(|(i, site)| {
            let psi = load_site(inp.data(), i * sl, layout.n_spin);
            let mut v = clover.apply_site(p, i % vh, &psi, dagger);
            if tw != 0.0 {
                let g5 = GAMMA5.apply(&psi);
                for (vs, gs) in v.iter_mut().zip(g5.iter()) {
                    for c in 0..3 {
                        vs[c] += gs[c].mul_i().scale(tw);
                    }
                }
            }
            store_site(site, 0, layout.n_spin, &v);
        });
    let extra = if twist == 0.0 { 0 } else { flops::TWIST };
    Ok((flops::CLOVER + extra) * parity_sites(&layout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::gauge::GaugeField;
    use crate::field::spinor::{FieldLayout, SiteSubset, SpinorField};
    use crate::lattice::geometry::{LatticeGeometry, Parity};

    #[test]
    fn twisted_clover_and_twisted_inverse_cancel() {
        let g = LatticeGeometry::new([4, 4, 2, 2]).unwrap();
        let u = GaugeField::near_identity(g, 4, 0.5);
        let a = CloverField::from_gauge(&u, 0.12, 1.1);
        let inv = a.twisted_inverse(0.25).unwrap();
        let odd = FieldLayout::wilson(g, SiteSubset::Parity(Parity::Odd));
        let psi = SpinorField::random(odd, 8);

        for dagger in [false, true] {
            let mut t = SpinorField::zeros(odd);
            apply(&a, &mut t.view_mut(), psi.view(), 0.25, dagger).unwrap();
            let mut back = SpinorField::zeros(odd);
            apply(&inv, &mut back.view_mut(), t.view(), 0.0, dagger).unwrap();
            for (x, y) in back.data().iter().zip(psi.data()) {
                assert!((*x - *y).abs() < 1e-12, "dagger={dagger}: {x} vs {y}");
            }
        }
    }
}
