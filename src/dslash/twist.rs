// SPDX-License-Identifier: AGPL-3.0-only

//! Twisted-mass local term.
//!
//! Singlet (`ls = 1`): `T = 1 + i a γ5`. Doublet (`ls = 2`, flavor index in
//! the slice position): `T = 1 + i a γ5 τ3 + b τ1`. With `X = T − 1`,
//! `X² = b² − a²`, so
//!
//!   `T⁻¹ = (1 − X) / (1 + a² − b²)`
//!
//! and `T† = 1 − i a γ5 τ3 + b τ1`, which is `T` with `a → −a`.

use rayon::prelude::*;

use crate::error::{DiracError, Result};
use crate::field::spinor::{load_site, store_site, SpinorView, SpinorViewMut};
use crate::lattice::constants::{flops, LATTICE_DIVISION_GUARD};
use crate::lattice::gamma::GAMMA5;

use super::{check_local, parity_sites};

/// Parameters of the local twist.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Twist {
    /// Coefficient of `i γ5 (τ3)`.
    pub a: f64,
    /// Flavor-mixing coefficient of `τ1`, doublets only.
    pub b: f64,
}

impl Twist {
    /// `1 + a² − b²`; the inverse divides by it.
    #[must_use]
    pub fn denominator(&self) -> f64 {
        self.b.mul_add(-self.b, self.a.mul_add(self.a, 1.0))
    }
}

/// `out = T inp`, `T⁻¹ inp`, or their adjoints, on one parity. Returns flops.
///
/// # Errors
///
/// Parity or shape mismatch, `ls` other than 1 or 2, a flavor-mixing `b`
/// on a singlet, or a singular inverse.
pub fn apply(
    out: &mut SpinorViewMut<'_>,
    inp: SpinorView<'_>,
    twist: Twist,
    inverse: bool,
    dagger: bool,
) -> Result<u64> {
    let layout = *out.layout();
    check_local("twist", &layout, inp.layout())?;
    let doublet = match layout.ls {
        1 if twist.b == 0.0 => false,
        1 => return Err(DiracError::config("flavor twist b needs a doublet field (ls = 2)")),
        2 => true,
        n => {
            return Err(DiracError::ShapeMismatch(format!(
                "twist needs ls 1 or 2, got {n}"
            )))
        }
    };
    let denom = twist.denominator();
    if inverse && denom.abs() < LATTICE_DIVISION_GUARD {
        return Err(DiracError::config(format!(
            "twist is singular: a={} b={}",
            twist.a, twist.b
        )));
    }
    let a = if dagger { -twist.a } else { twist.a };
    let (sign, norm) = if inverse { (-1.0, 1.0 / denom) } else { (1.0, 1.0) };
    let vh = layout.geometry.half_volume();
    let sl = layout.site_len();

    out.data_mut()
        .par_chunks_mut(sl)
        .enumerate()
        .for_each(|(i, site)| {
            let (flavor, cb) = (i / vh, i % vh);
            let psi = load_site(inp.data(), i * sl, layout.n_spin);
            let g5 = GAMMA5.apply(&psi);
            // τ3 eigenvalue of this flavor
            let t3 = if flavor == 0 { 1.0 } else { -1.0 };
            let other = doublet.then(|| {
                load_site(inp.data(), layout.site_offset(1 - flavor, cb), layout.n_spin)
            });
            let mut v = psi;
            for s in 0..4 {
                for c in 0..3 {
                    let mut x = g5[s][c].mul_i().scale(a * t3);
                    if let Some(o) = &other {
                        x += o[s][c].scale(twist.b);
                    }
                    v[s][c] = (psi[s][c] + x.scale(sign)).scale(norm);
                }
            }
            store_site(site, 0, layout.n_spin, &v);
        });
    Ok(if doublet {
        flops::TWIST_DOUBLET * layout.geometry.half_volume() as u64
    } else {
        flops::TWIST * parity_sites(&layout)
    })
}
