// SPDX-License-Identifier: AGPL-3.0-only

//! Even-odd engine for Wilson-like kinds.
//!
//! With `p` the matpc parity and `q` the other one, the full operator
//!
//!   `M = | A_pp     −κ H_pq |`
//!       `| −κ H_qp   A_qq   |`
//!
//! reduces on parity `p` to
//!
//! - symmetric: `M̂ = 1 − κ² A_pp⁻¹ H_pq A_qq⁻¹ H_qp`
//! - asymmetric: `M̂ = A_pp − κ² H_pq A_qq⁻¹ H_qp`
//!
//! with the reduced source `b̂ = b_p + κ H_pq A_qq⁻¹ b_q` (left-multiplied
//! by `A_pp⁻¹` in the symmetric case) and the back-substitution
//! `x_q = A_qq⁻¹ (b_q + κ H_qp x_p)`.
//!
//! The daggered symmetric system solves for `y = A_pp† x_p`, so
//! [`Dirac::reconstruct`] applies `A_pp⁻†` to the reduced solution before
//! back-substituting.

use crate::error::Result;
use crate::field::blas;
use crate::field::spinor::{SiteSubset, SpinorView, SpinorViewMut};
use crate::lattice::geometry::Parity;

use super::param::MatPcType;
use super::scratch::Scratch;
use super::Dirac;

/// Reduced system returned by [`Dirac::prepare`]. Both views borrow the
/// caller's `x`/`b` storage.
#[derive(Debug)]
pub struct Prepared<'a> {
    /// Right-hand side of the system the operator solves.
    pub src: SpinorView<'a>,
    /// Where the solver writes its solution.
    pub sol: SpinorViewMut<'a>,
}

impl Dirac<'_> {
    /// `out = M in` on full fields.
    pub(crate) fn m_full(
        &self,
        out: &mut SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        dagger: bool,
        scratch: &mut Scratch<'_>,
    ) -> Result<u64> {
        let kappa = self.hop_scale();
        let half = inp.layout().with_subset(SiteSubset::Parity(Parity::Even));
        let (mut t, mut rest) = scratch.split(half);
        let mut fl = 0;
        for p in Parity::BOTH {
            let mut out_p = out.parity_mut(p)?;
            let in_p = inp.into_parity(p)?;
            fl += self.apply_hop(&mut out_p, inp.into_parity(p.opposite())?, dagger, &mut rest)?;
            if self.has_unit_local() {
                blas::axpby(1.0, in_p, -kappa, &mut out_p)?;
            } else {
                let mut a = t.view_mut().into_relabeled(p)?;
                fl += self.apply_local(&mut a, in_p, false, dagger)?;
                blas::axpby(1.0, a.as_view(), -kappa, &mut out_p)?;
            }
            fl += self.xpay_flops(out_p.layout());
        }
        Ok(fl)
    }

    /// `out = M̂ in` on the matpc parity.
    pub(crate) fn m_pc(
        &self,
        out: &mut SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        matpc: MatPcType,
        dagger: bool,
        scratch: &mut Scratch<'_>,
    ) -> Result<u64> {
        let p = matpc.parity();
        let q = p.opposite();
        let kappa2 = self.hop_scale() * self.hop_scale();
        let other = inp.layout().with_subset(SiteSubset::Parity(q));
        let (mut t1, mut rest) = scratch.split(other);
        let xpay = self.xpay_flops(inp.layout());

        if self.has_unit_local() {
            let mut fl = self.apply_hop(&mut t1.view_mut(), inp, dagger, &mut rest)?;
            fl += self.apply_hop(out, t1.view(), dagger, &mut rest)?;
            blas::axpby(1.0, inp, -kappa2, out)?;
            return Ok(fl + xpay);
        }

        let (mut t2, mut rest) = rest.split(other);
        let mut fl = 0;
        if matpc.is_symmetric() && dagger {
            // 1 − κ² H† A_qq⁻† H† A_pp⁻†
            let mut a = t1.view_mut().into_relabeled(p)?;
            fl += self.apply_local(&mut a, inp, true, true)?;
            fl += self.apply_hop(&mut t2.view_mut(), a.as_view(), true, &mut rest)?;
            fl += self.apply_local(&mut t1.view_mut(), t2.view(), true, true)?;
            fl += self.apply_hop(out, t1.view(), true, &mut rest)?;
            blas::axpby(1.0, inp, -kappa2, out)?;
            return Ok(fl + xpay);
        }

        fl += self.apply_hop(&mut t1.view_mut(), inp, dagger, &mut rest)?;
        fl += self.apply_local(&mut t2.view_mut(), t1.view(), true, dagger)?;
        let mut h = t1.view_mut().into_relabeled(p)?;
        fl += self.apply_hop(&mut h, t2.view(), dagger, &mut rest)?;
        if matpc.is_symmetric() {
            fl += self.apply_local(out, h.as_view(), true, false)?;
            blas::axpby(1.0, inp, -kappa2, out)?;
        } else {
            fl += self.apply_local(out, inp, false, dagger)?;
            blas::axpy(-kappa2, h.as_view(), out)?;
        }
        Ok(fl + xpay)
    }

    /// Fold full `b` into the reduced source, stored in the `q` half of `x`.
    pub(crate) fn prepare_pc<'f>(
        &self,
        x: SpinorViewMut<'f>,
        b: SpinorView<'f>,
        matpc: MatPcType,
        dagger: bool,
        scratch: &mut Scratch<'_>,
    ) -> Result<(Prepared<'f>, u64)> {
        let p = matpc.parity();
        let q = p.opposite();
        let kappa = self.hop_scale();
        let (sol, x_q) = x.into_split_by(p)?;
        let b_p = b.into_parity(p)?;
        let b_q = b.into_parity(q)?;
        let mut src = x_q.into_relabeled(p)?;

        let (mut t, mut rest) = scratch.split(*b_q.layout());
        let mut fl = if self.has_unit_local() {
            self.apply_hop(&mut src, b_q, dagger, &mut rest)?
        } else {
            let l = self.apply_local(&mut t.view_mut(), b_q, true, dagger)?;
            l + self.apply_hop(&mut src, t.view(), dagger, &mut rest)?
        };
        blas::axpby(1.0, b_p, kappa, &mut src)?;
        fl += self.xpay_flops(b_p.layout());

        if matpc.is_symmetric() && !dagger && !self.has_unit_local() {
            let mut t = t.view_mut().into_relabeled(p)?;
            t.copy_from(src.as_view())?;
            fl += self.apply_local(&mut src, t.as_view(), true, false)?;
        }
        Ok((
            Prepared {
                src: src.into_view(),
                sol,
            },
            fl,
        ))
    }

    /// Recover the `q` half of `x` from the reduced solution in its `p` half.
    pub(crate) fn reconstruct_pc(
        &self,
        x: SpinorViewMut<'_>,
        b: SpinorView<'_>,
        matpc: MatPcType,
        dagger: bool,
        scratch: &mut Scratch<'_>,
    ) -> Result<u64> {
        let p = matpc.parity();
        let q = p.opposite();
        let kappa = self.hop_scale();
        let (mut x_p, mut x_q) = x.into_split_by(p)?;
        let b_q = b.into_parity(q)?;
        let (mut t, mut rest) = scratch.split(*b_q.layout());
        let mut fl = 0;

        if matpc.is_symmetric() && dagger && !self.has_unit_local() {
            let mut y = t.view_mut().into_relabeled(p)?;
            y.copy_from(x_p.as_view())?;
            fl += self.apply_local(&mut x_p, y.as_view(), true, true)?;
        }

        if self.has_unit_local() {
            fl += self.apply_hop(&mut x_q, x_p.as_view(), dagger, &mut rest)?;
            blas::axpby(1.0, b_q, kappa, &mut x_q)?;
        } else {
            let mut h = t.view_mut();
            fl += self.apply_hop(&mut h, x_p.as_view(), dagger, &mut rest)?;
            blas::axpby(1.0, b_q, kappa, &mut h)?;
            fl += self.apply_local(&mut x_q, h.as_view(), true, dagger)?;
        }
        Ok(fl + self.xpay_flops(b_q.layout()))
    }
}
