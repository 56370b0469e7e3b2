// SPDX-License-Identifier: AGPL-3.0-only

//! Naive and improved staggered payloads.
//!
//! `M = 2m + D` with `D` anti-Hermitian and connecting only opposite
//! parities. Eliminating the other parity gives the Hermitian positive
//! definite reduced operator `M̂ = 4m² − D_pq D_qp`, reduced source
//! `b̂ = 2m b_p − D_pq b_q` and back-substitution
//! `x_q = (b_q − D_qp x_p) / 2m`. The symmetric/asymmetric distinction of
//! the matpc type does not apply; only its parity is used.

use crate::dslash::staggered::{self as kernel, StaggeredLinks};
use crate::error::{DiracError, Result};
use crate::field::blas;
use crate::field::gauge::GaugeField;
use crate::field::spinor::{SiteSubset, SpinorView, SpinorViewMut};
use crate::lattice::constants::LATTICE_DIVISION_GUARD;
use crate::lattice::geometry::Parity;

use super::even_odd::Prepared;
use super::scratch::Scratch;
use super::Dirac;

#[derive(Clone, Copy, Debug)]
pub struct StaggeredTerm<'a> {
    links: StaggeredLinks<'a>,
}

impl<'a> StaggeredTerm<'a> {
    /// One-hop action through `links` (thin or fat).
    #[must_use]
    pub const fn naive(links: &'a GaugeField) -> Self {
        Self {
            links: StaggeredLinks {
                one_hop: links,
                three_hop: None,
            },
        }
    }

    /// Fat one-hop plus long three-hop links.
    #[must_use]
    pub const fn improved(fat: &'a GaugeField, long: &'a GaugeField) -> Self {
        Self {
            links: StaggeredLinks {
                one_hop: fat,
                three_hop: Some(long),
            },
        }
    }

    #[must_use]
    pub const fn links(&self) -> StaggeredLinks<'a> {
        self.links
    }

    #[must_use]
    pub const fn is_improved(&self) -> bool {
        self.links.three_hop.is_some()
    }
}

impl Dirac<'_> {
    fn require_mass(&self, operation: &str) -> Result<f64> {
        let m = self.mass();
        if m.abs() < LATTICE_DIVISION_GUARD {
            return Err(DiracError::config(format!(
                "staggered {operation} divides by the mass, which is zero"
            )));
        }
        Ok(m)
    }

    pub(crate) fn staggered_m_full(
        &self,
        out: &mut SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        dagger: bool,
    ) -> Result<u64> {
        let links = self.staggered_links()?;
        let two_m = 2.0 * self.mass();
        let mut fl = 0;
        for p in Parity::BOTH {
            let mut out_p = out.parity_mut(p)?;
            fl += kernel::hop(links, &mut out_p, inp.into_parity(p.opposite())?, dagger)?;
            blas::axpby(two_m, inp.into_parity(p)?, 1.0, &mut out_p)?;
            fl += self.xpay_flops(out_p.layout());
        }
        Ok(fl)
    }

    pub(crate) fn staggered_m_pc(
        &self,
        out: &mut SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        p: Parity,
        dagger: bool,
        scratch: &mut Scratch<'_>,
    ) -> Result<u64> {
        let links = self.staggered_links()?;
        let m = self.mass();
        let (mut t, _) = scratch.split(inp.layout().with_subset(SiteSubset::Parity(p.opposite())));
        let mut fl = kernel::hop(links, &mut t.view_mut(), inp, dagger)?;
        fl += kernel::hop(links, out, t.view(), dagger)?;
        blas::axpby(4.0 * m * m, inp, -1.0, out)?;
        Ok(fl + self.xpay_flops(inp.layout()))
    }

    pub(crate) fn staggered_prepare<'f>(
        &self,
        x: SpinorViewMut<'f>,
        b: SpinorView<'f>,
        p: Parity,
        dagger: bool,
    ) -> Result<(Prepared<'f>, u64)> {
        let m = self.require_mass("prepare")?;
        let links = self.staggered_links()?;
        let (sol, x_q) = x.into_split_by(p)?;
        let mut src = x_q.into_relabeled(p)?;
        let b_p = b.into_parity(p)?;
        let fl = kernel::hop(links, &mut src, b.into_parity(p.opposite())?, dagger)?;
        blas::axpby(2.0 * m, b_p, -1.0, &mut src)?;
        let fl = fl + self.xpay_flops(b_p.layout());
        Ok((
            Prepared {
                src: src.into_view(),
                sol,
            },
            fl,
        ))
    }

    pub(crate) fn staggered_reconstruct(
        &self,
        x: SpinorViewMut<'_>,
        b: SpinorView<'_>,
        p: Parity,
        dagger: bool,
    ) -> Result<u64> {
        let m = self.require_mass("reconstruct")?;
        let links = self.staggered_links()?;
        let (x_p, mut x_q) = x.into_split_by(p)?;
        let b_q = b.into_parity(p.opposite())?;
        let fl = kernel::hop(links, &mut x_q, x_p.as_view(), dagger)?;
        let inv = 0.5 / m;
        blas::axpby(inv, b_q, -inv, &mut x_q)?;
        Ok(fl + self.xpay_flops(b_q.layout()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dirac::{DiracKind, DiracParam, MatPcType, SolutionType};
    use crate::field::spinor::SpinorField;
    use crate::lattice::geometry::LatticeGeometry;

    fn geom() -> LatticeGeometry {
        LatticeGeometry::new([4, 4, 4, 4]).unwrap()
    }

    #[test]
    fn reduced_system_matches_full() {
        let u = GaugeField::hot_start(geom(), 21);
        let long = GaugeField::hot_start(geom(), 22);
        for kind in [DiracKind::StaggeredPc, DiracKind::ImprovedStaggeredPc] {
            let param = DiracParam {
                mass: 0.07,
                matpc: Some(MatPcType::OddOdd),
                fat_gauge: Some(&u),
                long_gauge: Some(&long),
                ..DiracParam::new(kind, &u)
            };
            let pc = Dirac::create(&param).unwrap();
            let full_kind = if kind == DiracKind::StaggeredPc {
                DiracKind::Staggered
            } else {
                DiracKind::ImprovedStaggered
            };
            let full = Dirac::create(&DiracParam {
                kind: full_kind,
                ..param.clone()
            })
            .unwrap();

            let layout = full.field_layout(SiteSubset::Full);
            let x = SpinorField::random(layout, 3);
            let mut b = SpinorField::zeros(layout);
            full.m(b.view_mut(), x.view(), &mut Scratch::none()).unwrap();

            let mut work = SpinorField::zeros(layout);
            let src = {
                let prep = pc
                    .prepare(work.view_mut(), b.view(), SolutionType::Mat, &mut Scratch::none())
                    .unwrap();
                prep.src.data().to_vec()
            };
            let x_p = x.view().into_parity(Parity::Odd).unwrap();
            let mut mx = SpinorField::zeros(*x_p.layout());
            pc.m(mx.view_mut(), x_p, &mut Scratch::none()).unwrap();
            let err: f64 = mx.data().iter().zip(&src).map(|(a, s)| (*a - *s).abs_sq()).sum();
            assert!(err < 1e-20 * mx.norm2(), "{kind:?}: reduced residual {err}");

            work.view_mut().parity_mut(Parity::Odd).unwrap().copy_from(x_p).unwrap();
            pc.reconstruct(work.view_mut(), b.view(), SolutionType::Mat, &mut Scratch::none())
                .unwrap();
            let diff: f64 = work.data().iter().zip(x.data()).map(|(a, c)| (*a - *c).abs_sq()).sum();
            assert!(diff < 1e-20 * x.norm2(), "{kind:?}: reconstruction error {diff}");
        }
    }

    #[test]
    fn massless_prepare_is_rejected() {
        let u = GaugeField::cold_start(geom());
        let pc = Dirac::create(&DiracParam {
            matpc: Some(MatPcType::EvenEven),
            ..DiracParam::new(DiracKind::StaggeredPc, &u)
        })
        .unwrap();
        let layout = pc.field_layout(SiteSubset::Full);
        let b = SpinorField::random(layout, 1);
        let mut x = SpinorField::zeros(layout);
        let err = pc
            .prepare(x.view_mut(), b.view(), SolutionType::Mat, &mut Scratch::none())
            .unwrap_err();
        assert!(matches!(err, DiracError::Config(_)), "{err}");
    }

    #[test]
    fn reduced_operator_is_hermitian_positive() {
        let u = GaugeField::hot_start(geom(), 5);
        let pc = Dirac::create(&DiracParam {
            mass: 0.1,
            matpc: Some(MatPcType::EvenEven),
            ..DiracParam::new(DiracKind::StaggeredPc, &u)
        })
        .unwrap();
        let layout = pc.field_layout(SiteSubset::Parity(Parity::Even));
        let x = SpinorField::random(layout, 1);
        let y = SpinorField::random(layout, 2);
        let mut mx = SpinorField::zeros(layout);
        let mut my = SpinorField::zeros(layout);
        pc.m(mx.view_mut(), x.view(), &mut Scratch::none()).unwrap();
        pc.m(my.view_mut(), y.view(), &mut Scratch::none()).unwrap();
        let a = x.dot(&my).unwrap();
        let b = mx.dot(&y).unwrap();
        assert!((a - b).abs() < 1e-10 * a.abs(), "{a} vs {b}");
        let xmx = x.dot(&mx).unwrap();
        assert!(xmx.re >= 0.04 * x.norm2() * (1.0 - 1e-12), "<x,Mx>={xmx}");
        assert!(xmx.im.abs() < 1e-10 * xmx.re, "<x,Mx>={xmx}");
    }
}
