// SPDX-License-Identifier: AGPL-3.0-only

//! Shamir domain-wall payloads.
//!
//! The 5D form treats the fifth dimension as part of the stencil: `A = 1`,
//! `H` the 4D hop plus the `(1 ∓ γ5)` fifth-dimension hop with `−m_f` at the
//! walls, on a 5D checkerboard. The 4D-preconditioned form moves the
//! fifth-dimension hop into the local term, `A = 1 − 2κ5 C` (see
//! [`crate::dslash::fifth_dim`]), leaving the per-slice 4D hop as `H`. Both
//! describe the same full matrix with `κ5 = 0.5/(5 + m5)`.

use crate::dslash::fifth_dim::{FifthDimOperator, FifthDimTerm};
use crate::dslash::wilson;
use crate::error::Result;
use crate::field::blas;
use crate::field::spinor::{SiteSubset, SpinorView, SpinorViewMut};
use crate::lattice::geometry::Parity;

use super::{Dirac, Variant};

/// 5D-checkerboarded domain wall.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DomainWallTerm {
    ls: usize,
    m5: f64,
    kappa5: f64,
}

impl DomainWallTerm {
    #[must_use]
    pub const fn new(ls: usize, m5: f64, kappa5: f64) -> Self {
        Self { ls, m5, kappa5 }
    }

    #[must_use]
    pub const fn ls(&self) -> usize {
        self.ls
    }

    #[must_use]
    pub const fn m5(&self) -> f64 {
        self.m5
    }

    #[must_use]
    pub const fn kappa5(&self) -> f64 {
        self.kappa5
    }
}

/// 4D-checkerboarded domain wall with the fifth dimension in the local term.
#[derive(Clone, Debug)]
pub struct DomainWall4dTerm {
    ls: usize,
    m5: f64,
    kappa5: f64,
    fifth: FifthDimOperator,
}

impl DomainWall4dTerm {
    /// # Errors
    ///
    /// [`crate::error::DiracError::Config`] if `1 − 2κ5 C` is singular.
    pub fn new(ls: usize, m5: f64, mass: f64, kappa5: f64) -> Result<Self> {
        Ok(Self {
            ls,
            m5,
            kappa5,
            fifth: FifthDimOperator::domain_wall(ls, mass, kappa5)?,
        })
    }

    pub(crate) fn set_mass(&mut self, mass: f64) -> Result<()> {
        self.fifth = FifthDimOperator::domain_wall(self.ls, mass, self.kappa5)?;
        Ok(())
    }

    #[must_use]
    pub const fn ls(&self) -> usize {
        self.ls
    }

    #[must_use]
    pub const fn m5(&self) -> f64 {
        self.m5
    }

    #[must_use]
    pub const fn kappa5(&self) -> f64 {
        self.kappa5
    }

    #[must_use]
    pub const fn fifth(&self) -> &FifthDimOperator {
        &self.fifth
    }
}

impl Dirac<'_> {
    /// `κ5` of domain-wall kinds.
    #[must_use]
    pub const fn kappa5(&self) -> Option<f64> {
        match self.variant() {
            Variant::DomainWall(_) | Variant::DomainWall4d(_) | Variant::Mobius(_) => {
                Some(self.hop_scale())
            }
            _ => None,
        }
    }

    fn fifth_dim(&self, operation: &'static str) -> Result<&FifthDimOperator> {
        match self.variant() {
            Variant::DomainWall4d(d) => Ok(d.fifth()),
            Variant::Mobius(m) => Ok(m.fifth()),
            _ => Err(self.not_implemented(operation)),
        }
    }

    fn check_same_parity(
        &self,
        operation: &'static str,
        out: &SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        parity: Parity,
    ) -> Result<()> {
        let subset = SiteSubset::Parity(parity);
        self.check_operand(operation, out.layout(), subset)?;
        self.check_operand(operation, inp.layout(), subset)
    }

    /// Per-slice 4D Wilson hop into parity `parity` (no Mobius pre-hop).
    ///
    /// # Errors
    ///
    /// [`crate::error::DiracError::NotImplemented`] for kinds without a
    /// 4D-split fifth dimension, otherwise parity or shape mismatch.
    pub fn dslash4(
        &self,
        mut out: SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        parity: Parity,
    ) -> Result<()> {
        self.fifth_dim("dslash4")?;
        self.check_operand("dslash4", out.layout(), SiteSubset::Parity(parity))?;
        self.check_operand("dslash4", inp.layout(), SiteSubset::Parity(parity.opposite()))?;
        let fl = wilson::hop(self.gauge(), &mut out, inp, self.dagger().is_yes())?;
        self.add_flops(fl);
        Ok(())
    }

    /// `out = dslash4(in) + k·x`
    ///
    /// # Errors
    ///
    /// As [`Self::dslash4`].
    pub fn dslash4_xpay(
        &self,
        mut out: SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        parity: Parity,
        x: SpinorView<'_>,
        k: f64,
    ) -> Result<()> {
        self.fifth_dim("dslash4_xpay")?;
        self.check_operand("dslash4_xpay", out.layout(), SiteSubset::Parity(parity))?;
        self.check_operand("dslash4_xpay", inp.layout(), SiteSubset::Parity(parity.opposite()))?;
        self.check_operand("dslash4_xpay", x.layout(), SiteSubset::Parity(parity))?;
        let fl = wilson::hop(self.gauge(), &mut out, inp, self.dagger().is_yes())?;
        blas::axpy(k, x, &mut out)?;
        self.add_flops(fl + self.xpay_flops(out.layout()));
        Ok(())
    }

    /// Fifth-dimension local term `A` on parity `parity`.
    ///
    /// # Errors
    ///
    /// As [`Self::dslash4`].
    pub fn dslash5(
        &self,
        mut out: SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        parity: Parity,
    ) -> Result<()> {
        let fifth = self.fifth_dim("dslash5")?;
        self.check_same_parity("dslash5", &out, inp, parity)?;
        let fl = fifth.apply(FifthDimTerm::Local, &mut out, inp, self.dagger().is_yes())?;
        self.add_flops(fl);
        Ok(())
    }

    /// `out = dslash5(in) + k·x`
    ///
    /// # Errors
    ///
    /// As [`Self::dslash4`].
    pub fn dslash5_xpay(
        &self,
        mut out: SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        parity: Parity,
        x: SpinorView<'_>,
        k: f64,
    ) -> Result<()> {
        let fifth = self.fifth_dim("dslash5_xpay")?;
        self.check_same_parity("dslash5_xpay", &out, inp, parity)?;
        self.check_operand("dslash5_xpay", x.layout(), SiteSubset::Parity(parity))?;
        let fl = fifth.apply(FifthDimTerm::Local, &mut out, inp, self.dagger().is_yes())?;
        blas::axpy(k, x, &mut out)?;
        self.add_flops(fl + self.xpay_flops(out.layout()));
        Ok(())
    }

    /// Inverse of [`Self::dslash5`].
    ///
    /// # Errors
    ///
    /// As [`Self::dslash4`].
    pub fn dslash5inv(
        &self,
        mut out: SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        parity: Parity,
    ) -> Result<()> {
        let fifth = self.fifth_dim("dslash5inv")?;
        self.check_same_parity("dslash5inv", &out, inp, parity)?;
        let fl = fifth.apply(FifthDimTerm::LocalInverse, &mut out, inp, self.dagger().is_yes())?;
        self.add_flops(fl);
        Ok(())
    }

    /// Mobius pre-hop `b + c C` on parity `parity`.
    ///
    /// # Errors
    ///
    /// [`crate::error::DiracError::NotImplemented`] for kinds other than
    /// Mobius, otherwise parity or shape mismatch.
    pub fn dslash4pre(
        &self,
        mut out: SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        parity: Parity,
    ) -> Result<()> {
        let Variant::Mobius(m) = self.variant() else {
            return Err(self.not_implemented("dslash4pre"));
        };
        self.check_same_parity("dslash4pre", &out, inp, parity)?;
        let fl = m.fifth().apply(FifthDimTerm::Pre, &mut out, inp, self.dagger().is_yes())?;
        self.add_flops(fl);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dirac::{DiracKind, DiracParam, MatPcType};
    use crate::field::gauge::GaugeField;
    use crate::field::spinor::SpinorField;
    use crate::lattice::geometry::LatticeGeometry;

    fn dw4d(u: &GaugeField, mass: f64) -> Dirac<'_> {
        Dirac::create(&DiracParam {
            ls: 6,
            m5: -1.6,
            mass,
            matpc: Some(MatPcType::EvenEven),
            ..DiracParam::new(DiracKind::DomainWall4dPc, u)
        })
        .unwrap()
    }

    #[test]
    fn kappa5_from_m5() {
        let u = GaugeField::cold_start(LatticeGeometry::new([2, 2, 2, 2]).unwrap());
        let d = dw4d(&u, 0.05);
        let k5 = d.kappa5().unwrap();
        assert!((k5 - 0.5 / 3.4).abs() < 1e-15, "kappa5={k5}");
        let w = Dirac::create(&DiracParam::new(DiracKind::Wilson, &u)).unwrap();
        assert_eq!(w.kappa5(), None);
    }

    #[test]
    fn dslash5_inverse_round_trip() {
        let u = GaugeField::hot_start(LatticeGeometry::new([2, 2, 2, 4]).unwrap(), 2);
        let mut d = dw4d(&u, 0.05);
        let layout = d.field_layout(SiteSubset::Parity(Parity::Odd));
        let psi = SpinorField::random(layout, 5);
        for dagger in [false, true] {
            d.set_dagger(dagger.into());
            let mut a = SpinorField::zeros(layout);
            let mut back = SpinorField::zeros(layout);
            d.dslash5(a.view_mut(), psi.view(), Parity::Odd).unwrap();
            d.dslash5inv(back.view_mut(), a.view(), Parity::Odd).unwrap();
            for (x, y) in back.data().iter().zip(psi.data()) {
                assert!((*x - *y).abs() < 1e-12, "dagger={dagger}: {x} vs {y}");
            }
        }
    }

    #[test]
    fn set_mass_rebuilds_walls() {
        let u = GaugeField::cold_start(LatticeGeometry::new([2, 2, 2, 2]).unwrap());
        let mut d = dw4d(&u, 0.0);
        let layout = d.field_layout(SiteSubset::Parity(Parity::Even));
        let psi = SpinorField::random(layout, 8);
        let mut before = SpinorField::zeros(layout);
        d.dslash5(before.view_mut(), psi.view(), Parity::Even).unwrap();
        d.set_mass(0.2).unwrap();
        assert_eq!(d.mass(), 0.2);
        let mut after = SpinorField::zeros(layout);
        d.dslash5(after.view_mut(), psi.view(), Parity::Even).unwrap();
        let diff: f64 = before
            .data()
            .iter()
            .zip(after.data())
            .map(|(a, b)| (*a - *b).abs_sq())
            .sum();
        assert!(diff > 1e-6, "mass change had no effect: {diff}");
    }

    #[test]
    fn dslash4_xpay_adds_scaled_field() {
        let u = GaugeField::hot_start(LatticeGeometry::new([2, 2, 2, 4]).unwrap(), 6);
        let d = dw4d(&u, 0.1);
        let even = d.field_layout(SiteSubset::Parity(Parity::Even));
        let odd = d.field_layout(SiteSubset::Parity(Parity::Odd));
        let inp = SpinorField::random(odd, 1);
        let x = SpinorField::random(even, 2);
        let mut plain = SpinorField::zeros(even);
        let mut fused = SpinorField::zeros(even);
        d.dslash4(plain.view_mut(), inp.view(), Parity::Even).unwrap();
        d.dslash4_xpay(fused.view_mut(), inp.view(), Parity::Even, x.view(), -0.3)
            .unwrap();
        for ((f, p), xv) in fused.data().iter().zip(plain.data()).zip(x.data()) {
            assert!((*f - (*p + xv.scale(-0.3))).abs() < 1e-13, "{f} vs {p}");
        }
    }

    #[test]
    fn five_d_kind_has_no_split_operators() {
        let u = GaugeField::cold_start(LatticeGeometry::new([2, 2, 2, 2]).unwrap());
        let d = Dirac::create(&DiracParam {
            ls: 4,
            m5: -1.8,
            ..DiracParam::new(DiracKind::DomainWall, &u)
        })
        .unwrap();
        let layout = d.field_layout(SiteSubset::Parity(Parity::Even));
        let psi = SpinorField::random(layout, 1);
        let mut out = SpinorField::zeros(layout);
        let err = d.dslash5(out.view_mut(), psi.view(), Parity::Even).unwrap_err();
        assert!(err.is_not_implemented(), "{err}");
        assert!(d
            .dslash4pre(out.view_mut(), psi.view(), Parity::Even)
            .unwrap_err()
            .is_not_implemented());
    }
}
