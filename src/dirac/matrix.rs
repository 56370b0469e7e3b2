// SPDX-License-Identifier: AGPL-3.0-only

//! Solver-facing views of an operator.
//!
//! A solver only needs "apply the matrix": [`DiracM`] applies `M`,
//! [`DiracMdag`] applies `M†`, and [`DiracMdagM`]/[`DiracMMdag`] apply the
//! normal operators with an optional diagonal shift `σ`, e.g. for multi-shift
//! solvers or deflation. Functors borrow the operator; they never own it.

use crate::error::Result;
use crate::field::blas;
use crate::field::spinor::{SpinorField, SpinorView, SpinorViewMut};

use super::param::{DiracKind, MatPcType};
use super::scratch::Scratch;
use super::Dirac;

/// A linear operator on quark fields backed by a [`Dirac`].
pub trait DiracMatrix {
    /// Apply with whatever temporaries `scratch` lends.
    ///
    /// # Errors
    ///
    /// Whatever the underlying operator reports.
    fn apply_scratch(
        &self,
        out: SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        scratch: &mut Scratch<'_>,
    ) -> Result<()>;

    /// The wrapped operator.
    fn expose(&self) -> &Dirac<'_>;

    /// Apply, allocating any temporaries.
    ///
    /// # Errors
    ///
    /// As [`Self::apply_scratch`].
    fn apply(&self, out: SpinorViewMut<'_>, inp: SpinorView<'_>) -> Result<()> {
        self.apply_scratch(out, inp, &mut Scratch::none())
    }

    /// Apply with one caller temporary.
    ///
    /// # Errors
    ///
    /// As [`Self::apply_scratch`].
    fn apply_with_tmp(
        &self,
        out: SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        tmp: &mut SpinorField,
    ) -> Result<()> {
        self.apply_scratch(out, inp, &mut Scratch::one(tmp))
    }

    /// Apply with two caller temporaries.
    ///
    /// # Errors
    ///
    /// As [`Self::apply_scratch`].
    fn apply_with_tmps(
        &self,
        out: SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        tmp1: &mut SpinorField,
        tmp2: &mut SpinorField,
    ) -> Result<()> {
        self.apply_scratch(out, inp, &mut Scratch::two(tmp1, tmp2))
    }

    /// Flops of the wrapped operator since its last read; resets the count.
    fn flops(&self) -> u64 {
        self.expose().flops()
    }

    fn matpc_type(&self) -> Option<MatPcType> {
        self.expose().matpc_type()
    }

    fn kind(&self) -> DiracKind {
        self.expose().kind()
    }

    fn is_staggered(&self) -> bool {
        self.kind().is_staggered()
    }
}

/// `M`
#[derive(Clone, Copy, Debug)]
pub struct DiracM<'a> {
    dirac: &'a Dirac<'a>,
}

impl<'a> DiracM<'a> {
    #[must_use]
    pub const fn new(dirac: &'a Dirac<'a>) -> Self {
        Self { dirac }
    }
}

impl DiracMatrix for DiracM<'_> {
    fn apply_scratch(
        &self,
        out: SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        scratch: &mut Scratch<'_>,
    ) -> Result<()> {
        self.dirac.m(out, inp, scratch)
    }

    fn expose(&self) -> &Dirac<'_> {
        self.dirac
    }
}

/// `M†`
#[derive(Clone, Copy, Debug)]
pub struct DiracMdag<'a> {
    dirac: &'a Dirac<'a>,
}

impl<'a> DiracMdag<'a> {
    #[must_use]
    pub const fn new(dirac: &'a Dirac<'a>) -> Self {
        Self { dirac }
    }
}

impl DiracMatrix for DiracMdag<'_> {
    fn apply_scratch(
        &self,
        out: SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        scratch: &mut Scratch<'_>,
    ) -> Result<()> {
        self.dirac.mdag(out, inp, scratch)
    }

    fn expose(&self) -> &Dirac<'_> {
        self.dirac
    }
}

/// `M†M + σ`
#[derive(Clone, Copy, Debug)]
pub struct DiracMdagM<'a> {
    dirac: &'a Dirac<'a>,
    /// Diagonal shift `σ`.
    pub shift: f64,
}

impl<'a> DiracMdagM<'a> {
    #[must_use]
    pub const fn new(dirac: &'a Dirac<'a>) -> Self {
        Self { dirac, shift: 0.0 }
    }

    #[must_use]
    pub const fn with_shift(dirac: &'a Dirac<'a>, shift: f64) -> Self {
        Self { dirac, shift }
    }
}

impl DiracMatrix for DiracMdagM<'_> {
    fn apply_scratch(
        &self,
        mut out: SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        scratch: &mut Scratch<'_>,
    ) -> Result<()> {
        self.dirac.mdag_m(out.reborrow(), inp, scratch)?;
        apply_shift(self.shift, inp, &mut out)
    }

    fn expose(&self) -> &Dirac<'_> {
        self.dirac
    }
}

/// `M M† + σ`
#[derive(Clone, Copy, Debug)]
pub struct DiracMMdag<'a> {
    dirac: &'a Dirac<'a>,
    /// Diagonal shift `σ`.
    pub shift: f64,
}

impl<'a> DiracMMdag<'a> {
    #[must_use]
    pub const fn new(dirac: &'a Dirac<'a>) -> Self {
        Self { dirac, shift: 0.0 }
    }

    #[must_use]
    pub const fn with_shift(dirac: &'a Dirac<'a>, shift: f64) -> Self {
        Self { dirac, shift }
    }
}

impl DiracMatrix for DiracMMdag<'_> {
    fn apply_scratch(
        &self,
        mut out: SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        scratch: &mut Scratch<'_>,
    ) -> Result<()> {
        self.dirac.mm_dag(out.reborrow(), inp, scratch)?;
        apply_shift(self.shift, inp, &mut out)
    }

    fn expose(&self) -> &Dirac<'_> {
        self.dirac
    }
}

fn apply_shift(shift: f64, inp: SpinorView<'_>, out: &mut SpinorViewMut<'_>) -> Result<()> {
    if shift != 0.0 {
        blas::axpy(shift, inp, out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dirac::DiracParam;
    use crate::field::gauge::GaugeField;
    use crate::field::spinor::SiteSubset;
    use crate::lattice::geometry::LatticeGeometry;

    fn wilson(u: &GaugeField) -> Dirac<'_> {
        Dirac::create(&DiracParam {
            kappa: 0.1,
            matpc: Some(MatPcType::OddOdd),
            ..DiracParam::new(DiracKind::WilsonPc, u)
        })
        .unwrap()
    }

    #[test]
    fn shift_adds_scaled_input() {
        let u = GaugeField::hot_start(LatticeGeometry::new([4, 4, 4, 4]).unwrap(), 1);
        let d = wilson(&u);
        let layout = d.field_layout(d.operand_subset().unwrap());
        let x = SpinorField::random(layout, 4);
        let mut plain = SpinorField::zeros(layout);
        let mut shifted = SpinorField::zeros(layout);
        DiracMdagM::new(&d).apply(plain.view_mut(), x.view()).unwrap();
        DiracMdagM::with_shift(&d, 0.25)
            .apply(shifted.view_mut(), x.view())
            .unwrap();
        for ((s, p), xv) in shifted.data().iter().zip(plain.data()).zip(x.data()) {
            assert!((*s - (*p + xv.scale(0.25))).abs() < 1e-13, "{s} vs {p}");
        }
    }

    #[test]
    fn lent_temporaries_give_same_result() {
        let u = GaugeField::hot_start(LatticeGeometry::new([4, 4, 4, 4]).unwrap(), 2);
        let d = wilson(&u);
        let full = d.field_layout(SiteSubset::Full);
        let layout = d.field_layout(d.operand_subset().unwrap());
        let x = SpinorField::random(layout, 4);
        let op = DiracMMdag::new(&d);
        let mut a = SpinorField::zeros(layout);
        op.apply(a.view_mut(), x.view()).unwrap();
        let mut b = SpinorField::zeros(layout);
        let (mut t1, mut t2) = (SpinorField::zeros(full), SpinorField::zeros(layout));
        op.apply_with_tmps(b.view_mut(), x.view(), &mut t1, &mut t2).unwrap();
        assert_eq!(a.data(), b.data());
        let mut c = SpinorField::zeros(layout);
        op.apply_with_tmp(c.view_mut(), x.view(), &mut t1).unwrap();
        assert_eq!(a.data(), c.data());
    }

    #[test]
    fn functor_queries_follow_operator() {
        let u = GaugeField::cold_start(LatticeGeometry::new([2, 2, 2, 2]).unwrap());
        let d = wilson(&u);
        let m = DiracM::new(&d);
        assert_eq!(m.matpc_type(), Some(MatPcType::OddOdd));
        assert!(!m.is_staggered());
        assert_eq!(m.kind(), DiracKind::WilsonPc);
        let s = Dirac::create(&DiracParam::new(DiracKind::Staggered, &u)).unwrap();
        assert!(DiracMdag::new(&s).is_staggered());
    }
}
