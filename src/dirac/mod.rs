// SPDX-License-Identifier: AGPL-3.0-only

//! Dirac operators behind one interface.
//!
//! A [`Dirac`] is built by [`Dirac::create`] from a [`DiracParam`] record and
//! carries two parts: a [`DiracBase`] with the state every kind shares
//! (gauge field, κ, mass, preconditioning class, dagger flag, flop counter)
//! and a [`Variant`] with the kind's own physics payload. All Wilson-like
//! kinds go through the same even-odd engine, parameterized by a local term
//! `A`, a hopping stencil `H` and a hop scale `κ`:
//!
//! | Kind | `A` | `H` |
//! |------|-----|-----|
//! | Wilson | 1 | 4D Wilson hop |
//! | Clover | clover term | 4D Wilson hop |
//! | Twisted mass | `1 + i a γ5 (τ3) (+ b τ1)` | 4D Wilson hop per flavor |
//! | Twisted clover | clover `+ i a γ5` | 4D Wilson hop |
//! | Domain wall (5D) | 1 | 4D + fifth-dimension hop |
//! | Domain wall (4D PC) | `1 − 2κ5 C` | 4D hop per slice |
//! | Mobius | `2κ5[(4+m5)(b + cC) + 1 − C]` | 4D hop after `b + cC` |
//!
//! Staggered kinds have no spin structure and use `M = 2m + D`.
//!
//! The dagger flag is state of the operator, but it is read once per public
//! call and passed down explicitly, so no call flips and restores it.
//! Temporaries arrive through a call-scoped [`Scratch`].
//!
//! Operators are not internally synchronized beyond the flop counter: one
//! instance serves one solver at a time.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::dslash::staggered::StaggeredLinks;
use crate::dslash::{fifth_dim::FifthDimTerm, parity_sites, staggered as stag_kernel, wilson};
use crate::error::{DiracError, Result};
use crate::field::blas;
use crate::field::gauge::GaugeField;
use crate::field::spinor::{Checkerboard, FieldLayout, SiteSubset, SpinorView, SpinorViewMut};
use crate::lattice::constants::flops;
use crate::lattice::geometry::Parity;
use crate::multigrid::{CoarseOperator, Transfer};

/// Clover payload and clover-term accessors.
pub mod clover;
/// Shamir domain wall, 5D and 4D-preconditioned.
pub mod domain_wall;
/// Even-odd engine shared by Wilson-like kinds.
pub mod even_odd;
/// Solver-facing matrix functors.
pub mod matrix;
/// Mobius domain wall.
pub mod mobius;
/// Kinds, parameter record and factory.
pub mod param;
/// Call-scoped temporaries.
pub mod scratch;
/// Naive and improved staggered.
pub mod staggered;
/// Twisted clover.
pub mod twisted_clover;
/// Twisted mass, single flavor and doublet.
pub mod twisted_mass;

pub use clover::CloverTerm;
pub use domain_wall::{DomainWall4dTerm, DomainWallTerm};
pub use even_odd::Prepared;
pub use matrix::{DiracM, DiracMMdag, DiracMatrix, DiracMdag, DiracMdagM};
pub use mobius::MobiusTerm;
pub use param::{Dagger, DiracKind, DiracParam, MatPcType, SolutionType, TwistFlavor};
pub use scratch::Scratch;
pub use staggered::StaggeredTerm;
pub use twisted_clover::TwistedCloverTerm;
pub use twisted_mass::TwistedMassTerm;

/// State shared by every kind.
#[derive(Debug)]
pub struct DiracBase<'a> {
    pub(crate) kind: DiracKind,
    pub(crate) gauge: &'a GaugeField,
    pub(crate) kappa: f64,
    pub(crate) mass: f64,
    pub(crate) matpc: Option<MatPcType>,
    pub(crate) dagger: Dagger,
    pub(crate) comm_dim: [bool; 4],
    pub(crate) flops: AtomicU64,
}

/// Copies scalars and re-borrows the same fields; the copy counts its own
/// flops from zero.
impl Clone for DiracBase<'_> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            gauge: self.gauge,
            kappa: self.kappa,
            mass: self.mass,
            matpc: self.matpc,
            dagger: self.dagger,
            comm_dim: self.comm_dim,
            flops: AtomicU64::new(0),
        }
    }
}

/// Per-kind physics payload.
#[derive(Clone, Debug)]
pub enum Variant<'a> {
    Wilson,
    Clover(CloverTerm<'a>),
    TwistedMass(TwistedMassTerm),
    TwistedClover(TwistedCloverTerm<'a>),
    DomainWall(DomainWallTerm),
    DomainWall4d(DomainWall4dTerm),
    Mobius(MobiusTerm),
    Staggered(StaggeredTerm<'a>),
}

/// A discretized Dirac operator.
#[derive(Clone, Debug)]
pub struct Dirac<'a> {
    base: DiracBase<'a>,
    variant: Variant<'a>,
}

impl<'a> Dirac<'a> {
    #[must_use]
    pub const fn kind(&self) -> DiracKind {
        self.base.kind
    }

    #[must_use]
    pub const fn variant(&self) -> &Variant<'a> {
        &self.variant
    }

    #[must_use]
    pub const fn gauge(&self) -> &'a GaugeField {
        self.base.gauge
    }

    #[must_use]
    pub const fn kappa(&self) -> f64 {
        self.base.kappa
    }

    #[must_use]
    pub const fn mass(&self) -> f64 {
        self.base.mass
    }

    /// Change the quark mass. Domain-wall kinds rebuild their
    /// fifth-dimension operator, which can fail if it becomes singular.
    ///
    /// # Errors
    ///
    /// [`DiracError::Config`] for a singular fifth-dimension operator.
    pub fn set_mass(&mut self, mass: f64) -> Result<()> {
        match &mut self.variant {
            Variant::DomainWall4d(d) => d.set_mass(mass)?,
            Variant::Mobius(m) => m.set_mass(mass)?,
            _ => {}
        }
        self.base.mass = mass;
        Ok(())
    }

    #[must_use]
    pub const fn matpc_type(&self) -> Option<MatPcType> {
        self.base.matpc
    }

    #[must_use]
    pub const fn dagger(&self) -> Dagger {
        self.base.dagger
    }

    pub fn set_dagger(&mut self, dagger: Dagger) {
        self.base.dagger = dagger;
    }

    #[must_use]
    pub const fn comm_dim(&self) -> [bool; 4] {
        self.base.comm_dim
    }

    /// Flops since the last call; resets the counter.
    pub fn flops(&self) -> u64 {
        self.base.flops.swap(0, Ordering::Relaxed)
    }

    pub(crate) fn add_flops(&self, n: u64) {
        self.base.flops.fetch_add(n, Ordering::Relaxed);
    }

    const fn is_dagger(&self) -> bool {
        self.base.dagger.is_yes()
    }

    /// Shape of the fields this operator acts on.
    #[must_use]
    pub fn field_layout(&self, subset: SiteSubset) -> FieldLayout {
        let g = self.base.gauge.geometry();
        match &self.variant {
            Variant::Staggered(_) => FieldLayout::staggered(g, subset),
            Variant::TwistedMass(t) if t.is_doublet() => {
                FieldLayout::five_d(g, 2, Checkerboard::FourD, subset)
            }
            Variant::DomainWall(d) => FieldLayout::five_d(g, d.ls(), Checkerboard::FiveD, subset),
            Variant::DomainWall4d(d) => FieldLayout::five_d(g, d.ls(), Checkerboard::FourD, subset),
            Variant::Mobius(m) => FieldLayout::five_d(g, m.ls(), Checkerboard::FourD, subset),
            _ => FieldLayout::wilson(g, subset),
        }
    }

    pub(crate) fn require_matpc(&self) -> Result<MatPcType> {
        self.base.matpc.ok_or_else(|| {
            DiracError::config(format!(
                "{:?} needs a preconditioning type, none is set",
                self.base.kind
            ))
        })
    }

    /// Subset `M` acts on: full for unpreconditioned kinds, the matpc parity
    /// otherwise.
    ///
    /// # Errors
    ///
    /// [`DiracError::Config`] for a preconditioned kind without a matpc type.
    pub fn operand_subset(&self) -> Result<SiteSubset> {
        if self.base.kind.is_preconditioned() {
            Ok(SiteSubset::Parity(self.require_matpc()?.parity()))
        } else {
            Ok(SiteSubset::Full)
        }
    }

    pub(crate) fn check_operand(
        &self,
        operation: &'static str,
        layout: &FieldLayout,
        subset: SiteSubset,
    ) -> Result<()> {
        self.field_layout(subset).ensure_matches(operation, layout)
    }

    pub(crate) fn not_implemented(&self, operation: &'static str) -> DiracError {
        DiracError::NotImplemented {
            operation,
            kind: self.base.kind,
        }
    }

    /// Hopping term into parity `parity` from the opposite parity. For
    /// preconditioned Wilson-like kinds this includes the local inverse:
    /// `A_pp⁻¹ H_pq`, daggered as `H† A_qq⁻†`.
    ///
    /// # Errors
    ///
    /// Parity or shape mismatch.
    pub fn dslash(
        &self,
        mut out: SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        parity: Parity,
        scratch: &mut Scratch<'_>,
    ) -> Result<()> {
        self.check_operand("dslash", out.layout(), SiteSubset::Parity(parity))?;
        self.check_operand("dslash", inp.layout(), SiteSubset::Parity(parity.opposite()))?;
        let fl = self.dslash_impl(&mut out, inp, parity, self.is_dagger(), scratch)?;
        self.add_flops(fl);
        Ok(())
    }

    /// `out = Dslash(in, parity) + k·x`
    ///
    /// # Errors
    ///
    /// Parity or shape mismatch.
    pub fn dslash_xpay(
        &self,
        mut out: SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        parity: Parity,
        x: SpinorView<'_>,
        k: f64,
        scratch: &mut Scratch<'_>,
    ) -> Result<()> {
        self.check_operand("dslash_xpay", out.layout(), SiteSubset::Parity(parity))?;
        self.check_operand("dslash_xpay", inp.layout(), SiteSubset::Parity(parity.opposite()))?;
        self.check_operand("dslash_xpay", x.layout(), SiteSubset::Parity(parity))?;
        let fl = self.dslash_impl(&mut out, inp, parity, self.is_dagger(), scratch)?;
        blas::axpy(k, x, &mut out)?;
        self.add_flops(fl + self.xpay_flops(out.layout()));
        Ok(())
    }

    pub(crate) fn xpay_flops(&self, layout: &FieldLayout) -> u64 {
        let per_site = if self.base.kind.is_staggered() {
            flops::XPAY_STAGGERED
        } else {
            flops::XPAY_WILSON
        };
        per_site * parity_sites(layout)
    }

    pub(crate) fn dslash_impl(
        &self,
        out: &mut SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        parity: Parity,
        dagger: bool,
        scratch: &mut Scratch<'_>,
    ) -> Result<u64> {
        if !self.base.kind.is_preconditioned() || self.has_unit_local() {
            return self.apply_hop(out, inp, dagger, scratch);
        }
        let (mut t, mut rest) = scratch.split(*inp.layout());
        if dagger {
            let fl = self.apply_local(&mut t.view_mut(), inp, true, true)?;
            Ok(fl + self.apply_hop(out, t.view(), true, &mut rest)?)
        } else {
            let mut h = t.view_mut().into_relabeled(parity)?;
            let fl = self.apply_hop(&mut h, inp, false, &mut rest)?;
            Ok(fl + self.apply_local(out, h.as_view(), true, false)?)
        }
    }

    /// `out = M in`
    ///
    /// # Errors
    ///
    /// Parity or shape mismatch, or a preconditioned kind without a matpc
    /// type.
    pub fn m(
        &self,
        out: SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        scratch: &mut Scratch<'_>,
    ) -> Result<()> {
        self.apply_m(out, inp, self.is_dagger(), scratch)
    }

    /// `out = M† in`
    ///
    /// # Errors
    ///
    /// As [`Self::m`].
    pub fn mdag(
        &self,
        out: SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        scratch: &mut Scratch<'_>,
    ) -> Result<()> {
        self.apply_m(out, inp, !self.is_dagger(), scratch)
    }

    /// `out = M† M in`
    ///
    /// # Errors
    ///
    /// As [`Self::m`].
    pub fn mdag_m(
        &self,
        out: SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        scratch: &mut Scratch<'_>,
    ) -> Result<()> {
        let dagger = self.is_dagger();
        let (mut mid, mut rest) = scratch.split(*inp.layout());
        self.apply_m(mid.view_mut(), inp, dagger, &mut rest)?;
        self.apply_m(out, mid.view(), !dagger, &mut rest)
    }

    /// `out = M M† in`
    ///
    /// # Errors
    ///
    /// As [`Self::m`].
    pub fn mm_dag(
        &self,
        out: SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        scratch: &mut Scratch<'_>,
    ) -> Result<()> {
        let dagger = self.is_dagger();
        let (mut mid, mut rest) = scratch.split(*inp.layout());
        self.apply_m(mid.view_mut(), inp, !dagger, &mut rest)?;
        self.apply_m(out, mid.view(), dagger, &mut rest)
    }

    pub(crate) fn apply_m(
        &self,
        mut out: SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        dagger: bool,
        scratch: &mut Scratch<'_>,
    ) -> Result<()> {
        let subset = self.operand_subset()?;
        self.check_operand("M", inp.layout(), subset)?;
        self.check_operand("M", out.layout(), subset)?;
        let staggered = self.base.kind.is_staggered();
        let fl = match subset {
            SiteSubset::Full if staggered => self.staggered_m_full(&mut out, inp, dagger)?,
            SiteSubset::Full => self.m_full(&mut out, inp, dagger, scratch)?,
            SiteSubset::Parity(p) if staggered => {
                self.staggered_m_pc(&mut out, inp, p, dagger, scratch)?
            }
            SiteSubset::Parity(_) => {
                self.m_pc(&mut out, inp, self.require_matpc()?, dagger, scratch)?
            }
        };
        self.add_flops(fl);
        Ok(())
    }

    /// Map a full-lattice system onto the system the operator solves.
    ///
    /// Unpreconditioned kinds return `src = b`, `sol = x`. Preconditioned
    /// kinds given a preconditioned solution type do the same; given a
    /// full-lattice solution type they fold `b` into a reduced source stored
    /// in the other parity of `x` and return the matpc parity of `x` as the
    /// solution.
    ///
    /// # Errors
    ///
    /// [`DiracError::Config`] for a preconditioned solution type on an
    /// unpreconditioned kind, a missing matpc type, or a massless staggered
    /// fold; parity or shape mismatch otherwise.
    pub fn prepare<'f>(
        &self,
        x: SpinorViewMut<'f>,
        b: SpinorView<'f>,
        solution: SolutionType,
        scratch: &mut Scratch<'_>,
    ) -> Result<Prepared<'f>> {
        let subset = self.solution_subset(solution)?;
        self.check_operand("prepare", x.layout(), subset)?;
        self.check_operand("prepare", b.layout(), subset)?;
        if !self.base.kind.is_preconditioned() || solution.is_preconditioned() {
            return Ok(Prepared { src: b, sol: x });
        }
        let matpc = self.require_matpc()?;
        let dagger = self.is_dagger();
        let (prepared, fl) = if self.base.kind.is_staggered() {
            self.staggered_prepare(x, b, matpc.parity(), dagger)?
        } else {
            self.prepare_pc(x, b, matpc, dagger, scratch)?
        };
        self.add_flops(fl);
        Ok(prepared)
    }

    /// Fill in the other parity of `x` after the reduced solve (identity for
    /// unpreconditioned kinds and preconditioned solution types).
    ///
    /// # Errors
    ///
    /// As [`Self::prepare`].
    pub fn reconstruct(
        &self,
        x: SpinorViewMut<'_>,
        b: SpinorView<'_>,
        solution: SolutionType,
        scratch: &mut Scratch<'_>,
    ) -> Result<()> {
        let subset = self.solution_subset(solution)?;
        self.check_operand("reconstruct", x.layout(), subset)?;
        self.check_operand("reconstruct", b.layout(), subset)?;
        if !self.base.kind.is_preconditioned() || solution.is_preconditioned() {
            return Ok(());
        }
        let matpc = self.require_matpc()?;
        let dagger = self.is_dagger();
        let fl = if self.base.kind.is_staggered() {
            self.staggered_reconstruct(x, b, matpc.parity(), dagger)?
        } else {
            self.reconstruct_pc(x, b, matpc, dagger, scratch)?
        };
        self.add_flops(fl);
        Ok(())
    }

    fn solution_subset(&self, solution: SolutionType) -> Result<SiteSubset> {
        match (self.base.kind.is_preconditioned(), solution.is_preconditioned()) {
            (false, true) => Err(DiracError::config(format!(
                "{solution:?} solution requested from unpreconditioned {:?}",
                self.base.kind
            ))),
            (true, true) => Ok(SiteSubset::Parity(self.require_matpc()?.parity())),
            (_, false) => Ok(SiteSubset::Full),
        }
    }

    /// Galerkin coarse operator `R M P` of the unpreconditioned matrix.
    ///
    /// # Errors
    ///
    /// [`DiracError::NotImplemented`] for kinds other than Wilson and clover;
    /// shape errors if the transfer was built for another lattice.
    pub fn create_coarse_op(&self, transfer: &Transfer) -> Result<CoarseOperator> {
        match self.base.kind {
            DiracKind::Wilson | DiracKind::WilsonPc | DiracKind::Clover | DiracKind::CloverPc => {}
            _ => return Err(self.not_implemented("create_coarse_op")),
        }
        self.check_operand("create_coarse_op", &transfer.fine_layout(), SiteSubset::Full)?;
        CoarseOperator::galerkin(transfer, |out, inp| {
            let fl = self.m_full(out, inp, false, &mut Scratch::none())?;
            self.add_flops(fl);
            Ok(())
        })
    }

    /// `A in` or `A⁻¹ in` (adjoint when `dagger`) on one parity.
    pub(crate) fn apply_local(
        &self,
        out: &mut SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        inverse: bool,
        dagger: bool,
    ) -> Result<u64> {
        match &self.variant {
            Variant::Wilson | Variant::DomainWall(_) => {
                out.copy_from(inp)?;
                Ok(0)
            }
            Variant::Clover(c) => c.apply(out, inp, inverse, dagger),
            Variant::TwistedMass(t) => t.apply(out, inp, inverse, dagger),
            Variant::TwistedClover(t) => t.apply(out, inp, inverse, dagger),
            Variant::DomainWall4d(d) => d.fifth().apply(local_term(inverse), out, inp, dagger),
            Variant::Mobius(m) => m.fifth().apply(local_term(inverse), out, inp, dagger),
            Variant::Staggered(_) => Err(self.not_implemented("local term")),
        }
    }

    /// `H in` (or `H† in`) into the opposite parity. Only the Mobius hop
    /// needs a temporary.
    pub(crate) fn apply_hop(
        &self,
        out: &mut SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        dagger: bool,
        scratch: &mut Scratch<'_>,
    ) -> Result<u64> {
        let gauge = self.base.gauge;
        match &self.variant {
            Variant::DomainWall(_) => wilson::hop_5d(gauge, out, inp, self.base.mass, dagger),
            Variant::Mobius(m) => m.hop(gauge, out, inp, dagger, scratch),
            Variant::Staggered(s) => stag_kernel::hop(s.links(), out, inp, dagger),
            _ => wilson::hop(gauge, out, inp, dagger),
        }
    }

    /// Scale of the hopping term in `M = A − κ H`.
    pub(crate) const fn hop_scale(&self) -> f64 {
        match &self.variant {
            Variant::DomainWall(d) => d.kappa5(),
            Variant::DomainWall4d(d) => d.kappa5(),
            Variant::Mobius(m) => m.kappa5(),
            _ => self.base.kappa,
        }
    }

    pub(crate) const fn has_unit_local(&self) -> bool {
        matches!(self.variant, Variant::Wilson | Variant::DomainWall(_))
    }

    pub(crate) fn staggered_links(&self) -> Result<StaggeredLinks<'a>> {
        match &self.variant {
            Variant::Staggered(s) => Ok(s.links()),
            _ => Err(self.not_implemented("staggered hop")),
        }
    }
}

const fn local_term(inverse: bool) -> FifthDimTerm {
    if inverse {
        FifthDimTerm::LocalInverse
    } else {
        FifthDimTerm::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::spinor::SpinorField;
    use crate::lattice::geometry::LatticeGeometry;

    fn wilson_pc(u: &GaugeField) -> Dirac<'_> {
        Dirac::create(&DiracParam {
            kappa: 0.11,
            matpc: Some(MatPcType::EvenEven),
            ..DiracParam::new(DiracKind::WilsonPc, u)
        })
        .unwrap()
    }

    #[test]
    fn flops_reset_on_read() {
        let u = GaugeField::hot_start(LatticeGeometry::new([4, 4, 4, 4]).unwrap(), 1);
        let d = wilson_pc(&u);
        let layout = d.field_layout(d.operand_subset().unwrap());
        let x = SpinorField::random(layout, 2);
        let mut y = SpinorField::zeros(layout);
        d.m(y.view_mut(), x.view(), &mut Scratch::none()).unwrap();
        let first = d.flops();
        assert!(first >= 2 * flops::WILSON_DSLASH * 128, "flops={first}");
        assert_eq!(d.flops(), 0);
    }

    #[test]
    fn dslash_rejects_wrong_parity() {
        let u = GaugeField::cold_start(LatticeGeometry::new([2, 2, 2, 2]).unwrap());
        let d = wilson_pc(&u);
        let even = d.field_layout(SiteSubset::Parity(Parity::Even));
        let a = SpinorField::random(even, 1);
        let mut b = SpinorField::zeros(even);
        let err = d
            .dslash(b.view_mut(), a.view(), Parity::Even, &mut Scratch::none())
            .unwrap_err();
        assert!(matches!(err, DiracError::ParityMismatch { .. }), "{err}");
        assert_eq!(d.flops(), 0);
    }

    #[test]
    fn unset_matpc_fails_at_use() {
        let u = GaugeField::cold_start(LatticeGeometry::new([2, 2, 2, 2]).unwrap());
        let d = Dirac::create(&DiracParam::new(DiracKind::WilsonPc, &u)).unwrap();
        let layout = d.field_layout(SiteSubset::Parity(Parity::Even));
        let x = SpinorField::random(layout, 1);
        let mut y = SpinorField::zeros(layout);
        let err = d.m(y.view_mut(), x.view(), &mut Scratch::none()).unwrap_err();
        assert!(matches!(err, DiracError::Config(_)), "{err}");
    }

    #[test]
    fn clone_shares_fields_and_counts_separately() {
        let u = GaugeField::cold_start(LatticeGeometry::new([2, 2, 2, 2]).unwrap());
        let d = wilson_pc(&u);
        let layout = d.field_layout(SiteSubset::Parity(Parity::Even));
        let x = SpinorField::random(layout, 1);
        let mut y = SpinorField::zeros(layout);
        d.m(y.view_mut(), x.view(), &mut Scratch::none()).unwrap();
        let mut e = d.clone();
        assert_eq!(e.flops(), 0);
        assert!(std::ptr::eq(e.gauge(), d.gauge()));
        e.set_dagger(Dagger::Yes);
        assert_eq!(d.dagger(), Dagger::No);
        assert!(d.flops() > 0);
    }

    #[test]
    fn coarse_op_not_implemented_for_staggered() {
        let g = LatticeGeometry::new([4, 4, 4, 4]).unwrap();
        let u = GaugeField::cold_start(g);
        let d = Dirac::create(&DiracParam::new(DiracKind::Staggered, &u)).unwrap();
        let nulls = vec![SpinorField::random(FieldLayout::wilson(g, SiteSubset::Full), 3)];
        let t = Transfer::new(&nulls, [2, 2, 2, 2]).unwrap();
        let err = d.create_coarse_op(&t).unwrap_err();
        assert!(err.is_not_implemented(), "{err}");
    }
}
