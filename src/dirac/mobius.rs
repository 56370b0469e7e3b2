// SPDX-License-Identifier: AGPL-3.0-only

//! Mobius domain-wall payload.
//!
//! The hop is the per-slice 4D Wilson hop applied after the pre-hop
//! `b + c C`; its adjoint applies `(b + c C)ᵀ` after the adjoint hop. The
//! local term is `2κ5 [(4 + m5)(b + c C) + 1 − C]` with
//! `κ5 = 0.5 / (b₀ (4 + m5) + 1)`. With `b = 1`, `c = 0` everything reduces
//! to the Shamir 4D-preconditioned operator.
//!
//! # References
//!
//! - Brower, Neff & Orginos, Comput. Phys. Commun. 220, 1 (2017)

use crate::dslash::fifth_dim::{FifthDimOperator, FifthDimTerm};
use crate::dslash::wilson;
use crate::error::Result;
use crate::field::gauge::GaugeField;
use crate::field::spinor::{SpinorView, SpinorViewMut};

use super::scratch::Scratch;

#[derive(Clone, Debug)]
pub struct MobiusTerm {
    b5: Vec<f64>,
    c5: Vec<f64>,
    m5: f64,
    kappa5: f64,
    fifth: FifthDimOperator,
}

impl MobiusTerm {
    /// # Errors
    ///
    /// [`crate::error::DiracError::Config`] for mismatched coefficient
    /// lengths or a singular local term.
    pub fn new(b5: &[f64], c5: &[f64], m5: f64, mass: f64, kappa5: f64) -> Result<Self> {
        Ok(Self {
            b5: b5.to_vec(),
            c5: c5.to_vec(),
            m5,
            kappa5,
            fifth: FifthDimOperator::mobius(b5, c5, m5, mass, kappa5)?,
        })
    }

    pub(crate) fn set_mass(&mut self, mass: f64) -> Result<()> {
        self.fifth = FifthDimOperator::mobius(&self.b5, &self.c5, self.m5, mass, self.kappa5)?;
        Ok(())
    }

    #[must_use]
    pub fn ls(&self) -> usize {
        self.b5.len()
    }

    #[must_use]
    pub fn b5(&self) -> &[f64] {
        &self.b5
    }

    #[must_use]
    pub fn c5(&self) -> &[f64] {
        &self.c5
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

    /// `out = H₄ (b + c C) in`, or `(b + c C)ᵀ H₄† in` when `dagger`. The
    /// intermediate goes into the first fitting field of `scratch`.
    pub(crate) fn hop(
        &self,
        gauge: &GaugeField,
        out: &mut SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        dagger: bool,
        scratch: &mut Scratch<'_>,
    ) -> Result<u64> {
        if dagger {
            let (mut t, _) = scratch.split(*out.layout());
            let fl = wilson::hop(gauge, &mut t.view_mut(), inp, true)?;
            Ok(fl + self.fifth.apply(FifthDimTerm::Pre, out, t.view(), true)?)
        } else {
            let (mut t, _) = scratch.split(*inp.layout());
            let fl = self.fifth.apply(FifthDimTerm::Pre, &mut t.view_mut(), inp, false)?;
            Ok(fl + wilson::hop(gauge, out, t.view(), false)?)
        }
    }
}
