// SPDX-License-Identifier: AGPL-3.0-only

//! Clover-improved Wilson payload: `A = 1 − κ c_sw Σ σ_μν F_μν` as stored in
//! a [`CloverField`], with `A⁻¹` taken from a precomputed inverse.

use crate::dslash::clover as kernel;
use crate::error::{DiracError, Result};
use crate::field::clover::CloverField;
use crate::field::spinor::{SiteSubset, SpinorView, SpinorViewMut};
use crate::lattice::geometry::Parity;

use super::{Dirac, Variant};

/// Borrowed clover term and (optionally) its inverse.
#[derive(Clone, Copy, Debug)]
pub struct CloverTerm<'a> {
    clover: &'a CloverField,
    inverse: Option<&'a CloverField>,
}

impl<'a> CloverTerm<'a> {
    #[must_use]
    pub const fn new(clover: &'a CloverField, inverse: Option<&'a CloverField>) -> Self {
        Self { clover, inverse }
    }

    #[must_use]
    pub const fn clover(&self) -> &'a CloverField {
        self.clover
    }

    #[must_use]
    pub const fn inverse(&self) -> Option<&'a CloverField> {
        self.inverse
    }

    pub(crate) fn apply(
        &self,
        out: &mut SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        inverse: bool,
        dagger: bool,
    ) -> Result<u64> {
        let field = if inverse {
            self.inverse
                .ok_or_else(|| DiracError::config("clover inverse was not provided"))?
        } else {
            self.clover
        };
        kernel::apply(field, out, inp, 0.0, dagger)
    }
}

impl Dirac<'_> {
    /// `out = A in` on parity `parity` (`A†` under the dagger flag). Twisted
    /// clover includes its twist.
    ///
    /// # Errors
    ///
    /// [`DiracError::NotImplemented`] for kinds without a clover term,
    /// otherwise parity or shape mismatch.
    pub fn clover(
        &self,
        mut out: SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        parity: Parity,
    ) -> Result<()> {
        self.clover_local("clover", &mut out, inp, parity, false)
    }

    /// `out = A⁻¹ in` on parity `parity`, from the precomputed inverse.
    ///
    /// # Errors
    ///
    /// As [`Self::clover`], plus [`DiracError::Config`] when no inverse was
    /// provided.
    pub fn clover_inv(
        &self,
        mut out: SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        parity: Parity,
    ) -> Result<()> {
        self.clover_local("clover_inv", &mut out, inp, parity, true)
    }

    fn clover_local(
        &self,
        operation: &'static str,
        out: &mut SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        parity: Parity,
        inverse: bool,
    ) -> Result<()> {
        if !matches!(self.variant(), Variant::Clover(_) | Variant::TwistedClover(_)) {
            return Err(self.not_implemented(operation));
        }
        let subset = SiteSubset::Parity(parity);
        self.check_operand(operation, out.layout(), subset)?;
        self.check_operand(operation, inp.layout(), subset)?;
        let fl = self.apply_local(out, inp, inverse, self.dagger().is_yes())?;
        self.add_flops(fl);
        Ok(())
    }
}
