// SPDX-License-Identifier: AGPL-3.0-only

//! Twisted-mass payload.
//!
//! In the `κ`-normalized operator `M = A − κ H` the twist enters as
//! `A = 1 + i a γ5` with `a = 2κμ` (sign from the flavor). The
//! non-degenerate doublet adds the flavor mixing `b τ1` with `b = −2κε`
//! and carries the flavor index in the fifth-dimension slot (`ls = 2`).
//! Because the Wilson operator is γ5-Hermitian, `M†M = W†W + a²` for a
//! single flavor, which bounds the spectrum of `M†M` from below by `a²`.

use crate::dslash::twist::{self as kernel, Twist};
use crate::error::Result;
use crate::field::spinor::{SiteSubset, SpinorView, SpinorViewMut};
use crate::lattice::geometry::Parity;

use super::param::TwistFlavor;
use super::{Dirac, Variant};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TwistedMassTerm {
    mu: f64,
    epsilon: f64,
    flavor: TwistFlavor,
    twist: Twist,
}

impl TwistedMassTerm {
    #[must_use]
    pub fn new(kappa: f64, mu: f64, epsilon: f64, flavor: TwistFlavor) -> Self {
        let b = if flavor == TwistFlavor::Doublet {
            -2.0 * kappa * epsilon
        } else {
            0.0
        };
        Self {
            mu,
            epsilon,
            flavor,
            twist: Twist {
                a: Self::twist_for(kappa, mu, flavor),
                b,
            },
        }
    }

    /// `a = 2κμ`, negated for the minus flavor.
    #[must_use]
    pub fn twist_for(kappa: f64, mu: f64, flavor: TwistFlavor) -> f64 {
        let a = 2.0 * kappa * mu;
        if flavor == TwistFlavor::Minus {
            -a
        } else {
            a
        }
    }

    #[must_use]
    pub const fn mu(&self) -> f64 {
        self.mu
    }

    #[must_use]
    pub const fn epsilon(&self) -> f64 {
        self.epsilon
    }

    #[must_use]
    pub const fn flavor(&self) -> TwistFlavor {
        self.flavor
    }

    #[must_use]
    pub const fn twist(&self) -> Twist {
        self.twist
    }

    #[must_use]
    pub const fn is_doublet(&self) -> bool {
        matches!(self.flavor, TwistFlavor::Doublet)
    }

    pub(crate) fn apply(
        &self,
        out: &mut SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        inverse: bool,
        dagger: bool,
    ) -> Result<u64> {
        kernel::apply(out, inp, self.twist, inverse, dagger)
    }
}

impl Dirac<'_> {
    /// `out = (1 + i a γ5 τ3 + b τ1) in` on parity `parity`; twisted clover
    /// applies `A + i a γ5`. Adjoint under the dagger flag.
    ///
    /// # Errors
    ///
    /// [`crate::error::DiracError::NotImplemented`] for untwisted kinds,
    /// otherwise parity or shape mismatch.
    pub fn twist(
        &self,
        mut out: SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        parity: Parity,
    ) -> Result<()> {
        self.twist_local("twist", &mut out, inp, parity, false)
    }

    /// Inverse of [`Self::twist`].
    ///
    /// # Errors
    ///
    /// As [`Self::twist`], plus a configuration error when the twist is
    /// singular or the twisted-clover inverse is missing.
    pub fn twist_inv(
        &self,
        mut out: SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        parity: Parity,
    ) -> Result<()> {
        self.twist_local("twist_inv", &mut out, inp, parity, true)
    }

    fn twist_local(
        &self,
        operation: &'static str,
        out: &mut SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        parity: Parity,
        inverse: bool,
    ) -> Result<()> {
        if !matches!(self.variant(), Variant::TwistedMass(_) | Variant::TwistedClover(_)) {
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
