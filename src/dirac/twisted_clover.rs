// SPDX-License-Identifier: AGPL-3.0-only

//! Twisted-clover payload: `A = C + i a γ5` for a clover term `C`, with the
//! inverse taken from a field built by
//! [`crate::field::clover::CloverField::twisted_inverse`] for the same `a`.

use crate::dslash::clover as kernel;
use crate::error::{DiracError, Result};
use crate::field::clover::CloverField;
use crate::field::spinor::{SpinorView, SpinorViewMut};

#[derive(Clone, Copy, Debug)]
pub struct TwistedCloverTerm<'a> {
    clover: &'a CloverField,
    inverse: Option<&'a CloverField>,
    a: f64,
}

impl<'a> TwistedCloverTerm<'a> {
    #[must_use]
    pub const fn new(clover: &'a CloverField, inverse: Option<&'a CloverField>, a: f64) -> Self {
        Self { clover, inverse, a }
    }

    /// Twist `a = ±2κμ`.
    #[must_use]
    pub const fn a(&self) -> f64 {
        self.a
    }

    #[must_use]
    pub const fn clover(&self) -> &'a CloverField {
        self.clover
    }

    pub(crate) fn apply(
        &self,
        out: &mut SpinorViewMut<'_>,
        inp: SpinorView<'_>,
        inverse: bool,
        dagger: bool,
    ) -> Result<u64> {
        if inverse {
            let inv = self
                .inverse
                .ok_or_else(|| DiracError::config("twisted clover inverse was not provided"))?;
            kernel::apply(inv, out, inp, 0.0, dagger)
        } else {
            kernel::apply(self.clover, out, inp, self.a, dagger)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::gauge::GaugeField;
    use crate::field::spinor::{FieldLayout, SiteSubset, SpinorField};
    use crate::lattice::geometry::{LatticeGeometry, Parity};

    #[test]
    fn twisted_inverse_pairs_with_twist() {
        let g = LatticeGeometry::new([2, 2, 2, 4]).unwrap();
        let u = GaugeField::near_identity(g, 4, 0.3);
        let clover = CloverField::from_gauge(&u, 0.12, 1.0);
        let inv = clover.twisted_inverse(0.05).unwrap();
        let term = TwistedCloverTerm::new(&clover, Some(&inv), 0.05);
        let layout = FieldLayout::wilson(g, SiteSubset::Parity(Parity::Even));
        let psi = SpinorField::random(layout, 9);
        for dagger in [false, true] {
            let mut t = SpinorField::zeros(layout);
            let mut back = SpinorField::zeros(layout);
            term.apply(&mut t.view_mut(), psi.view(), false, dagger).unwrap();
            term.apply(&mut back.view_mut(), t.view(), true, dagger).unwrap();
            for (x, y) in back.data().iter().zip(psi.data()) {
                assert!((*x - *y).abs() < 1e-12, "dagger={dagger}: {x} vs {y}");
            }
        }
    }
}
