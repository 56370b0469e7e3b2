// SPDX-License-Identifier: AGPL-3.0-only

//! CPU reference stencil kernels.
//!
//! Each kernel writes a single-parity output from single-parity input and
//! returns the number of floating-point operations it performed, counted with
//! the per-site constants in [`crate::lattice::constants::flops`]. Kernels
//! parallelize over output sites with rayon and never allocate field-sized
//! buffers.
//!
//! | Kernel | Operator piece |
//! |--------|----------------|
//! | [`wilson::hop`] | 4D Wilson hop, per fifth-dimension slice |
//! | [`wilson::hop_5d`] | 4D hop plus fifth-dimension hop (5D checkerboard) |
//! | [`staggered::hop`] | Naive or improved staggered hop |
//! | [`clover::apply`] | Clover block multiply (optionally with a twist) |
//! | [`twist::apply`] | `1 + i a γ5 τ3 + b τ1` and its inverse |
//! | [`fifth_dim::FifthDimOperator`] | Dense per-chirality matrices along the fifth dimension |

use crate::error::{DiracError, Result};
use crate::field::spinor::{FieldLayout, SiteSubset};
use crate::lattice::geometry::Parity;

/// Clover block multiply.
pub mod clover;
/// Fifth-dimension dense operators for domain-wall kinds.
pub mod fifth_dim;
/// Staggered one-hop and three-hop stencils.
pub mod staggered;
/// Twisted-mass local rotation.
pub mod twist;
/// Wilson hopping term in 4D and 5D.
pub mod wilson;

/// Validate a hopping-kernel call: `out` on parity `p`, `inp` on the
/// opposite parity, same shape. Returns `p`.
pub(crate) fn check_hop(
    operation: &'static str,
    out: &FieldLayout,
    inp: &FieldLayout,
) -> Result<Parity> {
    let p = out.parity().ok_or(DiracError::ParityMismatch {
        operation,
        expected: SiteSubset::Parity(Parity::Even),
        found: SiteSubset::Full,
    })?;
    if !out.same_shape(inp) {
        return Err(DiracError::ShapeMismatch(format!(
            "{operation}: out {out} vs in {inp}"
        )));
    }
    inp.ensure_subset(operation, SiteSubset::Parity(p.opposite()))?;
    Ok(p)
}

/// Validate a site-local kernel call: `out` and `inp` on the same parity.
pub(crate) fn check_local(
    operation: &'static str,
    out: &FieldLayout,
    inp: &FieldLayout,
) -> Result<Parity> {
    let p = out.parity().ok_or(DiracError::ParityMismatch {
        operation,
        expected: SiteSubset::Parity(Parity::Even),
        found: SiteSubset::Full,
    })?;
    out.ensure_matches(operation, inp)?;
    Ok(p)
}

/// Sites processed by one call on a parity field (all slices).
#[inline]
pub(crate) const fn parity_sites(layout: &FieldLayout) -> u64 {
    (layout.ls * layout.geometry.half_volume()) as u64
}
