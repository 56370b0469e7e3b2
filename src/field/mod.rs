// SPDX-License-Identifier: AGPL-3.0-only

//! Lattice fields consumed by the operators: quark fields and their parity
//! views, gauge links, clover terms, and level-1 arithmetic.

/// Level-1 arithmetic (`axpy`, `axpby`, `dot`, `norm2`, ...).
pub mod blas;
/// Per-site chiral clover blocks and their inverses.
pub mod clover;
/// Gauge links and the temporal boundary condition.
pub mod gauge;
/// Quark fields, layouts and parity views.
pub mod spinor;

pub use clover::CloverField;
pub use gauge::{GaugeField, TimeBoundary};
pub use spinor::{Checkerboard, FieldLayout, SiteSubset, SpinorField, SpinorView, SpinorViewMut};
