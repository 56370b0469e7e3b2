// SPDX-License-Identifier: AGPL-3.0-only

//! Lattice primitives shared by fields, kernels and operators.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `complex_f64` | Complex f64 arithmetic |
//! | `su3` | 3×3 color matrices, color vectors |
//! | `constants` | Lattice constants, kernel flop counts, LCG PRNG |
//! | `geometry` | Extents, parity, checkerboard indexing |
//! | `gamma` | Chiral-basis gamma matrices and spin projectors |
//! | `dense` | Small dense inversions (clover blocks, fifth dimension) |
//!
//! # References
//!
//! - Gattringer & Lang, "Quantum Chromodynamics on the Lattice" (2010)
//! - `DeGrand` & `DeTar`, "Lattice Methods for Quantum Chromodynamics" (2006)

/// Complex f64 arithmetic (re, im).
pub mod complex_f64;
/// LCG PRNG, lattice constants, flop counts and numerical guards.
pub mod constants;
/// Gauss-Jordan inversion for small dense matrices.
pub mod dense;
/// Gamma matrices, spin projectors and `σ_μν`.
pub mod gamma;
/// Lattice extents and even-odd site indexing.
pub mod geometry;
/// 3×3 complex matrix operations and color vectors.
pub mod su3;

pub use complex_f64::Complex64;
pub use geometry::{LatticeGeometry, Parity};
pub use su3::{ColorVector, Su3Matrix};
