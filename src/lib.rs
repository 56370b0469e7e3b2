// SPDX-License-Identifier: AGPL-3.0-only

//! hotSpring Dirac — lattice QCD fermion operators and their dispatch layer.
//!
//! One [`dirac::Dirac`] value stands for any supported discretization and
//! exposes the operations a Krylov solver needs: apply `M`, `M†`, `M†M`,
//! `MM†`, the hopping term alone, and the even-odd `prepare`/`reconstruct`
//! pair that maps a full-lattice system onto a single parity and back.
//!
//! ## Modules
//!   - `lattice` — complex/SU(3) arithmetic, gamma matrices, geometry
//!   - `field` — gauge, clover and spinor fields, parity views, BLAS
//!   - `dslash` — stencil kernels (Wilson, staggered, clover, twist, fifth dimension)
//!   - `dirac` — operator kinds, factory, even-odd engine, matrix functors
//!   - `multigrid` — aggregation transfer and Galerkin coarse operator
//!   - `solver` — reference CG for validation
//!   - `config` — serde-backed operator configuration
//!   - `tolerances` — centralized numerical thresholds
//!
//! ## Supported kinds
//!   Wilson, clover, twisted mass (single flavor and doublet), twisted
//!   clover, Shamir domain wall (5D and 4D-preconditioned), Mobius domain
//!   wall, naive and improved staggered; each with its even-odd form.
//!
//! # References
//!
//! - Gattringer & Lang, "Quantum Chromodynamics on the Lattice" (2010)
//! - Clark et al., Comput. Phys. Commun. 181, 1517 (2010)

pub mod config;
pub mod dirac;
pub mod dslash;
pub mod error;
pub mod field;
pub mod lattice;
pub mod multigrid;
pub mod solver;
pub mod tolerances;

pub use config::{DiracConfig, DiracFields, DslashType};
pub use dirac::{Dirac, DiracKind, DiracMatrix, DiracParam, MatPcType, SolutionType};
pub use error::{DiracError, Result};
