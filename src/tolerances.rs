// SPDX-License-Identifier: AGPL-3.0-only

//! Centralized numerical tolerances with their rationale.
//!
//! Every threshold used by the operator layer and its validation tests is
//! defined here. No ad-hoc magic numbers.
//!
//! | Category | Basis | Example |
//! |----------|-------|---------|
//! | Machine precision | IEEE 754 f64 | 1e-12 for exact operator identities |
//! | Numerical method | Solver convergence | 1e-10 for reference CG |
//! | Construction | Rank detection | relative Gram-Schmidt drop |

// ═══════════════════════════════════════════════════════════════════
// Machine-precision tolerances (IEEE 754 f64)
// ═══════════════════════════════════════════════════════════════════

/// Relative error of identities that hold exactly in exact arithmetic:
/// `⟨y, M x⟩ = ⟨M† y, x⟩`, `(M†)† = M`, the Schur complement against the
/// full operator, `R P = 1`.
///
/// A Wilson stencil sums 8 hops of 3×3 products; on 4⁴ lattices the
/// accumulated rounding in a global inner product stays below ~1e-14.
pub const OPERATOR_IDENTITY_REL: f64 = 1e-12;

/// Relative error of a local inverse applied after its operator
/// (clover, twist, fifth-dimension `A⁻¹ A = 1`).
///
/// Gauss-Jordan on 6×6 clover blocks and `Ls × Ls` fifth-dimension
/// matrices loses a few digits for near-singular blocks.
pub const LOCAL_INVERSE_REL: f64 = 1e-11;

// ═══════════════════════════════════════════════════════════════════
// Solver tolerances
// ═══════════════════════════════════════════════════════════════════

/// Reference CG target on the normal equations in round-trip tests.
///
/// The residual of `M̂ x = b̂` is bounded by this times the condition number
/// of `M̂` (a few tens on the test configurations); reconstruction
/// multiplies it by at most `κ ‖H‖ ‖A⁻¹‖ ≲ 1`.
pub const ROUND_TRIP_CG_TOL: f64 = 1e-12;

/// Reconstructed full-lattice residual `‖M x − b‖ / ‖b‖` after a reduced
/// solve at [`ROUND_TRIP_CG_TOL`].
pub const ROUND_TRIP_RESIDUAL: f64 = 1e-8;

/// Free-field Wilson point source at `κ = 1/8`: residual of the full system.
///
/// At `κ = 1/8` the free operator is massless and the antiperiodic time
/// direction keeps it invertible; CG on `M†M` must still reach 1e-10.
pub const FREE_WILSON_RESIDUAL: f64 = 1e-10;

/// Iteration cap for the reference CG in tests.
pub const REFERENCE_CG_MAX_ITER: usize = 5000;

// ═══════════════════════════════════════════════════════════════════
// Construction tolerances
// ═══════════════════════════════════════════════════════════════════

/// Gram-Schmidt: a vector whose squared norm drops below this fraction of
/// its pre-projection value is treated as linearly dependent on the
/// aggregate.
///
/// 1e-20 in `‖v‖²` is 1e-10 in `‖v‖`, well above the ~1e-16 cancellation
/// residue of an exact copy.
pub const GRAM_SCHMIDT_DEPENDENCE: f64 = 1e-20;

/// Spectral floor slack: `⟨x, M†M x⟩ ≥ (1 − slack) a² ‖x‖²` for a
/// twisted-mass operator with twist `a`.
pub const SPECTRAL_FLOOR_SLACK: f64 = 1e-10;
