// SPDX-License-Identifier: AGPL-3.0-only

//! Reference Krylov solver used to validate operator round trips.

pub mod cg;

pub use cg::{cg_solve, CgResult};
