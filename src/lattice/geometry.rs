// SPDX-License-Identifier: AGPL-3.0-only

//! Lattice geometry and checkerboard indexing.
//!
//! A [`LatticeGeometry`] is a plain value: the four extents. It is passed by
//! value into every kernel; nothing holds a global notion of "the lattice".
//!
//! Sites are ordered lexicographically with `x0` fastest:
//!
//!   `lex = x0 + X0 (x1 + X1 (x2 + X2 x3))`
//!
//! and split by parity `(x0 + x1 + x2 + x3) mod 2`. Because every extent is
//! even, `lex / 2` enumerates each parity without gaps, which is the
//! checkerboard index used by parity fields.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DiracError, Result};

use super::constants::N_DIM;

/// Checkerboard parity of a site (or of a half-field).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    /// Both parities, even first (storage order of full fields).
    pub const BOTH: [Self; 2] = [Self::Even, Self::Odd];

    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Even => Self::Odd,
            Self::Odd => Self::Even,
        }
    }

    /// 0 for even, 1 for odd.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Even => 0,
            Self::Odd => 1,
        }
    }

    /// Parity of an integer coordinate sum.
    #[inline]
    #[must_use]
    pub const fn from_sum(sum: usize) -> Self {
        if sum & 1 == 0 {
            Self::Even
        } else {
            Self::Odd
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Even => f.write_str("even"),
            Self::Odd => f.write_str("odd"),
        }
    }
}

/// Extents of a 4D lattice. All extents are even and non-zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LatticeGeometry {
    dims: [usize; N_DIM],
}

impl LatticeGeometry {
    /// Validate and wrap lattice extents `[X0, X1, X2, X3]` (x, y, z, t).
    ///
    /// # Errors
    ///
    /// [`DiracError::Config`] if any extent is zero or odd.
    pub fn new(dims: [usize; N_DIM]) -> Result<Self> {
        if let Some(mu) = dims.iter().position(|&d| d == 0 || d % 2 != 0) {
            return Err(DiracError::config(format!(
                "lattice extent {} in direction {mu} must be even and non-zero",
                dims[mu]
            )));
        }
        Ok(Self { dims })
    }

    #[inline]
    #[must_use]
    pub const fn dims(&self) -> [usize; N_DIM] {
        self.dims
    }

    /// Total number of 4D sites.
    #[inline]
    #[must_use]
    pub const fn volume(&self) -> usize {
        self.dims[0] * self.dims[1] * self.dims[2] * self.dims[3]
    }

    /// Sites of one parity.
    #[inline]
    #[must_use]
    pub const fn half_volume(&self) -> usize {
        self.volume() / 2
    }

    /// Lexicographic index, `x0` fastest.
    #[inline]
    #[must_use]
    pub const fn lex_index(&self, x: [usize; N_DIM]) -> usize {
        x[0] + self.dims[0] * (x[1] + self.dims[1] * (x[2] + self.dims[2] * x[3]))
    }

    /// Inverse of [`Self::lex_index`].
    #[inline]
    #[must_use]
    pub const fn lex_coords(&self, lex: usize) -> [usize; N_DIM] {
        let x0 = lex % self.dims[0];
        let r = lex / self.dims[0];
        let x1 = r % self.dims[1];
        let r = r / self.dims[1];
        let x2 = r % self.dims[2];
        let x3 = r / self.dims[2];
        [x0, x1, x2, x3]
    }

    #[inline]
    #[must_use]
    pub const fn site_parity(&self, x: [usize; N_DIM]) -> Parity {
        Parity::from_sum(x[0] + x[1] + x[2] + x[3])
    }

    /// Index of `x` within its parity.
    #[inline]
    #[must_use]
    pub const fn cb_index(&self, x: [usize; N_DIM]) -> usize {
        self.lex_index(x) / 2
    }

    /// Coordinates of checkerboard site `cb` of parity `parity`.
    #[inline]
    #[must_use]
    pub const fn cb_coords(&self, parity: Parity, cb: usize) -> [usize; N_DIM] {
        let base = self.lex_coords(2 * cb);
        let bit = (parity.index() + base[1] + base[2] + base[3]) & 1;
        [base[0] + bit, base[1], base[2], base[3]]
    }

    /// Neighbor in direction `mu` with periodic wrap.
    #[inline]
    #[must_use]
    pub const fn neighbor(&self, x: [usize; N_DIM], mu: usize, forward: bool) -> [usize; N_DIM] {
        self.shift(x, mu, forward, 1)
    }

    /// Site `steps` hops away in direction `mu` (periodic wrap).
    #[inline]
    #[must_use]
    pub const fn shift(
        &self,
        x: [usize; N_DIM],
        mu: usize,
        forward: bool,
        steps: usize,
    ) -> [usize; N_DIM] {
        let mut y = x;
        let d = self.dims[mu];
        let s = steps % d;
        y[mu] = if forward {
            (x[mu] + s) % d
        } else {
            (x[mu] + d - s) % d
        };
        y
    }

    /// Number of times a hop of `steps` from `x` along `mu` crosses the
    /// lattice boundary.
    #[inline]
    #[must_use]
    pub const fn wrap_count(
        &self,
        x: [usize; N_DIM],
        mu: usize,
        forward: bool,
        steps: usize,
    ) -> usize {
        let d = self.dims[mu];
        if forward {
            (x[mu] + steps) / d
        } else {
            (d - 1 - x[mu] + steps) / d
        }
    }
}

impl fmt::Display for LatticeGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.dims;
        write!(f, "{a}x{b}x{c}x{d}")
    }
}
