// SPDX-License-Identifier: AGPL-3.0-only

//! Two-level multigrid pieces: aggregation transfer and the Galerkin coarse
//! operator.
//!
//! | Type | Role |
//! |------|------|
//! | [`CoarseGrid`] | Coarse lattice extents (any positive size, periodic) |
//! | [`CoarseField`] | `n_dof` complex values per coarse site |
//! | [`Transfer`] | Prolongator `P` / restrictor `R = P†` |
//! | [`CoarseOperator`] | `Ĉ = R M P` as local `X` and eight hopping blocks `Y` |

use crate::error::{DiracError, Result};
use crate::lattice::complex_f64::Complex64;
use crate::lattice::constants::{lcg_gaussian, N_DIM};

mod coarse_op;
mod transfer;

pub use coarse_op::{CoarseOperator, N_HOP_DIRS};
pub use transfer::{Transfer, N_CHIRALITY};

/// Coarse lattice. Unlike the fine geometry, extents may be odd or 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CoarseGrid {
    dims: [usize; N_DIM],
}

impl CoarseGrid {
    /// # Errors
    ///
    /// [`DiracError::Config`] if any extent is zero.
    pub fn new(dims: [usize; N_DIM]) -> Result<Self> {
        if dims.contains(&0) {
            return Err(DiracError::config(format!("coarse extents {dims:?} contain zero")));
        }
        Ok(Self { dims })
    }

    #[must_use]
    pub const fn dims(&self) -> [usize; N_DIM] {
        self.dims
    }

    #[must_use]
    pub const fn volume(&self) -> usize {
        self.dims[0] * self.dims[1] * self.dims[2] * self.dims[3]
    }

    /// `x0` fastest.
    #[must_use]
    pub const fn lex_index(&self, x: [usize; N_DIM]) -> usize {
        x[0] + self.dims[0] * (x[1] + self.dims[1] * (x[2] + self.dims[2] * x[3]))
    }

    #[must_use]
    pub const fn lex_coords(&self, lex: usize) -> [usize; N_DIM] {
        let x0 = lex % self.dims[0];
        let r = lex / self.dims[0];
        let x1 = r % self.dims[1];
        let r = r / self.dims[1];
        [x0, x1, r % self.dims[2], r / self.dims[2]]
    }

    /// Lex index of the neighbor of site `lex` in hop direction `d`
    /// (`2μ` forward, `2μ + 1` backward).
    #[must_use]
    pub fn neighbor(&self, lex: usize, d: usize) -> usize {
        let mu = d / 2;
        let mut x = self.lex_coords(lex);
        let n = self.dims[mu];
        x[mu] = if d % 2 == 0 { (x[mu] + 1) % n } else { (x[mu] + n - 1) % n };
        self.lex_index(x)
    }
}

/// Field on a coarse grid.
#[derive(Clone, Debug, PartialEq)]
pub struct CoarseField {
    grid: CoarseGrid,
    n_dof: usize,
    data: Vec<Complex64>,
}

impl CoarseField {
    #[must_use]
    pub fn zeros(grid: CoarseGrid, n_dof: usize) -> Self {
        Self {
            grid,
            n_dof,
            data: vec![Complex64::ZERO; grid.volume() * n_dof],
        }
    }

    /// Gaussian entries, deterministic in `seed`.
    #[must_use]
    pub fn random(grid: CoarseGrid, n_dof: usize, seed: u64) -> Self {
        let mut rng = seed;
        let data = (0..grid.volume() * n_dof)
            .map(|_| {
                let re = lcg_gaussian(&mut rng);
                Complex64::new(re, lcg_gaussian(&mut rng))
            })
            .collect();
        Self { grid, n_dof, data }
    }

    /// Unit vector at `(site, dof)`.
    #[must_use]
    pub fn unit(grid: CoarseGrid, n_dof: usize, site: usize, dof: usize) -> Self {
        let mut f = Self::zeros(grid, n_dof);
        f.data[site * n_dof + dof] = Complex64::ONE;
        f
    }

    #[must_use]
    pub const fn grid(&self) -> CoarseGrid {
        self.grid
    }

    #[must_use]
    pub const fn n_dof(&self) -> usize {
        self.n_dof
    }

    #[must_use]
    pub fn data(&self) -> &[Complex64] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [Complex64] {
        &mut self.data
    }

    /// Values of one coarse site.
    #[must_use]
    pub fn site(&self, site: usize) -> &[Complex64] {
        &self.data[site * self.n_dof..(site + 1) * self.n_dof]
    }

    #[must_use]
    pub fn norm2(&self) -> f64 {
        self.data.iter().map(|z| z.abs_sq()).sum()
    }

    /// `<self | other>`
    ///
    /// # Errors
    ///
    /// [`DiracError::ShapeMismatch`] for fields of different shape.
    pub fn dot(&self, other: &Self) -> Result<Complex64> {
        self.ensure_same_shape("coarse dot", other)?;
        Ok(self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| a.conj_mul(*b))
            .sum())
    }

    pub(crate) fn ensure_same_shape(&self, operation: &str, other: &Self) -> Result<()> {
        if self.grid == other.grid && self.n_dof == other.n_dof {
            Ok(())
        } else {
            Err(DiracError::ShapeMismatch(format!(
                "{operation}: {:?}x{} vs {:?}x{}",
                self.grid.dims,
                self.n_dof,
                other.grid.dims,
                other.n_dof
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbors_wrap_on_small_extents() {
        let g = CoarseGrid::new([3, 2, 1, 2]).unwrap();
        assert_eq!(g.volume(), 12);
        let origin = g.lex_index([0, 0, 0, 0]);
        assert_eq!(g.neighbor(origin, 1), g.lex_index([2, 0, 0, 0]));
        assert_eq!(g.neighbor(origin, 2), g.neighbor(origin, 3));
        assert_eq!(g.neighbor(origin, 4), origin);
        for lex in 0..g.volume() {
            assert_eq!(g.lex_index(g.lex_coords(lex)), lex);
        }
        assert!(CoarseGrid::new([1, 0, 1, 1]).is_err());
    }

    #[test]
    fn dot_requires_same_shape() {
        let g = CoarseGrid::new([2, 2, 2, 2]).unwrap();
        let a = CoarseField::random(g, 4, 1);
        let b = CoarseField::zeros(g, 2);
        assert!(a.dot(&b).is_err());
        let n = a.dot(&a).unwrap();
        assert!((n.re - a.norm2()).abs() < 1e-12 * a.norm2(), "{n}");
    }
}
