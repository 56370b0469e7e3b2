// SPDX-License-Identifier: AGPL-3.0-only

//! Block-aggregation transfer between a fine Wilson field and a coarse grid.
//!
//! The fine lattice is cut into hypercubic blocks; each block and chirality
//! forms one aggregate. Near-null vectors restricted to an aggregate are
//! orthonormalized there (Gram-Schmidt), so the prolongator `P` has
//! orthonormal columns and the restrictor `R = P†` satisfies `R P = 1`.
//! Keeping chiralities apart makes `P` commute with γ5.

use rayon::prelude::*;

use crate::error::{DiracError, Result};
use crate::field::spinor::{FieldLayout, SiteSubset, SpinorField, SpinorView, SpinorViewMut};
use crate::lattice::complex_f64::Complex64;
use crate::lattice::constants::{N_COLORS, N_DIM, N_SPIN_WILSON};
use crate::tolerances::GRAM_SCHMIDT_DEPENDENCE;

use super::{CoarseField, CoarseGrid};

/// Chiralities kept apart in every aggregate.
pub const N_CHIRALITY: usize = 2;

/// Prolongator built from orthonormalized near-null vectors.
#[derive(Clone, Debug)]
pub struct Transfer {
    fine: FieldLayout,
    block: [usize; N_DIM],
    coarse: CoarseGrid,
    /// Orthonormalized vectors, full fine-field data each.
    vectors: Vec<Vec<Complex64>>,
    /// Element offsets of aggregate `site · 2 + chirality`.
    aggregates: Vec<Vec<usize>>,
    /// Aggregate index of every fine element.
    owner: Vec<usize>,
}

impl Transfer {
    /// Aggregate `null_vectors` over blocks of extent `block`.
    ///
    /// # Errors
    ///
    /// [`DiracError::Config`] for an empty vector set, a block that does not
    /// tile the lattice, or vectors that are linearly dependent on some
    /// aggregate; [`DiracError::ShapeMismatch`] for vectors that are not
    /// full 4D Wilson fields of one shape.
    pub fn new(null_vectors: &[SpinorField], block: [usize; N_DIM]) -> Result<Self> {
        let first = null_vectors
            .first()
            .ok_or_else(|| DiracError::config("transfer needs at least one null vector"))?;
        let fine = *first.layout();
        let g = fine.geometry;
        let expected = FieldLayout::wilson(g, SiteSubset::Full);
        for v in null_vectors {
            expected.ensure_matches("transfer", v.layout())?;
        }
        let dims = g.dims();
        let mut coarse_dims = [0; N_DIM];
        for mu in 0..N_DIM {
            if block[mu] == 0 || dims[mu] % block[mu] != 0 {
                return Err(DiracError::config(format!(
                    "block {block:?} does not tile lattice {g}"
                )));
            }
            coarse_dims[mu] = dims[mu] / block[mu];
        }
        let coarse = CoarseGrid::new(coarse_dims)?;

        let mut aggregates = vec![Vec::new(); coarse.volume() * N_CHIRALITY];
        let mut owner = vec![0; fine.len()];
        for lex in 0..g.volume() {
            let x = g.lex_coords(lex);
            let c = coarse.lex_index(std::array::from_fn(|mu| x[mu] / block[mu]));
            let Some(site) = fine.offset_of(x, 0) else {
                continue;
            };
            for spin in 0..N_SPIN_WILSON {
                let agg = c * N_CHIRALITY + spin / 2;
                for color in 0..N_COLORS {
                    let off = site + spin * N_COLORS + color;
                    aggregates[agg].push(off);
                    owner[off] = agg;
                }
            }
        }

        let mut vectors: Vec<Vec<Complex64>> =
            null_vectors.iter().map(|v| v.data().to_vec()).collect();
        for (a, elems) in aggregates.iter().enumerate() {
            orthonormalize(&mut vectors, elems).map_err(|k| {
                DiracError::config(format!(
                    "null vector {k} is linearly dependent on aggregate {a}"
                ))
            })?;
        }
        log::debug!(
            "transfer: {} null vectors, block {block:?}, coarse grid {coarse_dims:?}",
            null_vectors.len()
        );
        Ok(Self {
            fine,
            block,
            coarse,
            vectors,
            aggregates,
            owner,
        })
    }

    #[must_use]
    pub const fn fine_layout(&self) -> FieldLayout {
        self.fine
    }

    #[must_use]
    pub const fn block(&self) -> [usize; N_DIM] {
        self.block
    }

    #[must_use]
    pub const fn coarse_grid(&self) -> CoarseGrid {
        self.coarse
    }

    #[must_use]
    pub fn n_vec(&self) -> usize {
        self.vectors.len()
    }

    /// Degrees of freedom per coarse site.
    #[must_use]
    pub fn n_dof(&self) -> usize {
        N_CHIRALITY * self.n_vec()
    }

    /// Coarse field of zeros shaped for this transfer.
    #[must_use]
    pub fn coarse_zeros(&self) -> CoarseField {
        CoarseField::zeros(self.coarse, self.n_dof())
    }

    /// `R fine` with `R = P†`.
    ///
    /// # Errors
    ///
    /// Shape mismatch of `fine`.
    pub fn restrict(&self, fine: SpinorView<'_>) -> Result<CoarseField> {
        self.fine.ensure_matches("restrict", fine.layout())?;
        let n_vec = self.n_vec();
        let n_dof = self.n_dof();
        let data = fine.data();
        let mut out = self.coarse_zeros();
        out.data_mut()
            .par_chunks_mut(n_dof)
            .enumerate()
            .for_each(|(c, site)| {
                for chi in 0..N_CHIRALITY {
                    let elems = &self.aggregates[c * N_CHIRALITY + chi];
                    for (k, v) in self.vectors.iter().enumerate() {
                        site[chi * n_vec + k] = elems.iter().map(|&i| v[i].conj_mul(data[i])).sum();
                    }
                }
            });
        Ok(out)
    }

    /// `fine = P coarse`
    ///
    /// # Errors
    ///
    /// Shape mismatch of either field.
    pub fn prolongate(&self, fine: &mut SpinorViewMut<'_>, coarse: &CoarseField) -> Result<()> {
        self.fine.ensure_matches("prolongate", fine.layout())?;
        if coarse.grid() != self.coarse || coarse.n_dof() != self.n_dof() {
            return Err(DiracError::ShapeMismatch(format!(
                "prolongate: coarse field {:?}x{} vs transfer {:?}x{}",
                coarse.grid().dims(),
                coarse.n_dof(),
                self.coarse.dims(),
                self.n_dof()
            )));
        }
        let n_vec = self.n_vec();
        let n_dof = self.n_dof();
        let cd = coarse.data();
        fine.data_mut()
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, z)| {
                let agg = self.owner[i];
                let base = (agg / N_CHIRALITY) * n_dof + (agg % N_CHIRALITY) * n_vec;
                *z = self
                    .vectors
                    .iter()
                    .enumerate()
                    .map(|(k, v)| v[i] * cd[base + k])
                    .sum();
            });
        Ok(())
    }
}

/// Gram-Schmidt over the elements `elems` of every vector. On failure
/// returns the index of the dependent vector.
fn orthonormalize(
    vectors: &mut [Vec<Complex64>],
    elems: &[usize],
) -> std::result::Result<(), usize> {
    for k in 0..vectors.len() {
        let (done, rest) = vectors.split_at_mut(k);
        let v = &mut rest[0];
        let before: f64 = elems.iter().map(|&i| v[i].abs_sq()).sum();
        for u in done.iter() {
            let proj: Complex64 = elems.iter().map(|&i| u[i].conj_mul(v[i])).sum();
            for &i in elems {
                v[i] -= u[i] * proj;
            }
        }
        let norm2: f64 = elems.iter().map(|&i| v[i].abs_sq()).sum();
        if before == 0.0 || norm2 < GRAM_SCHMIDT_DEPENDENCE * before {
            return Err(k);
        }
        let inv = norm2.sqrt().recip();
        for &i in elems {
            v[i] = v[i].scale(inv);
        }
    }
    Ok(())
}
