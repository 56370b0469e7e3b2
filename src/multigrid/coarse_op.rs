// SPDX-License-Identifier: AGPL-3.0-only

//! Galerkin coarse operator.
//!
//!   `(Ĉ v)(c) = X(c) v(c) + Σ_d Y_d(c) v(c + d)`
//!
//! with `d` running over the eight hop directions (`2μ` forward, `2μ + 1`
//! backward). The blocks are found by probing: prolongate a coarse unit
//! vector, apply the fine operator, restrict. Because the fine stencil only
//! reaches nearest neighbors, each probe only touches its own block and the
//! eight around it. On coarse extents of 2 or 1 several directions reach the
//! same site; the coupling is then stored once, in `X` or in the first
//! matching direction.

use rayon::prelude::*;

use crate::error::Result;
use crate::field::spinor::{SpinorField, SpinorView, SpinorViewMut};
use crate::lattice::complex_f64::Complex64;

use super::{CoarseField, CoarseGrid, Transfer};

/// Hop directions on a 4D coarse grid.
pub const N_HOP_DIRS: usize = 8;

/// Where one probed column entry lands.
#[derive(Clone, Copy, Debug)]
enum Slot {
    Local,
    Hop(usize),
}

/// Column index and its entries.
type Column = (usize, Vec<(Slot, usize, Vec<Complex64>)>);

/// `Ĉ = R M P` stored as dense `n_dof × n_dof` blocks per coarse site.
#[derive(Clone, Debug)]
pub struct CoarseOperator {
    grid: CoarseGrid,
    n_dof: usize,
    /// Row-major local blocks, `volume · n_dof²`.
    x: Vec<Complex64>,
    /// Row-major hop blocks per direction.
    y: [Vec<Complex64>; N_HOP_DIRS],
}

impl CoarseOperator {
    /// Probe `apply_fine` through `transfer`.
    ///
    /// # Errors
    ///
    /// Whatever `apply_fine` or the transfer reports.
    pub fn galerkin<F>(transfer: &Transfer, apply_fine: F) -> Result<Self>
    where
        F: Fn(&mut SpinorViewMut<'_>, SpinorView<'_>) -> Result<()> + Sync,
    {
        let grid = transfer.coarse_grid();
        let n_dof = transfer.n_dof();
        let columns: Vec<Column> = (0..grid.volume() * n_dof)
            .into_par_iter()
            .map(|col| -> Result<Column> {
                let (src, j) = (col / n_dof, col % n_dof);
                let unit = CoarseField::unit(grid, n_dof, src, j);
                let mut p = SpinorField::zeros(transfer.fine_layout());
                transfer.prolongate(&mut p.view_mut(), &unit)?;
                let mut mp = SpinorField::zeros(transfer.fine_layout());
                apply_fine(&mut mp.view_mut(), p.view())?;
                let r = transfer.restrict(mp.view())?;
                Ok((j, probe_entries(grid, src, &r)))
            })
            .collect::<Result<_>>()?;

        let block = n_dof * n_dof;
        let mut x = vec![Complex64::ZERO; grid.volume() * block];
        let mut y: [Vec<Complex64>; N_HOP_DIRS] =
            std::array::from_fn(|_| vec![Complex64::ZERO; grid.volume() * block]);
        for (j, entries) in columns {
            for (slot, site, values) in entries {
                let dst = match slot {
                    Slot::Local => &mut x,
                    Slot::Hop(d) => &mut y[d],
                };
                for (i, v) in values.into_iter().enumerate() {
                    dst[site * block + i * n_dof + j] = v;
                }
            }
        }
        log::debug!(
            "coarse operator: grid {:?}, {n_dof} dof per site",
            grid.dims()
        );
        Ok(Self { grid, n_dof, x, y })
    }

    #[must_use]
    pub const fn grid(&self) -> CoarseGrid {
        self.grid
    }

    #[must_use]
    pub const fn n_dof(&self) -> usize {
        self.n_dof
    }

    /// Local block of `site`, row-major.
    #[must_use]
    pub fn local_block(&self, site: usize) -> &[Complex64] {
        let b = self.n_dof * self.n_dof;
        &self.x[site * b..(site + 1) * b]
    }

    /// Hop block of `site` in direction `d`, row-major.
    #[must_use]
    pub fn hop_block(&self, site: usize, d: usize) -> &[Complex64] {
        let b = self.n_dof * self.n_dof;
        &self.y[d][site * b..(site + 1) * b]
    }

    /// `out = Ĉ inp`
    ///
    /// # Errors
    ///
    /// Shape mismatch of either field.
    pub fn apply(&self, out: &mut CoarseField, inp: &CoarseField) -> Result<()> {
        let shape = CoarseField::zeros(self.grid, self.n_dof);
        shape.ensure_same_shape("coarse apply", inp)?;
        shape.ensure_same_shape("coarse apply", out)?;
        let n = self.n_dof;
        out.data_mut()
            .par_chunks_mut(n)
            .enumerate()
            .for_each(|(c, site)| {
                site.fill(Complex64::ZERO);
                mat_vec_acc(site, self.local_block(c), inp.site(c));
                for d in 0..N_HOP_DIRS {
                    mat_vec_acc(site, self.hop_block(c, d), inp.site(self.grid.neighbor(c, d)));
                }
            });
        Ok(())
    }
}

fn mat_vec_acc(out: &mut [Complex64], m: &[Complex64], v: &[Complex64]) {
    let n = v.len();
    for (i, o) in out.iter_mut().enumerate() {
        for (j, vj) in v.iter().enumerate() {
            *o += m[i * n + j] * *vj;
        }
    }
}

/// Entries of the column probed at coarse site `src`: its own block, then
/// each site that reaches `src` through its first matching direction.
fn probe_entries(
    grid: CoarseGrid,
    src: usize,
    r: &CoarseField,
) -> Vec<(Slot, usize, Vec<Complex64>)> {
    let mut entries = vec![(Slot::Local, src, r.site(src).to_vec())];
    for back in 0..N_HOP_DIRS {
        let site = grid.neighbor(src, back);
        if site == src {
            continue;
        }
        let first = (0..N_HOP_DIRS).find(|&d| grid.neighbor(site, d) == src);
        if let Some(d) = first {
            if entries.iter().any(|(_, s, _)| *s == site) {
                continue;
            }
            entries.push((Slot::Hop(d), site, r.site(site).to_vec()));
        }
    }
    entries
}
