// SPDX-License-Identifier: AGPL-3.0-only

//! Gauge link fields.
//!
//! Links `U_μ(x)` are stored as `links[lex(x) * 4 + μ]`. The same type holds
//! the fat (one-hop) and long (three-hop) links of the improved staggered
//! action; those are general 3×3 matrices.
//!
//! The fermion boundary condition in time is a property of the field the
//! operator hops through, so it lives here: with
//! [`TimeBoundary::AntiPeriodic`] every hop that wraps the temporal extent
//! picks up a factor −1.
//!
//! # References
//!
//! - Wilson, PRD 10, 2445 (1974)
//! - Gattringer & Lang, "QCD on the Lattice" (2010), Ch. 3

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{DiracError, Result};
use crate::lattice::constants::N_DIM;
use crate::lattice::geometry::LatticeGeometry;
use crate::lattice::su3::Su3Matrix;

/// Temporal boundary condition seen by quark fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBoundary {
    Periodic,
    #[default]
    AntiPeriodic,
}

/// Direction index of the time axis.
pub const TIME_DIR: usize = 3;

/// 4D field of link variables.
#[derive(Clone, Debug)]
pub struct GaugeField {
    geometry: LatticeGeometry,
    links: Vec<Su3Matrix>,
    boundary: TimeBoundary,
}

impl GaugeField {
    /// All links = identity (free field).
    #[must_use]
    pub fn cold_start(geometry: LatticeGeometry) -> Self {
        Self {
            geometry,
            links: vec![Su3Matrix::IDENTITY; geometry.volume() * N_DIM],
            boundary: TimeBoundary::default(),
        }
    }

    /// Random SU(3) links (disordered configuration).
    #[must_use]
    pub fn hot_start(geometry: LatticeGeometry, seed: u64) -> Self {
        let mut rng = seed;
        let links = (0..geometry.volume() * N_DIM)
            .map(|_| Su3Matrix::random_near_identity(&mut rng, 1.5))
            .collect();
        Self {
            geometry,
            links,
            boundary: TimeBoundary::default(),
        }
    }

    /// Random SU(3) links close to identity; `epsilon` sets the disorder.
    #[must_use]
    pub fn near_identity(geometry: LatticeGeometry, seed: u64, epsilon: f64) -> Self {
        let mut rng = seed;
        let links = (0..geometry.volume() * N_DIM)
            .map(|_| Su3Matrix::random_near_identity(&mut rng, epsilon))
            .collect();
        Self {
            geometry,
            links,
            boundary: TimeBoundary::default(),
        }
    }

    /// Random non-unitary links, for fat/long link stand-ins.
    #[must_use]
    pub fn random_general(geometry: LatticeGeometry, seed: u64, center: f64, sigma: f64) -> Self {
        let mut rng = seed;
        let links = (0..geometry.volume() * N_DIM)
            .map(|_| Su3Matrix::random_general(&mut rng, center, sigma))
            .collect();
        Self {
            geometry,
            links,
            boundary: TimeBoundary::default(),
        }
    }

    /// Wrap externally produced links.
    ///
    /// # Errors
    ///
    /// [`DiracError::ShapeMismatch`] if `links.len() != 4 · volume`.
    pub fn from_links(
        geometry: LatticeGeometry,
        links: Vec<Su3Matrix>,
        boundary: TimeBoundary,
    ) -> Result<Self> {
        if links.len() != geometry.volume() * N_DIM {
            return Err(DiracError::ShapeMismatch(format!(
                "{} links for a {geometry} lattice",
                links.len()
            )));
        }
        Ok(Self {
            geometry,
            links,
            boundary,
        })
    }

    #[must_use]
    pub fn with_boundary(mut self, boundary: TimeBoundary) -> Self {
        self.boundary = boundary;
        self
    }

    #[must_use]
    pub const fn geometry(&self) -> LatticeGeometry {
        self.geometry
    }

    #[must_use]
    pub const fn boundary(&self) -> TimeBoundary {
        self.boundary
    }

    /// `U_μ(x)`
    #[inline]
    pub fn link(&self, x: [usize; N_DIM], mu: usize) -> Su3Matrix {
        self.links[self.geometry.lex_index(x) * N_DIM + mu]
    }

    pub fn set_link(&mut self, x: [usize; N_DIM], mu: usize, u: Su3Matrix) {
        let idx = self.geometry.lex_index(x) * N_DIM + mu;
        self.links[idx] = u;
    }

    /// Boundary phase of a hop of `steps` sites from `x` along `mu`.
    #[inline]
    #[must_use]
    pub const fn hop_sign(&self, x: [usize; N_DIM], mu: usize, forward: bool, steps: usize) -> f64 {
        match self.boundary {
            TimeBoundary::AntiPeriodic if mu == TIME_DIR => {
                if self.geometry.wrap_count(x, mu, forward, steps) % 2 == 1 {
                    -1.0
                } else {
                    1.0
                }
            }
            _ => 1.0,
        }
    }

    /// `P_μν(x) = U_μ(x) U_ν(x+μ) U_μ†(x+ν) U_ν†(x)`
    pub fn plaquette(&self, x: [usize; N_DIM], mu: usize, nu: usize) -> Su3Matrix {
        let x_mu = self.geometry.neighbor(x, mu, true);
        let x_nu = self.geometry.neighbor(x, nu, true);
        self.link(x, mu)
            * self.link(x_mu, nu)
            * self.link(x_nu, mu).adjoint()
            * self.link(x, nu).adjoint()
    }

    /// `<Re Tr P / 3>` over all plaquettes; 1 on a cold start.
    #[must_use]
    pub fn average_plaquette(&self) -> f64 {
        let g = self.geometry;
        let sum: f64 = (0..g.volume())
            .into_par_iter()
            .map(|lex| {
                let x = g.lex_coords(lex);
                let mut s = 0.0;
                for mu in 0..N_DIM {
                    for nu in (mu + 1)..N_DIM {
                        s += self.plaquette(x, mu, nu).re_trace() / 3.0;
                    }
                }
                s
            })
            .sum();
        sum / (g.volume() * 6) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geom() -> LatticeGeometry {
        LatticeGeometry::new([4, 4, 4, 4]).unwrap()
    }

    #[test]
    fn cold_plaquette_is_one() {
        let u = GaugeField::cold_start(geom());
        assert!((u.average_plaquette() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn hot_plaquette_below_one() {
        let u = GaugeField::hot_start(geom(), 42);
        let p = u.average_plaquette();
        assert!(p < 0.9, "hot start plaquette should be well below 1, got {p}");
        assert!(p > -1.0, "plaquette should be > -1.0, got {p}");
    }

    #[test]
    fn antiperiodic_sign_only_on_time_wrap() {
        let u = GaugeField::cold_start(geom());
        assert_eq!(u.hop_sign([0, 0, 0, 3], TIME_DIR, true, 1), -1.0);
        assert_eq!(u.hop_sign([0, 0, 0, 0], TIME_DIR, false, 1), -1.0);
        assert_eq!(u.hop_sign([0, 0, 0, 1], TIME_DIR, true, 1), 1.0);
        assert_eq!(u.hop_sign([3, 0, 0, 0], 0, true, 1), 1.0);
        assert_eq!(u.hop_sign([0, 0, 0, 2], TIME_DIR, true, 3), -1.0);

        let p = u.with_boundary(TimeBoundary::Periodic);
        assert_eq!(p.hop_sign([0, 0, 0, 3], TIME_DIR, true, 1), 1.0);
    }

    #[test]
    fn from_links_checks_length() {
        let g = geom();
        let err = GaugeField::from_links(g, vec![Su3Matrix::IDENTITY; 3], TimeBoundary::Periodic)
            .unwrap_err();
        assert!(matches!(err, DiracError::ShapeMismatch(_)), "{err}");
    }
}
