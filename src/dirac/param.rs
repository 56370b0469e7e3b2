// SPDX-License-Identifier: AGPL-3.0-only

//! Operator parameters and the factory.
//!
//! [`DiracParam`] is the value record a solver fills in; [`Dirac::create`]
//! checks that the fields the chosen [`DiracKind`] needs are present and
//! consistent, then builds the operator. Combinations that only matter at
//! use time (preconditioning type vs. requested solution type) are not
//! checked here.

use std::sync::atomic::AtomicU64;

use serde::{Deserialize, Serialize};

use crate::error::{DiracError, Result};
use crate::field::clover::CloverField;
use crate::field::gauge::GaugeField;
use crate::lattice::constants::{LATTICE_DIVISION_GUARD, MAX_LS};
use crate::lattice::geometry::{LatticeGeometry, Parity};
use crate::multigrid::{CoarseOperator, Transfer};

use super::clover::CloverTerm;
use super::domain_wall::{DomainWall4dTerm, DomainWallTerm};
use super::mobius::MobiusTerm;
use super::staggered::StaggeredTerm;
use super::twisted_clover::TwistedCloverTerm;
use super::twisted_mass::TwistedMassTerm;
use super::{Dirac, DiracBase, Variant};

/// Discretization, with the even-odd preconditioned forms as separate kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiracKind {
    Wilson,
    WilsonPc,
    Clover,
    CloverPc,
    DomainWall,
    DomainWallPc,
    DomainWall4dPc,
    MobiusDomainWallPc,
    TwistedMass,
    TwistedMassPc,
    TwistedClover,
    TwistedCloverPc,
    Staggered,
    StaggeredPc,
    ImprovedStaggered,
    ImprovedStaggeredPc,
}

impl DiracKind {
    /// Acts on a single parity.
    #[must_use]
    pub const fn is_preconditioned(self) -> bool {
        matches!(
            self,
            Self::WilsonPc
                | Self::CloverPc
                | Self::DomainWallPc
                | Self::DomainWall4dPc
                | Self::MobiusDomainWallPc
                | Self::TwistedMassPc
                | Self::TwistedCloverPc
                | Self::StaggeredPc
                | Self::ImprovedStaggeredPc
        )
    }

    /// Color-only fields.
    #[must_use]
    pub const fn is_staggered(self) -> bool {
        matches!(
            self,
            Self::Staggered
                | Self::StaggeredPc
                | Self::ImprovedStaggered
                | Self::ImprovedStaggeredPc
        )
    }

    /// Has a fifth dimension.
    #[must_use]
    pub const fn is_domain_wall(self) -> bool {
        matches!(
            self,
            Self::DomainWall | Self::DomainWallPc | Self::DomainWall4dPc | Self::MobiusDomainWallPc
        )
    }

    #[must_use]
    pub const fn is_twisted(self) -> bool {
        matches!(
            self,
            Self::TwistedMass | Self::TwistedMassPc | Self::TwistedClover | Self::TwistedCloverPc
        )
    }

    #[must_use]
    pub const fn is_clover(self) -> bool {
        matches!(
            self,
            Self::Clover | Self::CloverPc | Self::TwistedClover | Self::TwistedCloverPc
        )
    }
}

/// Even-odd preconditioning class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatPcType {
    /// `1 − κ² A_ee⁻¹ D_eo A_oo⁻¹ D_oe`
    EvenEven,
    /// `1 − κ² A_oo⁻¹ D_oe A_ee⁻¹ D_eo`
    OddOdd,
    /// `A_ee − κ² D_eo A_oo⁻¹ D_oe`
    EvenEvenAsymmetric,
    /// `A_oo − κ² D_oe A_ee⁻¹ D_eo`
    OddOddAsymmetric,
}

impl MatPcType {
    /// Parity the reduced system lives on.
    #[must_use]
    pub const fn parity(self) -> Parity {
        match self {
            Self::EvenEven | Self::EvenEvenAsymmetric => Parity::Even,
            Self::OddOdd | Self::OddOddAsymmetric => Parity::Odd,
        }
    }

    #[must_use]
    pub const fn is_symmetric(self) -> bool {
        matches!(self, Self::EvenEven | Self::OddOdd)
    }
}

/// Which system the caller's `x`, `b` belong to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolutionType {
    /// Full-lattice `M x = b`.
    Mat,
    /// Full-lattice `M†M x = b`.
    MatDagMat,
    /// Already reduced to the preconditioned parity.
    MatPc,
    /// Reduced normal equations.
    MatPcDagMatPc,
}

impl SolutionType {
    /// Fields of this solution type are single-parity.
    #[must_use]
    pub const fn is_preconditioned(self) -> bool {
        matches!(self, Self::MatPc | Self::MatPcDagMatPc)
    }
}

/// Whether `M` or `M†` is applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dagger {
    #[default]
    No,
    Yes,
}

impl Dagger {
    #[must_use]
    pub const fn is_yes(self) -> bool {
        matches!(self, Self::Yes)
    }

    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Self::No => Self::Yes,
            Self::Yes => Self::No,
        }
    }
}

impl From<bool> for Dagger {
    fn from(dagger: bool) -> Self {
        if dagger {
            Self::Yes
        } else {
            Self::No
        }
    }
}

/// Twisted-mass flavor content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TwistFlavor {
    /// Single flavor, `+μ`.
    #[default]
    Plus,
    /// Single flavor, `−μ`.
    Minus,
    /// Non-degenerate doublet; fields carry the flavor index as `ls = 2`.
    Doublet,
}

/// Everything needed to build one operator. Only the fields relevant to
/// `kind` are read.
#[derive(Clone, Debug)]
pub struct DiracParam<'a> {
    pub kind: DiracKind,
    pub kappa: f64,
    /// Quark mass (`m_f` for domain wall, `m` for staggered).
    pub mass: f64,
    /// Domain-wall height.
    pub m5: f64,
    /// Fifth-dimension extent.
    pub ls: usize,
    /// Mobius `b_5` per slice.
    pub b5: Vec<f64>,
    /// Mobius `c_5` per slice.
    pub c5: Vec<f64>,
    /// `None` leaves the class unset; preconditioned use then fails.
    pub matpc: Option<MatPcType>,
    pub dagger: Dagger,
    pub mu: f64,
    pub epsilon: f64,
    pub twist_flavor: TwistFlavor,
    /// Per-dimension halo exchange flags, kept for the caller.
    pub comm_dim: [bool; 4],
    pub gauge: &'a GaugeField,
    pub fat_gauge: Option<&'a GaugeField>,
    pub long_gauge: Option<&'a GaugeField>,
    pub clover: Option<&'a CloverField>,
    pub clover_inv: Option<&'a CloverField>,
    /// Coarse-grid construction only.
    pub transfer: Option<&'a Transfer>,
    /// Coarse-grid construction only.
    pub parent: Option<&'a Dirac<'a>>,
}

impl<'a> DiracParam<'a> {
    /// Defaults for `kind` on `gauge`: `κ = 1/8`, zero masses and twists,
    /// `Ls = 1`, no preconditioning class, all dimensions communicating.
    #[must_use]
    pub const fn new(kind: DiracKind, gauge: &'a GaugeField) -> Self {
        Self {
            kind,
            kappa: 0.125,
            mass: 0.0,
            m5: 0.0,
            ls: 1,
            b5: Vec::new(),
            c5: Vec::new(),
            matpc: None,
            dagger: Dagger::No,
            mu: 0.0,
            epsilon: 0.0,
            twist_flavor: TwistFlavor::Plus,
            comm_dim: [true; 4],
            gauge,
            fat_gauge: None,
            long_gauge: None,
            clover: None,
            clover_inv: None,
            transfer: None,
            parent: None,
        }
    }

    /// Log every parameter at info level.
    pub fn print(&self) {
        log::info!("Dirac parameters");
        log::info!("  kind = {:?}", self.kind);
        log::info!("  kappa = {}", self.kappa);
        log::info!("  mass = {}", self.mass);
        log::info!("  m5 = {}", self.m5);
        log::info!("  Ls = {}", self.ls);
        log::info!("  matpc = {:?}", self.matpc);
        log::info!("  dagger = {:?}", self.dagger);
        log::info!("  mu = {}", self.mu);
        log::info!("  epsilon = {}", self.epsilon);
        log::info!("  twist_flavor = {:?}", self.twist_flavor);
        for (mu, on) in self.comm_dim.iter().enumerate() {
            log::info!("  comm_dim[{mu}] = {on}");
        }
        for (s, (b, c)) in self.b5.iter().zip(&self.c5).enumerate() {
            log::info!("  b5[{s}] = {b:e}\tc5[{s}] = {c:e}");
        }
    }

    /// Galerkin coarse operator of `parent` through `transfer`.
    ///
    /// # Errors
    ///
    /// [`DiracError::Config`] when either reference is missing, otherwise
    /// whatever [`Dirac::create_coarse_op`] reports.
    pub fn build_coarse_operator(&self) -> Result<CoarseOperator> {
        let parent = self
            .parent
            .ok_or_else(|| DiracError::config("coarse operator needs a parent operator"))?;
        let transfer = self
            .transfer
            .ok_or_else(|| DiracError::config("coarse operator needs a transfer"))?;
        parent.create_coarse_op(transfer)
    }

    /// `κ5 = 0.5 / (b₀ (4 + m5) + 1)` (Shamir: `b₀ = 1`).
    fn kappa5(&self, b0: f64) -> Result<f64> {
        let denom = b0.mul_add(4.0 + self.m5, 1.0);
        if denom.abs() < LATTICE_DIVISION_GUARD {
            return Err(DiracError::config(format!(
                "domain-wall height m5 = {} gives a vanishing kappa5 denominator",
                self.m5
            )));
        }
        Ok(0.5 / denom)
    }

    fn check_ls(&self) -> Result<()> {
        if self.ls == 0 || self.ls > MAX_LS {
            return Err(DiracError::config(format!(
                "Ls = {} outside 1..={MAX_LS}",
                self.ls
            )));
        }
        Ok(())
    }

    fn require_clover(&self) -> Result<&'a CloverField> {
        let clover = self
            .clover
            .ok_or_else(|| DiracError::config(format!("{:?} needs a clover field", self.kind)))?;
        if clover.is_inverse() {
            return Err(DiracError::config("clover slot holds an inverse"));
        }
        self.same_geometry("clover", clover.geometry())?;
        Ok(clover)
    }

    fn require_clover_inv(&self, twist: Option<f64>) -> Result<&'a CloverField> {
        self.optional_clover_inv(twist)?.ok_or_else(|| {
            DiracError::config(format!("{:?} needs a precomputed clover inverse", self.kind))
        })
    }

    /// The inverse in `clover_inv`, checked against the lattice and `twist`
    /// when present.
    fn optional_clover_inv(&self, twist: Option<f64>) -> Result<Option<&'a CloverField>> {
        let Some(inv) = self.clover_inv else {
            return Ok(None);
        };
        if !inv.is_inverse() {
            return Err(DiracError::config("clover_inv slot does not hold an inverse"));
        }
        self.same_geometry("clover inverse", inv.geometry())?;
        let matches = match (inv.twist(), twist) {
            (None, None) => true,
            (Some(have), Some(want)) => (have - want).abs() <= 1e-12 * want.abs().max(1.0),
            _ => false,
        };
        if !matches {
            return Err(DiracError::config(format!(
                "clover inverse built for twist {:?}, operator needs {:?}",
                inv.twist(),
                twist
            )));
        }
        Ok(Some(inv))
    }

    fn same_geometry(&self, what: &str, other: LatticeGeometry) -> Result<()> {
        if other == self.gauge.geometry() {
            Ok(())
        } else {
            Err(DiracError::config(format!(
                "{what} lattice {other} does not match gauge lattice {}",
                self.gauge.geometry()
            )))
        }
    }

    fn variant(&self) -> Result<Variant<'a>> {
        use DiracKind as K;
        Ok(match self.kind {
            K::Wilson | K::WilsonPc => Variant::Wilson,
            K::Clover => Variant::Clover(CloverTerm::new(
                self.require_clover()?,
                self.optional_clover_inv(None)?,
            )),
            K::CloverPc => Variant::Clover(CloverTerm::new(
                self.require_clover()?,
                Some(self.require_clover_inv(None)?),
            )),
            K::TwistedMass | K::TwistedMassPc => Variant::TwistedMass(TwistedMassTerm::new(
                self.kappa,
                self.mu,
                self.epsilon,
                self.twist_flavor,
            )),
            K::TwistedClover | K::TwistedCloverPc => {
                if self.twist_flavor == TwistFlavor::Doublet {
                    return Err(DiracError::config("twisted clover supports single flavors only"));
                }
                let a = TwistedMassTerm::twist_for(self.kappa, self.mu, self.twist_flavor);
                let inv = if self.kind == K::TwistedCloverPc {
                    Some(self.require_clover_inv(Some(a))?)
                } else {
                    self.optional_clover_inv(Some(a))?
                };
                Variant::TwistedClover(TwistedCloverTerm::new(self.require_clover()?, inv, a))
            }
            K::DomainWall | K::DomainWallPc => {
                self.check_ls()?;
                Variant::DomainWall(DomainWallTerm::new(self.ls, self.m5, self.kappa5(1.0)?))
            }
            K::DomainWall4dPc => {
                self.check_ls()?;
                let kappa5 = self.kappa5(1.0)?;
                Variant::DomainWall4d(DomainWall4dTerm::new(self.ls, self.m5, self.mass, kappa5)?)
            }
            K::MobiusDomainWallPc => {
                self.check_ls()?;
                if self.b5.len() != self.ls || self.c5.len() != self.ls {
                    return Err(DiracError::config(format!(
                        "Mobius needs {} b5 and c5 values, got {} and {}",
                        self.ls,
                        self.b5.len(),
                        self.c5.len()
                    )));
                }
                let kappa5 = self.kappa5(self.b5[0])?;
                Variant::Mobius(MobiusTerm::new(&self.b5, &self.c5, self.m5, self.mass, kappa5)?)
            }
            K::Staggered | K::StaggeredPc => {
                let links = match self.fat_gauge {
                    Some(fat) => {
                        self.same_geometry("fat links", fat.geometry())?;
                        fat
                    }
                    None => self.gauge,
                };
                Variant::Staggered(StaggeredTerm::naive(links))
            }
            K::ImprovedStaggered | K::ImprovedStaggeredPc => {
                let fat = self
                    .fat_gauge
                    .ok_or_else(|| DiracError::config("improved staggered needs fat links"))?;
                let long = self
                    .long_gauge
                    .ok_or_else(|| DiracError::config("improved staggered needs long links"))?;
                self.same_geometry("fat links", fat.geometry())?;
                self.same_geometry("long links", long.geometry())?;
                Variant::Staggered(StaggeredTerm::improved(fat, long))
            }
        })
    }
}

impl<'a> Dirac<'a> {
    /// Build the operator `param` describes.
    ///
    /// # Errors
    ///
    /// [`DiracError::Config`] when a field the kind needs is missing, holds
    /// the wrong thing, or lives on a different lattice.
    pub fn create(param: &DiracParam<'a>) -> Result<Self> {
        let variant = param.variant()?;
        log::debug!(
            "created {:?} operator on {} (kappa={}, mass={}, matpc={:?})",
            param.kind,
            param.gauge.geometry(),
            param.kappa,
            param.mass,
            param.matpc
        );
        Ok(Self {
            base: DiracBase {
                kind: param.kind,
                gauge: param.gauge,
                kappa: param.kappa,
                mass: param.mass,
                matpc: param.matpc,
                dagger: param.dagger,
                comm_dim: param.comm_dim,
                flops: AtomicU64::new(0),
            },
            variant,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gauge() -> GaugeField {
        GaugeField::cold_start(LatticeGeometry::new([2, 2, 2, 4]).unwrap())
    }

    #[test]
    fn kind_tags() {
        assert!(DiracKind::CloverPc.is_preconditioned());
        assert!(!DiracKind::DomainWall.is_preconditioned());
        assert!(DiracKind::ImprovedStaggeredPc.is_staggered());
        assert!(DiracKind::MobiusDomainWallPc.is_domain_wall());
        assert!(DiracKind::TwistedCloverPc.is_twisted() && DiracKind::TwistedCloverPc.is_clover());
        assert_eq!(MatPcType::OddOddAsymmetric.parity(), Parity::Odd);
        assert!(!MatPcType::OddOddAsymmetric.is_symmetric());
        assert_eq!(Dagger::No.flip(), Dagger::Yes);
    }

    #[test]
    fn missing_fields_fail_at_construction() {
        let u = gauge();
        let err = Dirac::create(&DiracParam::new(DiracKind::CloverPc, &u)).unwrap_err();
        assert!(matches!(err, DiracError::Config(_)), "{err}");

        let clover = CloverField::unit(u.geometry());
        let p = DiracParam {
            clover: Some(&clover),
            ..DiracParam::new(DiracKind::CloverPc, &u)
        };
        assert!(Dirac::create(&p).is_err(), "CloverPc without inverse");

        let p = DiracParam {
            ls: 4,
            b5: vec![1.0; 3],
            c5: vec![0.0; 4],
            m5: -1.8,
            ..DiracParam::new(DiracKind::MobiusDomainWallPc, &u)
        };
        assert!(Dirac::create(&p).is_err(), "short b5");

        assert!(Dirac::create(&DiracParam::new(DiracKind::ImprovedStaggered, &u)).is_err());
    }

    #[test]
    fn unset_matpc_fails_at_use_not_construction() {
        let u = gauge();
        let d = Dirac::create(&DiracParam::new(DiracKind::WilsonPc, &u)).unwrap();
        assert_eq!(d.matpc_type(), None);
    }

    #[test]
    fn print_smoke() {
        let u = gauge();
        let param = DiracParam {
            ls: 2,
            b5: vec![1.5, 1.5],
            c5: vec![0.5, 0.5],
            ..DiracParam::new(DiracKind::MobiusDomainWallPc, &u)
        };
        // logs only; nothing to compare without an installed logger
        param.print();
    }

    #[test]
    fn twisted_inverse_must_match_operator_twist() {
        let u = gauge();
        let clover = CloverField::unit(u.geometry());
        let wrong = clover.twisted_inverse(0.5).unwrap();
        let p = DiracParam {
            kappa: 0.1,
            mu: 0.2,
            clover: Some(&clover),
            clover_inv: Some(&wrong),
            ..DiracParam::new(DiracKind::TwistedCloverPc, &u)
        };
        assert!(Dirac::create(&p).is_err());
        let right = clover.twisted_inverse(2.0 * 0.1 * 0.2).unwrap();
        let p = DiracParam {
            clover_inv: Some(&right),
            ..p
        };
        assert!(Dirac::create(&p).is_ok());
    }

    #[test]
    fn geometry_mismatch_is_a_config_error() {
        let u = gauge();
        let other = CloverField::unit(LatticeGeometry::new([4, 4, 4, 4]).unwrap());
        let p = DiracParam {
            clover: Some(&other),
            ..DiracParam::new(DiracKind::Clover, &u)
        };
        assert!(matches!(Dirac::create(&p), Err(DiracError::Config(_))));
    }

    #[test]
    fn naive_staggered_rejects_fat_links_on_another_lattice() {
        let u = gauge();
        let small = GaugeField::cold_start(LatticeGeometry::new([2, 2, 2, 2]).unwrap());
        let p = DiracParam {
            fat_gauge: Some(&small),
            ..DiracParam::new(DiracKind::Staggered, &u)
        };
        let err = Dirac::create(&p).unwrap_err();
        assert!(matches!(err, DiracError::Config(_)), "{err}");

        let fat = GaugeField::near_identity(u.geometry(), 3, 0.2);
        let p = DiracParam {
            fat_gauge: Some(&fat),
            ..p
        };
        assert!(Dirac::create(&p).is_ok());
    }

    #[test]
    fn optional_clover_inverse_is_checked_on_full_kinds() {
        let u = gauge();
        let clover = CloverField::from_gauge(&u, 0.1, 1.0);
        let other = CloverField::unit(LatticeGeometry::new([4, 4, 4, 4]).unwrap());
        let other_inv = other.inverse().unwrap();
        let base = DiracParam {
            kappa: 0.1,
            mu: 0.2,
            clover: Some(&clover),
            ..DiracParam::new(DiracKind::Clover, &u)
        };

        // the clover term itself is not an inverse
        for bad in [&clover, &other_inv] {
            let p = DiracParam {
                clover_inv: Some(bad),
                ..base.clone()
            };
            let err = Dirac::create(&p).unwrap_err();
            assert!(matches!(err, DiracError::Config(_)), "{err}");
        }
        assert!(Dirac::create(&base).is_ok());

        let untwisted = clover.inverse().unwrap();
        let p = DiracParam {
            kind: DiracKind::TwistedClover,
            clover_inv: Some(&untwisted),
            ..base.clone()
        };
        let err = Dirac::create(&p).unwrap_err();
        assert!(matches!(err, DiracError::Config(_)), "{err}");

        let twisted = clover.twisted_inverse(2.0 * 0.1 * 0.2).unwrap();
        let p = DiracParam {
            kind: DiracKind::TwistedClover,
            clover_inv: Some(&twisted),
            ..base
        };
        assert!(Dirac::create(&p).is_ok());
    }
}
