// SPDX-License-Identifier: AGPL-3.0-only

//! Solver-side operator configuration.
//!
//! [`DiracConfig`] is the serializable record an application keeps next to
//! its inverter settings. It names the discretization by [`DslashType`] and
//! leaves the choice between the full and the even-odd preconditioned form
//! to [`DiracConfig::dirac_param`], which fills a [`DiracParam`] with the
//! fields the caller owns.
//!
//! ```json
//! { "dslash_type": "clover", "mass": -0.2, "matpc": "even_even" }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dirac::{Dagger, DiracKind, DiracParam, MatPcType, TwistFlavor};
use crate::error::{DiracError, Result};
use crate::field::clover::CloverField;
use crate::field::gauge::GaugeField;

/// Discretization family, independent of preconditioning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DslashType {
    Wilson,
    Clover,
    TwistedMass,
    TwistedClover,
    DomainWall,
    DomainWall4d,
    Mobius,
    Staggered,
    ImprovedStaggered,
}

impl DslashType {
    /// Operator kind for the full (`pc = false`) or reduced system.
    ///
    /// # Errors
    ///
    /// [`DiracError::Config`] for the 4D-preconditioned domain-wall
    /// families, which have no full-lattice form.
    pub fn kind(self, pc: bool) -> Result<DiracKind> {
        let kind = match (self, pc) {
            (Self::Wilson, false) => DiracKind::Wilson,
            (Self::Wilson, true) => DiracKind::WilsonPc,
            (Self::Clover, false) => DiracKind::Clover,
            (Self::Clover, true) => DiracKind::CloverPc,
            (Self::TwistedMass, false) => DiracKind::TwistedMass,
            (Self::TwistedMass, true) => DiracKind::TwistedMassPc,
            (Self::TwistedClover, false) => DiracKind::TwistedClover,
            (Self::TwistedClover, true) => DiracKind::TwistedCloverPc,
            (Self::DomainWall, false) => DiracKind::DomainWall,
            (Self::DomainWall, true) => DiracKind::DomainWallPc,
            (Self::DomainWall4d, true) => DiracKind::DomainWall4dPc,
            (Self::Mobius, true) => DiracKind::MobiusDomainWallPc,
            (Self::Staggered, false) => DiracKind::Staggered,
            (Self::Staggered, true) => DiracKind::StaggeredPc,
            (Self::ImprovedStaggered, false) => DiracKind::ImprovedStaggered,
            (Self::ImprovedStaggered, true) => DiracKind::ImprovedStaggeredPc,
            (Self::DomainWall4d | Self::Mobius, false) => {
                return Err(DiracError::config(format!(
                    "{self:?} exists only in preconditioned form"
                )));
            }
        };
        Ok(kind)
    }
}

/// Background fields an operator borrows.
#[derive(Clone, Copy, Debug)]
pub struct DiracFields<'a> {
    pub gauge: &'a GaugeField,
    pub fat_gauge: Option<&'a GaugeField>,
    pub long_gauge: Option<&'a GaugeField>,
    pub clover: Option<&'a CloverField>,
    pub clover_inv: Option<&'a CloverField>,
}

impl<'a> DiracFields<'a> {
    /// Only the thin gauge field.
    #[must_use]
    pub const fn gauge(gauge: &'a GaugeField) -> Self {
        Self {
            gauge,
            fat_gauge: None,
            long_gauge: None,
            clover: None,
            clover_inv: None,
        }
    }
}

/// Operator parameters as stored alongside inverter settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiracConfig {
    pub dslash_type: DslashType,
    /// Hopping parameter; derived from `mass` when absent.
    pub kappa: Option<f64>,
    pub mass: f64,
    pub m5: f64,
    pub ls: usize,
    /// Mobius `b_5`: one value per slice, or a single value for all slices.
    pub b5: Vec<f64>,
    /// Mobius `c_5`, same convention as `b5`.
    pub c5: Vec<f64>,
    pub matpc: Option<MatPcType>,
    pub dagger: bool,
    pub mu: f64,
    pub epsilon: f64,
    pub twist_flavor: TwistFlavor,
    pub comm_dim: [bool; 4],
}

impl Default for DiracConfig {
    fn default() -> Self {
        Self {
            dslash_type: DslashType::Wilson,
            kappa: None,
            mass: 0.0,
            m5: 0.0,
            ls: 1,
            b5: Vec::new(),
            c5: Vec::new(),
            matpc: None,
            dagger: false,
            mu: 0.0,
            epsilon: 0.0,
            twist_flavor: TwistFlavor::Plus,
            comm_dim: [true; 4],
        }
    }
}

impl DiracConfig {
    /// # Errors
    ///
    /// [`DiracError::ConfigParse`] for malformed JSON or unknown variants.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Streaming read of a JSON file.
    ///
    /// # Errors
    ///
    /// [`DiracError::Io`] if the file cannot be opened,
    /// [`DiracError::ConfigParse`] if it does not deserialize.
    pub fn from_path(path: &Path) -> Result<Self> {
        let reader = std::io::BufReader::new(std::fs::File::open(path)?);
        let config = serde_json::from_reader(reader)?;
        log::debug!("loaded operator configuration from {}", path.display());
        Ok(config)
    }

    /// `κ`, or `1 / (2 (4 + mass))` when unset.
    #[must_use]
    pub fn kappa(&self) -> f64 {
        self.kappa.unwrap_or_else(|| 0.5 / (4.0 + self.mass))
    }

    /// Parameters for the full (`pc = false`) or even-odd reduced operator
    /// on `fields`.
    ///
    /// # Errors
    ///
    /// [`DiracError::Config`] when the family has no form for `pc`, or when
    /// `b5`/`c5` have neither one nor `ls` entries.
    pub fn dirac_param<'a>(&self, pc: bool, fields: DiracFields<'a>) -> Result<DiracParam<'a>> {
        let kind = self.dslash_type.kind(pc)?;
        let (b5, c5) = if kind == DiracKind::MobiusDomainWallPc {
            (self.per_slice("b5", &self.b5)?, self.per_slice("c5", &self.c5)?)
        } else {
            (Vec::new(), Vec::new())
        };
        Ok(DiracParam {
            kappa: self.kappa(),
            mass: self.mass,
            m5: self.m5,
            ls: self.ls,
            b5,
            c5,
            matpc: self.matpc,
            dagger: Dagger::from(self.dagger),
            mu: self.mu,
            epsilon: self.epsilon,
            twist_flavor: self.twist_flavor,
            comm_dim: self.comm_dim,
            fat_gauge: fields.fat_gauge,
            long_gauge: fields.long_gauge,
            clover: fields.clover,
            clover_inv: fields.clover_inv,
            ..DiracParam::new(kind, fields.gauge)
        })
    }

    fn per_slice(&self, name: &str, values: &[f64]) -> Result<Vec<f64>> {
        match values {
            [v] => Ok(vec![*v; self.ls]),
            _ if values.len() == self.ls => Ok(values.to_vec()),
            _ => Err(DiracError::config(format!(
                "{name} has {} entries, expected 1 or Ls = {}",
                values.len(),
                self.ls
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dirac::Dirac;
    use approx::assert_relative_eq;
    use crate::lattice::geometry::LatticeGeometry;

    #[test]
    fn kappa_derived_from_mass() {
        let c = DiracConfig::from_json_str(r#"{ "dslash_type": "wilson", "mass": 0.1 }"#).unwrap();
        assert_relative_eq!(c.kappa(), 0.5 / 4.1, max_relative = 1e-15);
        let c = DiracConfig::from_json_str(r#"{ "kappa": 0.13, "mass": 0.1 }"#).unwrap();
        assert_eq!(c.kappa(), 0.13);
    }

    #[test]
    fn pc_selects_kind() {
        let u = GaugeField::cold_start(LatticeGeometry::new([2, 2, 2, 2]).unwrap());
        let c = DiracConfig {
            dslash_type: DslashType::Clover,
            matpc: Some(MatPcType::OddOddAsymmetric),
            ..DiracConfig::default()
        };
        let full = c.dirac_param(false, DiracFields::gauge(&u)).unwrap();
        assert_eq!(full.kind, DiracKind::Clover);
        let pc = c.dirac_param(true, DiracFields::gauge(&u)).unwrap();
        assert_eq!(pc.kind, DiracKind::CloverPc);
        assert_eq!(pc.matpc, Some(MatPcType::OddOddAsymmetric));
    }

    #[test]
    fn four_d_domain_wall_needs_pc() {
        let u = GaugeField::cold_start(LatticeGeometry::new([2, 2, 2, 2]).unwrap());
        for t in [DslashType::DomainWall4d, DslashType::Mobius] {
            let c = DiracConfig {
                dslash_type: t,
                ls: 4,
                b5: vec![1.5],
                c5: vec![0.5],
                ..DiracConfig::default()
            };
            let err = c.dirac_param(false, DiracFields::gauge(&u)).unwrap_err();
            assert!(matches!(err, DiracError::Config(_)), "{t:?}: {err}");
            assert!(c.dirac_param(true, DiracFields::gauge(&u)).is_ok(), "{t:?}");
        }
    }

    #[test]
    fn mobius_coefficients_broadcast() {
        let u = GaugeField::cold_start(LatticeGeometry::new([2, 2, 2, 2]).unwrap());
        let json = r#"{
            "dslash_type": "mobius", "ls": 4, "m5": -1.8, "mass": 0.02,
            "b5": [1.5], "c5": [0.5, 0.5, 0.5, 0.5], "matpc": "even_even"
        }"#;
        let c = DiracConfig::from_json_str(json).unwrap();
        let p = c.dirac_param(true, DiracFields::gauge(&u)).unwrap();
        assert_eq!(p.b5, vec![1.5; 4]);
        assert_eq!(p.c5, vec![0.5; 4]);
        let d = Dirac::create(&p).unwrap();
        assert_eq!(d.kind(), DiracKind::MobiusDomainWallPc);

        let bad = DiracConfig {
            c5: vec![0.5, 0.5],
            ..c
        };
        assert!(bad.dirac_param(true, DiracFields::gauge(&u)).is_err());
    }

    #[test]
    fn parse_errors_are_typed() {
        let err = DiracConfig::from_json_str(r#"{ "dslash_type": "overlap" }"#).unwrap_err();
        assert!(matches!(err, DiracError::ConfigParse(_)), "{err}");
        let err = DiracConfig::from_path(Path::new("/nonexistent/dirac.json")).unwrap_err();
        assert!(matches!(err, DiracError::Io(_)), "{err}");
    }

    #[test]
    fn config_round_trips_through_json() {
        let c = DiracConfig {
            dslash_type: DslashType::TwistedMass,
            mu: 0.05,
            twist_flavor: TwistFlavor::Minus,
            dagger: true,
            ..DiracConfig::default()
        };
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(DiracConfig::from_json_str(&json).unwrap(), c);
    }
}
