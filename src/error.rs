// SPDX-License-Identifier: AGPL-3.0-only

//! Typed errors for Dirac operator construction and application.
//!
//! Every fallible operation returns [`Result`] so callers can pattern-match on
//! the failure mode: bad parameters, fields that do not line up, or a
//! capability the chosen operator kind lacks. Aliasing of stencil input and
//! output cannot be expressed through the view types, so it has no variant.

use thiserror::Error;

use crate::dirac::DiracKind;
use crate::field::SiteSubset;

/// Errors raised by the operator layer.
#[derive(Debug, Error)]
pub enum DiracError {
    /// Invalid or inconsistent operator parameters (missing field, bad
    /// preconditioning type, unsupported solution type, zero mass, ...).
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A field has the wrong site subset for the requested operation.
    #[error("parity mismatch in {operation}: expected {expected}, found {found}")]
    ParityMismatch {
        operation: &'static str,
        expected: SiteSubset,
        found: SiteSubset,
    },

    /// Fields disagree on geometry, spin count, fifth-dimension extent or
    /// checkerboard convention.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// The operator kind does not provide this operation.
    #[error("{operation} is not implemented for {kind:?}")]
    NotImplemented {
        operation: &'static str,
        kind: DiracKind,
    },

    /// Configuration document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Configuration file could not be read.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl DiracError {
    /// Shorthand for [`DiracError::Config`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True when the error reports a missing capability rather than misuse.
    #[must_use]
    pub const fn is_not_implemented(&self) -> bool {
        matches!(self, Self::NotImplemented { .. })
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DiracError>;
