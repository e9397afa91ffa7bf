//! Error types and result aliases for ember operations.
//!
//! Provides a unified error type that covers all failure conditions across
//! the ember crates. Every resolution failure is fatal to the operation that
//! raised it; the CLI reports it once and exits non-zero.

use thiserror::Error;

use crate::types::DecisionPoint;

/// Unified error type for all ember operations
#[derive(Error, Debug)]
pub enum EmberError {
    /// An atom resolved to zero candidates, or the database had no entry at all.
    #[error("no candidate found for '{atom}' (required by {owner})")]
    MissingDependency { atom: String, owner: String },

    /// Every candidate was rejected by the architecture filter.
    #[error(
        "'{atom}' (required by {owner}) has no candidate usable on this host: \
         found [{}], accepted [{}]",
        .found.join(", "),
        .accepted.join(", ")
    )]
    UnavailablePackage {
        atom: String,
        owner: String,
        /// Architectures of the rejected candidates.
        found: Vec<String>,
        /// The host's acceptable architecture list.
        accepted: Vec<String>,
    },

    /// Every surviving candidate was on the administrator lock-list.
    #[error(
        "every candidate for '{atom}' (required by {owner}) is locked: {}",
        .locked.join(", ")
    )]
    LockedPackage {
        atom: String,
        owner: String,
        locked: Vec<String>,
    },

    /// A conflict-bucket atom matched a package included in the same operation.
    #[error("{owner} conflicts with {other}, which is part of the same operation")]
    PackageConflict { owner: String, other: String },

    /// Two decision points on the same target are mutually unsatisfiable.
    #[error("conflicting requirements on {target} (installed {installed}): {first}, but {second}")]
    ConditionConflict {
        target: String,
        installed: String,
        first: DecisionPoint,
        second: DecisionPoint,
    },

    /// Residual in-degree remained after topological reduction.
    #[error("circular dependencies detected:\n{}", .cycles.join("\n"))]
    CircularDependency {
        /// Identities of every node still caught in a cycle.
        nodes: Vec<String>,
        /// Recovered cycles, one rendered chain per entry.
        cycles: Vec<String>,
    },

    /// A dependency string could not be parsed.
    #[error("invalid atom '{atom}' (from {owner}): {reason}")]
    InvalidAtom {
        atom: String,
        owner: String,
        reason: String,
    },

    /// A configuration or database snapshot file could not be parsed.
    #[error("failed to parse {path}: {reason}")]
    ConfigParse { path: String, reason: String },

    /// IO failure while reading configuration or database files.
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for ember operations
pub type EmberResult<T> = Result<T, EmberError>;

impl EmberError {
    /// Create an IO error from std::io::Error
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Get a user-facing suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            EmberError::MissingDependency { .. } => {
                Some("Check the package name spelling or sync the repository snapshot")
            }
            EmberError::UnavailablePackage { .. } => {
                Some("Add an arch override rule to accept one of the listed architectures")
            }
            EmberError::LockedPackage { .. } => {
                Some("Remove or narrow the matching lock rule to let a version through")
            }
            EmberError::ConditionConflict { .. } => {
                Some("The two requesters cannot share one installed version; rebuild one of them")
            }
            EmberError::CircularDependency { .. } => {
                Some("Break the cycle by moving one edge into a postmerge bucket")
            }
            _ => None,
        }
    }
}
