//! Typed errors of the catalog and the planner.
//!
//! - `RecordError`: a malformed input record. Recovered locally: the record is
//!   skipped, logged and returned to the caller as a warning.
//! - `PlanError`: surfaced to the caller of `plan_*` / `BoundaryIter::new`.
//!
//! "Already up to date" is not an error, see `plan::PlanOutcome::UpToDate`.

use serde::Serialize;
use thiserror::Error;

/// Malformed property record (one line of a `zfs get -H` dump).
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum RecordError {
    #[error("line {line}: expected at least 3 tab-separated fields, got {fields}")]
    ShortLine { line: usize, fields: usize },

    #[error("{name}: unknown property '{property}'")]
    UnknownProperty { name: String, property: String },

    #[error("invalid snapshot name {name} (missing '@')")]
    MissingSeparator { name: String },

    #[error("invalid dataset name {name} (unexpected '@')")]
    UnexpectedSeparator { name: String },

    #[error("{name}: invalid {property} value '{value}'")]
    InvalidValue {
        name: String,
        property: String,
        value: String,
    },

    #[error("snapshot {name} has no {property}")]
    Incomplete { name: String, property: String },

    #[error("snapshot {name}: guid {guid} already belongs to {owner}")]
    DuplicateGuid {
        name: String,
        guid: String,
        owner: String,
    },

    #[error("snapshot {name}: invalid streamline label ({reason})")]
    InvalidStreamLabel { name: String, reason: String },
}

/// Planning failures.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum PlanError {
    /// Start version is not part of the stream. Means the two catalogs
    /// disagree; not recoverable.
    #[error("streamline {stream}: version {version} not found")]
    VersionNotFound { stream: String, version: u64 },

    /// Destination already has snapshots for this dataset/stream but none of
    /// them shares a guid with the source.
    #[error("{name}: no common snapshot between sender and receiver")]
    NoCommonAncestor { name: String },

    #[error("dataset {name} not found")]
    UnknownDataset { name: String },

    #[error("streamline {name} not found")]
    UnknownStream { name: String },

    #[error("{name}: origin dataset {ancestor} failed to plan")]
    AncestorFailed { name: String, ancestor: String },
}

pub type PlanResult<T> = std::result::Result<T, PlanError>;
