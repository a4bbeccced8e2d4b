//! Crate-level error type.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias for results produced by this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Structural and I/O failures.
///
/// These are the fatal tier of the error model: a value of this type means
/// the session (or the current cursor) cannot meaningfully continue.
/// Expected, per-call outcomes of field extraction are reported through
/// [`Status`](crate::fields::Status) instead and never through this type.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// An underlying read failed or the backend reported a parse error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input file could not be opened.
    #[error("failed to open {path}: {source}")]
    Open {
        /// Path that failed to open.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },

    /// The input is neither VCF text nor BCF.
    #[error("{0}: not a recognized variant file")]
    UnrecognizedFormat(PathBuf),

    /// The sidecar region index required for a query does not exist.
    #[error("no region index found at {0}")]
    MissingIndex(PathBuf),

    /// Region queries were requested on a file without seekable compression.
    #[error("{0}: region queries require a bgzf-compressed input")]
    NotIndexable(PathBuf),

    /// A region string could not be parsed.
    #[error("invalid region {region:?}: {reason}")]
    InvalidRegion {
        /// The offending region string.
        region: String,
        /// Why it failed to parse.
        reason: String,
    },

    /// A requested sample name is not present in the header.
    #[error("unknown sample: {0}")]
    UnknownSample(String),

    /// Sample selection was attempted after iteration had started, or twice.
    #[error("sample selection must be applied once, before any record is read")]
    SamplesLocked,

    /// The record (or header) carries no usable genotype field.
    #[error("record has no usable genotype field")]
    MissingGenotypes,

    /// The genotype field violates the layout invariants.
    #[error("malformed genotype field: {0}")]
    MalformedGenotypes(String),
}
