//! Error types for point deduplication.

use mesh_types::MeshError;
use thiserror::Error;

/// Result type for deduplication operations.
pub type DedupResult<T> = std::result::Result<T, DedupError>;

/// Errors that can occur while removing duplicate points.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DedupError {
    /// Merge threshold is negative or not a number.
    #[error("invalid merge threshold: {0} (must be a non-negative number)")]
    InvalidThreshold(f64),

    /// Reading or writing mesh attributes failed.
    #[error(transparent)]
    Mesh(#[from] MeshError),

    /// The output mesh cannot hold the result in its allocated layout.
    #[error("unsupported {attribute} format: {reason}")]
    UnsupportedFormat {
        /// Which output attribute was rejected.
        attribute: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// An internal invariant does not hold, which means the input was malformed.
    #[error("broken invariant: {what}")]
    BrokenInvariant {
        /// Description of the violation.
        what: String,
    },
}

impl DedupError {
    pub(crate) fn invariant(what: impl Into<String>) -> Self {
        Self::BrokenInvariant { what: what.into() }
    }

    /// Route an unsupported-format storage error to the attribute it came from.
    pub(crate) fn for_attribute(attribute: &'static str, err: MeshError) -> Self {
        match err {
            MeshError::UnsupportedFormat { reason } => Self::UnsupportedFormat { attribute, reason },
            other => Self::Mesh(other),
        }
    }
}
