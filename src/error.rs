//! Ingestion Errors
//!
//! Every failure of an ingestion attempt is reported as an [`IngestError`].
//! Only failures raised before the identity swap are free of backend side
//! effects; [`IngestError::BackendFailure`] marks the ones that are not.

use crate::storage::BackendError;
use thiserror::Error;

/// Errors returned by [`crate::ingest::Ingester::ingest`]
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum IngestError {
    /// Caller lacks write access to the collection or update access to the
    /// document being replaced. Raised before any mutation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A document already exists at the target and overwriting was not requested.
    #[error("document {path} already exists")]
    DocumentExists {
        /// Absolute path of the existing document
        path: String,
    },

    /// The target path has no document name.
    #[error("invalid document path '{0}'")]
    InvalidPath(String),

    /// The event source reported a structural or well-formedness error,
    /// or an external entity could not be resolved.
    #[error("malformed input at line {line}: {message}")]
    MalformedInput {
        /// Source line reported with the error
        line: u32,
        /// Description from the event source
        message: String,
    },

    /// The nesting level does not fit into the node addressing scheme.
    #[error(
        "nesting level {depth} does not fit into the indexing scheme; \
         split the document into several parts or reduce its nesting level"
    )]
    DepthExceeded {
        /// Maximum depth recorded for the document
        depth: usize,
    },

    /// The backend failed after the identity swap. The document is left
    /// partially written under its final path.
    #[error("storing {path} failed, document left partially written: {source}")]
    BackendFailure {
        /// Final path of the partially written document
        path: String,
        /// Underlying backend failure
        #[source]
        source: BackendError,
    },

    /// The backend failed before anything was mutated.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl IngestError {
    /// Build a [`IngestError::MalformedInput`]
    pub fn malformed(line: u32, message: impl Into<String>) -> Self {
        IngestError::MalformedInput {
            line,
            message: message.into(),
        }
    }

    /// Check if this is a permission failure
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, IngestError::PermissionDenied(_))
    }

    /// Check if the input itself was rejected
    pub fn is_malformed(&self) -> bool {
        matches!(self, IngestError::MalformedInput { .. })
    }

    /// Check if the failure may have left a partially written document behind
    pub fn leaves_partial_document(&self) -> bool {
        matches!(self, IngestError::BackendFailure { .. })
    }

    /// Convert an error raised after the identity swap into a
    /// [`IngestError::BackendFailure`] for the document at `path`.
    pub(crate) fn into_store_failure(self, path: &str) -> Self {
        match self {
            IngestError::BackendFailure { .. } => self,
            IngestError::Backend(source) => IngestError::BackendFailure {
                path: path.to_string(),
                source,
            },
            other => IngestError::BackendFailure {
                path: path.to_string(),
                source: BackendError::Aborted {
                    reason: other.to_string(),
                },
            },
        }
    }
}

/// Result type used throughout the crate
pub type Result<T, E = IngestError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_display() {
        let err = IngestError::malformed(12, "unexpected end tag");
        assert!(err.is_malformed());
        assert_eq!(
            err.to_string(),
            "malformed input at line 12: unexpected end tag"
        );
    }

    #[test]
    fn test_store_failure_keeps_backend_source() {
        let err = IngestError::Backend(BackendError::WriteRejected {
            reason: "disk full".to_string(),
        })
        .into_store_failure("/db/a.xml");
        assert!(err.leaves_partial_document());
        match err {
            IngestError::BackendFailure { path, source } => {
                assert_eq!(path, "/db/a.xml");
                assert!(matches!(source, BackendError::WriteRejected { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_store_failure_wraps_other_errors() {
        let err = IngestError::malformed(3, "boom").into_store_failure("/db/b.xml");
        match err {
            IngestError::BackendFailure {
                source: BackendError::Aborted { reason },
                ..
            } => assert!(reason.contains("boom")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
