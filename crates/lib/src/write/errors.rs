//! Write-path error types.

use thiserror::Error;

/// Errors that can occur while applying best-effort writes.
///
/// Partial failure is not an error: as long as one store persisted the
/// write, the operation succeeds and the per-store outcomes tell the caller
/// how wide it landed. Only a total failure or a missing target fails the
/// request.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum WriteError {
    /// Every configured store rejected the write.
    #[error("write to every configured store failed during {operation}")]
    AllStoresFailed {
        /// The operation that failed everywhere (create/update/delete)
        operation: String,
    },

    /// No store holds a record for the given key.
    #[error("write target not found: {key}")]
    TargetNotFound {
        /// The id or email that matched nothing
        key: String,
    },

    /// The coordinator was built with an empty adapter list.
    #[error("no store adapters configured")]
    NoAdaptersConfigured,
}

impl WriteError {
    /// Check if this error indicates a missing write target.
    pub fn is_not_found(&self) -> bool {
        matches!(self, WriteError::TargetNotFound { .. })
    }

    /// Check if this error means every store rejected the write.
    pub fn is_total_failure(&self) -> bool {
        matches!(self, WriteError::AllStoresFailed { .. })
    }
}

// Conversion from WriteError to the main Error type
impl From<WriteError> for crate::Error {
    fn from(err: WriteError) -> Self {
        crate::Error::Write(err)
    }
}
