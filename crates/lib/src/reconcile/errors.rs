//! Reconciliation error types.

use thiserror::Error;

/// Errors that can occur while reconciling identity views.
///
/// Adapter unavailability is not represented here: unreachable stores are
/// dropped from the operation, not surfaced. Divergent ids are reported via
/// the `divergent` flag on the resolved identity, not as an error.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// No reachable store holds a record for the email.
    #[error("identity not found: {email}")]
    IdentityNotFound {
        /// The email that matched nothing
        email: String,
    },

    /// The reconciler was built with an empty adapter list.
    #[error("no store adapters configured")]
    NoAdaptersConfigured,
}

impl ReconcileError {
    /// Check if this error indicates a missing identity.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ReconcileError::IdentityNotFound { .. })
    }
}

// Conversion from ReconcileError to the main Error type
impl From<ReconcileError> for crate::Error {
    fn from(err: ReconcileError) -> Self {
        crate::Error::Reconcile(err)
    }
}
