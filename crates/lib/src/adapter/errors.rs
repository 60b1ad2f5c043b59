//! Adapter error types.
//!
//! This module defines structured error types for backing-store operations,
//! providing error context and type safety over string-based errors.

use thiserror::Error;

use super::StoreKind;

/// Errors that can occur while talking to a single backing store.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The store could not be reached or failed mid-operation.
    ///
    /// Transport errors, disk errors, and per-call deadline misses all land
    /// here. Recovered locally: the adapter is excluded from the current
    /// operation and siblings proceed.
    #[error("{kind} store unavailable: {reason}")]
    Unavailable {
        /// Which store failed
        kind: StoreKind,
        /// Description of the transport/disk failure
        reason: String,
    },

    /// A create collided with an existing record for the same email.
    #[error("email already registered in {kind} store: {email}")]
    EmailTaken {
        /// Which store rejected the create
        kind: StoreKind,
        /// The colliding natural key
        email: String,
    },

    /// Stored bytes could not be decoded into a record.
    #[error("corrupt record data in {kind} store")]
    CorruptRecord {
        /// Which store held the bad data
        kind: StoreKind,
        /// The underlying deserialization error
        #[source]
        source: serde_json::Error,
    },
}

impl AdapterError {
    /// Convenience constructor for transport/disk failures.
    pub fn unavailable(kind: StoreKind, reason: impl Into<String>) -> Self {
        AdapterError::Unavailable {
            kind,
            reason: reason.into(),
        }
    }

    /// Check if this error means the store could not be reached.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, AdapterError::Unavailable { .. })
    }

    /// Check if this error is a duplicate-email conflict.
    pub fn is_email_taken(&self) -> bool {
        matches!(self, AdapterError::EmailTaken { .. })
    }

    /// Check if this error indicates corrupt persisted data.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, AdapterError::CorruptRecord { .. })
    }

    /// Which store produced this error.
    pub fn store_kind(&self) -> StoreKind {
        match self {
            AdapterError::Unavailable { kind, .. }
            | AdapterError::EmailTaken { kind, .. }
            | AdapterError::CorruptRecord { kind, .. } => *kind,
        }
    }
}

// Conversion from AdapterError to the main Error type
impl From<AdapterError> for crate::Error {
    fn from(err: AdapterError) -> Self {
        crate::Error::Adapter(err)
    }
}
