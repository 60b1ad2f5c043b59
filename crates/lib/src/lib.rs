//!
//! Idmesh: one canonical identity view over divergent backing stores.
//!
//! The platform's user accounts live in three heterogeneous stores with no
//! shared transaction: a durable SQL database, a process-local in-memory
//! store, and a local JSON file. The stores drift apart; this library makes
//! that divergence survivable instead of fatal.
//!
//! ## Core Concepts
//!
//! * **Records (`record::IdentityRecord`)**: The shared account data model.
//!   Email is the cross-store natural key; ids are store-local.
//! * **Adapters (`adapter::StoreAdapter`)**: A pluggable storage layer, one
//!   implementation per backing store, composed into a priority-ordered list
//!   (Durable > Volatile > LocalFile). Any call may report the store as
//!   unavailable; callers treat that as "no data here", never as fatal.
//! * **Reconciler (`reconcile::Reconciler`)**: Queries every adapter
//!   concurrently, drops the unreachable ones, and merges the hits into one
//!   canonical record with provenance.
//! * **Role resolution (`reconcile::resolver`)**: Most-privileged-wins merge
//!   of the `role` field, so an escalation applied to any single store takes
//!   effect platform-wide before the stores converge.
//! * **WriteCoordinator (`write::WriteCoordinator`)**: Best-effort
//!   create/update/delete across the adapter list with per-adapter outcome
//!   reporting. Never all-or-nothing.
//! * **Directory (`directory::Directory`)**: The user-facing handle that
//!   builds the adapter set from [`settings::Settings`] and wires the read
//!   and write paths together.

pub mod adapter;
pub mod directory;
pub mod reconcile;
pub mod record;
pub mod settings;
pub mod write;

pub use adapter::{StoreAdapter, StoreKind};
pub use directory::Directory;
pub use reconcile::{Reconciler, ResolvedIdentity};
pub use record::{IdentityPatch, IdentityRecord, NewIdentity, Role, ShopInfo, ShopStatus, UserType};
pub use settings::{Environment, Settings};
pub use write::{Persistence, WriteCoordinator, WriteKey, WriteOutcome, WriteReport};

/// Result type used throughout the idmesh library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the idmesh library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured adapter errors from the adapter module
    #[error(transparent)]
    Adapter(adapter::AdapterError),

    /// Structured reconciliation errors from the reconcile module
    #[error(transparent)]
    Reconcile(reconcile::ReconcileError),

    /// Structured write-path errors from the write module
    #[error(transparent)]
    Write(write::WriteError),

    /// Structured configuration errors from the settings module
    #[error(transparent)]
    Settings(settings::SettingsError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Adapter(_) => "adapter",
            Error::Reconcile(_) => "reconcile",
            Error::Write(_) => "write",
            Error::Settings(_) => "settings",
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Reconcile(reconcile_err) => reconcile_err.is_not_found(),
            Error::Write(write_err) => write_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error indicates a backing store could not be reached.
    ///
    /// Unavailability is recovered inside the reconcile and write paths by
    /// dropping the affected adapter from the operation; seeing it at this
    /// level means a caller invoked an adapter directly.
    pub fn is_unavailable(&self) -> bool {
        match self {
            Error::Adapter(adapter_err) => adapter_err.is_unavailable(),
            _ => false,
        }
    }

    /// Check if this error indicates a conflict (email already taken).
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Adapter(adapter_err) => adapter_err.is_email_taken(),
            _ => false,
        }
    }

    /// Check if this error means every configured store rejected a write.
    pub fn is_total_write_failure(&self) -> bool {
        match self {
            Error::Write(write_err) => write_err.is_total_failure(),
            _ => false,
        }
    }

    /// Check if this error is adapter/storage-related.
    pub fn is_adapter_error(&self) -> bool {
        matches!(self, Error::Adapter(_))
    }

    /// Check if this error is configuration-related.
    pub fn is_settings_error(&self) -> bool {
        matches!(self, Error::Settings(_))
    }
}
