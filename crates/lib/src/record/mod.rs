//! Core data types for identity records.
//!
//! An [`IdentityRecord`] is the unit every backing store persists and every
//! reconciliation produces. The `email` field is the cross-store natural key
//! (case-sensitive exact match); the `id` field is local to the store that
//! minted it and must never be assumed unique across adapters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;


/// Account category assigned at registration.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserType {
    Customer,
    ShopOwner,
    Admin,
}

/// Privilege overlay on top of [`UserType`].
///
/// The derived `Ord` is the role rank used for all conflict resolution:
/// `User < Admin < SuperAdmin`. A record without an explicit role is treated
/// as `User`.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    User,
    Admin,
    SuperAdmin,
}

impl Role {
    /// Numeric rank, exposed for logging and assertions.
    pub fn rank(self) -> u8 {
        match self {
            Role::User => 0,
            Role::Admin => 1,
            Role::SuperAdmin => 2,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "USER"),
            Role::Admin => write!(f, "ADMIN"),
            Role::SuperAdmin => write!(f, "SUPER_ADMIN"),
        }
    }
}

/// Approval state of a shop application.
///
/// Intended to move forward only: `Pending` may become `Approved` or
/// `Rejected`, never the other way around. The reconciler relies on
/// [`ShopStatus::rank`] to keep a merge from regressing an advanced status
/// back to `Pending` when one store lags behind.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShopStatus {
    Pending,
    Approved,
    Rejected,
}

impl ShopStatus {
    /// Progression rank. `Approved` and `Rejected` are both terminal and
    /// outrank `Pending`; between the two terminals the stored value wins.
    pub fn rank(self) -> u8 {
        match self {
            ShopStatus::Pending => 0,
            ShopStatus::Approved | ShopStatus::Rejected => 1,
        }
    }
}

/// Shop registration details attached to `ShopOwner` accounts.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShopInfo {
    pub shop_name: String,

    /// Government business registration number, stored verbatim.
    pub business_number: String,

    pub address: String,

    pub status: ShopStatus,

    pub created_at: DateTime<Utc>,
}

/// One user account as held by a single backing store.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityRecord {
    /// Store-local identifier. Adapters do not share an id namespace, so the
    /// same person can legitimately carry different ids in different stores.
    pub id: String,

    /// Cross-store natural key. Compared case-sensitively.
    pub email: String,

    pub name: String,

    /// Opaque password hash blob. Never inspected or validated here; the
    /// authentication collaborator owns the algorithm.
    pub password_hash: String,

    pub phone: Option<String>,

    pub user_type: UserType,

    /// Privilege overlay. `None` means [`Role::User`].
    pub role: Option<Role>,

    pub shop_info: Option<ShopInfo>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl IdentityRecord {
    /// The effective role, with the absent overlay defaulting to `User`.
    pub fn effective_role(&self) -> Role {
        self.role.unwrap_or_default()
    }
}

/// Input for creating a new identity.
///
/// The write coordinator assigns the id and timestamps; callers never pick
/// ids themselves.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewIdentity {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub user_type: UserType,
    pub role: Option<Role>,
    pub shop_info: Option<ShopInfo>,
}

impl NewIdentity {
    /// Materialize a full record with a freshly minted id and timestamps.
    pub fn into_record(self, now: DateTime<Utc>) -> IdentityRecord {
        IdentityRecord {
            id: Uuid::new_v4().to_string(),
            email: self.email,
            name: self.name,
            password_hash: self.password_hash,
            phone: self.phone,
            user_type: self.user_type,
            role: self.role,
            shop_info: self.shop_info,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update applied to an existing record.
///
/// Every field is optional; absent fields are left untouched. `phone` uses a
/// double `Option` so a patch can distinguish "leave as is" (`None`) from
/// "clear the number" (`Some(None)`).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IdentityPatch {
    pub name: Option<String>,
    pub password_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<Option<String>>,
    pub user_type: Option<UserType>,
    pub role: Option<Role>,
    pub shop_info: Option<ShopInfo>,
}

impl IdentityPatch {
    /// A patch that only changes the role overlay.
    pub fn role(role: Role) -> Self {
        IdentityPatch {
            role: Some(role),
            ..Default::default()
        }
    }

    /// Whether applying this patch would change anything at all.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.password_hash.is_none()
            && self.phone.is_none()
            && self.user_type.is_none()
            && self.role.is_none()
            && self.shop_info.is_none()
    }

    /// Whether this patch carries a role change.
    ///
    /// Role patches fan out to every store holding the email, not just the
    /// first match, so a subsequent reconciled read sees the escalation
    /// before the stores converge.
    pub fn touches_role(&self) -> bool {
        self.role.is_some()
    }

    /// Apply the present fields to `record` and refresh `updated_at`.
    pub fn apply(&self, record: &mut IdentityRecord, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            record.name = name.clone();
        }
        if let Some(hash) = &self.password_hash {
            record.password_hash = hash.clone();
        }
        if let Some(phone) = &self.phone {
            record.phone = phone.clone();
        }
        if let Some(user_type) = self.user_type {
            record.user_type = user_type;
        }
        if let Some(role) = self.role {
            record.role = Some(role);
        }
        if let Some(shop_info) = &self.shop_info {
            record.shop_info = Some(shop_info.clone());
        }
        record.updated_at = now;
    }
}
