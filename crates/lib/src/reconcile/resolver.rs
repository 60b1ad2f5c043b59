//! Privilege resolution over divergent candidate records.
//!
//! When the same email resolves to records in several stores, the candidates
//! can disagree on the `role` overlay: an operator may have promoted an
//! account in the durable store while the volatile store still shows the old
//! role. Authorization must reflect the escalation platform-wide immediately,
//! even though the stores have not converged, so the merge is
//! most-privileged-wins.

use crate::adapter::StoreKind;
use crate::record::{IdentityRecord, Role, ShopStatus};

/// Pick the effective role from a set of candidates sharing an email.
///
/// The candidate with the highest role rank wins; among equal ranks the one
/// from the highest-priority store wins. The tie-break only affects which
/// store "served" the role, never the rank itself.
pub fn effective_role(candidates: &[(StoreKind, IdentityRecord)]) -> Role {
    candidates
        .iter()
        .max_by_key(|(kind, record)| (record.effective_role(), kind.priority()))
        .map(|(_, record)| record.effective_role())
        .unwrap_or_default()
}

/// Pick the most-advanced shop status among the candidates, if any carries
/// shop info.
///
/// Shop approval moves forward only; a store that still shows `Pending` after
/// the application was decided elsewhere is lagging, not authoritative. Among
/// equally advanced statuses the highest-priority store wins, so a durable
/// `Approved` beats a volatile `Rejected` rather than flapping.
pub fn effective_shop_status(candidates: &[(StoreKind, IdentityRecord)]) -> Option<ShopStatus> {
    candidates
        .iter()
        .filter_map(|(kind, record)| {
            record
                .shop_info
                .as_ref()
                .map(|info| (info.status.rank(), kind.priority(), info.status))
        })
        .max_by_key(|(rank, priority, _)| (*rank, *priority))
        .map(|(_, _, status)| status)
}
