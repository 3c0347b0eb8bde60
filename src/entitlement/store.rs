//! Entitlement storage trait.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::EntitlementError;

use super::model::Entitlement;

/// Storage for entitlements and purchases, keyed by photo-set id.
///
/// Reads of unknown keys return the zero value; nothing is ever deleted.
/// Implementations must make `compare_and_set` atomic with respect to every
/// other write of the same key, since that is what keeps the free download a
/// one-time right.
#[async_trait]
pub trait EntitlementStore: Send + Sync {
    /// Current entitlement, or the default when none was written yet.
    async fn get(&self, photo_set_id: &str) -> Result<Entitlement, EntitlementError>;

    /// Unconditionally overwrite the entitlement.
    async fn put(&self, photo_set_id: &str, entitlement: Entitlement)
        -> Result<(), EntitlementError>;

    /// Replace the entitlement only if it still equals `expected`.
    ///
    /// Returns `false` (and writes nothing) when another writer got there first.
    async fn compare_and_set(
        &self,
        photo_set_id: &str,
        expected: &Entitlement,
        new: Entitlement,
    ) -> Result<bool, EntitlementError>;

    /// Public ids purchased for the photo set.
    async fn purchased(&self, photo_set_id: &str) -> Result<HashSet<String>, EntitlementError>;

    /// Record a purchase. Returns `false` if the asset was already owned.
    async fn add_purchase(
        &self,
        photo_set_id: &str,
        public_id: &str,
    ) -> Result<bool, EntitlementError>;
}
