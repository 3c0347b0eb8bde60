//! Process-local entitlement store.
//!
//! State lives as long as the process and is not shared between instances.
//! Good enough for a single server and for tests; anything durable should
//! implement [`EntitlementStore`] over a real database.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::EntitlementError;

use super::model::Entitlement;
use super::store::EntitlementStore;

#[derive(Default)]
pub struct InMemoryEntitlementStore {
    entitlements: RwLock<HashMap<String, Entitlement>>,
    purchases: RwLock<HashMap<String, HashSet<String>>>,
}

impl InMemoryEntitlementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of photo sets with a written entitlement.
    pub async fn entitlement_count(&self) -> usize {
        self.entitlements.read().await.len()
    }
}

#[async_trait]
impl EntitlementStore for InMemoryEntitlementStore {
    async fn get(&self, photo_set_id: &str) -> Result<Entitlement, EntitlementError> {
        Ok(self
            .entitlements
            .read()
            .await
            .get(photo_set_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn put(
        &self,
        photo_set_id: &str,
        entitlement: Entitlement,
    ) -> Result<(), EntitlementError> {
        self.entitlements
            .write()
            .await
            .insert(photo_set_id.to_string(), entitlement);
        Ok(())
    }

    async fn compare_and_set(
        &self,
        photo_set_id: &str,
        expected: &Entitlement,
        new: Entitlement,
    ) -> Result<bool, EntitlementError> {
        // Single write lock across the check and the write
        let mut entitlements = self.entitlements.write().await;
        let current = entitlements.get(photo_set_id).cloned().unwrap_or_default();
        if &current != expected {
            return Ok(false);
        }
        entitlements.insert(photo_set_id.to_string(), new);
        Ok(true)
    }

    async fn purchased(&self, photo_set_id: &str) -> Result<HashSet<String>, EntitlementError> {
        Ok(self
            .purchases
            .read()
            .await
            .get(photo_set_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_purchase(
        &self,
        photo_set_id: &str,
        public_id: &str,
    ) -> Result<bool, EntitlementError> {
        Ok(self
            .purchases
            .write()
            .await
            .entry(photo_set_id.to_string())
            .or_default()
            .insert(public_id.to_string()))
    }
}
