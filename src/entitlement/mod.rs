//! Entitlement and purchase state.
//!
//! Every main photo defines a photo set. A photo set has one free download
//! (tracked by [`Entitlement`]) and any number of purchased assets. The
//! state sits behind the [`EntitlementStore`] trait so handlers never touch a
//! concrete backend.

mod memory;
mod model;
mod store;

pub use memory::InMemoryEntitlementStore;
pub use model::{photo_set_id_from_public_id, Entitlement, PHOTO_SET_ID_PREFIX};
pub use store::EntitlementStore;
