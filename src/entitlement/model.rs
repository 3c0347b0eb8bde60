//! Entitlement records and photo-set identifiers.
//!
//! A photo set is everything reachable from one main pose. Its id is derived
//! from the resolved main path, so the same photo always maps to the same
//! entitlement record.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix of every photo-set id.
pub const PHOTO_SET_ID_PREFIX: &str = "ps_";

/// Free-download state of a photo set.
///
/// Serialized exactly as the storefront expects it:
/// `{"free_redeemed": 0|1, "free_asset_public_id": ..., "redeemed_at": ...}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlement {
    #[serde(with = "flag")]
    pub free_redeemed: bool,
    pub free_asset_public_id: Option<String>,
    pub redeemed_at: Option<DateTime<Utc>>,
}

impl Entitlement {
    /// Entitlement after the free download was claimed for `public_id`.
    pub fn redeemed(public_id: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            free_redeemed: true,
            free_asset_public_id: Some(public_id.into()),
            redeemed_at: Some(at),
        }
    }

    /// Whether `public_id` is the asset that was claimed for free.
    pub fn is_free_asset(&self, public_id: &str) -> bool {
        self.free_redeemed && self.free_asset_public_id.as_deref() == Some(public_id)
    }
}

/// Stable photo-set id for a resolved main path.
///
/// The full path is encoded (unpadded URL-safe base64), so distinct paths can
/// never share a photo set and the id is safe to pass around in URLs.
pub fn photo_set_id_from_public_id(public_id: &str) -> String {
    format!("{}{}", PHOTO_SET_ID_PREFIX, URL_SAFE_NO_PAD.encode(public_id))
}

/// `bool` <-> `0 | 1`
mod flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(u8::deserialize(deserializer)? != 0)
    }
}
