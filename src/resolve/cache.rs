//! Cache of successful resolutions.
//!
//! A single miss can cost hundreds of remote lookups, and the same photo is
//! typically opened many times (main view, then as a neighbor of the next
//! pose). Only hits are cached: an asset that appears later must still be
//! found on the next request.

use std::num::NonZeroUsize;

use chrono::NaiveDate;
use lru::LruCache;
use tokio::sync::Mutex;

/// Default number of cached resolutions.
pub const DEFAULT_RESOLUTION_CACHE_CAPACITY: usize = 1000;

/// Cache key: the caller-facing id and the start date of the search window.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolutionKey {
    pub photo_id: String,
    pub start: NaiveDate,
}

impl ResolutionKey {
    pub fn new(photo_id: impl Into<String>, start: NaiveDate) -> Self {
        Self {
            photo_id: photo_id.into(),
            start,
        }
    }
}

/// LRU map from resolution key to the public id that was found.
///
/// A capacity of zero disables caching entirely.
pub struct ResolutionCache {
    entries: Option<Mutex<LruCache<ResolutionKey, String>>>,
}

impl ResolutionCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    /// Look up a resolution, marking it as recently used.
    pub async fn get(&self, key: &ResolutionKey) -> Option<String> {
        let entries = self.entries.as_ref()?;
        entries.lock().await.get(key).cloned()
    }

    pub async fn put(&self, key: ResolutionKey, public_id: String) {
        if let Some(entries) = &self.entries {
            entries.lock().await.put(key, public_id);
        }
    }

    pub async fn len(&self) -> usize {
        match &self.entries {
            Some(entries) => entries.lock().await.len(),
            None => 0,
        }
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new(DEFAULT_RESOLUTION_CACHE_CAPACITY)
    }
}
