//! Short-circuiting search over candidate paths.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::store::AssetStore;

use super::cache::{ResolutionCache, ResolutionKey, DEFAULT_RESOLUTION_CACHE_CAPACITY};
use super::candidates::{CandidatePaths, IdCasing, DEFAULT_CASINGS, DEFAULT_LOOKBACK_DAYS};
use super::photo_id::is_valid_photo_id;

/// Default per-probe timeout.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of retries for a transient probe failure.
pub const DEFAULT_PROBE_RETRIES: u32 = 2;

/// Default base delay between retries (doubled on each attempt).
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// Search parameters for the resolver.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Days searched backwards from the start date (inclusive of the start)
    pub lookback_days: u32,

    /// Id casings tried for each day, in priority order
    pub casings: Vec<IdCasing>,

    /// Upper bound on a single existence check
    pub probe_timeout: Duration,

    /// Retries after a transient failure of a single probe
    pub max_retries: u32,

    /// Base delay before the first retry
    pub retry_backoff: Duration,

    /// Number of successful resolutions to remember (0 disables caching)
    pub cache_capacity: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            casings: DEFAULT_CASINGS.to_vec(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            max_retries: DEFAULT_PROBE_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            cache_capacity: DEFAULT_RESOLUTION_CACHE_CAPACITY,
        }
    }
}

impl ResolverConfig {
    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }

    pub fn with_casings(mut self, casings: Vec<IdCasing>) -> Self {
        self.casings = casings;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn with_retries(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_backoff = backoff;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }
}

/// Result of checking a single candidate path.
#[derive(Debug, Clone)]
pub enum ProbeOutcome {
    /// The asset exists at this path
    Hit(String),

    /// The store confirmed nothing is there
    Miss,

    /// Existence could not be determined
    TransportError(StoreError),
}

impl ProbeOutcome {
    fn from_lookup(public_id: &str, result: Result<(), StoreError>) -> Self {
        match result {
            Ok(()) => ProbeOutcome::Hit(public_id.to_string()),
            Err(StoreError::NotFound(_)) => ProbeOutcome::Miss,
            Err(err) => ProbeOutcome::TransportError(err),
        }
    }
}

/// Resolves loose photo ids to existing storage paths.
pub struct Resolver<S: AssetStore> {
    store: Arc<S>,
    config: ResolverConfig,
    cache: ResolutionCache,
}

impl<S: AssetStore> Resolver<S> {
    pub fn new(store: Arc<S>, config: ResolverConfig) -> Self {
        let cache = ResolutionCache::new(config.cache_capacity);
        Self {
            store,
            config,
            cache,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Ordered candidate paths for `photo_id`, starting at `start`.
    pub fn candidates(&self, photo_id: &str, start: NaiveDate) -> CandidatePaths {
        CandidatePaths::new(
            photo_id,
            start,
            self.config.lookback_days,
            &self.config.casings,
        )
    }

    /// Check a single path once, bounded by the probe timeout.
    pub async fn probe(&self, public_id: &str) -> ProbeOutcome {
        let lookup = self.store.resource(public_id);
        let result = match tokio::time::timeout(self.config.probe_timeout, lookup).await {
            Ok(result) => result.map(|_| ()),
            Err(_) => Err(StoreError::Timeout(
                self.config.probe_timeout.as_millis() as u64
            )),
        };
        ProbeOutcome::from_lookup(public_id, result)
    }

    /// Check a single path, retrying transient failures with exponential backoff.
    pub async fn probe_with_retry(&self, public_id: &str) -> ProbeOutcome {
        let mut attempt = 0;
        loop {
            let outcome = self.probe(public_id).await;
            match &outcome {
                ProbeOutcome::TransportError(err)
                    if err.is_transient() && attempt < self.config.max_retries =>
                {
                    let delay = self.config.retry_backoff * 2u32.saturating_pow(attempt);
                    debug!(
                        public_id,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying probe: {}",
                        err
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                _ => return outcome,
            }
        }
    }

    /// Find the first existing path for `photo_id`.
    ///
    /// Candidates are probed strictly in order and the search stops at the
    /// first hit. Probe failures never abort the search; `None` means every
    /// candidate was tried. Ids that cannot name a stored file resolve to
    /// `None` without touching the store.
    pub async fn resolve(&self, photo_id: &str, start: Option<NaiveDate>) -> Option<String> {
        if !is_valid_photo_id(photo_id) {
            debug!(photo_id, "Rejected malformed photo id");
            return None;
        }

        let start = start.unwrap_or_else(|| Utc::now().date_naive());
        let key = ResolutionKey::new(photo_id, start);

        if let Some(public_id) = self.cache.get(&key).await {
            debug!(photo_id, public_id = %public_id, "Resolution cache hit");
            return Some(public_id);
        }

        let mut probes = 0usize;
        let mut failures = 0usize;
        for candidate in self.candidates(photo_id, start) {
            probes += 1;
            debug!(candidate = %candidate, "Trying candidate");

            match self.probe_with_retry(&candidate).await {
                ProbeOutcome::Hit(public_id) => {
                    info!(photo_id, public_id = %public_id, probes, "Resolved photo");
                    self.cache.put(key, public_id.clone()).await;
                    return Some(public_id);
                }
                ProbeOutcome::Miss => {}
                ProbeOutcome::TransportError(err) => {
                    failures += 1;
                    warn!(candidate = %candidate, "Could not check candidate: {}", err);
                }
            }
        }

        warn!(photo_id, probes, failures, "No match for photo id");
        None
    }
}
