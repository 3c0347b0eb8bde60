//! Photo id resolution.
//!
//! Callers only know a loose photo id (`CH0928251007`) and maybe the event
//! date. The storage path has to be found by probing the asset store:
//!
//! ```text
//! photo id ──► venue + id variants ──► CandidatePaths (lazy, ordered)
//!                                            │
//!                                            ▼
//!                              Resolver::resolve (sequential probes,
//!                              timeout + retry per probe, first hit wins)
//!                                            │
//!                                            ▼
//!                                   ResolutionCache (hits only)
//! ```

mod cache;
mod candidates;
mod photo_id;
mod resolver;

pub use cache::{ResolutionCache, ResolutionKey, DEFAULT_RESOLUTION_CACHE_CAPACITY};
pub use candidates::{
    id_variants, parse_start_date, CandidatePaths, IdCasing, DEFAULT_CASINGS,
    DEFAULT_LOOKBACK_DAYS,
};
pub use photo_id::{is_valid_photo_id, neighbor_ids, split_ordinal, venue_from_id, Venue};
pub use resolver::{
    ProbeOutcome, Resolver, ResolverConfig, DEFAULT_PROBE_RETRIES, DEFAULT_PROBE_TIMEOUT,
    DEFAULT_RETRY_BACKOFF,
};
