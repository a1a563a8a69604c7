//! In-memory response caching for the club API client.
//!
//! This module provides the `ResponseCache` that backs `FetchClient` reads.
//! Entries are keyed by `METHOD:url`, hold the raw JSON payload, and move
//! through three freshness states as they age:
//!
//! - Fresh: younger than the TTL, served without touching the network
//! - Stale: between one and two TTLs, served and revalidated in the background
//! - Expired: two TTLs or older, treated as absent
//!
//! Time comes from a `Clock` so the state machine can be driven by tests.

pub mod clock;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use store::{cache_key, CacheEntry, CacheHit, Freshness, ResponseCache};
