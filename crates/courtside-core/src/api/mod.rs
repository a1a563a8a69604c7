//! REST client module for the club backend.
//!
//! This module provides the `FetchClient` used by every screen to read
//! tournament listings, results and registrations, and to submit new ones.
//! Reads are cached and deduplicated; mutations keep the cache consistent.

pub mod client;
pub mod error;

pub use client::{AllEvents, FetchClient, MutationBody, RequestOptions};
pub use error::FetchError;
