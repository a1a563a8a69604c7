//! Courtside core library.
//!
//! Cached API client, domain models and configuration shared by the
//! courtside front-ends.

pub mod api;
pub mod cache;
pub mod config;
pub mod models;
pub mod utils;

pub use api::{FetchClient, FetchError, MutationBody, RequestOptions};
pub use config::Config;
