//! Utility functions for date, time and string formatting.

pub mod format;

pub use format::{format_date, format_time_12h, parse_date, truncate_string};
