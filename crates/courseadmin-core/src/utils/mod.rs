//! Utility functions for string formatting.

pub mod format;

pub use format::{format_bytes, format_date, format_duration, format_optional, format_percent, truncate_string};
