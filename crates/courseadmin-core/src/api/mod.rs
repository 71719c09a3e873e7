//! REST API client module for the admin backend.
//!
//! This module provides the `ApiClient` for reading and changing learner
//! progress, course content items and video library entries.
//!
//! Requests carry a bearer token taken from configuration; obtaining the
//! token is outside this crate.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
