//! REST API client for the family-fund backend.
//!
//! This module provides the `ApiClient` whose methods serve as the cache's
//! fetchers. Authentication happens elsewhere; the client only attaches a
//! bearer token it is given.

pub mod client;
pub mod error;

pub use client::{ApiClient, DEFAULT_API_BASE_URL};
pub use error::ApiError;
