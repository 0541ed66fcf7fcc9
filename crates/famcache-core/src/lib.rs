//! Session data cache for the family-fund portal.
//!
//! The portal's screens read every backend resource through a single
//! [`DataCache`]. Each resource key belongs to a TTL class; reads return
//! cached data while it is fresh, refresh aging data in the background and
//! fall back to stale data when the backend fails.
//!
//! - [`cache`]: the engine (store, freshness policy, refresh coordination, invalidation)
//! - [`api`]: REST client that supplies the fetchers
//! - [`models`]: portal payload types
//! - [`portal`]: typed per-resource reads on top of the engine
//! - [`config`]: configuration file handling

pub mod api;
pub mod cache;
pub mod config;
pub mod models;
pub mod portal;

pub use cache::{CacheResult, CacheStatus, DataCache, FreshnessPolicy, ResourceKey, TtlClass};
pub use config::Config;
pub use portal::{Mutation, PortalApi, PortalCache};
