//! In-memory caching of portal API responses.
//!
//! This module provides the [`DataCache`] used by every screen to read
//! backend data. Entries live for the duration of a session and are
//! classified by volatility:
//!
//! - SHORT (2 minutes): notifications
//! - MEDIUM (5 minutes): dashboard, profile, payments and most lists
//! - LONG (15 minutes): family tree and branches
//!
//! Reads follow stale-while-revalidate: fresh data is returned at once,
//! aging data is additionally refreshed in the background (at most one
//! refresh per key), and stale or missing data is fetched before returning.
//! Refresh failures never discard data that was previously good.

pub mod clock;
pub mod key;
pub mod manager;
pub mod policy;
mod refresh;
pub mod result;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use key::{ResourceKey, TtlClass};
pub use manager::DataCache;
pub use policy::{FreshnessPolicy, SoftRefresh};
pub use result::{format_age, CacheResult, CacheStatus};
pub use store::{CacheEntry, CacheStore, Slot};
