//! Data models for portal resources.
//!
//! This module contains the payloads the backend returns and the cache stores:
//!
//! - `Profile`: the signed-in member, with balance and status
//! - `Subscription`, `Payment`: dues and payment history
//! - `Notification`, `UnreadCount`: inbox entries and the badge counter
//! - `TreeNode`, `Branch`: family tree structure
//! - `Initiative`, `NewsItem`: fund campaigns and announcements
//! - `Dashboard`: the composite home-screen resource

mod de;

pub mod content;
pub mod dashboard;
pub mod family;
pub mod finance;
pub mod member;
pub mod notification;

pub use content::{Initiative, NewsItem};
pub use dashboard::Dashboard;
pub use family::{Branch, FamilyTree, TreeNode};
pub use finance::{Payment, Subscription};
pub use member::Profile;
pub use notification::{Notification, UnreadCount};
