use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Volatility class of a cached resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtlClass {
    /// Near real-time data such as notifications.
    Short,
    Medium,
    /// Slowly-changing data such as the family tree.
    Long,
}

impl TtlClass {
    pub fn default_duration(self) -> Duration {
        match self {
            TtlClass::Short => Duration::minutes(2),
            TtlClass::Medium => Duration::minutes(5),
            TtlClass::Long => Duration::minutes(15),
        }
    }
}

impl fmt::Display for TtlClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TtlClass::Short => write!(f, "SHORT"),
            TtlClass::Medium => write!(f, "MEDIUM"),
            TtlClass::Long => write!(f, "LONG"),
        }
    }
}

/// Logical cache slot.
///
/// The portal's resources have dedicated variants; any other name is kept
/// as [`ResourceKey::Custom`] and treated as a MEDIUM resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    Dashboard,
    Profile,
    Subscriptions,
    Payments,
    Notifications,
    NotificationCount,
    FamilyTree,
    Branches,
    Initiatives,
    News,
    Custom(String),
}

impl ResourceKey {
    /// Every key the portal knows about, in display order.
    pub const KNOWN: [ResourceKey; 10] = [
        ResourceKey::Dashboard,
        ResourceKey::Profile,
        ResourceKey::Subscriptions,
        ResourceKey::Payments,
        ResourceKey::Notifications,
        ResourceKey::NotificationCount,
        ResourceKey::FamilyTree,
        ResourceKey::Branches,
        ResourceKey::Initiatives,
        ResourceKey::News,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ResourceKey::Dashboard => "dashboard",
            ResourceKey::Profile => "profile",
            ResourceKey::Subscriptions => "subscriptions",
            ResourceKey::Payments => "payments",
            ResourceKey::Notifications => "notifications",
            ResourceKey::NotificationCount => "notificationCount",
            ResourceKey::FamilyTree => "familyTree",
            ResourceKey::Branches => "branches",
            ResourceKey::Initiatives => "initiatives",
            ResourceKey::News => "news",
            ResourceKey::Custom(name) => name,
        }
    }

    /// Static key to TTL class table.
    pub fn ttl_class(&self) -> TtlClass {
        match self {
            ResourceKey::Notifications => TtlClass::Short,
            ResourceKey::FamilyTree | ResourceKey::Branches => TtlClass::Long,
            ResourceKey::Dashboard
            | ResourceKey::Profile
            | ResourceKey::Subscriptions
            | ResourceKey::Payments
            | ResourceKey::NotificationCount
            | ResourceKey::Initiatives
            | ResourceKey::News
            | ResourceKey::Custom(_) => TtlClass::Medium,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ResourceKey::Custom(_))
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKey {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = ResourceKey::KNOWN
            .iter()
            .find(|k| k.as_str() == s)
            .cloned()
            .unwrap_or_else(|| ResourceKey::Custom(s.to_string()));
        Ok(key)
    }
}

impl From<&str> for ResourceKey {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(key) => key,
            Err(never) => match never {},
        }
    }
}
