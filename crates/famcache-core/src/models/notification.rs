use serde::{Deserialize, Serialize};

use super::de;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub title_ar: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub body_ar: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Notification {
    pub fn display_title(&self) -> &str {
        self.title_ar
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or("")
    }

    pub fn display_body(&self) -> &str {
        self.body_ar
            .as_deref()
            .or(self.body.as_deref())
            .or(self.message.as_deref())
            .unwrap_or("")
    }

    /// Older rows carry `read`, newer ones `is_read`.
    pub fn is_unread(&self) -> bool {
        !(self.is_read || self.read)
    }
}

/// Body of the unread-count endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCount {
    #[serde(default)]
    unread_count: Option<u64>,
    #[serde(default)]
    count: Option<u64>,
}

impl UnreadCount {
    pub fn value(&self) -> u64 {
        self.unread_count.or(self.count).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unread_count_defaults_to_zero() {
        let count: UnreadCount = serde_json::from_str("{}").expect("count JSON");
        assert_eq!(count.value(), 0);

        let count: UnreadCount = serde_json::from_str(r#"{"unread_count": 5}"#).expect("count JSON");
        assert_eq!(count.value(), 5);

        let count: UnreadCount =
            serde_json::from_str(r#"{"unread_count": 5, "count": 9}"#).expect("count JSON");
        assert_eq!(count.value(), 5);
    }

    #[test]
    fn test_notification_fallback_fields() {
        let n: Notification =
            serde_json::from_str(r#"{"id": 9, "title_ar": "تنبيه", "message": "hi", "read": true}"#)
                .expect("notification JSON");
        assert_eq!(n.display_title(), "تنبيه");
        assert_eq!(n.display_body(), "hi");
        assert!(!n.is_unread());
    }

    #[test]
    fn test_notification_with_every_language_column() {
        let json = r#"{"id": 3, "title": "Alert", "title_ar": "تنبيه", "body": "Paid", "body_ar": "تم الدفع", "message": "m", "is_read": false, "read": false}"#;
        let n: Notification = serde_json::from_str(json).expect("notification JSON");
        assert_eq!(n.display_title(), "تنبيه");
        assert_eq!(n.display_body(), "تم الدفع");
        assert_eq!(n.title.as_deref(), Some("Alert"));
        assert!(n.is_unread());
    }
}
