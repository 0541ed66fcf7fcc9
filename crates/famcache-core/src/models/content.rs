use serde::{Deserialize, Serialize};

use super::de;

/// A fund-raising initiative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Initiative {
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub title_ar: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "de::amount")]
    pub raised: Option<f64>,
    #[serde(default, deserialize_with = "de::amount")]
    pub target: Option<f64>,
    #[serde(default)]
    pub contributors: u64,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub beneficiary: Option<String>,
}

impl Initiative {
    pub fn display_title(&self) -> &str {
        self.title_ar
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or("")
    }

    /// Percentage of the target raised, capped at 100.
    pub fn progress_percent(&self) -> f64 {
        match (self.raised, self.target) {
            (Some(raised), Some(target)) if target > 0.0 => (raised / target * 100.0).min(100.0),
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub title_ar: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub content_ar: Option<String>,
    #[serde(default)]
    pub publish_date: Option<String>,
}

impl NewsItem {
    /// Arabic title when present.
    pub fn display_title(&self) -> &str {
        self.title_ar
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or("")
    }

    pub fn display_content(&self) -> &str {
        self.content_ar
            .as_deref()
            .or(self.content.as_deref())
            .unwrap_or("")
    }

    pub fn publish_day(&self) -> &str {
        self.publish_date
            .as_deref()
            .and_then(|d| d.split('T').next())
            .unwrap_or("")
    }
}
