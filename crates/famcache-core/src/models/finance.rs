use serde::{Deserialize, Serialize};

use super::de;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de::amount")]
    pub amount: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub payment_date: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Subscription {
    /// Payment date, falling back to the date part of `created_at`.
    pub fn display_date(&self) -> &str {
        self.payment_date
            .as_deref()
            .or_else(|| self.created_at.as_deref().and_then(|c| c.split('T').next()))
            .unwrap_or("-")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub payment_type: Option<String>,
    #[serde(default, deserialize_with = "de::amount")]
    pub amount: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub is_on_behalf: bool,
    #[serde(default)]
    pub payer_name: Option<String>,
    #[serde(default)]
    pub beneficiary_name: Option<String>,
    #[serde(default)]
    pub hijri_date: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Payment {
    pub fn is_completed(&self) -> bool {
        self.status.as_deref() == Some("completed")
    }
}
