use serde::{Deserialize, Serialize};

use super::de;

/// The signed-in member as returned by the mobile profile endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub full_name_ar: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub membership_number: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub membership_status: Option<String>,
    #[serde(default, deserialize_with = "de::amount")]
    pub balance: Option<f64>,
    #[serde(default, deserialize_with = "de::amount")]
    pub current_balance: Option<f64>,
}

impl Profile {
    /// Current balance when reported, else the stored balance, else zero.
    pub fn effective_balance(&self) -> f64 {
        self.current_balance.or(self.balance).unwrap_or(0.0)
    }

    pub fn is_active(&self) -> bool {
        self.membership_status.as_deref() == Some("active")
    }

    /// Arabic name first, then the Latin one.
    pub fn display_name(&self) -> &str {
        self.full_name_ar
            .as_deref()
            .or(self.full_name.as_deref())
            .or(self.name.as_deref())
            .unwrap_or("-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mobile_profile() {
        let json = r#"{"id": 1, "full_name_ar": "محمد الشعيل", "membership_number": "SH-0001", "phone": "0501234567", "balance": "1500.00", "membership_status": "active"}"#;
        let profile: Profile = serde_json::from_str(json).expect("profile JSON");

        assert_eq!(profile.id.as_deref(), Some("1"));
        assert_eq!(profile.display_name(), "محمد الشعيل");
        assert_eq!(profile.effective_balance(), 1500.0);
        assert!(profile.is_active());
    }

    #[test]
    fn test_both_name_columns_present() {
        let json = r#"{"id": 1, "full_name": "Mohammed", "full_name_ar": "محمد", "name": "M"}"#;
        let profile: Profile = serde_json::from_str(json).expect("profile JSON");

        assert_eq!(profile.full_name.as_deref(), Some("Mohammed"));
        assert_eq!(profile.display_name(), "محمد");

        let latin_only: Profile = serde_json::from_str(r#"{"full_name": "Mohammed"}"#).expect("profile JSON");
        assert_eq!(latin_only.display_name(), "Mohammed");
        let bare: Profile = serde_json::from_str(r#"{"name": "M"}"#).expect("profile JSON");
        assert_eq!(bare.display_name(), "M");
    }

    #[test]
    fn test_current_balance_preferred() {
        let json = r#"{"balance": 100, "current_balance": 250.5}"#;
        let profile: Profile = serde_json::from_str(json).expect("profile JSON");
        assert_eq!(profile.effective_balance(), 250.5);
        assert!(!profile.is_active());
    }
}
