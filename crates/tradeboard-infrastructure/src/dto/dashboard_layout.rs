//! DashboardLayout DTOs and migrations
//!
//! The top-level shape of the dashboard file. Nested preferences and history
//! entries carry their own versions and are kept as `serde_json::Value` here
//! so each one can be migrated (or skipped) individually.
//!
//! - V1.0.0: per-domain history arrays only
//! - V1.1.0: adds the preferences bag

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use version_migrate::{FromDomain, IntoDomain, MigratesTo, Versioned};

/// Latest layout version written by this crate.
pub const DASHBOARD_LAYOUT_VERSION: &str = "1.1.0";

/// The dashboard file with its nested entities still undecoded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardLayout {
    pub preferences: Option<serde_json::Value>,
    /// Domain key (e.g. `"crypto"`) to stored entries, oldest first
    pub history: BTreeMap<String, Vec<serde_json::Value>>,
}

/// Dashboard layout V1.0.0.
#[derive(Debug, Clone, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
pub struct DashboardLayoutV1_0_0 {
    #[serde(default)]
    pub history: BTreeMap<String, Vec<serde_json::Value>>,
}

/// Dashboard layout V1.1.0.
#[derive(Debug, Clone, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.1.0")]
pub struct DashboardLayoutV1_1_0 {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<serde_json::Value>,
    #[serde(default)]
    pub history: BTreeMap<String, Vec<serde_json::Value>>,
}

impl MigratesTo<DashboardLayoutV1_1_0> for DashboardLayoutV1_0_0 {
    fn migrate(self) -> DashboardLayoutV1_1_0 {
        DashboardLayoutV1_1_0 {
            preferences: None,
            history: self.history,
        }
    }
}

impl IntoDomain<DashboardLayout> for DashboardLayoutV1_1_0 {
    fn into_domain(self) -> DashboardLayout {
        DashboardLayout {
            preferences: self.preferences,
            history: self.history,
        }
    }
}

impl FromDomain<DashboardLayout> for DashboardLayoutV1_1_0 {
    fn from_domain(layout: DashboardLayout) -> Self {
        DashboardLayoutV1_1_0 {
            preferences: layout.preferences,
            history: layout.history,
        }
    }
}

/// Creates and configures a Migrator instance for the dashboard file.
///
/// # Migration Path
///
/// - V1.0.0 → V1.1.0: Adds `preferences` (absent)
/// - V1.1.0 → DashboardLayout
pub fn create_dashboard_layout_migrator() -> version_migrate::Migrator {
    let mut migrator = version_migrate::Migrator::builder().build();

    let path = version_migrate::Migrator::define("dashboard")
        .from::<DashboardLayoutV1_0_0>()
        .step::<DashboardLayoutV1_1_0>()
        .into_with_save::<DashboardLayout>();

    migrator
        .register(path)
        .expect("Failed to register dashboard migration path");

    migrator
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_v1_layout_has_no_preferences() {
        let migrator = create_dashboard_layout_migrator();
        let layout: DashboardLayout = migrator
            .load_flat_from(
                "dashboard",
                json!({"version": "1.0.0", "history": {"crypto": [{"sessionId": "a"}]}}),
            )
            .unwrap();
        assert!(layout.preferences.is_none());
        assert_eq!(layout.history["crypto"].len(), 1);
    }

    #[test]
    fn test_save_writes_latest_version() {
        let migrator = create_dashboard_layout_migrator();
        let json = migrator
            .save_domain_flat("dashboard", DashboardLayout::default())
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], DASHBOARD_LAYOUT_VERSION);
    }
}
