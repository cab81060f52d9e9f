//! Preferences DTOs and migrations
//!
//! - V1.0.0: language only
//! - V1.1.0: adds the layout flags

use serde::{Deserialize, Serialize};
use version_migrate::{FromDomain, IntoDomain, MigratesTo, Versioned};

use tradeboard_core::{Language, Preferences};

/// Preferences V1.0.0.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
#[serde(rename_all = "camelCase")]
pub struct PreferencesV1_0_0 {
    #[serde(default)]
    pub language: Language,
}

/// Preferences V1.1.0.
#[derive(Debug, Clone, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.1.0")]
#[serde(rename_all = "camelCase")]
pub struct PreferencesV1_1_0 {
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub compact_layout: bool,
    #[serde(default = "default_show_reasoning_panel")]
    pub show_reasoning_panel: bool,
}

fn default_show_reasoning_panel() -> bool {
    true
}

impl MigratesTo<PreferencesV1_1_0> for PreferencesV1_0_0 {
    fn migrate(self) -> PreferencesV1_1_0 {
        PreferencesV1_1_0 {
            language: self.language,
            compact_layout: false,
            show_reasoning_panel: default_show_reasoning_panel(),
        }
    }
}

impl IntoDomain<Preferences> for PreferencesV1_1_0 {
    fn into_domain(self) -> Preferences {
        Preferences {
            language: self.language,
            compact_layout: self.compact_layout,
            show_reasoning_panel: self.show_reasoning_panel,
        }
    }
}

impl FromDomain<Preferences> for PreferencesV1_1_0 {
    fn from_domain(preferences: Preferences) -> Self {
        PreferencesV1_1_0 {
            language: preferences.language,
            compact_layout: preferences.compact_layout,
            show_reasoning_panel: preferences.show_reasoning_panel,
        }
    }
}

/// Creates and configures a Migrator instance for Preferences.
///
/// # Migration Path
///
/// - V1.0.0 → V1.1.0: Adds `compactLayout` (false) and `showReasoningPanel` (true)
/// - V1.1.0 → Preferences: Converts DTO to domain model
pub fn create_preferences_migrator() -> version_migrate::Migrator {
    let mut migrator = version_migrate::Migrator::builder().build();

    let path = version_migrate::Migrator::define("preferences")
        .from::<PreferencesV1_0_0>()
        .step::<PreferencesV1_1_0>()
        .into_with_save::<Preferences>();

    migrator
        .register(path)
        .expect("Failed to register preferences migration path");

    migrator
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_v1_preferences_gain_layout_defaults() {
        let migrator = create_preferences_migrator();
        let prefs: Preferences = migrator
            .load_flat_from("preferences", json!({"version": "1.0.0", "language": "ko"}))
            .unwrap();
        assert_eq!(prefs.language, Language::Ko);
        assert!(!prefs.compact_layout);
        assert!(prefs.show_reasoning_panel);
    }

    #[test]
    fn test_save_writes_v1_1() {
        let migrator = create_preferences_migrator();
        let json = migrator
            .save_domain_flat("preferences", Preferences::default())
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], "1.1.0");
        assert_eq!(value["showReasoningPanel"], true);
    }
}
