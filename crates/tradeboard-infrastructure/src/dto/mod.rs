//! Data Transfer Objects (DTOs) for persistence.
//!
//! These DTOs are the versioned on-disk schema. They are private to the
//! infrastructure layer and carry the evolution of the storage format.
//!
//! ## Schema Versioning (Semantic Versioning)
//!
//! - **MAJOR (X.0.0)**: the entry gains a new kind of content
//! - **MINOR (1.X.0)**: backward-compatible additions (new optional fields)
//!
//! Stored objects without a `version` key are read as `1.0.0`.
//!
//! ### HistoryEntry Version History
//! - **1.0.0**: running summary
//! - **2.0.0**: completion snapshot and `dataVersion`
//!
//! ### Preferences Version History
//! - **1.0.0**: language
//! - **1.1.0**: layout flags
//!
//! ### DashboardLayout Version History
//! - **1.0.0**: history only
//! - **1.1.0**: preferences bag

mod dashboard_layout;
mod engine_config;
mod history_entry;
mod preferences;

pub use dashboard_layout::{
    DASHBOARD_LAYOUT_VERSION, DashboardLayout, DashboardLayoutV1_0_0, DashboardLayoutV1_1_0,
    create_dashboard_layout_migrator,
};
pub use engine_config::{EngineConfigV1_0_0, create_engine_config_migrator};
pub use history_entry::{
    HistoryEntryV1_0_0, HistoryEntryV2_0_0, StoredTimestamp, create_history_entry_migrator,
};
pub use preferences::{PreferencesV1_0_0, PreferencesV1_1_0, create_preferences_migrator};

/// Version assumed for stored objects written before versioning.
pub const UNVERSIONED_SCHEMA: &str = "1.0.0";

/// Inserts the `version` key into a JSON object that lacks one.
pub fn ensure_json_version(value: &mut serde_json::Value) {
    if let serde_json::Value::Object(map) = value {
        map.entry("version")
            .or_insert(serde_json::Value::String(UNVERSIONED_SCHEMA.to_string()));
    }
}

/// Inserts the `version` key into a TOML table that lacks one.
pub fn ensure_toml_version(value: &mut toml::Value) {
    if let toml::Value::Table(table) = value {
        table
            .entry("version")
            .or_insert(toml::Value::String(UNVERSIONED_SCHEMA.to_string()));
    }
}
