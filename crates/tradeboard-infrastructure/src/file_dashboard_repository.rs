//! Dashboard repository implementation.
//!
//! Stores history logs and preferences in one versioned JSON file:
//!
//! ```json
//! {
//!   "version": "1.1.0",
//!   "preferences": { "version": "1.1.0", "language": "en", ... },
//!   "history": {
//!     "crypto": [ { "version": "2.0.0", "sessionId": "...", ... } ]
//!   }
//! }
//! ```
//!
//! Loading never fails on stored shape: unreadable entries, unknown domain
//! keys and corrupt files degrade to defaults with a warning.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use semver::Version;
use serde_json::Value;
use version_migrate::Migrator;

use tradeboard_core::error::Result;
use tradeboard_core::history::HistoryEntry;
use tradeboard_core::{DashboardRepository, EngineError, MarketDomain, PersistedDashboard, Preferences};

use crate::dto::{
    DASHBOARD_LAYOUT_VERSION, DashboardLayout, create_dashboard_layout_migrator,
    create_history_entry_migrator, create_preferences_migrator, ensure_json_version,
};
use crate::paths::TradeboardPaths;
use crate::storage::AtomicJsonFile;

/// File-based dashboard repository with version migration support.
pub struct FileDashboardRepository {
    file: AtomicJsonFile<Value>,
    layout_migrator: Migrator,
    preferences_migrator: Migrator,
    history_migrator: Migrator,
}

impl FileDashboardRepository {
    /// Creates a repository at the default data path.
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(TradeboardPaths::dashboard_file()?))
    }

    /// Creates a repository backed by a custom file (CLI override, tests).
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            file: AtomicJsonFile::new(path),
            layout_migrator: create_dashboard_layout_migrator(),
            preferences_migrator: create_preferences_migrator(),
            history_migrator: create_history_entry_migrator(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }

    // ============================================================================
    // Decoding
    // ============================================================================

    fn decode(&self, mut value: Value) -> PersistedDashboard {
        if !value.is_object() {
            tracing::warn!(path = %self.file.path().display(), "Dashboard file is not an object, using defaults");
            return PersistedDashboard::default();
        }
        if let Some(stored) = stored_version(&value) {
            if is_newer_than_supported(&stored) {
                tracing::warn!(
                    stored = %stored,
                    supported = DASHBOARD_LAYOUT_VERSION,
                    "Dashboard file was written by a newer version, using defaults"
                );
                return PersistedDashboard::default();
            }
        }
        ensure_json_version(&mut value);

        let layout: DashboardLayout = match self.layout_migrator.load_flat_from("dashboard", value) {
            Ok(layout) => layout,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to migrate dashboard file, using defaults");
                return PersistedDashboard::default();
            }
        };

        PersistedDashboard {
            preferences: layout
                .preferences
                .map(|prefs| self.decode_preferences(prefs))
                .unwrap_or_default(),
            history: self.decode_history(layout.history),
        }
    }

    fn decode_preferences(&self, mut value: Value) -> Preferences {
        ensure_json_version(&mut value);
        self.preferences_migrator
            .load_flat_from("preferences", value)
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to load preferences, using defaults");
                Preferences::default()
            })
    }

    fn decode_history(
        &self,
        stored: BTreeMap<String, Vec<Value>>,
    ) -> BTreeMap<MarketDomain, Vec<HistoryEntry>> {
        let mut history = BTreeMap::new();

        for (key, values) in stored {
            let domain = match MarketDomain::from_key(&key) {
                Ok(domain) => domain,
                Err(e) => {
                    tracing::warn!(error = %e, entries = values.len(), "Skipping history of unknown domain");
                    continue;
                }
            };

            let entries: Vec<HistoryEntry> = values
                .into_iter()
                .enumerate()
                .filter_map(|(index, value)| self.decode_entry(domain, index, value))
                .collect();
            history.insert(domain, entries);
        }

        history
    }

    fn decode_entry(&self, domain: MarketDomain, index: usize, mut value: Value) -> Option<HistoryEntry> {
        let Value::Object(map) = &mut value else {
            tracing::warn!(%domain, index, "Skipping non-object history entry");
            return None;
        };
        // The key the entry is stored under is authoritative.
        map.insert(
            "marketDomain".to_string(),
            Value::String(domain.key().to_string()),
        );
        ensure_json_version(&mut value);

        match self.history_migrator.load_flat_from("history_entry", value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(%domain, index, error = %e, "Skipping unreadable history entry");
                None
            }
        }
    }

    // ============================================================================
    // Encoding
    // ============================================================================

    fn encode(&self, dashboard: &PersistedDashboard) -> Result<Value> {
        let preferences = flat_value(
            "preferences",
            self.preferences_migrator
                .save_domain_flat("preferences", dashboard.preferences.clone()),
        )?;

        let mut history = BTreeMap::new();
        for (domain, entries) in &dashboard.history {
            let values = entries
                .iter()
                .map(|entry| {
                    flat_value(
                        "history_entry",
                        self.history_migrator
                            .save_domain_flat("history_entry", entry.clone()),
                    )
                })
                .collect::<Result<Vec<_>>>()?;
            history.insert(domain.key().to_string(), values);
        }

        let layout = DashboardLayout {
            preferences: Some(preferences),
            history,
        };
        flat_value(
            "dashboard",
            self.layout_migrator.save_domain_flat("dashboard", layout),
        )
    }
}

/// Parses the flat JSON produced by a migrator back into a value tree.
fn flat_value(
    entity: &str,
    saved: std::result::Result<String, version_migrate::MigrationError>,
) -> Result<Value> {
    let json = saved.map_err(|e| EngineError::Serialization {
        format: "JSON".to_string(),
        message: format!("Failed to serialize {}: {}", entity, e),
    })?;
    Ok(serde_json::from_str(&json)?)
}

/// The `version` key of a stored layout, if it is valid semver.
fn stored_version(value: &Value) -> Option<Version> {
    value
        .get("version")
        .and_then(Value::as_str)
        .and_then(|v| Version::parse(v).ok())
}

fn is_newer_than_supported(stored: &Version) -> bool {
    Version::parse(DASHBOARD_LAYOUT_VERSION).is_ok_and(|supported| stored > &supported)
}

#[async_trait]
impl DashboardRepository for FileDashboardRepository {
    async fn load(&self) -> Result<PersistedDashboard> {
        let file = self.file.clone();
        let loaded = tokio::task::spawn_blocking(move || file.load())
            .await
            .map_err(|e| EngineError::internal(format!("Dashboard load task failed: {}", e)))?;

        let value = match loaded {
            Ok(Some(value)) => value,
            Ok(None) => {
                tracing::debug!(path = %self.file.path().display(), "No dashboard file, using defaults");
                return Ok(PersistedDashboard::default());
            }
            Err(e) if e.is_corrupt() => {
                tracing::warn!(
                    path = %self.file.path().display(),
                    error = %e,
                    "Dashboard file is corrupt, using defaults"
                );
                return Ok(PersistedDashboard::default());
            }
            Err(e) => return Err(e.into()),
        };

        Ok(self.decode(value))
    }

    async fn save(&self, dashboard: &PersistedDashboard) -> Result<()> {
        let value = self.encode(dashboard)?;
        let file = self.file.clone();
        tokio::task::spawn_blocking(move || file.save(&value))
            .await
            .map_err(|e| EngineError::internal(format!("Dashboard save task failed: {}", e)))??;

        tracing::debug!(path = %self.file.path().display(), "Saved dashboard file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use tempfile::TempDir;
    use tradeboard_core::Language;
    use tradeboard_core::history::{FULL_DATA_VERSION, SUMMARY_DATA_VERSION};
    use tradeboard_core::session::SessionStatus;

    fn repo(temp_dir: &TempDir) -> FileDashboardRepository {
        FileDashboardRepository::with_path(temp_dir.path().join("dashboard.json"))
    }

    fn write(temp_dir: &TempDir, value: &Value) {
        std::fs::write(temp_dir.path().join("dashboard.json"), value.to_string()).unwrap();
    }

    fn entry(id: &str, domain: MarketDomain, version: u32) -> HistoryEntry {
        HistoryEntry {
            session_id: id.to_string(),
            ticker: "AAPL".to_string(),
            display_name: "Apple".to_string(),
            market_domain: domain,
            status: SessionStatus::Completed,
            timestamp: Utc::now(),
            completed_at: Some(Utc::now()),
            analysis_results: Vec::new(),
            trade_proposal: None,
            reasoning_summary: Some("momentum".to_string()),
            duration_secs: Some(42),
            data_version: version,
        }
    }

    #[tokio::test]
    async fn test_load_default_when_not_exists() {
        let temp_dir = TempDir::new().unwrap();
        let loaded = repo(&temp_dir).load().await.unwrap();
        assert_eq!(loaded, PersistedDashboard::default());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let repo = repo(&temp_dir);

        let mut dashboard = PersistedDashboard::default();
        dashboard.preferences.language = Language::Ko;
        dashboard.preferences.compact_layout = true;
        dashboard.history.insert(
            MarketDomain::GlobalEquity,
            vec![
                entry("a", MarketDomain::GlobalEquity, FULL_DATA_VERSION),
                entry("b", MarketDomain::GlobalEquity, SUMMARY_DATA_VERSION),
            ],
        );

        repo.save(&dashboard).await.unwrap();
        let loaded = repo.load().await.unwrap();
        assert_eq!(loaded, dashboard);

        let raw: Value =
            serde_json::from_str(&std::fs::read_to_string(repo.path()).unwrap()).unwrap();
        assert_eq!(raw["version"], DASHBOARD_LAYOUT_VERSION);
        assert_eq!(raw["history"]["global-equity"][0]["version"], "2.0.0");
    }

    #[tokio::test]
    async fn test_unversioned_legacy_file_loads_with_defaults() {
        let temp_dir = TempDir::new().unwrap();
        write(
            &temp_dir,
            &json!({
                "history": {
                    "crypto": [
                        {
                            "sessionId": "old",
                            "ticker": "KRW-BTC",
                            "displayName": "Bitcoin",
                            "status": "completed",
                            "timestamp": "2024-01-05T10:00:00.000Z"
                        }
                    ]
                }
            }),
        );

        let loaded = repo(&temp_dir).load().await.unwrap();
        assert_eq!(loaded.preferences, Preferences::default());

        let crypto = loaded.history_for(MarketDomain::Crypto);
        assert_eq!(crypto.len(), 1);
        assert_eq!(crypto[0].market_domain, MarketDomain::Crypto);
        assert_eq!(crypto[0].data_version, SUMMARY_DATA_VERSION);
        assert!(crypto[0].analysis_results.is_empty());
        assert!(crypto[0].reasoning_summary.is_none());
    }

    #[tokio::test]
    async fn test_unknown_domains_and_bad_entries_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        write(
            &temp_dir,
            &json!({
                "version": "1.1.0",
                "preferences": {"version": "1.1.0", "language": "ko"},
                "history": {
                    "forex": [{"sessionId": "x", "ticker": "EURUSD", "status": "completed", "timestamp": "2024-01-01T00:00:00Z"}],
                    "global-equity": [
                        {"sessionId": "ok", "ticker": "MSFT", "status": "running", "timestamp": "2024-01-01T00:00:00Z"},
                        {"sessionId": "broken"},
                        "not an object"
                    ]
                }
            }),
        );

        let loaded = repo(&temp_dir).load().await.unwrap();
        assert_eq!(loaded.preferences.language, Language::Ko);
        assert_eq!(loaded.history.len(), 1);
        let equity = loaded.history_for(MarketDomain::GlobalEquity);
        assert_eq!(equity.len(), 1);
        assert_eq!(equity[0].session_id, "ok");
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_as_default() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("dashboard.json"), "{\"history\": [").unwrap();

        let loaded = repo(&temp_dir).load().await.unwrap();
        assert_eq!(loaded, PersistedDashboard::default());
    }

    #[tokio::test]
    async fn test_newer_layout_is_not_misread() {
        let temp_dir = TempDir::new().unwrap();
        write(&temp_dir, &json!({"version": "9.0.0", "history": {}}));

        let loaded = repo(&temp_dir).load().await.unwrap();
        assert_eq!(loaded, PersistedDashboard::default());
    }
}
