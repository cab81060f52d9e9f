//! Persistence port for the durable part of the dashboard.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::history::HistoryEntry;
use crate::market::MarketDomain;
use crate::preferences::Preferences;

/// Everything that survives a restart: history logs and preferences.
///
/// Live session records are intentionally absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedDashboard {
    pub preferences: Preferences,
    /// History per domain, oldest entry first
    pub history: BTreeMap<MarketDomain, Vec<HistoryEntry>>,
}

impl PersistedDashboard {
    /// Stored history of one domain; empty when the domain was never saved.
    pub fn history_for(&self, domain: MarketDomain) -> &[HistoryEntry] {
        self.history
            .get(&domain)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Repository for the persisted dashboard state.
#[async_trait]
pub trait DashboardRepository: Send + Sync {
    /// Loads the stored dashboard. Missing storage yields the default.
    async fn load(&self) -> Result<PersistedDashboard>;

    /// Replaces the stored dashboard.
    async fn save(&self, dashboard: &PersistedDashboard) -> Result<()>;
}
