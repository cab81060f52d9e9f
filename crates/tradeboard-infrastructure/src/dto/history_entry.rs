//! HistoryEntry DTOs and migrations
//!
//! - V1.0.0: summary only (id, ticker, label, status, start timestamp)
//! - V2.0.0: adds the completion snapshot and the `dataVersion` tag
//!
//! Timestamps are stored as text and parsed back explicitly. Entries written
//! by older builds may also carry epoch milliseconds.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use version_migrate::{FromDomain, IntoDomain, MigratesTo, Versioned};

use tradeboard_core::MarketDomain;
use tradeboard_core::history::{FULL_DATA_VERSION, HistoryEntry, SUMMARY_DATA_VERSION};
use tradeboard_core::session::{AnalysisSummary, SessionStatus, TradeProposal};

/// A stored point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredTimestamp {
    /// RFC 3339 text, the format written by this crate
    Text(String),
    /// Milliseconds since the Unix epoch
    Millis(i64),
}

impl StoredTimestamp {
    pub fn parse(&self) -> Option<DateTime<Utc>> {
        match self {
            StoredTimestamp::Text(text) => DateTime::parse_from_rfc3339(text)
                .map(|dt| dt.with_timezone(&Utc))
                .ok(),
            StoredTimestamp::Millis(millis) => Utc.timestamp_millis_opt(*millis).single(),
        }
    }

    /// Parses a required timestamp, falling back to the epoch.
    fn parse_or_epoch(&self, session_id: &str, field: &str) -> DateTime<Utc> {
        self.parse().unwrap_or_else(|| {
            tracing::warn!(session_id, field, value = ?self, "Unparseable stored timestamp");
            DateTime::<Utc>::UNIX_EPOCH
        })
    }
}

impl From<DateTime<Utc>> for StoredTimestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        StoredTimestamp::Text(dt.to_rfc3339())
    }
}

/// History entry V1.0.0: the running summary.
#[derive(Debug, Clone, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryV1_0_0 {
    pub session_id: String,
    pub ticker: String,
    #[serde(default)]
    pub display_name: String,
    pub market_domain: MarketDomain,
    pub status: SessionStatus,
    pub timestamp: StoredTimestamp,
}

/// History entry V2.0.0: adds the completion snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, Versioned)]
#[versioned(version = "2.0.0")]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryV2_0_0 {
    pub session_id: String,
    pub ticker: String,
    #[serde(default)]
    pub display_name: String,
    pub market_domain: MarketDomain,
    pub status: SessionStatus,
    pub timestamp: StoredTimestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<StoredTimestamp>,
    #[serde(default)]
    pub analysis_results: Vec<AnalysisSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_proposal: Option<TradeProposal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<i64>,
    /// Missing tags are read as the running summary
    #[serde(default = "summary_data_version")]
    pub data_version: u32,
}

fn summary_data_version() -> u32 {
    SUMMARY_DATA_VERSION
}

// ============================================================================
// Migration implementations
// ============================================================================

/// V1.0.0 entries become summaries: every snapshot field is empty.
impl MigratesTo<HistoryEntryV2_0_0> for HistoryEntryV1_0_0 {
    fn migrate(self) -> HistoryEntryV2_0_0 {
        HistoryEntryV2_0_0 {
            session_id: self.session_id,
            ticker: self.ticker,
            display_name: self.display_name,
            market_domain: self.market_domain,
            status: self.status,
            timestamp: self.timestamp,
            completed_at: None,
            analysis_results: Vec::new(),
            trade_proposal: None,
            reasoning_summary: None,
            duration_secs: None,
            data_version: SUMMARY_DATA_VERSION,
        }
    }
}

// ============================================================================
// Domain model conversions
// ============================================================================

impl IntoDomain<HistoryEntry> for HistoryEntryV2_0_0 {
    fn into_domain(self) -> HistoryEntry {
        let timestamp = self.timestamp.parse_or_epoch(&self.session_id, "timestamp");
        let completed_at = self.completed_at.as_ref().and_then(|ts| {
            let parsed = ts.parse();
            if parsed.is_none() {
                tracing::warn!(session_id = %self.session_id, value = ?ts, "Dropping unparseable completedAt");
            }
            parsed
        });
        let display_name = if self.display_name.is_empty() {
            self.ticker.clone()
        } else {
            self.display_name
        };

        HistoryEntry {
            session_id: self.session_id,
            ticker: self.ticker,
            display_name,
            market_domain: self.market_domain,
            status: self.status,
            timestamp,
            completed_at,
            analysis_results: self.analysis_results,
            trade_proposal: self.trade_proposal,
            reasoning_summary: self.reasoning_summary,
            duration_secs: self.duration_secs,
            data_version: self.data_version.min(FULL_DATA_VERSION),
        }
    }
}

impl FromDomain<HistoryEntry> for HistoryEntryV2_0_0 {
    fn from_domain(entry: HistoryEntry) -> Self {
        HistoryEntryV2_0_0 {
            session_id: entry.session_id,
            ticker: entry.ticker,
            display_name: entry.display_name,
            market_domain: entry.market_domain,
            status: entry.status,
            timestamp: entry.timestamp.into(),
            completed_at: entry.completed_at.map(Into::into),
            analysis_results: entry.analysis_results,
            trade_proposal: entry.trade_proposal,
            reasoning_summary: entry.reasoning_summary,
            duration_secs: entry.duration_secs,
            data_version: entry.data_version,
        }
    }
}

// ============================================================================
// Migrator factory
// ============================================================================

/// Creates and configures a Migrator instance for HistoryEntry.
///
/// # Migration Path
///
/// - V1.0.0 → V2.0.0: Adds snapshot fields (all empty) with `dataVersion = 1`
/// - V2.0.0 → HistoryEntry: Parses stored timestamps
pub fn create_history_entry_migrator() -> version_migrate::Migrator {
    let mut migrator = version_migrate::Migrator::builder().build();

    let path = version_migrate::Migrator::define("history_entry")
        .from::<HistoryEntryV1_0_0>()
        .step::<HistoryEntryV2_0_0>()
        .into_with_save::<HistoryEntry>();

    migrator
        .register(path)
        .expect("Failed to register history_entry migration path");

    migrator
}
