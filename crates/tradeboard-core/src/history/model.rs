//! History entry domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::market::MarketDomain;
use crate::session::{AnalysisSummary, SessionRecord, SessionStatus, TradeProposal};

/// Entries written when a session starts: identity and status only.
pub const SUMMARY_DATA_VERSION: u32 = 1;
/// Entries written on the terminal transition, with the full snapshot fields.
pub const FULL_DATA_VERSION: u32 = 2;

/// Longest reasoning summary kept in history, in characters.
const MAX_SUMMARY_CHARS: usize = 600;

/// A durable summary of one session.
///
/// Entries are snapshots copied out of a `SessionRecord`, never live
/// references, and outlive the record they describe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub session_id: String,
    pub ticker: String,
    pub display_name: String,
    pub market_domain: MarketDomain,
    pub status: SessionStatus,
    /// When the session started
    pub timestamp: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub analysis_results: Vec<AnalysisSummary>,
    pub trade_proposal: Option<TradeProposal>,
    pub reasoning_summary: Option<String>,
    /// Wall-clock seconds from start to finish
    pub duration_secs: Option<i64>,
    /// `SUMMARY_DATA_VERSION` or `FULL_DATA_VERSION`
    pub data_version: u32,
}

impl HistoryEntry {
    /// The summary appended when a session is admitted.
    pub fn started(record: &SessionRecord) -> Self {
        Self {
            session_id: record.session_id.clone(),
            ticker: record.ticker.clone(),
            display_name: record.display_name.clone(),
            market_domain: record.market_domain,
            status: record.status,
            timestamp: record.created_at,
            completed_at: None,
            analysis_results: Vec::new(),
            trade_proposal: None,
            reasoning_summary: None,
            duration_secs: None,
            data_version: SUMMARY_DATA_VERSION,
        }
    }

    /// The full snapshot written when a session reaches a terminal status.
    ///
    /// When `reasoning_summary` is `None` it is derived from the last
    /// `summary_lines` entries of the record's reasoning log.
    pub fn finished(
        record: &SessionRecord,
        reasoning_summary: Option<String>,
        summary_lines: usize,
    ) -> Self {
        let completed_at = record.updated_at;
        let duration = completed_at.signed_duration_since(record.created_at);

        Self {
            completed_at: Some(completed_at),
            analysis_results: record.analyses.clone(),
            trade_proposal: record.trade_proposal.clone(),
            reasoning_summary: reasoning_summary
                .or_else(|| derive_reasoning_summary(&record.reasoning_log, summary_lines)),
            duration_secs: Some(duration.num_seconds().max(0)),
            data_version: FULL_DATA_VERSION,
            ..Self::started(record)
        }
    }

    pub fn is_full_snapshot(&self) -> bool {
        self.data_version >= FULL_DATA_VERSION
    }
}

/// Builds a short summary from the tail of a reasoning log.
///
/// Takes the last `lines` non-blank entries in chronological order, one per
/// line, capped at `MAX_SUMMARY_CHARS`. Returns `None` for an empty log.
pub fn derive_reasoning_summary(log: &[String], lines: usize) -> Option<String> {
    let mut tail: Vec<&str> = log
        .iter()
        .rev()
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .take(lines)
        .collect();
    if tail.is_empty() {
        return None;
    }
    tail.reverse();

    let joined = tail.join("\n");
    if joined.chars().count() <= MAX_SUMMARY_CHARS {
        Some(joined)
    } else {
        let truncated: String = joined.chars().take(MAX_SUMMARY_CHARS - 1).collect();
        Some(format!("{truncated}…"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::DomainRegistry;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_summary_uses_tail_in_order() {
        let log = lines(&["one", "two", "three", "four"]);
        assert_eq!(
            derive_reasoning_summary(&log, 3).as_deref(),
            Some("two\nthree\nfour")
        );
    }

    #[test]
    fn test_summary_skips_blank_lines() {
        let log = lines(&["alpha", "  ", "beta", ""]);
        assert_eq!(derive_reasoning_summary(&log, 2).as_deref(), Some("alpha\nbeta"));
    }

    #[test]
    fn test_summary_of_empty_log() {
        assert_eq!(derive_reasoning_summary(&[], 3), None);
    }

    #[test]
    fn test_summary_is_capped() {
        let log = vec!["x".repeat(2_000)];
        let summary = derive_reasoning_summary(&log, 3).unwrap();
        assert_eq!(summary.chars().count(), MAX_SUMMARY_CHARS);
        assert!(summary.ends_with('…'));
    }

    #[test]
    fn test_started_and_finished_snapshots() {
        let mut reg = DomainRegistry::new(MarketDomain::GlobalEquity, 3);
        reg.create_session("s", "NVDA", Some("NVIDIA".to_string())).unwrap();
        reg.append_reasoning("s", "earnings beat");
        reg.append_reasoning("s", "guidance raised");

        let started = HistoryEntry::started(reg.get("s").unwrap());
        assert_eq!(started.data_version, SUMMARY_DATA_VERSION);
        assert_eq!(started.status, SessionStatus::Running);
        assert!(!started.is_full_snapshot());

        let record = reg.finish_session("s", SessionStatus::Completed, None).unwrap();
        let finished = HistoryEntry::finished(record, None, 3);
        assert!(finished.is_full_snapshot());
        assert_eq!(finished.status, SessionStatus::Completed);
        assert_eq!(finished.timestamp, started.timestamp);
        assert_eq!(
            finished.reasoning_summary.as_deref(),
            Some("earnings beat\nguidance raised")
        );
        assert!(finished.duration_secs.unwrap() >= 0);
    }

    #[test]
    fn test_explicit_summary_wins() {
        let mut reg = DomainRegistry::new(MarketDomain::Crypto, 3);
        reg.create_session("s", "KRW-BTC", None).unwrap();
        reg.append_reasoning("s", "ignored");
        let record = reg.finish_session("s", SessionStatus::Completed, None).unwrap();
        let entry = HistoryEntry::finished(record, Some("operator note".to_string()), 3);
        assert_eq!(entry.reasoning_summary.as_deref(), Some("operator note"));
    }
}
