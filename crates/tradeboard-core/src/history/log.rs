//! Capped, append-only history log of one market domain.

use std::collections::VecDeque;

use super::model::HistoryEntry;
use crate::market::MarketDomain;

/// Default number of entries kept per domain.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Durable session summaries of one domain, oldest first.
///
/// Entries are keyed by session id. The only rewrite an entry ever sees is
/// the upgrade from the running summary to the full snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryLog {
    domain: MarketDomain,
    entries: VecDeque<HistoryEntry>,
    limit: usize,
}

impl HistoryLog {
    pub fn new(domain: MarketDomain, limit: usize) -> Self {
        Self {
            domain,
            entries: VecDeque::new(),
            limit,
        }
    }

    /// Rebuilds a log from stored entries (oldest first).
    ///
    /// Duplicate session ids keep the richer entry; overflow beyond `limit`
    /// drops the oldest entries.
    pub fn from_entries(
        domain: MarketDomain,
        entries: impl IntoIterator<Item = HistoryEntry>,
        limit: usize,
    ) -> Self {
        let mut log = Self::new(domain, limit);
        for entry in entries {
            match log.position(&entry.session_id) {
                Some(index) => {
                    tracing::debug!(
                        domain = %domain,
                        session_id = %entry.session_id,
                        "Duplicate history entry in stored log"
                    );
                    if entry.data_version > log.entries[index].data_version {
                        log.entries[index] = entry;
                    }
                }
                None => log.entries.push_back(entry),
            }
        }
        log.evict_overflow();
        log
    }

    pub fn domain(&self) -> MarketDomain {
        self.domain
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, session_id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.session_id == session_id)
    }

    /// Entries oldest first.
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Entries newest first.
    pub fn recent(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().rev()
    }

    pub fn to_vec(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Appends the summary of a newly started session.
    ///
    /// A second append for the same session id is ignored, so overlapping
    /// code paths cannot duplicate an entry. Returns whether it was appended.
    pub fn append(&mut self, entry: HistoryEntry) -> bool {
        if self.position(&entry.session_id).is_some() {
            tracing::debug!(
                domain = %self.domain,
                session_id = %entry.session_id,
                "History entry already present"
            );
            return false;
        }
        self.entries.push_back(entry);
        self.evict_overflow();
        true
    }

    /// Upgrades a running summary to the full terminal snapshot.
    ///
    /// Full snapshots are never rewritten. If the running summary was already
    /// evicted, the snapshot is appended as a new entry.
    pub fn record_terminal(&mut self, entry: HistoryEntry) -> bool {
        match self.position(&entry.session_id) {
            Some(index) if self.entries[index].is_full_snapshot() => {
                tracing::debug!(
                    domain = %self.domain,
                    session_id = %entry.session_id,
                    "History entry already finalized"
                );
                false
            }
            Some(index) => {
                self.entries[index] = entry;
                true
            }
            None => {
                self.entries.push_back(entry);
                self.evict_overflow();
                true
            }
        }
    }

    /// Removes one entry (user dismiss). The live registry is not touched.
    pub fn dismiss(&mut self, session_id: &str) -> Option<HistoryEntry> {
        let index = self.position(session_id)?;
        self.entries.remove(index)
    }

    /// Removes every entry, returning how many were dropped.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    fn position(&self, session_id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.session_id == session_id)
    }

    fn evict_overflow(&mut self) {
        while self.entries.len() > self.limit {
            if let Some(evicted) = self.entries.pop_front() {
                tracing::debug!(
                    domain = %self.domain,
                    session_id = %evicted.session_id,
                    "Evicted oldest history entry"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::model::{FULL_DATA_VERSION, SUMMARY_DATA_VERSION};
    use crate::session::SessionStatus;
    use chrono::Utc;

    fn entry(id: &str, version: u32) -> HistoryEntry {
        HistoryEntry {
            session_id: id.to_string(),
            ticker: "KRW-BTC".to_string(),
            display_name: "Bitcoin".to_string(),
            market_domain: MarketDomain::Crypto,
            status: if version == FULL_DATA_VERSION {
                SessionStatus::Completed
            } else {
                SessionStatus::Running
            },
            timestamp: Utc::now(),
            completed_at: None,
            analysis_results: Vec::new(),
            trade_proposal: None,
            reasoning_summary: None,
            duration_secs: None,
            data_version: version,
        }
    }

    #[test]
    fn test_fifo_eviction_at_limit() {
        let mut log = HistoryLog::new(MarketDomain::Crypto, DEFAULT_HISTORY_LIMIT);
        for i in 0..25 {
            log.append(entry(&format!("s-{i}"), SUMMARY_DATA_VERSION));
        }
        assert_eq!(log.len(), 20);
        assert!(log.get("s-4").is_none());
        assert_eq!(log.entries().next().unwrap().session_id, "s-5");
        assert_eq!(log.recent().next().unwrap().session_id, "s-24");
    }

    #[test]
    fn test_duplicate_append_is_ignored() {
        let mut log = HistoryLog::new(MarketDomain::Crypto, 20);
        assert!(log.append(entry("a", SUMMARY_DATA_VERSION)));
        assert!(!log.append(entry("a", SUMMARY_DATA_VERSION)));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_terminal_upgrade_happens_once() {
        let mut log = HistoryLog::new(MarketDomain::Crypto, 20);
        log.append(entry("a", SUMMARY_DATA_VERSION));
        log.append(entry("b", SUMMARY_DATA_VERSION));

        let mut full = entry("a", FULL_DATA_VERSION);
        full.reasoning_summary = Some("first".to_string());
        assert!(log.record_terminal(full));

        let mut again = entry("a", FULL_DATA_VERSION);
        again.reasoning_summary = Some("second".to_string());
        assert!(!log.record_terminal(again));

        assert_eq!(log.len(), 2);
        assert_eq!(log.entries().next().unwrap().session_id, "a");
        assert_eq!(
            log.get("a").unwrap().reasoning_summary.as_deref(),
            Some("first")
        );
    }

    #[test]
    fn test_terminal_snapshot_of_evicted_entry_is_appended() {
        let mut log = HistoryLog::new(MarketDomain::Crypto, 2);
        log.append(entry("a", SUMMARY_DATA_VERSION));
        log.append(entry("b", SUMMARY_DATA_VERSION));
        log.append(entry("c", SUMMARY_DATA_VERSION));
        assert!(log.get("a").is_none());

        assert!(log.record_terminal(entry("a", FULL_DATA_VERSION)));
        assert_eq!(log.len(), 2);
        assert_eq!(log.recent().next().unwrap().session_id, "a");
    }

    #[test]
    fn test_dismiss_and_clear() {
        let mut log = HistoryLog::new(MarketDomain::Crypto, 20);
        log.append(entry("a", SUMMARY_DATA_VERSION));
        log.append(entry("b", SUMMARY_DATA_VERSION));

        assert_eq!(log.dismiss("a").unwrap().session_id, "a");
        assert!(log.dismiss("a").is_none());
        assert_eq!(log.clear(), 1);
        assert!(log.is_empty());
    }

    #[test]
    fn test_from_entries_dedupes_and_trims() {
        let stored = vec![
            entry("a", SUMMARY_DATA_VERSION),
            entry("b", SUMMARY_DATA_VERSION),
            entry("a", FULL_DATA_VERSION),
            entry("c", SUMMARY_DATA_VERSION),
        ];
        let log = HistoryLog::from_entries(MarketDomain::Crypto, stored, 2);
        assert_eq!(log.len(), 2);
        let ids: Vec<_> = log.entries().map(|e| e.session_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);

        let log = HistoryLog::from_entries(
            MarketDomain::Crypto,
            vec![entry("a", SUMMARY_DATA_VERSION), entry("a", FULL_DATA_VERSION)],
            20,
        );
        assert_eq!(log.len(), 1);
        assert!(log.get("a").unwrap().is_full_snapshot());
    }
}
