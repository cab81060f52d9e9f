//! Cross-domain read models.
//!
//! Pure derivations over the registries and history logs for the unified
//! operator dashboard and the recap panel. Nothing here owns state.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tradeboard_core::MarketDomain;
use tradeboard_core::history::{HistoryEntry, HistoryLog};
use tradeboard_core::session::{DomainRegistry, SessionRecord, SessionStatus, TradeProposal};

/// One row of the recap panel, from a live record or a history entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentSession {
    pub market_domain: MarketDomain,
    pub session_id: String,
    pub ticker: String,
    pub display_name: String,
    pub status: SessionStatus,
    /// Recency key: last update of a live record, completion of a history entry
    pub updated_at: DateTime<Utc>,
    pub trade_proposal: Option<TradeProposal>,
    /// Whether the row comes from a record still in its registry
    pub live: bool,
}

impl RecentSession {
    fn from_record(record: &SessionRecord) -> Self {
        Self {
            market_domain: record.market_domain,
            session_id: record.session_id.clone(),
            ticker: record.ticker.clone(),
            display_name: record.display_name.clone(),
            status: record.status,
            updated_at: record.updated_at,
            trade_proposal: record.trade_proposal.clone(),
            live: true,
        }
    }

    fn from_entry(entry: &HistoryEntry) -> Self {
        Self {
            market_domain: entry.market_domain,
            session_id: entry.session_id.clone(),
            ticker: entry.ticker.clone(),
            display_name: entry.display_name.clone(),
            status: entry.status,
            updated_at: entry.completed_at.unwrap_or(entry.timestamp),
            trade_proposal: entry.trade_proposal.clone(),
            live: false,
        }
    }
}

/// Every running or awaiting session across domains, oldest first.
pub fn active_sessions<'a>(
    registries: impl IntoIterator<Item = &'a DomainRegistry>,
) -> Vec<&'a SessionRecord> {
    let mut active: Vec<&SessionRecord> = registries
        .into_iter()
        .flat_map(|registry| registry.sessions())
        .filter(|record| record.status.is_active())
        .collect();
    active.sort_by_key(|record| record.created_at);
    active
}

/// The `limit` most recent completed, awaiting or cancelled sessions.
///
/// Live records take precedence over history entries of the same session,
/// so a session appears at most once.
pub fn recent_sessions<'a>(
    registries: impl IntoIterator<Item = &'a DomainRegistry>,
    histories: impl IntoIterator<Item = &'a HistoryLog>,
    limit: usize,
) -> Vec<RecentSession> {
    let mut seen: HashSet<(MarketDomain, &str)> = HashSet::new();
    let mut recent = Vec::new();

    for registry in registries {
        for record in registry.sessions() {
            seen.insert((record.market_domain, record.session_id.as_str()));
            if matches!(
                record.status,
                SessionStatus::Completed | SessionStatus::AwaitingApproval | SessionStatus::Cancelled
            ) {
                recent.push(RecentSession::from_record(record));
            }
        }
    }

    for log in histories {
        for entry in log.recent() {
            if !matches!(entry.status, SessionStatus::Completed | SessionStatus::Cancelled) {
                continue;
            }
            if seen.insert((entry.market_domain, entry.session_id.as_str())) {
                recent.push(RecentSession::from_entry(entry));
            }
        }
    }

    recent.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    recent.truncate(limit);
    recent
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tradeboard_core::history::HistoryEntry;

    fn registry_with(domain: MarketDomain, ids: &[&str]) -> DomainRegistry {
        let mut registry = DomainRegistry::new(domain, 10);
        for id in ids {
            registry.create_session(*id, "T", None).unwrap();
        }
        registry
    }

    #[test]
    fn test_active_sessions_span_domains_and_skip_terminal() {
        let mut crypto = registry_with(MarketDomain::Crypto, &["c1", "c2"]);
        let equity = registry_with(MarketDomain::GlobalEquity, &["g1"]);
        crypto.finish_session("c1", SessionStatus::Completed, None);

        let active = active_sessions([&crypto, &equity]);
        let ids: Vec<_> = active.iter().map(|r| r.session_id.as_str()).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&"c2"));
        assert!(ids.contains(&"g1"));
        assert!(active[0].created_at <= active[1].created_at);
    }

    #[test]
    fn test_recent_sessions_merge_live_and_history() {
        let mut crypto = registry_with(MarketDomain::Crypto, &["live-done", "running"]);
        crypto.finish_session("live-done", SessionStatus::Completed, None);

        let mut log = HistoryLog::new(MarketDomain::Crypto, 20);
        // Live record and its own history entry: only the live row is kept.
        let live_entry =
            HistoryEntry::finished(crypto.get("live-done").unwrap(), None, 3);
        log.append(live_entry);

        // A session removed from the registry, known only through history.
        let mut scratch = registry_with(MarketDomain::Crypto, &["gone"]);
        scratch.finish_session("gone", SessionStatus::Cancelled, None);
        let mut gone = HistoryEntry::finished(scratch.get("gone").unwrap(), None, 3);
        gone.completed_at = Some(Utc::now() - Duration::hours(1));
        log.append(gone);

        // Errored sessions are not part of the recap.
        scratch.create_session("failed", "T", None).unwrap();
        scratch.finish_session("failed", SessionStatus::Error, Some("x".to_string()));
        log.append(HistoryEntry::finished(scratch.get("failed").unwrap(), None, 3));

        let recent = recent_sessions([&crypto], [&log], 10);
        let ids: Vec<_> = recent.iter().map(|r| r.session_id.as_str()).collect();
        assert_eq!(ids, vec!["live-done", "gone"]);
        assert!(recent[0].live);
        assert!(!recent[1].live);
    }

    #[test]
    fn test_recent_sessions_respects_limit() {
        let mut equity = registry_with(MarketDomain::GlobalEquity, &["a", "b", "c"]);
        for id in ["a", "b", "c"] {
            equity.finish_session(id, SessionStatus::Completed, None);
        }
        let recent = recent_sessions([&equity], std::iter::empty::<&HistoryLog>(), 2);
        assert_eq!(recent.len(), 2);
        assert!(recent[0].updated_at >= recent[1].updated_at);
    }
}
