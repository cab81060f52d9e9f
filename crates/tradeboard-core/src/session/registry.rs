//! Per-domain session registry.
//!
//! The registry is the single owner of a domain's session records. Every
//! mutation path locates the record, applies the change, refreshes
//! `updated_at` and re-evaluates the approval gate before returning, so
//! callers never observe a half-applied update. The legacy projection is
//! derived from the active record whenever it is read.

use super::model::{AnalysisSummary, SessionRecord, SessionStatus};
use super::patch::SessionPatch;
use super::projection::LegacyProjection;
use super::proposal::TradeProposal;
use crate::error::{EngineError, Result};
use crate::market::MarketDomain;

/// Default per-domain ceiling on running/awaiting sessions.
pub const DEFAULT_MAX_CONCURRENT_SESSIONS: usize = 3;

/// What a successful mutation produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// The mutation completed the (awaiting approval, proposal) pair.
    pub approval_requested: bool,
}

/// Session records of one market domain plus the active pointer.
#[derive(Debug, Clone)]
pub struct DomainRegistry {
    domain: MarketDomain,
    /// Insertion ordered, unique by `session_id`
    sessions: Vec<SessionRecord>,
    active_session_id: Option<String>,
    max_concurrent_sessions: usize,
}

impl DomainRegistry {
    /// Creates an empty registry with the given concurrency ceiling.
    pub fn new(domain: MarketDomain, max_concurrent_sessions: usize) -> Self {
        Self {
            domain,
            sessions: Vec::new(),
            active_session_id: None,
            max_concurrent_sessions,
        }
    }

    // ============================================================================
    // Reads
    // ============================================================================

    pub fn domain(&self) -> MarketDomain {
        self.domain
    }

    pub fn max_concurrent_sessions(&self) -> usize {
        self.max_concurrent_sessions
    }

    pub fn sessions(&self) -> &[SessionRecord] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn get(&self, session_id: &str) -> Option<&SessionRecord> {
        self.sessions.iter().find(|s| s.session_id == session_id)
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.get(session_id).is_some()
    }

    pub fn active_session_id(&self) -> Option<&str> {
        self.active_session_id.as_deref()
    }

    pub fn active_session(&self) -> Option<&SessionRecord> {
        self.active_session_id
            .as_deref()
            .and_then(|id| self.get(id))
    }

    /// Flat mirror of the active session for single-session consumers.
    pub fn legacy_projection(&self) -> LegacyProjection {
        LegacyProjection::project(self.active_session())
    }

    /// Whether the session exists and has reached a terminal status.
    fn is_finished(&self, session_id: &str) -> bool {
        self.get(session_id)
            .is_some_and(|record| record.status.is_terminal())
    }

    /// Number of sessions counted against the ceiling.
    pub fn active_count(&self) -> usize {
        self.sessions
            .iter()
            .filter(|s| s.status.is_active())
            .count()
    }

    pub fn has_capacity(&self) -> bool {
        self.active_count() < self.max_concurrent_sessions
    }

    // ============================================================================
    // Admission
    // ============================================================================

    /// Admits a new running session and makes it the active one.
    ///
    /// # Errors
    ///
    /// - `DuplicateSession` if the id is already registered
    /// - `CapacityReached` if the domain already runs its maximum number of
    ///   sessions; terminal sessions do not count
    ///
    /// On error the registry is unchanged.
    pub fn create_session(
        &mut self,
        session_id: impl Into<String>,
        ticker: impl Into<String>,
        display_name: Option<String>,
    ) -> Result<&SessionRecord> {
        let session_id = session_id.into();

        if self.contains(&session_id) {
            return Err(EngineError::DuplicateSession {
                domain: self.domain,
                session_id,
            });
        }
        if !self.has_capacity() {
            return Err(EngineError::CapacityReached {
                domain: self.domain,
                limit: self.max_concurrent_sessions,
            });
        }

        let record = SessionRecord::new(session_id.clone(), ticker.into(), display_name, self.domain);
        self.sessions.push(record);
        self.active_session_id = Some(session_id);

        tracing::info!(
            domain = %self.domain,
            session_id = ?self.active_session_id,
            active = self.active_count(),
            limit = self.max_concurrent_sessions,
            "Session admitted"
        );

        Ok(&self.sessions[self.sessions.len() - 1])
    }

    // ============================================================================
    // Lifecycle updates
    // ============================================================================

    /// Applies a partial update.
    ///
    /// Returns `Ok(None)` when the session is unknown: backend events may
    /// outlive local removal, so this is not an error.
    ///
    /// # Errors
    ///
    /// `CapacityReached` if the patch would move an inactive session back into
    /// an active status while the domain is at its ceiling. The record is left
    /// as it was.
    pub fn apply(&mut self, session_id: &str, patch: SessionPatch) -> Result<Option<UpdateOutcome>> {
        self.mutate(session_id, |record| patch.apply_to(record))
    }

    /// Appends one line to the reasoning log.
    pub fn append_reasoning(
        &mut self,
        session_id: &str,
        entry: impl Into<String>,
    ) -> Option<UpdateOutcome> {
        let entry = entry.into();
        // Append-only updates never change status, so they cannot hit the ceiling.
        self.mutate(session_id, |record| record.reasoning_log.push(entry))
            .ok()
            .flatten()
    }

    /// Appends analysis summaries in order.
    pub fn append_analyses(
        &mut self,
        session_id: &str,
        analyses: Vec<AnalysisSummary>,
    ) -> Option<UpdateOutcome> {
        self.mutate(session_id, |record| record.analyses.extend(analyses))
            .ok()
            .flatten()
    }

    /// Sets or clears the trade proposal.
    ///
    /// The approval dialog is requested only if, after this update, the record
    /// is awaiting approval and holds a proposal. A finished session ignores
    /// late proposals and yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// `DomainMismatch` if the proposal belongs to another market domain; the
    /// record keeps its previous proposal.
    pub fn set_trade_proposal(
        &mut self,
        session_id: &str,
        proposal: Option<TradeProposal>,
    ) -> Result<Option<UpdateOutcome>> {
        if self.is_finished(session_id) {
            tracing::debug!(domain = %self.domain, session_id, "Ignoring proposal for finished session");
            return Ok(None);
        }
        if let Some(ref p) = proposal {
            let actual = p.market_domain();
            if actual != self.domain {
                tracing::warn!(
                    domain = %self.domain,
                    %actual,
                    session_id,
                    "Rejected trade proposal for another market domain"
                );
                return Err(EngineError::DomainMismatch {
                    expected: self.domain,
                    actual,
                });
            }
        }
        self.mutate(session_id, |record| record.trade_proposal = proposal)
    }

    /// Sets the awaiting-approval flag, arriving independently of the proposal.
    ///
    /// Ignored once the session is finished.
    pub fn set_awaiting_approval(&mut self, session_id: &str, awaiting: bool) -> Option<UpdateOutcome> {
        if self.is_finished(session_id) {
            tracing::debug!(
                domain = %self.domain,
                session_id,
                awaiting,
                "Ignoring approval flag for finished session"
            );
            return None;
        }
        // Only toggles between running and awaiting_approval, both active.
        self.apply(session_id, SessionPatch::new().awaiting_approval(awaiting))
            .ok()
            .flatten()
    }

    /// Moves a non-terminal session into a terminal status.
    ///
    /// Completion keeps the record in the registry so it stays visible until
    /// explicitly dismissed. Returns the updated record, or `None` if the
    /// session is unknown or already terminal.
    pub fn finish_session(
        &mut self,
        session_id: &str,
        status: SessionStatus,
        error: Option<String>,
    ) -> Option<&SessionRecord> {
        debug_assert!(status.is_terminal());

        match self.get(session_id) {
            None => {
                tracing::debug!(domain = %self.domain, session_id, "Ignoring finish for unknown session");
                return None;
            }
            Some(record) if record.status.is_terminal() => {
                tracing::debug!(
                    domain = %self.domain,
                    session_id,
                    status = %record.status,
                    "Session already finished"
                );
                return None;
            }
            Some(_) => {}
        }

        let outcome = self
            .mutate(session_id, |record| {
                record.set_status(status);
                record.awaiting_approval = false;
                if status == SessionStatus::Error {
                    record.error = error;
                }
            })
            .ok()
            .flatten();

        outcome.and_then(|_| self.get(session_id))
    }

    // ============================================================================
    // Active pointer & removal
    // ============================================================================

    /// Points the legacy projection at another registered session.
    pub fn set_active_session(&mut self, session_id: &str) -> bool {
        if !self.contains(session_id) {
            tracing::debug!(domain = %self.domain, session_id, "Cannot activate unknown session");
            return false;
        }
        self.active_session_id = Some(session_id.to_string());
        true
    }

    /// Removes a session. History is not touched.
    ///
    /// When the removed session was active, the oldest remaining non-terminal
    /// session becomes active, else the first remaining session, else none
    /// (and the projection returns to its idle defaults).
    pub fn remove_session(&mut self, session_id: &str) -> Option<SessionRecord> {
        let index = self.position(session_id)?;
        let removed = self.sessions.remove(index);

        if self.active_session_id.as_deref() == Some(session_id) {
            self.active_session_id = self
                .sessions
                .iter()
                .find(|s| !s.status.is_terminal())
                .or_else(|| self.sessions.first())
                .map(|s| s.session_id.clone());
        }

        tracing::info!(
            domain = %self.domain,
            session_id,
            new_active = ?self.active_session_id,
            "Session removed"
        );
        Some(removed)
    }

    /// Removes every session, leaving the projection idle.
    pub fn clear(&mut self) -> Vec<SessionRecord> {
        self.active_session_id = None;
        std::mem::take(&mut self.sessions)
    }

    // ============================================================================
    // Internals
    // ============================================================================

    fn position(&self, session_id: &str) -> Option<usize> {
        self.sessions.iter().position(|s| s.session_id == session_id)
    }

    /// The one write path for existing records.
    fn mutate<F>(&mut self, session_id: &str, f: F) -> Result<Option<UpdateOutcome>>
    where
        F: FnOnce(&mut SessionRecord),
    {
        let Some(index) = self.position(session_id) else {
            tracing::debug!(domain = %self.domain, session_id, "Ignoring update for unknown session");
            return Ok(None);
        };

        let active_before = self.active_count();
        let record = &mut self.sessions[index];
        let was_active = record.status.is_active();
        let previous = record.clone();

        f(record);

        if !was_active && record.status.is_active() && active_before >= self.max_concurrent_sessions {
            *record = previous;
            return Err(EngineError::CapacityReached {
                domain: self.domain,
                limit: self.max_concurrent_sessions,
            });
        }

        record.touch();
        let approval_requested = record.evaluate_approval_gate();

        Ok(Some(UpdateOutcome { approval_requested }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::projection::LegacyStatus;
    use crate::session::proposal::{CryptoProposal, EquityProposal, TradeAction};

    fn crypto() -> DomainRegistry {
        DomainRegistry::new(MarketDomain::Crypto, 3)
    }

    fn btc_proposal() -> TradeProposal {
        TradeProposal::Crypto(CryptoProposal::new("KRW-BTC", TradeAction::Buy))
    }

    #[test]
    fn test_create_sets_active_and_projection() {
        let mut reg = crypto();
        let record = reg.create_session("a", "KRW-BTC", Some("Bitcoin".to_string())).unwrap();
        assert_eq!(record.status, SessionStatus::Running);
        assert_eq!(reg.active_session_id(), Some("a"));
        assert_eq!(reg.legacy_projection().session_id.as_deref(), Some("a"));
        assert_eq!(reg.legacy_projection().display_name.as_deref(), Some("Bitcoin"));
    }

    #[test]
    fn test_duplicate_id_is_rejected_without_change() {
        let mut reg = crypto();
        reg.create_session("a", "KRW-BTC", None).unwrap();
        let err = reg.create_session("a", "KRW-ETH", None).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateSession { .. }));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get("a").unwrap().ticker, "KRW-BTC");
    }

    #[test]
    fn test_ceiling_blocks_fourth_session_until_one_finishes() {
        let mut reg = crypto();
        reg.create_session("a", "KRW-BTC", None).unwrap();
        reg.create_session("b", "KRW-ETH", None).unwrap();
        reg.create_session("c", "KRW-XRP", None).unwrap();

        let err = reg.create_session("d", "KRW-SOL", None).unwrap_err();
        assert_eq!(
            err,
            EngineError::CapacityReached {
                domain: MarketDomain::Crypto,
                limit: 3
            }
        );
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.active_session_id(), Some("c"));

        reg.finish_session("a", SessionStatus::Completed, None).unwrap();
        reg.create_session("d", "KRW-SOL", None).unwrap();
        assert_eq!(reg.len(), 4);
        assert_eq!(reg.active_count(), 3);
    }

    #[test]
    fn test_orphan_update_is_noop() {
        let mut reg = crypto();
        assert_eq!(reg.apply("ghost", SessionPatch::new().stage("x")).unwrap(), None);
        assert_eq!(reg.append_reasoning("ghost", "late event"), None);
        assert!(reg.is_empty());
        assert!(reg.legacy_projection().is_idle());
    }

    #[test]
    fn test_update_of_active_session_mirrors_into_projection() {
        let mut reg = crypto();
        reg.create_session("a", "KRW-BTC", None).unwrap();
        reg.apply("a", SessionPatch::new().stage("sentiment")).unwrap();
        reg.append_reasoning("a", "funding rate turned positive");

        let projection = reg.legacy_projection();
        assert_eq!(projection.current_stage.as_deref(), Some("sentiment"));
        assert_eq!(projection.reasoning_log, vec!["funding rate turned positive".to_string()]);
    }

    #[test]
    fn test_update_of_inactive_pointer_session_leaves_projection() {
        let mut reg = crypto();
        reg.create_session("a", "KRW-BTC", None).unwrap();
        reg.create_session("b", "KRW-ETH", None).unwrap();
        reg.apply("a", SessionPatch::new().stage("news")).unwrap();
        assert_eq!(reg.legacy_projection().session_id.as_deref(), Some("b"));
        assert!(reg.legacy_projection().current_stage.is_none());
    }

    #[test]
    fn test_updated_at_refreshes() {
        let mut reg = crypto();
        let created = reg.create_session("a", "KRW-BTC", None).unwrap().updated_at;
        std::thread::sleep(std::time::Duration::from_millis(5));
        reg.append_reasoning("a", "step");

        let record = reg.get("a").unwrap();
        assert!(record.updated_at > created);
        assert_eq!(record.created_at, created);
    }

    #[test]
    fn test_proposal_then_awaiting_fires_once() {
        let mut reg = crypto();
        reg.create_session("s", "KRW-BTC", None).unwrap();

        let outcome = reg.set_trade_proposal("s", Some(btc_proposal())).unwrap().unwrap();
        assert!(!outcome.approval_requested);

        let outcome = reg.set_awaiting_approval("s", true).unwrap();
        assert!(outcome.approval_requested);

        // Repeating either half does not fire again.
        assert!(!reg.set_awaiting_approval("s", true).unwrap().approval_requested);
        assert!(
            !reg.set_trade_proposal("s", Some(btc_proposal()))
                .unwrap()
                .unwrap()
                .approval_requested
        );
    }

    #[test]
    fn test_awaiting_then_proposal_fires_once() {
        let mut reg = crypto();
        reg.create_session("s", "KRW-BTC", None).unwrap();

        assert!(!reg.set_awaiting_approval("s", true).unwrap().approval_requested);
        assert_eq!(reg.get("s").unwrap().status, SessionStatus::AwaitingApproval);

        let outcome = reg.set_trade_proposal("s", Some(btc_proposal())).unwrap().unwrap();
        assert!(outcome.approval_requested);
    }

    #[test]
    fn test_unrelated_updates_do_not_fire_gate() {
        let mut reg = crypto();
        reg.create_session("s", "KRW-BTC", None).unwrap();
        reg.set_trade_proposal("s", Some(btc_proposal())).unwrap();
        assert!(!reg.append_reasoning("s", "still thinking").unwrap().approval_requested);
        assert!(
            !reg.apply("s", SessionPatch::new().stage("risk"))
                .unwrap()
                .unwrap()
                .approval_requested
        );
    }

    #[test]
    fn test_cross_domain_proposal_is_rejected() {
        let mut reg = crypto();
        reg.create_session("s", "KRW-BTC", None).unwrap();
        reg.set_trade_proposal("s", Some(btc_proposal())).unwrap();

        let equity = TradeProposal::GlobalEquity(EquityProposal::new("AAPL", TradeAction::Buy, 5));
        let err = reg.set_trade_proposal("s", Some(equity)).unwrap_err();
        assert_eq!(
            err,
            EngineError::DomainMismatch {
                expected: MarketDomain::Crypto,
                actual: MarketDomain::GlobalEquity
            }
        );
        assert_eq!(reg.get("s").unwrap().trade_proposal, Some(btc_proposal()));
    }

    #[test]
    fn test_finish_is_terminal_once() {
        let mut reg = crypto();
        reg.create_session("s", "KRW-BTC", None).unwrap();
        reg.set_awaiting_approval("s", true);

        let record = reg.finish_session("s", SessionStatus::Completed, None).unwrap();
        assert_eq!(record.status, SessionStatus::Completed);
        assert!(!record.awaiting_approval);
        assert!(reg.finish_session("s", SessionStatus::Cancelled, None).is_none());
        assert_eq!(reg.get("s").unwrap().status, SessionStatus::Completed);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_late_approval_events_after_finish_are_ignored() {
        let mut reg = crypto();
        reg.create_session("s", "KRW-BTC", None).unwrap();
        reg.set_trade_proposal("s", Some(btc_proposal())).unwrap();
        assert!(reg.set_awaiting_approval("s", true).unwrap().approval_requested);
        reg.finish_session("s", SessionStatus::Completed, None).unwrap();

        assert_eq!(reg.set_awaiting_approval("s", true), None);
        assert_eq!(reg.set_trade_proposal("s", Some(btc_proposal())).unwrap(), None);

        let record = reg.get("s").unwrap();
        assert_eq!(record.status, SessionStatus::Completed);
        assert!(!record.awaiting_approval);
        assert!(!reg.legacy_projection().awaiting_approval);
        assert_eq!(reg.legacy_projection().status, LegacyStatus::Completed);

        // A generic patch cannot set the flag on a finished record either.
        let outcome = reg
            .apply("s", SessionPatch::new().awaiting_approval(true))
            .unwrap()
            .unwrap();
        assert!(!outcome.approval_requested);
        assert!(!reg.get("s").unwrap().awaiting_approval);
    }

    #[test]
    fn test_finish_with_error_keeps_message() {
        let mut reg = crypto();
        reg.create_session("s", "KRW-BTC", None).unwrap();
        let record = reg
            .finish_session("s", SessionStatus::Error, Some("rate limited".to_string()))
            .unwrap();
        assert_eq!(record.error.as_deref(), Some("rate limited"));
        assert_eq!(reg.legacy_projection().status, LegacyStatus::Error);
    }

    #[test]
    fn test_reviving_finished_session_respects_ceiling() {
        let mut reg = crypto();
        reg.create_session("a", "KRW-BTC", None).unwrap();
        reg.finish_session("a", SessionStatus::Cancelled, None);
        reg.create_session("b", "KRW-ETH", None).unwrap();
        reg.create_session("c", "KRW-XRP", None).unwrap();
        reg.create_session("d", "KRW-SOL", None).unwrap();

        let err = reg
            .apply("a", SessionPatch::new().status(SessionStatus::Running))
            .unwrap_err();
        assert!(matches!(err, EngineError::CapacityReached { .. }));
        assert_eq!(reg.get("a").unwrap().status, SessionStatus::Cancelled);
        assert!(reg.active_count() <= reg.max_concurrent_sessions());
    }

    #[test]
    fn test_remove_active_picks_oldest_non_terminal() {
        let mut reg = crypto();
        reg.create_session("a", "KRW-BTC", None).unwrap();
        reg.create_session("b", "KRW-ETH", None).unwrap();
        reg.create_session("c", "KRW-XRP", None).unwrap();
        reg.finish_session("a", SessionStatus::Completed, None);

        let removed = reg.remove_session("c").unwrap();
        assert_eq!(removed.session_id, "c");
        assert_eq!(reg.active_session_id(), Some("b"));
        assert_eq!(reg.legacy_projection().session_id.as_deref(), Some("b"));
    }

    #[test]
    fn test_remove_active_falls_back_to_first_terminal_record() {
        let mut reg = crypto();
        reg.create_session("a", "KRW-BTC", None).unwrap();
        reg.create_session("b", "KRW-ETH", None).unwrap();
        reg.create_session("c", "KRW-XRP", None).unwrap();
        reg.finish_session("a", SessionStatus::Completed, None);
        reg.finish_session("b", SessionStatus::Cancelled, None);
        reg.finish_session("c", SessionStatus::Completed, None);
        assert_eq!(reg.active_session_id(), Some("c"));

        reg.remove_session("c").unwrap();
        assert_eq!(reg.active_session_id(), Some("a"));
        let projection = reg.legacy_projection();
        assert_eq!(projection.session_id.as_deref(), Some("a"));
        assert_eq!(projection.status, LegacyStatus::Completed);
    }

    #[test]
    fn test_remove_non_active_keeps_pointer() {
        let mut reg = crypto();
        reg.create_session("a", "KRW-BTC", None).unwrap();
        reg.create_session("b", "KRW-ETH", None).unwrap();
        reg.remove_session("a");
        assert_eq!(reg.active_session_id(), Some("b"));
    }

    #[test]
    fn test_remove_last_resets_projection() {
        let mut reg = crypto();
        reg.create_session("a", "KRW-BTC", None).unwrap();
        reg.append_reasoning("a", "thinking");
        reg.remove_session("a").unwrap();

        assert!(reg.active_session_id().is_none());
        assert_eq!(reg.legacy_projection(), LegacyProjection::default());
        assert_eq!(reg.legacy_projection().status, LegacyStatus::Idle);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut reg = crypto();
        reg.create_session("a", "KRW-BTC", None).unwrap();
        assert!(reg.remove_session("zzz").is_none());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_set_active_session() {
        let mut reg = crypto();
        reg.create_session("a", "KRW-BTC", None).unwrap();
        reg.create_session("b", "KRW-ETH", None).unwrap();
        assert!(reg.set_active_session("a"));
        assert_eq!(reg.legacy_projection().ticker.as_deref(), Some("KRW-BTC"));
        assert!(!reg.set_active_session("nope"));
        assert_eq!(reg.active_session_id(), Some("a"));
    }

    #[test]
    fn test_clear() {
        let mut reg = crypto();
        reg.create_session("a", "KRW-BTC", None).unwrap();
        let removed = reg.clear();
        assert_eq!(removed.len(), 1);
        assert!(reg.is_empty());
        assert!(reg.legacy_projection().is_idle());
    }
}
