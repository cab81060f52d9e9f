//! Partial updates for session records.

use serde::{Deserialize, Serialize};

use super::model::{PositionSnapshot, SessionRecord, SessionStatus};

/// A partial lifecycle update.
///
/// `None` leaves a field untouched. Nullable fields use a nested `Option` so
/// a patch can clear them (`Some(None)`). Append-only fields and the trade
/// proposal are deliberately absent: they have their own registry operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SessionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_stage: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub awaiting_approval: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_position: Option<Option<PositionSnapshot>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Option<String>>,
}

impl SessionPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: SessionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn stage(mut self, stage: impl Into<String>) -> Self {
        self.current_stage = Some(Some(stage.into()));
        self
    }

    pub fn clear_stage(mut self) -> Self {
        self.current_stage = Some(None);
        self
    }

    pub fn awaiting_approval(mut self, awaiting: bool) -> Self {
        self.awaiting_approval = Some(awaiting);
        self
    }

    pub fn position(mut self, position: Option<PositionSnapshot>) -> Self {
        self.active_position = Some(position);
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(Some(message.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Applies the patch to a record.
    ///
    /// An error message forces `status = Error`; any other explicit status
    /// clears the message. While the record is not terminal, the awaiting
    /// flag drives the running/awaiting status pair unless the patch names a
    /// status itself. A record left terminal has its awaiting flag cleared.
    pub(crate) fn apply_to(self, record: &mut SessionRecord) {
        if let Some(stage) = self.current_stage {
            record.current_stage = stage;
        }
        if let Some(position) = self.active_position {
            record.active_position = position;
        }
        if let Some(awaiting) = self.awaiting_approval {
            record.awaiting_approval = awaiting;
            if self.status.is_none() && !record.status.is_terminal() {
                if awaiting && record.status == SessionStatus::Running {
                    record.set_status(SessionStatus::AwaitingApproval);
                } else if !awaiting && record.status == SessionStatus::AwaitingApproval {
                    record.set_status(SessionStatus::Running);
                }
            }
        }
        if let Some(status) = self.status {
            record.set_status(status);
        }
        match self.error {
            Some(Some(message)) => {
                record.status = SessionStatus::Error;
                record.error = Some(message);
            }
            // Clearing the message of an errored session keeps the status.
            Some(None) => record.error = None,
            None => {}
        }
        // A finished session never waits for approval.
        if record.status.is_terminal() {
            record.awaiting_approval = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MarketDomain;

    fn record() -> SessionRecord {
        SessionRecord::new(
            "s-1".to_string(),
            "AAPL".to_string(),
            Some("Apple".to_string()),
            MarketDomain::GlobalEquity,
        )
    }

    #[test]
    fn test_empty_patch_changes_nothing() {
        let mut r = record();
        let before = r.clone();
        assert!(SessionPatch::new().is_empty());
        SessionPatch::new().apply_to(&mut r);
        assert_eq!(r, before);
    }

    #[test]
    fn test_stage_set_and_clear() {
        let mut r = record();
        SessionPatch::new().stage("technical analysis").apply_to(&mut r);
        assert_eq!(r.current_stage.as_deref(), Some("technical analysis"));
        SessionPatch::new().clear_stage().apply_to(&mut r);
        assert!(r.current_stage.is_none());
    }

    #[test]
    fn test_error_forces_error_status() {
        let mut r = record();
        SessionPatch::new().error("backend unavailable").apply_to(&mut r);
        assert_eq!(r.status, SessionStatus::Error);
        assert_eq!(r.error.as_deref(), Some("backend unavailable"));
    }

    #[test]
    fn test_awaiting_flag_drives_status() {
        let mut r = record();
        SessionPatch::new().awaiting_approval(true).apply_to(&mut r);
        assert_eq!(r.status, SessionStatus::AwaitingApproval);
        SessionPatch::new().awaiting_approval(false).apply_to(&mut r);
        assert_eq!(r.status, SessionStatus::Running);
    }

    #[test]
    fn test_awaiting_flag_does_not_revive_terminal_session() {
        let mut r = record();
        r.set_status(SessionStatus::Completed);
        SessionPatch::new().awaiting_approval(true).apply_to(&mut r);
        assert!(!r.awaiting_approval);
        assert_eq!(r.status, SessionStatus::Completed);
    }

    #[test]
    fn test_terminal_status_clears_awaiting_flag() {
        let mut r = record();
        SessionPatch::new().awaiting_approval(true).apply_to(&mut r);
        assert!(r.awaiting_approval);
        SessionPatch::new()
            .status(SessionStatus::Cancelled)
            .apply_to(&mut r);
        assert!(!r.awaiting_approval);
        assert_eq!(r.status, SessionStatus::Cancelled);
    }
}
