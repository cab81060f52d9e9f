//! Engine configuration model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::market::MarketDomain;
use crate::session::DEFAULT_MAX_CONCURRENT_SESSIONS;

/// Default number of reasoning lines folded into a history summary.
pub const DEFAULT_REASONING_SUMMARY_LINES: usize = 3;
/// Default size of the cross-domain recap panel.
pub const DEFAULT_RECAP_LIMIT: usize = 10;

/// Tunables of the session engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Per-domain ceiling; domains not listed use the default of 3
    pub max_concurrent_sessions: BTreeMap<MarketDomain, usize>,
    /// History entries kept per domain
    pub history_limit: usize,
    /// Reasoning log lines used when deriving a completion summary
    pub reasoning_summary_lines: usize,
    /// Entries shown by the recent-sessions recap
    pub recap_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_sessions: BTreeMap::new(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            reasoning_summary_lines: DEFAULT_REASONING_SUMMARY_LINES,
            recap_limit: DEFAULT_RECAP_LIMIT,
        }
    }
}

impl EngineConfig {
    /// Ceiling for one domain.
    pub fn max_concurrent_for(&self, domain: MarketDomain) -> usize {
        self.max_concurrent_sessions
            .get(&domain)
            .copied()
            .unwrap_or(DEFAULT_MAX_CONCURRENT_SESSIONS)
    }

    pub fn with_max_concurrent(mut self, domain: MarketDomain, limit: usize) -> Self {
        self.max_concurrent_sessions.insert(domain, limit);
        self
    }
}
