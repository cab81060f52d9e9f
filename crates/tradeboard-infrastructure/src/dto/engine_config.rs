//! EngineConfig DTOs and migrations
//!
//! Stored as TOML in the config directory:
//!
//! ```toml
//! version = "1.0.0"
//! history_limit = 20
//! reasoning_summary_lines = 3
//! recap_limit = 10
//!
//! [max_concurrent_sessions]
//! crypto = 5
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use version_migrate::{FromDomain, IntoDomain, Versioned};

use tradeboard_core::MarketDomain;
use tradeboard_core::config::{DEFAULT_REASONING_SUMMARY_LINES, DEFAULT_RECAP_LIMIT, EngineConfig};
use tradeboard_core::history::DEFAULT_HISTORY_LIMIT;

/// Engine configuration V1.0.0.
#[derive(Debug, Clone, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
pub struct EngineConfigV1_0_0 {
    /// Per-domain ceiling keyed by domain key
    #[serde(default)]
    pub max_concurrent_sessions: BTreeMap<String, usize>,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "default_reasoning_summary_lines")]
    pub reasoning_summary_lines: usize,
    #[serde(default = "default_recap_limit")]
    pub recap_limit: usize,
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_reasoning_summary_lines() -> usize {
    DEFAULT_REASONING_SUMMARY_LINES
}

fn default_recap_limit() -> usize {
    DEFAULT_RECAP_LIMIT
}

impl IntoDomain<EngineConfig> for EngineConfigV1_0_0 {
    fn into_domain(self) -> EngineConfig {
        let mut max_concurrent_sessions = BTreeMap::new();
        for (key, limit) in self.max_concurrent_sessions {
            match MarketDomain::from_key(&key) {
                Ok(domain) => {
                    max_concurrent_sessions.insert(domain, limit);
                }
                Err(e) => tracing::warn!(error = %e, "Ignoring ceiling for unknown domain"),
            }
        }

        EngineConfig {
            max_concurrent_sessions,
            history_limit: self.history_limit,
            reasoning_summary_lines: self.reasoning_summary_lines,
            recap_limit: self.recap_limit,
        }
    }
}

impl FromDomain<EngineConfig> for EngineConfigV1_0_0 {
    fn from_domain(config: EngineConfig) -> Self {
        EngineConfigV1_0_0 {
            max_concurrent_sessions: config
                .max_concurrent_sessions
                .into_iter()
                .map(|(domain, limit)| (domain.key().to_string(), limit))
                .collect(),
            history_limit: config.history_limit,
            reasoning_summary_lines: config.reasoning_summary_lines,
            recap_limit: config.recap_limit,
        }
    }
}

/// Creates and configures a Migrator instance for EngineConfig.
///
/// # Migration Path
///
/// - V1.0.0 → EngineConfig: Converts DTO to domain model
pub fn create_engine_config_migrator() -> version_migrate::Migrator {
    let mut migrator = version_migrate::Migrator::builder().build();

    let path = version_migrate::Migrator::define("engine_config")
        .from::<EngineConfigV1_0_0>()
        .into_with_save::<EngineConfig>();

    migrator
        .register(path)
        .expect("Failed to register engine_config migration path");

    migrator
}
