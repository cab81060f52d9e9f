//! Dashboard service: the session engine bound to its persistence port.

use std::sync::Arc;

use tradeboard_core::{DashboardRepository, EngineConfig, Language, MarketDomain, Result};

use crate::engine::SessionEngine;

/// Couples a [`SessionEngine`] with a [`DashboardRepository`].
///
/// The engine stays synchronous; this service adds the async load on
/// startup and the flush of history and preferences afterwards.
pub struct DashboardService {
    engine: SessionEngine,
    repository: Arc<dyn DashboardRepository>,
}

impl DashboardService {
    pub fn new(engine: SessionEngine, repository: Arc<dyn DashboardRepository>) -> Self {
        Self { engine, repository }
    }

    /// Builds a fresh engine and loads the stored history into it.
    ///
    /// A failing load never blocks startup: the engine starts empty and the
    /// error is logged.
    pub async fn restore(config: EngineConfig, repository: Arc<dyn DashboardRepository>) -> Self {
        let mut engine = SessionEngine::new(config);
        match repository.load().await {
            Ok(stored) => engine.restore(stored),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load dashboard state, starting empty");
            }
        }
        Self::new(engine, repository)
    }

    pub fn engine(&self) -> &SessionEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut SessionEngine {
        &mut self.engine
    }

    /// Saves history logs and preferences. Live sessions are not persisted.
    pub async fn flush(&self) -> Result<()> {
        let snapshot = self.engine.snapshot();
        self.repository.save(&snapshot).await?;
        tracing::info!(
            entries = snapshot.history.values().map(Vec::len).sum::<usize>(),
            "Flushed dashboard state"
        );
        Ok(())
    }

    // ============================================================================
    // Preferences
    // ============================================================================

    pub async fn set_language(&mut self, language: Language) -> Result<()> {
        let mut preferences = self.engine.preferences().clone();
        preferences.language = language;
        self.engine.set_preferences(preferences);
        self.flush().await
    }

    pub async fn set_compact_layout(&mut self, compact: bool) -> Result<()> {
        let mut preferences = self.engine.preferences().clone();
        preferences.compact_layout = compact;
        self.engine.set_preferences(preferences);
        self.flush().await
    }

    pub async fn set_show_reasoning_panel(&mut self, show: bool) -> Result<()> {
        let mut preferences = self.engine.preferences().clone();
        preferences.show_reasoning_panel = show;
        self.engine.set_preferences(preferences);
        self.flush().await
    }

    // ============================================================================
    // History maintenance
    // ============================================================================

    /// Clears one domain's history and persists the result.
    pub async fn clear_history(&mut self, domain: MarketDomain) -> Result<usize> {
        let removed = self.engine.clear_history(domain);
        self.flush().await?;
        Ok(removed)
    }

    /// Dismisses one history entry and persists the result.
    pub async fn dismiss_history_entry(&mut self, domain: MarketDomain, session_id: &str) -> Result<bool> {
        let dismissed = self.engine.dismiss_history_entry(domain, session_id);
        if dismissed {
            self.flush().await?;
        }
        Ok(dismissed)
    }
}
