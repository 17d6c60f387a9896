//! Application state management

use crate::clock::{Clock, SystemClock};
use crate::config::PipelineSettings;
use crate::error::Result;
use crate::store::{sample_deals, DealStore};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

/// Application state shared across all commands
pub struct AppState {
    /// Authoritative deal collection
    pub store: Arc<DealStore>,

    /// Runtime settings
    pub settings: RwLock<PipelineSettings>,

    /// Time source for stage history and metrics
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Create new application state on the wall clock
    pub fn new(settings: PipelineSettings) -> Result<Self> {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    /// Create new application state on a caller-supplied clock
    pub fn with_clock(settings: PipelineSettings, clock: Arc<dyn Clock>) -> Result<Self> {
        settings.validate()?;

        tracing::info!(
            "Pipeline state initialized (strict_not_found={}, backfill_stage_durations={})",
            settings.strict_not_found,
            settings.backfill_stage_durations
        );

        Ok(Self {
            store: Arc::new(DealStore::new()),
            settings: RwLock::new(settings),
            clock,
        })
    }

    /// Create a state on a manual clock for testing
    #[cfg(test)]
    pub fn new_for_testing(
        settings: PipelineSettings,
        start: DateTime<Utc>,
    ) -> (Self, Arc<crate::clock::ManualClock>) {
        let clock = Arc::new(crate::clock::ManualClock::new(start));
        let state = Self::with_clock(settings, clock.clone()).unwrap();
        (state, clock)
    }

    /// State preloaded with the sample portfolio
    pub fn with_sample_data(settings: PipelineSettings) -> Result<Self> {
        let state = Self::new(settings)?;
        let loaded = state.store.load(sample_deals(state.now()))?;
        tracing::info!("Loaded {} sample deals into store", loaded);
        Ok(state)
    }

    /// Current instant according to the state's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Get a copy of the current settings
    pub fn get_settings(&self) -> PipelineSettings {
        self.settings.read().clone()
    }

    /// Replace settings
    pub fn set_settings(&self, settings: PipelineSettings) {
        *self.settings.write() = settings;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_sample_data() {
        let state = AppState::with_sample_data(PipelineSettings::default()).unwrap();

        let deals = state.store.list();
        assert_eq!(deals.len(), 6);
        assert!(deals.iter().all(|d| d.history_is_consistent()));
        assert!(deals.iter().all(|d| d.potential_profit >= 0.0));
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = PipelineSettings {
            duplicate_suffix: "  ".to_string(),
            ..Default::default()
        };
        assert!(AppState::new(settings).is_err());
    }
}
