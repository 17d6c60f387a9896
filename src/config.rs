//! Pipeline settings
//!
//! Loaded from a JSON file (path in `DEALFLOW_CONFIG`) or built from
//! defaults. Missing keys fall back to their defaults.

use crate::error::{AppError, Result};
use crate::store::models::{DealStage, Priority};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable naming the settings file
pub const CONFIG_ENV_VAR: &str = "DEALFLOW_CONFIG";

/// Settings model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Stage for new deals that don't name one
    pub default_stage: DealStage,
    pub default_priority: Priority,
    /// Appended to the title of a duplicated deal
    pub duplicate_suffix: String,
    /// Missing ids fail with NotFound instead of being ignored
    pub strict_not_found: bool,
    /// Write elapsed days into the outgoing history entry on a stage move
    pub backfill_stage_durations: bool,
    /// Fallback tracing filter when RUST_LOG is unset
    pub log_filter: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            default_stage: DealStage::Prospecting,
            default_priority: Priority::Medium,
            duplicate_suffix: " (Copy)".to_string(),
            strict_not_found: true,
            backfill_stage_durations: false,
            log_filter: "dealflow=info".to_string(),
        }
    }
}

impl PipelineSettings {
    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let settings: PipelineSettings = serde_json::from_str(&raw)?;
        settings.validate()?;

        tracing::info!("Loaded pipeline settings from {:?}", path);
        Ok(settings)
    }

    /// Load from `DEALFLOW_CONFIG` when set, defaults otherwise
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    /// Check values that serde can't
    pub fn validate(&self) -> Result<()> {
        if self.duplicate_suffix.trim().is_empty() {
            return Err(AppError::Config(
                "duplicate_suffix must not be blank".to_string(),
            ));
        }
        if self.log_filter.trim().is_empty() {
            return Err(AppError::Config("log_filter must not be blank".to_string()));
        }
        Ok(())
    }
}

/// Partial settings update; `None` keeps the current value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSettingsRequest {
    pub default_stage: Option<DealStage>,
    pub default_priority: Option<Priority>,
    pub duplicate_suffix: Option<String>,
    pub strict_not_found: Option<bool>,
    pub backfill_stage_durations: Option<bool>,
    pub log_filter: Option<String>,
}

impl UpdateSettingsRequest {
    /// Apply onto a copy of `current` and validate the result
    pub fn apply(self, current: &PipelineSettings) -> Result<PipelineSettings> {
        let mut next = current.clone();

        if let Some(stage) = self.default_stage {
            next.default_stage = stage;
        }
        if let Some(priority) = self.default_priority {
            next.default_priority = priority;
        }
        if let Some(suffix) = self.duplicate_suffix {
            next.duplicate_suffix = suffix;
        }
        if let Some(strict) = self.strict_not_found {
            next.strict_not_found = strict;
        }
        if let Some(backfill) = self.backfill_stage_durations {
            next.backfill_stage_durations = backfill;
        }
        if let Some(filter) = self.log_filter {
            next.log_filter = filter;
        }

        next.validate()?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let settings = PipelineSettings::default();
        assert_eq!(settings.default_stage, DealStage::Prospecting);
        assert_eq!(settings.duplicate_suffix, " (Copy)");
        assert!(settings.strict_not_found);
        assert!(!settings.backfill_stage_durations);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "default_stage": "under_contract", "strict_not_found": false }}"#
        )
        .unwrap();

        let settings = PipelineSettings::load(file.path()).unwrap();
        assert_eq!(settings.default_stage, DealStage::UnderContract);
        assert!(!settings.strict_not_found);
        // untouched keys keep defaults
        assert_eq!(settings.default_priority, Priority::Medium);
        assert_eq!(settings.duplicate_suffix, " (Copy)");
    }

    #[test]
    fn test_load_rejects_bad_values() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "duplicate_suffix": "   " }}"#).unwrap();
        assert!(matches!(
            PipelineSettings::load(file.path()),
            Err(AppError::Config(_))
        ));

        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "default_stage": "archived" }}"#).unwrap();
        assert!(matches!(
            PipelineSettings::load(file.path()),
            Err(AppError::Serialization(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = PipelineSettings::load(&dir.path().join("missing.json"));
        assert!(matches!(result, Err(AppError::Io(_))));
    }

    #[test]
    fn test_update_request() {
        let current = PipelineSettings::default();
        let request = UpdateSettingsRequest {
            backfill_stage_durations: Some(true),
            duplicate_suffix: Some(" - copy".to_string()),
            ..Default::default()
        };

        let next = request.apply(&current).unwrap();
        assert!(next.backfill_stage_durations);
        assert_eq!(next.duplicate_suffix, " - copy");
        assert_eq!(next.default_stage, current.default_stage);

        let blank = UpdateSettingsRequest {
            duplicate_suffix: Some(String::new()),
            ..Default::default()
        };
        assert!(blank.apply(&current).is_err());
    }
}
