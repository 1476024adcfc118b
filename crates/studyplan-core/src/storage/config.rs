//! TOML-based planner configuration.
//!
//! Stores user preferences including:
//! - Allocation mode, daily budget and carryover day cap
//! - Whether complementary volumes are included
//! - CSV export date format and labels
//!
//! Configuration is stored at `~/.config/studyplan/config.toml`.

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::schedule::{AllocationMode, DEFAULT_CARRYOVER_MAX_DAYS, DEFAULT_DAILY_BUDGET_MINUTES};

/// Allocation strategy as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleModeSetting {
    #[default]
    DailyBudget,
    OnePerDay,
}

/// Schedule-specific configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default)]
    pub mode: ScheduleModeSetting,
    #[serde(default = "default_daily_budget")]
    pub daily_budget_minutes: u32,
    /// Safety bound on days considered in one-per-day mode
    #[serde(default = "default_carryover_max_days")]
    pub carryover_max_days: u32,
    #[serde(default)]
    pub include_complementary: bool,
}

/// CSV export configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// chrono strftime pattern for the date column
    #[serde(default = "default_date_format")]
    pub date_format: String,
    /// Header row, one label per column
    #[serde(default = "default_headers")]
    pub headers: Vec<String>,
    #[serde(default = "default_study_label")]
    pub study_label: String,
    #[serde(default = "default_review_label")]
    pub review_label: String,
    #[serde(default = "default_completed_label")]
    pub completed_label: String,
    #[serde(default = "default_pending_label")]
    pub pending_label: String,
}

/// Planner configuration.
///
/// Serialized to/from TOML at `~/.config/studyplan/config.toml`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

// Default functions
fn default_daily_budget() -> u32 {
    DEFAULT_DAILY_BUDGET_MINUTES
}
fn default_carryover_max_days() -> u32 {
    DEFAULT_CARRYOVER_MAX_DAYS
}
fn default_date_format() -> String {
    "%d/%m/%Y".into()
}
fn default_headers() -> Vec<String> {
    ["Date", "Volume", "Chapter", "Topic", "Duration (min)", "Type", "Status"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_study_label() -> String {
    "Study".into()
}
fn default_review_label() -> String {
    "Review".into()
}
fn default_completed_label() -> String {
    "Completed".into()
}
fn default_pending_label() -> String {
    "Pending".into()
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            mode: ScheduleModeSetting::default(),
            daily_budget_minutes: default_daily_budget(),
            carryover_max_days: default_carryover_max_days(),
            include_complementary: false,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            date_format: default_date_format(),
            headers: default_headers(),
            study_label: default_study_label(),
            review_label: default_review_label(),
            completed_label: default_completed_label(),
            pending_label: default_pending_label(),
        }
    }
}

impl PlannerConfig {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => serde_json::Value::Number(
                        value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                            .into(),
                    ),
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults there if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            Ok(cfg)
        }
    }

    /// Load and validate a config file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let load_failed = |message: String| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|e| load_failed(e.to_string()))?;
        let cfg: PlannerConfig = toml::from_str(&content).map_err(|e| load_failed(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default planner config");
            Self::default()
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key. The change is validated but
    /// not written to disk; call [`save`](Self::save) to persist it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value is invalid. The
    /// config is left unchanged on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: PlannerConfig =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Check value ranges the types alone cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.to_string(),
        };
        if self.schedule.daily_budget_minutes == 0 {
            return Err(invalid("schedule.daily_budget_minutes", "must be greater than zero"));
        }
        if self.schedule.carryover_max_days == 0 {
            return Err(invalid("schedule.carryover_max_days", "must be greater than zero"));
        }
        if self.export.headers.len() != crate::export::COLUMNS.len() {
            return Err(invalid("export.headers", "expected one header per export column"));
        }
        if StrftimeItems::new(&self.export.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(invalid("export.date_format", "not a valid strftime pattern"));
        }
        Ok(())
    }

    /// Allocation mode selected by the schedule section.
    pub fn allocation_mode(&self) -> AllocationMode {
        match self.schedule.mode {
            ScheduleModeSetting::DailyBudget => AllocationMode::DailyBudget {
                minutes: self.schedule.daily_budget_minutes,
            },
            ScheduleModeSetting::OnePerDay => AllocationMode::OnePerDay {
                max_days: self.schedule.carryover_max_days,
            },
        }
    }
}
