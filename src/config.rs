//! Layered sidecar configuration.
//!
//! Sources, highest priority last:
//! 1. Built-in defaults
//! 2. `lessond.toml` in the working directory
//! 3. `LESSOND_*` environment variables, `__` separating sections
//!    (`LESSOND_SCHEDULING__RESCHEDULE__LEAD_MINUTES=90`)

use crate::slots::{FitPolicy, MergePolicy, MAX_LEAD_MINUTES};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub const CONFIG_FILE: &str = "lessond.toml";
pub const MAX_HORIZON_DAYS: i64 = 90;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Figment(#[from] figment::Error),

    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Slot policy for one booking screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct FlowConfig {
    pub lead_minutes: i64,
    pub merge: MergePolicy,
    pub fit: FitPolicy,
}

impl FlowConfig {
    fn reschedule_default() -> Self {
        Self {
            lead_minutes: 120,
            merge: MergePolicy::Concatenate,
            fit: FitPolicy::WithinWindow,
        }
    }

    fn book_with_student_default() -> Self {
        Self {
            lead_minutes: 0,
            merge: MergePolicy::Dedup,
            fit: FitPolicy::WithinWindow,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SchedulingConfig {
    #[serde(default = "FlowConfig::reschedule_default")]
    pub reschedule: FlowConfig,
    #[serde(default = "FlowConfig::book_with_student_default")]
    pub book_with_student: FlowConfig,
    #[serde(default = "default_horizon_days")]
    pub next_available_horizon_days: i64,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            reschedule: FlowConfig::reschedule_default(),
            book_with_student: FlowConfig::book_with_student_default(),
            next_available_horizon_days: default_horizon_days(),
        }
    }
}

fn default_horizon_days() -> i64 {
    14
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LessondConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub scheduling: SchedulingConfig,
}

impl Default for LessondConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            scheduling: SchedulingConfig::default(),
        }
    }
}

impl LessondConfig {
    /// Loads `.env` (if any) and extracts from all sources.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    pub fn load() -> Result<Self, ConfigError> {
        let cfg: Self = Self::figment().extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        let local_path = PathBuf::from(CONFIG_FILE);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }
        figment.merge(Env::prefixed("LESSOND_").split("__"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let flows = [
            ("scheduling.reschedule.lead_minutes", &self.scheduling.reschedule),
            (
                "scheduling.book_with_student.lead_minutes",
                &self.scheduling.book_with_student,
            ),
        ];
        for (field, flow) in flows {
            if !(0..=MAX_LEAD_MINUTES).contains(&flow.lead_minutes) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: format!(
                        "must be in 0..={} (got {})",
                        MAX_LEAD_MINUTES, flow.lead_minutes
                    ),
                });
            }
        }
        let horizon = self.scheduling.next_available_horizon_days;
        if !(1..=MAX_HORIZON_DAYS).contains(&horizon) {
            return Err(ConfigError::InvalidValue {
                field: "scheduling.next_available_horizon_days".to_string(),
                reason: format!("must be in 1..={} (got {})", MAX_HORIZON_DAYS, horizon),
            });
        }
        Ok(())
    }
}
