//! Runtime configuration.
//!
//! Values come from environment variables prefixed with `ATTENDANCE_REPORT`,
//! using `__` as separator (`ATTENDANCE_REPORT__CURRENT_WEEK=12`). A `.env`
//! file in the working directory is loaded first if present.

use crate::filter::DefaulterFilter;
use crate::status::{ReportWeek, StatusTier};
use crate::types::HierarchyLevel;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Current week must be between 1 and 53, got {0}")]
    InvalidWeek(u32),

    #[error("Preview rows must be at least 1")]
    InvalidPreviewRows,

    #[error("Reports cannot be grouped by district")]
    InvalidGrouping,

    #[error("Output directory must not be empty")]
    EmptyOutputDir,

    #[error("Unknown hierarchy level in filter: {0}")]
    InvalidFilterLevel(String),

    #[error("Unknown status in filter: {0}")]
    InvalidFilterStatus(String),
}

fn default_defaulters_path() -> String {
    "defaulters.csv".to_string()
}

fn default_attendance_path() -> String {
    "attendance.csv".to_string()
}

fn default_output_dir() -> String {
    "reports".to_string()
}

fn default_group_by() -> HierarchyLevel {
    HierarchyLevel::Region
}

/// Accepts the same spellings as `HierarchyLevel::from_str`, so
/// `Region` and `old-group` work from the environment.
fn deserialize_level<'de, D>(deserializer: D) -> Result<HierarchyLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

fn default_preview_rows() -> usize {
    5
}

fn default_title() -> String {
    "Attendance Defaulters Report".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_defaulters_path")]
    pub defaulters_path: String,

    #[serde(default = "default_attendance_path")]
    pub attendance_path: String,

    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// ISO week to report against; today's week when unset.
    #[serde(default)]
    pub current_week: Option<u32>,

    #[serde(default = "default_group_by", deserialize_with = "deserialize_level")]
    pub group_by: HierarchyLevel,

    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,

    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default)]
    pub filter_level: Option<String>,

    /// Comma-separated tiers, e.g. `red,orange`.
    #[serde(default)]
    pub filter_statuses: Option<String>,

    #[serde(default)]
    pub filter_search: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            defaulters_path: default_defaulters_path(),
            attendance_path: default_attendance_path(),
            output_dir: default_output_dir(),
            current_week: None,
            group_by: default_group_by(),
            preview_rows: default_preview_rows(),
            title: default_title(),
            filter_level: None,
            filter_statuses: None,
            filter_search: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("ATTENDANCE_REPORT")
                .separator("__")
                .try_parsing(true),
        );
        Self::from_builder(builder)
    }

    pub fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let cfg: AppConfig = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(week) = self.current_week {
            if !(1..=53).contains(&week) {
                return Err(ValidationError::InvalidWeek(week));
            }
        }
        if self.preview_rows == 0 {
            return Err(ValidationError::InvalidPreviewRows);
        }
        if self.group_by == HierarchyLevel::District {
            return Err(ValidationError::InvalidGrouping);
        }
        if self.output_dir.trim().is_empty() {
            return Err(ValidationError::EmptyOutputDir);
        }
        self.filter()?;
        Ok(())
    }

    pub fn report_week(&self) -> ReportWeek {
        let today = ReportWeek::today();
        match self.current_week {
            Some(week) => ReportWeek::new(today.year, week),
            None => today,
        }
    }

    pub fn output_path(&self, file_name: &str) -> PathBuf {
        Path::new(&self.output_dir).join(file_name)
    }

    pub fn filter(&self) -> Result<DefaulterFilter, ValidationError> {
        let level = match self.filter_level.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => Some(
                s.parse::<HierarchyLevel>()
                    .map_err(|_| ValidationError::InvalidFilterLevel(s.to_string()))?,
            ),
            None => None,
        };
        let mut statuses = Vec::new();
        if let Some(list) = self.filter_statuses.as_deref() {
            for part in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                let tier = part
                    .parse::<StatusTier>()
                    .map_err(|_| ValidationError::InvalidFilterStatus(part.to_string()))?;
                if !statuses.contains(&tier) {
                    statuses.push(tier);
                }
            }
        }
        Ok(DefaulterFilter {
            level,
            statuses,
            search: self.filter_search.clone(),
            within: None,
        })
    }
}
