//! Workshop configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::WorkshopError;
use crate::events::NarrationFormat;
use crate::workshop::GROUP_SIZE;

/// Main workshop configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cohort members that must all be present before dispatch
    #[serde(rename = "cohort-size")]
    pub cohort_size: usize,

    /// Group workers competing for groups of three
    #[serde(rename = "group-workers")]
    pub group_workers: usize,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Activity durations
    pub timing: TimingConfig,

    /// Console narration
    pub narration: NarrationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cohort_size: crate::DEFAULT_COHORT_SIZE,
            group_workers: crate::DEFAULT_GROUP_WORKERS,
            log_level: None,
            timing: TimingConfig::default(),
            narration: NarrationConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration before use
    pub fn validate(&self) -> Result<()> {
        if self.cohort_size == 0 {
            return Err(WorkshopError::InvalidConfig("cohort-size must be at least 1".to_string()).into());
        }
        if self.group_workers < GROUP_SIZE {
            return Err(WorkshopError::InvalidConfig(format!(
                "group-workers must be at least {} (got {})",
                GROUP_SIZE, self.group_workers
            ))
            .into());
        }
        self.timing.validate()?;
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .workshop.yml
        let local_config = PathBuf::from(".workshop.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/workshop/workshop.yml
        if let Some(user_config) = Self::user_config_path()
            && user_config.exists()
        {
            match Self::load_from_file(&user_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read just the log level, before logging is initialized
    ///
    /// Errors are swallowed; the full load reports them once logging is up.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => [Some(PathBuf::from(".workshop.yml")), Self::user_config_path()]
                .into_iter()
                .flatten()
                .collect(),
        };

        candidates
            .iter()
            .find(|p| p.exists())
            .and_then(|p| Self::load_from_file(p).ok())
            .and_then(|c| c.log_level)
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content).context(format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }

    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("workshop").join("workshop.yml"))
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        debug!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Inclusive range of milliseconds an activity may take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min: u64,
    pub max: u64,
}

impl DelayRange {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// A range that always yields the same duration
    pub const fn fixed(ms: u64) -> Self {
        Self { min: ms, max: ms }
    }

    pub fn is_valid(&self) -> bool {
        self.min <= self.max
    }
}

/// Activity durations in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Cohort member absence between rounds
    #[serde(rename = "away-ms")]
    pub away_ms: DelayRange,

    /// Cohort member activity after dispatch
    #[serde(rename = "delivery-ms")]
    pub delivery_ms: DelayRange,

    /// Group worker independent work before needing help
    #[serde(rename = "work-ms")]
    pub work_ms: DelayRange,

    /// Group member time spent being helped
    #[serde(rename = "assistance-ms")]
    pub assistance_ms: u64,

    /// Coordinator time spent helping a group
    #[serde(rename = "assist-ms")]
    pub assist_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            away_ms: DelayRange::new(1000, 3000),
            delivery_ms: DelayRange::new(500, 1500),
            work_ms: DelayRange::new(1000, 4000),
            assistance_ms: 700,
            assist_ms: 1000,
        }
    }
}

impl TimingConfig {
    /// Every activity takes no time
    pub fn instant() -> Self {
        Self {
            away_ms: DelayRange::fixed(0),
            delivery_ms: DelayRange::fixed(0),
            work_ms: DelayRange::fixed(0),
            assistance_ms: 0,
            assist_ms: 0,
        }
    }

    pub fn assistance(&self) -> Duration {
        Duration::from_millis(self.assistance_ms)
    }

    pub fn assist(&self) -> Duration {
        Duration::from_millis(self.assist_ms)
    }

    fn validate(&self) -> Result<()> {
        let ranges = [
            ("away-ms", self.away_ms),
            ("delivery-ms", self.delivery_ms),
            ("work-ms", self.work_ms),
        ];
        for (name, range) in ranges {
            if !range.is_valid() {
                return Err(WorkshopError::InvalidConfig(format!(
                    "{}: min ({}) is greater than max ({})",
                    name, range.min, range.max
                ))
                .into());
            }
        }
        Ok(())
    }
}

/// Console narration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationConfig {
    pub format: NarrationFormat,
    pub color: bool,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            format: NarrationFormat::Text,
            color: true,
        }
    }
}
