use crate::analyze::quantile_label;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_VERSIONS: [&str; 2] = ["1.25.0", "1.26.0"];
pub const DEFAULT_USER_COUNT: u32 = 5;
pub const DEFAULT_SLEEP_FACTOR: f64 = 3.0;

/// The step at which a user is considered to have reached a running notebook
pub const DEFAULT_STEP_NAME: &str = "Go to JupyterLab Page";
pub const DEFAULT_STEP_STATUS: &str = "PASS";
pub const DEFAULT_QUANTILES: [f64; 5] = [1.0, 0.9, 0.75, 0.5, 0.25];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Quantile {0} is outside of [0, 1]")]
    QuantileOutOfRange(f64),
    #[error("Quantile {quantile} has the same label {label:?} as another configured quantile")]
    DuplicateLabel { quantile: f64, label: String },
    #[error("Threshold for {0:?} does not match any configured quantile")]
    UnknownThresholdLabel(String),
    #[error("Threshold for {label:?} must be a finite, non-negative time: {value}")]
    InvalidThreshold { label: String, value: f64 },
}

/// Everything that can be tuned about a report.
///
/// Every section and key is optional in the TOML form, missing values fall back to the defaults
/// above.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    pub filter: FilterConfig,
    pub summary: SummaryConfig,
    pub thresholds: ThresholdConfig,
}

/// Selects which runs are included in a report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilterConfig {
    pub versions: Vec<String>,
    pub user_count: u32,
    pub sleep_factor: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            versions: DEFAULT_VERSIONS.iter().map(|v| v.to_string()).collect(),
            user_count: DEFAULT_USER_COUNT,
            sleep_factor: DEFAULT_SLEEP_FACTOR,
        }
    }
}

/// Selects the step that is timed and the quantiles that are reported for it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SummaryConfig {
    pub step_name: String,
    pub step_status: String,
    /// Fractions in `[0, 1]`. Each one becomes a key of the summary's `exec_time`, which is
    /// ordered by label rather than by this list.
    pub quantiles: Vec<f64>,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            step_name: DEFAULT_STEP_NAME.to_string(),
            step_status: DEFAULT_STEP_STATUS.to_string(),
            quantiles: DEFAULT_QUANTILES.to_vec(),
        }
    }
}

impl SummaryConfig {
    /// Every quantile must be in `[0, 1]` and map to its own label
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut labels = HashSet::with_capacity(self.quantiles.len());
        for &quantile in &self.quantiles {
            if !(0.0..=1.0).contains(&quantile) {
                return Err(ConfigError::QuantileOutOfRange(quantile));
            }
            let label = quantile_label(quantile);
            if !labels.insert(label.clone()) {
                return Err(ConfigError::DuplicateLabel { quantile, label });
            }
        }

        Ok(())
    }
}

/// Pass/fail criteria applied to each summary.
///
/// With nothing configured no verdict is produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Minimum number of users that must have succeeded
    pub test_successes: Option<usize>,
    /// Maximum time to reach the target step, keyed by quantile label, e.g. `"90%" = 120.0`
    pub exec_time: BTreeMap<String, f64>,
}

impl ThresholdConfig {
    pub fn is_empty(&self) -> bool {
        self.test_successes.is_none() && self.exec_time.is_empty()
    }

    fn validate(&self, summary: &SummaryConfig) -> Result<(), ConfigError> {
        let labels = summary
            .quantiles
            .iter()
            .map(|&q| quantile_label(q))
            .collect::<HashSet<_>>();

        for (label, &value) in &self.exec_time {
            if !labels.contains(label) {
                return Err(ConfigError::UnknownThresholdLabel(label.clone()));
            }
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidThreshold {
                    label: label.clone(),
                    value,
                });
            }
        }

        Ok(())
    }
}

impl ReportConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ReportConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded report config from {}", path.display());

        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.summary.validate()?;
        self.thresholds.validate(&self.summary)
    }
}
