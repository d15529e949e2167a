use crate::config::ThresholdConfig;
use crate::summarize::SummaryOutput;
use serde::{Deserialize, Serialize};

/// The outcome of checking one summary against the configured thresholds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Verdict {
    /// True only when every check passed
    pub passed: bool,
    pub checks: Vec<ThresholdCheck>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThresholdCheck {
    /// `test_successes`, or the quantile label of an `exec_time` threshold
    pub name: String,
    /// The measured value, [None] when no user reached the target step
    pub value: Option<f64>,
    pub threshold: f64,
    pub passed: bool,
}

/// Applies [ThresholdConfig] to summaries.
///
/// The success count passes when it is at least the threshold. A quantile passes when it is at
/// most its threshold, and fails when there is no timing data for it.
#[derive(Debug, Clone, Default)]
pub struct ThresholdGate {
    config: ThresholdConfig,
}

impl ThresholdGate {
    pub fn new(config: ThresholdConfig) -> Self {
        Self { config }
    }

    /// Returns [None] when no threshold is configured
    pub fn check(&self, output: &SummaryOutput) -> Option<Verdict> {
        if self.config.is_empty() {
            return None;
        }

        let mut checks = Vec::with_capacity(self.config.exec_time.len() + 1);

        if let Some(min_successes) = self.config.test_successes {
            checks.push(ThresholdCheck {
                name: "test_successes".to_string(),
                value: Some(output.successes as f64),
                threshold: min_successes as f64,
                passed: output.successes >= min_successes,
            });
        }

        for (label, &max_time) in &self.config.exec_time {
            let value = output.exec_time.get(label).copied().flatten();
            checks.push(ThresholdCheck {
                name: label.clone(),
                value,
                threshold: max_time,
                passed: value.is_some_and(|v| v <= max_time),
            });
        }

        let passed = checks.iter().all(|c| c.passed);
        if !passed {
            for check in checks.iter().filter(|c| !c.passed) {
                log::info!(
                    "Version {} with {} users failed {}: {:?} against threshold {}",
                    output.version,
                    output.user_count,
                    check.name,
                    check.value,
                    check.threshold
                );
            }
        }

        Some(Verdict { passed, checks })
    }
}
