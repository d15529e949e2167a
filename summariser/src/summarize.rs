use crate::analyze::{quantile, quantile_label};
use crate::config::SummaryConfig;
use crate::gate::Verdict;
use notebook_perf_model::AggregateRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The summary of a single run.
///
/// `exec_time` maps a quantile label, e.g. `90%`, to the time users needed to reach the target
/// step. When no user reached the target step the values are `null`. Keys are ordered by label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryOutput {
    pub version: String,
    pub user_count: u32,
    pub sleep_factor: f64,
    pub failures: usize,
    /// Users that reported success, out of the users in the record
    pub successes: usize,
    pub exec_time: BTreeMap<String, Option<f64>>,
    /// Only set when thresholds are configured for the report
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
}

/// Reduces the user traces of a run to a failure count and quantiles of the time to reach the
/// target step.
#[derive(Debug, Clone, Default)]
pub struct SummaryReducer {
    config: SummaryConfig,
}

impl SummaryReducer {
    pub fn new(config: SummaryConfig) -> Self {
        Self { config }
    }

    pub fn summarize(&self, record: &AggregateRecord) -> SummaryOutput {
        let mut failures = 0;
        let mut data = Vec::new();

        for result in &record.user_results {
            if !result.succeeded {
                failures += 1;
            }

            // Time to reach a step includes the duration of the step itself
            let mut total_time = 0.0;
            for step in &result.steps {
                total_time += step.duration;
                if step.name == self.config.step_name && step.status == self.config.step_status {
                    data.push(total_time);
                }
            }
        }

        data.sort_by(f64::total_cmp);

        log::debug!(
            "Version {} with {} users: {} failures, {} timings for {:?}",
            record.version,
            record.user_count,
            failures,
            data.len(),
            self.config.step_name
        );

        let exec_time = self
            .config
            .quantiles
            .iter()
            .map(|&q| (quantile_label(q), quantile(&data, q)))
            .collect();

        SummaryOutput {
            version: record.version.clone(),
            user_count: record.user_count,
            sleep_factor: record.sleep_factor,
            failures,
            successes: record.user_results.len() - failures,
            exec_time,
            verdict: None,
        }
    }
}
