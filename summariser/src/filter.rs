use crate::config::FilterConfig;
use notebook_perf_model::{AggregateRecord, InputRecord};

/// Selects the runs that belong in a report.
///
/// All checks are exact, a record matches only when its version is one of the configured
/// versions and both its user count and sleep factor are equal to the configured values.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    config: FilterConfig,
}

impl RecordFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn matches(&self, record: &InputRecord) -> bool {
        self.matches_parameters(&record.version, record.user_count, record.sleep_factor)
    }

    /// Keep the records that match, in their original order
    pub fn select_matching(&self, records: Vec<AggregateRecord>) -> Vec<AggregateRecord> {
        records
            .into_iter()
            .filter(|record| {
                let keep =
                    self.matches_parameters(&record.version, record.user_count, record.sleep_factor);
                if !keep {
                    log::debug!(
                        "Skipping record for version {} with {} users and sleep factor {}",
                        record.version,
                        record.user_count,
                        record.sleep_factor
                    );
                }
                keep
            })
            .collect()
    }

    fn matches_parameters(&self, version: &str, user_count: u32, sleep_factor: f64) -> bool {
        sleep_factor == self.config.sleep_factor
            && user_count == self.config.user_count
            && self.config.versions.iter().any(|v| v == version)
    }
}
