use crate::config::ReportConfig;
use crate::filter::RecordFilter;
use crate::gate::ThresholdGate;
use crate::summarize::{SummaryOutput, SummaryReducer};
use itertools::Itertools;
use notebook_perf_model::{AggregateRecord, RecordError};

/// A record that could not be parsed or failed validation, with its position in the input.
///
/// Records that failed to parse from a JSON-lines file also carry their line number in
/// [RecordError::MalformedLine].
#[derive(Debug)]
pub struct InvalidRecord {
    pub index: usize,
    pub error: RecordError,
}

#[derive(Debug, Default)]
pub struct Report {
    pub outputs: Vec<SummaryOutput>,
    pub errors: Vec<InvalidRecord>,
}

impl Report {
    /// Outputs whose verdict failed. Outputs without a verdict never appear here.
    pub fn failed_verdicts(&self) -> impl Iterator<Item = &SummaryOutput> {
        self.outputs
            .iter()
            .filter(|output| output.verdict.as_ref().is_some_and(|v| !v.passed))
    }
}

/// Summarise every valid record that matches the filter.
///
/// Outputs are ordered by version, then user count, then sleep factor, and carry a verdict when
/// thresholds are configured. Records that failed to parse or validate are collected in
/// [Report::errors] and left out of the outputs.
pub fn build_report(
    records: Vec<Result<AggregateRecord, RecordError>>,
    config: &ReportConfig,
) -> Report {
    let filter = RecordFilter::new(config.filter.clone());
    let reducer = SummaryReducer::new(config.summary.clone());
    let gate = ThresholdGate::new(config.thresholds.clone());

    let mut errors = Vec::new();
    let mut valid = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        match record.and_then(|record| record.validate().map(|()| record)) {
            Ok(record) => valid.push(record),
            Err(error) => {
                log::debug!("Record {index} is invalid: {error}");
                errors.push(InvalidRecord { index, error });
            }
        }
    }

    let selected = filter.select_matching(valid);
    log::info!("Selected {} records for the report", selected.len());

    let outputs = selected
        .iter()
        .map(|record| {
            let mut output = reducer.summarize(record);
            output.verdict = gate.check(&output);
            output
        })
        .sorted_by(|a, b| {
            a.version
                .cmp(&b.version)
                .then(a.user_count.cmp(&b.user_count))
                .then(a.sleep_factor.total_cmp(&b.sleep_factor))
        })
        .collect();

    Report { outputs, errors }
}
