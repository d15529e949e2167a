use anyhow::{Context, anyhow};
use chrono::Utc;
use log::debug;
use notebook_perf_model::load_records;
use notebook_perf_summariser::{ReportConfig, build_report};
use std::fs::File;
use std::path::PathBuf;

/// Environment variable name to set a custom records file path
const RECORDS_PATH_ENV: &str = "RECORDS_PATH";
/// Default path for the records file
const DEFAULT_RECORDS_PATH: &str = "records.jsonl";
/// Environment variable name to point at a TOML report config
const REPORT_CONFIG_PATH_ENV: &str = "REPORT_CONFIG_PATH";

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let ignore_errors = std::env::var("IGNORE_SUMMARY_ERRORS").is_ok();

    #[cfg(feature = "test_data")]
    log::info!("Test data generation enabled");

    let config = match std::env::var(REPORT_CONFIG_PATH_ENV) {
        Ok(path) => ReportConfig::load(&PathBuf::from(path)).context("Failed to load config")?,
        Err(_) => ReportConfig::default(),
    };
    debug!("Using config: {config:?}");

    let records_path = std::env::var(RECORDS_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_RECORDS_PATH));
    debug!("Loading records from {}", records_path.display());
    let records = load_records(records_path.clone())
        .with_context(|| format!("Failed to load records from {}", records_path.display()))?;
    let total_records = records.len();

    // When the test data feature is enabled, capture the matching records and their outputs
    #[cfg(feature = "test_data")]
    {
        let filter = notebook_perf_summariser::RecordFilter::new(config.filter.clone());
        let reducer = notebook_perf_summariser::SummaryReducer::new(config.summary.clone());
        let valid = records
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .filter(|r| r.validate().is_ok());
        for record in valid {
            if filter.matches(&record.as_input_record()) {
                notebook_perf_summariser::test_data::insert_record(record)?;
                notebook_perf_summariser::test_data::insert_summary_output(
                    record,
                    &reducer.summarize(record),
                    false,
                )?;
            }
        }
    }

    let report = build_report(records, &config);

    let out = File::create_new(format!(
        "summariser-report-{}.json",
        Utc::now().format("%Y-%m-%dT%H.%M.%S%.fZ")
    ))?;

    serde_json::to_writer_pretty(out, &report.outputs)?;
    log::info!("Wrote {} summaries", report.outputs.len());

    for output in &report.outputs {
        if let Some(verdict) = &output.verdict {
            log::info!(
                "Version {} with {} users: {} ({}/{} users succeeded)",
                output.version,
                output.user_count,
                if verdict.passed { "PASSED" } else { "FAILED" },
                output.successes,
                output.successes + output.failures
            );
        }
    }
    let failed_verdicts = report.failed_verdicts().count();

    // If any of the records were invalid and errors should not explicitly be ignored, return an error
    if !report.errors.is_empty() {
        let error_message = format!(
            "{} out of {} records were invalid:\n{:#?}",
            report.errors.len(),
            total_records,
            report.errors
        );

        if ignore_errors {
            log::warn!("{}", error_message);
        } else {
            return Err(anyhow!(error_message));
        }
    }

    if failed_verdicts > 0 {
        return Err(anyhow!(
            "{} out of {} summaries did not meet their thresholds",
            failed_verdicts,
            report.outputs.len()
        ));
    }

    Ok(())
}
