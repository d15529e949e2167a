use anyhow::Context;
use notebook_perf_model::{AggregateRecord, load_record};
use notebook_perf_summariser::{
    ReportConfig, SummaryOutput, SummaryReducer, ThresholdConfig, build_report,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

macro_rules! run_snapshot_test {
    ($record_fingerprint:literal) => {
        env_logger::try_init().ok();

        let record = find_test_data_file($record_fingerprint, "1_records")
            .with_context(|| format!("Record not found: {}", $record_fingerprint))?;
        let record =
            load_record(std::fs::File::open(record.path()).context("Failed to load record")?)?;
        record.validate()?;

        let expected = find_test_data_file($record_fingerprint, "3_summary_outputs")
            .context("Summary output not found")?;
        let expected = load_summary_output(expected.path().into())?;

        let output = SummaryReducer::default().summarize(&record);

        if option_env!("UPDATE_SNAPSHOTS") == Some("1") {
            notebook_perf_summariser::test_data::insert_summary_output(&record, &output, true)?;
        } else {
            pretty_assertions::assert_eq!(expected, output, "Snapshot mismatch, run with `UPDATE_SNAPSHOTS=1 cargo test --test snapshot` to update");
        }
    };
}

#[test]
fn ensure_record_fingerprints_accurate() {
    for entry in WalkDir::new(
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("test_data")
            .join("1_records"),
    )
    .into_iter()
    {
        let entry = entry.unwrap();
        if entry.file_type().is_file() {
            let record =
                load_record(std::fs::File::open(entry.path()).expect("Failed to load record"))
                    .unwrap();

            assert_eq!(
                notebook_perf_summariser::test_data::file_name_from_record(&record),
                entry.file_name().to_string_lossy(),
                "Record file name does not match its fingerprint"
            );
        }
    }
}

#[test]
fn every_summary_output_has_a_record() {
    let records_dir = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("test_data")
        .join("1_records");
    for entry in WalkDir::new(
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("test_data")
            .join("3_summary_outputs"),
    )
    .into_iter()
    {
        let entry = entry.unwrap();
        if entry.file_type().is_file() {
            assert!(
                records_dir.join(entry.file_name()).is_file(),
                "No record for summary output {:?}",
                entry.file_name()
            );
        }
    }
}

#[test]
fn single_pass_per_user() -> anyhow::Result<()> {
    run_snapshot_test!("ee0c83c58e9a9525913c1c294595b216ccdf5ee090bebaafbb214aa34c2d7463");
    Ok(())
}

#[test]
fn recurring_target_step() -> anyhow::Result<()> {
    run_snapshot_test!("30bfffc5534105dd6fe67ff7e43e60c7d4013cb1c63e3216107043f8ed73313c");
    Ok(())
}

#[test]
fn no_users() -> anyhow::Result<()> {
    run_snapshot_test!("0338351b1b862b366442621065364d8f37a190288a4eb62409ce39ec39122724");
    Ok(())
}

fn load_all_records() -> anyhow::Result<Vec<AggregateRecord>> {
    WalkDir::new(
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("test_data")
            .join("1_records"),
    )
    .into_iter()
    .filter_map(|entry| entry.ok())
    .filter(|entry| entry.file_type().is_file())
    .map(|entry| {
        load_record(std::fs::File::open(entry.path()).context("Failed to load record")?)
    })
    .collect()
}

#[test]
fn report_over_all_records() -> anyhow::Result<()> {
    env_logger::try_init().ok();

    let records = load_all_records()?;
    assert_eq!(4, records.len());

    let report = build_report(
        records.into_iter().map(Ok).collect(),
        &ReportConfig::default(),
    );
    assert!(report.errors.is_empty(), "{:?}", report.errors);

    // The 1.24.0 run is not a supported version
    let versions = report
        .outputs
        .iter()
        .map(|output| output.version.as_str())
        .collect::<Vec<_>>();
    assert_eq!(vec!["1.25.0", "1.25.0", "1.26.0"], versions);

    let total_failures = report
        .outputs
        .iter()
        .map(|output| output.failures)
        .sum::<usize>();
    assert_eq!(3, total_failures);
    assert!(report.outputs.iter().all(|output| output.verdict.is_none()));

    Ok(())
}

#[test]
fn report_gates_on_thresholds() -> anyhow::Result<()> {
    env_logger::try_init().ok();

    let config = ReportConfig {
        thresholds: ThresholdConfig {
            test_successes: Some(4),
            exec_time: BTreeMap::from([("90%".to_string(), 40.0)]),
        },
        ..Default::default()
    };
    config.validate()?;

    let report = build_report(load_all_records()?.into_iter().map(Ok).collect(), &config);

    // Only the 1.26.0 run has 4 successful users, and its 90% time is exactly 40
    let mut verdicts = report
        .outputs
        .iter()
        .map(|output| {
            (
                output.version.as_str(),
                output.successes,
                output.verdict.as_ref().map(|v| v.passed),
            )
        })
        .collect::<Vec<_>>();
    verdicts.sort_by_key(|(version, successes, _)| (*version, *successes));
    assert_eq!(
        vec![
            ("1.25.0", 0, Some(false)),
            ("1.25.0", 3, Some(false)),
            ("1.26.0", 4, Some(true)),
        ],
        verdicts
    );
    assert_eq!(2, report.failed_verdicts().count());

    Ok(())
}

fn find_test_data_file(record_fingerprint: &str, stage: &str) -> Option<DirEntry> {
    let all_matches = WalkDir::new(
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("test_data")
            .join(stage),
    )
    .into_iter()
    .filter_map(|entry| entry.ok())
    .filter(|entry| {
        entry
            .file_name()
            .to_str()
            .map(|name| name.contains(record_fingerprint))
            .unwrap_or(false)
    })
    .collect::<Vec<_>>();

    match all_matches.len() {
        0 => None,
        1 => Some(all_matches[0].clone()),
        _ => panic!(
            "Expected exactly one match, this indicates a fingerprint collision: {all_matches:?}"
        ),
    }
}

/// Load summary output from a file
pub fn load_summary_output(path: PathBuf) -> anyhow::Result<SummaryOutput> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    serde_json::from_reader(reader).context("Failed to load summary output")
}
