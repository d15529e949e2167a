use anyhow::Context;
use notebook_perf_model::AggregateRecord;

use crate::summarize::SummaryOutput;

const RECORDS_STAGE: &str = "1_records";
const SUMMARY_OUTPUTS_STAGE: &str = "3_summary_outputs";

pub fn insert_record(record: &AggregateRecord) -> anyhow::Result<()> {
    let out_file = match open_output_path(RECORDS_STAGE, &file_name_from_record(record), false)? {
        Some(f) => f,
        None => {
            log::info!("Not creating record file as it already exists");
            return Ok(());
        }
    };

    log::debug!("Writing record to {:?}", out_file);

    serde_json::to_writer_pretty(out_file, record).context("Failed to write record")?;

    Ok(())
}

/// Write the summary output of `record` next to the stored record
pub fn insert_summary_output(
    record: &AggregateRecord,
    output: &SummaryOutput,
    overwrite: bool,
) -> anyhow::Result<()> {
    let out_file = match open_output_path(
        SUMMARY_OUTPUTS_STAGE,
        &file_name_from_record(record),
        overwrite,
    )? {
        Some(f) => f,
        None => {
            log::info!("Not creating summary output file as it already exists");
            return Ok(());
        }
    };

    log::debug!("Writing summary output to {:?}", out_file);

    serde_json::to_writer_pretty(out_file, output).context("Failed to write summary output")?;

    Ok(())
}

fn open_output_path(
    stage: &str,
    file_name: &str,
    overwrite: bool,
) -> anyhow::Result<Option<std::fs::File>> {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("test_data")
        .join(stage)
        .join(file_name);

    match std::fs::OpenOptions::new()
        .create_new(!overwrite)
        .create(overwrite)
        .write(true)
        .open(path)
    {
        Ok(f) => {
            if overwrite {
                f.set_len(0)?;
            }

            Ok(Some(f))
        }
        // Already captured by an earlier run
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(None),
        Err(e) => Err(e).context("Failed to open file for writing"),
    }
}

pub fn file_name_from_record(record: &AggregateRecord) -> String {
    format!("{}-{}.json", record.version, record.fingerprint())
}
