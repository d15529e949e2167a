use serde::{Deserialize, Serialize};
use sha3::Digest;
use std::io::{BufRead, Read, Write};
use std::path::PathBuf;
use thiserror::Error;

/// The parameters that identify a benchmark run.
///
/// This is all the information needed to decide whether a run should be included in a report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputRecord {
    /// The version of the platform under test, e.g. `1.25.0`
    pub version: String,
    /// The number of simulated users that were launched
    pub user_count: u32,
    /// The delay factor used by the load generator when starting users
    pub sleep_factor: f64,
}

/// A complete benchmark run, with the trace of every simulated user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregateRecord {
    /// The version of the platform under test
    pub version: String,
    /// The number of simulated users that were launched
    pub user_count: u32,
    /// The delay factor used by the load generator when starting users
    pub sleep_factor: f64,
    /// One entry per simulated user, in the order the harness reported them
    pub user_results: Vec<UserResult>,
}

/// The outcome of a single simulated user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserResult {
    /// Whether the user completed its whole scenario
    pub succeeded: bool,
    /// The steps the user went through, in execution order
    pub steps: Vec<Step>,
}

/// One timed step of a user's trace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Step {
    pub name: String,
    /// Usually `PASS` or `FAIL`, but any status reported by the harness is kept as-is
    pub status: String,
    /// Time spent in this step. All durations of a record share the same unit.
    pub duration: f64,
}

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Malformed record: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Malformed record on line {line}: {source}")]
    MalformedLine {
        line: usize,
        source: serde_json::Error,
    },
    #[error("Record has an empty version")]
    EmptyVersion,
    #[error("Record has a non-finite sleep factor: {0}")]
    InvalidSleepFactor(f64),
    #[error("User {user} has an invalid duration {duration} for step {step:?}")]
    InvalidDuration {
        user: usize,
        step: String,
        duration: f64,
    },
}

impl AggregateRecord {
    /// The run parameters of this record, as used by the record filter
    pub fn as_input_record(&self) -> InputRecord {
        InputRecord {
            version: self.version.clone(),
            user_count: self.user_count,
            sleep_factor: self.sleep_factor,
        }
    }

    /// Compute a fingerprint for this record
    ///
    /// The fingerprint identifies the run parameters together with the full user traces, so two
    /// runs with the same configuration still get distinct fingerprints. It uses the
    ///     - Version
    ///     - User count
    ///     - Sleep factor
    ///     - Every user's outcome and steps, in order
    ///
    /// The fingerprint is computed using [sha3::Sha3_256].
    pub fn fingerprint(&self) -> String {
        let mut hasher = sha3::Sha3_256::new();
        Digest::update(&mut hasher, self.version.as_bytes());
        Digest::update(&mut hasher, self.user_count.to_le_bytes());
        Digest::update(&mut hasher, self.sleep_factor.to_le_bytes());
        for result in &self.user_results {
            Digest::update(&mut hasher, [u8::from(result.succeeded)]);
            for step in &result.steps {
                Digest::update(&mut hasher, step.name.as_bytes());
                Digest::update(&mut hasher, step.status.as_bytes());
                Digest::update(&mut hasher, step.duration.to_le_bytes());
            }
        }

        format!("{:x}", hasher.finalize())
    }

    /// Check the values that deserialization alone can't enforce.
    ///
    /// Durations must be finite and non-negative, otherwise the cumulative step timings are
    /// meaningless.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.version.is_empty() {
            return Err(RecordError::EmptyVersion);
        }
        if !self.sleep_factor.is_finite() {
            return Err(RecordError::InvalidSleepFactor(self.sleep_factor));
        }

        for (user, result) in self.user_results.iter().enumerate() {
            if let Some(step) = result
                .steps
                .iter()
                .find(|step| !step.duration.is_finite() || step.duration < 0.0)
            {
                return Err(RecordError::InvalidDuration {
                    user,
                    step: step.name.clone(),
                    duration: step.duration,
                });
            }
        }

        Ok(())
    }
}

/// Append the record to a file
///
/// The record will be serialized to JSON and output as a single line followed by a newline. The
/// recommended file extension is `.jsonl`.
pub fn append_record(record: &AggregateRecord, path: PathBuf) -> anyhow::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)?;
    store_record(record, &mut file)?;
    let _ = file.write("\n".as_bytes())?;
    Ok(())
}

/// Serialize the record to a writer
pub fn store_record<W: Write>(record: &AggregateRecord, writer: &mut W) -> anyhow::Result<()> {
    serde_json::to_writer(writer, record)?;
    Ok(())
}

/// Load a single record from a reader
pub fn load_record<R: Read>(reader: R) -> anyhow::Result<AggregateRecord> {
    let reader = std::io::BufReader::new(reader);
    let record: AggregateRecord =
        serde_json::from_reader(reader).map_err(RecordError::Malformed)?;
    Ok(record)
}

/// Load records from a file
///
/// The file should contain one JSON object per line. This is the format produced by
/// [append_record]. Blank lines are skipped.
///
/// A line that does not parse does not stop the load. It is returned as a
/// [RecordError::MalformedLine] in its position, so the caller can report it alongside the records
/// that did parse. Only I/O errors fail the whole load.
pub fn load_records(path: PathBuf) -> anyhow::Result<Vec<Result<AggregateRecord, RecordError>>> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str::<AggregateRecord>(&line).map_err(|source| {
            RecordError::MalformedLine {
                line: index + 1,
                source,
            }
        });
        if let Err(e) = &record {
            log::debug!("{e}");
        }
        records.push(record);
    }
    log::debug!("Loaded {} records", records.len());
    Ok(records)
}
