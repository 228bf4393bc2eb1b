//! Fan a batch out to every sink that accepts its records.
//!
//! Each sink gets at most one bulk append per batch, containing its eligible
//! records in batch order. Sinks are independent: a sink that still fails
//! after its retries is reported and skipped, the others still write.

use std::collections::HashSet;
use std::thread;
use std::time::Duration;

use metrics::counter;
use sensor2csv_batch::BatchSink;
use sensor2csv_core::{Batch, Eligibility, FlushSummary, Record, SinkReport, TableSchema};
use sensor2csv_core::{ANALOG, ENVIRONMENTAL};
use tracing::{info, warn};

use crate::encoding::{encode_csv_header, encode_csv_rows, encode_json_lines};
use crate::error::{Result, WriterError};
use crate::storage::SinkStorage;

pub const RAW_LOG_SINK: &str = "raw";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkFormat {
    /// Every field, one JSON object per line.
    JsonLines,
    /// Fixed columns with a header row.
    Csv(TableSchema),
}

/// A named output file and the records it accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkSpec {
    pub name: String,
    pub file: String,
    pub format: SinkFormat,
    pub eligibility: Eligibility,
}

impl SinkSpec {
    pub fn raw_log(file: impl Into<String>) -> Self {
        Self {
            name: RAW_LOG_SINK.to_string(),
            file: file.into(),
            format: SinkFormat::JsonLines,
            eligibility: Eligibility::Always,
        }
    }

    pub fn table(schema: TableSchema, file: impl Into<String>) -> Self {
        Self {
            name: schema.name.to_string(),
            file: file.into(),
            format: SinkFormat::Csv(schema),
            eligibility: schema.eligibility(),
        }
    }
}

/// File names for the built-in sinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkFiles {
    pub raw_log: String,
    pub environmental: String,
    pub analog: String,
}

impl Default for SinkFiles {
    fn default() -> Self {
        Self {
            raw_log: "sensor_data.jsonl".to_string(),
            environmental: "sensor_data.csv".to_string(),
            analog: "analog_data.csv".to_string(),
        }
    }
}

impl SinkFiles {
    pub fn specs(&self) -> Vec<SinkSpec> {
        vec![
            SinkSpec::raw_log(&self.raw_log),
            SinkSpec::table(ENVIRONMENTAL, &self.environmental),
            SinkSpec::table(ANALOG, &self.analog),
        ]
    }
}

/// Bounded retry for a failing append. Attempt `n` waits `backoff * n` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            backoff: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            retries: 0,
            backoff: Duration::ZERO,
        }
    }
}

struct Sink {
    spec: SinkSpec,
    header: Option<Vec<u8>>,
}

impl Sink {
    fn encode(&self, records: &[&Record]) -> Result<Vec<u8>> {
        match &self.spec.format {
            SinkFormat::JsonLines => encode_json_lines(&self.spec.name, records),
            SinkFormat::Csv(schema) => encode_csv_rows(schema, records),
        }
    }
}

pub struct SinkRouter<S> {
    storage: S,
    sinks: Vec<Sink>,
    retry: RetryPolicy,
}

impl<S: SinkStorage> SinkRouter<S> {
    pub fn new(storage: S, specs: Vec<SinkSpec>, retry: RetryPolicy) -> Result<Self> {
        if specs.is_empty() {
            return Err(WriterError::invalid_config("at least one sink is required"));
        }

        let mut names = HashSet::new();
        let mut files = HashSet::new();
        let mut sinks = Vec::with_capacity(specs.len());
        for spec in specs {
            if spec.file.trim().is_empty() {
                return Err(WriterError::invalid_config(format!(
                    "sink '{}' has an empty file name",
                    spec.name
                )));
            }
            if !names.insert(spec.name.clone()) {
                return Err(WriterError::invalid_config(format!(
                    "duplicate sink name '{}'",
                    spec.name
                )));
            }
            if !files.insert(spec.file.clone()) {
                return Err(WriterError::invalid_config(format!(
                    "file '{}' is used by more than one sink",
                    spec.file
                )));
            }

            let header = match &spec.format {
                SinkFormat::JsonLines => None,
                SinkFormat::Csv(schema) => Some(encode_csv_header(schema)?),
            };
            sinks.push(Sink { spec, header });
        }

        Ok(Self {
            storage,
            sinks,
            retry,
        })
    }

    /// Raw log plus the environmental and analog tables.
    pub fn with_default_sinks(storage: S, files: &SinkFiles, retry: RetryPolicy) -> Result<Self> {
        Self::new(storage, files.specs(), retry)
    }

    /// Create every sink file, writing CSV headers into new ones.
    pub fn bootstrap(&mut self) -> Result<()> {
        for sink in &self.sinks {
            self.storage
                .prepare(&sink.spec.file, sink.header.as_deref())?;
            info!(sink = %sink.spec.name, file = %sink.spec.file, "sink ready");
        }
        Ok(())
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Write one batch to every sink with at least one eligible record.
    pub fn route(&mut self, batch: &Batch) -> FlushSummary {
        let records = batch.records();
        let mut durable = vec![true; records.len()];
        let mut reports = Vec::with_capacity(self.sinks.len());

        for sink in &self.sinks {
            let members: Vec<usize> = records
                .iter()
                .enumerate()
                .filter(|(_, r)| sink.spec.eligibility.accepts(r))
                .map(|(i, _)| i)
                .collect();
            if members.is_empty() {
                continue;
            }

            let outcome = write_sink(&mut self.storage, sink, &members, records, self.retry);
            if outcome.is_err() {
                for &i in &members {
                    durable[i] = false;
                }
            }
            reports.push(SinkReport {
                sink: sink.spec.name.clone(),
                records: members.len(),
                error: outcome.err().map(|e| e.to_string()),
            });
        }

        // A record failing in several sinks still counts once.
        let written = durable.iter().filter(|ok| **ok).count() as u64;
        FlushSummary {
            batch_len: records.len(),
            reports,
            written,
            failed: records.len() as u64 - written,
        }
    }
}

fn write_sink<S: SinkStorage>(
    storage: &mut S,
    sink: &Sink,
    members: &[usize],
    records: &[Record],
    retry: RetryPolicy,
) -> Result<()> {
    let selected: Vec<&Record> = members.iter().map(|&i| &records[i]).collect();
    let bytes = sink.encode(&selected)?;
    append_with_retry(storage, &sink.spec, sink.header.as_deref(), &bytes, retry)
}

fn append_with_retry<S: SinkStorage>(
    storage: &mut S,
    spec: &SinkSpec,
    header: Option<&[u8]>,
    bytes: &[u8],
    retry: RetryPolicy,
) -> Result<()> {
    let mut attempt = 0u32;
    loop {
        match storage.append(&spec.file, header, bytes) {
            Ok(()) => return Ok(()),
            Err(e) if attempt < retry.retries => {
                attempt += 1;
                warn!(
                    sink = %spec.name,
                    error = %e,
                    "Write failed, will retry (attempt {}/{})",
                    attempt,
                    retry.retries
                );
                counter!("sensor.sink.retries", 1);
                thread::sleep(retry.backoff * attempt);
            }
            Err(e) => return Err(e),
        }
    }
}

impl<S: SinkStorage> BatchSink for SinkRouter<S> {
    fn write_batch(&mut self, batch: Batch) -> FlushSummary {
        self.route(&batch)
    }
}
