//! Background batch accumulator.
//!
//! Runs on a dedicated thread and is the only consumer of the intake queue
//! and the only caller of the sink. The dequeue timeout doubles as the polling
//! cadence for age-based flushes. Closing the queue is the stop signal: the
//! loop drains whatever is still queued, forces a final flush and returns.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use metrics::{counter, histogram};
use sensor2csv_core::Stats;
use tracing::{debug, error, info, warn};

use crate::buffered_batch::{BufferedBatch, FlushReason};
use crate::queue::{Dequeue, IntakeQueue};
use crate::{BatchConfig, BatchSink, PipelineError};

const THREAD_NAME: &str = "batch-accumulator";

/// Totals returned when the accumulator stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccumulatorReport {
    pub flushes: u64,
    pub records_flushed: u64,
    pub records_failed: u64,
}

pub struct BatchAccumulator<S> {
    queue: Arc<IntakeQueue>,
    sink: S,
    stats: Arc<Stats>,
    config: BatchConfig,
    buffer: BufferedBatch,
    report: AccumulatorReport,
    depth_warned: bool,
}

impl<S: BatchSink> BatchAccumulator<S> {
    pub fn new(queue: Arc<IntakeQueue>, sink: S, stats: Arc<Stats>, config: BatchConfig) -> Self {
        let buffer = BufferedBatch::new(config.max_records);
        Self {
            queue,
            sink,
            stats,
            config,
            buffer,
            report: AccumulatorReport::default(),
            depth_warned: false,
        }
    }

    pub fn spawn(self) -> Result<JoinHandle<AccumulatorReport>, PipelineError> {
        thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || self.run())
            .map_err(PipelineError::Spawn)
    }

    /// Consume the queue until it is closed and drained.
    pub fn run(mut self) -> AccumulatorReport {
        info!(
            max_records = self.config.max_records,
            max_age_ms = self.config.max_age.as_millis() as u64,
            poll_ms = self.config.poll_interval.as_millis() as u64,
            "batch accumulator started"
        );

        loop {
            match self.queue.dequeue(self.config.poll_interval) {
                Dequeue::Item(record) => self.buffer.push(record),
                Dequeue::Timeout => {}
                Dequeue::Closed => break,
            }

            self.check_depth();

            if let Some(reason) = self.buffer.should_flush(&self.config) {
                self.flush(reason);
            }
        }

        if !self.buffer.is_empty() {
            self.flush(FlushReason::Shutdown);
        }

        info!(
            flushes = self.report.flushes,
            records = self.report.records_flushed,
            failed = self.report.records_failed,
            "batch accumulator stopped"
        );
        self.report
    }

    fn flush(&mut self, reason: FlushReason) {
        let waited_ms = self.buffer.since_last_flush().as_millis() as u64;
        let batch = self.buffer.take();
        let batch_len = batch.len();

        let summary = self.sink.write_batch(batch);

        self.stats.record_written(summary.written);
        self.stats.record_errors(summary.failed);
        self.report.flushes += 1;
        self.report.records_flushed += summary.written;
        self.report.records_failed += summary.failed;

        counter!("sensor.batch.flushes", 1);
        histogram!("sensor.batch.records", batch_len as f64);
        if summary.has_failures() {
            counter!("sensor.batch.record_errors", summary.failed);
            for failed in summary.reports.iter().filter(|r| !r.succeeded()) {
                error!(
                    sink = %failed.sink,
                    records = failed.records,
                    error = failed.error.as_deref().unwrap_or_default(),
                    "dropped sink write for batch"
                );
            }
        }

        info!(
            reason = reason.as_str(),
            records = batch_len,
            written = summary.written,
            failed = summary.failed,
            waited_ms,
            "flushed batch"
        );
        for report in &summary.reports {
            debug!(sink = %report.sink, records = report.records, ok = report.succeeded(), "sink append");
        }
    }

    fn check_depth(&mut self) {
        let depth = self.queue.depth();
        if depth >= self.config.queue_warn_depth {
            if !self.depth_warned {
                warn!(
                    depth,
                    threshold = self.config.queue_warn_depth,
                    "intake queue is growing faster than it drains"
                );
                self.depth_warned = true;
            }
        } else if self.depth_warned && depth < self.config.queue_warn_depth / 2 {
            info!(depth, "intake queue depth back to normal");
            self.depth_warned = false;
        }
    }
}
