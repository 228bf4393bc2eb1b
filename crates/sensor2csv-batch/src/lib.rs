// sensor2csv-batch - Decouples producers from storage
//
// Producers validate and enqueue on their own thread; a single background
// thread drains the queue into batches and hands each batch to a sink.
// Flushes happen on whichever comes first: `max_records` buffered, or
// `max_age` elapsed since the previous flush with at least one record waiting.

use std::time::Duration;

use sensor2csv_core::{Batch, FlushSummary};

mod accumulator;
mod buffered_batch;
mod error;
mod pipeline;
mod queue;

pub use accumulator::{AccumulatorReport, BatchAccumulator};
pub use error::PipelineError;
pub use pipeline::IngestPipeline;
pub use queue::{Dequeue, IntakeQueue};

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub max_records: usize,
    pub max_age: Duration,
    /// Dequeue timeout; bounds how late an age-triggered flush can be.
    pub poll_interval: Duration,
    /// Queue depth above which the accumulator logs a warning.
    pub queue_warn_depth: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_records: 100,
            max_age: Duration::from_secs(1),
            poll_interval: Duration::from_millis(100),
            queue_warn_depth: 10_000,
        }
    }
}

/// Destination for completed batches.
///
/// Called only from the accumulator thread. Implementations report failures
/// in the summary instead of returning errors: a failed flush is counted and
/// dropped, never retried by the accumulator.
pub trait BatchSink: Send + 'static {
    fn write_batch(&mut self, batch: Batch) -> FlushSummary;
}
