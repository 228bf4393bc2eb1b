// Ingestion entry point shared by all producers
//
// submit() = validate + enqueue; it never touches storage. Success means the
// record is queued, not that it is durable.

use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;
use sensor2csv_core::{validate, IngestError, Record, Stats, StatsSnapshot};
use tracing::info;

use crate::accumulator::{AccumulatorReport, BatchAccumulator};
use crate::queue::IntakeQueue;
use crate::{BatchConfig, BatchSink, PipelineError};

/// Thread-safe handle shared across request handlers.
pub struct IngestPipeline {
    queue: Arc<IntakeQueue>,
    stats: Arc<Stats>,
    worker: Mutex<Option<JoinHandle<AccumulatorReport>>>,
}

impl IngestPipeline {
    /// Start the accumulator thread writing into `sink`.
    pub fn start<S: BatchSink>(config: BatchConfig, sink: S) -> Result<Self, PipelineError> {
        Self::start_with_stats(config, sink, Arc::new(Stats::new()))
    }

    /// Start with caller-owned counters.
    pub fn start_with_stats<S: BatchSink>(
        config: BatchConfig,
        sink: S,
        stats: Arc<Stats>,
    ) -> Result<Self, PipelineError> {
        let queue = Arc::new(IntakeQueue::new(Arc::clone(&stats)));
        let worker =
            BatchAccumulator::new(Arc::clone(&queue), sink, Arc::clone(&stats), config).spawn()?;

        Ok(Self {
            queue,
            stats,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Validate a raw payload and queue it.
    pub fn submit(&self, payload: &[u8]) -> Result<Record, IngestError> {
        let record = validate(payload)?;
        self.submit_record(record.clone())?;
        Ok(record)
    }

    /// Queue an already validated record.
    pub fn submit_record(&self, record: Record) -> Result<(), IngestError> {
        self.stats.record_received();
        self.queue
            .enqueue(record)
            .map_err(|_| IngestError::PipelineClosed)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot(self.queue.depth())
    }

    pub fn is_accepting(&self) -> bool {
        !self.queue.is_closed()
    }

    /// Stop intake, wait for the accumulator to drain the queue and flush.
    pub fn shutdown(&self) -> Result<AccumulatorReport, PipelineError> {
        self.queue.close();
        let handle = self
            .worker
            .lock()
            .take()
            .ok_or(PipelineError::AlreadyShutDown)?;

        info!(pending = self.queue.depth(), "draining intake queue");
        handle.join().map_err(|_| PipelineError::WorkerPanicked)
    }
}

impl Drop for IngestPipeline {
    fn drop(&mut self) {
        if self.worker.lock().is_some() {
            let _ = self.shutdown();
        }
    }
}
