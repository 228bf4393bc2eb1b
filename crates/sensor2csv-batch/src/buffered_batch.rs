// Buffered batch accumulation logic
//
// Owned by the accumulator thread alone, so no locking.

use std::mem;
use std::time::{Duration, Instant};

use sensor2csv_core::{Batch, Record};

use crate::BatchConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FlushReason {
    Size,
    Age,
    Shutdown,
}

impl FlushReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlushReason::Size => "size",
            FlushReason::Age => "age",
            FlushReason::Shutdown => "shutdown",
        }
    }
}

#[derive(Debug)]
pub(crate) struct BufferedBatch {
    records: Vec<Record>,
    capacity: usize,
    last_flush: Instant,
}

impl BufferedBatch {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            capacity,
            last_flush: Instant::now(),
        }
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn since_last_flush(&self) -> Duration {
        self.last_flush.elapsed()
    }

    pub fn should_flush(&self, cfg: &BatchConfig) -> Option<FlushReason> {
        if self.records.len() >= cfg.max_records {
            Some(FlushReason::Size)
        } else if !self.records.is_empty() && self.last_flush.elapsed() >= cfg.max_age {
            Some(FlushReason::Age)
        } else {
            None
        }
    }

    /// Hand out the buffered records and restart the flush clock.
    pub fn take(&mut self) -> Batch {
        self.last_flush = Instant::now();
        Batch::new(mem::replace(
            &mut self.records,
            Vec::with_capacity(self.capacity),
        ))
    }
}
