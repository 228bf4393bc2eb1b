// Unbounded MPSC intake queue
//
// Many producers push, one consumer pops. Pushing takes the mutex just long
// enough to append, so producers never wait on storage. There is no capacity
// limit: under sustained overload memory grows and `depth()` reports it.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use sensor2csv_core::{Record, Stats};

/// Result of a bounded wait on the queue.
#[derive(Debug)]
pub enum Dequeue {
    Item(Record),
    Timeout,
    /// Queue is closed and fully drained.
    Closed,
}

#[derive(Debug, Default)]
struct QueueState {
    records: VecDeque<Record>,
    closed: bool,
}

#[derive(Debug)]
pub struct IntakeQueue {
    state: Mutex<QueueState>,
    available: Condvar,
    stats: Arc<Stats>,
}

impl IntakeQueue {
    pub fn new(stats: Arc<Stats>) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            available: Condvar::new(),
            stats,
        }
    }

    /// Append a record. Hands the record back if the queue is closed.
    pub fn enqueue(&self, record: Record) -> Result<(), Record> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(record);
        }
        // Counted under the lock so `queued` never trails what the consumer can see.
        self.stats.record_queued();
        state.records.push_back(record);
        drop(state);

        self.available.notify_one();
        Ok(())
    }

    /// Pop the oldest record, waiting up to `timeout` for one to arrive.
    pub fn dequeue(&self, timeout: Duration) -> Dequeue {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();

        loop {
            if let Some(record) = state.records.pop_front() {
                return Dequeue::Item(record);
            }
            if state.closed {
                return Dequeue::Closed;
            }
            if self.available.wait_until(&mut state, deadline).timed_out() {
                return match state.records.pop_front() {
                    Some(record) => Dequeue::Item(record),
                    None if state.closed => Dequeue::Closed,
                    None => Dequeue::Timeout,
                };
            }
        }
    }

    /// Stop accepting records. Already queued records stay dequeueable.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn depth(&self) -> usize {
        self.state.lock().records.len()
    }
}
