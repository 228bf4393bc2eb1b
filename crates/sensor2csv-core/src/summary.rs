use serde::Serialize;

/// Outcome of one sink's bulk append for a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SinkReport {
    pub sink: String,
    /// Batch records eligible for this sink.
    pub records: usize,
    /// Set when the write was abandoned after retries.
    pub error: Option<String>,
}

impl SinkReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// What a flush achieved, in record units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlushSummary {
    pub batch_len: usize,
    pub reports: Vec<SinkReport>,
    /// Records whose every eligible sink write succeeded.
    pub written: u64,
    /// Records with at least one failed sink write, each counted once.
    pub failed: u64,
}

impl FlushSummary {
    pub fn report(&self, sink: &str) -> Option<&SinkReport> {
        self.reports.iter().find(|r| r.sink == sink)
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}
