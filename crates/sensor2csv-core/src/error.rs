use thiserror::Error;

/// Errors a producer can observe synchronously when submitting a record.
///
/// Storage failures never surface here; they happen after the record is
/// queued and are only visible through the `errors` counter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// Payload was empty, not JSON, not an object, or carried a non-scalar field.
    #[error("invalid payload: {reason}")]
    InvalidPayload { reason: String },

    /// Pipeline is shutting down and no longer accepts records.
    #[error("pipeline is shutting down; record was not accepted")]
    PipelineClosed,
}

impl IngestError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            reason: reason.into(),
        }
    }

    /// Stable error type string for transport responses.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidPayload { .. } => "InvalidPayload",
            Self::PipelineClosed => "PipelineClosed",
        }
    }
}
