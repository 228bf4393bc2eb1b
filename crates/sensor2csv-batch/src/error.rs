use thiserror::Error;

/// Failures managing the accumulator thread itself.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to spawn batch accumulator thread")]
    Spawn(#[source] std::io::Error),

    #[error("batch accumulator thread panicked; buffered records were lost")]
    WorkerPanicked,

    #[error("pipeline already shut down")]
    AlreadyShutDown,
}
