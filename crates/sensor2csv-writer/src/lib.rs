//! Sink router for sensor batches
//!
//! Each flushed batch is fanned out to a raw JSON Lines log and to the CSV
//! tables whose signature fields the records carry. Appends go through a
//! [`SinkStorage`] so tests can inject failures.

mod encoding;
mod error;
mod router;
mod storage;

pub use encoding::{encode_csv_header, encode_csv_rows, encode_json_lines};
pub use error::{ErrorCode, Result, WriterError};
pub use router::{RetryPolicy, SinkFiles, SinkFormat, SinkRouter, SinkSpec, RAW_LOG_SINK};
pub use storage::{FsStorage, SinkStorage};

// Re-export commonly used types for convenience
pub use sensor2csv_core;
