// sensor2csv-core - Record model shared by every pipeline stage
//
// Pure types and functions: no threads, no I/O.
// - record: validated, immutable sensor readings and batches
// - validate: payload normalization and receipt timestamping
// - schema: sink declarations and field-presence routing
// - stats: process-wide ingestion counters
// - summary: per-flush outcome reported by the sink router

mod error;
pub mod record;
pub mod schema;
pub mod stats;
pub mod summary;
pub mod validate;

pub use error::IngestError;
pub use record::{Batch, FieldValue, Record};
pub use schema::{Eligibility, TableSchema, ANALOG, ENVIRONMENTAL};
pub use stats::{Stats, StatsSnapshot};
pub use summary::{FlushSummary, SinkReport};
pub use validate::{validate, validate_at};
