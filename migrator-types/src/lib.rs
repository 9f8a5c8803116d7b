//! The shared data model for the migrator replication engine: the row
//! representation extractors produce, the per-row DML method, the table
//! batch loaders consume, and the typed parameter bag passed through a tick.

mod parameters;
mod row;
mod value;

pub use parameters::Parameters;
pub use row::{Method, RowOp, TableData, UntypedRow};
pub use value::Value;

/// `BatchSize`/`InsertBatchSize` values below 1 behave as 1. Centralised
/// here since both the extractors and the loader apply it.
pub fn clamp_batch_size(requested: usize) -> usize {
    requested.max(1)
}
