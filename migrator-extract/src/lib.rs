//! Extractor strategies: pluggable functions that turn a per-table cursor
//! into a bounded batch of rows plus the next cursor.
//!
//! Each extractor returns `Ok(ExtractOutcome)` even for the "soft failure"
//! case of a watermark column of the wrong type: the outcome simply
//! carries `more = false` and an unchanged tracking status, which the
//! worker loop treats as "skip this tick". Only genuine transient
//! database errors are returned as `Err`.

mod queue;
mod row_scan;
mod sequential;
mod timestamp;

use async_trait::async_trait;
use migrator_errors::MigratorResult;
use migrator_tracking::TrackingStatus;
use migrator_types::{Parameters, RowOp};
use mysql_async::Pool;

pub use queue::QueueExtractor;
pub use sequential::SequentialExtractor;
pub use timestamp::TimestampExtractor;

/// The name of the auxiliary source-side table the queue extractor drains.
pub const RECORD_QUEUE_TABLE: &str = "MigratorRecordQueue";

/// The result of one extractor call, with any database error folded into
/// the outer `Result` instead of carried as a field.
#[derive(Debug, Clone)]
pub struct ExtractOutcome {
    /// Whether a full batch was read, meaning another tick should run
    /// immediately rather than sleeping.
    pub more: bool,
    /// The rows extracted this tick.
    pub rows: Vec<RowOp>,
    /// The watermark to persist. Equal to the input tracking status when
    /// nothing advanced (no rows, or a soft failure).
    pub new_tracking: TrackingStatus,
}

/// A pluggable strategy that reads a bounded batch of changed rows from the
/// source table, given the current watermark.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extract up to `params.batch_size` rows newer than `tracking`'s
    /// watermark.
    async fn extract(
        &self,
        source: &Pool,
        source_database: &str,
        source_table: &str,
        tracking: &TrackingStatus,
        params: &mut Parameters,
    ) -> MigratorResult<ExtractOutcome>;
}

/// Resolve a configured extractor name to an implementation. Returns `None`
/// for an unrecognised name, which callers must treat as a fatal
/// configuration error.
pub fn resolve(name: &str) -> Option<Box<dyn Extractor>> {
    match name {
        "sequential" => Some(Box::new(SequentialExtractor)),
        "timestamp" => Some(Box::new(TimestampExtractor::new(false))),
        "timestamp_fallback" => Some(Box::new(TimestampExtractor::new(true))),
        "queue" => Some(Box::new(QueueExtractor)),
        _ => None,
    }
}
