use async_trait::async_trait;
use chrono::Utc;
use migrator_errors::{MigratorError, MigratorResult};
use migrator_tracking::TrackingStatus;
use migrator_types::{Method, Parameters};
use mysql_async::prelude::*;
use mysql_async::Pool;
use tracing::{instrument, warn};

use crate::row_scan::{fold_timestamp, row_from_mysql};
use crate::{ExtractOutcome, Extractor};

/// Drives a `DATETIME`/`TIMESTAMP` column, with an optional two-column
/// `COALESCE` fallback. The plain and fallback variants differ only in how
/// `tracking.column_name` is parsed and in whether `only_past` applies, so
/// one struct covers both (`"timestamp"` / `"timestamp_fallback"` in the
/// registry, see [`crate::resolve`]).
#[derive(Debug, Clone, Copy)]
pub struct TimestampExtractor {
    fallback: bool,
}

impl TimestampExtractor {
    /// `fallback = true` parses `tracking.column_name` as `"a,b"` and
    /// queries `COALESCE(a,b)`; `fallback = false` uses it as a single
    /// column name.
    pub fn new(fallback: bool) -> Self {
        Self { fallback }
    }
}

#[async_trait]
impl Extractor for TimestampExtractor {
    #[instrument(skip(self, source, tracking, params), fields(source_database, source_table))]
    async fn extract(
        &self,
        source: &Pool,
        source_database: &str,
        source_table: &str,
        tracking: &TrackingStatus,
        params: &mut Parameters,
    ) -> MigratorResult<ExtractOutcome> {
        let batch_size = params.effective_batch_size();

        let (primary_column, fallback_column) = if self.fallback {
            let mut parts = tracking.column_name.splitn(2, ',');
            let a = parts.next().unwrap_or("").trim();
            let b = parts.next().map(str::trim).unwrap_or("");
            if a.is_empty() || b.is_empty() {
                return Err(MigratorError::Data(format!(
                    "timestamp_fallback extractor requires two comma-separated columns, got {:?}",
                    tracking.column_name
                )));
            }
            (a.to_string(), Some(b.to_string()))
        } else {
            (tracking.column_name.clone(), None)
        };

        let query = match (&fallback_column, params.only_past) {
            (Some(fallback), true) => format!(
                "SELECT * FROM `{table}` WHERE COALESCE(`{primary}`,`{fallback}`) > ? \
                 AND COALESCE(`{primary}`,`{fallback}`) <= NOW() LIMIT ?",
                table = source_table,
            ),
            (Some(fallback), false) => format!(
                "SELECT * FROM `{table}` WHERE COALESCE(`{primary}`,`{fallback}`) > ? LIMIT ?",
                table = source_table,
            ),
            (None, true) => format!(
                "SELECT * FROM `{table}` WHERE `{primary}` > ? AND `{primary}` <= NOW() LIMIT ?",
                table = source_table,
            ),
            (None, false) => format!(
                "SELECT * FROM `{table}` WHERE `{primary}` > ? LIMIT ?",
                table = source_table,
            ),
        };

        let floor = tracking.timestamp_floor();
        let mut conn = source.get_conn().await?;
        let rows: Vec<mysql_async::Row> = conn.exec(query, (floor, batch_size as u64)).await?;
        let count = rows.len();
        if count == 0 {
            return Ok(ExtractOutcome {
                more: false,
                rows: Vec::new(),
                new_tracking: tracking.clone(),
            });
        }

        let untyped = rows.into_iter().map(row_from_mysql).collect();
        let (row_ops, max) = match fold_timestamp(untyped, &primary_column, fallback_column.as_deref(), Method::Replace) {
            Ok(pair) => pair,
            Err(partial) => {
                warn!(
                    source_database,
                    source_table,
                    column = %tracking.column_name,
                    "timestamp watermark column is not a timestamp; soft failure, watermark untouched"
                );
                return Ok(ExtractOutcome {
                    more: false,
                    rows: partial,
                    new_tracking: tracking.clone(),
                });
            }
        };

        params.method = Some(Method::Replace);

        let mut new_tracking = tracking.clone();
        new_tracking.timestamp_position = Some(max);
        new_tracking.last_run = Some(Utc::now().naive_utc());

        Ok(ExtractOutcome {
            more: count == batch_size,
            rows: row_ops,
            new_tracking,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_requires_two_comma_separated_columns() {
        // Exercised indirectly via `extract`'s parsing branch through a
        // unit-level check of the same split logic, since `extract` itself
        // needs a live pool.
        let column_name = "single_column".to_string();
        let mut parts = column_name.splitn(2, ',');
        let a = parts.next().unwrap_or("").trim();
        let b = parts.next().map(str::trim).unwrap_or("");
        assert!(a.is_empty() || b.is_empty());
    }
}
