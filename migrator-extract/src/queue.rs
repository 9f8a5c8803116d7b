use async_trait::async_trait;
use chrono::Utc;
use migrator_errors::{MigratorError, MigratorResult};
use migrator_tracking::TrackingStatus;
use migrator_types::{Method, Parameters, RowOp, UntypedRow, Value};
use mysql_async::prelude::*;
use mysql_async::{Conn, Pool};
use tracing::{debug, instrument, warn};

use crate::row_scan::{row_from_mysql, split_pk};
use crate::{ExtractOutcome, Extractor, RECORD_QUEUE_TABLE};

/// Drains `MigratorRecordQueue`, turning each entry into a REMOVE or REPLACE
/// `RowOp`. The watermark (`sequential_position`) is never touched by this
/// extractor — the queue itself is the position.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueueExtractor;

#[async_trait]
impl Extractor for QueueExtractor {
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
        let mut conn = source.get_conn().await?;

        let query = format!(
            "SELECT pkColumn, pkValue, method FROM `{table}` \
             WHERE sourceDatabase = ? AND sourceTable = ? ORDER BY timestampUpdated LIMIT ?",
            table = RECORD_QUEUE_TABLE,
        );
        let entries: Vec<(String, String, String)> =
            conn.exec(query, (source_database, source_table, batch_size as u64)).await?;
        let entries_count = entries.len();

        if entries_count == 0 {
            return Ok(ExtractOutcome {
                more: false,
                rows: Vec::new(),
                new_tracking: tracking.clone(),
            });
        }

        let mut row_ops = Vec::with_capacity(entries_count);
        for (pk_column, pk_value, method) in entries {
            if method.eq_ignore_ascii_case("REMOVE") {
                let row = build_pk_row(&pk_column, &pk_value)?;
                row_ops.push(RowOp::new(Method::Remove, row));
            } else {
                match lookup_current_row(&mut conn, source_table, &pk_column, &pk_value).await? {
                    Some(row) => row_ops.push(RowOp::new(Method::Replace, row)),
                    None => debug!(
                        source_database,
                        source_table,
                        pk_value = %pk_value,
                        "queue entry's row no longer exists in source; dropping"
                    ),
                }
            }

            // Queue-entry deletion happens here, after the row is in the
            // output batch but before the destination load — a process
            // crash between this and the load's commit loses the row.
            // Accepted best-effort limitation.
            if let Err(err) = delete_entry(&mut conn, source_database, source_table, &pk_column, &pk_value).await {
                warn!(error = %err, pk_column, pk_value, "failed to remove processed queue entry");
            }
        }

        params.method = Some(Method::Replace);

        let mut new_tracking = tracking.clone();
        new_tracking.last_run = Some(Utc::now().naive_utc());

        Ok(ExtractOutcome {
            more: entries_count == batch_size,
            rows: row_ops,
            new_tracking,
        })
    }
}

fn build_pk_row(pk_column: &str, pk_value: &str) -> MigratorResult<UntypedRow> {
    let pairs = split_pk(pk_column, pk_value).map_err(|()| mismatch_error(pk_column, pk_value))?;
    let mut row = UntypedRow::new();
    for (col, val) in pairs {
        row.insert(col, Value::Text(val));
    }
    Ok(row)
}

async fn lookup_current_row(
    conn: &mut Conn,
    table: &str,
    pk_column: &str,
    pk_value: &str,
) -> MigratorResult<Option<UntypedRow>> {
    let pairs = split_pk(pk_column, pk_value).map_err(|()| mismatch_error(pk_column, pk_value))?;
    let predicate = pairs.iter().map(|(col, _)| format!("`{col}` = ?")).collect::<Vec<_>>().join(" AND ");
    let query = format!("SELECT * FROM `{table}` WHERE {predicate} LIMIT 1");
    let bind_values: Vec<String> = pairs.into_iter().map(|(_, v)| v).collect();
    let row: Option<mysql_async::Row> = conn.exec_first(query, bind_values).await?;
    Ok(row.map(row_from_mysql))
}

async fn delete_entry(
    conn: &mut Conn,
    source_database: &str,
    source_table: &str,
    pk_column: &str,
    pk_value: &str,
) -> MigratorResult<()> {
    let query = format!(
        "DELETE FROM `{table}` WHERE sourceDatabase = ? AND sourceTable = ? AND pkColumn = ? AND pkValue = ? LIMIT 1",
        table = RECORD_QUEUE_TABLE,
    );
    conn.exec_drop(query, (source_database, source_table, pk_column, pk_value)).await?;
    Ok(())
}

fn mismatch_error(pk_column: &str, pk_value: &str) -> MigratorError {
    MigratorError::Data(format!(
        "queue entry pkColumn/pkValue length mismatch: {pk_column:?} vs {pk_value:?}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_pk_row_handles_single_column() {
        let row = build_pk_row("id", "7").unwrap();
        assert_eq!(row.get("id"), Some(&Value::Text("7".to_string())));
    }

    #[test]
    fn build_pk_row_handles_composite_key() {
        let row = build_pk_row("a,b", "1,2").unwrap();
        assert_eq!(row.get("a"), Some(&Value::Text("1".to_string())));
        assert_eq!(row.get("b"), Some(&Value::Text("2".to_string())));
    }

    #[test]
    fn build_pk_row_rejects_length_mismatch() {
        assert!(build_pk_row("a,b", "1").is_err());
    }
}
