use async_trait::async_trait;
use chrono::Utc;
use migrator_errors::MigratorResult;
use migrator_tracking::TrackingStatus;
use migrator_types::{Method, Parameters};
use mysql_async::prelude::*;
use mysql_async::Pool;
use tracing::{instrument, warn};

use crate::row_scan::{fold_sequential, row_from_mysql};
use crate::{ExtractOutcome, Extractor};

/// Drives a monotonic integer column.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialExtractor;

#[async_trait]
impl Extractor for SequentialExtractor {
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
        let query = format!(
            "SELECT * FROM `{table}` WHERE `{column}` > ? LIMIT ?",
            table = source_table,
            column = tracking.column_name,
        );
        let mut conn = source.get_conn().await?;
        let rows: Vec<mysql_async::Row> = conn.exec(query, (tracking.sequential_position, batch_size as u64)).await?;
        let count = rows.len();
        if count == 0 {
            return Ok(ExtractOutcome {
                more: false,
                rows: Vec::new(),
                new_tracking: tracking.clone(),
            });
        }

        let method = if params.sequential_replace { Method::Replace } else { Method::Insert };
        let untyped = rows.into_iter().map(row_from_mysql).collect();

        let (row_ops, max) = match fold_sequential(untyped, &tracking.column_name, method) {
            Ok(pair) => pair,
            Err(partial) => {
                warn!(
                    source_database,
                    source_table,
                    column = %tracking.column_name,
                    "sequential watermark column is not an integer; soft failure, watermark untouched"
                );
                return Ok(ExtractOutcome {
                    more: false,
                    rows: partial,
                    new_tracking: tracking.clone(),
                });
            }
        };

        params.method = Some(method);

        let mut new_tracking = tracking.clone();
        new_tracking.sequential_position = max;
        new_tracking.last_run = Some(Utc::now().naive_utc());

        Ok(ExtractOutcome {
            more: count == batch_size,
            rows: row_ops,
            new_tracking,
        })
    }
}
