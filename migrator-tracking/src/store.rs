use async_trait::async_trait;
use migrator_errors::{MigratorError, MigratorResult};
use mysql_async::prelude::*;
use mysql_async::{Pool, Row};
use tracing::{debug, instrument};

use crate::TrackingStatus;

/// Persists one [`TrackingStatus`] row per (source database, source table)
/// in the destination database.
#[async_trait]
pub trait TrackingStore: Send + Sync {
    /// Idempotently create the tracking table if it doesn't already exist.
    async fn create_if_missing(&self) -> MigratorResult<()>;

    /// Fetch the tracking row for `(source_database, source_table)`, or
    /// [`MigratorError::NotFound`] if none exists.
    async fn get(&self, source_database: &str, source_table: &str) -> MigratorResult<TrackingStatus>;

    /// Insert a brand-new tracking row. Fails with
    /// [`MigratorError::Configuration`] if `status` is incomplete.
    async fn insert_new(&self, status: &TrackingStatus) -> MigratorResult<()>;

    /// Update `sequential_position`, `timestamp_position` and `last_run` for
    /// an existing row, matching on `(source_database, source_table)`.
    async fn update(&self, status: &TrackingStatus) -> MigratorResult<()>;
}

/// The default [`TrackingStore`], backed by a table in the destination
/// MySQL database (`EtlPosition` by default).
pub struct MysqlTrackingStore {
    pool: Pool,
    table_name: String,
}

impl MysqlTrackingStore {
    /// Build a store over `pool`, persisting to `table_name`.
    pub fn new(pool: Pool, table_name: impl Into<String>) -> Self {
        Self {
            pool,
            table_name: table_name.into(),
        }
    }

    fn quoted_table(&self) -> String {
        format!("`{}`", self.table_name)
    }

    fn row_to_status(row: Row) -> TrackingStatus {
        let (source_database, source_table, column_name, sequential_position, timestamp_position, last_run) =
            mysql_async::from_row(row);
        TrackingStatus {
            source_database,
            source_table,
            column_name,
            sequential_position,
            timestamp_position,
            last_run,
        }
    }
}

#[async_trait]
impl TrackingStore for MysqlTrackingStore {
    #[instrument(skip(self))]
    async fn create_if_missing(&self) -> MigratorResult<()> {
        let mut conn = self.pool.get_conn().await?;
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {table} (\
                sourceDatabase VARCHAR(100) NOT NULL DEFAULT '', \
                sourceTable VARCHAR(100) NOT NULL DEFAULT '', \
                columnName VARCHAR(100) NOT NULL DEFAULT '', \
                sequentialPosition BIGINT NOT NULL DEFAULT 0, \
                timestampPosition TIMESTAMP NULL DEFAULT NULL, \
                lastRun TIMESTAMP NULL DEFAULT NULL, \
                PRIMARY KEY (sourceDatabase, sourceTable) \
            )",
            table = self.quoted_table()
        );
        conn.query_drop(ddl).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, source_database: &str, source_table: &str) -> MigratorResult<TrackingStatus> {
        let mut conn = self.pool.get_conn().await?;
        let query = format!(
            "SELECT sourceDatabase, sourceTable, columnName, sequentialPosition, timestampPosition, lastRun \
             FROM {table} WHERE sourceDatabase = ? AND sourceTable = ? LIMIT 1",
            table = self.quoted_table()
        );
        let row: Option<Row> = conn.exec_first(query, (source_database, source_table)).await?;
        match row {
            Some(row) => Ok(Self::row_to_status(row)),
            None => Err(MigratorError::NotFound {
                source_database: source_database.to_string(),
                source_table: source_table.to_string(),
            }),
        }
    }

    #[instrument(skip(self, status))]
    async fn insert_new(&self, status: &TrackingStatus) -> MigratorResult<()> {
        if !status.is_complete() {
            return Err(MigratorError::Configuration(
                "unable to write incomplete tracking status record".to_string(),
            ));
        }
        debug!(source_database = %status.source_database, source_table = %status.source_table, "inserting new tracking row");
        let mut conn = self.pool.get_conn().await?;
        let query = format!(
            "INSERT INTO {table} (sourceDatabase, sourceTable, columnName, sequentialPosition, timestampPosition, lastRun) \
             VALUES (?, ?, ?, ?, ?, ?)",
            table = self.quoted_table()
        );
        conn.exec_drop(
            query,
            (
                &status.source_database,
                &status.source_table,
                &status.column_name,
                status.sequential_position,
                status.timestamp_position,
                status.last_run,
            ),
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self, status))]
    async fn update(&self, status: &TrackingStatus) -> MigratorResult<()> {
        let mut conn = self.pool.get_conn().await?;
        let query = format!(
            "UPDATE {table} SET sequentialPosition = ?, timestampPosition = ?, lastRun = ? \
             WHERE sourceDatabase = ? AND sourceTable = ?",
            table = self.quoted_table()
        );
        conn.exec_drop(
            query,
            (
                status.sequential_position,
                status.timestamp_position,
                status.last_run,
                &status.source_database,
                &status.source_table,
            ),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_table_wraps_in_backticks() {
        let store = MysqlTrackingStore::new(
            Pool::new("mysql://localhost/doesnotmatter"),
            "EtlPosition",
        );
        assert_eq!(store.quoted_table(), "`EtlPosition`");
    }
}
