//! The default Loader: groups a batch's rows by DML method, opens a
//! transaction per destination table, issues batched DML, and rolls back
//! atomically on any error.

mod dml;

use std::collections::HashMap;

use async_trait::async_trait;
use migrator_errors::MigratorResult;
use migrator_types::{Method, Parameters, TableData, UntypedRow};
use mysql_async::prelude::*;
use mysql_async::{Pool, TxOpts, Value as MyValue};
use tracing::{debug, instrument, warn};

pub use dml::{build_batched_insert, build_batched_remove, BatchedStatement};

/// Writes a batch of [`TableData`] to the destination pool.
#[async_trait]
pub trait Loader: Send + Sync {
    /// Load every `TableData` in `tables`, one transaction per table. On
    /// the first DML error the transaction for that table is rolled back
    /// and the error is returned immediately — remaining tables are not
    /// attempted.
    async fn load(&self, dest: &Pool, tables: &[TableData], params: &Parameters) -> MigratorResult<()>;
}

/// The only Loader variant the core ships.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLoader;

#[async_trait]
impl Loader for DefaultLoader {
    #[instrument(skip(self, dest, tables, params))]
    async fn load(&self, dest: &Pool, tables: &[TableData], params: &Parameters) -> MigratorResult<()> {
        let batch_size = params.effective_insert_batch_size();

        for table in tables {
            if table.rows.is_empty() {
                debug!(dest_table = %table.dest_table, "empty batch, skipping without opening a transaction");
                continue;
            }

            let mut by_method: HashMap<Method, Vec<UntypedRow>> = HashMap::new();
            for row_op in &table.rows {
                by_method.entry(row_op.method).or_default().push(row_op.row.clone());
            }

            let mut conn = dest.get_conn().await?;
            let mut tx = conn.start_transaction(TxOpts::default()).await?;

            for (method, rows) in by_method {
                let statements = match method {
                    Method::Insert => dml::build_batched_insert(&table.dest_table, "INSERT", &rows, batch_size),
                    Method::Replace => dml::build_batched_insert(&table.dest_table, "REPLACE", &rows, batch_size),
                    Method::Remove => dml::build_batched_remove(&table.dest_table, &rows),
                };
                let statements = match statements {
                    Ok(statements) => statements,
                    Err(err) => {
                        warn!(error = %err, dest_table = %table.dest_table, "rolling back transaction");
                        tx.rollback().await?;
                        return Err(err);
                    }
                };

                for statement in statements {
                    let bound: Vec<MyValue> = statement.params.iter().map(MyValue::from).collect();
                    if let Err(err) = tx.exec_drop(statement.sql, bound).await {
                        warn!(error = %err, dest_table = %table.dest_table, "rolling back transaction");
                        tx.rollback().await?;
                        return Err(err.into());
                    }
                }
            }

            tx.commit().await?;
        }

        Ok(())
    }
}
