use migrator_errors::MigratorResult;
use migrator_types::{Method, Parameters, RowOp, TableData};
use tracing::debug;

use crate::Transformer;

/// Retargets the destination table to `params.table_name` when set,
/// otherwise retains the extractor's table name.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableRenamerTransformer;

impl Transformer for TableRenamerTransformer {
    fn transform(&self, dest_db: &str, dest_table: &str, rows: Vec<RowOp>, params: &Parameters) -> MigratorResult<Vec<TableData>> {
        let dest_table = match &params.table_name {
            Some(name) => name.clone(),
            None => {
                debug!(dest_table, "TableName parameter not set, retaining original table name");
                dest_table.to_string()
            }
        };
        Ok(vec![TableData {
            dest_db: dest_db.to_string(),
            dest_table,
            rows,
            default_method: params.method.unwrap_or(Method::Insert),
        }])
    }
}
