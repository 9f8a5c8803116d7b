use migrator_errors::MigratorResult;
use migrator_types::{Method, Parameters, RowOp, TableData};

use crate::Transformer;

/// Wraps the batch as a single [`TableData`] unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTransformer;

impl Transformer for DefaultTransformer {
    fn transform(&self, dest_db: &str, dest_table: &str, rows: Vec<RowOp>, params: &Parameters) -> MigratorResult<Vec<TableData>> {
        Ok(vec![TableData {
            dest_db: dest_db.to_string(),
            dest_table: dest_table.to_string(),
            rows,
            default_method: params.method.unwrap_or(Method::Insert),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migrator_types::UntypedRow;

    #[test]
    fn wraps_rows_as_a_single_table_data() {
        let rows = vec![RowOp::new(Method::Insert, UntypedRow::new())];
        let params = Parameters {
            method: Some(Method::Replace),
            ..Parameters::default()
        };
        let out = DefaultTransformer.transform("db", "t1", rows, &params).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].dest_db, "db");
        assert_eq!(out[0].dest_table, "t1");
        assert_eq!(out[0].default_method, Method::Replace);
    }

    #[test]
    fn defaults_method_to_insert_when_unset() {
        let out = DefaultTransformer.transform("db", "t1", Vec::new(), &Parameters::default()).unwrap();
        assert_eq!(out[0].default_method, Method::Insert);
    }
}
