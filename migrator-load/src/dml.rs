//! Pure batched-DML statement builders. Kept free of `mysql_async::Tx` so
//! the placeholder/column-count invariants are checkable without a
//! database.

use migrator_errors::{MigratorError, MigratorResult};
use migrator_types::{UntypedRow, Value};

/// One statement plus its bound parameters, in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchedStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Builds one `{verb} INTO` statement per `batch_size`-sized chunk of
/// `rows`. Column order is taken from the first row of each batch; every
/// row in that batch must carry exactly that column set. `batch_size < 1`
/// behaves as 1.
pub fn build_batched_insert(table: &str, verb: &str, rows: &[UntypedRow], batch_size: usize) -> MigratorResult<Vec<BatchedStatement>> {
    if rows.is_empty() {
        return Err(MigratorError::Logic(format!("{verb} batch for `{table}` presented with no rows")));
    }
    let batch_size = batch_size.max(1);
    let mut statements = Vec::with_capacity(rows.len().div_ceil(batch_size));

    for chunk in rows.chunks(batch_size) {
        let columns: Vec<&String> = chunk[0].keys().collect();
        if columns.is_empty() {
            return Err(MigratorError::Logic(format!("{verb} batch for `{table}` presented with no columns")));
        }

        let mut params = Vec::with_capacity(chunk.len() * columns.len());
        let mut row_clauses = Vec::with_capacity(chunk.len());
        for row in chunk {
            let row_columns: Vec<&String> = row.keys().collect();
            if row_columns != columns {
                return Err(MigratorError::Logic(format!(
                    "{verb} batch for `{table}` has rows with differing column sets"
                )));
            }
            for column in &columns {
                params.push(row.get(column.as_str()).cloned().unwrap_or(Value::Null));
            }
            row_clauses.push(format!("({})", vec!["?"; columns.len()].join(", ")));
        }

        let column_list = columns.iter().map(|c| format!("`{c}`")).collect::<Vec<_>>().join(", ");
        let sql = format!("{verb} INTO `{table}` ({column_list}) VALUES {}", row_clauses.join(", "));

        statements.push(BatchedStatement { sql, params });
    }

    Ok(statements)
}

/// Builds one `DELETE` statement per row, with the `WHERE` clause built
/// from every column of that row. Not batched — one statement per row
/// regardless of `batch_size`.
pub fn build_batched_remove(table: &str, rows: &[UntypedRow]) -> MigratorResult<Vec<BatchedStatement>> {
    if rows.is_empty() {
        return Err(MigratorError::Logic(format!("REMOVE batch for `{table}` presented with no rows")));
    }
    let mut statements = Vec::with_capacity(rows.len());
    for row in rows {
        let columns: Vec<&String> = row.keys().collect();
        if columns.is_empty() {
            return Err(MigratorError::Logic(format!("REMOVE batch for `{table}` presented with no columns")));
        }
        let predicate = columns.iter().map(|c| format!("`{c}` = ?")).collect::<Vec<_>>().join(" AND ");
        let sql = format!("DELETE FROM `{table}` WHERE {predicate}");
        let params = columns.iter().map(|c| row.get(c.as_str()).cloned().unwrap_or(Value::Null)).collect();
        statements.push(BatchedStatement { sql, params });
    }
    Ok(statements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn row(pairs: &[(&str, i64)]) -> UntypedRow {
        pairs.iter().map(|(k, v)| (k.to_string(), Value::Integer(*v))).collect()
    }

    #[test]
    fn rejects_empty_input() {
        assert!(build_batched_insert("t1", "INSERT", &[], 100).is_err());
        assert!(build_batched_remove("t1", &[]).is_err());
    }

    #[test]
    fn batch_size_below_one_behaves_as_one() {
        let rows = vec![row(&[("id", 1)]), row(&[("id", 2)])];
        let statements = build_batched_insert("t1", "INSERT", &rows, 0).unwrap();
        assert_eq!(statements.len(), 2, "each row gets its own statement when batch_size clamps to 1");
    }

    #[test]
    fn rejects_rows_with_differing_column_sets() {
        let rows = vec![row(&[("id", 1), ("v", 2)]), row(&[("id", 3)])];
        assert!(build_batched_insert("t1", "INSERT", &rows, 10).is_err());
    }

    #[test]
    fn remove_builds_one_statement_per_row_with_all_columns_bound() {
        let rows = vec![row(&[("a", 1), ("b", 2)]), row(&[("a", 3), ("b", 4)])];
        let statements = build_batched_remove("t1", &rows).unwrap();
        assert_eq!(statements.len(), 2);
        for statement in &statements {
            assert_eq!(statement.params.len(), 2);
            assert_eq!(statement.sql, "DELETE FROM `t1` WHERE `a` = ? AND `b` = ?");
        }
    }

    proptest! {
        #[test]
        fn placeholder_count_matches_row_times_column_count(
            row_count in 1usize..20,
            column_count in 1usize..6,
            batch_size in 1usize..10,
        ) {
            let rows: Vec<UntypedRow> = (0..row_count)
                .map(|r| (0..column_count).map(|c| (format!("c{c}"), Value::Integer((r * 100 + c) as i64))).collect())
                .collect();
            let statements = build_batched_insert("t1", "INSERT", &rows, batch_size).unwrap();
            for statement in &statements {
                let placeholder_count = statement.sql.matches('?').count();
                prop_assert_eq!(placeholder_count, statement.params.len());
                prop_assert_eq!(placeholder_count % column_count, 0);
            }
            let total_placeholders: usize = statements.iter().map(|s| s.sql.matches('?').count()).sum();
            prop_assert_eq!(total_placeholders, row_count * column_count);
        }
    }
}
