//! Pure row-scanning helpers shared by the three extractors. Kept free of
//! `mysql_async::Pool`/`Conn` so the watermark-folding logic — the part with
//! actual edge cases — is unit-testable without a database.

use chrono::NaiveDateTime;
use migrator_types::{Method, RowOp, UntypedRow, Value};

/// Converts one scanned row into an [`UntypedRow`], preserving column
/// order.
pub fn row_from_mysql(mut row: mysql_async::Row) -> UntypedRow {
    let columns = row.columns();
    let names: Vec<String> = columns
        .as_deref()
        .map(|cols| cols.iter().map(|c| c.name_str().into_owned()).collect())
        .unwrap_or_default();
    let mut out = UntypedRow::with_capacity(names.len());
    for (idx, name) in names.into_iter().enumerate() {
        let value = row.take::<mysql_async::Value, usize>(idx).unwrap_or(mysql_async::Value::NULL);
        out.insert(name, Value::from(value));
    }
    out
}

/// Tags every row with `method` and folds `column` to its running maximum
/// integer value. Stops at the first row whose column isn't an integer,
/// returning everything collected so far (including that row) as `Err` — the
/// sequential extractor's soft-failure path.
///
/// `rows` must be non-empty; the caller already special-cases the
/// zero-rows "no more data" outcome before reaching here.
pub fn fold_sequential(rows: Vec<UntypedRow>, column: &str, method: Method) -> Result<(Vec<RowOp>, i64), Vec<RowOp>> {
    let mut ops = Vec::with_capacity(rows.len());
    let mut max: Option<i64> = None;
    for row in rows {
        let seq = row.get(column).and_then(Value::as_integer);
        match seq {
            Some(seq) => {
                max = Some(max.map_or(seq, |m: i64| m.max(seq)));
                ops.push(RowOp::new(method, row));
            }
            None => {
                ops.push(RowOp::new(method, row));
                return Err(ops);
            }
        }
    }
    Ok((ops, max.expect("rows is non-empty")))
}

/// Same shape as [`fold_sequential`] for the timestamp extractors. When
/// `fallback_column` is `Some`, the watermark value for each row is
/// `COALESCE(column, fallback_column)`, matching the query the fallback
/// variant runs.
pub fn fold_timestamp(
    rows: Vec<UntypedRow>,
    column: &str,
    fallback_column: Option<&str>,
    method: Method,
) -> Result<(Vec<RowOp>, NaiveDateTime), Vec<RowOp>> {
    let mut ops = Vec::with_capacity(rows.len());
    let mut max: Option<NaiveDateTime> = None;
    for row in rows {
        let value = match (row.get(column), fallback_column) {
            (Some(Value::Null) | None, Some(fallback)) => row.get(fallback),
            (primary, _) => primary,
        };
        let ts = value.and_then(Value::as_timestamp);
        match ts {
            Some(ts) => {
                max = Some(max.map_or(ts, |m: NaiveDateTime| m.max(ts)));
                ops.push(RowOp::new(method, row));
            }
            None => {
                ops.push(RowOp::new(method, row));
                return Err(ops);
            }
        }
    }
    Ok((ops, max.expect("rows is non-empty")))
}

/// Splits comma-separated `pkColumn`/`pkValue` lists into ordered
/// `(column, value)` pairs, rejecting a length mismatch.
pub fn split_pk(pk_column: &str, pk_value: &str) -> Result<Vec<(String, String)>, ()> {
    let cols: Vec<&str> = pk_column.split(',').collect();
    let vals: Vec<&str> = pk_value.split(',').collect();
    if cols.len() != vals.len() {
        return Err(());
    }
    Ok(cols.into_iter().zip(vals).map(|(c, v)| (c.to_string(), v.to_string())).collect())
}
