use std::time::{Duration, Instant};

use migrator_errors::MigratorResult;
use migrator_types::{Method, Parameters, RowOp, TableData, UntypedRow, Value};
use rhai::{Array, Dynamic, Engine, Map, Scope};
use tracing::warn;

use crate::Transformer;

/// Default hard time budget when a scripted transformer is configured
/// without an explicit `Timeout`.
const DEFAULT_SCRIPT_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs a user-supplied `rhai` script against the batch under a hard time
/// budget, bound to a `rows` variable the script may mutate in place. The
/// deadline is enforced cooperatively via `Engine::on_progress`, which the
/// interpreter polls between operations. On timeout, or any script error,
/// the batch passes through unchanged.
pub struct ScriptTransformer {
    source: String,
}

impl ScriptTransformer {
    /// Build a transformer that evaluates `source` on every tick.
    pub fn new(source: impl Into<String>) -> Self {
        Self { source: source.into() }
    }
}

impl Transformer for ScriptTransformer {
    fn transform(&self, dest_db: &str, dest_table: &str, rows: Vec<RowOp>, params: &Parameters) -> MigratorResult<Vec<TableData>> {
        let timeout = params.timeout.unwrap_or(DEFAULT_SCRIPT_TIMEOUT);
        let method = params.method.unwrap_or(Method::Insert);
        let deadline = Instant::now() + timeout;

        let mut engine = Engine::new();
        engine.on_progress(move |_ops| if Instant::now() >= deadline { Some(Dynamic::UNIT) } else { None });

        let mut scope = Scope::new();
        scope.push("rows", rows_to_rhai(&rows));
        scope.push("table_name", dest_table.to_string());

        let transformed = match engine.eval_with_scope::<Dynamic>(&mut scope, &self.source) {
            Ok(_) => scope.get_value::<Array>("rows").map(|array| rhai_to_rows(array, method)),
            Err(err) => {
                warn!(error = %err, "script transformer: timed out or failed, passing batch through unchanged");
                None
            }
        };

        Ok(vec![TableData {
            dest_db: dest_db.to_string(),
            dest_table: dest_table.to_string(),
            rows: transformed.unwrap_or(rows),
            default_method: method,
        }])
    }
}

fn rows_to_rhai(rows: &[RowOp]) -> Array {
    rows.iter()
        .map(|op| {
            let mut map = Map::new();
            for (column, value) in &op.row {
                map.insert(column.as_str().into(), value_to_rhai(value));
            }
            Dynamic::from(map)
        })
        .collect()
}

fn value_to_rhai(value: &Value) -> Dynamic {
    match value {
        Value::Integer(i) => Dynamic::from(*i),
        Value::Timestamp(ts) => Dynamic::from(ts.to_string()),
        Value::Text(s) => Dynamic::from(s.clone()),
        Value::Bytes(b) => Dynamic::from(String::from_utf8_lossy(b).into_owned()),
        Value::Null => Dynamic::UNIT,
    }
}

fn rhai_to_rows(array: Array, method: Method) -> Vec<RowOp> {
    array
        .into_iter()
        .filter_map(|item| item.try_cast::<Map>())
        .map(|map| {
            let mut row = UntypedRow::new();
            for (key, value) in map {
                row.insert(key.to_string(), rhai_to_value(value));
            }
            RowOp::new(method, row)
        })
        .collect()
}

fn rhai_to_value(value: Dynamic) -> Value {
    if value.is_unit() {
        Value::Null
    } else if let Some(i) = value.clone().try_cast::<i64>() {
        Value::Integer(i)
    } else if let Some(s) = value.clone().try_cast::<rhai::ImmutableString>() {
        Value::Text(s.to_string())
    } else {
        Value::Text(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_row() -> Vec<RowOp> {
        let mut row = UntypedRow::new();
        row.insert("id".to_string(), Value::Integer(1));
        vec![RowOp::new(Method::Insert, row)]
    }

    #[test]
    fn passes_rows_through_when_script_does_nothing() {
        let transformer = ScriptTransformer::new("()");
        let out = transformer.transform("db", "t1", one_row(), &Parameters::default()).unwrap();
        assert_eq!(out[0].rows.len(), 1);
        assert_eq!(out[0].rows[0].row.get("id"), Some(&Value::Integer(1)));
    }

    #[test]
    fn script_can_tag_rows() {
        let transformer = ScriptTransformer::new(
            r#"
            for i in 0..rows.len() {
                rows[i]["tag"] = "seen";
            }
            "#,
        );
        let out = transformer.transform("db", "t1", one_row(), &Parameters::default()).unwrap();
        assert_eq!(out[0].rows[0].row.get("tag"), Some(&Value::Text("seen".to_string())));
    }

    #[test]
    fn infinite_loop_times_out_and_passes_batch_through_unchanged() {
        let params = Parameters {
            timeout: Some(Duration::from_millis(50)),
            ..Parameters::default()
        };
        let transformer = ScriptTransformer::new("loop {}");
        let out = transformer.transform("db", "t1", one_row(), &params).unwrap();
        assert_eq!(out[0].rows.len(), 1);
        assert_eq!(out[0].rows[0].row.get("id"), Some(&Value::Integer(1)));
    }
}
