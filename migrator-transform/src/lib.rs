//! Transformer strategies: pure functions from an extracted batch to a
//! list of destination `TableData`. None of these touch a
//! database; the only one with any real work to do is the scripted variant,
//! which runs under a hard wall-clock budget.

mod default;
mod script;
mod table_renamer;

use migrator_errors::MigratorResult;
use migrator_types::{Parameters, RowOp, TableData};

pub use default::DefaultTransformer;
pub use script::ScriptTransformer;
pub use table_renamer::TableRenamerTransformer;

/// A pluggable, synchronous transform from one extracted batch to the list
/// of destination tables the loader should write.
pub trait Transformer: Send + Sync {
    /// Transform `rows` extracted from `(dest_db, dest_table)`'s source
    /// counterpart into the batches the loader will write.
    fn transform(&self, dest_db: &str, dest_table: &str, rows: Vec<RowOp>, params: &Parameters) -> MigratorResult<Vec<TableData>>;
}

/// Resolve a configured transformer name to an implementation.
/// `script_source` is only consulted for `"script"`. Returns `None` for an
/// unrecognised name, a fatal configuration error at the caller.
pub fn resolve(name: &str, script_source: Option<&str>) -> Option<Box<dyn Transformer>> {
    match name {
        "default" => Some(Box::new(DefaultTransformer)),
        "tablerenamer" => Some(Box::new(TableRenamerTransformer)),
        "script" => script_source.map(|src| Box::new(ScriptTransformer::new(src)) as Box<dyn Transformer>),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_rejects_unknown_names() {
        assert!(resolve("bogus", None).is_none());
    }

    #[test]
    fn resolve_accepts_default_and_tablerenamer_without_a_script() {
        assert!(resolve("default", None).is_some());
        assert!(resolve("tablerenamer", None).is_some());
    }

    #[test]
    fn resolve_requires_a_script_source_for_script_transformer() {
        assert!(resolve("script", None).is_none());
        assert!(resolve("script", Some("()")).is_some());
    }
}
