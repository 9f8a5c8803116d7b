use indexmap::IndexMap;

use crate::Value;

/// An ordered mapping from column name to scanned value. Key order is
/// stable across every row of a single batch — `IndexMap` preserves
/// insertion order, which for rows scanned off the same `SELECT *` is
/// simply column order.
pub type UntypedRow = IndexMap<String, Value>;

/// The DML verb attached to a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `INSERT INTO ...`
    Insert,
    /// `REPLACE INTO ...`
    Replace,
    /// `DELETE FROM ... WHERE ...`
    Remove,
}

impl Method {
    /// Name as written into `Parameters::method`.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Insert => "INSERT",
            Method::Replace => "REPLACE",
            Method::Remove => "REMOVE",
        }
    }
}

/// A single row plus the DML verb it should be loaded with. `REMOVE` rows
/// carry only their primary-key columns.
#[derive(Debug, Clone)]
pub struct RowOp {
    /// The DML verb this row should be loaded with.
    pub method: Method,
    /// The row's columns. For `REMOVE`, only the primary-key columns.
    pub row: UntypedRow,
}

impl RowOp {
    /// Construct a new row operation.
    pub fn new(method: Method, row: UntypedRow) -> Self {
        Self { method, row }
    }
}

/// Identifying information and data for one destination table, as produced
/// by a [`Transformer`](https://docs.rs/migrator-transform) and consumed by
/// the [`Loader`](https://docs.rs/migrator-load).
#[derive(Debug, Clone)]
pub struct TableData {
    /// Destination database name.
    pub dest_db: String,
    /// Destination table name.
    pub dest_table: String,
    /// The rows to load, each tagged with its own method.
    pub rows: Vec<RowOp>,
    /// The method to use for any row whose method can't otherwise be
    /// determined. Set from `params.method`, which the bound extractor
    /// wrote for this tick.
    pub default_method: Method,
}
