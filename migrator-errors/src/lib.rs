//! Error types shared by every crate in the migrator workspace.
//!
//! Mirrors the error-kind taxonomy a replication engine needs: configuration
//! mistakes are fatal at startup, transient database errors are logged and
//! retried by the caller, schema mismatches are soft failures that keep the
//! iteration looping, and a handful of data/logic violations are surfaced to
//! the caller as plain errors.

use std::fmt;

use thiserror::Error;

/// The stage of a tick in which an error originated. Carried by the worker's
/// error callback alongside source/destination identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Reading the persisted watermark before a tick.
    Tracking,
    /// Running the configured [`Extractor`](https://docs.rs/migrator-extract).
    Extract,
    /// Running the configured transformer.
    Transform,
    /// Running the configured loader.
    Load,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Tracking => "tracking",
            Stage::Extract => "extract",
            Stage::Transform => "transform",
            Stage::Load => "load",
        };
        f.write_str(s)
    }
}

/// Identifies the table an error tag bag refers to, passed to the worker's
/// optional error callback.
#[derive(Debug, Clone, Default)]
pub struct ErrorTags {
    /// Which stage of the tick produced the error.
    pub stage: Option<Stage>,
    /// Source database name.
    pub source_database: String,
    /// Source table name.
    pub source_table: String,
    /// Destination database name, if the error occurred past the transform
    /// stage.
    pub destination_database: Option<String>,
    /// Destination table name, if the error occurred past the transform
    /// stage.
    pub destination_table: Option<String>,
}

/// The error currency of the whole migrator workspace.
#[derive(Debug, Error)]
pub enum MigratorError {
    /// Unresolvable extractor/transformer name, an incomplete
    /// `TrackingStatus` write, a missing DSN, or any other mistake that can
    /// only be fixed by changing configuration. Fatal at init.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Connection loss, deadlock, or timeout talking to the source or
    /// destination database. The caller logs it, does not advance the
    /// watermark, and continues.
    #[error("transient database error: {0}")]
    TransientDb(#[from] mysql_async::Error),

    /// A watermark column did not have the type the bound extractor
    /// expected (e.g. a sequential extractor over a non-integer column).
    /// Soft failure: the tick reports `more = false` and the watermark is
    /// left untouched, but the worker keeps looping.
    #[error("schema mismatch in {source_table}.{column}: expected {expected}")]
    Schema {
        /// Table the mismatch was found in.
        source_table: String,
        /// Column whose type didn't match.
        column: String,
        /// What the bound extractor expected to find there.
        expected: &'static str,
    },

    /// Malformed input data, such as a queue entry whose `pkColumn`/`pkValue`
    /// comma-separated lists disagree in length.
    #[error("data error: {0}")]
    Data(String),

    /// A violation of a component-level invariant, such as presenting an
    /// empty batch to the batched-DML builder.
    #[error("logic error: {0}")]
    Logic(String),

    /// No `TrackingStatus` row exists for the given (source database,
    /// source table) pair.
    #[error("no tracking status for {source_database}.{source_table}")]
    NotFound {
        /// Source database name.
        source_database: String,
        /// Source table name.
        source_table: String,
    },
}

impl From<serde_yaml_ng::Error> for MigratorError {
    fn from(e: serde_yaml_ng::Error) -> Self {
        MigratorError::Configuration(e.to_string())
    }
}

impl From<std::io::Error> for MigratorError {
    fn from(e: std::io::Error) -> Self {
        MigratorError::Configuration(e.to_string())
    }
}

/// Convenience alias used instead of bare `Result<T, E>` across the
/// workspace.
pub type MigratorResult<T> = Result<T, MigratorError>;
