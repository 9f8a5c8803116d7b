//! Loads and resolves `migrator.yml`: deserializes the loose YAML shape,
//! then converts it into the typed [`MigrationSpec`]s the worker crate
//! consumes, resolving extractor/transformer names against their registries
//! exactly once at startup so an unresolvable name fails fast instead of on
//! the first tick.

mod raw;
mod resolve;

use std::path::Path;

use migrator_errors::MigratorResult;

pub use raw::{RawConfig, RawEndpoint, RawMigration, RawParameters};
pub use resolve::{resolve, ResolvedConfig, ResolvedMigration};

/// Read and parse a `migrator.yml` file from disk, without resolving
/// extractor/transformer names yet. Split from [`load`] so callers that
/// only need the raw shape (e.g. a config-validation CLI) don't pay for
/// strategy resolution.
pub fn read_file(path: impl AsRef<Path>) -> MigratorResult<RawConfig> {
    let contents = std::fs::read_to_string(path)?;
    Ok(raw::parse(&contents)?)
}

/// Read, parse, and resolve a `migrator.yml` file in one step.
pub fn load(path: impl AsRef<Path>) -> MigratorResult<ResolvedConfig> {
    let raw = read_file(path)?;
    resolve::resolve(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_reads_and_resolves_a_file_on_disk() {
        let yaml = r#"
tracking-table: EtlPosition
migrations:
  - source: { dsn: "mysql://u:p@srchost/srcdb", table: t1, key: id }
    target: { dsn: "mysql://u:p@dsthost/dstdb", table: t1 }
    extractor: sequential
"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let resolved = load(file.path()).unwrap();
        assert_eq!(resolved.migrations.len(), 1);
        assert_eq!(resolved.migrations[0].spec.source_table, "t1");
    }

    #[test]
    fn read_file_reports_missing_file_as_configuration_error() {
        let err = read_file("/does/not/exist.yml").unwrap_err();
        assert!(matches!(err, migrator_errors::MigratorError::Configuration(_)));
    }
}
