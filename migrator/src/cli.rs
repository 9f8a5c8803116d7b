use std::path::PathBuf;

use clap::Parser;

/// Continuously replicate tables from a source MySQL database to a
/// destination MySQL database.
#[derive(Parser, Debug)]
#[command(name = "migrator", version, about)]
pub struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long = "config-file", short = 'c', default_value = "migrator.yml", env = "MIGRATOR_CONFIG_FILE")]
    pub config_file: PathBuf,

    /// Forces verbose (debug-level) logging regardless of `RUST_LOG` or the
    /// configuration file's `debug` setting.
    #[arg(long, env = "MIGRATOR_DEBUG")]
    pub debug: bool,
}
