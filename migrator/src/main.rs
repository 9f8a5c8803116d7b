//! CLI entry point: loads `migrator.yml`, spawns one Iteration Worker per
//! configured migration, and runs until terminated.

mod cli;
mod logging;
mod run;

use anyhow::Context;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    let raw = migrator_config::read_file(&cli.config_file)
        .with_context(|| format!("failed to read config file {}", cli.config_file.display()))?;
    logging::init(cli.debug || raw.debug);

    let config = migrator_config::resolve(&raw).context("failed to resolve migrator.yml")?;

    run::run(config).await?;

    Ok(())
}
