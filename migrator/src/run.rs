use std::collections::HashMap;
use std::time::Duration;

use anyhow::Context;
use migrator_config::{ResolvedConfig, ResolvedMigration};
use migrator_worker::Migrator;
use tracing::info;

/// Groups resolved migrations by the (source DSN, destination DSN) pair
/// they share and spawns one [`Migrator`] per group — a Migrator owns the
/// source/destination connection pools and the set of Iteration Workers
/// for exactly one database pair, and sizes each pool's connection
/// ceiling at `3 * |iterations|` for that pair, so migrations against the
/// same two databases must share one Migrator to get that sizing right.
///
/// Runs until a process signal arrives or, if configured, the run timeout
/// elapses, then asks every Migrator to quit and waits for all of them to
/// finish.
pub async fn run(config: ResolvedConfig) -> anyhow::Result<()> {
    let mut groups: HashMap<(String, String), Vec<ResolvedMigration>> = HashMap::new();
    for migration in config.migrations {
        groups.entry((migration.source_dsn.clone(), migration.dest_dsn.clone())).or_default().push(migration);
    }

    if groups.is_empty() {
        info!("no migrations configured, nothing to do");
        return Ok(());
    }

    let mut migrators = Vec::with_capacity(groups.len());
    for ((source_dsn, dest_dsn), migrations) in groups {
        let mut migrator = Migrator::new(&source_dsn, &dest_dsn, &config.tracking_table, migrations.len())
            .await
            .context("failed to initialise a Migrator")?;

        for migration in migrations {
            info!(
                source_database = %migration.spec.source_database,
                source_table = %migration.spec.source_table,
                dest_database = %migration.spec.dest_database,
                dest_table = %migration.spec.dest_table,
                "spawning iteration"
            );
            migrator.spawn(migration.spec, None, None).await.context("failed to spawn iteration")?;
        }

        migrators.push(migrator);
    }

    wait_for_shutdown_signal(config.run_timeout).await;
    info!("shutdown signal received, stopping all iterations");

    for migrator in &migrators {
        migrator.quit();
    }
    for migrator in &mut migrators {
        migrator.wait().await;
        migrator.close().await.context("failed to close a Migrator's connection pools")?;
    }

    Ok(())
}

/// Waits for ctrl-c, `SIGTERM` (unix only), or the run timeout, whichever
/// comes first.
async fn wait_for_shutdown_signal(run_timeout: Option<Duration>) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::warn!(%err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    match run_timeout {
        Some(timeout) => {
            tokio::select! {
                _ = ctrl_c => info!("received ctrl-c"),
                _ = terminate => info!("received SIGTERM"),
                _ = tokio::time::sleep(timeout) => info!(?timeout, "run timeout elapsed"),
            }
        }
        None => {
            tokio::select! {
                _ = ctrl_c => info!("received ctrl-c"),
                _ = terminate => info!("received SIGTERM"),
            }
        }
    }
}
