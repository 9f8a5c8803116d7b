use std::sync::Arc;

use migrator_errors::{MigratorError, MigratorResult};
use migrator_extract::Extractor;
use migrator_load::{DefaultLoader, Loader};
use migrator_tracking::{MysqlTrackingStore, TrackingStatus, TrackingStore};
use migrator_transform::Transformer;
use migrator_types::Parameters;
use migrator_util::ShutdownSignal;
use mysql_async::{Opts, OptsBuilder, Pool, PoolConstraints, PoolOpts};
use tokio::task::JoinSet;
use tracing::{info, instrument};

use crate::iteration::{run_iteration, ErrorCallback, IterationConfig};
use crate::state::{IterationState, IterationStateHandle};

/// One configured source→destination pair, plus the strategies bound to it
/// (a `migrations[]` entry, resolved to live implementations).
pub struct MigrationSpec {
    pub source_database: String,
    pub source_table: String,
    pub dest_database: String,
    pub dest_table: String,
    pub column_name: String,
    pub extractor: Arc<dyn Extractor>,
    pub transformer: Arc<dyn Transformer>,
    pub params: Parameters,
}

/// Owns the source and destination connection pools, the tracking store,
/// and the shared shutdown flag for every Iteration spawned against one
/// database pair. The Migrator owns shared resources; each Iteration owns
/// only its own loop.
pub struct Migrator {
    source_pool: Pool,
    dest_pool: Pool,
    tracking: Arc<dyn TrackingStore>,
    shutdown: ShutdownSignal,
    tasks: JoinSet<()>,
    handles: Vec<(String, String, IterationStateHandle)>,
}

impl Migrator {
    /// Opens the source and destination pools, sizing their connection
    /// ceiling at `3 * iteration_count` open / `0` idle connections, and
    /// ensures the tracking table exists.
    pub async fn new(source_dsn: &str, dest_dsn: &str, tracking_table: &str, iteration_count: usize) -> MigratorResult<Self> {
        let source_pool = Self::build_pool(source_dsn, iteration_count)?;
        let dest_pool = Self::build_pool(dest_dsn, iteration_count)?;
        let tracking: Arc<dyn TrackingStore> = Arc::new(MysqlTrackingStore::new(dest_pool.clone(), tracking_table));
        tracking.create_if_missing().await?;

        Ok(Self {
            source_pool,
            dest_pool,
            tracking,
            shutdown: ShutdownSignal::new(),
            tasks: JoinSet::new(),
            handles: Vec::new(),
        })
    }

    fn build_pool(dsn: &str, iteration_count: usize) -> MigratorResult<Pool> {
        let opts = Opts::from_url(dsn).map_err(|e| MigratorError::Configuration(format!("invalid DSN: {e}")))?;
        let max_open = iteration_count.max(1) * 3;
        let constraints = PoolConstraints::new(0, max_open)
            .ok_or_else(|| MigratorError::Configuration("pool constraints must allow at least one connection".to_string()))?;
        let opts = OptsBuilder::from_opts(opts).pool_opts(PoolOpts::default().with_constraints(constraints));
        Ok(Pool::new(opts))
    }

    /// Bootstraps (or reads) the `TrackingStatus` row for `spec`, then
    /// spawns its Iteration loop into this Migrator's task set. Returns a
    /// handle through which `states()` and `wait()` observe the task.
    #[instrument(skip_all, fields(source_database = %spec.source_database, source_table = %spec.source_table))]
    pub async fn spawn(&mut self, spec: MigrationSpec, loader: Option<Arc<dyn Loader>>, error_callback: Option<ErrorCallback>) -> MigratorResult<()> {
        match self.tracking.get(&spec.source_database, &spec.source_table).await {
            Ok(_) => {}
            Err(MigratorError::NotFound { .. }) => {
                let fresh = TrackingStatus::new(&spec.source_database, &spec.source_table, &spec.column_name);
                self.tracking.insert_new(&fresh).await?;
                info!("bootstrapped fresh tracking row");
            }
            Err(err) => return Err(err),
        }

        let state = IterationStateHandle::new();
        self.handles.push((spec.source_database.clone(), spec.source_table.clone(), state.clone()));

        let config = IterationConfig {
            source_database: spec.source_database,
            source_table: spec.source_table,
            dest_database: spec.dest_database,
            dest_table: spec.dest_table,
            extractor: spec.extractor,
            transformer: spec.transformer,
            loader: loader.unwrap_or_else(|| Arc::new(DefaultLoader)),
            params: spec.params,
        };

        let source_pool = self.source_pool.clone();
        let dest_pool = self.dest_pool.clone();
        let tracking = self.tracking.clone();
        let shutdown = self.shutdown.clone();

        self.tasks
            .spawn(async move { run_iteration(config, source_pool, dest_pool, tracking, shutdown, state, error_callback).await });

        Ok(())
    }

    /// Asks every spawned Iteration to stop. Observed within ~1s.
    pub fn quit(&self) {
        self.shutdown.trigger();
    }

    /// The current lifecycle state of every spawned Iteration, identified
    /// by `(source_database, source_table)`.
    pub fn states(&self) -> impl Iterator<Item = (&str, &str, IterationState)> + '_ {
        self.handles.iter().map(|(db, table, handle)| (db.as_str(), table.as_str(), handle.get()))
    }

    /// Waits for every spawned Iteration task to finish. Intended to be
    /// called after [`quit`](Self::quit).
    pub async fn wait(&mut self) {
        while self.tasks.join_next().await.is_some() {}
    }

    /// Disconnects both pools. Call after [`wait`](Self::wait).
    pub async fn close(&self) -> MigratorResult<()> {
        self.source_pool.clone().disconnect().await?;
        self.dest_pool.clone().disconnect().await?;
        Ok(())
    }
}
