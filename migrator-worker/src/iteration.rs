use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use migrator_errors::{ErrorTags, MigratorError, Stage};
use migrator_extract::{ExtractOutcome, Extractor};
use migrator_load::Loader;
use migrator_tracking::TrackingStore;
use migrator_transform::Transformer;
use migrator_types::Parameters;
use migrator_util::time::jittered_backoff;
use migrator_util::ShutdownSignal;
use mysql_async::Pool;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{debug, info, instrument, trace, warn};

use crate::state::{IterationState, IterationStateHandle};

/// Pacing sleep between ticks when a full batch was read.
const TICK_PACING: Duration = Duration::from_millis(150);

/// Invoked with a tag bag whenever the extractor or loader fails for a tick.
/// Never aborts the worker.
pub type ErrorCallback = Arc<dyn Fn(ErrorTags, &MigratorError) + Send + Sync>;

/// Everything one Iteration needs to run, independent of its parent
/// Migrator. Iterations reference shared state by value/reference, never
/// the Migrator itself.
pub struct IterationConfig {
    pub source_database: String,
    pub source_table: String,
    pub dest_database: String,
    pub dest_table: String,
    pub extractor: Arc<dyn Extractor>,
    pub transformer: Arc<dyn Transformer>,
    pub loader: Arc<dyn Loader>,
    pub params: Parameters,
}

/// Runs one Iteration's loop body until `shutdown` is triggered, then
/// returns. `tracking` must already carry a row for
/// `(source_database, source_table)` — the caller is responsible for
/// `InsertNew` before spawning.
#[instrument(skip_all, fields(source_database = %config.source_database, source_table = %config.source_table))]
pub async fn run_iteration(
    mut config: IterationConfig,
    source_pool: Pool,
    dest_pool: Pool,
    tracking: Arc<dyn TrackingStore>,
    shutdown: ShutdownSignal,
    state: IterationStateHandle,
    error_callback: Option<ErrorCallback>,
) {
    state.set(IterationState::Running);
    let mut rng = SmallRng::seed_from_u64(fresh_seed());

    let mut ts = match read_tracking_with_retry(&tracking, &config, &shutdown).await {
        Some(ts) => ts,
        None => {
            state.set(IterationState::Terminated);
            return;
        }
    };

    loop {
        if shutdown.is_triggered() {
            state.set(IterationState::Stopping);
            break;
        }

        let outcome = match config
            .extractor
            .extract(&source_pool, &config.source_database, &config.source_table, &ts, &mut config.params)
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                info!(error = %err, "extractor failed, skipping tick with old watermark");
                invoke(&error_callback, &config, Stage::Extract, &err);
                ExtractOutcome {
                    more: false,
                    rows: Vec::new(),
                    new_tracking: ts.clone(),
                }
            }
        };

        info!(row_count = outcome.rows.len(), "extracted rows");
        if config.params.debug {
            debug!(
                batch_size = config.params.effective_batch_size(),
                more = outcome.more,
                watermark = ?outcome.new_tracking,
                "query shape and row count for this tick"
            );
        }

        let tables = match config.transformer.transform(&config.dest_database, &config.dest_table, outcome.rows, &config.params) {
            Ok(tables) => tables,
            Err(err) => {
                warn!(error = %err, "transformer failed, skipping tick");
                invoke(&error_callback, &config, Stage::Transform, &err);
                Vec::new()
            }
        };
        if config.params.low_level_debug {
            for table in &tables {
                trace!(
                    dest_db = %table.dest_db,
                    dest_table = %table.dest_table,
                    default_method = table.default_method.as_str(),
                    rows = ?table.rows,
                    "bound parameters for this table's batch"
                );
            }
        }

        let load_failed = if tables.is_empty() {
            false
        } else {
            match config.loader.load(&dest_pool, &tables, &config.params).await {
                Ok(()) => false,
                Err(err) => {
                    warn!(error = %err, "loader failed, watermark not advanced");
                    invoke(&error_callback, &config, Stage::Load, &err);
                    true
                }
            }
        };

        if !load_failed {
            match tracking.update(&outcome.new_tracking).await {
                Ok(()) => ts = outcome.new_tracking,
                Err(err) => warn!(error = %err, "persisting tracking status failed"),
            }
        }

        if outcome.more && !load_failed {
            if !shutdown.sleep_interruptible(TICK_PACING).await {
                state.set(IterationState::Terminated);
                return;
            }
            continue;
        }

        let backoff = jittered_backoff(config.params.sleep_between_runs, &mut rng);
        if !shutdown.sleep_interruptible(backoff).await {
            state.set(IterationState::Terminated);
            return;
        }

        match read_tracking_with_retry(&tracking, &config, &shutdown).await {
            Some(refreshed) => ts = refreshed,
            None => {
                state.set(IterationState::Terminated);
                return;
            }
        }
    }

    state.set(IterationState::Stopped);
}

/// Reads the tracking status, retrying with `sleep_between_runs` backoff on
/// error. Returns `None` if termination is observed while retrying.
async fn read_tracking_with_retry(
    tracking: &Arc<dyn TrackingStore>,
    config: &IterationConfig,
    shutdown: &ShutdownSignal,
) -> Option<migrator_tracking::TrackingStatus> {
    loop {
        if shutdown.is_triggered() {
            return None;
        }
        match tracking.get(&config.source_database, &config.source_table).await {
            Ok(ts) => return Some(ts),
            Err(err) => {
                warn!(error = %err, "reading tracking status failed, backing off");
                if !shutdown.sleep_interruptible(config.params.sleep_between_runs).await {
                    return None;
                }
            }
        }
    }
}

fn invoke(callback: &Option<ErrorCallback>, config: &IterationConfig, stage: Stage, err: &MigratorError) {
    if let Some(cb) = callback {
        cb(
            ErrorTags {
                stage: Some(stage),
                source_database: config.source_database.clone(),
                source_table: config.source_table.clone(),
                destination_database: Some(config.dest_database.clone()),
                destination_table: Some(config.dest_table.clone()),
            },
            err,
        );
    }
}

fn fresh_seed() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos() as u64).unwrap_or(0)
}
