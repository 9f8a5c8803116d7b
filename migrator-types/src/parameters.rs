use std::time::Duration;

use crate::Method;

/// The typed parameter bag passed to an extractor/transformer/loader on each
/// tick. Only `method` is ever written by the core itself — every other
/// field is operator configuration.
#[derive(Debug, Clone)]
pub struct Parameters {
    /// Maximum rows an extractor reads per tick. Default 1000.
    pub batch_size: usize,
    /// Maximum rows per batched INSERT/REPLACE statement. Default 100.
    pub insert_batch_size: usize,
    /// Enables per-tick info-level tracing of query shapes and row counts.
    pub debug: bool,
    /// Enables trace-level logging of bound parameters. Implies `debug`
    /// levels of detail plus statement text and parameter values.
    pub low_level_debug: bool,
    /// Sequential extractor emits `REPLACE` rows instead of `INSERT` when
    /// set.
    pub sequential_replace: bool,
    /// Timestamp extractor additionally requires `col <= now()` when set,
    /// so future-dated rows don't jump the watermark past still-arriving
    /// rows.
    pub only_past: bool,
    /// Base delay between ticks when an extractor reports no more data.
    /// Default 5s.
    pub sleep_between_runs: Duration,
    /// Destination table name override, read by the table-renaming
    /// transformer.
    pub table_name: Option<String>,
    /// Hard time budget for the scripted transformer. Default 5s when that
    /// transformer is configured.
    pub timeout: Option<Duration>,
    /// Written by the bound extractor, read by the transformer/loader: the
    /// DML method this tick's rows should default to.
    pub method: Option<Method>,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            insert_batch_size: 100,
            debug: false,
            low_level_debug: false,
            sequential_replace: false,
            only_past: false,
            sleep_between_runs: Duration::from_secs(5),
            table_name: None,
            timeout: None,
            method: None,
        }
    }
}

impl Parameters {
    /// `batch_size`, clamped to a minimum of 1.
    pub fn effective_batch_size(&self) -> usize {
        crate::clamp_batch_size(self.batch_size)
    }

    /// `insert_batch_size`, clamped to a minimum of 1.
    pub fn effective_insert_batch_size(&self) -> usize {
        crate::clamp_batch_size(self.insert_batch_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_parameters() {
        let p = Parameters::default();
        assert_eq!(p.batch_size, 1000);
        assert_eq!(p.insert_batch_size, 100);
        assert!(!p.debug);
        assert!(!p.sequential_replace);
        assert!(!p.only_past);
        assert_eq!(p.sleep_between_runs, Duration::from_secs(5));
        assert_eq!(p.table_name, None);
        assert_eq!(p.method, None);
    }

    #[test]
    fn effective_batch_size_clamps_to_one() {
        let mut p = Parameters::default();
        p.batch_size = 0;
        assert_eq!(p.effective_batch_size(), 1);
    }
}
