use chrono::{NaiveDate, NaiveDateTime};

/// Stand-in for an unset `timestamp_position`: a far-past sentinel instead
/// of SQL `NULL`, so a fresh iteration's first `col > floor` predicate
/// still matches every row.
pub fn timestamp_floor() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// The persisted watermark for one (source database, source table) pair.
/// Exactly one of `sequential_position`/`timestamp_position` is
/// meaningful for any given iteration, determined by which extractor
/// variant is bound to it.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingStatus {
    /// Source database name.
    pub source_database: String,
    /// Source table name.
    pub source_table: String,
    /// The watermark column name. For the timestamp-fallback extractor this
    /// is two comma-separated column names.
    pub column_name: String,
    /// Position for the sequential extractor. Default 0.
    pub sequential_position: i64,
    /// Position for the timestamp / timestamp-fallback extractors.
    pub timestamp_position: Option<NaiveDateTime>,
    /// When this row was last written by a tick.
    pub last_run: Option<NaiveDateTime>,
}

impl TrackingStatus {
    /// Build a fresh tracking row for a newly-configured iteration, with
    /// watermarks at their zero values.
    pub fn new(source_database: impl Into<String>, source_table: impl Into<String>, column_name: impl Into<String>) -> Self {
        Self {
            source_database: source_database.into(),
            source_table: source_table.into(),
            column_name: column_name.into(),
            sequential_position: 0,
            timestamp_position: None,
            last_run: None,
        }
    }

    /// Whether this row has enough identifying information to be
    /// persisted: the source database, table, and watermark column name
    /// must all be set.
    pub fn is_complete(&self) -> bool {
        !self.source_database.is_empty() && !self.source_table.is_empty() && !self.column_name.is_empty()
    }

    /// The value to bind against `col > ?` when `timestamp_position` hasn't
    /// been set yet.
    pub fn timestamp_floor(&self) -> NaiveDateTime {
        self.timestamp_position.unwrap_or_else(timestamp_floor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_status_starts_at_zero_watermark() {
        let ts = TrackingStatus::new("db", "t1", "id");
        assert_eq!(ts.sequential_position, 0);
        assert_eq!(ts.timestamp_position, None);
        assert!(ts.is_complete());
    }

    #[test]
    fn incomplete_status_is_rejected() {
        let ts = TrackingStatus::new("", "t1", "id");
        assert!(!ts.is_complete());
    }

    #[test]
    fn unset_timestamp_position_floors_to_the_distant_past() {
        let ts = TrackingStatus::new("db", "t1", "c");
        assert_eq!(ts.timestamp_floor(), timestamp_floor());
    }

    #[test]
    fn set_timestamp_position_is_used_directly() {
        let mut ts = TrackingStatus::new("db", "t1", "c");
        let stamp = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        ts.timestamp_position = Some(stamp);
        assert_eq!(ts.timestamp_floor(), stamp);
    }

    #[test]
    fn serialize_then_deserialize_round_trips() {
        // Round-tripping through the wire representation used by the store
        // (a plain tuple of bound values here, standing in for a row read
        // back from the tracking table) must be byte-identical.
        let ts = TrackingStatus::new("db", "t1", "id");
        let tuple = (
            ts.source_database.clone(),
            ts.source_table.clone(),
            ts.column_name.clone(),
            ts.sequential_position,
            ts.timestamp_position,
            ts.last_run,
        );
        let round_tripped = TrackingStatus {
            source_database: tuple.0,
            source_table: tuple.1,
            column_name: tuple.2,
            sequential_position: tuple.3,
            timestamp_position: tuple.4,
            last_run: tuple.5,
        };
        assert_eq!(ts, round_tripped);
    }
}
