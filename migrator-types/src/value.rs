use chrono::NaiveDateTime;
use mysql_async::Value as MyValue;

/// A single SQL-scanned value, carrying its scanned type as a closed enum
/// rather than a dynamically-typed container.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// An integral column value (`INT`, `BIGINT`, ...).
    Integer(i64),
    /// A `DATETIME`/`TIMESTAMP` column value.
    Timestamp(NaiveDateTime),
    /// A textual column value (`VARCHAR`, `TEXT`, ...).
    Text(String),
    /// A binary column value (`BLOB`, ...), or any textual value that
    /// wasn't valid UTF-8.
    Bytes(Vec<u8>),
    /// SQL `NULL`.
    Null,
}

impl Value {
    /// The value as an integer, if it is one. Used by the sequential
    /// extractor to sanity-check the watermark column.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// The value as a timestamp, if it is one. Used by the timestamp
    /// extractor to sanity-check the watermark column.
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }
}

impl From<MyValue> for Value {
    fn from(v: MyValue) -> Self {
        match v {
            MyValue::NULL => Value::Null,
            MyValue::Int(i) => Value::Integer(i),
            MyValue::UInt(u) => match i64::try_from(u) {
                Ok(i) => Value::Integer(i),
                Err(_) => Value::Text(u.to_string()),
            },
            MyValue::Float(f) => Value::Text(f.to_string()),
            MyValue::Double(d) => Value::Text(d.to_string()),
            MyValue::Bytes(b) => match String::from_utf8(b.clone()) {
                Ok(s) => Value::Text(s),
                Err(_) => Value::Bytes(b),
            },
            MyValue::Date(year, month, day, hour, minute, second, micros) => {
                Value::Timestamp(mysql_date_to_naive(
                    year, month, day, hour, minute, second, micros,
                ))
            }
            MyValue::Time(neg, days, hours, minutes, seconds, micros) => {
                // TIME columns aren't a watermark type this engine supports;
                // keep the raw text representation rather than lose data.
                let sign = if neg { "-" } else { "" };
                Value::Text(format!(
                    "{sign}{}:{:02}:{:02}.{:06}",
                    u32::from(days) * 24 + u32::from(hours),
                    minutes,
                    seconds,
                    micros
                ))
            }
        }
    }
}

fn mysql_date_to_naive(
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    micros: u32,
) -> NaiveDateTime {
    use chrono::{NaiveDate, NaiveTime};
    let date = NaiveDate::from_ymd_opt(i32::from(year), u32::from(month.max(1)), u32::from(day.max(1)))
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap());
    let time = NaiveTime::from_hms_micro_opt(
        u32::from(hour),
        u32::from(minute),
        u32::from(second),
        micros,
    )
    .unwrap_or_default();
    NaiveDateTime::new(date, time)
}

impl From<&Value> for MyValue {
    fn from(v: &Value) -> Self {
        match v {
            Value::Integer(i) => MyValue::Int(*i),
            Value::Timestamp(t) => {
                let date = t.date();
                let time = t.time();
                MyValue::Date(
                    date.year_ce().1 as u16,
                    date.month() as u8,
                    date.day() as u8,
                    time.hour() as u8,
                    time.minute() as u8,
                    time.second() as u8,
                    time.timestamp_subsec_micros(),
                )
            }
            Value::Text(s) => MyValue::Bytes(s.clone().into_bytes()),
            Value::Bytes(b) => MyValue::Bytes(b.clone()),
            Value::Null => MyValue::NULL,
        }
    }
}

impl From<Value> for MyValue {
    fn from(v: Value) -> Self {
        MyValue::from(&v)
    }
}

use chrono::{Datelike, Timelike};
