use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use thiserror::Error;

const OUTPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

const NAIVE_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DateParseError {
    #[error("invalid date `{0}`: expected YYYY-MM-DD or an ISO-8601 date-time")]
    Invalid(String),
    #[error("epoch milliseconds {0} are out of range")]
    EpochOutOfRange(i64),
}

/// Parses a record or query date. Offsets are normalised to UTC and dropped,
/// plain dates resolve to midnight.
pub fn parse_record_date(raw: &str) -> Result<NaiveDateTime, DateParseError> {
    let value = raw.trim();

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(value) {
        return Ok(with_offset.naive_utc());
    }

    for format in NAIVE_DATE_TIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(parsed);
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(start_of_day)
        .map_err(|_| DateParseError::Invalid(value.to_string()))
}

pub fn from_epoch_millis(millis: i64) -> Result<NaiveDateTime, DateParseError> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|datetime| datetime.naive_utc())
        .ok_or(DateParseError::EpochOutOfRange(millis))
}

pub fn format_record_date(date: &NaiveDateTime) -> String {
    date.format(OUTPUT_FORMAT).to_string()
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}
