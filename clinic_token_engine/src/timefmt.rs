//! Date and time formats used by the ledger.
//!
//! The stored `Date` column is a full timestamp and must round-trip.
//! The long calendar date is display-only: it cannot be parsed back
//! into a timestamp, so it is only ever applied to copies.

use chrono::{NaiveDate, NaiveDateTime, ParseResult, SubsecRound};

/// Written to disk: "2024-01-05 14:03:22.123456".
pub const STORAGE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Accepted on load. `%.f` also matches a missing fraction.
const STORAGE_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// "January 05, 2024"
pub const LONG_DATE_FORMAT: &str = "%B %d, %Y";

/// "02:03 PM"
pub const CLOCK_FORMAT: &str = "%I:%M %p";

pub fn format_storage_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(STORAGE_TIMESTAMP_FORMAT).to_string()
}

pub fn parse_storage_timestamp(value: &str) -> ParseResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), STORAGE_PARSE_FORMAT)
}

pub fn format_long_date(date: NaiveDate) -> String {
    date.format(LONG_DATE_FORMAT).to_string()
}

pub fn format_clock(ts: &NaiveDateTime) -> String {
    ts.format(CLOCK_FORMAT).to_string()
}

/// Drop sub-microsecond precision so a stored timestamp reloads equal.
pub fn truncate_to_storage_precision(ts: NaiveDateTime) -> NaiveDateTime {
    ts.trunc_subsecs(6)
}
