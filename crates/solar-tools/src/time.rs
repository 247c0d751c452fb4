//! IST/UTC conversions.
//!
//! The plant reports in Indian Standard Time (UTC+05:30, no DST); every
//! timestamp stored in MongoDB is timezone-aware UTC.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::error::IngestError;

const IST_OFFSET_SECONDS: i32 = 5 * 3600 + 30 * 60;

/// The plant's fixed timezone offset.
pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(IST_OFFSET_SECONDS).expect("IST offset is in range")
}

/// UTC instant at midnight of the given IST calendar day.
pub fn ist_day_start(day: NaiveDate) -> DateTime<Utc> {
    let utc_naive = day.and_time(NaiveTime::MIN) - Duration::seconds(i64::from(IST_OFFSET_SECONDS));
    DateTime::from_naive_utc_and_offset(utc_naive, Utc)
}

/// Parse a naive IST timestamp from the API into UTC.
///
/// The power endpoint emits `YYYY-MM-DD HH:MM` with or without seconds, and
/// occasionally with a `T` separator.
pub fn parse_ist_timestamp(raw: &str) -> Result<DateTime<Utc>, IngestError> {
    let naive = parse_naive(raw)
        .map_err(|e| IngestError::Parse(format!("Invalid timestamp {raw:?}: {e}")))?;
    let utc_naive = naive - Duration::seconds(i64::from(IST_OFFSET_SECONDS));
    Ok(DateTime::from_naive_utc_and_offset(utc_naive, Utc))
}

fn parse_naive(raw: &str) -> chrono::ParseResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M"))
}

/// Today's date on the IST calendar.
pub fn today_ist() -> NaiveDate {
    Utc::now().with_timezone(&ist()).date_naive()
}
