//! Value transforms applied while loading cached documents

use chrono::{DateTime, FixedOffset};
use std::num::ParseIntError;

/// Report timestamps use a fixed UTC-5 offset year-round.
const REPORT_UTC_OFFSET_SECS: i32 = -5 * 3600;

/// Decodes a base-36 content id into its integer form.
///
/// Reddit ids are lowercase base-36 strings ("1a" is 46). The integer
/// form becomes the primary key in the loaded database.
pub fn decode_base36(id: &str) -> Result<i64, ParseIntError> {
    i64::from_str_radix(id, 36)
}

/// Renders a creation epoch as a report-local timestamp truncated to
/// the hour, e.g. "2021-03-15T09:00:00".
///
/// Returns `None` for epochs outside the representable range.
pub fn created_hour(epoch: i64) -> Option<String> {
    let offset = FixedOffset::east_opt(REPORT_UTC_OFFSET_SECS)?;
    let moment = DateTime::from_timestamp(epoch, 0)?.with_timezone(&offset);
    Some(moment.format("%Y-%m-%dT%H:00:00").to_string())
}
