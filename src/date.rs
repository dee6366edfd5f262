use crate::error::CliError;
use chrono::{Datelike, Duration, Local, NaiveDate};

/// Strict `YYYY-MM-DD`. Anything else (including valid-looking but
/// impossible dates such as 2026-02-29) is a usage error naming `label`.
pub fn parse_date(s: &str, label: &str) -> Result<NaiveDate, CliError> {
    let ss = s.trim();
    let b = ss.as_bytes();
    if b.len() != 10 || b[4] != b'-' || b[7] != b'-' {
        return Err(CliError::usage(format!("Invalid {}: {}", label, s)));
    }
    NaiveDate::parse_from_str(ss, "%Y-%m-%d")
        .map_err(|_| CliError::usage(format!("Invalid {}: {}", label, s)))
}

pub fn fmt_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn add_days(date: NaiveDate, delta_days: i64) -> NaiveDate {
    date + Duration::days(delta_days)
}

/// Like `add_days`, but a result outside the representable calendar is a
/// usage error instead of a panic.
pub fn checked_add_days(date: NaiveDate, delta_days: i64) -> Result<NaiveDate, CliError> {
    Duration::try_days(delta_days)
        .and_then(|d| date.checked_add_signed(d))
        .ok_or_else(|| CliError::usage("Date out of range"))
}

/// Weekday index with Sunday = 0 .. Saturday = 6. Stored `week_days` sets
/// use the same numbering.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

pub fn date_range_inclusive(from: NaiveDate, to: NaiveDate) -> Result<Vec<NaiveDate>, CliError> {
    if from > to {
        return Err(CliError::usage("Invalid range: from > to"));
    }
    Ok(from.iter_days().take_while(|d| *d <= to).collect())
}

/// The caller's calendar day in the local timezone, time of day dropped.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}
