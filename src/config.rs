use crate::date::{local_today, parse_date};
use crate::error::CliError;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

pub const DB_PATH_ENV: &str = "HABIT_TRACKER_DB_PATH";
pub const TODAY_ENV: &str = "HABIT_TRACKER_TODAY";
pub const LOG_ENV: &str = "HABIT_TRACKER_LOG";
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Settings resolved once per invocation: flag, then environment, then
/// platform default.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub today: NaiveDate,
    pub color: bool,
}

impl Config {
    pub fn resolve(
        cli_db_path: Option<&str>,
        cli_today: Option<&str>,
        no_color: bool,
    ) -> Result<Self, CliError> {
        Ok(Self {
            db_path: resolve_db_path(cli_db_path)?,
            today: resolve_today(cli_today)?,
            color: resolve_color_enabled(no_color),
        })
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn resolve_db_path(cli_db_path: Option<&str>) -> Result<PathBuf, CliError> {
    if let Some(p) = cli_db_path.map(|s| s.trim()).filter(|s| !s.is_empty()) {
        return Ok(PathBuf::from(p));
    }

    if let Some(p) = non_empty_env(DB_PATH_ENV) {
        return Ok(PathBuf::from(p));
    }

    let base = match (non_empty_env("XDG_DATA_HOME"), non_empty_env("HOME")) {
        (Some(b), _) => PathBuf::from(b),
        (None, Some(h)) => Path::new(&h).join(".local").join("share"),
        (None, None) => return Err(CliError::io("Cannot determine data directory")),
    };

    Ok(base.join("habit-tracker").join("db.json"))
}

/// Logical "today". Defaults to the local calendar day so streaks and due
/// dates follow the user's wall clock.
pub fn resolve_today(cli_today: Option<&str>) -> Result<NaiveDate, CliError> {
    if let Some(t) = cli_today {
        return parse_date(t, "today");
    }
    if let Some(t) = non_empty_env(TODAY_ENV) {
        return parse_date(&t, "today");
    }
    Ok(local_today())
}

fn resolve_color_enabled(no_color_flag: bool) -> bool {
    !no_color_flag && std::env::var_os("NO_COLOR").is_none()
}

pub fn log_filter() -> String {
    non_empty_env(LOG_ENV).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_flags_win() {
        assert_eq!(
            resolve_db_path(Some(" /tmp/x/db.json ")).unwrap(),
            PathBuf::from("/tmp/x/db.json")
        );
        assert_eq!(
            resolve_today(Some("2026-10-19")).unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
        );
    }

    #[test]
    fn bad_today_flag_is_usage_error() {
        let err = resolve_today(Some("19/10/2026")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message.contains("today"));
    }
}
