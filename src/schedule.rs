use crate::error::CliError;
use std::collections::BTreeSet;

const DAY_NAMES: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];
const DAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

fn day_index(name: &str) -> Option<u8> {
    DAY_NAMES
        .iter()
        .position(|n| *n == name)
        .map(|i| i as u8)
}

/// Parses a weekday set: `everyday`, `weekdays`, `weekends`, or a comma list
/// of `sun,mon,...,sat`. Indices are Sunday = 0 .. Saturday = 6.
pub fn parse_week_days(pattern_raw: &str) -> Result<BTreeSet<u8>, CliError> {
    let pattern = pattern_raw.trim().to_lowercase();
    let invalid = || CliError::usage(format!("Invalid days: {}", pattern_raw));

    let days: BTreeSet<u8> = match pattern.as_str() {
        "everyday" => (0..7).collect(),
        "weekdays" => (1..6).collect(),
        "weekends" => [0, 6].into_iter().collect(),
        _ => {
            let parts: Vec<&str> = pattern
                .split(',')
                .map(|p| p.trim())
                .filter(|p| !p.is_empty())
                .collect();
            if parts.is_empty() {
                return Err(invalid());
            }
            let mut out = BTreeSet::new();
            for p in parts {
                out.insert(day_index(p).ok_or_else(invalid)?);
            }
            out
        }
    };

    Ok(days)
}

/// A weekly habit must name at least one real weekday.
pub fn validate_week_days(days: &BTreeSet<u8>) -> Result<(), CliError> {
    if days.is_empty() {
        return Err(CliError::usage("Weekly habits need at least one day"));
    }
    if days.iter().any(|d| *d > 6) {
        return Err(CliError::usage("Invalid days"));
    }
    Ok(())
}

pub fn week_days_to_string(days: &BTreeSet<u8>) -> String {
    if days.len() == 7 {
        return "Daily".to_string();
    }
    if days.is_empty() {
        return "Never".to_string();
    }
    days.iter()
        .filter_map(|d| DAY_LABELS.get(*d as usize).copied())
        .collect::<Vec<&str>>()
        .join(", ")
}
