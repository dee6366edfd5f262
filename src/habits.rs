use crate::error::CliError;
use crate::model::{Db, Frequency, Habit};
use crate::schedule::validate_week_days;
use chrono::{DateTime, NaiveTime, Utc};
use std::collections::BTreeSet;

pub const MAX_NAME_LEN: usize = 50;
pub const MAX_DESCRIPTION_LEN: usize = 200;
pub const DEFAULT_COLOR: &str = "#3B82F6";
pub const DEFAULT_ICON: &str = "💪";
const MIN_ID_PREFIX_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Active,
    Paused,
}

/// Input for a new habit, straight from the user.
#[derive(Debug, Clone)]
pub struct NewHabit {
    pub name: String,
    pub description: Option<String>,
    pub frequency: Frequency,
    pub week_days: Option<BTreeSet<u8>>,
    pub reminder_time: Option<String>,
    pub reminder_message: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// Partial edit. `None` leaves a field alone; an empty string clears an
/// optional text field.
#[derive(Debug, Clone, Default)]
pub struct HabitChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub frequency: Option<Frequency>,
    pub week_days: Option<BTreeSet<u8>>,
    pub reminder_time: Option<String>,
    pub reminder_message: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

impl HabitChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.frequency.is_none()
            && self.week_days.is_none()
            && self.reminder_time.is_none()
            && self.reminder_message.is_none()
            && self.color.is_none()
            && self.icon.is_none()
    }
}

pub fn validate_habit_name(name: &str) -> Result<String, CliError> {
    let n = name.trim();
    if n.is_empty() {
        return Err(CliError::usage("Habit name is required"));
    }
    if n.chars().count() > MAX_NAME_LEN {
        return Err(CliError::usage(format!(
            "Habit name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(n.to_string())
}

pub fn validate_description(description: Option<&str>) -> Result<Option<String>, CliError> {
    let d = match description.map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) => d,
        None => return Ok(None),
    };
    if d.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(CliError::usage(format!(
            "Description must be at most {} characters",
            MAX_DESCRIPTION_LEN
        )));
    }
    Ok(Some(d.to_string()))
}

/// `HH:MM`, 24-hour. Stored zero-padded.
pub fn validate_reminder_time(time: Option<&str>) -> Result<Option<String>, CliError> {
    let t = match time.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => t,
        None => return Ok(None),
    };
    NaiveTime::parse_from_str(t, "%H:%M")
        .map(|parsed| Some(parsed.format("%H:%M").to_string()))
        .map_err(|_| CliError::usage(format!("Invalid reminder time: {}", t)))
}

fn optional_text(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Day set to store for a frequency. Daily habits keep none; weekly habits
/// must carry at least one weekday.
pub fn normalize_schedule(
    frequency: Frequency,
    week_days: Option<BTreeSet<u8>>,
) -> Result<Option<BTreeSet<u8>>, CliError> {
    match frequency {
        Frequency::Daily => Ok(None),
        Frequency::Weekly => {
            let days = week_days.unwrap_or_default();
            validate_week_days(&days)?;
            Ok(Some(days))
        }
        Frequency::Unknown => Err(CliError::usage("Invalid frequency")),
    }
}

pub fn make_habit(
    id: String,
    user_id: &str,
    input: NewHabit,
    now: DateTime<Utc>,
) -> Result<Habit, CliError> {
    Ok(Habit {
        id,
        user_id: user_id.to_string(),
        name: validate_habit_name(&input.name)?,
        description: validate_description(input.description.as_deref())?,
        frequency: input.frequency,
        week_days: normalize_schedule(input.frequency, input.week_days)?,
        reminder_time: validate_reminder_time(input.reminder_time.as_deref())?,
        reminder_message: optional_text(input.reminder_message.as_deref()),
        color: optional_text(input.color.as_deref()).unwrap_or_else(|| DEFAULT_COLOR.to_string()),
        icon: optional_text(input.icon.as_deref()).unwrap_or_else(|| DEFAULT_ICON.to_string()),
        is_active: true,
        created_at: now,
    })
}

/// Validates every change before touching `habit`, so a rejected edit leaves
/// it as it was.
pub fn apply_changes(habit: &mut Habit, changes: HabitChanges) -> Result<(), CliError> {
    let mut next = habit.clone();

    if let Some(name) = changes.name.as_deref() {
        next.name = validate_habit_name(name)?;
    }
    if let Some(d) = changes.description.as_deref() {
        next.description = validate_description(Some(d))?;
    }
    if let Some(t) = changes.reminder_time.as_deref() {
        next.reminder_time = validate_reminder_time(Some(t))?;
    }
    if let Some(m) = changes.reminder_message.as_deref() {
        next.reminder_message = optional_text(Some(m));
    }
    if let Some(c) = optional_text(changes.color.as_deref()) {
        next.color = c;
    }
    if let Some(i) = optional_text(changes.icon.as_deref()) {
        next.icon = i;
    }

    let frequency = match changes.frequency {
        Some(f) => f,
        None if changes.week_days.is_some() => Frequency::Weekly,
        None => next.frequency,
    };
    let week_days = changes.week_days.or(next.week_days.take());
    next.week_days = normalize_schedule(frequency, week_days)?;
    next.frequency = frequency;

    *habit = next;
    Ok(())
}

/// Newest first, then id for a stable order among equal timestamps.
pub fn newest_first(a: &Habit, b: &Habit) -> std::cmp::Ordering {
    b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id))
}

/// Case-insensitive by name, then id.
pub fn by_name(a: &Habit, b: &Habit) -> std::cmp::Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.id.cmp(&b.id))
}

pub fn user_habits<'a>(db: &'a Db, user_id: &'a str) -> impl Iterator<Item = &'a Habit> + 'a {
    db.habits.iter().filter(move |h| h.user_id == user_id)
}

fn matches_query(habit: &Habit, query: &str) -> bool {
    let q = query.to_lowercase();
    habit.name.to_lowercase().contains(&q)
        || habit
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(&q))
}

pub fn list_habits(
    db: &Db,
    user_id: &str,
    filter: StatusFilter,
    query: Option<&str>,
) -> Vec<Habit> {
    let query = query.map(str::trim).filter(|q| !q.is_empty());
    let mut out: Vec<Habit> = user_habits(db, user_id)
        .filter(|h| match filter {
            StatusFilter::All => true,
            StatusFilter::Active => h.is_active,
            StatusFilter::Paused => !h.is_active,
        })
        .filter(|h| query.map_or(true, |q| matches_query(h, q)))
        .cloned()
        .collect();
    out.sort_by(newest_first);
    out
}

/// Resolves a selector to an index into `db.habits`, restricted to the
/// user's habits: exact id, else unique name prefix, else unique id prefix.
pub fn select_habit_index(db: &Db, user_id: &str, selector: &str) -> Result<usize, CliError> {
    let s = selector.trim();
    if s.is_empty() {
        return Err(CliError::usage("Habit selector is required"));
    }

    let owned = || {
        db.habits
            .iter()
            .enumerate()
            .filter(|(_, h)| h.user_id == user_id)
    };

    if let Some((i, _)) = owned().find(|(_, h)| h.id == s) {
        return Ok(i);
    }

    let needle = s.to_lowercase();
    let mut matches: Vec<(usize, &Habit)> = owned()
        .filter(|(_, h)| h.name.to_lowercase().starts_with(&needle))
        .collect();

    if matches.is_empty() && needle.len() >= MIN_ID_PREFIX_LEN {
        matches = owned().filter(|(_, h)| h.id.starts_with(&needle)).collect();
    }

    match matches.len() {
        0 => Err(CliError::not_found(format!("Habit not found: {}", selector))),
        1 => Ok(matches[0].0),
        _ => {
            matches.sort_by(|a, b| by_name(a.1, b.1));
            let candidates = matches
                .iter()
                .map(|(_, h)| format!("{} {}", short_id(&h.id), h.name))
                .collect::<Vec<String>>()
                .join(", ");
            Err(CliError::ambiguous(format!(
                "Ambiguous selector '{}'. Candidates: {}",
                selector, candidates
            )))
        }
    }
}

pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Removes the habit and every completion recorded against it. Returns the
/// habit and how many completions went with it.
pub fn delete_habit(db: &mut Db, index: usize) -> (Habit, usize) {
    let habit = db.habits.remove(index);
    let before = db.completions.len();
    db.completions.retain(|c| c.habit_id != habit.id);
    let removed = before - db.completions.len();
    tracing::info!(habit_id = %habit.id, completions = removed, "habit deleted");
    (habit, removed)
}
