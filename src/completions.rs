use crate::model::{new_id, Db, HabitCompletion};
use chrono::{DateTime, NaiveDate, Utc};

fn find_completion_index(db: &Db, habit_id: &str, user_id: &str, date: NaiveDate) -> Option<usize> {
    db.completions
        .iter()
        .position(|c| c.habit_id == habit_id && c.user_id == user_id && c.date == date)
}

/// Returns the record for (habit, user, date), creating an untouched one if
/// none exists yet. This is the only place completions are created, which
/// keeps them unique per day.
fn upsert<'a>(
    db: &'a mut Db,
    habit_id: &str,
    user_id: &str,
    date: NaiveDate,
) -> &'a mut HabitCompletion {
    let idx = match find_completion_index(db, habit_id, user_id, date) {
        Some(i) => i,
        None => {
            db.completions.push(HabitCompletion {
                id: new_id(),
                habit_id: habit_id.to_string(),
                user_id: user_id.to_string(),
                date,
                completed: false,
                skipped: false,
                note: None,
                completed_at: None,
            });
            db.completions.len() - 1
        }
    };
    &mut db.completions[idx]
}

/// Marks the day done (or, with `completed = false`, not done). Always
/// clears `skipped`; the note is replaced by `note`.
pub fn mark_complete(
    db: &mut Db,
    habit_id: &str,
    user_id: &str,
    date: NaiveDate,
    completed: bool,
    note: Option<&str>,
    now: DateTime<Utc>,
) -> HabitCompletion {
    let rec = upsert(db, habit_id, user_id, date);
    rec.completed = completed;
    rec.skipped = false;
    rec.note = note.map(str::trim).filter(|n| !n.is_empty()).map(str::to_string);
    rec.completed_at = if completed { Some(now) } else { None };

    tracing::debug!(habit_id, %date, completed, "completion recorded");
    rec.clone()
}

/// Marks the day skipped. A skip is never a completion.
pub fn skip(db: &mut Db, habit_id: &str, user_id: &str, date: NaiveDate) -> HabitCompletion {
    let rec = upsert(db, habit_id, user_id, date);
    rec.completed = false;
    rec.skipped = true;
    rec.completed_at = None;

    tracing::debug!(habit_id, %date, "habit skipped");
    rec.clone()
}

pub fn completion_on<'a>(
    db: &'a Db,
    habit_id: &str,
    user_id: &str,
    date: NaiveDate,
) -> Option<&'a HabitCompletion> {
    find_completion_index(db, habit_id, user_id, date).map(|i| &db.completions[i])
}

/// The habit's records for one user, newest first, optionally bounded.
pub fn habit_history(
    db: &Db,
    habit_id: &str,
    user_id: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Vec<HabitCompletion> {
    let mut out: Vec<HabitCompletion> = db
        .completions
        .iter()
        .filter(|c| c.habit_id == habit_id && c.user_id == user_id)
        .filter(|c| from.map_or(true, |f| c.date >= f))
        .filter(|c| to.map_or(true, |t| c.date <= t))
        .cloned()
        .collect();
    out.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
    out
}
