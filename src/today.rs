use crate::completions::{completion_on, habit_history};
use crate::due::is_due_today;
use crate::habits::{newest_first, user_habits};
use crate::model::{Db, Habit};
use crate::streak::calculate_streak;
use chrono::NaiveDate;

#[derive(Debug, Clone, serde::Serialize)]
pub struct TodayOutput {
    pub date: NaiveDate,
    pub habits: Vec<TodayHabitRow>,
    pub summary: DaySummary,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct TodayHabitRow {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub frequency: String,
    pub completed: bool,
    pub skipped: bool,
    pub note: Option<String>,
    pub streak: u32,
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct DaySummary {
    pub completed: u32,
    pub total: u32,
    pub percent: u32,
}

impl DaySummary {
    pub fn new(completed: u32, total: u32) -> Self {
        let percent = if total == 0 {
            0
        } else {
            (f64::from(completed) / f64::from(total) * 100.0).round() as u32
        };
        Self {
            completed,
            total,
            percent,
        }
    }
}

/// Active habits whose rule schedules them on `date`, newest first.
pub fn due_habits<'a>(db: &'a Db, user_id: &'a str, date: NaiveDate) -> Vec<&'a Habit> {
    let mut out: Vec<&Habit> = user_habits(db, user_id)
        .filter(|h| h.is_active && is_due_today(h, date))
        .collect();
    out.sort_by(|a, b| newest_first(a, b));
    out
}

pub fn build_today(db: &Db, user_id: &str, today: NaiveDate) -> TodayOutput {
    let mut rows = Vec::new();
    for h in due_habits(db, user_id, today) {
        let rec = completion_on(db, &h.id, user_id, today);
        let history = habit_history(db, &h.id, user_id, None, Some(today));
        rows.push(TodayHabitRow {
            id: h.id.clone(),
            name: h.name.clone(),
            icon: h.icon.clone(),
            frequency: h.frequency.as_str().to_string(),
            completed: rec.is_some_and(|c| c.completed),
            skipped: rec.is_some_and(|c| c.skipped),
            note: rec.and_then(|c| c.note.clone()),
            streak: calculate_streak(&history, today),
        });
    }

    let completed = rows.iter().filter(|r| r.completed).count() as u32;
    let summary = DaySummary::new(completed, rows.len() as u32);

    TodayOutput {
        date: today,
        habits: rows,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completions::{mark_complete, skip};
    use crate::date::{add_days, parse_date};
    use crate::habits::{make_habit, NewHabit};
    use crate::model::{default_db, Frequency};
    use chrono::{Duration, Utc};

    fn add(db: &mut Db, id: &str, user: &str, frequency: Frequency, days: Option<&[u8]>, offset: i64) {
        let input = NewHabit {
            name: id.to_string(),
            description: None,
            frequency,
            week_days: days.map(|d| d.iter().copied().collect()),
            reminder_time: None,
            reminder_message: None,
            color: None,
            icon: None,
        };
        let h = make_habit(id.to_string(), user, input, Utc::now() + Duration::seconds(offset)).unwrap();
        db.habits.push(h);
    }

    #[test]
    fn percent_rounds_and_handles_zero() {
        assert_eq!(DaySummary::new(0, 0).percent, 0);
        assert_eq!(DaySummary::new(1, 3).percent, 33);
        assert_eq!(DaySummary::new(2, 3).percent, 67);
        assert_eq!(DaySummary::new(3, 3).percent, 100);
    }

    #[test]
    fn dashboard_lists_active_due_habits_with_state() {
        // Monday
        let today = parse_date("2026-10-19", "today").unwrap();
        let now = Utc::now();
        let mut db = default_db();
        add(&mut db, "daily", "u1", Frequency::Daily, None, 0);
        add(&mut db, "mondays", "u1", Frequency::Weekly, Some(&[1]), 1);
        add(&mut db, "sundays", "u1", Frequency::Weekly, Some(&[0]), 2);
        add(&mut db, "paused", "u1", Frequency::Daily, None, 3);
        add(&mut db, "theirs", "u2", Frequency::Daily, None, 4);
        db.habits[3].is_active = false;

        mark_complete(&mut db, "daily", "u1", today, true, Some("done early"), now);
        mark_complete(&mut db, "daily", "u1", add_days(today, -1), true, None, now);
        skip(&mut db, "mondays", "u1", today);

        let out = build_today(&db, "u1", today);
        let ids: Vec<&str> = out.habits.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["mondays", "daily"]);

        let daily = &out.habits[1];
        assert!(daily.completed && !daily.skipped);
        assert_eq!(daily.streak, 2);
        assert_eq!(daily.note.as_deref(), Some("done early"));

        let mondays = &out.habits[0];
        assert!(mondays.skipped && !mondays.completed);
        assert_eq!(mondays.streak, 0);

        assert_eq!(out.summary.completed, 1);
        assert_eq!(out.summary.total, 2);
        assert_eq!(out.summary.percent, 50);
    }
}
