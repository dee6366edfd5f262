use crate::completions::habit_history;
use crate::date::{checked_add_days, date_range_inclusive};
use crate::due::is_due_today;
use crate::error::CliError;
use crate::habits::{by_name, user_habits};
use crate::model::{Db, Frequency, Habit, HabitCompletion};
use crate::schedule::week_days_to_string;
use crate::streak::{calculate_streak, longest_streak};
use crate::today::{build_today, DaySummary};
use chrono::NaiveDate;
use std::collections::BTreeSet;

pub const DEFAULT_WINDOW_DAYS: u32 = 30;
pub const MAX_WINDOW_DAYS: u32 = 3660;

#[derive(Debug, Clone, serde::Serialize)]
pub struct ProgressOutput {
    pub date: NaiveDate,
    pub total_habits: u32,
    pub active_habits: u32,
    pub today: DaySummary,
    pub best_streak: u32,
    pub window: Window,
    pub habits: Vec<HabitProgressRow>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Window {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct HabitProgressRow {
    pub habit_id: String,
    pub name: String,
    pub is_active: bool,
    pub schedule: String,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub success_rate: SuccessRate,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct SuccessRate {
    pub successes: u32,
    pub eligible: u32,
    pub rate: Option<f64>,
}

pub fn schedule_label(habit: &Habit) -> String {
    match habit.frequency {
        Frequency::Daily => "Daily".to_string(),
        Frequency::Weekly => habit
            .week_days
            .as_ref()
            .map_or_else(|| "Never".to_string(), week_days_to_string),
        Frequency::Unknown => "Never".to_string(),
    }
}

/// Share of scheduled days in `from..=to` (not before the habit existed)
/// that have a completed record.
pub fn completion_rate(
    habit: &Habit,
    completions: &[HabitCompletion],
    from: NaiveDate,
    to: NaiveDate,
) -> Result<SuccessRate, CliError> {
    let done: BTreeSet<NaiveDate> = completions
        .iter()
        .filter(|c| c.completed)
        .map(|c| c.date)
        .collect();

    let created = habit.created_date();
    let mut eligible = 0u32;
    let mut successes = 0u32;
    for d in date_range_inclusive(from, to)? {
        if d < created || !is_due_today(habit, d) {
            continue;
        }
        eligible += 1;
        if done.contains(&d) {
            successes += 1;
        }
    }

    let rate = if eligible == 0 {
        None
    } else {
        Some(f64::from(successes) / f64::from(eligible))
    };

    Ok(SuccessRate {
        successes,
        eligible,
        rate,
    })
}

pub fn build_progress(
    db: &Db,
    user_id: &str,
    today: NaiveDate,
    window_days: u32,
) -> Result<ProgressOutput, CliError> {
    if !(1..=MAX_WINDOW_DAYS).contains(&window_days) {
        return Err(CliError::usage(format!(
            "Invalid window: days must be between 1 and {}",
            MAX_WINDOW_DAYS
        )));
    }
    let from = checked_add_days(today, -(i64::from(window_days) - 1))?;

    let mut habits: Vec<&Habit> = user_habits(db, user_id).collect();
    habits.sort_by(|a, b| by_name(a, b));

    let mut rows = Vec::new();
    for h in habits.iter() {
        let history = habit_history(db, &h.id, user_id, None, Some(today));
        rows.push(HabitProgressRow {
            habit_id: h.id.clone(),
            name: h.name.clone(),
            is_active: h.is_active,
            schedule: schedule_label(h),
            current_streak: calculate_streak(&history, today),
            longest_streak: longest_streak(&history),
            success_rate: completion_rate(h, &history, from, today)?,
        });
    }

    let best_streak = rows
        .iter()
        .filter(|r| r.is_active)
        .map(|r| r.current_streak)
        .max()
        .unwrap_or(0);

    Ok(ProgressOutput {
        date: today,
        total_habits: habits.len() as u32,
        active_habits: habits.iter().filter(|h| h.is_active).count() as u32,
        today: build_today(db, user_id, today).summary,
        best_streak,
        window: Window { from, to: today },
        habits: rows,
    })
}
