use crate::date::weekday_index;
use crate::model::{Frequency, Habit};
use chrono::NaiveDate;

/// Whether `habit`'s recurrence rule schedules it on `date`.
///
/// Active/paused state is not considered; callers filter on `is_active`.
/// Weekly habits with a missing or empty day set, and frequencies this build
/// does not know, are never due.
pub fn is_due_today(habit: &Habit, date: NaiveDate) -> bool {
    match habit.frequency {
        Frequency::Daily => true,
        Frequency::Weekly => habit
            .week_days
            .as_ref()
            .is_some_and(|days| days.contains(&weekday_index(date))),
        Frequency::Unknown => false,
    }
}
