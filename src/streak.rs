use crate::date::add_days;
use crate::model::HabitCompletion;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Distinct dates that carry a completed record. Skipped and untouched
/// records drop out here, so they behave exactly like a missing day.
fn completed_dates(completions: &[HabitCompletion]) -> BTreeSet<NaiveDate> {
    completions
        .iter()
        .filter(|c| c.completed)
        .map(|c| c.date)
        .collect()
}

/// Consecutive completed days walking back from `today`, stopping at the
/// first gap. No completion on `today` means 0.
///
/// The records are expected to belong to one habit and one user; nothing is
/// filtered by id here.
pub fn calculate_streak(completions: &[HabitCompletion], today: NaiveDate) -> u32 {
    let dates = completed_dates(completions);

    let mut streak = 0u32;
    for (i, date) in dates.iter().rev().enumerate() {
        let expected = add_days(today, -(i as i64));
        if *date != expected {
            break;
        }
        streak += 1;
    }
    streak
}

/// Longest run of consecutive completed days anywhere in the history.
pub fn longest_streak(completions: &[HabitCompletion]) -> u32 {
    let mut longest = 0u32;
    let mut run = 0u32;
    let mut prev: Option<NaiveDate> = None;

    for date in completed_dates(completions) {
        run = match prev {
            Some(p) if add_days(p, 1) == date => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(date);
    }
    longest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::parse_date;

    const TODAY: &str = "2026-10-19";

    fn today() -> NaiveDate {
        parse_date(TODAY, "today").unwrap()
    }

    fn rec(days_ago: i64, completed: bool, skipped: bool) -> HabitCompletion {
        HabitCompletion {
            id: format!("c{}", days_ago),
            habit_id: "h1".to_string(),
            user_id: "u1".to_string(),
            date: add_days(today(), -days_ago),
            completed,
            skipped,
            note: None,
            completed_at: None,
        }
    }

    fn done(days_ago: i64) -> HabitCompletion {
        rec(days_ago, true, false)
    }

    #[test]
    fn empty_history_is_zero() {
        assert_eq!(calculate_streak(&[], today()), 0);
        assert_eq!(longest_streak(&[]), 0);
    }

    #[test]
    fn three_consecutive_days_ending_today() {
        let c = vec![done(0), done(1), done(2)];
        assert_eq!(calculate_streak(&c, today()), 3);
    }

    #[test]
    fn gap_yesterday_stops_at_one() {
        let c = vec![done(0), done(2)];
        assert_eq!(calculate_streak(&c, today()), 1);
    }

    #[test]
    fn yesterday_only_is_zero() {
        let c = vec![done(1), done(2), done(3)];
        assert_eq!(calculate_streak(&c, today()), 0);
    }

    #[test]
    fn incomplete_and_skipped_records_are_ignored() {
        let only_misses = vec![rec(0, false, true), rec(1, false, false)];
        assert_eq!(calculate_streak(&only_misses, today()), 0);

        // A skipped yesterday behaves like a missing yesterday.
        let mut skipped_yesterday = vec![done(0), rec(1, false, true), done(2)];
        skipped_yesterday[1].note = Some("travelling".to_string());
        assert_eq!(calculate_streak(&skipped_yesterday, today()), 1);
    }

    #[test]
    fn input_order_does_not_matter() {
        let sorted = vec![done(0), done(1), done(2), done(4)];
        let shuffled = vec![done(2), done(4), done(0), done(1)];
        assert_eq!(calculate_streak(&sorted, today()), 3);
        assert_eq!(calculate_streak(&shuffled, today()), 3);
        assert_eq!(calculate_streak(&shuffled, today()), 3);
    }

    #[test]
    fn duplicate_dates_count_once() {
        let c = vec![done(0), done(0), done(1), done(1), done(3)];
        assert_eq!(calculate_streak(&c, today()), 2);
    }

    #[test]
    fn future_records_do_not_start_a_streak() {
        let c = vec![done(-1), done(0), done(1)];
        assert_eq!(calculate_streak(&c, today()), 0);
    }

    #[test]
    fn longest_run_anywhere_in_history() {
        let c = vec![done(0), done(3), done(4), done(5), done(6), done(9), done(10)];
        assert_eq!(longest_streak(&c), 4);
        assert_eq!(longest_streak(&[done(7)]), 1);
        assert_eq!(longest_streak(&[rec(0, false, true)]), 0);
    }
}
