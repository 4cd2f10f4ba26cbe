//! Due-window reminder selection
//!
//! An alarm is due when its trigger time is within `tolerance` minutes of
//! the current time, measured either directly or across midnight. A match
//! across midnight belongs to the neighbouring calendar day.

use super::calendar::taken_alarm_ids_on_day;
use super::TimeOfDay;
use crate::config::MINUTES_PER_DAY;
use crate::database::{AlarmRecord, IntakeLogEntry};
use chrono::NaiveDate;

/// Whether `alarm_at` falls inside the due window around `now`
pub fn is_due(alarm_at: TimeOfDay, now: TimeOfDay, tolerance_minutes: u32) -> bool {
    let diff = alarm_at
        .minutes_since_midnight()
        .abs_diff(now.minutes_since_midnight());

    diff <= tolerance_minutes || diff >= MINUTES_PER_DAY.saturating_sub(tolerance_minutes)
}

/// Enabled alarms due at `now`, in input order
pub fn select_due_reminders(
    alarms: &[AlarmRecord],
    now: TimeOfDay,
    tolerance_minutes: u32,
) -> Vec<&AlarmRecord> {
    alarms
        .iter()
        .filter(|alarm| alarm.is_enabled)
        .filter(|alarm| is_due(alarm.time_of_day(), now, tolerance_minutes))
        .collect()
}

/// Calendar day of the dose an alarm due at `now` stands for.
///
/// A direct match is today's dose. A match only across midnight is
/// yesterday's when the alarm time is later than `now`, tomorrow's when
/// it is earlier. Only meaningful for alarms that are due.
pub fn dose_date(
    alarm_at: TimeOfDay,
    today: NaiveDate,
    now: TimeOfDay,
    tolerance_minutes: u32,
) -> NaiveDate {
    let at = alarm_at.minutes_since_midnight();
    let current = now.minutes_since_midnight();

    if at.abs_diff(current) <= tolerance_minutes {
        return today;
    }

    let shifted = if at > current {
        today.pred_opt()
    } else {
        today.succ_opt()
    };
    shifted.unwrap_or(today)
}

/// Due alarms not yet confirmed on their dose day, paired with that day
///
/// `entries` must cover the months of every dose day involved.
pub fn select_pending_reminders<'a>(
    alarms: &'a [AlarmRecord],
    entries: &[IntakeLogEntry],
    today: NaiveDate,
    now: TimeOfDay,
    tolerance_minutes: u32,
) -> Vec<(&'a AlarmRecord, NaiveDate)> {
    select_due_reminders(alarms, now, tolerance_minutes)
        .into_iter()
        .map(|alarm| {
            let day = dose_date(alarm.time_of_day(), today, now, tolerance_minutes);
            (alarm, day)
        })
        .filter(|(alarm, day)| !taken_alarm_ids_on_day(entries, *day).contains(&alarm.id))
        .collect()
}
