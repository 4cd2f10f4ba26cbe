//! Intake calendar markers
//!
//! Folds a month of intake-log entries into a sparse map of ISO date keys
//! to dot markers. One confirmed intake on a day gets the single-dose
//! color, two or more get the multi-dose color, days without intakes are
//! absent from the map.

use crate::config::{MULTI_DOSE_COLOR, SINGLE_DOSE_COLOR};
use crate::database::{AlarmRecord, IntakeLogEntry};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Per-date marker consumed by the calendar view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarMarker {
    pub marked: bool,
    pub dot_color: String,
}

impl CalendarMarker {
    fn for_count(count: usize) -> Self {
        let color = if count > 1 {
            MULTI_DOSE_COLOR
        } else {
            SINGLE_DOSE_COLOR
        };
        Self {
            marked: true,
            dot_color: color.to_string(),
        }
    }
}

pub type CalendarMarkers = BTreeMap<String, CalendarMarker>;

/// How repeated confirmations are counted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerOptions {
    /// Count several entries for the same alarm on the same day once
    #[serde(default)]
    pub collapse_repeat_confirmations: bool,
}

/// ISO date key for an entry; the entry's own year wins over `year`.
///
/// Month and date are padded, not validated.
pub fn date_key(entry: &IntakeLogEntry, year: i32) -> String {
    format!(
        "{}-{:02}-{:02}",
        entry.year.unwrap_or(year),
        entry.month,
        entry.date
    )
}

/// Build calendar markers counting every entry
pub fn build_calendar_markers(entries: &[IntakeLogEntry], year: i32) -> CalendarMarkers {
    build_calendar_markers_with(entries, year, MarkerOptions::default())
}

/// Build calendar markers with explicit counting options
pub fn build_calendar_markers_with(
    entries: &[IntakeLogEntry],
    year: i32,
    options: MarkerOptions,
) -> CalendarMarkers {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut seen: HashSet<(String, i64)> = HashSet::new();

    for entry in entries {
        let key = date_key(entry, year);
        if options.collapse_repeat_confirmations && !seen.insert((key.clone(), entry.alarm_id)) {
            continue;
        }
        *counts.entry(key).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(key, count)| (key, CalendarMarker::for_count(count)))
        .collect()
}

/// Layer markers: `overrides` beat `computed`, which beat `baseline`
pub fn overlay_markers(
    baseline: &CalendarMarkers,
    computed: &CalendarMarkers,
    overrides: &CalendarMarkers,
) -> CalendarMarkers {
    let mut merged = baseline.clone();
    for layer in [computed, overrides] {
        for (key, marker) in layer {
            merged.insert(key.clone(), marker.clone());
        }
    }
    merged
}

/// Alarm ids confirmed on the given day
pub fn taken_alarm_ids_on(entries: &[IntakeLogEntry], month: u32, date: u32) -> HashSet<i64> {
    entries
        .iter()
        .filter(|e| e.month == month && e.date == date)
        .map(|e| e.alarm_id)
        .collect()
}

/// Alarm ids confirmed on `day`; entries without a year match any year
pub fn taken_alarm_ids_on_day(entries: &[IntakeLogEntry], day: NaiveDate) -> HashSet<i64> {
    entries
        .iter()
        .filter(|e| e.year.map_or(true, |y| y == day.year()))
        .filter(|e| e.month == day.month() && e.date == day.day())
        .map(|e| e.alarm_id)
        .collect()
}

/// Pair each entry with its alarm's name; dangling references get `None`
pub fn label_intakes<'a>(
    entries: &'a [IntakeLogEntry],
    alarms: &'a [AlarmRecord],
) -> Vec<(&'a IntakeLogEntry, Option<&'a str>)> {
    let names: HashMap<i64, &str> = alarms.iter().map(|a| (a.id, a.name.as_str())).collect();
    entries
        .iter()
        .map(|e| (e, names.get(&e.alarm_id).copied()))
        .collect()
}
