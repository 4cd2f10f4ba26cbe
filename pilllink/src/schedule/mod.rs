//! Intake reconciliation and reminder selection
//!
//! Pure, synchronous functions over records that were already fetched:
//! - `calendar`: intake-log entries to per-date calendar markers
//! - `window`: alarms due around the current wall-clock time
//! - `time_format`: "HH:MM" parsing and formatting

pub mod calendar;
pub mod time_format;
pub mod window;

pub use calendar::{
    build_calendar_markers, build_calendar_markers_with, label_intakes, overlay_markers,
    taken_alarm_ids_on, taken_alarm_ids_on_day, CalendarMarker, CalendarMarkers, MarkerOptions,
};
pub use time_format::{format_time, parse_time, ParseTimeError, TimeOfDay};
pub use window::{dose_date, is_due, select_due_reminders, select_pending_reminders};
