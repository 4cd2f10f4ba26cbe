//! Services module
//!
//! Business logic services that coordinate between stores and the
//! reconciliation functions.

pub mod medication;
pub mod reminders;
pub mod settings;

pub use medication::{MedicationService, PendingReminder};
pub use reminders::{ReminderEvent, RemindersService};
pub use settings::{AppSettings, Backend, SettingsService};
