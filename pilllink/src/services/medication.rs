//! Medication service
//!
//! Fetches raw records from the configured store and runs them through
//! the reconciliation functions, returning presentation-ready results.

use crate::config::DEFAULT_TOLERANCE_MINUTES;
use crate::database::{AlarmRecord, IntakeLogEntry, NewIntake};
use crate::error::Result;
use crate::schedule::{
    build_calendar_markers_with, dose_date, label_intakes, select_due_reminders,
    select_pending_reminders, CalendarMarkers, MarkerOptions, TimeOfDay,
};
use crate::services::settings::AppSettings;
use crate::stores::{AlarmStore, IntakeLogStore, MedicationStore};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

/// A due alarm with the calendar day its dose belongs to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingReminder {
    pub alarm: AlarmRecord,
    pub day: NaiveDate,
}

/// Service joining a store with the reconciliation logic
#[derive(Clone)]
pub struct MedicationService {
    store: Arc<dyn MedicationStore>,
    tolerance_minutes: u32,
    marker_options: MarkerOptions,
}

impl MedicationService {
    pub fn new(store: Arc<dyn MedicationStore>) -> Self {
        Self {
            store,
            tolerance_minutes: DEFAULT_TOLERANCE_MINUTES,
            marker_options: MarkerOptions::default(),
        }
    }

    pub fn from_settings(store: Arc<dyn MedicationStore>, settings: &AppSettings) -> Self {
        Self::new(store)
            .with_tolerance(settings.reminders.tolerance_minutes)
            .with_marker_options(settings.calendar)
    }

    pub fn with_tolerance(mut self, tolerance_minutes: u32) -> Self {
        self.tolerance_minutes = tolerance_minutes;
        self
    }

    pub fn with_marker_options(mut self, options: MarkerOptions) -> Self {
        self.marker_options = options;
        self
    }

    pub fn tolerance_minutes(&self) -> u32 {
        self.tolerance_minutes
    }

    /// Calendar markers for one member and month
    pub async fn calendar_markers(
        &self,
        target: Option<i64>,
        year: i32,
        month: u32,
    ) -> Result<CalendarMarkers> {
        let entries: Vec<IntakeLogEntry> = self
            .store
            .fetch_intake_logs(target, month)
            .await?
            .into_iter()
            .filter(|e| e.year.map_or(true, |y| y == year))
            .collect();

        Ok(build_calendar_markers_with(
            &entries,
            year,
            self.marker_options,
        ))
    }

    /// Enabled alarms inside the due window at `now`
    pub async fn due_reminders(
        &self,
        target: Option<i64>,
        now: TimeOfDay,
    ) -> Result<Vec<AlarmRecord>> {
        let alarms = self.store.fetch_alarms(target).await?;
        Ok(select_due_reminders(&alarms, now, self.tolerance_minutes)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Due alarms whose dose is not confirmed yet
    ///
    /// Around midnight a due alarm may stand for yesterday's or tomorrow's
    /// dose, so the intake logs of that day's month are fetched as well.
    pub async fn pending_reminders(
        &self,
        target: Option<i64>,
        today: NaiveDate,
        now: TimeOfDay,
    ) -> Result<Vec<PendingReminder>> {
        let alarms = self.store.fetch_alarms(target).await?;

        let tolerance = self.tolerance_minutes;
        let months: BTreeSet<u32> = select_due_reminders(&alarms, now, tolerance)
            .into_iter()
            .map(|alarm| dose_date(alarm.time_of_day(), today, now, tolerance).month())
            .collect();

        let mut entries = Vec::new();
        for month in months {
            entries.extend(self.store.fetch_intake_logs(target, month).await?);
        }

        Ok(
            select_pending_reminders(&alarms, &entries, today, now, tolerance)
                .into_iter()
                .map(|(alarm, day)| PendingReminder {
                    alarm: alarm.clone(),
                    day,
                })
                .collect(),
        )
    }

    /// Confirm that the dose for `alarm_id` was taken on `day`
    pub async fn confirm_intake(
        &self,
        target: Option<i64>,
        alarm_id: i64,
        day: NaiveDate,
    ) -> Result<IntakeLogEntry> {
        tracing::info!("Confirming intake of alarm {} on {}", alarm_id, day);
        self.store
            .record_intake(target, NewIntake::for_day(alarm_id, day))
            .await
    }

    /// Month of intake entries with the medication name, when still known
    pub async fn intake_history(
        &self,
        target: Option<i64>,
        month: u32,
    ) -> Result<Vec<(IntakeLogEntry, Option<String>)>> {
        let (alarms, entries) = tokio::try_join!(
            self.store.fetch_alarms(target),
            self.store.fetch_intake_logs(target, month),
        )?;

        Ok(label_intakes(&entries, &alarms)
            .into_iter()
            .map(|(entry, name)| (entry.clone(), name.map(str::to_string)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MULTI_DOSE_COLOR, SINGLE_DOSE_COLOR};
    use crate::database::{
        initialize_database, CreateAlarmRequest, CreateMemberRequest, Repository,
    };
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_service() -> (MedicationService, Repository, i64) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        initialize_database(&pool).await.unwrap();
        let repo = Repository::new(pool);

        let member = repo
            .create_member(CreateMemberRequest {
                name: "Min".to_string(),
                relation: "self".to_string(),
                birth_year: Some(1990),
                is_default: true,
            })
            .await
            .unwrap();

        let service = MedicationService::new(Arc::new(repo.clone()));
        (service, repo, member.id)
    }

    async fn add_alarm(repo: &Repository, member_id: i64, name: &str, hour: u32, minute: u32) -> AlarmRecord {
        repo.create_alarm(CreateAlarmRequest {
            member_id,
            name: name.to_string(),
            hour,
            minute,
            count: 1,
            item_image: None,
            item_seq: None,
        })
        .await
        .unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_calendar_markers_for_month() {
        let (service, repo, member_id) = create_test_service().await;
        let morning = add_alarm(&repo, member_id, "Morning", 8, 0).await;
        let evening = add_alarm(&repo, member_id, "Evening", 20, 0).await;

        service.confirm_intake(None, morning.id, day(2024, 9, 5)).await.unwrap();
        service.confirm_intake(None, evening.id, day(2024, 9, 5)).await.unwrap();
        service.confirm_intake(None, morning.id, day(2024, 9, 6)).await.unwrap();

        let markers = service.calendar_markers(None, 2024, 9).await.unwrap();

        assert_eq!(markers.len(), 2);
        assert_eq!(markers["2024-09-05"].dot_color, MULTI_DOSE_COLOR);
        assert_eq!(markers["2024-09-06"].dot_color, SINGLE_DOSE_COLOR);
        assert!(service.calendar_markers(None, 2024, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_calendar_markers_skip_other_years() {
        let (service, repo, member_id) = create_test_service().await;
        let morning = add_alarm(&repo, member_id, "Morning", 8, 0).await;

        service.confirm_intake(None, morning.id, day(2023, 9, 5)).await.unwrap();
        service.confirm_intake(None, morning.id, day(2024, 9, 5)).await.unwrap();
        service.confirm_intake(None, morning.id, day(2024, 9, 5)).await.unwrap();
        service.confirm_intake(None, morning.id, day(2023, 9, 7)).await.unwrap();

        let markers = service.calendar_markers(None, 2024, 9).await.unwrap();

        let keys: Vec<&str> = markers.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["2024-09-05"]);
        assert_eq!(markers["2024-09-05"].dot_color, MULTI_DOSE_COLOR);

        let last_year = service.calendar_markers(None, 2023, 9).await.unwrap();
        assert_eq!(last_year.len(), 2);
        assert_eq!(last_year["2023-09-05"].dot_color, SINGLE_DOSE_COLOR);
    }

    #[tokio::test]
    async fn test_collapse_option_applies() {
        let (service, repo, member_id) = create_test_service().await;
        let morning = add_alarm(&repo, member_id, "Morning", 8, 0).await;

        service.confirm_intake(None, morning.id, day(2024, 9, 5)).await.unwrap();
        service.confirm_intake(None, morning.id, day(2024, 9, 5)).await.unwrap();

        let counted = service.calendar_markers(None, 2024, 9).await.unwrap();
        assert_eq!(counted["2024-09-05"].dot_color, MULTI_DOSE_COLOR);

        let collapsing = service.with_marker_options(MarkerOptions {
            collapse_repeat_confirmations: true,
        });
        let collapsed = collapsing.calendar_markers(None, 2024, 9).await.unwrap();
        assert_eq!(collapsed["2024-09-05"].dot_color, SINGLE_DOSE_COLOR);
    }

    #[tokio::test]
    async fn test_due_reminders_skip_disabled() {
        let (service, repo, member_id) = create_test_service().await;
        let morning = add_alarm(&repo, member_id, "Morning", 8, 0).await;
        let vitamin = add_alarm(&repo, member_id, "Vitamin", 8, 20).await;
        add_alarm(&repo, member_id, "Evening", 20, 0).await;
        repo.set_alarm_enabled(vitamin.id, false).await.unwrap();

        let due = service.due_reminders(None, TimeOfDay::new(8, 30)).await.unwrap();

        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, morning.id);
    }

    #[tokio::test]
    async fn test_pending_reminders_exclude_taken_today() {
        let (service, repo, member_id) = create_test_service().await;
        let morning = add_alarm(&repo, member_id, "Morning", 8, 0).await;
        let vitamin = add_alarm(&repo, member_id, "Vitamin", 8, 15).await;
        let today = day(2024, 9, 5);

        service.confirm_intake(None, morning.id, today).await.unwrap();
        // last year's entry on the same day does not count
        service
            .confirm_intake(None, vitamin.id, day(2023, 9, 5))
            .await
            .unwrap();

        let pending = service
            .pending_reminders(None, today, TimeOfDay::new(8, 10))
            .await
            .unwrap();

        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].alarm.id, vitamin.id);
        assert_eq!(pending[0].day, today);
    }

    #[tokio::test]
    async fn test_pending_after_midnight_uses_previous_day() {
        let (service, repo, member_id) = create_test_service().await;
        let night = add_alarm(&repo, member_id, "Night", 23, 50).await;

        service
            .confirm_intake(None, night.id, day(2024, 9, 5))
            .await
            .unwrap();

        let pending = service
            .pending_reminders(None, day(2024, 9, 6), TimeOfDay::new(0, 5))
            .await
            .unwrap();
        assert!(pending.is_empty());

        let pending = service
            .pending_reminders(None, day(2024, 9, 6), TimeOfDay::new(23, 50))
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].day, day(2024, 9, 6));
    }

    #[tokio::test]
    async fn test_pending_across_month_boundary() {
        let (service, repo, member_id) = create_test_service().await;
        let night = add_alarm(&repo, member_id, "Night", 23, 50).await;
        let first = day(2024, 9, 1);

        let pending = service
            .pending_reminders(None, first, TimeOfDay::new(0, 5))
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].day, day(2024, 8, 31));

        service
            .confirm_intake(None, night.id, day(2024, 8, 31))
            .await
            .unwrap();

        let pending = service
            .pending_reminders(None, first, TimeOfDay::new(0, 5))
            .await
            .unwrap();
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_tolerance_from_settings() {
        let (_, repo, member_id) = create_test_service().await;
        add_alarm(&repo, member_id, "Morning", 8, 0).await;

        let mut settings = AppSettings::default();
        settings.reminders.tolerance_minutes = 10;
        let service = MedicationService::from_settings(Arc::new(repo), &settings);

        assert_eq!(service.tolerance_minutes(), 10);
        assert!(service
            .due_reminders(None, TimeOfDay::new(8, 30))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_intake_history_labels_deleted_alarms() {
        let (service, repo, member_id) = create_test_service().await;
        let morning = add_alarm(&repo, member_id, "Morning", 8, 0).await;
        let old = add_alarm(&repo, member_id, "Old prescription", 9, 0).await;

        service.confirm_intake(None, morning.id, day(2024, 9, 5)).await.unwrap();
        service.confirm_intake(None, old.id, day(2024, 9, 5)).await.unwrap();
        repo.delete_alarm(old.id).await.unwrap();

        let history = service.intake_history(None, 9).await.unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].1.as_deref(), Some("Morning"));
        assert_eq!(history[1].1, None);
    }
}
