//! Reminders service
//!
//! Runs a background task that re-derives pending reminders on every
//! tick and publishes each alarm at most once per dose day.

use crate::config::REMINDER_CHANNEL_CAPACITY;
use crate::error::Result;
use crate::schedule::TimeOfDay;
use crate::services::medication::{MedicationService, PendingReminder};
use chrono::{Local, NaiveDate, Timelike};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

/// Published when an alarm becomes actionable
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderEvent {
    pub alarm_id: i64,
    pub name: String,
    /// Scheduled time as "HH:MM"
    pub time: String,
    pub count: u32,
    /// Day the dose belongs to, which is yesterday for a late alarm
    /// announced just after midnight
    pub day: NaiveDate,
}

/// Reminders service with background scheduler
#[derive(Clone)]
pub struct RemindersService {
    medication: MedicationService,
    target: Option<i64>,
    events: broadcast::Sender<ReminderEvent>,
    notified: Arc<Mutex<HashSet<(i64, NaiveDate)>>>,
}

impl RemindersService {
    pub fn new(medication: MedicationService, target: Option<i64>) -> Self {
        let (events, _) = broadcast::channel(REMINDER_CHANNEL_CAPACITY);
        Self {
            medication,
            target,
            events,
            notified: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Receive reminder events published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<ReminderEvent> {
        self.events.subscribe()
    }

    /// Start the background scheduler
    pub fn start_scheduler(self, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!("Starting reminders scheduler (every {:?})", every);

            let mut interval = tokio::time::interval(every);

            loop {
                interval.tick().await;

                let now = Local::now();
                let time = TimeOfDay::new(now.hour(), now.minute());
                if let Err(e) = self.tick_at(now.date_naive(), time).await {
                    tracing::error!("Error checking reminders: {}", e);
                }
            }
        })
    }

    /// Check pending reminders at the given moment and publish new ones
    pub async fn tick_at(&self, today: NaiveDate, now: TimeOfDay) -> Result<Vec<ReminderEvent>> {
        let pending = self
            .medication
            .pending_reminders(self.target, today, now)
            .await?;

        let mut notified = self.notified.lock().await;
        let yesterday = today.pred_opt().unwrap_or(today);
        notified.retain(|(_, day)| *day >= yesterday);

        let mut published = Vec::new();
        for PendingReminder { alarm, day } in pending {
            if !notified.insert((alarm.id, day)) {
                continue;
            }

            let event = ReminderEvent {
                alarm_id: alarm.id,
                name: alarm.name.clone(),
                time: alarm.display_time(),
                count: alarm.count,
                day,
            };

            tracing::info!("Reminder due: {} at {} ({})", event.name, event.time, day);
            if self.events.send(event.clone()).is_err() {
                tracing::debug!("No subscribers for reminder {}", alarm.id);
            }
            published.push(event);
        }

        Ok(published)
    }
}
