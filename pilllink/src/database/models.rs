//! Database models
//!
//! Rust structs for the records exchanged with the PillLink backend and
//! kept in the local store. Field names serialize in the backend's
//! camelCase JSON shape.

use crate::error::Result;
use crate::schedule::{format_time, parse_time, TimeOfDay};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A confirmation that a dose was taken on a given day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct IntakeLogEntry {
    pub id: i64,
    /// Calendar year, when the store reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub month: u32,
    pub date: u32,
    /// Alarm this intake confirms; may dangle
    pub alarm_id: i64,
}

/// A configured daily medication alarm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AlarmRecord {
    pub id: i64,
    #[serde(default, rename = "targetId", skip_serializing_if = "Option::is_none")]
    pub member_id: Option<i64>,
    pub name: String,
    pub hour: u32,
    pub minute: u32,
    #[serde(default = "default_true")]
    pub is_enabled: bool,
    /// Dosage units per intake
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default)]
    pub item_image: Option<String>,
    #[serde(default)]
    pub item_seq: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_count() -> u32 {
    1
}

impl AlarmRecord {
    pub fn time_of_day(&self) -> TimeOfDay {
        TimeOfDay::new(self.hour, self.minute)
    }

    /// Trigger time as "HH:MM"
    pub fn display_time(&self) -> String {
        format_time(self.hour, self.minute)
    }
}

/// A person whose medications are managed from this account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMember {
    pub id: i64,
    pub name: String,
    /// e.g. "self", "mother", "son"
    pub relation: String,
    #[serde(default)]
    pub birth_year: Option<i32>,
    /// Answers queries that omit a target member
    #[serde(default)]
    pub is_default: bool,
}

/// Request body for recording an intake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIntake {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub month: u32,
    pub date: u32,
    pub alarm_id: i64,
}

impl NewIntake {
    /// Intake for `alarm_id` on a concrete calendar day
    pub fn for_day(alarm_id: i64, day: NaiveDate) -> Self {
        Self {
            year: Some(day.year()),
            month: day.month(),
            date: day.day(),
            alarm_id,
        }
    }
}

/// Create alarm request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAlarmRequest {
    pub member_id: i64,
    pub name: String,
    pub hour: u32,
    pub minute: u32,
    pub count: u32,
    pub item_image: Option<String>,
    pub item_seq: Option<String>,
}

impl CreateAlarmRequest {
    /// Alarm request with its trigger time given as "HH:MM"
    pub fn at(member_id: i64, name: &str, display: &str) -> Result<Self> {
        let time = parse_time(display)?;
        Ok(Self {
            member_id,
            name: name.to_string(),
            hour: time.hour,
            minute: time.minute,
            count: 1,
            item_image: None,
            item_seq: None,
        })
    }
}

/// Create family member request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMemberRequest {
    pub name: String,
    pub relation: String,
    pub birth_year: Option<i32>,
    pub is_default: bool,
}
