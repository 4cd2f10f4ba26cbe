//! Error types for PillLink
//!
//! All errors use thiserror for structured error handling.
//! These errors serialize to their display string for the presentation layer.

use crate::schedule::ParseTimeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid time: {0}")]
    TimeParse(#[from] ParseTimeError),

    #[error("Family member not found: {0}")]
    MemberNotFound(i64),

    #[error("Alarm not found: {0}")]
    AlarmNotFound(i64),

    #[error("No default family member configured")]
    NoDefaultMember,

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
