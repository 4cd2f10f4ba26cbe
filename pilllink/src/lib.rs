//! PillLink library
//!
//! Intake-log calendar reconciliation and medication reminder selection,
//! with the stores and services that feed them.

pub mod api;
pub mod app;
pub mod config;
pub mod database;
pub mod error;
pub mod schedule;
pub mod services;
pub mod stores;
