//! HTTP client for the PillLink backend
//!
//! Implements the collaborator traits over the REST API. Every request
//! carries the session token as a bearer credential when one is set.

use crate::config::{API_TIMEOUT_SECS, API_USER_AGENT};
use crate::database::{AlarmRecord, IntakeLogEntry, NewIntake};
use crate::error::{AppError, Result};
use crate::stores::{AlarmStore, IntakeLogStore};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Error body returned by the backend on failure
#[derive(Deserialize, Debug)]
struct ApiErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// REST client for intake logs and alarms
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session_token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, session_token: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(API_USER_AGENT)
            .timeout(Duration::from_secs(API_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session_token: session_token.filter(|t| !t.is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.session_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let response = self.authorize(req).send().await?;
        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Query parameters selecting a member; empty for the default member
fn target_query(target: Option<i64>) -> Vec<(&'static str, String)> {
    target
        .map(|id| vec![("targetId", id.to_string())])
        .unwrap_or_default()
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!("Backend returned {}: {}", status, body);
    Err(api_error(status.as_u16(), &body))
}

/// Build an API error from a status code and response body
fn api_error(status: u16, body: &str) -> AppError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("request failed with status {}", status)
            } else {
                body.trim().to_string()
            }
        });

    AppError::Api { status, message }
}

#[async_trait]
impl IntakeLogStore for ApiClient {
    async fn fetch_intake_logs(
        &self,
        target: Option<i64>,
        month: u32,
    ) -> Result<Vec<IntakeLogEntry>> {
        let mut query = target_query(target);
        query.push(("month", month.to_string()));

        let entries: Vec<IntakeLogEntry> = self
            .send(self.http.get(self.url("intake-logs")).query(&query))
            .await?;

        tracing::debug!("Fetched {} intake logs for month {}", entries.len(), month);
        Ok(entries)
    }

    async fn record_intake(&self, target: Option<i64>, intake: NewIntake) -> Result<IntakeLogEntry> {
        let entry: IntakeLogEntry = self
            .send(
                self.http
                    .post(self.url("intake-logs"))
                    .query(&target_query(target))
                    .json(&intake),
            )
            .await?;

        tracing::info!("Recorded intake {} for alarm {}", entry.id, entry.alarm_id);
        Ok(entry)
    }
}

#[async_trait]
impl AlarmStore for ApiClient {
    async fn fetch_alarms(&self, target: Option<i64>) -> Result<Vec<AlarmRecord>> {
        let alarms: Vec<AlarmRecord> = self
            .send(self.http.get(self.url("alarms")).query(&target_query(target)))
            .await?;

        tracing::debug!("Fetched {} alarms", alarms.len());
        Ok(alarms)
    }
}
