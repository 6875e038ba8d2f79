use std::env;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use backend::{BackendError, StatsAck, StatsStore, StatsSubmission};
use quiz_core::model::{SessionId, UserId, UserStats};

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct StatsApiConfig {
    pub base_url: String,
    pub api_key: String,
}

impl StatsApiConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("MEDQUIZ_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url = env::var("MEDQUIZ_API_BASE_URL")
            .unwrap_or_else(|_| "https://api.medquiz.example/v1".into());
        Some(Self { base_url, api_key })
    }
}

//
// ─── HTTP GATEWAY ──────────────────────────────────────────────────────────────
//

/// `StatsStore` implementation over the managed backend's REST surface.
///
/// The backend deduplicates submissions by session id, so replaying a
/// request after a lost acknowledgement is safe.
#[derive(Clone)]
pub struct HttpStatsGateway {
    client: Client,
    config: StatsApiConfig,
}

impl HttpStatsGateway {
    #[must_use]
    pub fn new(config: StatsApiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Build a gateway from the environment, `None` when no API key is set.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        StatsApiConfig::from_env().map(Self::new)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    async fn status_error(status: StatusCode, response: reqwest::Response) -> BackendError {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("message")?.as_str().map(str::to_string))
            .unwrap_or(body);
        BackendError::Connection(format!("stats service returned {status}: {message}"))
    }
}

#[async_trait]
impl StatsStore for HttpStatsGateway {
    async fn submit_stats(&self, submission: &StatsSubmission) -> Result<StatsAck, BackendError> {
        debug!(session = %submission.session_id, "submitting stats over http");
        let response = self
            .client
            .post(self.endpoint("stats/submissions"))
            .bearer_auth(&self.config.api_key)
            .json(submission)
            .send()
            .await
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error(status, response).await);
        }

        let body: SubmitStatsResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Serialization(e.to_string()))?;
        Ok(StatsAck {
            session_id: body.session_id,
            stats: body.stats.into_stats()?,
        })
    }

    async fn get_stats(&self, user_id: &UserId) -> Result<Option<UserStats>, BackendError> {
        let response = self
            .client
            .get(self.endpoint(&format!("stats/users/{user_id}")))
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(Self::status_error(status, response).await);
        }

        let body: UserStatsBody = response
            .json()
            .await
            .map_err(|e| BackendError::Serialization(e.to_string()))?;
        Ok(Some(body.into_stats()?))
    }

    async fn list_stats(&self) -> Result<Vec<UserStats>, BackendError> {
        let response = self
            .client
            .get(self.endpoint("stats/users"))
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error(status, response).await);
        }

        let body: Vec<UserStatsBody> = response
            .json()
            .await
            .map_err(|e| BackendError::Serialization(e.to_string()))?;
        body.into_iter().map(UserStatsBody::into_stats).collect()
    }
}

//
// ─── WIRE PAYLOADS ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
struct SubmitStatsResponse {
    session_id: SessionId,
    stats: UserStatsBody,
}

#[derive(Debug, Deserialize)]
struct UserStatsBody {
    user_id: String,
    points: u32,
    total_quizzes: u32,
    accuracy: u8,
    streak: u32,
    last_quiz_at: Option<DateTime<Utc>>,
}

impl UserStatsBody {
    fn into_stats(self) -> Result<UserStats, BackendError> {
        UserStats::from_persisted(
            UserId::new(self.user_id),
            self.points,
            self.total_quizzes,
            self.accuracy,
            self.streak,
            self.last_quiz_at,
        )
        .map_err(|e| BackendError::Serialization(e.to_string()))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
