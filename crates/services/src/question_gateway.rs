use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use backend::{BackendError, QuestionSource};
use quiz_core::model::{Category, Difficulty, Question, QuestionDraft, QuestionId};

use crate::stats_gateway::StatsApiConfig;

/// `QuestionSource` implementation over the managed backend's REST surface.
///
/// Shares the stats service's base URL and credentials; the question bank is
/// part of the same managed backend.
#[derive(Clone)]
pub struct HttpQuestionGateway {
    client: Client,
    config: StatsApiConfig,
}

impl HttpQuestionGateway {
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

    fn difficulty_param(difficulty: Option<&[Difficulty]>) -> Option<String> {
        difficulty.map(|wanted| {
            wanted
                .iter()
                .map(|d| d.as_str())
                .collect::<Vec<_>>()
                .join(",")
        })
    }
}

#[async_trait]
impl QuestionSource for HttpQuestionGateway {
    async fn fetch_questions(
        &self,
        count: u32,
        difficulty: Option<&[Difficulty]>,
    ) -> Result<Vec<Question>, BackendError> {
        debug!(count, "fetching questions over http");
        let mut request = self
            .client
            .get(self.endpoint("questions"))
            .bearer_auth(&self.config.api_key)
            .query(&[("count", count.to_string())]);
        if let Some(param) = Self::difficulty_param(difficulty) {
            request = request.query(&[("difficulty", param)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Connection(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Connection(format!(
                "question bank returned {status}"
            )));
        }

        let bodies: Vec<QuestionBody> = response
            .json()
            .await
            .map_err(|e| BackendError::Serialization(e.to_string()))?;
        if bodies.len() < count as usize {
            return Err(BackendError::NotFound {
                requested: count,
                available: bodies.len(),
            });
        }

        bodies.into_iter().map(QuestionBody::into_question).collect()
    }

    async fn pool_size(&self, difficulty: Option<&[Difficulty]>) -> Result<usize, BackendError> {
        let mut request = self
            .client
            .get(self.endpoint("questions/count"))
            .bearer_auth(&self.config.api_key);
        if let Some(param) = Self::difficulty_param(difficulty) {
            request = request.query(&[("difficulty", param)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Connection(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Connection(format!(
                "question bank returned {status}"
            )));
        }

        let body: PoolCountBody = response
            .json()
            .await
            .map_err(|e| BackendError::Serialization(e.to_string()))?;
        Ok(body.count)
    }
}

//
// ─── WIRE PAYLOADS ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
struct QuestionBody {
    id: u64,
    stem: String,
    options: Vec<String>,
    correct_answer: usize,
    difficulty: String,
    category: String,
}

impl QuestionBody {
    fn into_question(self) -> Result<Question, BackendError> {
        let difficulty = Difficulty::parse(&self.difficulty)
            .map_err(|e| BackendError::Serialization(e.to_string()))?;
        let category =
            Category::new(self.category).map_err(|e| BackendError::Serialization(e.to_string()))?;
        let validated = QuestionDraft {
            stem: self.stem,
            options: self.options,
            correct_answer: self.correct_answer,
            difficulty,
            category,
        }
        .validate()
        .map_err(|e| BackendError::Serialization(e.to_string()))?;
        Ok(validated.assign_id(QuestionId::new(self.id)))
    }
}

#[derive(Debug, Deserialize)]
struct PoolCountBody {
    count: usize,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
