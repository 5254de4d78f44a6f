use std::collections::HashSet;
use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use quiz_core::model::{
    AnswerOption, Difficulty, MaterialId, OptionId, Question, QuestionId, QuizDefinition, QuizId,
    UserId,
};

use crate::error::GatewayError;

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// One committed answer inside a submitted attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptAnswer {
    pub question_id: QuestionId,
    pub option_id: OptionId,
}

/// Server acknowledgement of a submitted attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub xp_awarded: u32,
}

/// Remote quiz catalog and attempt submission.
#[async_trait]
pub trait QuizGateway: Send + Sync {
    /// Fetch a localized quiz definition.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::NotFound` for an unknown quiz, `Network` when
    /// the server is unreachable, or `Rejected`/`InvalidPayload` otherwise.
    async fn fetch_quiz_definition(
        &self,
        quiz_id: QuizId,
        lang: &str,
    ) -> Result<QuizDefinition, GatewayError>;

    /// Submit a finished attempt.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on network failure or server rejection.
    async fn submit_attempt(
        &self,
        quiz_id: QuizId,
        answers: &[AttemptAnswer],
        lang: &str,
    ) -> Result<SubmitReceipt, GatewayError>;
}

/// Remote authoritative store of viewed-material facts.
///
/// Every operation returns the server's post-merge view so callers can
/// adopt ids recorded on other devices. The server merges by set union;
/// the operations are commutative and idempotent, so retries are safe.
#[async_trait]
pub trait ProgressGateway: Send + Sync {
    /// The server's current set of viewed material ids.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on network failure or server rejection.
    async fn fetch_viewed(&self, user_id: UserId) -> Result<HashSet<MaterialId>, GatewayError>;

    /// Push locally recorded ids; the server unions them in.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on network failure or server rejection.
    async fn push_viewed(
        &self,
        user_id: UserId,
        ids: &HashSet<MaterialId>,
    ) -> Result<HashSet<MaterialId>, GatewayError>;

    /// Bidirectional union-merge: the server unions `local_ids` into its
    /// record and returns the merged set for local adoption.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on network failure or server rejection.
    async fn sync_viewed(
        &self,
        user_id: UserId,
        local_ids: &HashSet<MaterialId>,
    ) -> Result<HashSet<MaterialId>, GatewayError>;
}

//
// ─── HTTP IMPLEMENTATION ───────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct HttpGatewayConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl HttpGatewayConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("QUIZ_API_BASE_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        let api_key = env::var("QUIZ_API_KEY").ok().filter(|k| !k.trim().is_empty());
        Some(Self { base_url, api_key })
    }
}

/// HTTP implementation of both gateways against the platform API.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    config: HttpGatewayConfig,
}

impl HttpGateway {
    #[must_use]
    pub fn new(config: HttpGatewayConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound);
        }
        if !status.is_success() {
            return Err(GatewayError::Rejected(status));
        }
        Ok(response)
    }
}

#[async_trait]
impl QuizGateway for HttpGateway {
    async fn fetch_quiz_definition(
        &self,
        quiz_id: QuizId,
        lang: &str,
    ) -> Result<QuizDefinition, GatewayError> {
        let request = self
            .client
            .get(self.url(&format!("quizzes/{quiz_id}")))
            .query(&[("lang", lang)]);
        let response = Self::check(self.apply_auth(request).send().await?).await?;
        let dto: QuizDefinitionDto = response.json().await?;
        dto.try_into()
    }

    async fn submit_attempt(
        &self,
        quiz_id: QuizId,
        answers: &[AttemptAnswer],
        lang: &str,
    ) -> Result<SubmitReceipt, GatewayError> {
        let payload = SubmitAttemptDto {
            answers: answers.to_vec(),
            lang: lang.to_owned(),
        };
        let request = self
            .client
            .post(self.url(&format!("quizzes/{quiz_id}/attempts")))
            .json(&payload);
        let response = Self::check(self.apply_auth(request).send().await?).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ProgressGateway for HttpGateway {
    async fn fetch_viewed(&self, user_id: UserId) -> Result<HashSet<MaterialId>, GatewayError> {
        let request = self
            .client
            .get(self.url(&format!("users/{user_id}/progress")));
        let response = Self::check(self.apply_auth(request).send().await?).await?;
        let dto: ViewedSetDto = response.json().await?;
        Ok(dto.material_ids.into_iter().collect())
    }

    async fn push_viewed(
        &self,
        user_id: UserId,
        ids: &HashSet<MaterialId>,
    ) -> Result<HashSet<MaterialId>, GatewayError> {
        let payload = ViewedSetDto {
            material_ids: ids.iter().copied().collect(),
        };
        let request = self
            .client
            .post(self.url(&format!("users/{user_id}/progress")))
            .json(&payload);
        let response = Self::check(self.apply_auth(request).send().await?).await?;
        let dto: ViewedSetDto = response.json().await?;
        Ok(dto.material_ids.into_iter().collect())
    }

    async fn sync_viewed(
        &self,
        user_id: UserId,
        local_ids: &HashSet<MaterialId>,
    ) -> Result<HashSet<MaterialId>, GatewayError> {
        let payload = ViewedSetDto {
            material_ids: local_ids.iter().copied().collect(),
        };
        let request = self
            .client
            .post(self.url(&format!("users/{user_id}/progress/sync")))
            .json(&payload);
        let response = Self::check(self.apply_auth(request).send().await?).await?;
        let dto: ViewedSetDto = response.json().await?;
        Ok(dto.material_ids.into_iter().collect())
    }
}

//
// ─── WIRE DTOS ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
struct SubmitAttemptDto {
    answers: Vec<AttemptAnswer>,
    lang: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ViewedSetDto {
    material_ids: Vec<MaterialId>,
}

#[derive(Debug, Deserialize)]
struct QuizDefinitionDto {
    id: QuizId,
    title: String,
    duration_sec: u32,
    questions: Vec<QuestionDto>,
}

#[derive(Debug, Deserialize)]
struct QuestionDto {
    id: QuestionId,
    text: String,
    options: Vec<OptionDto>,
    correct_option_id: OptionId,
    explanation: String,
    difficulty: Difficulty,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OptionDto {
    id: OptionId,
    text: String,
}

impl TryFrom<QuizDefinitionDto> for QuizDefinition {
    type Error = GatewayError;

    fn try_from(dto: QuizDefinitionDto) -> Result<Self, Self::Error> {
        let mut questions = Vec::with_capacity(dto.questions.len());
        for q in dto.questions {
            let options = q
                .options
                .into_iter()
                .map(|o| AnswerOption::new(o.id, o.text))
                .collect();
            let question = Question::new(
                q.id,
                q.text,
                options,
                q.correct_option_id,
                q.explanation,
                q.difficulty,
                q.tags,
            )
            .map_err(|e| GatewayError::InvalidPayload(e.to_string()))?;
            questions.push(question);
        }
        QuizDefinition::new(dto.id, dto.title, dto.duration_sec, questions)
            .map_err(|e| GatewayError::InvalidPayload(e.to_string()))
    }
}
