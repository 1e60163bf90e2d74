//! Backend contract for the video-analysis service.
//!
//! The transport seam is the [`ScholarApi`] trait so session components can
//! be exercised against a scripted fake; [`HttpScholarApi`] is the real
//! reqwest-backed client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::error::{Result, ScholarError};
use crate::transcript::{Chapter, TranscriptSegment};

/// Lifecycle status reported by the backend for one analysis job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Accepted,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Completed and failed are final; nothing transitions out of them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// A pre-computed question/answer pair included in the analysis result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

/// The success payload of a completed analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub summary: String,
    pub full_text: String,
    pub chapters: Vec<Chapter>,
    pub transcript: Vec<TranscriptSegment>,
    #[serde(default)]
    pub qa: Vec<QaPair>,
}

/// Response to a job submission.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    pub task_id: String,
}

/// One status poll response.
///
/// `result` is present only in terminal states: the analysis payload on
/// completed, an opaque failure payload on failed. It stays a raw JSON value
/// here; the task controller decodes it according to the status.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub status: TaskStatus,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
}

/// AI-derived elaboration over a span of text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Enrichment {
    pub key_concepts: Vec<String>,
    pub eli5: String,
    pub follow_up_questions: Vec<String>,
}

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

/// One turn in the conversation log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationTurn {
    pub sender: Sender,
    pub text: String,
}

/// Request body for a free-form question.
///
/// `history` is the conversation as it existed before the question was
/// appended; the question itself travels in its own field.
#[derive(Debug, Clone, Serialize)]
pub struct AskRequest {
    pub task_id: String,
    pub question: String,
    pub history: Vec<ConversationTurn>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AskResponse {
    pub answer: String,
}

/// One study flashcard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlashcardsResponse {
    pub flashcards: Vec<Flashcard>,
}

/// The network contract consumed by the session layer.
#[async_trait]
pub trait ScholarApi: Send + Sync {
    /// Submit a source URL for analysis, yielding an opaque task id.
    async fn submit(&self, source_url: &str) -> Result<SubmitResponse>;

    /// Query the current status of a task.
    async fn status(&self, task_id: &str) -> Result<StatusResponse>;

    /// Request enrichment over arbitrary text.
    async fn enrich(&self, text: &str) -> Result<Enrichment>;

    /// Ask a free-form question against a completed task.
    async fn ask(&self, request: &AskRequest) -> Result<AskResponse>;

    /// Generate a flashcard batch for a completed task.
    async fn flashcards(&self, task_id: &str) -> Result<FlashcardsResponse>;
}

/// HTTP client for the scholar backend.
pub struct HttpScholarApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpScholarApi {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Decode a response, folding non-success statuses into a typed error
    /// carrying the body text.
    async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ScholarError::Backend { status, body });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ScholarApi for HttpScholarApi {
    async fn submit(&self, source_url: &str) -> Result<SubmitResponse> {
        debug!("Submitting analysis job to {}", self.base_url);
        let response = self
            .client
            .post(self.endpoint("analyze"))
            .query(&[("youtube_url", source_url)])
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn status(&self, task_id: &str) -> Result<StatusResponse> {
        let response = self
            .client
            .get(self.endpoint(&format!("status/{}", task_id)))
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn enrich(&self, text: &str) -> Result<Enrichment> {
        debug!("Requesting enrichment for {} characters", text.len());
        let response = self
            .client
            .post(self.endpoint("deeper-analysis"))
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn ask(&self, request: &AskRequest) -> Result<AskResponse> {
        debug!(
            "Asking question against task {} with {} prior turns",
            request.task_id,
            request.history.len()
        );
        let response = self
            .client
            .post(self.endpoint("ask"))
            .json(request)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn flashcards(&self, task_id: &str) -> Result<FlashcardsResponse> {
        let response = self
            .client
            .post(self.endpoint("flashcards"))
            .json(&serde_json::json!({ "task_id": task_id }))
            .send()
            .await?;
        Self::read_json(response).await
    }
}
