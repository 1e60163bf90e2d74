use thiserror::Error;

/// Errors produced by the scholar client.
///
/// Each variant maps to the scope of the action that triggered it: a failed
/// submission means the session never started, a failed status check aborts
/// the session, while enrichment, chat and flashcard failures stay local to
/// their feature and leave the task untouched.
#[derive(Error, Debug)]
pub enum ScholarError {
    #[error("failed to start analysis for {url}: {reason}")]
    Submission { url: String, reason: String },

    #[error("status check failed for task {task_id}: {reason}")]
    Polling { task_id: String, reason: String },

    #[error("enrichment failed for {scope_key}: {reason}")]
    Enrichment { scope_key: String, reason: String },

    #[error("chat request failed: {reason}")]
    Chat { reason: String },

    #[error("flashcard generation failed: {reason}")]
    Flashcards { reason: String },

    #[error("invalid timestamp {0:?}, expected mm:ss")]
    InvalidTimestamp(String),

    #[error("backend returned {status}: {body}")]
    Backend { status: reqwest::StatusCode, body: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScholarError>;
