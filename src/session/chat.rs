//! Free-form Q&A with conversational memory over a completed analysis.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::api::{AskRequest, ConversationTurn, ScholarApi, Sender};
use crate::error::ScholarError;

/// Appended as the AI turn when the backend could not answer. The user's
/// turn stays in the log either way.
pub const FALLBACK_ANSWER: &str =
    "Sorry, I could not get an answer for that question. Please try again.";

/// How an `ask` ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AskOutcome {
    /// The backend answered; an AI turn with the answer was appended.
    Answered,
    /// The request failed; an AI turn with [`FALLBACK_ANSWER`] was appended.
    Fallback,
    /// Another ask is outstanding; this one was not issued and nothing
    /// was appended.
    Busy,
    /// The session was replaced while the request was in flight; the
    /// response was discarded.
    Stale,
    /// No completed analysis to converse about; nothing was appended.
    NotReady,
}

#[derive(Default)]
struct ChatInner {
    turns: Vec<ConversationTurn>,
    pending: bool,
}

/// Ordered, append-only conversation log with single-flight asks.
///
/// Turns are never reordered or deleted within a session; failure appends a
/// fallback AI turn instead of retracting the user's. Asks are serialized,
/// not queued: a second ask while one is outstanding is simply not issued.
pub struct ChatSession {
    api: Arc<dyn ScholarApi>,
    epoch: Arc<AtomicU64>,
    inner: RwLock<ChatInner>,
}

impl ChatSession {
    pub fn new(api: Arc<dyn ScholarApi>, epoch: Arc<AtomicU64>) -> Self {
        Self {
            api,
            epoch,
            inner: RwLock::new(ChatInner::default()),
        }
    }

    /// Ask a question against the task identified by `task_id`.
    ///
    /// The user turn is appended optimistically before the network call, and
    /// the request carries the history as it existed before that append: the
    /// backend receives the prior context plus the question as a separate
    /// field, not duplicated in history.
    pub async fn ask(&self, task_id: &str, question: &str) -> AskOutcome {
        let dispatch_epoch = self.epoch.load(Ordering::SeqCst);

        let history = {
            let mut inner = self.inner.write().await;
            if inner.pending {
                debug!("Ignoring ask while another is outstanding");
                return AskOutcome::Busy;
            }
            let history = inner.turns.clone();
            inner.turns.push(ConversationTurn {
                sender: Sender::User,
                text: question.to_string(),
            });
            inner.pending = true;
            history
        };

        let request = AskRequest {
            task_id: task_id.to_string(),
            question: question.to_string(),
            history,
        };
        let outcome = self.api.ask(&request).await;

        let mut inner = self.inner.write().await;
        if self.epoch.load(Ordering::SeqCst) != dispatch_epoch {
            debug!("Discarding stale chat response");
            return AskOutcome::Stale;
        }
        inner.pending = false;

        match outcome {
            Ok(response) => {
                inner.turns.push(ConversationTurn {
                    sender: Sender::Ai,
                    text: response.answer,
                });
                AskOutcome::Answered
            }
            Err(e) => {
                let error = ScholarError::Chat {
                    reason: e.to_string(),
                };
                warn!("❌ {}", error);
                inner.turns.push(ConversationTurn {
                    sender: Sender::Ai,
                    text: FALLBACK_ANSWER.to_string(),
                });
                AskOutcome::Fallback
            }
        }
    }

    /// The conversation so far, in order.
    pub async fn history(&self) -> Vec<ConversationTurn> {
        self.inner.read().await.turns.clone()
    }

    /// Whether an ask is outstanding.
    pub async fn is_pending(&self) -> bool {
        self.inner.read().await.pending
    }

    /// Drop the conversation. Called when a new analysis session begins.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.turns.clear();
        inner.pending = false;
    }
}
