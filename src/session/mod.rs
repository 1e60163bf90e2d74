//! Session orchestration: one analysis job plus everything derived from it.
//!
//! A session is the full set of client-side state keyed by one task id.
//! Submitting a new URL replaces the session as a unit: the task controller
//! is reset and the enrichment cache, conversation and flashcard deck are
//! cleared unconditionally before the new job is even accepted.

pub mod chat;
pub mod enrichment;
pub mod flashcards;
pub mod task;

pub use chat::{AskOutcome, ChatSession, FALLBACK_ANSWER};
pub use enrichment::{chapter_scope_key, EnrichmentCache, EnrichmentEntry, FULL_TEXT_KEY};
pub use flashcards::FlashcardDeck;
pub use task::{LifecycleState, Task, TaskHandle, TaskLifecycleController};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::api::{AnalysisResult, ScholarApi, TaskStatus};
use crate::config::Config;
use crate::error::{Result, ScholarError};
use crate::playback::{PlaybackSync, Player};
use crate::transcript::TranscriptIndex;

/// Composition root wiring the task lifecycle, the per-session caches and
/// the playback capability together under one session epoch.
///
/// The epoch is bumped on every new submission; each in-flight secondary
/// request carries the epoch current at its dispatch and is discarded on
/// arrival if the session moved on.
pub struct SessionController {
    epoch: Arc<AtomicU64>,
    tasks: TaskLifecycleController,
    enrichment: EnrichmentCache,
    chat: ChatSession,
    flashcards: FlashcardDeck,
    playback: PlaybackSync,
}

impl SessionController {
    pub fn new(api: Arc<dyn ScholarApi>, config: &Config) -> Self {
        let epoch = Arc::new(AtomicU64::new(0));
        Self {
            tasks: TaskLifecycleController::new(
                Arc::clone(&api),
                Duration::from_millis(config.poll_interval_ms),
            ),
            enrichment: EnrichmentCache::new(Arc::clone(&api), Arc::clone(&epoch)),
            chat: ChatSession::new(Arc::clone(&api), Arc::clone(&epoch)),
            flashcards: FlashcardDeck::new(Arc::clone(&api), Arc::clone(&epoch)),
            playback: PlaybackSync::new(),
            epoch,
        }
    }

    /// Start a new analysis session for `source_url`.
    ///
    /// Everything belonging to the previous session is invalidated before
    /// the new submission goes out, so no stale entry can survive into the
    /// new task's lifetime.
    pub async fn analyze(&self, source_url: &str) -> Result<TaskHandle> {
        info!("🎬 Starting analysis session for {}", source_url);
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.enrichment.clear().await;
        self.chat.clear().await;
        self.flashcards.clear().await;
        self.tasks.submit(source_url).await
    }

    /// Stop polling on session teardown.
    pub async fn shutdown(&self) {
        self.tasks.cancel().await;
    }

    pub async fn task(&self) -> Option<Task> {
        self.tasks.snapshot().await
    }

    pub fn state(&self) -> LifecycleState {
        self.tasks.state()
    }

    pub async fn last_error(&self) -> Option<String> {
        self.tasks.last_error().await
    }

    /// Wait until the current session reaches a terminal state.
    pub async fn wait_terminal(&self) -> LifecycleState {
        self.tasks.wait_terminal().await
    }

    /// The completed task's id and result, if the session has one.
    pub async fn completed(&self) -> Option<(String, AnalysisResult)> {
        self.tasks
            .snapshot()
            .await
            .filter(|task| task.status == TaskStatus::Completed)
            .and_then(|task| {
                let Task { id, result, .. } = task;
                result.map(|result| (id, result))
            })
    }

    /// The transcript span belonging to the chapter at `chapter_timestamp`,
    /// or an empty string when no completed result (or no such chapter)
    /// exists.
    pub async fn chapter_span(&self, chapter_timestamp: &str) -> String {
        match self.completed().await {
            Some((_, result)) => TranscriptIndex::new(&result.transcript, &result.chapters)
                .span_for(chapter_timestamp),
            None => String::new(),
        }
    }

    /// Enrich the full transcript text, caching under [`FULL_TEXT_KEY`].
    pub async fn enrich_full_text(&self) -> Option<EnrichmentEntry> {
        let (_, result) = self.completed().await?;
        self.enrichment.load(FULL_TEXT_KEY, &result.full_text).await
    }

    /// Enrich one chapter's span, caching under its chapter scope key.
    pub async fn enrich_chapter(&self, chapter_timestamp: &str) -> Option<EnrichmentEntry> {
        self.completed().await?;
        let span = self.chapter_span(chapter_timestamp).await;
        self.enrichment
            .load(&chapter_scope_key(chapter_timestamp), &span)
            .await
    }

    /// Ask a free-form question against the completed analysis.
    pub async fn ask(&self, question: &str) -> AskOutcome {
        match self.completed().await {
            Some((task_id, _)) => self.chat.ask(&task_id, question).await,
            None => AskOutcome::NotReady,
        }
    }

    /// Generate a flashcard deck for the completed analysis.
    pub async fn generate_flashcards(&self) -> Result<Option<usize>> {
        match self.completed().await {
            Some((task_id, _)) => self.flashcards.generate(&task_id).await,
            None => Err(ScholarError::Flashcards {
                reason: "no completed analysis in this session".to_string(),
            }),
        }
    }

    pub fn attach_player(&self, player: Arc<dyn Player>) {
        self.playback.attach(player);
    }

    /// Seek the attached player to a `"mm:ss"` position. Best effort: an
    /// unattached player is a no-op.
    pub fn seek(&self, timestamp: &str) -> Result<()> {
        self.playback.seek(timestamp)
    }

    pub fn enrichment(&self) -> &EnrichmentCache {
        &self.enrichment
    }

    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }

    pub fn flashcards(&self) -> &FlashcardDeck {
        &self.flashcards
    }

    pub fn playback(&self) -> &PlaybackSync {
        &self.playback
    }
}
