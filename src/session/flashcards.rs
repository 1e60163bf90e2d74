//! Flashcard deck generated in one batch from a completed analysis.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::api::{Flashcard, ScholarApi};
use crate::error::{Result, ScholarError};

#[derive(Default)]
struct DeckInner {
    cards: Vec<Flashcard>,
    /// Which cards are currently showing their back. View state keyed by
    /// index, independent of card content.
    flipped: HashSet<usize>,
    generating: bool,
}

/// Batch-generated study deck with per-card flip state.
///
/// Generation failures leave the previous deck untouched; a retry is always
/// user-initiated. Flip state resets whenever the deck is replaced.
pub struct FlashcardDeck {
    api: Arc<dyn ScholarApi>,
    epoch: Arc<AtomicU64>,
    inner: RwLock<DeckInner>,
}

impl FlashcardDeck {
    pub fn new(api: Arc<dyn ScholarApi>, epoch: Arc<AtomicU64>) -> Self {
        Self {
            api,
            epoch,
            inner: RwLock::new(DeckInner::default()),
        }
    }

    /// Generate a fresh deck for the task identified by `task_id`,
    /// replacing the current one.
    ///
    /// Returns the new deck size, or `None` when the session was replaced
    /// while the request was in flight and the response was discarded. A
    /// backend failure surfaces as an error and leaves the deck as it was.
    pub async fn generate(&self, task_id: &str) -> Result<Option<usize>> {
        let dispatch_epoch = self.epoch.load(Ordering::SeqCst);
        self.inner.write().await.generating = true;

        let outcome = self.api.flashcards(task_id).await;

        let mut inner = self.inner.write().await;
        if self.epoch.load(Ordering::SeqCst) != dispatch_epoch {
            debug!("Discarding stale flashcard response for task {}", task_id);
            return Ok(None);
        }
        inner.generating = false;

        match outcome {
            Ok(response) => {
                inner.cards = response.flashcards;
                inner.flipped.clear();
                info!("🃏 Generated {} flashcards", inner.cards.len());
                Ok(Some(inner.cards.len()))
            }
            Err(e) => {
                let error = ScholarError::Flashcards {
                    reason: e.to_string(),
                };
                warn!("❌ {}", error);
                Err(error)
            }
        }
    }

    /// Flip the card at `index`, returning its new face-up state. Out of
    /// range indices are ignored.
    pub async fn toggle(&self, index: usize) -> bool {
        let mut inner = self.inner.write().await;
        if index >= inner.cards.len() {
            return false;
        }
        if inner.flipped.remove(&index) {
            false
        } else {
            inner.flipped.insert(index);
            true
        }
    }

    pub async fn is_flipped(&self, index: usize) -> bool {
        self.inner.read().await.flipped.contains(&index)
    }

    pub async fn cards(&self) -> Vec<Flashcard> {
        self.inner.read().await.cards.clone()
    }

    pub async fn is_generating(&self) -> bool {
        self.inner.read().await.generating
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.cards.is_empty()
    }

    /// Drop the deck and its flip state. Called when a new analysis session
    /// begins.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.cards.clear();
        inner.flipped.clear();
        inner.generating = false;
    }
}
