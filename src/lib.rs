//! Video Scholar client
//!
//! Client-side orchestration for an external video-analysis service: submit
//! a video URL as a long-running job, poll it to completion, then run
//! repeatable follow-up interactions against the result (per-chapter
//! enrichment, free-form Q&A with conversational memory, flashcard decks
//! and timestamp-driven playback seeking).

pub mod api;
pub mod config;
pub mod error;
pub mod playback;
pub mod session;
pub mod timecode;
pub mod transcript;

// Re-export main types for easy access
pub use crate::api::{
    AnalysisResult, ConversationTurn, Enrichment, Flashcard, HttpScholarApi, QaPair, ScholarApi,
    Sender, TaskStatus,
};
pub use crate::config::{Config, ConfigBuilder};
pub use crate::error::{Result, ScholarError};
pub use crate::playback::{PlaybackSync, Player};
pub use crate::session::{
    AskOutcome, ChatSession, EnrichmentCache, EnrichmentEntry, FlashcardDeck, LifecycleState,
    SessionController, Task, TaskHandle, TaskLifecycleController,
};
pub use crate::timecode::{extract_video_id, format_timestamp, parse_timestamp};
pub use crate::transcript::{Chapter, TranscriptIndex, TranscriptSegment};
