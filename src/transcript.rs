//! Transcript and chapter domain types plus the chapter-span query.

use serde::{Deserialize, Serialize};

/// One timestamped unit of spoken text, ordered as delivered by the backend.
///
/// Transcript order is authoritative; timestamps are treated as opaque
/// equality keys and are not assumed to be monotonic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptSegment {
    /// Timestamp in `"mm:ss"` form, the segment's ordering key
    pub timestamp: String,
    /// Spoken text for this segment
    pub text: String,
}

/// A named time-anchored subdivision of the transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chapter {
    /// Timestamp in `"mm:ss"` form; resolves against a matching
    /// transcript segment timestamp
    pub timestamp: String,
    /// Topic covered from this point on
    pub topic: String,
}

/// Pure query view over a transcript and its chapter list.
///
/// Holds borrows only; rebuild it per request, there is no cached state.
#[derive(Debug, Clone, Copy)]
pub struct TranscriptIndex<'a> {
    transcript: &'a [TranscriptSegment],
    chapters: &'a [Chapter],
}

impl<'a> TranscriptIndex<'a> {
    pub fn new(transcript: &'a [TranscriptSegment], chapters: &'a [Chapter]) -> Self {
        Self {
            transcript,
            chapters,
        }
    }

    /// The contiguous text span belonging to the chapter at `chapter_timestamp`.
    ///
    /// The span starts at the first segment whose timestamp equals the
    /// chapter's and ends just before the first segment matching the next
    /// chapter's timestamp. The last chapter, or a missing next boundary,
    /// runs to the end of the transcript. An unknown chapter timestamp or a
    /// start timestamp absent from the transcript yields an empty string.
    ///
    /// Spans over all chapters partition the transcript: disjoint, and their
    /// concatenation in chapter order reproduces every segment exactly once.
    pub fn span_for(&self, chapter_timestamp: &str) -> String {
        self.segments_for(chapter_timestamp)
            .iter()
            .map(|segment| segment.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The segment slice backing [`span_for`](Self::span_for).
    pub fn segments_for(&self, chapter_timestamp: &str) -> &'a [TranscriptSegment] {
        let Some(chapter_index) = self
            .chapters
            .iter()
            .position(|c| c.timestamp == chapter_timestamp)
        else {
            return &[];
        };

        let Some(start_index) = self
            .transcript
            .iter()
            .position(|s| s.timestamp == chapter_timestamp)
        else {
            return &[];
        };

        let end_index = self
            .chapters
            .get(chapter_index + 1)
            .and_then(|next| {
                self.transcript
                    .iter()
                    .position(|s| s.timestamp == next.timestamp)
            })
            .unwrap_or(self.transcript.len());

        &self.transcript[start_index..end_index]
    }
}
