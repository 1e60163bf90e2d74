//! Per-span enrichment cache, scoped to the current analysis session.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::api::{Enrichment, ScholarApi};
use crate::error::ScholarError;

/// Scope key for enrichment over the whole transcript.
pub const FULL_TEXT_KEY: &str = "full_text";

/// Scope key for enrichment over one chapter's span.
pub fn chapter_scope_key(chapter_timestamp: &str) -> String {
    format!("chapter_{}", chapter_timestamp)
}

/// What the cache holds under a scope key.
///
/// Failures occupy the key too, so re-rendering a result never re-triggers
/// a request on its own; only an explicit reload replaces the entry.
#[derive(Debug, Clone, PartialEq)]
pub enum EnrichmentEntry {
    Ready(Enrichment),
    Failed(String),
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, EnrichmentEntry>,
    /// The single shared loading slot: the key of the most recently
    /// dispatched load still in flight. Loads for different keys may
    /// overlap; each one writes only its own entry.
    loading: Option<String>,
}

/// Keyed, lazily-populated cache of enrichment results.
///
/// Every load is tagged with the session epoch current at dispatch; a
/// response arriving after the session was replaced is discarded instead of
/// leaking into the new session's cache.
pub struct EnrichmentCache {
    api: Arc<dyn ScholarApi>,
    epoch: Arc<AtomicU64>,
    inner: RwLock<CacheInner>,
}

impl EnrichmentCache {
    pub fn new(api: Arc<dyn ScholarApi>, epoch: Arc<AtomicU64>) -> Self {
        Self {
            api,
            epoch,
            inner: RwLock::new(CacheInner::default()),
        }
    }

    /// The cached entry for `scope_key`, if one exists.
    pub async fn get(&self, scope_key: &str) -> Option<EnrichmentEntry> {
        self.inner.read().await.entries.get(scope_key).cloned()
    }

    /// Whether a load for exactly this key is in flight.
    pub async fn is_loading(&self, scope_key: &str) -> bool {
        self.inner.read().await.loading.as_deref() == Some(scope_key)
    }

    /// Whether any load is in flight.
    pub async fn is_busy(&self) -> bool {
        self.inner.read().await.loading.is_some()
    }

    /// Fetch enrichment for `source_text` and store it under `scope_key`,
    /// overwriting any prior entry.
    ///
    /// A backend failure stores an error-shaped entry under the same key
    /// rather than leaving it absent. Returns the entry now stored, or
    /// `None` when the session was replaced while the request was in flight
    /// and the response was discarded.
    pub async fn load(&self, scope_key: &str, source_text: &str) -> Option<EnrichmentEntry> {
        let dispatch_epoch = self.epoch.load(Ordering::SeqCst);
        self.inner.write().await.loading = Some(scope_key.to_string());

        let outcome = self.api.enrich(source_text).await;

        let mut inner = self.inner.write().await;
        if self.epoch.load(Ordering::SeqCst) != dispatch_epoch {
            debug!("Discarding stale enrichment response for {}", scope_key);
            return None;
        }

        if inner.loading.as_deref() == Some(scope_key) {
            inner.loading = None;
        }

        let entry = match outcome {
            Ok(enrichment) => {
                info!(
                    "📚 Cached enrichment for {}: {} key concepts",
                    scope_key,
                    enrichment.key_concepts.len()
                );
                EnrichmentEntry::Ready(enrichment)
            }
            Err(e) => {
                let error = ScholarError::Enrichment {
                    scope_key: scope_key.to_string(),
                    reason: e.to_string(),
                };
                warn!("❌ {}", error);
                EnrichmentEntry::Failed(error.to_string())
            }
        };

        inner.entries.insert(scope_key.to_string(), entry.clone());
        Some(entry)
    }

    /// Drop every entry and the loading slot. Called when a new analysis
    /// session begins.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.entries.clear();
        inner.loading = None;
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chapter_keys_embed_the_timestamp() {
        assert_eq!(chapter_scope_key("00:10"), "chapter_00:10");
        assert_ne!(chapter_scope_key("00:10"), FULL_TEXT_KEY);
    }
}
