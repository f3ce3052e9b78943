//! Model-backed selection of relevant knowledge keys.
//!
//! The selector asks a remote model which documents matter for a message and
//! caches the answer. Every failure path degrades to the keyword matcher; a
//! degraded answer is never written to the cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::ai::{format_selection_prompt, AiClient, AiError, NONE_MARKER};

use super::cache::{approximate_cache_key, SelectionCache};
use super::keywords::KeywordMatcher;
use super::store::DocumentMap;
use super::summaries::KnowledgeSummaries;

/// Parse the model's answer into known keys.
///
/// The answer is lowercased, split on commas and trimmed; tokens naming no
/// loaded document are dropped, as are repeats. [`NONE_MARKER`] yields an
/// empty selection.
///
/// # Errors
///
/// Returns `AiError::ParseError` for an empty answer.
pub fn parse_selection(text: &str, documents: &DocumentMap) -> Result<Vec<String>, AiError> {
    let answer = text.trim();
    if answer.is_empty() {
        return Err(AiError::ParseError("Empty selection response".to_string()));
    }
    if answer.eq_ignore_ascii_case(NONE_MARKER) {
        return Ok(Vec::new());
    }

    let known: HashMap<String, &String> = documents
        .keys()
        .map(|key| (key.to_lowercase(), key))
        .collect();

    let mut keys: Vec<String> = Vec::new();
    for token in answer.to_lowercase().split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        match known.get(token) {
            Some(key) if !keys.iter().any(|k| k == *key) => keys.push((*key).clone()),
            Some(_) => {}
            None => tracing::debug!(token = %token, "Dropping unknown key from selection"),
        }
    }
    Ok(keys)
}

/// Remote selector with its cache, summaries and feature flag.
#[derive(Debug)]
pub struct IntelligentSelector {
    client: Option<AiClient>,
    enabled: AtomicBool,
    cache: Mutex<SelectionCache>,
    summaries: KnowledgeSummaries,
}

impl IntelligentSelector {
    /// Create an enabled selector. Without a client every selection falls back.
    #[must_use]
    pub fn new(client: Option<AiClient>) -> Self {
        Self {
            client,
            enabled: AtomicBool::new(true),
            cache: Mutex::new(SelectionCache::new()),
            summaries: KnowledgeSummaries::new(),
        }
    }

    /// Whether a remote client is configured.
    #[must_use]
    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    /// Turn remote selection on or off.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Whether remote selection is on.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn cache(&self) -> MutexGuard<'_, SelectionCache> {
        self.cache.lock().expect("Mutex poisoned")
    }

    /// Number of cached selections.
    ///
    /// # Panics
    ///
    /// Panics if the internal `Mutex` is poisoned.
    #[must_use]
    pub fn cache_size(&self) -> usize {
        self.cache().len()
    }

    /// Whether document summaries have been generated.
    #[must_use]
    pub fn has_summaries(&self) -> bool {
        !self.summaries.is_empty()
    }

    /// Drop cached selections and summaries.
    ///
    /// # Panics
    ///
    /// Panics if an internal lock is poisoned.
    pub fn clear(&self) {
        self.cache().clear();
        self.summaries.clear();
    }

    /// Select relevant keys for `message`.
    ///
    /// Never fails: a disabled selector, a missing client, an empty store, or
    /// any remote error returns `matcher`'s keys instead.
    ///
    /// # Panics
    ///
    /// Panics if an internal lock is poisoned.
    pub async fn select_keys(
        &self,
        message: &str,
        documents: &DocumentMap,
        matcher: &KeywordMatcher,
    ) -> Vec<String> {
        let cache_key = approximate_cache_key(message);
        let cached = self.cache().get(&cache_key);
        if let Some(keys) = cached {
            tracing::debug!(count = keys.len(), "Selection cache hit");
            return keys;
        }

        if !self.is_enabled() || documents.is_empty() {
            return matcher.relevant_keys(message, documents);
        }

        match self.select_remote(message, documents).await {
            Ok(keys) => {
                let evicted = self.cache().insert(cache_key, keys.clone());
                if evicted > 0 {
                    tracing::debug!(evicted, "Evicted oldest selection cache entries");
                }
                tracing::debug!(keys = ?keys, "Intelligent selection");
                keys
            }
            Err(AiError::NotConfigured) => matcher.relevant_keys(message, documents),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Intelligent selection failed, falling back to keyword matching"
                );
                matcher.relevant_keys(message, documents)
            }
        }
    }

    async fn select_remote(
        &self,
        message: &str,
        documents: &DocumentMap,
    ) -> Result<Vec<String>, AiError> {
        let client = self.client.as_ref().ok_or(AiError::NotConfigured)?;
        let summaries = self.summaries.ensure(documents, Some(client)).await;
        let prompt = format_selection_prompt(&summaries, message);
        let answer = client.choose_keys(&prompt).await?;
        parse_selection(&answer, documents)
    }
}
