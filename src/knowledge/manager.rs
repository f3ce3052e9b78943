//! Service-scoped facade over the knowledge store, matchers and composer.

use std::path::PathBuf;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::ai::AiClient;
use crate::config::KnowledgeConfig;

use super::composer::{compose, resolve_context, RelevantContext};
use super::keywords::{ContextMapping, KeywordMatcher};
use super::selector::IntelligentSelector;
use super::store::KnowledgeStore;

/// Snapshot of the manager's state for status endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KnowledgeStatus {
    pub directory: PathBuf,
    pub knowledge_keys: Vec<String>,
    pub cache_size: usize,
    pub has_summaries: bool,
    pub intelligent_selection: bool,
    pub remote_selector_configured: bool,
    pub default_key: String,
    pub mappings: Vec<ContextMapping>,
}

/// Decides which personal knowledge goes into each system prompt.
///
/// Created once per process and shared; [`clear_cache`](Self::clear_cache)
/// resets its derived state.
#[derive(Debug)]
pub struct KnowledgeManager {
    store: KnowledgeStore,
    matcher: RwLock<KeywordMatcher>,
    selector: IntelligentSelector,
}

impl KnowledgeManager {
    /// Assemble a manager from its parts.
    #[must_use]
    pub fn new(store: KnowledgeStore, matcher: KeywordMatcher, client: Option<AiClient>) -> Self {
        Self {
            store,
            matcher: RwLock::new(matcher),
            selector: IntelligentSelector::new(client),
        }
    }

    /// Load the configured directory and apply configured mappings.
    #[must_use]
    pub fn from_config(config: &KnowledgeConfig, client: Option<AiClient>) -> Self {
        let mut matcher = KeywordMatcher::default().with_default_key(config.default_key.clone());
        for mapping in &config.mappings {
            matcher.add_mapping(ContextMapping::new(mapping.key.clone(), &mapping.keywords));
        }

        let manager = Self::new(KnowledgeStore::open(&config.directory), matcher, client);
        manager.set_intelligent_selection(config.intelligent_selection);
        manager
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    fn matcher(&self) -> KeywordMatcher {
        self.matcher.read().expect("RwLock poisoned").clone()
    }

    /// Keyword-selected context for `message`.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn find_relevant_context(&self, message: &str) -> Vec<RelevantContext> {
        let documents = self.store.snapshot();
        self.matcher
            .read()
            .expect("RwLock poisoned")
            .find_relevant(message, &documents)
    }

    /// Model-selected context for `message`, falling back to keywords.
    ///
    /// # Panics
    ///
    /// Panics if an internal lock is poisoned.
    pub async fn find_relevant_context_intelligent(&self, message: &str) -> Vec<RelevantContext> {
        let matcher = self.matcher();
        let keys = {
            let documents = self.store.snapshot();
            self.selector
                .select_keys(message, &documents, &matcher)
                .await
        };
        // Resolve against the store as it is now, in case it was reloaded meanwhile.
        resolve_context(&keys, &self.store.snapshot())
    }

    /// Base prompt plus keyword-selected context.
    #[must_use]
    pub fn enhanced_system_prompt(&self, base_prompt: &str, message: &str) -> String {
        compose(base_prompt, &self.find_relevant_context(message))
    }

    /// Base prompt plus model-selected context.
    pub async fn enhanced_system_prompt_intelligent(
        &self,
        base_prompt: &str,
        message: &str,
    ) -> String {
        let context = self.find_relevant_context_intelligent(message).await;
        compose(base_prompt, &context)
    }

    /// Clear derived state, then re-read the knowledge directory.
    pub fn reload(&self) -> usize {
        self.clear_cache();
        self.store.reload()
    }

    /// Drop cached selections and summaries.
    pub fn clear_cache(&self) {
        self.selector.clear();
        tracing::info!("Knowledge selection cache cleared");
    }

    /// Turn model-backed selection on or off.
    pub fn set_intelligent_selection(&self, enabled: bool) {
        self.selector.set_enabled(enabled);
        tracing::info!(enabled, "Intelligent selection toggled");
    }

    /// Whether model-backed selection is on.
    #[must_use]
    pub fn intelligent_selection_enabled(&self) -> bool {
        self.selector.is_enabled()
    }

    /// Replace or insert the keyword mapping for `key`.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    pub fn add_context_mapping<I, S>(&self, key: impl Into<String>, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mapping = ContextMapping::new(key, keywords);
        tracing::debug!(key = %mapping.key, count = mapping.keywords.len(), "Context mapping set");
        self.matcher
            .write()
            .expect("RwLock poisoned")
            .add_mapping(mapping);
    }

    /// Loaded knowledge keys, sorted.
    #[must_use]
    pub fn knowledge_keys(&self) -> Vec<String> {
        self.store.keys()
    }

    /// Number of cached selections.
    #[must_use]
    pub fn cache_size(&self) -> usize {
        self.selector.cache_size()
    }

    /// Whether document summaries exist.
    #[must_use]
    pub fn has_summaries(&self) -> bool {
        self.selector.has_summaries()
    }

    /// Status snapshot.
    #[must_use]
    pub fn status(&self) -> KnowledgeStatus {
        let matcher = self.matcher();
        KnowledgeStatus {
            directory: self.store.directory().to_path_buf(),
            knowledge_keys: self.knowledge_keys(),
            cache_size: self.cache_size(),
            has_summaries: self.has_summaries(),
            intelligent_selection: self.intelligent_selection_enabled(),
            remote_selector_configured: self.selector.has_client(),
            default_key: matcher.default_key().to_string(),
            mappings: matcher.mappings().to_vec(),
        }
    }
}
