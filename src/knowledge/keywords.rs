//! Static keyword tables mapping messages to knowledge keys.
//!
//! Matching is a plain substring test on the lowercased message, not a
//! tokenized or word-boundary match: the keyword `age` also fires inside
//! `average`. This imprecision is accepted; the model-backed selector is the
//! precise path and this table is the zero-latency fallback.

use serde::{Deserialize, Serialize};

use super::composer::{resolve_context, RelevantContext};
use super::store::DocumentMap;

/// Key returned when no keyword matches.
pub const DEFAULT_CONTEXT_KEY: &str = "personal";

/// Trigger keywords for one knowledge key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMapping {
    pub key: String,
    pub keywords: Vec<String>,
}

impl ContextMapping {
    /// Create a mapping; keywords are lowercased and blank ones dropped.
    ///
    /// Surrounding spaces are kept, so `" age "` only matches the word.
    pub fn new<I, S>(key: impl Into<String>, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            key: key.into(),
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .filter(|k| !k.trim().is_empty())
                .collect(),
        }
    }

    fn matches(&self, lowered_message: &str) -> bool {
        self.keywords
            .iter()
            .any(|keyword| lowered_message.contains(keyword.as_str()))
    }
}

fn builtin_mappings() -> Vec<ContextMapping> {
    vec![
        ContextMapping::new(
            "personal",
            [
                "about me",
                "who am i",
                "who are you",
                "my name",
                "my age",
                "age",
                "birthday",
                "where i live",
                "family",
                "myself",
            ],
        ),
        ContextMapping::new(
            "work",
            [
                "work", "job", "career", "company", "colleague", "manager", "meeting",
                "project", "office",
            ],
        ),
        ContextMapping::new(
            "interests",
            [
                "hobby", "hobbies", "interest", "music", "book", "movie", "film", "sport",
                "game", "travel",
            ],
        ),
        ContextMapping::new(
            "health",
            ["health", "exercise", "diet", "sleep", "fitness", "workout", "doctor"],
        ),
        ContextMapping::new(
            "goals",
            ["goal", "plan", "future", "ambition", "dream", "resolution"],
        ),
        ContextMapping::new(
            "relationships",
            [
                "friend",
                "partner",
                "relationship",
                "wife",
                "husband",
                "girlfriend",
                "boyfriend",
                "dating",
            ],
        ),
    ]
}

/// Deterministic keyword matcher over an ordered mapping table.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    mappings: Vec<ContextMapping>,
    default_key: String,
}

impl Default for KeywordMatcher {
    fn default() -> Self {
        Self {
            mappings: builtin_mappings(),
            default_key: DEFAULT_CONTEXT_KEY.to_string(),
        }
    }
}

impl KeywordMatcher {
    /// Create a matcher with an empty table.
    #[must_use]
    pub fn empty(default_key: impl Into<String>) -> Self {
        Self {
            mappings: Vec::new(),
            default_key: default_key.into(),
        }
    }

    /// Set the fallback key (builder pattern).
    #[must_use]
    pub fn with_default_key(mut self, default_key: impl Into<String>) -> Self {
        self.default_key = default_key.into();
        self
    }

    /// The fallback key.
    #[must_use]
    pub fn default_key(&self) -> &str {
        &self.default_key
    }

    /// The mapping table, in match order.
    #[must_use]
    pub fn mappings(&self) -> &[ContextMapping] {
        &self.mappings
    }

    /// Replace the mapping for `mapping.key` in place, or append it.
    pub fn add_mapping(&mut self, mapping: ContextMapping) {
        match self.mappings.iter_mut().find(|m| m.key == mapping.key) {
            Some(existing) => *existing = mapping,
            None => self.mappings.push(mapping),
        }
    }

    /// Keys relevant to `message`, in table order.
    ///
    /// Mappings whose key is not in `documents` are skipped. If nothing
    /// matched and the default key is loaded, returns just the default key.
    #[must_use]
    pub fn relevant_keys(&self, message: &str, documents: &DocumentMap) -> Vec<String> {
        let lowered = message.to_lowercase();

        let mut keys: Vec<String> = self
            .mappings
            .iter()
            .filter(|m| documents.contains_key(&m.key))
            .filter(|m| m.matches(&lowered))
            .map(|m| m.key.clone())
            .collect();

        if keys.is_empty() && documents.contains_key(&self.default_key) {
            keys.push(self.default_key.clone());
        }
        keys
    }

    /// Relevant documents for `message`, in table order.
    #[must_use]
    pub fn find_relevant(&self, message: &str, documents: &DocumentMap) -> Vec<RelevantContext> {
        resolve_context(&self.relevant_keys(message, documents), documents)
    }
}
