//! Bounded cache of model selection decisions.
//!
//! Eviction is by insertion order, not recency: once the cache holds more than
//! [`MAX_CACHE_ENTRIES`], the [`EVICTION_COUNT`] oldest insertions are dropped
//! regardless of how recently they were read.

use std::collections::{HashMap, VecDeque};

/// Characters of the lowercased message used as the cache key.
pub const CACHE_KEY_PREFIX_CHARS: usize = 100;

/// Entry count above which eviction runs.
pub const MAX_CACHE_ENTRIES: usize = 100;

/// Entries removed per eviction.
pub const EVICTION_COUNT: usize = 20;

/// Cache key for a message: its lowercased first [`CACHE_KEY_PREFIX_CHARS`] characters.
///
/// Messages sharing a long prefix share a key.
#[must_use]
pub fn approximate_cache_key(message: &str) -> String {
    message
        .to_lowercase()
        .chars()
        .take(CACHE_KEY_PREFIX_CHARS)
        .collect()
}

/// Insertion-ordered map from cache key to selected knowledge keys.
#[derive(Debug)]
pub struct SelectionCache {
    entries: HashMap<String, Vec<String>>,
    order: VecDeque<String>,
    max_entries: usize,
    eviction_count: usize,
}

impl Default for SelectionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionCache {
    /// Create a cache with the standard limits.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(MAX_CACHE_ENTRIES, EVICTION_COUNT)
    }

    /// Create a cache with custom limits.
    #[must_use]
    pub fn with_limits(max_entries: usize, eviction_count: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            max_entries,
            eviction_count,
        }
    }

    /// Cached selection for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Vec<String>> {
        self.entries.get(key).cloned()
    }

    /// Store a selection. Returns how many entries were evicted.
    ///
    /// Overwriting an existing key keeps its original insertion position.
    pub fn insert(&mut self, key: String, keys: Vec<String>) -> usize {
        if self.entries.insert(key.clone(), keys).is_none() {
            self.order.push_back(key);
        }

        if self.entries.len() <= self.max_entries {
            return 0;
        }

        let mut evicted = 0;
        while evicted < self.eviction_count {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
            evicted += 1;
        }
        evicted
    }

    /// Number of cached selections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}
