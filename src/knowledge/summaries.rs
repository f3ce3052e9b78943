//! Per-document summaries used to brief the selection model.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::ai::AiClient;

use super::store::DocumentMap;

/// Characters of each document sent to the summary model.
pub const SUMMARY_INPUT_CHARS: usize = 2000;

/// Lines used for a local summary.
pub const LOCAL_SUMMARY_LINES: usize = 3;

/// Character budget of a local summary.
pub const LOCAL_SUMMARY_CHARS: usize = 200;

/// Safely truncate a string at a character boundary.
fn safe_truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Deterministic summary: first non-empty lines joined, truncated.
#[must_use]
pub fn local_summary(content: &str) -> String {
    let joined = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(LOCAL_SUMMARY_LINES)
        .collect::<Vec<_>>()
        .join(" ");
    safe_truncate(&joined, LOCAL_SUMMARY_CHARS).to_string()
}

#[derive(Debug, Default)]
struct SummaryState {
    /// Bumped by every clear; a batch started under an older generation is discarded.
    generation: u64,
    summaries: BTreeMap<String, String>,
}

/// Memoized key → summary map.
#[derive(Debug, Default)]
pub struct KnowledgeSummaries {
    state: RwLock<SummaryState>,
}

impl KnowledgeSummaries {
    /// Create an empty summary set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current summaries.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.state.read().expect("RwLock poisoned").summaries.clone()
    }

    /// Whether no summaries have been generated.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().expect("RwLock poisoned").summaries.is_empty()
    }

    /// Forget all summaries; the next [`ensure`](Self::ensure) regenerates them.
    ///
    /// Batches still running when this is called do not store their results.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    pub fn clear(&self) {
        let mut state = self.state.write().expect("RwLock poisoned");
        state.generation += 1;
        state.summaries.clear();
    }

    /// Return a summary for every document in `documents`.
    ///
    /// Stored summaries are reused when they cover exactly the documents'
    /// keys. Otherwise missing keys are summarized and keys no longer present
    /// are dropped. Each document is summarized independently; a failed
    /// remote summary falls back to [`local_summary`] for that document only.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    pub async fn ensure(
        &self,
        documents: &DocumentMap,
        client: Option<&AiClient>,
    ) -> BTreeMap<String, String> {
        let (generation, existing) = {
            let state = self.state.read().expect("RwLock poisoned");
            (state.generation, state.summaries.clone())
        };
        if !existing.is_empty()
            && existing.len() == documents.len()
            && documents.keys().all(|key| existing.contains_key(key))
        {
            return existing;
        }

        let mut keys: Vec<&String> = documents.keys().collect();
        keys.sort();

        let mut generated = BTreeMap::new();
        let mut fresh = 0usize;
        for key in keys {
            if let Some(summary) = existing.get(key) {
                generated.insert(key.clone(), summary.clone());
                continue;
            }

            let content = &documents[key].content;
            let summary = match client {
                Some(client) => {
                    let excerpt = safe_truncate(content, SUMMARY_INPUT_CHARS);
                    match client.summarize(key, excerpt).await {
                        Ok(summary) => summary,
                        Err(e) => {
                            tracing::warn!(
                                key = %key,
                                error = %e,
                                "Summary generation failed, using local summary"
                            );
                            local_summary(content)
                        }
                    }
                }
                None => local_summary(content),
            };
            generated.insert(key.clone(), summary);
            fresh += 1;
        }

        tracing::debug!(
            count = generated.len(),
            fresh,
            "Generated knowledge summaries"
        );
        if !generated.is_empty() {
            let mut state = self.state.write().expect("RwLock poisoned");
            if state.generation == generation {
                state.summaries.clone_from(&generated);
            } else {
                tracing::debug!("Summaries cleared during generation, not storing batch");
            }
        }
        generated
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::ai::{AiError, AiProvider};
    use crate::config::AiConfig;
    use crate::knowledge::KnowledgeDocument;

    /// Fails for documents whose excerpt contains "fail", counts calls.
    struct PickyProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AiProvider for PickyProvider {
        async fn generate(&self, _system: &str, user: &str) -> Result<String, AiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if user.contains("fail") {
                Err(AiError::RequestFailed("HTTP 500".to_string()))
            } else {
                Ok("Remote summary.".to_string())
            }
        }
    }

    fn documents(pairs: &[(&str, &str)]) -> DocumentMap {
        pairs
            .iter()
            .map(|(key, content)| {
                (
                    (*key).to_string(),
                    KnowledgeDocument {
                        key: (*key).to_string(),
                        content: (*content).to_string(),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_local_summary_takes_first_lines() {
        let content = "# Me\n\nLives in London.\nWorks in tech.\nLikes chess.";
        assert_eq!(local_summary(content), "# Me Lives in London. Works in tech.");
    }

    #[test]
    fn test_local_summary_truncates() {
        let content = "word ".repeat(100);
        assert_eq!(local_summary(&content).chars().count(), LOCAL_SUMMARY_CHARS);
    }

    #[test]
    fn test_safe_truncate_utf8() {
        assert_eq!(safe_truncate("日本語テキスト", 3), "日本語");
        assert_eq!(safe_truncate("short", 10), "short");
    }

    #[tokio::test]
    async fn test_ensure_without_client_is_local() {
        let summaries = KnowledgeSummaries::new();
        let docs = documents(&[("personal", "Line one\nLine two")]);

        let generated = summaries.ensure(&docs, None).await;

        assert_eq!(generated["personal"], "Line one Line two");
        assert!(!summaries.is_empty());
    }

    #[tokio::test]
    async fn test_per_document_failure_falls_back_locally() {
        let provider = Arc::new(PickyProvider {
            calls: AtomicUsize::new(0),
        });
        let client = AiClient::new(provider.clone(), AiConfig::default());
        let summaries = KnowledgeSummaries::new();
        let docs = documents(&[
            ("personal", "About me"),
            ("work", "this one will fail\nsecond line"),
        ]);

        let generated = summaries.ensure(&docs, Some(&client)).await;

        assert_eq!(generated["personal"], "Remote summary.");
        assert_eq!(generated["work"], "this one will fail second line");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_ensure_is_memoized_until_cleared() {
        let provider = Arc::new(PickyProvider {
            calls: AtomicUsize::new(0),
        });
        let client = AiClient::new(provider.clone(), AiConfig::default());
        let summaries = KnowledgeSummaries::new();
        let docs = documents(&[("personal", "About me")]);

        summaries.ensure(&docs, Some(&client)).await;
        summaries.ensure(&docs, Some(&client)).await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        summaries.clear();
        assert!(summaries.is_empty());
        summaries.ensure(&docs, Some(&client)).await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_ensure_summarizes_only_new_keys() {
        let provider = Arc::new(PickyProvider {
            calls: AtomicUsize::new(0),
        });
        let client = AiClient::new(provider.clone(), AiConfig::default());
        let summaries = KnowledgeSummaries::new();

        summaries
            .ensure(&documents(&[("personal", "About me")]), Some(&client))
            .await;
        let generated = summaries
            .ensure(
                &documents(&[("personal", "About me"), ("travel", "Loves Japan")]),
                Some(&client),
            )
            .await;

        assert_eq!(generated.keys().collect::<Vec<_>>(), vec!["personal", "travel"]);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);

        let generated = summaries
            .ensure(&documents(&[("travel", "Loves Japan")]), Some(&client))
            .await;
        assert_eq!(generated.keys().collect::<Vec<_>>(), vec!["travel"]);
        assert_eq!(summaries.snapshot().len(), 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    /// Clears the shared summaries during its first call, like a reload would.
    struct ClearingProvider {
        summaries: Arc<KnowledgeSummaries>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AiProvider for ClearingProvider {
        async fn generate(&self, _system: &str, _user: &str) -> Result<String, AiError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                self.summaries.clear();
            }
            Ok("Remote summary.".to_string())
        }
    }

    #[tokio::test]
    async fn test_batch_cleared_midway_is_not_stored() {
        let summaries = Arc::new(KnowledgeSummaries::new());
        let provider = Arc::new(ClearingProvider {
            summaries: Arc::clone(&summaries),
            calls: AtomicUsize::new(0),
        });
        let client = AiClient::new(provider.clone(), AiConfig::default());

        let old = documents(&[("personal", "About me"), ("work", "Engineer")]);
        let generated = summaries.ensure(&old, Some(&client)).await;

        // The caller still gets its batch, but it is not memoized.
        assert_eq!(generated.len(), 2);
        assert!(summaries.is_empty());

        let new = documents(&[
            ("personal", "About me"),
            ("travel", "Loves Japan"),
            ("work", "Engineer"),
        ]);
        let generated = summaries.ensure(&new, Some(&client)).await;
        assert!(generated.contains_key("travel"));
        assert_eq!(summaries.snapshot().len(), 3);
    }

    #[tokio::test]
    async fn test_ensure_empty_store_stays_empty() {
        let summaries = KnowledgeSummaries::new();
        let generated = summaries.ensure(&DocumentMap::new(), None).await;
        assert!(generated.is_empty());
        assert!(summaries.is_empty());
    }
}
