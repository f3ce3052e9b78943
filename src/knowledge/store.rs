//! On-disk knowledge documents loaded into a swappable snapshot.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

/// Extension of files recognized as knowledge documents.
pub const DOCUMENT_EXTENSION: &str = "md";

/// One personal-context document, addressed by its file stem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    pub key: String,
    pub content: String,
}

/// Mapping from key to document.
pub type DocumentMap = HashMap<String, KnowledgeDocument>;

/// Derive the knowledge key for a path, or `None` if it is not a document.
#[must_use]
pub fn document_key(path: &Path) -> Option<String> {
    if path.extension().and_then(OsStr::to_str) != Some(DOCUMENT_EXTENSION) {
        return None;
    }
    path.file_stem()
        .and_then(OsStr::to_str)
        .filter(|stem| !stem.is_empty())
        .map(String::from)
}

/// Read every document in `directory`.
///
/// Unreadable files are logged and skipped. An unreadable directory yields an
/// empty map. Two files with the same stem: the one visited last wins.
#[must_use]
pub fn load_documents(directory: &Path) -> DocumentMap {
    let mut documents = DocumentMap::new();

    let entries = match std::fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(
                path = %directory.display(),
                error = %e,
                "Failed to read knowledge directory"
            );
            return documents;
        }
    };

    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read knowledge directory entry");
                continue;
            }
        };
        let Some(key) = document_key(&path) else {
            continue;
        };
        if path.is_dir() {
            continue;
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => {
                tracing::debug!(key = %key, "Loaded knowledge document");
                documents.insert(key.clone(), KnowledgeDocument { key, content });
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to read knowledge document, skipping"
                );
            }
        }
    }

    tracing::info!(
        path = %directory.display(),
        count = documents.len(),
        "Knowledge base loaded"
    );
    documents
}

/// Knowledge documents for one directory.
///
/// Readers get an immutable snapshot; [`KnowledgeStore::reload`] builds a new
/// map and swaps it in whole.
#[derive(Debug)]
pub struct KnowledgeStore {
    directory: PathBuf,
    documents: RwLock<Arc<DocumentMap>>,
}

impl KnowledgeStore {
    /// Load all documents from `directory`.
    #[must_use]
    pub fn open(directory: impl Into<PathBuf>) -> Self {
        let directory = directory.into();
        let documents = load_documents(&directory);
        Self {
            directory,
            documents: RwLock::new(Arc::new(documents)),
        }
    }

    /// Build a store from in-memory `(key, content)` pairs.
    ///
    /// A later [`reload`](Self::reload) reads from `directory`.
    #[must_use]
    pub fn from_documents<I, K, V>(directory: impl Into<PathBuf>, documents: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let documents = documents
            .into_iter()
            .map(|(key, content)| {
                let key = key.into();
                let document = KnowledgeDocument {
                    key: key.clone(),
                    content: content.into(),
                };
                (key, document)
            })
            .collect();
        Self {
            directory: directory.into(),
            documents: RwLock::new(Arc::new(documents)),
        }
    }

    /// Directory this store reads from.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Re-read the directory and replace the snapshot. Returns the document count.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    pub fn reload(&self) -> usize {
        tracing::info!(path = %self.directory.display(), "Reloading knowledge base");
        let fresh = Arc::new(load_documents(&self.directory));
        let count = fresh.len();
        *self.documents.write().expect("RwLock poisoned") = fresh;
        count
    }

    /// Current snapshot of all documents.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn snapshot(&self) -> Arc<DocumentMap> {
        Arc::clone(&self.documents.read().expect("RwLock poisoned"))
    }

    /// Get a document by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<KnowledgeDocument> {
        self.snapshot().get(key).cloned()
    }

    /// Whether a document with `key` is loaded.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.snapshot().contains_key(key)
    }

    /// Loaded keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.snapshot().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of loaded documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Whether no documents are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}
