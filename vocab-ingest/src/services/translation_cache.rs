//! Persistent translation cache
//!
//! Process-wide map from (source, target, word) to translation, backed by a
//! JSON file in the root folder. The file is read on first use (or by an
//! explicit `load`) and rewritten after every successful remote translation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use vocab_common::{Error, Result};

use crate::error::RemoteError;
use crate::pipeline::normalizer::dedup_key;
use crate::types::Translator;

fn cache_key(text: &str, from: &str, to: &str) -> String {
    format!(
        "{}:{}:{}",
        from.to_ascii_lowercase(),
        to.to_ascii_lowercase(),
        dedup_key(text)
    )
}

pub struct TranslationCache {
    path: Option<PathBuf>,
    /// `None` until hydrated
    entries: Mutex<Option<HashMap<String, String>>>,
    /// Serializes writers of the backing file
    flush_lock: Mutex<()>,
}

impl TranslationCache {
    /// Cache persisted at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            entries: Mutex::new(None),
            flush_lock: Mutex::new(()),
        }
    }

    /// Cache that never touches the filesystem
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(Some(HashMap::new())),
            flush_lock: Mutex::new(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<HashMap<String, String>>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Translation cache lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Hydrate from disk if not done yet. Returns the entry count.
    ///
    /// A missing file yields an empty cache; a corrupt file is logged and
    /// replaced on the next flush.
    pub fn load(&self) -> usize {
        let mut guard = self.lock();
        Self::hydrate(&mut guard, self.path.as_deref()).len()
    }

    fn hydrate<'g>(
        slot: &'g mut Option<HashMap<String, String>>,
        path: Option<&Path>,
    ) -> &'g mut HashMap<String, String> {
        slot.get_or_insert_with(|| match path {
            Some(path) if path.exists() => match read_entries(path) {
                Ok(entries) => {
                    tracing::info!(
                        entries = entries.len(),
                        path = %path.display(),
                        "Translation cache loaded"
                    );
                    entries
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Translation cache unreadable, starting empty");
                    HashMap::new()
                }
            },
            _ => HashMap::new(),
        })
    }

    pub fn get(&self, text: &str, from: &str, to: &str) -> Option<String> {
        let mut guard = self.lock();
        Self::hydrate(&mut guard, self.path.as_deref())
            .get(&cache_key(text, from, to))
            .cloned()
    }

    pub fn insert(&self, text: &str, from: &str, to: &str, translation: &str) {
        let mut guard = self.lock();
        Self::hydrate(&mut guard, self.path.as_deref())
            .insert(cache_key(text, from, to), translation.to_string());
    }

    pub fn len(&self) -> usize {
        let mut guard = self.lock();
        Self::hydrate(&mut guard, self.path.as_deref()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write the current entries to disk through a temp file and rename
    pub fn flush(&self) -> Result<()> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };

        let _writer = self
            .flush_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let content = {
            let mut guard = self.lock();
            let entries = Self::hydrate(&mut guard, Some(path));
            serde_json::to_string_pretty(entries)
                .map_err(|e| Error::Internal(format!("Failed to serialize translation cache: {}", e)))?
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, content)?;
        std::fs::rename(&temp_path, path)?;
        Ok(())
    }

    /// `flush` on the blocking pool so file IO stays off the async workers
    pub async fn persist(self: Arc<Self>) -> Result<()> {
        tokio::task::spawn_blocking(move || self.flush())
            .await
            .map_err(|e| Error::Internal(format!("Translation cache flush task failed: {}", e)))?
    }
}

fn read_entries(path: &Path) -> Result<HashMap<String, String>> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| Error::Internal(format!("Failed to parse translation cache: {}", e)))
}

/// Translator decorator answering repeated words from the cache
pub struct CachedTranslator {
    inner: Arc<dyn Translator>,
    cache: Arc<TranslationCache>,
}

impl CachedTranslator {
    pub fn new(inner: Arc<dyn Translator>, cache: Arc<TranslationCache>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait::async_trait]
impl Translator for CachedTranslator {
    async fn translate(&self, text: &str, from: &str, to: &str) -> std::result::Result<String, RemoteError> {
        if let Some(hit) = self.cache.get(text, from, to) {
            tracing::debug!(text = %text, "Translation cache hit");
            return Ok(hit);
        }

        let translation = self.inner.translate(text, from, to).await?;

        self.cache.insert(text, from, to, &translation);
        if let Err(e) = Arc::clone(&self.cache).persist().await {
            tracing::warn!(error = %e, "Failed to persist translation cache");
        }

        Ok(translation)
    }
}
