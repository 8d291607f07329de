//! User-named prompt snippets that outlive the session.

pub mod storage;

use crate::core::AetherError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use storage::{FileStore, KeyValueStore, MemoryStore};

pub const STORAGE_KEY: &str = "aether-saved-prompts";
pub const DEFAULT_CATEGORY: &str = "General";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPrompt {
    pub id: String,
    pub name: String,
    pub content: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

/// Most-recent-first collection of saved prompts.
///
/// Entries are only ever inserted at the front or removed by id. The whole
/// list is written back to the key-value store after each change.
pub struct SavedPromptStore<S> {
    storage: S,
    prompts: Vec<SavedPrompt>,
}

impl<S: KeyValueStore> SavedPromptStore<S> {
    /// Loads the persisted collection. Missing or unreadable data yields an
    /// empty collection.
    pub fn open(storage: S) -> Self {
        let prompts = match storage.get(STORAGE_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "ignoring unreadable saved prompts");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "could not read saved prompts");
                Vec::new()
            }
        };
        Self { storage, prompts }
    }

    pub fn list(&self) -> &[SavedPrompt] {
        &self.prompts
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    /// Looks a prompt up by id, then by name ignoring case.
    pub fn find(&self, key: &str) -> Option<&SavedPrompt> {
        self.prompts
            .iter()
            .find(|p| p.id == key)
            .or_else(|| self.prompts.iter().find(|p| p.name.eq_ignore_ascii_case(key)))
    }

    /// Saves a new prompt at the front of the collection.
    ///
    /// Returns `Ok(None)` without touching anything when `name` or `content`
    /// is blank. A blank `category` becomes [`DEFAULT_CATEGORY`].
    pub fn save(
        &mut self,
        name: &str,
        content: &str,
        category: &str,
    ) -> Result<Option<&SavedPrompt>, AetherError> {
        let name = name.trim();
        if name.is_empty() || content.trim().is_empty() {
            return Ok(None);
        }
        let category = match category.trim() {
            "" => DEFAULT_CATEGORY,
            c => c,
        };

        let prompt = SavedPrompt {
            id: format!("prompt-{}", uuid::Uuid::new_v4().simple()),
            name: name.to_string(),
            content: content.to_string(),
            category: category.to_string(),
            created_at: Utc::now(),
        };
        self.prompts.insert(0, prompt);
        if let Err(e) = self.persist() {
            self.prompts.remove(0);
            return Err(e);
        }
        tracing::info!(name, category, "saved prompt");
        Ok(self.prompts.first())
    }

    /// Removes the prompt with `id`. Returns whether anything was removed.
    pub fn delete(&mut self, id: &str) -> Result<bool, AetherError> {
        let Some(index) = self.prompts.iter().position(|p| p.id == id) else {
            return Ok(false);
        };
        let removed = self.prompts.remove(index);
        if let Err(e) = self.persist() {
            self.prompts.insert(index, removed);
            return Err(e);
        }
        tracing::info!(id, "deleted saved prompt");
        Ok(true)
    }

    fn persist(&mut self) -> Result<(), AetherError> {
        let raw = serde_json::to_string(&self.prompts)?;
        self.storage.set(STORAGE_KEY, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>, AetherError> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), AetherError> {
            Err(AetherError::Storage("disk full".into()))
        }
    }

    #[test]
    fn blank_name_or_content_is_a_no_op() {
        let mut store = SavedPromptStore::open(MemoryStore::new());
        assert!(store.save("", "content", "cat").unwrap().is_none());
        assert!(store.save("name", "", "cat").unwrap().is_none());
        assert!(store.save("   ", "content", "cat").unwrap().is_none());
        assert!(store.save("name", " \n ", "cat").unwrap().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn newest_first_with_default_category() {
        let mut store = SavedPromptStore::open(MemoryStore::new());
        store.save("A", "x", "").unwrap();
        store.save("B", "y", "Math").unwrap();

        let names: Vec<&str> = store.list().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["B", "A"]);
        assert_eq!(store.list()[0].category, "Math");
        assert_eq!(store.list()[1].category, DEFAULT_CATEGORY);
        assert_ne!(store.list()[0].id, store.list()[1].id);
    }

    #[test]
    fn name_and_category_are_trimmed_but_content_is_not() {
        let mut store = SavedPromptStore::open(MemoryStore::new());
        let saved = store.save("  Review ", "  keep spacing\n", "  Dev ").unwrap().unwrap();
        assert_eq!(saved.name, "Review");
        assert_eq!(saved.category, "Dev");
        assert_eq!(saved.content, "  keep spacing\n");
    }

    #[test]
    fn delete_is_idempotent() {
        let mut store = SavedPromptStore::open(MemoryStore::new());
        let id = store.save("A", "x", "").unwrap().unwrap().id.clone();
        store.save("B", "y", "").unwrap();

        assert!(store.delete(&id).unwrap());
        assert!(!store.delete(&id).unwrap());
        assert_eq!(store.len(), 1);
        assert_eq!(store.list()[0].name, "B");
    }

    #[test]
    fn collection_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let mut store = SavedPromptStore::open(FileStore::new(temp_dir.path()));
            store.save("A", "x", "").unwrap();
            store.save("B", "y", "Math").unwrap();
        }
        let store = SavedPromptStore::open(FileStore::new(temp_dir.path()));
        assert_eq!(store.len(), 2);
        assert_eq!(store.list()[0].name, "B");
        assert!(store.find("a").is_some());
    }

    #[test]
    fn corrupt_data_opens_empty() {
        let mut backing = MemoryStore::new();
        backing.set(STORAGE_KEY, "not json").unwrap();
        let store = SavedPromptStore::open(backing);
        assert!(store.is_empty());
    }

    #[test]
    fn failed_write_rolls_back() {
        let mut store = SavedPromptStore::open(FailingStore);
        assert!(matches!(
            store.save("A", "x", ""),
            Err(AetherError::Storage(_))
        ));
        assert!(store.is_empty());
    }
}
