//! Shared application state: the named-index registry and the admin key
//! (spec §6 "HTTP collaborator surface").

use hnsw_core::HnswEngine;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// One registered index: the engine plus the metadata surfaced over
/// `GET`/`list`.
pub struct IndexEntry {
    pub engine: Arc<HnswEngine>,
    pub backing: String,
}

/// Process-wide state shared across handlers.
pub struct AppState {
    /// Bearer token every request must present (spec §6).
    pub admin_key: String,
    /// Directory durable-backed indexes store their files under.
    pub data_dir: PathBuf,
    indexes: RwLock<HashMap<String, Arc<IndexEntry>>>,
}

impl AppState {
    #[must_use]
    pub fn new(admin_key: String, data_dir: PathBuf) -> Self {
        Self {
            admin_key,
            data_dir,
            indexes: RwLock::new(HashMap::new()),
        }
    }

    pub fn list(&self) -> Vec<(String, Arc<IndexEntry>)> {
        self.indexes
            .read()
            .iter()
            .map(|(name, entry)| (name.clone(), entry.clone()))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<Arc<IndexEntry>> {
        self.indexes.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.indexes.read().contains_key(name)
    }

    /// Registers a new index. Returns `false` if `name` is already taken
    /// (spec §6: 409 on duplicate index name).
    pub fn insert(&self, name: String, entry: IndexEntry) -> bool {
        let mut indexes = self.indexes.write();
        if indexes.contains_key(&name) {
            return false;
        }
        indexes.insert(name, Arc::new(entry));
        true
    }

    /// Removes an index. Returns `true` if it existed.
    pub fn remove(&self, name: &str) -> bool {
        self.indexes.write().remove(name).is_some()
    }

    pub fn durable_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{name}.hnswdb"))
    }
}
