// Preference store - fail-soft local-storage emulation
//
// The browser's localStorage may be disabled (private browsing, quota,
// policy), so nothing in this layer is allowed to depend on storage
// succeeding: get() falls back to the caller's default, set() swallows the
// failure with a warning and the caller proceeds as if it worked.
//
// The file backend keeps one JSON document per key under the configured
// directory, which keeps the store greppable the same way the session logs
// are.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::error::PageError;

/// Aggregate preferences persisted under one namespaced key
pub const PREFERENCES_KEY: &str = "gk_group_preferences";

/// One-shot first-visit marker
pub const FIRST_VISIT_KEY: &str = "has_visited_before";

/// Last selected WhatsApp message template
pub const WHATSAPP_MESSAGE_KEY: &str = "whatsapp_message";

/// User preferences stored under [`PREFERENCES_KEY`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Preferences {
    pub has_visited_before: bool,
    pub reduced_motion: bool,
    pub dark_theme: bool,
}

/// Raw key-value transport underneath the store
pub trait StorageBackend: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, PageError>;
    fn write(&self, key: &str, raw: &str) -> Result<(), PageError>;
}

/// File-per-key JSON backend
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StorageBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>, PageError> {
        let path = self.key_path(key);
        match std::fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PageError::StorageUnavailable(e.to_string())),
        }
    }

    fn write(&self, key: &str, raw: &str) -> Result<(), PageError> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| PageError::StorageUnavailable(e.to_string()))?;
        std::fs::write(self.key_path(key), raw)
            .map_err(|e| PageError::StorageUnavailable(e.to_string()))
    }
}

/// In-memory backend for tests and for sessions with storage disabled
#[derive(Default)]
pub struct MemoryBackend {
    map: Mutex<HashMap<String, String>>,
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>, PageError> {
        Ok(self.map.lock().unwrap().get(key).cloned())
    }

    fn write(&self, key: &str, raw: &str) -> Result<(), PageError> {
        self.map
            .lock()
            .unwrap()
            .insert(key.to_string(), raw.to_string());
        Ok(())
    }
}

/// Fail-soft typed store over a pluggable backend
#[derive(Clone)]
pub struct PreferenceStore {
    backend: Arc<dyn StorageBackend>,
}

impl PreferenceStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    pub fn file(dir: PathBuf) -> Self {
        Self::new(Arc::new(FileBackend::new(dir)))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::default()))
    }

    /// Read a value, falling back to `default` when the backend is
    /// unavailable, the key is absent, or the stored JSON is malformed.
    /// Never returns an error.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.backend.read(key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!("Malformed JSON under key {key:?}: {e}");
                    default
                }
            },
            Ok(None) => default,
            Err(e) => {
                tracing::warn!("LocalStorage not available: {e}");
                default
            }
        }
    }

    /// Write a value. Storage failure is logged and swallowed; the caller
    /// proceeds as if the write succeeded.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Could not serialize value for key {key:?}: {e}");
                return;
            }
        };
        if let Err(e) = self.backend.write(key, &raw) {
            tracing::warn!("LocalStorage not available: {e}");
        }
    }

    /// Load the aggregate preferences object
    pub fn preferences(&self) -> Preferences {
        self.get(PREFERENCES_KEY, Preferences::default())
    }

    /// Persist the aggregate preferences object
    pub fn save_preferences(&self, prefs: &Preferences) {
        self.set(PREFERENCES_KEY, prefs);
    }

    /// Consume the one-shot first-visit marker. Returns true on the first
    /// visit and marks the session so later calls return false.
    pub fn mark_first_visit(&self) -> bool {
        let visited: bool = self.get(FIRST_VISIT_KEY, false);
        if !visited {
            self.set(FIRST_VISIT_KEY, &true);
        }
        !visited
    }

    /// Flip the dark-theme class on the body and persist the choice.
    /// Written on explicit user action only.
    pub fn toggle_dark_theme(&self, page: &crate::page::SharedPage) -> bool {
        let is_dark = page.lock().unwrap().toggle_body_class("dark-theme");
        let mut prefs = self.preferences();
        prefs.dark_theme = is_dark;
        self.save_preferences(&prefs);
        is_dark
    }
}
