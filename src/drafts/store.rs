use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Key-value store holding per-user draft blobs. This is the injected
/// storage boundary of the draft subsystem: handlers and the unifier only
/// ever see this trait, so tests run against the in-memory map and a
/// multi-instance deployment can substitute a shared store.
pub trait DraftCache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    /// Idempotent; absent keys are not an error.
    fn remove(&self, key: &str);
    fn keys(&self) -> Vec<String>;
}

/// In-memory cache, used in tests and as a fallback.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl DraftCache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        map.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        map.insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        let mut map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        map.remove(key);
    }

    fn keys(&self) -> Vec<String> {
        let map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        map.keys().cloned().collect()
    }
}

/// File-backed cache persisted as one JSON object under the data directory.
/// Writes go through the in-memory map and are flushed on every mutation;
/// a corrupt or missing file loads as an empty map.
pub struct FileCache {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileCache {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                log::warn!("Draft cache at {} is corrupt, starting empty: {e}", path.display());
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };
        FileCache {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn flush(&self, map: &HashMap<String, String>) {
        match serde_json::to_string(map) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.path, json) {
                    log::warn!("Failed to persist draft cache to {}: {e}", self.path.display());
                }
            }
            Err(e) => log::warn!("Failed to serialize draft cache: {e}"),
        }
    }
}

impl DraftCache for FileCache {
    fn get(&self, key: &str) -> Option<String> {
        let map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        map.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        map.insert(key.to_string(), value.to_string());
        self.flush(&map);
    }

    fn remove(&self, key: &str) {
        let mut map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if map.remove(key).is_some() {
            self.flush(&map);
        }
    }

    fn keys(&self) -> Vec<String> {
        let map = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        map.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_cache_round_trips_across_reopen() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("cache.json");

        let cache = FileCache::open(&path);
        cache.set("a", "1");
        cache.set("b", "2");
        cache.remove("a");

        let reopened = FileCache::open(&path);
        assert_eq!(reopened.get("a"), None);
        assert_eq!(reopened.get("b"), Some("2".to_string()));
    }

    #[test]
    fn file_cache_survives_corrupt_file() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "not json").expect("write");

        let cache = FileCache::open(&path);
        assert!(cache.keys().is_empty());
    }
}
