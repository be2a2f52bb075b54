//! Opaque key-value persistence
//!
//! The simulation only ever sees this trait; what backs it (a JSON file, a
//! browser's LocalStorage, a test map) is the embedding's business. Storage
//! failures degrade to defaults and a log line, never into the tick.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Minimal persistent store for counters, records, and one-shot flags.
pub trait KeyValueStore {
    fn get_float(&self, key: &str, default: f64) -> f64;
    fn set_float(&mut self, key: &str, value: f64);
    fn get_int(&self, key: &str, default: i64) -> i64;
    fn set_int(&mut self, key: &str, value: i64);
}

/// Volatile store for tests and headless runs.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MemoryStore {
    floats: HashMap<String, f64>,
    ints: HashMap<String, i64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_float(&self, key: &str, default: f64) -> f64 {
        self.floats.get(key).copied().unwrap_or(default)
    }

    fn set_float(&mut self, key: &str, value: f64) {
        let _ = self.floats.insert(key.to_owned(), value);
    }

    fn get_int(&self, key: &str, default: i64) -> i64 {
        self.ints.get(key).copied().unwrap_or(default)
    }

    fn set_int(&mut self, key: &str, value: i64) {
        let _ = self.ints.insert(key.to_owned(), value);
    }
}

/// JSON-file-backed store: loads eagerly, writes through on every set.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: MemoryStore,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(values) => {
                    log::info!("loaded records from {}", path.display());
                    values
                }
                Err(err) => {
                    log::warn!("corrupt record file {}: {err}", path.display());
                    MemoryStore::default()
                }
            },
            Err(_) => {
                log::info!("no record file at {}, starting fresh", path.display());
                MemoryStore::default()
            }
        };
        Self { path, values }
    }

    fn flush(&self) {
        match serde_json::to_string_pretty(&self.values) {
            Ok(json) => {
                if let Err(err) = fs::write(&self.path, json) {
                    log::warn!("failed to save records to {}: {err}", self.path.display());
                }
            }
            Err(err) => log::warn!("failed to encode records: {err}"),
        }
    }
}

impl KeyValueStore for FileStore {
    fn get_float(&self, key: &str, default: f64) -> f64 {
        self.values.get_float(key, default)
    }

    fn set_float(&mut self, key: &str, value: f64) {
        self.values.set_float(key, value);
        self.flush();
    }

    fn get_int(&self, key: &str, default: i64) -> i64 {
        self.values.get_int(key, default)
    }

    fn set_int(&mut self, key: &str, value: i64) {
        self.values.set_int(key, value);
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip_and_defaults() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get_float("missing", 1.5), 1.5);
        assert_eq!(store.get_int("missing", 7), 7);

        store.set_float("a", 2.5);
        store.set_int("b", -3);
        assert_eq!(store.get_float("a", 0.0), 2.5);
        assert_eq!(store.get_int("b", 0), -3);
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let path = std::env::temp_dir().join("lane_warden_store_test.json");
        let _ = fs::remove_file(&path);

        {
            let mut store = FileStore::open(&path);
            store.set_float("ArenaHighScore", 420.0);
            store.set_int("TotalScore", 9000);
        }

        let store = FileStore::open(&path);
        assert_eq!(store.get_float("ArenaHighScore", 0.0), 420.0);
        assert_eq!(store.get_int("TotalScore", 0), 9000);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_file_store_survives_corrupt_file() {
        let path = std::env::temp_dir().join("lane_warden_store_corrupt.json");
        fs::write(&path, "{not json").unwrap();

        let store = FileStore::open(&path);
        assert_eq!(store.get_int("TotalScore", 42), 42);

        let _ = fs::remove_file(&path);
    }
}
