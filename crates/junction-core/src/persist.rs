//! Key-value persistence for the route list.
//!
//! The whole list lives under a single key as a JSON array of route records.

use crate::error::Result;
use crate::route::Route;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Key the route list is stored under.
pub const ROUTES_KEY: &str = "mj.routes";

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// A JSON object file mapping keys to string values.
///
/// Every write rewrites the file through a sibling temp file and a rename.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.read();
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.write();
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.write();
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// Load the stored route list.
///
/// Malformed data is discarded with a warning and yields an empty list;
/// only store-level failures (unreadable file) are returned as errors.
pub fn load_routes(store: &dyn KeyValueStore, key: &str) -> Result<Vec<Route>> {
    let Some(item) = store.get(key)? else {
        debug!("No stored routes under {}", key);
        return Ok(Vec::new());
    };

    match serde_json::from_str::<Vec<Route>>(&item) {
        Ok(routes) => {
            debug!("Loaded {} routes from {}", routes.len(), key);
            Ok(routes)
        }
        Err(e) => {
            warn!("Discarding stored routes under {}: {}", key, e);
            Ok(Vec::new())
        }
    }
}

pub fn save_routes(store: &dyn KeyValueStore, key: &str, routes: &[Route]) -> Result<()> {
    let json = serde_json::to_string(routes)?;
    store.set(key, &json)?;
    debug!("Saved {} routes to {}", routes.len(), key);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::{MessageTypeFilter, RouteSettings, Transpose};

    fn sample_routes() -> Vec<Route> {
        vec![
            Route::new("keys", "synth"),
            Route::new("keys", "drums").with_settings(RouteSettings {
                transpose: Transpose::new(-5).unwrap(),
                message_types: MessageTypeFilter::only([8, 9]),
                active_sense: true,
            }),
        ]
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_save_then_load() {
        let store = MemoryStore::new();
        let routes = sample_routes();
        save_routes(&store, ROUTES_KEY, &routes).unwrap();
        assert_eq!(load_routes(&store, ROUTES_KEY).unwrap(), routes);
    }

    #[test]
    fn test_missing_key_is_empty() {
        let store = MemoryStore::new();
        assert!(load_routes(&store, ROUTES_KEY).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_data_discarded() {
        let store = MemoryStore::new();
        store.set(ROUTES_KEY, "{not json").unwrap();
        assert!(load_routes(&store, ROUTES_KEY).unwrap().is_empty());

        store
            .set(
                ROUTES_KEY,
                r#"[{"inId":"a","outId":"b","transpose":99,"messageTypes":null,"activeSense":false}]"#,
            )
            .unwrap();
        assert!(load_routes(&store, ROUTES_KEY).unwrap().is_empty());
    }

    #[test]
    fn test_reads_browser_encoding() {
        let store = MemoryStore::new();
        store
            .set(
                ROUTES_KEY,
                r#"[{"inId":"input-1","outId":"output-2","transpose":2,"messageTypes":[9],"activeSense":false}]"#,
            )
            .unwrap();
        let routes = load_routes(&store, ROUTES_KEY).unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].transpose.semitones(), 2);
        assert!(routes[0].message_types.allows(9));
        assert!(!routes[0].message_types.allows(8));
    }

    #[test]
    fn test_json_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("routes.json");

        let store = JsonFileStore::new(&path);
        save_routes(&store, ROUTES_KEY, &sample_routes()).unwrap();
        store.set("other", "kept").unwrap();

        let reopened = JsonFileStore::new(&path);
        assert_eq!(load_routes(&reopened, ROUTES_KEY).unwrap(), sample_routes());
        assert_eq!(reopened.get("other").unwrap().as_deref(), Some("kept"));

        reopened.remove(ROUTES_KEY).unwrap();
        assert!(load_routes(&reopened, ROUTES_KEY).unwrap().is_empty());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_json_file_store_corrupt_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routes.json");
        fs::write(&path, "[1, 2").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(store.get(ROUTES_KEY).is_err());
    }
}
