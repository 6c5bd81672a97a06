//! Durable storage for finished-game history.
//!
//! `KeyValueStore` is the medium (browser `localStorage`, or a map in tests);
//! `HistoryStore` is the capability both the session initializer and the
//! persister are handed. Only the history key is ever touched.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;
use web_sys::Storage;

use crate::error::{BootError, Result, js_message};
use crate::model::History;

/// Synchronous string-keyed store. Other keys may belong to other code.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

pub trait HistoryStore {
    /// Never fails: absent or unreadable history loads as empty.
    fn load(&self) -> History;
    fn save(&self, history: &History) -> Result<()>;
}

impl<T: HistoryStore + ?Sized> HistoryStore for Rc<T> {
    fn load(&self) -> History {
        (**self).load()
    }

    fn save(&self, history: &History) -> Result<()> {
        (**self).save(history)
    }
}

pub struct LocalStore {
    inner: Storage,
}

impl LocalStore {
    pub fn open() -> Result<Self> {
        let win = web_sys::window().ok_or(BootError::NoWindow)?;
        match win.local_storage() {
            Ok(Some(inner)) => Ok(Self { inner }),
            _ => Err(BootError::StorageUnavailable),
        }
    }
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.inner.get_item(key) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(key, error = %js_message(&e), "localStorage read failed");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.inner
            .set_item(key, value)
            .map_err(|e| BootError::Storage(js_message(&e)))
    }
}

#[derive(Default)]
pub struct MemoryStore {
    items: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// History serialized as a JSON array under a single key.
pub struct JsonHistoryStore<S> {
    backend: S,
    key: String,
}

impl<S: KeyValueStore> JsonHistoryStore<S> {
    pub fn new(backend: S, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    #[cfg(test)]
    pub fn backend(&self) -> &S {
        &self.backend
    }
}

impl<S: KeyValueStore> HistoryStore for JsonHistoryStore<S> {
    fn load(&self) -> History {
        let Some(raw) = self.backend.get(&self.key) else {
            return History::empty();
        };
        decode_history(&raw).unwrap_or_else(|| {
            tracing::warn!(key = %self.key, "discarding unreadable stored history");
            History::empty()
        })
    }

    fn save(&self, history: &History) -> Result<()> {
        let raw = serde_json::to_string(history)?;
        self.backend.set(&self.key, &raw)
    }
}

// Older builds could leave the array double-encoded as a JSON string.
fn decode_history(raw: &str) -> Option<History> {
    match serde_json::from_str::<Value>(raw).ok()? {
        Value::Array(items) => Some(items.into_iter().collect()),
        Value::String(inner) => match serde_json::from_str::<Value>(&inner).ok()? {
            Value::Array(items) => Some(items.into_iter().collect()),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HISTORY_KEY;
    use serde_json::json;

    fn store() -> JsonHistoryStore<MemoryStore> {
        JsonHistoryStore::new(MemoryStore::new(), HISTORY_KEY)
    }

    fn sample() -> History {
        [
            json!({"level": "beginner", "won": true, "secs": 41}),
            json!({"level": "expert", "won": false, "secs": 302}),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn absent_key_loads_empty() {
        assert!(store().load().is_empty());
    }

    #[test]
    fn saved_history_reloads_equal() {
        let s = store();
        s.save(&sample()).unwrap();
        assert_eq!(s.load(), sample());
    }

    #[test]
    fn save_writes_json_array_under_key() {
        let s = store();
        s.save(&sample()).unwrap();
        let raw = s.backend().get("finishedGameHistory").unwrap();
        assert!(raw.starts_with('['));
    }

    #[test]
    fn corrupt_value_loads_empty() {
        let s = store();
        s.backend().set(HISTORY_KEY, "{not json").unwrap();
        assert!(s.load().is_empty());
        s.backend().set(HISTORY_KEY, "{\"a\":1}").unwrap();
        assert!(s.load().is_empty());
    }

    #[test]
    fn double_encoded_legacy_value_is_tolerated() {
        let s = store();
        s.backend().set(HISTORY_KEY, "\"[]\"").unwrap();
        assert!(s.load().is_empty());
        s.backend().set(HISTORY_KEY, "\"[{\\\"won\\\":true}]\"").unwrap();
        let expected: History = [json!({"won": true})].into_iter().collect();
        assert_eq!(s.load(), expected);
        s.backend().set(HISTORY_KEY, "\"nope\"").unwrap();
        assert!(s.load().is_empty());
    }

    #[test]
    fn record_keys_keep_engine_order() {
        let s = store();
        let raw = r#"[{"won":true,"level":"expert","secs":302}]"#;
        s.backend().set(HISTORY_KEY, raw).unwrap();
        let loaded = s.load();
        s.save(&loaded).unwrap();
        assert_eq!(s.backend().get(HISTORY_KEY).as_deref(), Some(raw));
    }

    #[test]
    fn other_keys_are_left_alone() {
        let s = store();
        s.backend().set("theme", "dark").unwrap();
        s.save(&sample()).unwrap();
        assert_eq!(s.backend().get("theme").as_deref(), Some("dark"));
    }
}
