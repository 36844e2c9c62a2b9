use std::collections::HashMap;
use std::sync::Mutex;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// Cache key, e.g. `["tasks", workspace_id, filters]` or `["task", id]`
pub type QueryKey = Vec<String>;

pub fn query_key<I, S>(parts: I) -> QueryKey
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    parts.into_iter().map(Into::into).collect()
}

/// Query results keyed by `QueryKey`. Invalidation removes every entry whose
/// key starts with the given prefix.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: Mutex<HashMap<QueryKey, Value>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let entries = self.entries.lock().ok()?;
        entries
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn insert<T: Serialize>(&self, key: QueryKey, value: &T) {
        let Ok(value) = serde_json::to_value(value) else {
            return;
        };
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key, value);
        }
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.entries.lock().map(|e| e.contains_key(key)).unwrap_or(false)
    }

    /// Removes entries under `prefix`, returning how many were dropped
    pub fn invalidate(&self, prefix: &[String]) -> usize {
        let Ok(mut entries) = self.entries.lock() else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
