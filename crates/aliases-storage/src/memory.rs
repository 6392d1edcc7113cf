use aliases_core::{Commit, KvConn, KvStore, StoreError, StoreResult, Write};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Map contents plus a version per key.
///
/// Every mutation of a key stamps it with a fresh value of `clock`, which is
/// what watches compare against.
#[derive(Debug, Default)]
struct State {
    data: HashMap<String, String>,
    versions: HashMap<String, u64>,
    clock: u64,
}

impl State {
    fn version(&self, key: &str) -> u64 {
        self.versions.get(key).copied().unwrap_or(0)
    }

    fn touch(&mut self, key: &str) {
        self.clock += 1;
        self.versions.insert(key.to_string(), self.clock);
    }

    fn set(&mut self, key: &str, value: &str) {
        self.data.insert(key.to_string(), value.to_string());
        self.touch(key);
    }

    fn remove(&mut self, key: &str) -> bool {
        let existed = self.data.remove(key).is_some();
        if existed {
            self.touch(key);
        }
        existed
    }
}

/// In-process implementation of [`KvStore`].
///
/// A single lock guards the whole map, so multi-key writes are atomic.
/// Watches follow Redis semantics: a commit aborts if any watched key was
/// written since the watch, including by the same connection.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKv {
    state: Arc<Mutex<State>>,
}

impl InMemoryKv {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a sorted copy of every key and value.
    pub fn entries(&self) -> BTreeMap<String, String> {
        let state = self.state.lock();
        state
            .data
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KvStore for InMemoryKv {
    type Conn = InMemoryConn;

    async fn acquire(&self) -> StoreResult<Self::Conn> {
        Ok(InMemoryConn {
            state: Arc::clone(&self.state),
            watched: Vec::new(),
        })
    }
}

/// Connection handed out by [`InMemoryKv`]. Holds its own watch set.
#[derive(Debug)]
pub struct InMemoryConn {
    state: Arc<Mutex<State>>,
    watched: Vec<(String, u64)>,
}

#[async_trait]
impl KvConn for InMemoryConn {
    async fn get(&mut self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.state.lock().data.get(key).cloned())
    }

    async fn mget(&mut self, keys: &[String]) -> StoreResult<Vec<Option<String>>> {
        let state = self.state.lock();
        Ok(keys.iter().map(|k| state.data.get(k).cloned()).collect())
    }

    async fn mset(&mut self, pairs: &[(String, String)]) -> StoreResult<()> {
        let mut state = self.state.lock();
        for (key, value) in pairs {
            state.set(key, value);
        }
        Ok(())
    }

    async fn exists(&mut self, key: &str) -> StoreResult<bool> {
        Ok(self.state.lock().data.contains_key(key))
    }

    async fn incr(&mut self, key: &str) -> StoreResult<i64> {
        let mut state = self.state.lock();

        let current = match state.data.get(key) {
            Some(raw) => raw.parse::<i64>().map_err(|e| {
                StoreError::InvalidData(format!("incr '{key}': value is not an integer: {e}"))
            })?,
            None => 0,
        };

        let next = current
            .checked_add(1)
            .ok_or_else(|| StoreError::InvalidData(format!("incr '{key}': overflow")))?;

        state.set(key, &next.to_string());
        Ok(next)
    }

    async fn del(&mut self, keys: &[String]) -> StoreResult<u64> {
        let mut state = self.state.lock();
        Ok(keys.iter().filter(|k| state.remove(k)).count() as u64)
    }

    async fn scan_prefix(&mut self, prefix: &str) -> StoreResult<Vec<String>> {
        let state = self.state.lock();
        Ok(state
            .data
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn watch(&mut self, keys: &[String]) -> StoreResult<()> {
        let state = self.state.lock();
        for key in keys {
            self.watched.push((key.clone(), state.version(key)));
        }
        Ok(())
    }

    async fn unwatch(&mut self) -> StoreResult<()> {
        self.watched.clear();
        Ok(())
    }

    async fn exec(&mut self, writes: &[Write]) -> StoreResult<Commit> {
        let watched = std::mem::take(&mut self.watched);
        let mut state = self.state.lock();

        if watched
            .iter()
            .any(|(key, version)| state.version(key) != *version)
        {
            return Ok(Commit::Conflict);
        }

        for write in writes {
            match write {
                Write::Set { key, value } => state.set(key, value),
                Write::Del { key } => {
                    state.remove(key);
                }
            }
        }

        Ok(Commit::Applied)
    }
}
