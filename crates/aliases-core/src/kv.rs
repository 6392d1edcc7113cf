use crate::error::StoreError;
use async_trait::async_trait;

/// Result type for backend operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A write staged for an atomic commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    Set { key: String, value: String },
    Del { key: String },
}

impl Write {
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        Write::Set {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn del(key: impl Into<String>) -> Self {
        Write::Del { key: key.into() }
    }
}

/// Outcome of [`KvConn::exec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// All staged writes were applied.
    Applied,
    /// A watched key changed; nothing was applied.
    Conflict,
}

/// A shared key-value backend handing out pooled connections.
#[async_trait]
pub trait KvStore: Send + Sync + 'static {
    type Conn: KvConn;

    /// Acquires a connection. Dropping it releases it back to the backend.
    async fn acquire(&self) -> StoreResult<Self::Conn>;
}

/// One exclusively held backend connection.
///
/// Watches are connection-scoped: a [`KvConn::exec`] only observes keys
/// passed to [`KvConn::watch`] on the same connection.
#[async_trait]
pub trait KvConn: Send + 'static {
    /// Returns `Ok(None)` if the key does not exist.
    async fn get(&mut self, key: &str) -> StoreResult<Option<String>>;

    /// Reads several keys at once; results line up with `keys`.
    async fn mget(&mut self, keys: &[String]) -> StoreResult<Vec<Option<String>>>;

    /// Unconditionally writes all pairs as one atomic step.
    async fn mset(&mut self, pairs: &[(String, String)]) -> StoreResult<()>;

    async fn exists(&mut self, key: &str) -> StoreResult<bool>;

    /// Atomically increments an integer value, starting from 0 if absent.
    async fn incr(&mut self, key: &str) -> StoreResult<i64>;

    /// Removes keys and returns how many existed.
    async fn del(&mut self, keys: &[String]) -> StoreResult<u64>;

    /// Lists every key starting with `prefix`, in no particular order.
    async fn scan_prefix(&mut self, prefix: &str) -> StoreResult<Vec<String>>;

    /// Starts watching keys for the next [`KvConn::exec`].
    async fn watch(&mut self, keys: &[String]) -> StoreResult<()>;

    /// Drops all watches without committing.
    async fn unwatch(&mut self) -> StoreResult<()>;

    /// Applies `writes` atomically unless a watched key changed since it was
    /// watched. Clears the watch set either way.
    async fn exec(&mut self, writes: &[Write]) -> StoreResult<Commit>;
}
