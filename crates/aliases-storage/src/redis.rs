use aliases_core::{Commit, KvConn, KvStore, StoreError, StoreResult, Write};
use async_trait::async_trait;
use deadpool_redis::redis;
use deadpool_redis::{Pool, PoolConfig, Runtime};
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};
use typed_builder::TypedBuilder;

const SCAN_COUNT: usize = 100;

/// Connection settings for [`RedisKv`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct RedisConfig {
    /// Redis URL, e.g. `redis://:secret@127.0.0.1:6379/2`.
    #[builder(setter(into))]
    pub url: String,
    /// Maximum number of pooled connections.
    #[builder(default = 3)]
    pub pool_size: usize,
    /// Connections unused for this long are closed by the idle reaper.
    #[builder(default = Duration::from_secs(300))]
    pub idle_timeout: Duration,
    /// Upper bound for a single backend round-trip, including waiting for a
    /// free pooled connection.
    #[builder(default)]
    pub command_timeout: Option<Duration>,
}

/// Maps a Redis error to [`StoreError`], keeping the failed operation.
fn map_redis_error(operation: &str, err: redis::RedisError) -> StoreError {
    let message = format!("{operation}: {err}");
    if err.is_timeout() {
        StoreError::Timeout(message)
    } else if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
        StoreError::Unavailable(message)
    } else {
        StoreError::Operation(message)
    }
}

/// Awaits a Redis call, bounded by `timeout` if one is configured.
async fn run<T, F>(timeout: Option<Duration>, operation: &str, call: F) -> StoreResult<T>
where
    F: Future<Output = redis::RedisResult<T>>,
{
    let result = match timeout {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| StoreError::Timeout(format!("{operation}: exceeded {limit:?}")))?,
        None => call.await,
    };

    result.map_err(|e| {
        warn!(operation, error = %e, "Redis call failed");
        map_redis_error(operation, e)
    })
}

/// Escapes glob metacharacters so `prefix` matches literally in `SCAN MATCH`.
fn glob_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('*');
    pattern
}

/// A Redis implementation of [`KvStore`] backed by a `deadpool-redis` pool.
///
/// Each [`RedisConn`] owns one pooled connection for its whole lifetime, so
/// `WATCH`/`MULTI`/`EXEC` sequences are never interleaved with other callers.
#[derive(Clone)]
pub struct RedisKv {
    pool: Pool,
    command_timeout: Option<Duration>,
}

impl std::fmt::Debug for RedisKv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisKv")
            .field("status", &self.pool.status())
            .field("command_timeout", &self.command_timeout)
            .finish()
    }
}

impl RedisKv {
    /// Creates the connection pool. Connections are opened lazily.
    pub fn connect(config: &RedisConfig) -> StoreResult<Self> {
        let mut pool_config = PoolConfig::new(config.pool_size);
        pool_config.timeouts.wait = config.command_timeout;
        pool_config.timeouts.create = config.command_timeout;

        let mut redis_config = deadpool_redis::Config::from_url(config.url.clone());
        redis_config.pool = Some(pool_config);

        let pool = redis_config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| StoreError::Unavailable(format!("failed to create Redis pool: {e}")))?;

        debug!(pool_size = config.pool_size, "created Redis pool");

        Ok(Self {
            pool,
            command_timeout: config.command_timeout,
        })
    }

    /// Round-trips a `PING` to verify the backend is reachable.
    pub async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.acquire().await?;
        let timeout = conn.timeout;
        let conn = conn.conn()?;
        let _: String = run(timeout, "ping", redis::cmd("PING").query_async(conn)).await?;
        Ok(())
    }

    /// Periodically closes pooled connections idle for longer than
    /// `idle_timeout`. The task runs until aborted.
    pub fn spawn_idle_reaper(&self, idle_timeout: Duration) -> JoinHandle<()> {
        let pool = self.pool.clone();
        let period = (idle_timeout / 2).max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let before = pool.status().size;
                pool.retain(|_, metrics| metrics.last_used() < idle_timeout);
                let after = pool.status().size;
                if after < before {
                    debug!(closed = before - after, remaining = after, "closed idle Redis connections");
                }
            }
        })
    }
}

#[async_trait]
impl KvStore for RedisKv {
    type Conn = RedisConn;

    async fn acquire(&self) -> StoreResult<Self::Conn> {
        let conn = self.pool.get().await.map_err(|e| {
            warn!(error = %e, "failed to acquire Redis connection");
            match e {
                deadpool_redis::PoolError::Timeout(_) => {
                    StoreError::Timeout(format!("acquire connection: {e}"))
                }
                _ => StoreError::Unavailable(format!("acquire connection: {e}")),
            }
        })?;

        Ok(RedisConn {
            conn: Some(conn),
            timeout: self.command_timeout,
            watching: false,
        })
    }
}

/// A pooled Redis connection.
///
/// If it is dropped while a `WATCH` is pending (an operation failed between
/// `watch` and `exec`) the connection is detached from the pool instead of
/// being handed to the next caller with stale watches.
pub struct RedisConn {
    conn: Option<deadpool_redis::Connection>,
    timeout: Option<Duration>,
    watching: bool,
}

impl RedisConn {
    fn conn(&mut self) -> StoreResult<&mut deadpool_redis::Connection> {
        self.conn
            .as_mut()
            .ok_or_else(|| StoreError::Unavailable("connection already released".to_string()))
    }
}

impl Drop for RedisConn {
    fn drop(&mut self) {
        if self.watching {
            if let Some(conn) = self.conn.take() {
                trace!("discarding Redis connection with pending watches");
                drop(deadpool_redis::Connection::take(conn));
            }
        }
    }
}

#[async_trait]
impl KvConn for RedisConn {
    async fn get(&mut self, key: &str) -> StoreResult<Option<String>> {
        trace!(key, "GET");
        let timeout = self.timeout;
        let conn = self.conn()?;
        run(timeout, "get", redis::cmd("GET").arg(key).query_async(conn)).await
    }

    async fn mget(&mut self, keys: &[String]) -> StoreResult<Vec<Option<String>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        trace!(count = keys.len(), "MGET");
        let timeout = self.timeout;
        let conn = self.conn()?;
        run(timeout, "mget", redis::cmd("MGET").arg(keys).query_async(conn)).await
    }

    async fn mset(&mut self, pairs: &[(String, String)]) -> StoreResult<()> {
        if pairs.is_empty() {
            return Ok(());
        }
        trace!(count = pairs.len(), "MSET");

        let mut cmd = redis::cmd("MSET");
        for (key, value) in pairs {
            cmd.arg(key).arg(value);
        }

        let timeout = self.timeout;
        let conn = self.conn()?;
        run(timeout, "mset", cmd.query_async(conn)).await
    }

    async fn exists(&mut self, key: &str) -> StoreResult<bool> {
        trace!(key, "EXISTS");
        let timeout = self.timeout;
        let conn = self.conn()?;
        run(timeout, "exists", redis::cmd("EXISTS").arg(key).query_async(conn)).await
    }

    async fn incr(&mut self, key: &str) -> StoreResult<i64> {
        trace!(key, "INCR");
        let timeout = self.timeout;
        let conn = self.conn()?;
        run(timeout, "incr", redis::cmd("INCR").arg(key).query_async(conn)).await
    }

    async fn del(&mut self, keys: &[String]) -> StoreResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        trace!(count = keys.len(), "DEL");
        let timeout = self.timeout;
        let conn = self.conn()?;
        run(timeout, "del", redis::cmd("DEL").arg(keys).query_async(conn)).await
    }

    async fn scan_prefix(&mut self, prefix: &str) -> StoreResult<Vec<String>> {
        let pattern = glob_prefix(prefix);
        let timeout = self.timeout;
        let conn = self.conn()?;

        let mut keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = run(
                timeout,
                "scan",
                redis::cmd("SCAN")
                    .arg(cursor)
                    .arg("MATCH")
                    .arg(&pattern)
                    .arg("COUNT")
                    .arg(SCAN_COUNT)
                    .query_async(&mut *conn),
            )
            .await?;

            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN may return a key more than once.
        keys.sort_unstable();
        keys.dedup();
        Ok(keys)
    }

    async fn watch(&mut self, keys: &[String]) -> StoreResult<()> {
        trace!(?keys, "WATCH");
        let timeout = self.timeout;
        let conn = self.conn()?;
        run::<(), _>(timeout, "watch", redis::cmd("WATCH").arg(keys).query_async(conn)).await?;
        self.watching = true;
        Ok(())
    }

    async fn unwatch(&mut self) -> StoreResult<()> {
        let timeout = self.timeout;
        let conn = self.conn()?;
        run::<(), _>(timeout, "unwatch", redis::cmd("UNWATCH").query_async(conn)).await?;
        self.watching = false;
        Ok(())
    }

    async fn exec(&mut self, writes: &[Write]) -> StoreResult<Commit> {
        let mut pipe = redis::pipe();
        pipe.atomic();
        for write in writes {
            match write {
                Write::Set { key, value } => {
                    pipe.cmd("SET").arg(key).arg(value);
                }
                Write::Del { key } => {
                    pipe.cmd("DEL").arg(key);
                }
            }
        }

        let timeout = self.timeout;
        let conn = self.conn()?;
        // EXEC replies nil when a watched key changed.
        let reply: Option<redis::Value> = run(timeout, "exec", pipe.query_async(conn)).await?;
        self.watching = false;

        match reply {
            Some(_) => Ok(Commit::Applied),
            None => {
                debug!(writes = writes.len(), "transaction aborted by watched key change");
                Ok(Commit::Conflict)
            }
        }
    }
}
