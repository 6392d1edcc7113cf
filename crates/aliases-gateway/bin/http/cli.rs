use clap::{Parser, ValueEnum};
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;

pub const LISTEN_ADDR_ENV: &str = "ALIASES_LISTEN_ADDR";
pub const STORAGE_BACKEND_ENV: &str = "ALIASES_STORAGE_BACKEND";
pub const REDIS_URL_ENV: &str = "ALIASES_REDIS_URL";
pub const REDIS_POOL_SIZE_ENV: &str = "ALIASES_REDIS_POOL_SIZE";
pub const REDIS_IDLE_TIMEOUT_ENV: &str = "ALIASES_REDIS_IDLE_TIMEOUT_SECS";
pub const REDIS_COMMAND_TIMEOUT_ENV: &str = "ALIASES_REDIS_COMMAND_TIMEOUT_MS";
pub const MAX_ATTEMPTS_ENV: &str = "ALIASES_MAX_ATTEMPTS";
pub const RAND_MIN_LEN_ENV: &str = "ALIASES_RAND_MIN_LEN";
pub const RAND_MIN_CHARS_ENV: &str = "ALIASES_RAND_MIN_CHARS";
pub const LOG_JSON_ENV: &str = "ALIASES_LOG_JSON";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "redis")]
    Redis,
    #[value(name = "in-memory")]
    InMemory,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::Redis => write!(f, "redis"),
            StorageBackendArg::InMemory => write!(f, "in-memory"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "aliases-gateway", version, about = "Stable alias assignment over HTTP")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::Redis
    )]
    pub storage: StorageBackendArg,

    /// Password and database are taken from the URL.
    #[arg(long, env = REDIS_URL_ENV, default_value = DEFAULT_REDIS_URL)]
    pub redis_url: String,

    #[arg(long, env = REDIS_POOL_SIZE_ENV, default_value_t = 3)]
    pub redis_pool_size: usize,

    /// Pooled connections idle for longer than this are closed.
    #[arg(long, env = REDIS_IDLE_TIMEOUT_ENV, default_value_t = 300)]
    pub redis_idle_timeout_secs: u64,

    #[arg(long, env = REDIS_COMMAND_TIMEOUT_ENV)]
    pub redis_command_timeout_ms: Option<u64>,

    /// Candidates tried per identifier before giving up.
    #[arg(long, env = MAX_ATTEMPTS_ENV, default_value_t = aliases_engine::DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: usize,

    #[arg(long, env = RAND_MIN_LEN_ENV, default_value_t = 4)]
    pub rand_min_len: usize,

    #[arg(long, env = RAND_MIN_CHARS_ENV, default_value_t = 8)]
    pub rand_min_chars: usize,

    /// Emit logs as JSON lines.
    #[arg(long, env = LOG_JSON_ENV)]
    pub log_json: bool,
}
