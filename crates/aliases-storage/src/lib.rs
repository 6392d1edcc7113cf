//! Key-value backends for the alias engine.

pub mod memory;
pub mod redis;

pub use memory::{InMemoryConn, InMemoryKv};
pub use self::redis::{RedisConfig, RedisConn, RedisKv};
