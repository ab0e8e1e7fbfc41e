//! Key-value store abstraction.
//!
//! The bot keeps all shared state (channel rotation, upload status, verification
//! votes) in a Redis-style store made of hashes and score-sorted sets.
//! - `MemoryStore`: in-process implementation for tests and local runs
//! - `RedisStore`: production implementation

mod memory;
mod redis_store;

pub mod keys;

pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Wrong value type at key {0}")]
    WrongType(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Hash, key and sorted-set operations used by the media and upload pipelines.
///
/// Score ranges are always "min to +inf", which is the only bound the
/// reconciler ever needs. Vote sets are written by the web frontend; this
/// side only reads and clears them.
#[async_trait]
pub trait Store: Send + Sync {
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError>;

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError>;

    async fn hset_multiple(&self, key: &str, fields: &[(&str, String)])
        -> Result<(), StoreError>;

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, StoreError>;

    /// Returns whether the key existed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    async fn expire(&self, key: &str, seconds: u64) -> Result<(), StoreError>;

    /// Members with `score >= min`, lowest score first.
    async fn zrange_by_score_min(&self, key: &str, min: f64) -> Result<Vec<String>, StoreError>;

    /// Removes members with `score >= min`, returning how many were removed.
    async fn zrem_range_by_score_min(&self, key: &str, min: f64) -> Result<usize, StoreError>;
}
