//! Redis-backed store.

use async_trait::async_trait;
use redis::AsyncCommands;
use std::collections::HashMap;

use super::{Store, StoreError};

/// Redis implementation shared by the bot and the verification worker.
pub struct RedisStore {
    client: redis::Client,
}

impl RedisStore {
    /// Create a new Redis store from a connection URL.
    pub fn new(connection_url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(connection_url)
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self { client })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, StoreError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))
    }
}

fn command_error(e: redis::RedisError) -> StoreError {
    if e.kind() == redis::ErrorKind::TypeError {
        StoreError::WrongType(e.to_string())
    } else {
        StoreError::Connection(e.to_string())
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.connection().await?;
        conn.exists(key).await.map_err(command_error)
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection().await?;
        conn.hget(key, field).await.map_err(command_error)
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        conn.hset::<_, _, _, ()>(key, field, value)
            .await
            .map_err(command_error)
    }

    async fn hset_multiple(
        &self,
        key: &str,
        fields: &[(&str, String)],
    ) -> Result<(), StoreError> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection().await?;
        conn.hset_multiple::<_, _, _, ()>(key, fields)
            .await
            .map_err(command_error)
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        let mut conn = self.connection().await?;
        conn.hgetall(key).await.map_err(command_error)
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.connection().await?;
        let removed: usize = conn.del(key).await.map_err(command_error)?;
        Ok(removed > 0)
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        conn.expire::<_, ()>(key, seconds as i64)
            .await
            .map_err(command_error)
    }

    async fn zrange_by_score_min(&self, key: &str, min: f64) -> Result<Vec<String>, StoreError> {
        let mut conn = self.connection().await?;
        conn.zrangebyscore(key, min, "+inf")
            .await
            .map_err(command_error)
    }

    async fn zrem_range_by_score_min(&self, key: &str, min: f64) -> Result<usize, StoreError> {
        let mut conn = self.connection().await?;
        conn.zrembyscore(key, min, "+inf")
            .await
            .map_err(command_error)
    }
}
