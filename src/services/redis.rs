//! Redis integration service implementation
//!
//! Redis only guards the daily reminder run against double execution.

use redis::{Client, RedisResult};
use tracing::{debug, warn};
use crate::config::settings::RedisConfig;
use crate::utils::errors::Result;

#[derive(Clone, Debug)]
pub struct RedisService {
    client: Client,
    prefix: String,
}

impl RedisService {
    /// Create a new RedisService instance; no connection is made yet
    pub fn new(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())?;

        Ok(Self { client, prefix: config.prefix.clone() })
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Take a lock with `SET NX EX`. Returns false when someone holds it.
    pub async fn acquire_lock(&self, key: &str, ttl_seconds: u64) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        let full_key = self.full_key(key);

        let reply: Option<String> = redis::cmd("SET")
            .arg(&full_key)
            .arg(chrono::Utc::now().to_rfc3339())
            .arg("NX")
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await?;

        let acquired = reply.is_some();
        debug!(key = %full_key, acquired = acquired, "Lock acquisition attempted");
        Ok(acquired)
    }

    /// Release a lock taken with [`acquire_lock`](Self::acquire_lock)
    pub async fn release_lock(&self, key: &str) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let full_key = self.full_key(key);

        let _: i64 = redis::cmd("DEL").arg(&full_key).query_async(&mut conn).await?;
        debug!(key = %full_key, "Lock released");
        Ok(())
    }

    /// Health check for Redis connection
    pub async fn health_check(&self) -> bool {
        match self.get_connection().await {
            Ok(mut conn) => {
                let result: RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
                match result {
                    Ok(response) => response == "PONG",
                    Err(e) => {
                        warn!(error = %e, "Redis health check failed");
                        false
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Redis connection failed");
                false
            }
        }
    }
}
