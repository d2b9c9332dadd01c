//! Redis-backed cache and cross-worker scheduler lock. Grounded in
//! `ferrex-core`'s `RedisCache` for the get/set/delete shape, and in the
//! original scheduler's `_acquire_scheduler_lock` for the lock semantics:
//! SETNX with a TTL slightly under the job interval, degrading open (job
//! runs) rather than closed when Redis itself is unreachable.

use std::fmt;
use std::time::Duration;

use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::error::StoreError;

type Result<T> = std::result::Result<T, StoreError>;

#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("connection", &"ConnectionManager")
            .finish()
    }
}

impl RedisCache {
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    pub async fn get<T: DeserializeOwned>(&mut self, key: &str) -> Result<Option<T>> {
        let data: Option<String> = self.conn.get(key).await?;
        match data {
            Some(json) => {
                let value = serde_json::from_str(&json)
                    .map_err(|e| StoreError::Cache(redis::RedisError::from((
                        redis::ErrorKind::TypeError,
                        "cache value was not valid JSON",
                        e.to_string(),
                    ))))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    pub async fn set<T: Serialize>(&mut self, key: &str, value: &T, ttl: Option<Duration>) -> Result<()> {
        let json = serde_json::to_string(value).map_err(|e| {
            StoreError::Cache(redis::RedisError::from((
                redis::ErrorKind::TypeError,
                "failed to serialize cache value",
                e.to_string(),
            )))
        })?;

        if let Some(ttl) = ttl {
            self.conn.set_ex::<_, _, ()>(key, json, ttl.as_secs()).await?;
        } else {
            self.conn.set::<_, _, ()>(key, json).await?;
        }

        Ok(())
    }

    pub async fn delete(&mut self, key: &str) -> Result<()> {
        self.conn.del::<_, ()>(key).await?;
        Ok(())
    }

    pub async fn delete_pattern(&mut self, pattern: &str) -> Result<()> {
        let keys: Vec<String> = self.conn.keys(pattern).await?;
        if !keys.is_empty() {
            let _: () = self.conn.del(keys).await?;
        }
        Ok(())
    }

    /// Cross-worker scheduler gate (§4.1). Returns `true` when the caller
    /// should run the job — either because it won the lock, or because
    /// Redis itself could not be reached. A lock that is never acquired is
    /// a silent missed job run; a job that runs twice is self-correcting
    /// (the second run finds nothing new to do), so this fails open.
    pub async fn try_acquire_scheduler_lock(&mut self, job_id: &str, ttl: Duration) -> bool {
        let key = format!("sched:{job_id}");
        let result: redis::RedisResult<Option<String>> = redis::cmd("SET")
            .arg(&key)
            .arg("1")
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs())
            .query_async(&mut self.conn)
            .await;

        match result {
            Ok(Some(_)) => {
                debug!(job_id, "acquired scheduler lock");
                true
            }
            Ok(None) => {
                debug!(job_id, "scheduler lock held by another worker");
                false
            }
            Err(err) => {
                warn!(job_id, %err, "redis unreachable for scheduler lock, running job anyway");
                true
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CacheKeys;

impl CacheKeys {
    /// §6 flow-query cache key, keyed by an md5 of the normalized query.
    pub fn flow_query(digest: &str) -> String {
        format!("flow:{digest}")
    }

    pub fn ip_geo(ip: &str) -> String {
        format!("ipgeo:{ip}")
    }

    pub fn duo_state(state: &str) -> String {
        format!("duo_state:{state}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_keys_are_namespaced() {
        assert_eq!(CacheKeys::flow_query("abc"), "flow:abc");
        assert_eq!(CacheKeys::ip_geo("10.0.0.1"), "ipgeo:10.0.0.1");
        assert_eq!(CacheKeys::duo_state("xyz"), "duo_state:xyz");
    }
}
