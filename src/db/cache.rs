// db/cache.rs
use redis::{AsyncCommands, aio::ConnectionManager};
use std::sync::Arc;
use serde::{Serialize, de::DeserializeOwned};

pub const THREAD_LIST_TTL: usize = 1800; // 30 minutes

pub struct CacheHelper;

impl CacheHelper {
    pub fn thread_list_key(party_id: &str) -> String {
        format!("user_chats:{}", party_id)
    }

    /// Generic get from cache
    pub async fn get<T: DeserializeOwned>(
        redis: &Arc<ConnectionManager>,
        key: &str,
    ) -> Result<Option<T>, redis::RedisError> {
        let mut conn = ConnectionManager::clone(redis);
        let cached: Option<String> = conn.get(key).await?;

        match cached {
            Some(data) => match serde_json::from_str::<T>(&data) {
                Ok(value) => {
                    tracing::debug!("Cache HIT: {}", key);
                    Ok(Some(value))
                }
                Err(_) => {
                    tracing::warn!("Cache deserialization failed for: {}", key);
                    Ok(None)
                }
            },
            None => {
                tracing::debug!("Cache MISS: {}", key);
                Ok(None)
            }
        }
    }

    /// Generic set to cache with TTL
    pub async fn set<T: Serialize>(
        redis: &Arc<ConnectionManager>,
        key: &str,
        value: &T,
        ttl_seconds: usize,
    ) -> Result<(), redis::RedisError> {
        if let Ok(json) = serde_json::to_string(value) {
            let mut conn = ConnectionManager::clone(redis);
            let _: () = conn.set_ex(key, json, ttl_seconds).await?;
            tracing::debug!("Cache SET: {} (TTL: {}s)", key, ttl_seconds);
        }
        Ok(())
    }

    /// Drop the cached thread lists of both participants.
    pub async fn invalidate_thread_lists(
        redis: &Arc<ConnectionManager>,
        party_ids: &[&str],
    ) -> Result<(), redis::RedisError> {
        let keys: Vec<String> = party_ids.iter().map(|id| Self::thread_list_key(id)).collect();
        let mut conn = ConnectionManager::clone(redis);
        let _: () = conn.del(&keys).await?;
        tracing::debug!("Cache DELETE: {:?}", keys);
        Ok(())
    }
}
