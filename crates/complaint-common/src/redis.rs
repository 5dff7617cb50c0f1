/// Redis wrapper with graceful degradation.
///
/// Every operation swallows Redis errors: it logs a warning and returns `None`
/// or `false`. The services are fully functional without Redis.
use redis::AsyncCommands;
use tracing::warn;

pub struct RedisCache {
    client: Option<redis::Client>,
}

impl RedisCache {
    /// Create a client for `url`. A `None` URL or an unparsable one yields a
    /// cache that never stores anything.
    pub fn new(url: Option<&str>) -> Self {
        let client = url.and_then(|u| {
            redis::Client::open(u)
                .inspect_err(|e| warn!(error = %e, url = u, "failed to create redis client, cache disabled"))
                .ok()
        });
        Self { client }
    }

    pub fn disabled() -> Self {
        Self { client: None }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// Send a PING. Returns `true` if Redis is reachable.
    pub async fn is_available(&self) -> bool {
        let Some(client) = &self.client else {
            return false;
        };
        match client.get_multiplexed_async_connection().await {
            Ok(mut conn) => {
                let result: Result<String, _> = redis::cmd("PING").query_async(&mut conn).await;
                result.is_ok()
            }
            Err(_) => false,
        }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let client = self.client.as_ref()?;
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .inspect_err(|e| warn!(error = %e, "redis connection failed"))
            .ok()?;
        let value: Option<String> = conn
            .get(key)
            .await
            .inspect_err(|e| warn!(error = %e, key, "redis GET failed"))
            .ok()?;
        value
    }

    /// Set a value with a TTL in seconds. Returns `true` if stored.
    pub async fn set_with_ttl(&self, key: &str, value: &str, ttl_secs: u64) -> bool {
        let Some(client) = &self.client else {
            return false;
        };
        let Ok(mut conn) = client
            .get_multiplexed_async_connection()
            .await
            .inspect_err(|e| warn!(error = %e, "redis connection failed"))
        else {
            return false;
        };
        conn.set_ex::<_, _, ()>(key, value, ttl_secs)
            .await
            .inspect_err(|e| warn!(error = %e, key, "redis SETEX failed"))
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_cache_is_noop() {
        let cache = RedisCache::new(None);
        assert!(!cache.is_configured());
        assert!(!cache.is_available().await);
        assert_eq!(cache.get("cr:v1:missing").await, None);
        assert!(!cache.set_with_ttl("cr:v1:missing", "x", 10).await);
    }

    #[test]
    fn test_invalid_url_disables_cache() {
        let cache = RedisCache::new(Some("not a redis url"));
        assert!(!cache.is_configured());
    }
}
