/// Redis cache for advisory replies.
///
/// Key schema:
/// - `cr:v1:advice:{sha256(classification|text)}`: advisory text (TTL: 24h)
///
/// The complaint text is only ever used as hash input; it is never stored.
use sha2::{Digest, Sha256};

use crate::redis::RedisCache;

const KEY_PREFIX: &str = "cr:v1:";
const ADVICE_TTL_SECS: u64 = 24 * 3600;

pub struct AdviceCache {
    redis: RedisCache,
}

impl AdviceCache {
    pub fn new(redis: RedisCache) -> Self {
        Self { redis }
    }

    pub fn disabled() -> Self {
        Self::new(RedisCache::disabled())
    }

    pub async fn is_available(&self) -> bool {
        self.redis.is_available().await
    }

    pub async fn get_advice(&self, classification: &str, text: &str) -> Option<String> {
        self.redis.get(&advice_key(classification, text)).await
    }

    pub async fn set_advice(&self, classification: &str, text: &str, advice: &str) {
        self.redis
            .set_with_ttl(&advice_key(classification, text), advice, ADVICE_TTL_SECS)
            .await;
    }
}

fn advice_key(classification: &str, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(classification.as_bytes());
    hasher.update(b"|");
    hasher.update(text.trim().as_bytes());
    format!("{KEY_PREFIX}advice:{:x}", hasher.finalize())
}
