use std::time::Duration;

use moka::future::Cache;

const MAX_ENTRIES: u64 = 1_000;

/// Time-bounded price cache. Owned by whoever resolves prices; never global.
/// A zero TTL disables caching.
pub struct PriceCache {
    inner: Option<Cache<String, f64>>,
}

impl PriceCache {
    pub fn new(ttl: Duration) -> Self {
        let inner = (!ttl.is_zero()).then(|| {
            Cache::builder()
                .time_to_live(ttl)
                .max_capacity(MAX_ENTRIES)
                .build()
        });
        Self { inner }
    }

    pub async fn get(&self, key: &str) -> Option<f64> {
        match &self.inner {
            Some(cache) => cache.get(key).await,
            None => None,
        }
    }

    pub async fn insert(&self, key: &str, price: f64) {
        if let Some(cache) = &self.inner {
            cache.insert(key.to_string(), price).await;
        }
    }
}
