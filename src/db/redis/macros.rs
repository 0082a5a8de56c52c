/// Read-through caching over an optional [`Cache`](crate::db::Cache).
///
/// With no cache, or when redis fails, the block runs directly. A computed
/// value is queued for write with the key's TTL.
///
/// ```rust,ignore
/// cached!(self.cache.as_ref(), CacheKey::Trending, async move {
///     fetch_trending().await
/// })
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $block:expr) => {{
        let cache: Option<&$crate::db::Cache> = $cache;
        let key: $crate::db::CacheKey = $key;

        let hit = match cache {
            Some(cache) => match cache.get(&key).await {
                Ok(hit) => hit,
                Err(e) => {
                    tracing::warn!(error = %e, key = %key, "Cache read failed, fetching directly");
                    None
                }
            },
            None => None,
        };

        match hit {
            Some(hit) => {
                tracing::debug!(key = %key, "Cache hit");
                Ok(hit)
            }
            None => {
                let value = $block.await?;
                if let Some(cache) = cache {
                    cache.put(&key, &value);
                }
                Ok(value)
            }
        }
    }};
}
