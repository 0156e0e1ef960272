/// Read-through caching over an `Option<Cache>`.
///
/// A hit returns the cached value. A miss awaits the block, queues the result
/// for storage under the key's TTL, and returns it. Without a cache the block
/// is simply awaited. Errors from the block are never cached, and a cache
/// that cannot be read behaves like a miss.
///
/// ```rust,ignore
/// let movie: Movie = cached!(self.cache, CacheKey::MovieDetails(uri.clone()), async {
///     fetch_from_endpoint(&uri).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $block:expr) => {{
        match &$cache {
            Some(cache) => {
                let key = $key;
                match cache.get(&key).await {
                    Some(hit) => Ok(hit),
                    None => {
                        let value = $block.await?;
                        cache.set_in_background(&key, &value);
                        Ok(value)
                    }
                }
            }
            None => $block.await,
        }
    }};
}
