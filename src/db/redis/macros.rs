/// Read-through caching for provider lookups.
///
/// Returns the cached value when present. Otherwise awaits `$block`, queues
/// the computed value for a background write and returns it. A failed cache
/// read is logged and treated as a miss; errors from `$block` propagate
/// and nothing is cached.
///
/// # Arguments
/// * `$cache`: The [`Cache`](crate::db::Cache) to read from and write to.
/// * `$key`: The [`CacheKey`](crate::db::CacheKey) for the value.
/// * `$ttl`: Time-to-live of the stored value in seconds.
/// * `$block`: Future producing `AppResult<T>` on a miss.
///
/// # Example
/// ```rust,ignore
/// let places: Vec<PlaceCandidate> = cached!(self.cache, key, ttl, async move {
///     self.fetch_places(query).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        match $cache.get_from_cache(&$key).await {
            Ok(Some(cached)) => Ok(cached),
            lookup => {
                if let Err(e) = lookup {
                    tracing::warn!(error = %e, key = %$key, "Cache read failed, treating as miss");
                }
                match $block.await {
                    Ok(value) => {
                        $cache.set_in_background(&$key, &value, $ttl);
                        Ok(value)
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }};
}
