use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::error::AppResult;
use crate::models::TravelMode;

#[derive(Debug, Clone, PartialEq)]
pub enum CacheKey {
    PlaceSearch {
        query: String,
        language: String,
        latitude: f64,
        longitude: f64,
        radius_meters: u32,
        max_results: usize,
    },
    Weather {
        latitude: f64,
        longitude: f64,
        timezone: String,
    },
    Route {
        origin_latitude: f64,
        origin_longitude: f64,
        destination_latitude: f64,
        destination_longitude: f64,
        travel_mode: TravelMode,
    },
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::PlaceSearch {
                query,
                language,
                latitude,
                longitude,
                radius_meters,
                max_results,
            } => write!(
                f,
                "places:{}:{:.4},{:.4}:{}:{}:{}",
                language,
                latitude,
                longitude,
                radius_meters,
                max_results,
                query.trim().to_lowercase()
            ),
            CacheKey::Weather {
                latitude,
                longitude,
                timezone,
            } => write!(f, "weather:{:.4},{:.4}:{}", latitude, longitude, timezone),
            CacheKey::Route {
                origin_latitude,
                origin_longitude,
                destination_latitude,
                destination_longitude,
                travel_mode,
            } => write!(
                f,
                "route:{}:{:.5},{:.5}:{:.5},{:.5}",
                travel_mode,
                origin_latitude,
                origin_longitude,
                destination_latitude,
                destination_longitude
            ),
        }
    }
}

/// Creates a Redis client for caching
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Message for asynchronous cache writes
struct CacheWriteMessage {
    key: String,
    value: String,
    ttl: u64,
}

#[derive(Clone)]
struct Backend {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<CacheWriteMessage>,
    timeout: Duration,
}

/// Cache handler for provider responses
///
/// A disabled cache (no Redis configured) always misses and drops writes, so
/// providers can use the same code path either way.
#[derive(Clone)]
pub struct Cache {
    backend: Option<Backend>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl CacheWriterHandle {
    /// Signals the writer task to flush pending writes and stop
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");
    }
}

impl Cache {
    /// Creates a Redis-backed cache and spawns its background writer
    ///
    /// Every Redis round trip (connect included) is bounded by `timeout`.
    /// Must be called from within a Tokio runtime.
    pub fn new(redis_client: Client, timeout: Duration) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        tokio::spawn(async move {
            Self::cache_writer_task(client, timeout, write_rx, shutdown_rx).await;
        });

        let cache = Self {
            backend: Some(Backend {
                redis_client,
                write_tx,
                timeout,
            }),
        };

        (cache, CacheWriterHandle { shutdown_tx })
    }

    /// A cache that never stores anything
    pub fn disabled() -> Self {
        Self { backend: None }
    }

    /// Builds a Redis cache when a URL is configured, otherwise a disabled one
    pub fn from_url(
        redis_url: Option<&str>,
        timeout: Duration,
    ) -> anyhow::Result<(Self, Option<CacheWriterHandle>)> {
        match redis_url.map(str::trim).filter(|url| !url.is_empty()) {
            Some(url) => {
                let (cache, handle) = Self::new(create_redis_client(url)?, timeout);
                tracing::info!("Provider response cache enabled");
                Ok((cache, Some(handle)))
            }
            None => {
                tracing::info!("REDIS_URL not set, provider response cache disabled");
                Ok((Self::disabled(), None))
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Background task that drains the write channel into Redis
    ///
    /// On shutdown, flushes every queued message before exiting.
    async fn cache_writer_task(
        client: Client,
        timeout: Duration,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    if let Err(e) = Self::write_to_redis(&client, timeout, msg).await {
                        tracing::error!(error = %e, "Failed to write to Redis cache");
                    }
                }
                _ = shutdown_rx.recv() => {
                    write_rx.close();
                    let mut flushed = 0usize;
                    while let Some(msg) = write_rx.recv().await {
                        if let Err(e) = Self::write_to_redis(&client, timeout, msg).await {
                            tracing::error!(error = %e, "Failed to flush cache write during shutdown");
                        } else {
                            flushed += 1;
                        }
                    }

                    tracing::info!(flushed = flushed, "Cache writer task stopped");
                    break;
                }
            }
        }
    }

    async fn write_to_redis(client: &Client, timeout: Duration, msg: CacheWriteMessage) -> AppResult<()> {
        with_timeout(timeout, "write", async {
            let mut conn = client.get_multiplexed_async_connection().await?;
            let _: () = conn.set_ex(msg.key, msg.value, msg.ttl).await?;
            Ok::<_, AppError>(())
        })
        .await
    }

    /// Retrieves and deserializes a cached value, `None` on a miss
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let Some(backend) = &self.backend else {
            return Ok(None);
        };

        let cached: Option<String> = with_timeout(backend.timeout, "read", async {
            let mut conn = backend.redis_client.get_multiplexed_async_connection().await?;
            let value: Option<String> = conn.get(key.to_string()).await?;
            Ok::<_, AppError>(value)
        })
        .await?;

        match cached {
            Some(json) => {
                let data = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    /// Queues a value for a background write and returns immediately
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let Some(backend) = &self.backend else {
            return;
        };

        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let msg = CacheWriteMessage {
            key: key.to_string(),
            value: json,
            ttl,
        };

        if let Err(e) = backend.write_tx.send(msg) {
            tracing::error!(error = %e, "Failed to send cache write message");
        }
    }
}

/// Fails with [`AppError::Internal`] when Redis does not answer within `timeout`
async fn with_timeout<T>(
    timeout: Duration,
    operation: &str,
    fut: impl std::future::Future<Output = AppResult<T>>,
) -> AppResult<T> {
    tokio::time::timeout(timeout, fut).await.map_err(|_| {
        AppError::Internal(format!("Cache {} timed out after {:?}", operation, timeout))
    })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cached;

    #[test]
    fn test_cache_key_display_place_search() {
        let key = CacheKey::PlaceSearch {
            query: "  Quiet CAFE ".to_string(),
            language: "en".to_string(),
            latitude: 22.28123,
            longitude: 114.15876,
            radius_meters: 5000,
            max_results: 10,
        };
        assert_eq!(key.to_string(), "places:en:22.2812,114.1588:5000:10:quiet cafe");
    }

    #[test]
    fn test_cache_key_display_weather() {
        let key = CacheKey::Weather {
            latitude: 22.3193,
            longitude: 114.1694,
            timezone: "auto".to_string(),
        };
        assert_eq!(key.to_string(), "weather:22.3193,114.1694:auto");
    }

    #[test]
    fn test_cache_key_display_route() {
        let key = CacheKey::Route {
            origin_latitude: 22.0,
            origin_longitude: 114.0,
            destination_latitude: 22.001,
            destination_longitude: 114.002,
            travel_mode: TravelMode::Transit,
        };
        assert_eq!(
            key.to_string(),
            "route:transit:22.00000,114.00000:22.00100,114.00200"
        );
    }

    #[tokio::test]
    async fn test_disabled_cache_always_misses() {
        let cache = Cache::disabled();
        let key = CacheKey::Weather {
            latitude: 1.0,
            longitude: 2.0,
            timezone: "auto".to_string(),
        };

        cache.set_in_background(&key, &vec!["ignored".to_string()], 60);
        let retrieved: Option<Vec<String>> = cache.get_from_cache(&key).await.unwrap();
        assert!(!cache.is_enabled());
        assert_eq!(retrieved, None);
    }

    #[tokio::test]
    async fn test_cached_macro_computes_on_miss_and_propagates_errors() {
        async fn lookup(cache: &Cache, fail: bool) -> AppResult<Vec<String>> {
            let key = CacheKey::Weather {
                latitude: 0.0,
                longitude: 0.0,
                timezone: "auto".to_string(),
            };
            cached!(cache, key, 60, async move {
                if fail {
                    Err(AppError::ExternalApi("boom".to_string()))
                } else {
                    Ok(vec!["computed".to_string()])
                }
            })
        }

        let cache = Cache::disabled();
        assert_eq!(lookup(&cache, false).await.unwrap(), vec!["computed".to_string()]);
        assert!(lookup(&cache, true).await.is_err());
    }

    /// Accepts connections and never answers, like a Redis host that stalls
    async fn silent_redis() -> (String, tokio::task::JoinHandle<()>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        (format!("redis://{}", addr), task)
    }

    #[tokio::test]
    async fn test_stalled_redis_read_times_out_as_miss() {
        let (url, server) = silent_redis().await;
        let (cache, handle) =
            Cache::new(create_redis_client(&url).unwrap(), Duration::from_millis(200));
        let key = CacheKey::Weather {
            latitude: 3.0,
            longitude: 4.0,
            timezone: "auto".to_string(),
        };

        let started = std::time::Instant::now();
        let read: AppResult<Option<Vec<String>>> = cache.get_from_cache(&key).await;
        assert!(matches!(read, Err(AppError::Internal(_))));
        assert!(started.elapsed() < Duration::from_secs(5));

        let computed: AppResult<Vec<String>> =
            cached!(cache, key, 60, async { Ok(vec!["fresh".to_string()]) });
        assert_eq!(computed.unwrap(), vec!["fresh".to_string()]);
        assert!(started.elapsed() < Duration::from_secs(5));

        handle.shutdown().await;
        server.abort();
    }

    #[test]
    fn test_from_url_without_redis_is_disabled() {
        let (cache, handle) = Cache::from_url(None, Duration::from_secs(1)).unwrap();
        assert!(!cache.is_enabled());
        assert!(handle.is_none());

        let (cache, _) = Cache::from_url(Some("   "), Duration::from_secs(1)).unwrap();
        assert!(!cache.is_enabled());
    }

    #[tokio::test]
    #[ignore = "requires a running Redis"]
    async fn test_set_in_background_writes_to_cache() {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

        let client = create_redis_client(&redis_url).unwrap();
        let (cache, handle) = Cache::new(client.clone(), Duration::from_secs(2));

        let key = CacheKey::Weather {
            latitude: 10.0,
            longitude: 20.0,
            timezone: "test_async_write".to_string(),
        };
        let value = vec!["item1".to_string(), "item2".to_string()];

        cache.set_in_background(&key, &value, 60);
        handle.shutdown().await;
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let retrieved: Option<Vec<String>> = cache.get_from_cache(&key).await.unwrap();
        assert_eq!(retrieved, Some(value));

        let mut conn = client.get_multiplexed_async_connection().await.unwrap();
        let _: () = conn.del(key.to_string()).await.unwrap();
    }
}
