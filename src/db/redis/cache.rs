use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::error::AppResult;

const LIST_TTL_SECS: u64 = 15 * 60;
const SEARCH_TTL_SECS: u64 = 60 * 60;
const DETAILS_TTL_SECS: u64 = 6 * 60 * 60;

/// Keys of cached catalog responses
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    UpcomingMovies,
    OnTheAir,
    AsianSeries,
    Trending,
    Search(String),
    SeriesDetails(i64),
}

impl CacheKey {
    /// Expiry in seconds; series details change less often than lists
    pub fn ttl(&self) -> u64 {
        match self {
            CacheKey::UpcomingMovies
            | CacheKey::OnTheAir
            | CacheKey::AsianSeries
            | CacheKey::Trending => LIST_TTL_SECS,
            CacheKey::Search(_) => SEARCH_TTL_SECS,
            CacheKey::SeriesDetails(_) => DETAILS_TTL_SECS,
        }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::UpcomingMovies => write!(f, "list:upcoming"),
            CacheKey::OnTheAir => write!(f, "list:on_the_air"),
            CacheKey::AsianSeries => write!(f, "list:asian"),
            CacheKey::Trending => write!(f, "list:trending"),
            CacheKey::Search(query) => write!(f, "search:{}", query.trim().to_lowercase()),
            CacheKey::SeriesDetails(id) => write!(f, "tv:{}", id),
        }
    }
}

pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

struct PendingWrite {
    key: String,
    json: String,
    ttl: u64,
}

/// Read-through cache for catalog responses
///
/// Reads hit redis directly; writes are queued to a background task so a
/// slow redis never delays a feed response.
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<PendingWrite>,
}

/// Stops the background writer once queued writes are flushed
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl CacheWriterHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Catalog cache writer shutdown requested");
    }
}

impl Cache {
    pub fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        tokio::spawn(Self::run_writer(redis_client.clone(), write_rx, shutdown_rx));

        (
            Self {
                redis_client,
                write_tx,
            },
            CacheWriterHandle { shutdown_tx },
        )
    }

    async fn run_writer(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<PendingWrite>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::debug!("Catalog cache writer started");

        loop {
            tokio::select! {
                Some(write) = write_rx.recv() => {
                    Self::store(&client, write).await;
                }
                _ = shutdown_rx.recv() => {
                    write_rx.close();
                    let mut flushed = 0usize;
                    while let Some(write) = write_rx.recv().await {
                        Self::store(&client, write).await;
                        flushed += 1;
                    }
                    tracing::info!(flushed, "Catalog cache writer stopped");
                    break;
                }
            }
        }
    }

    async fn store(client: &Client, write: PendingWrite) {
        let PendingWrite { key, json, ttl } = write;
        let result = async {
            let mut conn = client.get_multiplexed_async_connection().await?;
            let _: () = conn.set_ex(&key, json, ttl).await?;
            Ok::<(), AppError>(())
        }
        .await;

        if let Err(e) = result {
            tracing::warn!(error = %e, key = %key, "Catalog cache write failed");
        }
    }

    pub async fn get<T: serde::de::DeserializeOwned>(&self, key: &CacheKey) -> AppResult<Option<T>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key.to_string()).await?;

        cached
            .map(|json| {
                serde_json::from_str(&json)
                    .map_err(|e| AppError::Internal(format!("Cache deserialization error: {}", e)))
            })
            .transpose()
    }

    /// Queues a write with the key's TTL and returns immediately
    pub fn put<T: serde::Serialize>(&self, key: &CacheKey, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, key = %key, "Cache serialization error");
                return;
            }
        };

        let write = PendingWrite {
            key: key.to_string(),
            json,
            ttl: key.ttl(),
        };

        if self.write_tx.send(write).is_err() {
            tracing::warn!(key = %key, "Catalog cache writer is gone, dropping write");
        }
    }
}
