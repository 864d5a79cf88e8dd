use super::{cache::TileCache, source::TileSource};
use crate::core::geo::TileCoord;
use crate::prelude::FxHashSet;
use crate::runtime::{self, AsyncSpawner};
use once_cell::sync::Lazy;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const MAX_ATTEMPTS: usize = 2;
const RETRY_DELAY: Duration = Duration::from_millis(100);

/// Shared client with an identifying User-Agent; public tile servers reject
/// anonymous requests.
static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .user_agent(concat!("crowdflow/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(15))
        .build()
        .unwrap_or_else(|e| {
            log::warn!("Falling back to a default tile client: {e}");
            reqwest::Client::new()
        })
});

/// A finished download; `bytes` is `None` when every attempt failed
#[derive(Debug, Clone)]
pub struct LoadedTile {
    pub coord: TileCoord,
    pub bytes: Option<Arc<Vec<u8>>>,
}

#[derive(Default)]
struct Requests {
    pending: FxHashSet<TileCoord>,
    failed: FxHashSet<TileCoord>,
}

/// Downloads tiles on the async runtime and reports them over a channel
///
/// Successful downloads also land in the [`TileCache`]. A tile that failed
/// every attempt is not requested again until [`TileLoader::forget_failures`].
pub struct TileLoader {
    source: Arc<dyn TileSource>,
    spawner: Arc<dyn AsyncSpawner>,
    cache: TileCache,
    requests: Arc<Mutex<Requests>>,
    tx: Sender<LoadedTile>,
    rx: Receiver<LoadedTile>,
}

impl TileLoader {
    pub fn new(source: Arc<dyn TileSource>, spawner: Arc<dyn AsyncSpawner>, cache: TileCache) -> Self {
        let (tx, rx) = channel();
        Self {
            source,
            spawner,
            cache,
            requests: Arc::new(Mutex::new(Requests::default())),
            tx,
            rx,
        }
    }

    pub fn source(&self) -> &dyn TileSource {
        self.source.as_ref()
    }

    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    pub fn pending(&self) -> usize {
        self.requests.lock().map(|r| r.pending.len()).unwrap_or(0)
    }

    /// Starts a download unless the tile is cached, in flight or known bad
    ///
    /// Returns whether a download was started.
    pub fn request(&self, coord: TileCoord) -> bool {
        if !coord.is_valid() || self.cache.contains(&coord) {
            return false;
        }
        {
            let mut requests = self.requests.lock().unwrap_or_else(|e| e.into_inner());
            if requests.failed.contains(&coord) || !requests.pending.insert(coord) {
                return false;
            }
        }

        let url = self.source.url(coord);
        let cache = self.cache.clone();
        let requests = self.requests.clone();
        let tx = self.tx.clone();

        runtime::spawn(self.spawner.as_ref(), async move {
            let bytes = download(&url, coord).await.map(Arc::new);

            {
                let mut requests = requests.lock().unwrap_or_else(|e| e.into_inner());
                requests.pending.remove(&coord);
                if bytes.is_none() {
                    requests.failed.insert(coord);
                }
            }
            if let Some(bytes) = &bytes {
                cache.insert(coord, bytes.clone());
            }
            // the receiver is gone when the UI shut down
            let _ = tx.send(LoadedTile { coord, bytes });
        });
        true
    }

    /// Downloads finished since the last call
    pub fn drain(&self) -> Vec<LoadedTile> {
        self.rx.try_iter().collect()
    }

    pub fn forget_failures(&self) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.failed.clear();
        }
    }
}

async fn download(url: &str, coord: TileCoord) -> Option<Vec<u8>> {
    for attempt in 1..=MAX_ATTEMPTS {
        log::debug!("fetch tile {:?} attempt {}", coord, attempt);
        match fetch(url).await {
            Ok(data) => {
                log::trace!("downloaded tile {:?} ({} bytes)", coord, data.len());
                return Some(data);
            }
            Err(e) => {
                log::warn!("tile {:?} download failed on attempt {}: {}", coord, attempt, e);
                if attempt < MAX_ATTEMPTS {
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }
    }
    None
}

async fn fetch(url: &str) -> Result<Vec<u8>, String> {
    let response = HTTP_CLIENT.get(url).send().await.map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("HTTP {}", response.status()));
    }
    let bytes = response.bytes().await.map_err(|e| e.to_string())?;
    Ok(bytes.to_vec())
}
