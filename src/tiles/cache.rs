use crate::core::geo::TileCoord;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

const DEFAULT_CAPACITY: usize = 512;

/// Encoded tile bytes, shared between the loader and the UI
///
/// Cloning is cheap; clones share one LRU.
#[derive(Debug, Clone)]
pub struct TileCache {
    tiles: Arc<Mutex<LruCache<TileCoord, Arc<Vec<u8>>>>>,
}

impl TileCache {
    /// Zero capacity falls back to the default
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .or_else(|| NonZeroUsize::new(DEFAULT_CAPACITY))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            tiles: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<TileCoord, Arc<Vec<u8>>>> {
        self.tiles.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Marks the tile as recently used
    pub fn get(&self, coord: &TileCoord) -> Option<Arc<Vec<u8>>> {
        self.lock().get(coord).cloned()
    }

    pub fn insert(&self, coord: TileCoord, bytes: Arc<Vec<u8>>) {
        self.lock().put(coord, bytes);
    }

    pub fn contains(&self, coord: &TileCoord) -> bool {
        self.lock().contains(coord)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }
}

impl Default for TileCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
