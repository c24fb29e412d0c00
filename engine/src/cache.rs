//! Bounded LRU cache of live database connections.
//!
//! One shared handle per database file, keyed by canonical path. Acquiring a
//! cached handle re-verifies liveness with a ping and rebuilds the connection
//! if the ping fails. When the cache is full the least recently used handle
//! is evicted and closed. All bookkeeping happens under one async mutex, so
//! two tasks acquiring the same file never race to open duplicate handles.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use common::errors::{AppError, AppResult};
use tokio::sync::Mutex;

use crate::backend::{Backend, TableBackend};

/// Most live connections held at once.
pub const MAX_CACHE_SIZE: usize = 10;

struct CacheInner {
    entries: HashMap<PathBuf, Arc<Backend>>,
    /// Keys ordered most recently used first.
    recency: VecDeque<PathBuf>,
}

impl CacheInner {
    fn touch(&mut self, key: &Path) {
        if let Some(pos) = self.recency.iter().position(|k| k == key) {
            let key = self
                .recency
                .remove(pos)
                .unwrap_or_else(|| key.to_path_buf());
            self.recency.push_front(key);
        }
    }

    fn remove(&mut self, key: &Path) -> Option<Arc<Backend>> {
        if let Some(pos) = self.recency.iter().position(|k| k == key) {
            self.recency.remove(pos);
        }
        self.entries.remove(key)
    }
}

/// Thread-safe connection cache shared across request handlers.
pub struct ConnectionCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
    connect_timeout: Duration,
}

impl ConnectionCache {
    pub fn new(connect_timeout: Duration) -> Self {
        Self::with_capacity(MAX_CACHE_SIZE, connect_timeout)
    }

    pub fn with_capacity(capacity: usize, connect_timeout: Duration) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::with_capacity(capacity),
                recency: VecDeque::with_capacity(capacity),
            }),
            capacity,
            connect_timeout,
        }
    }

    /// Returns a live handle for the file, reusing a cached one when its
    /// ping succeeds and connecting fresh otherwise.
    pub async fn acquire(&self, path: &Path) -> AppResult<Arc<Backend>> {
        if !path.is_file() {
            return Err(AppError::DatabaseNotFound(path.display().to_string()));
        }
        let key = path
            .canonicalize()
            .map_err(|e| AppError::DatabaseNotFound(format!("{}: {e}", path.display())))?;

        let mut inner = self.inner.lock().await;

        if let Some(existing) = inner.entries.get(&key).cloned() {
            if existing.ping().await.is_ok() {
                inner.touch(&key);
                return Ok(existing);
            }
            tracing::warn!(path = %key.display(), "cached connection went stale, reconnecting");
            inner.remove(&key);
            existing.close().await;
        }

        let backend = Backend::connect(&key, self.connect_timeout).await?;
        backend.ping().await?;
        let backend = Arc::new(backend);

        while inner.entries.len() >= self.capacity {
            let Some(oldest) = inner.recency.pop_back() else {
                break;
            };
            if let Some(evicted) = inner.entries.remove(&oldest) {
                tracing::info!(path = %oldest.display(), "evicting least recently used connection");
                evicted.close().await;
            }
        }

        inner.entries.insert(key.clone(), Arc::clone(&backend));
        inner.recency.push_front(key);
        Ok(backend)
    }

    /// Drops and closes the cached handle for a file, if any. Used before
    /// deleting the file itself. Idempotent.
    pub async fn release_by_path(&self, path: &Path) {
        let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let removed = {
            let mut inner = self.inner.lock().await;
            inner.remove(&key)
        };
        if let Some(backend) = removed {
            backend.close().await;
        }
    }

    /// Closes every cached connection.
    pub async fn close_all(&self) {
        let drained: Vec<Arc<Backend>> = {
            let mut inner = self.inner.lock().await;
            inner.recency.clear();
            inner.entries.drain().map(|(_, v)| v).collect()
        };
        for backend in drained {
            backend.close().await;
        }
    }

    /// Number of connections currently held.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
