//! In-memory stores owned by the application state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tracing::debug;

/// String-keyed record store guarded by an async read/write lock.
#[derive(Debug)]
pub struct ItemStore<V> {
    items: RwLock<HashMap<String, V>>,
}

impl<V: Clone> ItemStore<V> {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
        }
    }

    pub fn seeded<K: Into<String>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            items: RwLock::new(entries.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        self.items.read().await.get(key).cloned()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.items.read().await.contains_key(key)
    }

    /// Inserts or replaces, returning the previous value.
    pub async fn put(&self, key: impl Into<String>, value: V) -> Option<V> {
        self.items.write().await.insert(key.into(), value)
    }

    /// Read-modify-write under a single write lock. Returns `None` when the
    /// key is absent.
    pub async fn update<R>(&self, key: &str, f: impl FnOnce(&mut V) -> R) -> Option<R> {
        let mut items = self.items.write().await;
        items.get_mut(key).map(f)
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

/// Hands out sessions and counts how many are open or were closed.
#[derive(Debug, Default)]
pub struct SessionTracker {
    next_id: AtomicU64,
    opened: AtomicU64,
    closed: AtomicU64,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn open(&self) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.opened.fetch_add(1, Ordering::AcqRel);
        debug!(session_id = id, "Session opened");
        id
    }

    pub(crate) fn close(&self, id: u64) {
        self.closed.fetch_add(1, Ordering::AcqRel);
        debug!(session_id = id, "Session closed");
    }

    pub fn open_sessions(&self) -> u64 {
        self.opened
            .load(Ordering::Acquire)
            .saturating_sub(self.closed.load(Ordering::Acquire))
    }

    pub fn closed_sessions(&self) -> u64 {
        self.closed.load(Ordering::Acquire)
    }
}
