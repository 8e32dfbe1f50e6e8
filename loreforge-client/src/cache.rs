//! Stale-while-revalidate query cache.
//!
//! Cached values are partitioned by [`QueryKey`], so concurrent reads
//! and writes of different entities never contend. Each entry moves
//! through idle → fetching → success | error; a successful value becomes
//! stale after its staleness window and is then served immediately while
//! a background refetch runs. Concurrent identical requests are
//! deduplicated through a per-entry fetch lock with a generation
//! double-check, the same scheme the auth client uses for token refresh.

use crate::error::{DataError, DataResult};
use crate::keys::QueryKey;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

/// Lifecycle state of a cached query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryState {
    Idle,
    Fetching,
    Success,
    Error,
}

struct Entry {
    state: QueryState,
    value: Option<Value>,
    /// `None` after invalidation: the value may still exist but must not
    /// be served until refetched.
    fetched_at: Option<Instant>,
    last_access: Instant,
    /// Bumped on every successful fetch; lets a waiter detect that a
    /// concurrent fetch already completed.
    generation: u64,
    fetch_lock: Arc<Mutex<()>>,
}

impl Entry {
    fn new() -> Self {
        Self {
            state: QueryState::Idle,
            value: None,
            fetched_at: None,
            last_access: Instant::now(),
            generation: 0,
            fetch_lock: Arc::new(Mutex::new(())),
        }
    }
}

struct Inner {
    entries: RwLock<HashMap<QueryKey, Entry>>,
    retry_attempts: u32,
    gc_window: Duration,
}

/// Shared, key-partitioned async query cache.
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<Inner>,
}

enum Plan {
    Fresh(Value),
    Stale(Value),
    Fetch,
}

impl QueryClient {
    pub fn new(retry_attempts: u32, gc_window: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: RwLock::new(HashMap::new()),
                retry_attempts,
                gc_window,
            }),
        }
    }

    /// Resolves `key` through the cache.
    ///
    /// Fresh values are served directly. Stale values are served
    /// immediately while a background refetch runs. Missing or
    /// invalidated entries fetch inline. On error the fetch is retried
    /// up to the configured attempts — except cancellations, which are
    /// never retried and never recorded as an error state.
    pub async fn fetch<T, F, Fut>(
        &self,
        key: QueryKey,
        ttl: Duration,
        fetcher: F,
    ) -> DataResult<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DataResult<T>> + Send,
    {
        let (lock, pre_gen, plan) = {
            let mut entries = self.inner.entries.write().await;
            let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
            entry.last_access = Instant::now();
            let plan = match (&entry.value, entry.fetched_at) {
                (Some(v), Some(at)) if at.elapsed() < ttl => Plan::Fresh(v.clone()),
                (Some(v), Some(_)) => Plan::Stale(v.clone()),
                _ => Plan::Fetch,
            };
            (entry.fetch_lock.clone(), entry.generation, plan)
        };

        match plan {
            Plan::Fresh(value) => decode(value),
            Plan::Stale(value) => {
                // Serve the cached value now; refresh in the background.
                let client = self.clone();
                let bg_key = key.clone();
                tokio::spawn(async move {
                    if let Err(e) = client.run_fetch(&bg_key, lock, pre_gen, &fetcher).await {
                        if !e.is_cancellation() {
                            warn!("background refetch of {bg_key} failed: {e}");
                        }
                    }
                });
                decode(value)
            }
            Plan::Fetch => {
                let value = self.run_fetch(&key, lock, pre_gen, &fetcher).await?;
                decode(value)
            }
        }
    }

    /// Performs the deduplicated fetch-and-store for one key.
    async fn run_fetch<T, F, Fut>(
        &self,
        key: &QueryKey,
        lock: Arc<Mutex<()>>,
        pre_gen: u64,
        fetcher: &F,
    ) -> DataResult<Value>
    where
        T: Serialize,
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = DataResult<T>> + Send,
    {
        let _guard = lock.lock().await;

        // Double-check: a concurrent caller may have fetched while we
        // waited for the lock.
        {
            let entries = self.inner.entries.read().await;
            if let Some(entry) = entries.get(key) {
                if entry.generation > pre_gen {
                    if let (Some(value), Some(_)) = (&entry.value, entry.fetched_at) {
                        return Ok(value.clone());
                    }
                }
            }
        }

        self.set_state(key, QueryState::Fetching).await;

        let mut attempt: u32 = 0;
        loop {
            match fetcher().await {
                Ok(data) => {
                    let value = serde_json::to_value(data)?;
                    let mut entries = self.inner.entries.write().await;
                    let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
                    entry.value = Some(value.clone());
                    entry.state = QueryState::Success;
                    entry.fetched_at = Some(Instant::now());
                    entry.generation += 1;
                    return Ok(value);
                }
                Err(e) if e.is_cancellation() => {
                    // Intentional navigation-away: leave the entry as it
                    // was, with any previous value intact.
                    let mut entries = self.inner.entries.write().await;
                    if let Some(entry) = entries.get_mut(key) {
                        entry.state = if entry.value.is_some() {
                            QueryState::Success
                        } else {
                            QueryState::Idle
                        };
                    }
                    return Err(e);
                }
                Err(e) => {
                    if attempt < self.inner.retry_attempts {
                        attempt += 1;
                        debug!("fetch of {key} failed (attempt {attempt}): {e}");
                        continue;
                    }
                    let mut entries = self.inner.entries.write().await;
                    if let Some(entry) = entries.get_mut(key) {
                        // The stale value is kept; only freshness is gone.
                        entry.state = QueryState::Error;
                    }
                    return Err(e);
                }
            }
        }
    }

    async fn set_state(&self, key: &QueryKey, state: QueryState) {
        let mut entries = self.inner.entries.write().await;
        if let Some(entry) = entries.get_mut(key) {
            entry.state = state;
        }
    }

    /// Marks every entry under `prefix` so its next read refetches.
    pub async fn invalidate(&self, prefix: &QueryKey) {
        let mut entries = self.inner.entries.write().await;
        let mut hits = 0usize;
        for (key, entry) in entries.iter_mut() {
            if key.starts_with(prefix) {
                entry.fetched_at = None;
                hits += 1;
            }
        }
        debug!("invalidated {hits} entries under {prefix}");
    }

    /// Evicts every entry under `prefix` outright.
    pub async fn remove(&self, prefix: &QueryKey) {
        let mut entries = self.inner.entries.write().await;
        entries.retain(|key, _| !key.starts_with(prefix));
    }

    /// Current state of a key, if cached.
    pub async fn state(&self, key: &QueryKey) -> Option<QueryState> {
        self.inner.entries.read().await.get(key).map(|e| e.state)
    }

    /// Number of cached entries.
    pub async fn len(&self) -> usize {
        self.inner.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.entries.read().await.is_empty()
    }

    /// Evicts entries that no consumer has read within the gc window.
    pub async fn gc(&self) {
        let window = self.inner.gc_window;
        let mut entries = self.inner.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.last_access.elapsed() < window);
        let evicted = before - entries.len();
        if evicted > 0 {
            debug!("gc evicted {evicted} unused cache entries");
        }
    }

    /// Spawns a background task sweeping unused entries once a minute.
    pub fn spawn_gc_loop(&self) -> tokio::task::JoinHandle<()> {
        let client = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            interval.tick().await;
            loop {
                interval.tick().await;
                client.gc().await;
            }
        })
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> DataResult<T> {
    serde_json::from_value(value).map_err(DataError::from)
}
