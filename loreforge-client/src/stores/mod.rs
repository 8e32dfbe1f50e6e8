//! Domain store facades.
//!
//! Each store pairs the data-access functions with the query cache:
//! reads resolve through [`QueryClient`](crate::cache::QueryClient)
//! under a registry key, mutations write through and then invalidate
//! exactly the key prefixes whose cached data the write made wrong.
//! Stores are cheap to clone and share one cache.

mod map;
mod media;
mod story;
mod wiki;

pub use map::MapStore;
pub use media::MediaStore;
pub use story::StoryStore;
pub use wiki::WikiStore;

use crate::api::ApiClient;
use crate::auth::AuthClient;
use crate::cache::QueryClient;
use crate::config::BackendConfig;
use crate::error::DataResult;
use crate::session::SessionStore;
use crate::storage::StorageClient;
use std::sync::Arc;

/// Composition root: wires the clients, cache, session store, and the
/// per-domain facades from one config.
#[derive(Clone)]
pub struct Stores {
    pub stories: StoryStore,
    pub wiki: WikiStore,
    pub map: MapStore,
    pub media: MediaStore,
    pub session: SessionStore,
    cache: QueryClient,
    _gc_sweep: Arc<SweepGuard>,
}

/// Aborts the cache sweep task when the last `Stores` clone drops, so
/// the sweep cannot outlive the cache it services.
struct SweepGuard(tokio::task::JoinHandle<()>);

impl Drop for SweepGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl Stores {
    /// Wires everything together and starts the cache gc sweep. Must be
    /// called from within a tokio runtime.
    pub fn new(config: BackendConfig) -> DataResult<Self> {
        let auth = Arc::new(AuthClient::new(config.clone())?);
        let api = Arc::new(ApiClient::new_browser(config.clone(), auth.clone())?);
        let storage = Arc::new(StorageClient::new(config.clone(), auth.clone())?);
        let cache = QueryClient::new(config.retry_attempts, config.gc_window());
        let gc_sweep = Arc::new(SweepGuard(cache.spawn_gc_loop()));

        Ok(Self {
            stories: StoryStore::new(api.clone(), cache.clone()),
            wiki: WikiStore::new(api.clone(), cache.clone()),
            map: MapStore::new(api.clone(), cache.clone()),
            media: MediaStore::new(api.clone(), storage, cache.clone()),
            session: SessionStore::new(api, auth),
            cache,
            _gc_sweep: gc_sweep,
        })
    }

    /// The shared query cache behind every store.
    pub fn cache(&self) -> &QueryClient {
        &self.cache
    }
}
