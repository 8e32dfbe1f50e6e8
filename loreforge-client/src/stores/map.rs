//! Map facade: cached reads and marker placement.

use crate::api::ApiClient;
use crate::cache::QueryClient;
use crate::error::DataResult;
use crate::keys::{map_keys, wiki_keys};
use crate::queries::map::{self, MapEntityDetails, MapSearchHit, MarkerFilter};
use loreforge_types::{MapMarker, WikiEntity};
use std::sync::Arc;
use uuid::Uuid;

const SEARCH_LIMIT: u32 = 10;

#[derive(Clone)]
pub struct MapStore {
    api: Arc<ApiClient>,
    cache: QueryClient,
}

impl MapStore {
    pub fn new(api: Arc<ApiClient>, cache: QueryClient) -> Self {
        Self { api, cache }
    }

    // ── Cached reads ──

    pub async fn markers(&self, filter: MarkerFilter) -> DataResult<Vec<MapMarker>> {
        let key = map_keys::markers_filtered(filter.layer.as_deref(), &filter.entity_types);
        let api = self.api.clone();
        self.cache
            .fetch(key, self.api.config().stale_window(), move || {
                let api = api.clone();
                let filter = filter.clone();
                async move { map::get_map_markers(&api, &filter).await }
            })
            .await
    }

    pub async fn entity_details(&self, id: Uuid) -> DataResult<MapEntityDetails> {
        let api = self.api.clone();
        self.cache
            .fetch(
                map_keys::entity_details(id),
                self.api.config().stale_window(),
                move || {
                    let api = api.clone();
                    async move { map::get_map_entity_details(&api, id).await }
                },
            )
            .await
    }

    /// Layer names get the longer staleness window: the layer set only
    /// changes when an admin edits placements.
    pub async fn layers(&self) -> DataResult<Vec<String>> {
        let api = self.api.clone();
        self.cache
            .fetch(
                map_keys::layers(),
                self.api.config().counts_stale_window(),
                move || {
                    let api = api.clone();
                    async move { map::get_map_layers(&api).await }
                },
            )
            .await
    }

    pub async fn search(&self, query: &str) -> DataResult<Vec<MapSearchHit>> {
        let api = self.api.clone();
        let query = query.to_string();
        self.cache
            .fetch(
                map_keys::search(&query),
                self.api.config().stale_window(),
                move || {
                    let api = api.clone();
                    let query = query.clone();
                    async move { map::search_entities_for_map(&api, &query, SEARCH_LIMIT).await }
                },
            )
            .await
    }

    // ── Mutations ──

    /// Places or moves an entity. The whole map family refetches (the
    /// marker may have entered or left any filtered view), as does the
    /// entity's wiki detail, which carries the coordinates.
    pub async fn place_entity(
        &self,
        id: Uuid,
        x: f64,
        y: f64,
        layer: Option<&str>,
    ) -> DataResult<WikiEntity> {
        let updated = map::update_entity_map_position(&self.api, id, x, y, layer).await?;
        self.invalidate_after_placement(&updated).await;
        Ok(updated)
    }

    /// Takes an entity off the map without deleting it.
    pub async fn remove_entity(&self, id: Uuid) -> DataResult<WikiEntity> {
        let updated = map::clear_entity_map_position(&self.api, id).await?;
        self.invalidate_after_placement(&updated).await;
        Ok(updated)
    }

    async fn invalidate_after_placement(&self, entity: &WikiEntity) {
        self.cache.invalidate(&map_keys::all()).await;
        self.cache.invalidate(&wiki_keys::detail(&entity.slug)).await;
        self.cache
            .invalidate(&wiki_keys::detail_by_id(entity.id))
            .await;
    }
}
