//! Wiki facade: cached reads and write-through mutations.
//!
//! Wiki mutations also invalidate the map family: markers are a
//! projection of wiki entities, so an entity edit can change what the
//! map shows.

use crate::api::ApiClient;
use crate::cache::QueryClient;
use crate::error::DataResult;
use crate::keys::{map_keys, wiki_keys};
use crate::queries::wiki::{self, EntityPage, EntityWithRelations};
use loreforge_types::{
    EntityListParams, EntityRelation, EntityStoryRelation, NewEntityRelation,
    NewEntityStoryRelation, NewWikiEntity, WikiEntity, WikiEntityPatch, WikiEntityType,
};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct WikiStore {
    api: Arc<ApiClient>,
    cache: QueryClient,
}

impl WikiStore {
    pub fn new(api: Arc<ApiClient>, cache: QueryClient) -> Self {
        Self { api, cache }
    }

    // ── Cached reads ──

    pub async fn list(&self, params: EntityListParams) -> DataResult<EntityPage> {
        // The key encodes the limit the query will actually use, so an
        // unset limit and an explicit default-sized one share an entry.
        let key = wiki_keys::list(params.entity_type, params.search.as_deref()).push(format!(
            "page={}:{}",
            params.offset.unwrap_or(0),
            params.limit.unwrap_or(wiki::DEFAULT_PAGE)
        ));
        let api = self.api.clone();
        self.cache
            .fetch(key, self.api.config().stale_window(), move || {
                let api = api.clone();
                let params = params.clone();
                async move { wiki::get_wiki_entities(&api, params).await }
            })
            .await
    }

    pub async fn by_slug(&self, slug: &str) -> DataResult<WikiEntity> {
        let api = self.api.clone();
        let slug = slug.to_string();
        self.cache
            .fetch(
                wiki_keys::detail(&slug),
                self.api.config().stale_window(),
                move || {
                    let api = api.clone();
                    let slug = slug.clone();
                    async move { wiki::get_wiki_entity_by_slug(&api, &slug).await }
                },
            )
            .await
    }

    pub async fn by_id(&self, id: Uuid) -> DataResult<WikiEntity> {
        let api = self.api.clone();
        self.cache
            .fetch(
                wiki_keys::detail_by_id(id),
                self.api.config().stale_window(),
                move || {
                    let api = api.clone();
                    async move { wiki::get_wiki_entity_by_id(&api, id).await }
                },
            )
            .await
    }

    pub async fn with_relations(&self, slug: &str) -> DataResult<EntityWithRelations> {
        let api = self.api.clone();
        let slug = slug.to_string();
        self.cache
            .fetch(
                wiki_keys::with_relations(&slug),
                self.api.config().stale_window(),
                move || {
                    let api = api.clone();
                    let slug = slug.clone();
                    async move { wiki::get_wiki_entity_with_relations(&api, &slug).await }
                },
            )
            .await
    }

    pub async fn by_type(&self, entity_type: WikiEntityType, limit: u32) -> DataResult<Vec<WikiEntity>> {
        let api = self.api.clone();
        self.cache
            .fetch(
                wiki_keys::by_type(entity_type).push(format!("limit={limit}")),
                self.api.config().stale_window(),
                move || {
                    let api = api.clone();
                    async move { wiki::get_entities_by_type(&api, entity_type, limit).await }
                },
            )
            .await
    }

    /// Per-type entity counts. Counts drift slowly, so these use the
    /// longer staleness window.
    pub async fn counts(&self) -> DataResult<HashMap<WikiEntityType, u64>> {
        let api = self.api.clone();
        self.cache
            .fetch(
                wiki_keys::counts(),
                self.api.config().counts_stale_window(),
                move || {
                    let api = api.clone();
                    async move { wiki::get_entity_counts(&api).await }
                },
            )
            .await
    }

    // ── Mutations ──

    pub async fn create(&self, entity: NewWikiEntity) -> DataResult<WikiEntity> {
        let created = wiki::create_wiki_entity(&self.api, entity).await?;
        self.invalidate_collections().await;
        if created.x_coord.is_some() {
            self.cache.invalidate(&map_keys::all()).await;
        }
        Ok(created)
    }

    pub async fn update(&self, id: Uuid, slug: &str, patch: WikiEntityPatch) -> DataResult<WikiEntity> {
        let updated = wiki::update_wiki_entity(&self.api, id, patch).await?;
        self.cache.invalidate(&wiki_keys::detail(slug)).await;
        if updated.slug != slug {
            self.cache.invalidate(&wiki_keys::detail(&updated.slug)).await;
        }
        self.cache.invalidate(&wiki_keys::detail_by_id(id)).await;
        self.invalidate_collections().await;
        self.cache.invalidate(&map_keys::all()).await;
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid, slug: &str) -> DataResult<()> {
        wiki::delete_wiki_entity(&self.api, id).await?;
        self.cache.remove(&wiki_keys::detail(slug)).await;
        self.cache.remove(&wiki_keys::detail_by_id(id)).await;
        self.invalidate_collections().await;
        self.cache.invalidate(&map_keys::all()).await;
        Ok(())
    }

    /// Links two entities. Both endpoints' relation views refetch; the
    /// relation does not change either entity's own fields, so plain
    /// detail entries stay cached.
    pub async fn create_relation(
        &self,
        a_slug: &str,
        b_slug: &str,
        relation: NewEntityRelation,
    ) -> DataResult<EntityRelation> {
        let created = wiki::create_entity_relation(&self.api, relation).await?;
        self.cache
            .invalidate(&wiki_keys::with_relations(a_slug))
            .await;
        self.cache
            .invalidate(&wiki_keys::with_relations(b_slug))
            .await;
        Ok(created)
    }

    /// Links an entity to a story. Only that entity's relation view
    /// refetches.
    pub async fn create_story_relation(
        &self,
        entity_slug: &str,
        relation: NewEntityStoryRelation,
    ) -> DataResult<EntityStoryRelation> {
        let created = wiki::create_entity_story_relation(&self.api, relation).await?;
        self.cache
            .invalidate(&wiki_keys::with_relations(entity_slug))
            .await;
        Ok(created)
    }

    async fn invalidate_collections(&self) {
        self.cache.invalidate(&wiki_keys::lists()).await;
        self.cache
            .invalidate(&wiki_keys::all().push("by-type"))
            .await;
        self.cache.invalidate(&wiki_keys::counts()).await;
    }
}
