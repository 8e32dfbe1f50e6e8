//! Story facade: cached reads and write-through mutations.

use crate::api::ApiClient;
use crate::cache::QueryClient;
use crate::error::DataResult;
use crate::keys::story_keys;
use crate::queries::stories::{self, StoryPage, StoryWithChapters};
use loreforge_types::{
    Chapter, ChapterPatch, NewChapter, NewStory, Story, StoryListParams, StoryPatch,
};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct StoryStore {
    api: Arc<ApiClient>,
    cache: QueryClient,
}

impl StoryStore {
    pub fn new(api: Arc<ApiClient>, cache: QueryClient) -> Self {
        Self { api, cache }
    }

    // ── Cached reads ──

    pub async fn list(&self, params: StoryListParams) -> DataResult<StoryPage> {
        // The key encodes the limit the query will actually use, so an
        // unset limit and an explicit default-sized one share an entry.
        let key = story_keys::list(params.category, params.status)
            .push(format!("featured={}", opt_label(params.featured)))
            .push(format!(
                "page={}:{}",
                params.offset.unwrap_or(0),
                params.limit.unwrap_or(stories::DEFAULT_PAGE)
            ));
        let api = self.api.clone();
        self.cache
            .fetch(key, self.api.config().stale_window(), move || {
                let api = api.clone();
                let params = params.clone();
                async move { stories::get_stories(&api, params).await }
            })
            .await
    }

    pub async fn by_slug(&self, slug: &str) -> DataResult<Story> {
        let api = self.api.clone();
        let slug = slug.to_string();
        self.cache
            .fetch(
                story_keys::detail(&slug),
                self.api.config().stale_window(),
                move || {
                    let api = api.clone();
                    let slug = slug.clone();
                    async move { stories::get_story_by_slug(&api, &slug).await }
                },
            )
            .await
    }

    pub async fn with_chapters(&self, slug: &str) -> DataResult<StoryWithChapters> {
        let api = self.api.clone();
        let slug = slug.to_string();
        self.cache
            .fetch(
                story_keys::with_chapters(&slug),
                self.api.config().stale_window(),
                move || {
                    let api = api.clone();
                    let slug = slug.clone();
                    async move { stories::get_story_with_chapters(&api, &slug).await }
                },
            )
            .await
    }

    pub async fn featured(&self, limit: u32) -> DataResult<Vec<Story>> {
        let api = self.api.clone();
        self.cache
            .fetch(
                story_keys::featured().push(format!("limit={limit}")),
                self.api.config().stale_window(),
                move || {
                    let api = api.clone();
                    async move { stories::get_featured_stories(&api, limit).await }
                },
            )
            .await
    }

    pub async fn recent(&self, limit: u32) -> DataResult<Vec<Story>> {
        let api = self.api.clone();
        self.cache
            .fetch(
                story_keys::recent().push(format!("limit={limit}")),
                self.api.config().stale_window(),
                move || {
                    let api = api.clone();
                    async move { stories::get_recent_stories(&api, limit).await }
                },
            )
            .await
    }

    // ── Mutations ──

    /// Creates a story. Lists and home-page rails refetch; existing
    /// detail entries are untouched, since a new story cannot change
    /// another story's detail.
    pub async fn create(&self, story: NewStory) -> DataResult<Story> {
        let created = stories::create_story(&self.api, story).await?;
        self.invalidate_collections().await;
        Ok(created)
    }

    /// Updates a story. Its own detail subtree and every collection view
    /// refetch; other stories' details are untouched.
    pub async fn update(&self, id: Uuid, slug: &str, patch: StoryPatch) -> DataResult<Story> {
        let updated = stories::update_story(&self.api, id, patch).await?;
        self.cache.invalidate(&story_keys::detail(slug)).await;
        if updated.slug != slug {
            // Renamed: the new slug may already be cached as a NotFound
            // miss from an earlier navigation.
            self.cache.invalidate(&story_keys::detail(&updated.slug)).await;
        }
        self.invalidate_collections().await;
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid, slug: &str) -> DataResult<()> {
        stories::delete_story(&self.api, id).await?;
        self.cache.remove(&story_keys::detail(slug)).await;
        self.invalidate_collections().await;
        Ok(())
    }

    /// Adds a chapter. The parent story's detail subtree refetches, as
    /// do the lists, whose chapter counts it changed.
    pub async fn create_chapter(
        &self,
        story_slug: &str,
        chapter: NewChapter,
    ) -> DataResult<Chapter> {
        let created = stories::create_chapter(&self.api, chapter).await?;
        self.invalidate_chapter_views(story_slug).await;
        Ok(created)
    }

    pub async fn update_chapter(
        &self,
        story_slug: &str,
        id: Uuid,
        patch: ChapterPatch,
    ) -> DataResult<Chapter> {
        let updated = stories::update_chapter(&self.api, id, patch).await?;
        self.invalidate_chapter_views(story_slug).await;
        Ok(updated)
    }

    pub async fn delete_chapter(&self, story_slug: &str, id: Uuid) -> DataResult<()> {
        stories::delete_chapter(&self.api, id).await?;
        self.invalidate_chapter_views(story_slug).await;
        Ok(())
    }

    async fn invalidate_chapter_views(&self, story_slug: &str) {
        self.cache.invalidate(&story_keys::detail(story_slug)).await;
        self.cache.invalidate(&story_keys::lists()).await;
    }

    async fn invalidate_collections(&self) {
        self.cache.invalidate(&story_keys::lists()).await;
        self.cache.invalidate(&story_keys::featured()).await;
        self.cache.invalidate(&story_keys::recent()).await;
    }
}

fn opt_label(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "true",
        Some(false) => "false",
        None => "",
    }
}
