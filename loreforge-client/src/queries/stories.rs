//! Story and chapter operations.

use crate::api::{ApiClient, TableQuery};
use crate::error::{DataError, DataResult};
use loreforge_types::{
    Chapter, ChapterPatch, NewChapter, NewStory, Story, StoryListParams, StoryPatch,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Page size used when the caller does not set a limit.
pub const DEFAULT_PAGE: u32 = 20;

/// A page of stories with the exact total match count.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoryPage {
    pub stories: Vec<Story>,
    pub count: Option<u64>,
}

/// A story together with its ordered chapters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoryWithChapters {
    #[serde(flatten)]
    pub story: Story,
    pub chapters: Vec<Chapter>,
}

/// Lists stories, newest first.
///
/// Absent filters do not constrain the query: the admin list omits
/// `status` to see drafts and published stories together, while the
/// public site passes `status: Some(Published)`.
pub async fn get_stories(api: &ApiClient, params: StoryListParams) -> DataResult<StoryPage> {
    let limit = params.limit.unwrap_or(DEFAULT_PAGE);
    let offset = params.offset.unwrap_or(0);

    let mut query = TableQuery::new()
        .select("*")
        .order("created_at", false)
        .limit(limit)
        .offset(offset);

    if let Some(status) = params.status {
        query = query.eq("status", status.as_str());
    }
    if let Some(category) = params.category {
        query = query.eq("category", category.as_str());
    }
    if let Some(featured) = params.featured {
        query = query.eq("featured", featured);
    }

    let (stories, count) = api.get_rows_counted("stories", query).await?;
    Ok(StoryPage { stories, count })
}

pub async fn get_story_by_slug(api: &ApiClient, slug: &str) -> DataResult<Story> {
    api.get_row("stories", TableQuery::new().select("*").eq("slug", slug))
        .await
}

/// Fetches a story, then its chapters ordered by `chapter_order`.
pub async fn get_story_with_chapters(api: &ApiClient, slug: &str) -> DataResult<StoryWithChapters> {
    let story: Story = get_story_by_slug(api, slug).await?;

    let chapters = api
        .get_rows(
            "chapters",
            TableQuery::new()
                .select("*")
                .eq("story_id", story.id)
                .order("chapter_order", true),
        )
        .await?;

    Ok(StoryWithChapters { story, chapters })
}

pub async fn get_chapter(
    api: &ApiClient,
    story_id: Uuid,
    chapter_order: i32,
) -> DataResult<Chapter> {
    api.get_row(
        "chapters",
        TableQuery::new()
            .select("*")
            .eq("story_id", story_id)
            .eq("chapter_order", chapter_order),
    )
    .await
}

/// Published stories flagged as featured, newest first.
pub async fn get_featured_stories(api: &ApiClient, limit: u32) -> DataResult<Vec<Story>> {
    api.get_rows(
        "stories",
        TableQuery::new()
            .select("*")
            .eq("status", "published")
            .eq("featured", true)
            .order("created_at", false)
            .limit(limit),
    )
    .await
}

/// Most recently published stories.
pub async fn get_recent_stories(api: &ApiClient, limit: u32) -> DataResult<Vec<Story>> {
    api.get_rows(
        "stories",
        TableQuery::new()
            .select("*")
            .eq("status", "published")
            .order("created_at", false)
            .limit(limit),
    )
    .await
}

// ── Admin operations ──

/// Creates a story, stamping the signed-in user as its author.
pub async fn create_story(api: &ApiClient, story: NewStory) -> DataResult<Story> {
    let user = match api.auth() {
        Some(auth) => auth.current_user().await,
        None => None,
    };
    let user = user.ok_or(DataError::Unauthenticated)?;

    let mut body = serde_json::to_value(&story)?;
    body["author_id"] = serde_json::to_value(user.id)?;

    api.insert_row("stories", &body).await
}

pub async fn update_story(api: &ApiClient, id: Uuid, patch: StoryPatch) -> DataResult<Story> {
    api.update_row("stories", TableQuery::new().eq("id", id), &patch)
        .await
}

pub async fn delete_story(api: &ApiClient, id: Uuid) -> DataResult<()> {
    api.delete_rows("stories", TableQuery::new().eq("id", id))
        .await
}

pub async fn create_chapter(api: &ApiClient, chapter: NewChapter) -> DataResult<Chapter> {
    api.insert_row("chapters", &chapter).await
}

pub async fn update_chapter(api: &ApiClient, id: Uuid, patch: ChapterPatch) -> DataResult<Chapter> {
    api.update_row("chapters", TableQuery::new().eq("id", id), &patch)
        .await
}

pub async fn delete_chapter(api: &ApiClient, id: Uuid) -> DataResult<()> {
    api.delete_rows("chapters", TableQuery::new().eq("id", id))
        .await
}
