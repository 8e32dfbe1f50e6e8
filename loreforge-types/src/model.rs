//! Row types mirroring the backend schema.
//!
//! Enum labels serialize to the exact lowercase strings the backend
//! stores, so they can be used verbatim in query filters. Insert and
//! patch payloads skip `None` fields entirely; an absent field must
//! never appear in a request body, or the backend would null it out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Valid world-coordinate range for map placement.
pub const MAP_COORD_MIN: f64 = -256.0;
pub const MAP_COORD_MAX: f64 = 256.0;

/// Editorial category of a story.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryCategory {
    Dream,
    Idea,
    Thought,
    Tale,
    Chronicle,
    Other,
}

impl StoryCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dream => "dream",
            Self::Idea => "idea",
            Self::Thought => "thought",
            Self::Tale => "tale",
            Self::Chronicle => "chronicle",
            Self::Other => "other",
        }
    }
}

/// Publication status. Only `Published` stories are publicly visible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryStatus {
    Draft,
    Published,
    Archived,
}

impl StoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

/// Kind of encyclopedia record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WikiEntityType {
    Character,
    Location,
    Fact,
    Event,
    Item,
    Concept,
    Organization,
}

impl WikiEntityType {
    /// Every variant, in the backend's enum declaration order.
    pub const ALL: [Self; 7] = [
        Self::Character,
        Self::Location,
        Self::Fact,
        Self::Event,
        Self::Item,
        Self::Concept,
        Self::Organization,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Location => "location",
            Self::Fact => "fact",
            Self::Event => "event",
            Self::Item => "item",
            Self::Concept => "concept",
            Self::Organization => "organization",
        }
    }
}

/// A chaptered narrative.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Story {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub category: Option<StoryCategory>,
    #[serde(default)]
    pub status: Option<StoryStatus>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub featured: Option<bool>,
    #[serde(default)]
    pub view_count: Option<i64>,
    #[serde(default)]
    pub author_id: Option<Uuid>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// An ordered content unit within a story. Content may be empty.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Chapter {
    pub id: Uuid,
    pub story_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    pub chapter_order: i32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// An encyclopedia record, optionally placed on the world map.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WikiEntity {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub entity_type: WikiEntityType,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub full_description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub properties: Option<serde_json::Value>,
    #[serde(default)]
    pub x_coord: Option<f64>,
    #[serde(default)]
    pub y_coord: Option<f64>,
    #[serde(default)]
    pub z_coord: Option<f64>,
    #[serde(default)]
    pub map_layer: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Undirected-in-effect link between two wiki entities.
///
/// Stored directed; an entity's full relation set is assembled by
/// querying both columns and unioning the results.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityRelation {
    pub id: Uuid,
    pub entity_a_id: Uuid,
    pub entity_b_id: Uuid,
    pub relation_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Link between a wiki entity and a story (optionally a chapter).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityStoryRelation {
    pub id: Uuid,
    pub entity_id: Uuid,
    pub story_id: Uuid,
    #[serde(default)]
    pub chapter_id: Option<Uuid>,
    #[serde(default)]
    pub relation_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Uploaded file record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Media {
    pub id: Uuid,
    pub filename: String,
    pub storage_path: String,
    pub url: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub size_bytes: Option<i64>,
    #[serde(default)]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub story_id: Option<Uuid>,
    #[serde(default)]
    pub chapter_id: Option<Uuid>,
    #[serde(default)]
    pub entity_id: Option<Uuid>,
    #[serde(default)]
    pub uploaded_by: Option<Uuid>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Per-user record keyed to the authentication identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub is_admin: Option<bool>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A wiki entity projected onto the world map. Only entities with both
/// x and y coordinates set are ever projected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapMarker {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub entity_type: WikiEntityType,
    pub short_description: Option<String>,
    pub image_url: Option<String>,
    pub x: f64,
    pub y: f64,
    pub layer: Option<String>,
}

// ── List parameters ──

/// Filters for story lists. Absent fields do not constrain the query,
/// which is what lets the admin list see drafts alongside published
/// stories; the public list passes `status: Some(Published)`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StoryListParams {
    pub category: Option<StoryCategory>,
    pub status: Option<StoryStatus>,
    pub featured: Option<bool>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Filters for wiki entity lists. `search` is a case-insensitive
/// substring match on the name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntityListParams {
    pub entity_type: Option<WikiEntityType>,
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

// ── Insert payloads ──

#[derive(Clone, Debug, Serialize)]
pub struct NewStory {
    pub title: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<StoryCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StoryStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
}

#[derive(Clone, Debug, Serialize)]
pub struct NewChapter {
    pub story_id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub chapter_order: i32,
}

#[derive(Clone, Debug, Serialize)]
pub struct NewWikiEntity {
    pub name: String,
    pub slug: String,
    pub entity_type: WikiEntityType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_coord: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_coord: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_coord: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_layer: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct NewEntityRelation {
    pub entity_a_id: Uuid,
    pub entity_b_id: Uuid,
    pub relation_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct NewEntityStoryRelation {
    pub entity_id: Uuid,
    pub story_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation_type: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct NewMedia {
    pub filename: String,
    pub storage_path: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_by: Option<Uuid>,
}

// ── Patch payloads ──

#[derive(Clone, Debug, Default, Serialize)]
pub struct StoryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<StoryCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StoryStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ChapterPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter_order: Option<i32>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct WikiEntityPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<WikiEntityType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_coord: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_coord: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_coord: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_layer: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct MediaPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<Uuid>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}
