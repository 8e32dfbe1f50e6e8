//! Domain model for the Loreforge publishing CMS.
//!
//! All records here are transient, derived copies of rows owned by the
//! hosted backend. The client never persists them; every mutation goes
//! through the backend and invalidates the cached copies.

mod model;
mod slug;

pub use model::{
    Chapter, ChapterPatch, EntityListParams, EntityRelation, EntityStoryRelation, MapMarker,
    Media, MediaPatch, NewChapter, NewEntityRelation, NewEntityStoryRelation, NewMedia, NewStory,
    NewWikiEntity, Profile, ProfilePatch, Story, StoryCategory, StoryListParams, StoryPatch,
    StoryStatus, WikiEntity, WikiEntityPatch, WikiEntityType, MAP_COORD_MAX, MAP_COORD_MIN,
};
pub use slug::slugify;
