//! Hierarchical cache keys.
//!
//! Keys are ordered segment sequences; invalidating a prefix cascades to
//! every more-specific key built from it. Filter segments always appear,
//! with an empty value when the filter is absent, so "no filter" and
//! "filter = x" never collide. Pure data construction; no I/O.

use loreforge_types::{StoryCategory, StoryStatus, WikiEntityType};
use uuid::Uuid;

/// A structured cache identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Appends a segment, producing a more specific key.
    pub fn push(mut self, segment: impl Into<String>) -> Self {
        self.0.push(segment.into());
        self
    }

    /// True when `prefix` is a leading subsequence of this key. Every key
    /// is a prefix of itself.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

/// Keys for the story family.
pub mod story_keys {
    use super::*;

    pub fn all() -> QueryKey {
        QueryKey::new(["stories"])
    }

    pub fn lists() -> QueryKey {
        all().push("list")
    }

    pub fn list(category: Option<StoryCategory>, status: Option<StoryStatus>) -> QueryKey {
        lists()
            .push(format!(
                "category={}",
                category.map(|c| c.as_str()).unwrap_or("")
            ))
            .push(format!("status={}", status.map(|s| s.as_str()).unwrap_or("")))
    }

    pub fn featured() -> QueryKey {
        all().push("featured")
    }

    pub fn recent() -> QueryKey {
        all().push("recent")
    }

    pub fn details() -> QueryKey {
        all().push("detail")
    }

    pub fn detail(slug: &str) -> QueryKey {
        details().push(slug)
    }

    pub fn with_chapters(slug: &str) -> QueryKey {
        detail(slug).push("chapters")
    }
}

/// Keys for the wiki entity family.
pub mod wiki_keys {
    use super::*;

    pub fn all() -> QueryKey {
        QueryKey::new(["wiki"])
    }

    pub fn lists() -> QueryKey {
        all().push("list")
    }

    pub fn list(entity_type: Option<WikiEntityType>, search: Option<&str>) -> QueryKey {
        lists()
            .push(format!(
                "type={}",
                entity_type.map(|t| t.as_str()).unwrap_or("")
            ))
            .push(format!("search={}", search.unwrap_or("")))
    }

    pub fn details() -> QueryKey {
        all().push("detail")
    }

    pub fn detail(slug: &str) -> QueryKey {
        details().push(slug)
    }

    /// By-id details live outside the slug namespace so a slug can never
    /// shadow them.
    pub fn detail_by_id(id: Uuid) -> QueryKey {
        all().push("by-id").push(id.to_string())
    }

    pub fn with_relations(slug: &str) -> QueryKey {
        detail(slug).push("relations")
    }

    pub fn by_type(entity_type: WikiEntityType) -> QueryKey {
        all().push("by-type").push(entity_type.as_str())
    }

    pub fn counts() -> QueryKey {
        all().push("counts")
    }
}

/// Keys for the map family.
pub mod map_keys {
    use super::*;

    pub fn all() -> QueryKey {
        QueryKey::new(["map"])
    }

    pub fn markers() -> QueryKey {
        all().push("markers")
    }

    pub fn markers_filtered(layer: Option<&str>, entity_types: &[WikiEntityType]) -> QueryKey {
        let types = entity_types
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(",");
        markers()
            .push(format!("layer={}", layer.unwrap_or("")))
            .push(format!("types={types}"))
    }

    pub fn entity_details(id: Uuid) -> QueryKey {
        all().push("entity").push(id.to_string())
    }

    pub fn layers() -> QueryKey {
        all().push("layers")
    }

    pub fn search(query: &str) -> QueryKey {
        all().push("search").push(query)
    }
}

/// Keys for the media library.
pub mod media_keys {
    use super::*;

    pub fn all() -> QueryKey {
        QueryKey::new(["media"])
    }

    pub fn lists() -> QueryKey {
        all().push("list")
    }
}
