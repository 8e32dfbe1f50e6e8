//! Wiki entity operations.

use crate::api::{ApiClient, TableQuery};
use crate::error::DataResult;
use loreforge_types::{
    EntityListParams, EntityRelation, EntityStoryRelation, NewEntityRelation,
    NewEntityStoryRelation, NewWikiEntity, WikiEntity, WikiEntityPatch, WikiEntityType,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Page size used when the caller does not set a limit.
pub const DEFAULT_PAGE: u32 = 20;

/// A page of entities with the exact total match count.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityPage {
    pub entities: Vec<WikiEntity>,
    pub count: Option<u64>,
}

/// Summary of a related entity, carried with its relation label.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelatedEntity {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub entity_type: WikiEntityType,
    pub image_url: Option<String>,
    pub relation_type: String,
    pub description: Option<String>,
}

/// Summary of a story an entity appears in.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelatedStory {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub cover_image_url: Option<String>,
    pub category: Option<String>,
    pub relation_type: Option<String>,
}

/// An entity together with its full relation set.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityWithRelations {
    #[serde(flatten)]
    pub entity: WikiEntity,
    pub related_entities: Vec<RelatedEntity>,
    pub stories: Vec<RelatedStory>,
}

#[derive(Debug, Deserialize)]
struct EntitySummaryRow {
    id: Uuid,
    name: String,
    slug: String,
    entity_type: WikiEntityType,
    #[serde(default)]
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RelationRow {
    relation_type: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(alias = "entity_a", alias = "entity_b")]
    other: EntitySummaryRow,
}

#[derive(Debug, Deserialize)]
struct StoryRelationRow {
    #[serde(default)]
    relation_type: Option<String>,
    story: StorySummaryRow,
}

#[derive(Debug, Deserialize)]
struct StorySummaryRow {
    id: Uuid,
    title: String,
    slug: String,
    #[serde(default)]
    cover_image_url: Option<String>,
    #[serde(default)]
    category: Option<String>,
}

/// Lists entities ordered by name, with an exact count.
pub async fn get_wiki_entities(
    api: &ApiClient,
    params: EntityListParams,
) -> DataResult<EntityPage> {
    let limit = params.limit.unwrap_or(DEFAULT_PAGE);
    let offset = params.offset.unwrap_or(0);

    let mut query = TableQuery::new()
        .select("*")
        .order("name", true)
        .limit(limit)
        .offset(offset);

    if let Some(entity_type) = params.entity_type {
        query = query.eq("entity_type", entity_type.as_str());
    }
    if let Some(search) = params.search.as_deref() {
        if !search.is_empty() {
            query = query.ilike("name", search);
        }
    }

    let (entities, count) = api.get_rows_counted("wiki_entities", query).await?;
    Ok(EntityPage { entities, count })
}

pub async fn get_wiki_entity_by_slug(api: &ApiClient, slug: &str) -> DataResult<WikiEntity> {
    api.get_row(
        "wiki_entities",
        TableQuery::new().select("*").eq("slug", slug),
    )
    .await
}

pub async fn get_wiki_entity_by_id(api: &ApiClient, id: Uuid) -> DataResult<WikiEntity> {
    api.get_row("wiki_entities", TableQuery::new().select("*").eq("id", id))
        .await
}

/// Fetches an entity, then assembles its full relation set.
///
/// The three dependent reads are independent of each other and run
/// concurrently: relations where the entity is side A, relations where
/// it is side B, and its story links via the join table. Both relation
/// directions are unioned into one list.
pub async fn get_wiki_entity_with_relations(
    api: &ApiClient,
    slug: &str,
) -> DataResult<EntityWithRelations> {
    let entity = get_wiki_entity_by_slug(api, slug).await?;
    let (related_entities, stories) = relations_for(api, entity.id).await?;
    Ok(EntityWithRelations {
        entity,
        related_entities,
        stories,
    })
}

/// Full relation set of an entity: both relation directions unioned,
/// plus its story links. Also backs the map's detail panel.
pub async fn relations_for(
    api: &ApiClient,
    entity_id: Uuid,
) -> DataResult<(Vec<RelatedEntity>, Vec<RelatedStory>)> {
    let (as_a, as_b, story_rows) = tokio::try_join!(
        relations_where(api, "entity_a_id", entity_id, "entity_b"),
        relations_where(api, "entity_b_id", entity_id, "entity_a"),
        story_relations_for(api, entity_id),
    )?;

    let related_entities = as_a
        .into_iter()
        .chain(as_b)
        .map(|row| RelatedEntity {
            id: row.other.id,
            name: row.other.name,
            slug: row.other.slug,
            entity_type: row.other.entity_type,
            image_url: row.other.image_url,
            relation_type: row.relation_type,
            description: row.description,
        })
        .collect();

    let stories = story_rows
        .into_iter()
        .map(|row| RelatedStory {
            id: row.story.id,
            title: row.story.title,
            slug: row.story.slug,
            cover_image_url: row.story.cover_image_url,
            category: row.story.category,
            relation_type: row.relation_type,
        })
        .collect();

    Ok((related_entities, stories))
}

async fn relations_where(
    api: &ApiClient,
    column: &str,
    id: Uuid,
    embed: &str,
) -> DataResult<Vec<RelationRow>> {
    let select = format!(
        "relation_type, description, \
         {embed}:wiki_entities!entity_relations_{embed}_id_fkey(id, name, slug, entity_type, image_url)"
    );
    api.get_rows(
        "entity_relations",
        TableQuery::new().select(&select).eq(column, id),
    )
    .await
}

async fn story_relations_for(api: &ApiClient, id: Uuid) -> DataResult<Vec<StoryRelationRow>> {
    api.get_rows(
        "entity_story_relations",
        TableQuery::new()
            .select("relation_type, story:stories(id, title, slug, cover_image_url, category)")
            .eq("entity_id", id),
    )
    .await
}

pub async fn get_entities_by_type(
    api: &ApiClient,
    entity_type: WikiEntityType,
    limit: u32,
) -> DataResult<Vec<WikiEntity>> {
    api.get_rows(
        "wiki_entities",
        TableQuery::new()
            .select("*")
            .eq("entity_type", entity_type.as_str())
            .order("name", true)
            .limit(limit),
    )
    .await
}

/// Counts entities per type with a single bulk fetch of type labels and
/// an in-memory tally — one round trip instead of one count query per
/// category. Every type appears in the result, zero-initialized.
pub async fn get_entity_counts(api: &ApiClient) -> DataResult<HashMap<WikiEntityType, u64>> {
    #[derive(Deserialize)]
    struct TypeRow {
        entity_type: WikiEntityType,
    }

    let rows: Vec<TypeRow> = api
        .get_rows("wiki_entities", TableQuery::new().select("entity_type"))
        .await?;

    let mut counts: HashMap<WikiEntityType, u64> =
        WikiEntityType::ALL.iter().map(|t| (*t, 0)).collect();
    for row in rows {
        *counts.entry(row.entity_type).or_insert(0) += 1;
    }
    Ok(counts)
}

// ── Admin operations ──

pub async fn create_wiki_entity(api: &ApiClient, entity: NewWikiEntity) -> DataResult<WikiEntity> {
    api.insert_row("wiki_entities", &entity).await
}

pub async fn update_wiki_entity(
    api: &ApiClient,
    id: Uuid,
    patch: WikiEntityPatch,
) -> DataResult<WikiEntity> {
    api.update_row("wiki_entities", TableQuery::new().eq("id", id), &patch)
        .await
}

pub async fn delete_wiki_entity(api: &ApiClient, id: Uuid) -> DataResult<()> {
    api.delete_rows("wiki_entities", TableQuery::new().eq("id", id))
        .await
}

pub async fn create_entity_relation(
    api: &ApiClient,
    relation: NewEntityRelation,
) -> DataResult<EntityRelation> {
    api.insert_row("entity_relations", &relation).await
}

pub async fn create_entity_story_relation(
    api: &ApiClient,
    relation: NewEntityStoryRelation,
) -> DataResult<EntityStoryRelation> {
    api.insert_row("entity_story_relations", &relation).await
}
