//! Interactive map operations.
//!
//! Markers are wiki entities that carry coordinates; everything here
//! reads and writes the `wiki_entities` table through a map-shaped lens.

use crate::api::{ApiClient, TableQuery};
use crate::error::{DataError, DataResult};
use crate::queries::wiki::{self, RelatedEntity, RelatedStory};
use loreforge_types::{MapMarker, WikiEntity, WikiEntityType, MAP_COORD_MAX, MAP_COORD_MIN};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Narrows which markers a map view shows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MarkerFilter {
    pub layer: Option<String>,
    pub entity_types: Vec<WikiEntityType>,
}

/// A search hit for the map's entity picker.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapSearchHit {
    pub id: Uuid,
    pub name: String,
    pub entity_type: WikiEntityType,
    /// Whether the entity is already placed on the map.
    pub has_coords: bool,
}

#[derive(Debug, Deserialize)]
struct MarkerRow {
    id: Uuid,
    name: String,
    slug: String,
    entity_type: WikiEntityType,
    #[serde(default)]
    short_description: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    x_coord: f64,
    y_coord: f64,
    #[serde(default)]
    map_layer: Option<String>,
}

impl From<MarkerRow> for MapMarker {
    fn from(row: MarkerRow) -> Self {
        MapMarker {
            id: row.id,
            name: row.name,
            slug: row.slug,
            entity_type: row.entity_type,
            short_description: row.short_description,
            image_url: row.image_url,
            x: row.x_coord,
            y: row.y_coord,
            layer: row.map_layer,
        }
    }
}

/// Entities with coordinates, optionally narrowed by layer and type.
pub async fn get_map_markers(api: &ApiClient, filter: &MarkerFilter) -> DataResult<Vec<MapMarker>> {
    let mut query = TableQuery::new()
        .select("id, name, slug, entity_type, short_description, image_url, x_coord, y_coord, map_layer")
        .not_null("x_coord")
        .not_null("y_coord")
        .order("name", true);

    if let Some(layer) = filter.layer.as_deref() {
        query = query.eq("map_layer", layer);
    }
    if !filter.entity_types.is_empty() {
        let types: Vec<&str> = filter.entity_types.iter().map(|t| t.as_str()).collect();
        query = query.in_list("entity_type", &types);
    }

    let rows: Vec<MarkerRow> = api.get_rows("wiki_entities", query).await?;
    Ok(rows.into_iter().map(MapMarker::from).collect())
}

/// Everything the map's detail panel shows for a clicked marker.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapEntityDetails {
    #[serde(flatten)]
    pub entity: WikiEntity,
    pub related_entities: Vec<RelatedEntity>,
    pub stories: Vec<RelatedStory>,
}

/// Full entity record behind a marker, with its relation set.
pub async fn get_map_entity_details(api: &ApiClient, id: Uuid) -> DataResult<MapEntityDetails> {
    let entity: WikiEntity = api
        .get_row("wiki_entities", TableQuery::new().select("*").eq("id", id))
        .await?;
    let (related_entities, stories) = wiki::relations_for(api, entity.id).await?;
    Ok(MapEntityDetails {
        entity,
        related_entities,
        stories,
    })
}

/// Distinct layer names among placed entities, sorted.
pub async fn get_map_layers(api: &ApiClient) -> DataResult<Vec<String>> {
    #[derive(Deserialize)]
    struct LayerRow {
        map_layer: Option<String>,
    }

    let rows: Vec<LayerRow> = api
        .get_rows(
            "wiki_entities",
            TableQuery::new()
                .select("map_layer")
                .not_null("map_layer")
                .not_null("x_coord"),
        )
        .await?;

    let mut layers: Vec<String> = rows.into_iter().filter_map(|r| r.map_layer).collect();
    layers.sort();
    layers.dedup();
    Ok(layers)
}

/// Places or moves an entity on the map.
///
/// Coordinates outside the map bounds are rejected before any request
/// is made.
pub async fn update_entity_map_position(
    api: &ApiClient,
    id: Uuid,
    x: f64,
    y: f64,
    layer: Option<&str>,
) -> DataResult<WikiEntity> {
    for (axis, coord) in [("x", x), ("y", y)] {
        if !(MAP_COORD_MIN..=MAP_COORD_MAX).contains(&coord) {
            return Err(DataError::ValidationFailed(format!(
                "map {axis} coordinate {coord} outside [{MAP_COORD_MIN}, {MAP_COORD_MAX}]"
            )));
        }
    }

    // The layer is only patched when given, so moving a marker within
    // its layer never clears the layer.
    let mut body = serde_json::json!({
        "x_coord": x,
        "y_coord": y,
    });
    if let Some(layer) = layer {
        body["map_layer"] = serde_json::Value::String(layer.to_string());
    }

    api.update_row("wiki_entities", TableQuery::new().eq("id", id), &body)
        .await
}

/// Removes an entity from the map without deleting it.
pub async fn clear_entity_map_position(api: &ApiClient, id: Uuid) -> DataResult<WikiEntity> {
    let body = serde_json::json!({
        "x_coord": serde_json::Value::Null,
        "y_coord": serde_json::Value::Null,
        "map_layer": serde_json::Value::Null,
    });

    api.update_row("wiki_entities", TableQuery::new().eq("id", id), &body)
        .await
}

/// Name search for the admin placement picker.
pub async fn search_entities_for_map(
    api: &ApiClient,
    search: &str,
    limit: u32,
) -> DataResult<Vec<MapSearchHit>> {
    #[derive(Deserialize)]
    struct HitRow {
        id: Uuid,
        name: String,
        entity_type: WikiEntityType,
        x_coord: Option<f64>,
        y_coord: Option<f64>,
    }

    let rows: Vec<HitRow> = api
        .get_rows(
            "wiki_entities",
            TableQuery::new()
                .select("id, name, entity_type, x_coord, y_coord")
                .ilike("name", search)
                .order("name", true)
                .limit(limit),
        )
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| MapSearchHit {
            id: row.id,
            name: row.name,
            entity_type: row.entity_type,
            has_coords: row.x_coord.is_some() && row.y_coord.is_some(),
        })
        .collect())
}
