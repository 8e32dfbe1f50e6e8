//! Map marker filtering and rendering.
//!
//! Rendering sits behind [`MarkerRenderer`] so the drawing backend can
//! be swapped without touching the data layer; the built-in
//! [`SvgRenderer`] draws a static SVG document.

mod render;

pub use render::{MarkerRenderer, SvgRenderer};

use loreforge_types::{MapMarker, WikiEntityType, MAP_COORD_MAX, MAP_COORD_MIN};

/// Client-side narrowing of an already-fetched marker set, with the
/// same semantics as the query-side filters: `layer == None` matches
/// every layer, an empty type list matches every type.
pub fn filter_markers<'a>(
    markers: &'a [MapMarker],
    layer: Option<&str>,
    types: &[WikiEntityType],
) -> Vec<&'a MapMarker> {
    markers
        .iter()
        .filter(|m| match layer {
            Some(layer) => m.layer.as_deref() == Some(layer),
            None => true,
        })
        .filter(|m| types.is_empty() || types.contains(&m.entity_type))
        .collect()
}

/// Clamps a world coordinate into the valid range.
pub fn clamp_coord(v: f64) -> f64 {
    v.clamp(MAP_COORD_MIN, MAP_COORD_MAX)
}
