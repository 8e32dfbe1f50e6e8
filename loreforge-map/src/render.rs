//! SVG marker rendering.

use loreforge_types::MapMarker;

const WORLD_HALF: f64 = 256.0;
const MARKER_RADIUS: f64 = 6.0;

/// Draws a marker set. Implementations own the output format.
pub trait MarkerRenderer {
    fn render(&self, markers: &[MapMarker]) -> String;
}

/// Static SVG renderer.
///
/// World coordinates run [-256, 256] on both axes with y pointing up;
/// the viewport has y pointing down, so y is inverted during projection.
pub struct SvgRenderer {
    pub width: u32,
    pub height: u32,
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 1024,
        }
    }
}

impl SvgRenderer {
    fn project(&self, x: f64, y: f64) -> (f64, f64) {
        let px = (x + WORLD_HALF) / (2.0 * WORLD_HALF) * f64::from(self.width);
        let py = (WORLD_HALF - y) / (2.0 * WORLD_HALF) * f64::from(self.height);
        (px, py)
    }
}

impl MarkerRenderer for SvgRenderer {
    fn render(&self, markers: &[MapMarker]) -> String {
        let mut svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {} {}\">\n",
            self.width, self.height
        );
        for marker in markers {
            let (px, py) = self.project(marker.x, marker.y);
            svg.push_str(&format!(
                "  <circle class=\"marker marker-{}\" cx=\"{px:.1}\" cy=\"{py:.1}\" r=\"{MARKER_RADIUS}\"><title>{}</title></circle>\n",
                marker.entity_type.as_str(),
                escape_text(&marker.name),
            ));
        }
        svg.push_str("</svg>\n");
        svg
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
