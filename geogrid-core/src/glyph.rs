//! Glyph descriptors handed to the renderer for every non-empty cell.

use crate::types::{AggregateCell, Assignment, LatLng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const DEFAULT_ICON_URL: &str = "pin.svg";
pub const DEFAULT_ICON_SIZE: [u32; 2] = [40, 40];

/// Renderer-agnostic icon description. Either an image (`url`) or inline
/// markup (`html`) is expected; both may be present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Icon {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_icon_size")]
    pub size: [u32; 2],
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub class_name: Option<String>,
}

fn default_icon_size() -> [u32; 2] {
    DEFAULT_ICON_SIZE
}

impl Default for Icon {
    fn default() -> Self {
        Self {
            url: Some(DEFAULT_ICON_URL.to_string()),
            size: DEFAULT_ICON_SIZE,
            html: None,
            class_name: None,
        }
    }
}

/// What a glyph factory gets to look at: the cell, where the glyph goes and
/// which points were matched into it.
#[derive(Debug, Clone, Copy)]
pub struct MarkerInfo<'a> {
    pub cell_id: &'a str,
    pub position: LatLng,
    pub points: &'a [Assignment],
}

impl<'a> MarkerInfo<'a> {
    pub fn from_aggregate(aggregate: &'a AggregateCell) -> Self {
        Self {
            cell_id: &aggregate.cell_id,
            position: aggregate.position,
            points: &aggregate.members,
        }
    }

    pub fn count(&self) -> usize {
        self.points.len()
    }
}

/// User supplied icon builder.
pub type GlyphFactory = Arc<dyn Fn(&MarkerInfo<'_>) -> Icon + Send + Sync>;

/// Use the factory when there is one, the configured default icon otherwise.
pub fn create_icon(factory: Option<&GlyphFactory>, default_icon: &Icon, info: &MarkerInfo<'_>) -> Icon {
    match factory {
        Some(factory) => factory(info),
        None => default_icon.clone(),
    }
}

/// Factory producing a round badge labelled with the cell's point count.
pub fn count_badge_factory() -> GlyphFactory {
    Arc::new(|info: &MarkerInfo<'_>| {
        let count = info.count();
        // 24px for a single point, growing slowly with the count
        let side = 24 + (count as f64).log10().floor().max(0.0) as u32 * 8;
        Icon {
            url: None,
            size: [side, side],
            html: Some(format!("<div><span>{}</span></div>", count)),
            class_name: Some("geogrid-count".to_string()),
        }
    })
}
