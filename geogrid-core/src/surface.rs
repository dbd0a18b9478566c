//! Render surface capability
//!
//! Anything that can add and clear renderable primitives. The hosting map
//! (or a test double) implements [`RenderSurface`]; the grid layer never
//! draws by itself.

use crate::config::CellStyle;
use crate::glyph::Icon;
use crate::types::{Assignment, GridCell, LatLng, LatLngBounds};
use serde::{Deserialize, Serialize};

/// "Add cell rectangle" command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRectangle {
    pub cell_id: String,
    pub bounds: LatLngBounds,
    pub style: CellStyle,
}

/// "Add glyph" command for a non-empty cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphMarker {
    pub cell_id: String,
    pub position: LatLng,
    pub icon: Icon,
    /// Points matched into the cell
    pub points: Vec<Assignment>,
}

pub trait RenderSurface: Send + 'static {
    /// Drop everything this layer has added so far.
    fn clear(&mut self);

    /// Fired once per draw cycle, before any staggered emission.
    fn cells_generated(&mut self, _generation: u64, _cells: &[GridCell]) {}

    fn add_cell(&mut self, generation: u64, rectangle: CellRectangle);

    fn add_glyph(&mut self, generation: u64, glyph: GlyphMarker);
}

/// Every call a surface received, in arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderCommand {
    Clear,
    CellsGenerated { generation: u64, cell_ids: Vec<String> },
    AddCell { generation: u64, rectangle: CellRectangle },
    AddGlyph { generation: u64, glyph: GlyphMarker },
}

/// Surface that just records commands; used by the CLI and in tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingSurface {
    pub commands: Vec<RenderCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands issued after the most recent clear, i.e. what is on screen.
    pub fn live(&self) -> &[RenderCommand] {
        let start = self
            .commands
            .iter()
            .rposition(|c| matches!(c, RenderCommand::Clear))
            .map_or(0, |i| i + 1);
        &self.commands[start..]
    }

    pub fn live_cell_ids(&self) -> Vec<&str> {
        self.live()
            .iter()
            .filter_map(|c| match c {
                RenderCommand::AddCell { rectangle, .. } => Some(rectangle.cell_id.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn live_glyphs(&self) -> Vec<&GlyphMarker> {
        self.live()
            .iter()
            .filter_map(|c| match c {
                RenderCommand::AddGlyph { glyph, .. } => Some(glyph),
                _ => None,
            })
            .collect()
    }
}

impl RenderSurface for RecordingSurface {
    fn clear(&mut self) {
        self.commands.push(RenderCommand::Clear);
    }

    fn cells_generated(&mut self, generation: u64, cells: &[GridCell]) {
        self.commands.push(RenderCommand::CellsGenerated {
            generation,
            cell_ids: cells.iter().map(|c| c.id.clone()).collect(),
        });
    }

    fn add_cell(&mut self, generation: u64, rectangle: CellRectangle) {
        self.commands.push(RenderCommand::AddCell { generation, rectangle });
    }

    fn add_glyph(&mut self, generation: u64, glyph: GlyphMarker) {
        self.commands.push(RenderCommand::AddGlyph { generation, glyph });
    }
}
