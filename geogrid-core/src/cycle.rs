//! Per-cycle context
//!
//! Everything a draw cycle needs lives in a [`DrawCycle`] created fresh for
//! each viewport change and passed through the pipeline, instead of being
//! kept as long-lived fields on the layer.

use crate::aggregate::aggregate;
use crate::config::GridConfig;
use crate::error::{GridResult, PointIssue};
use crate::filter::filter_visible;
use crate::glyph::GlyphFactory;
use crate::grid::{generate_cells, GridParams};
use crate::matcher::assign;
use crate::projection::PixelProjection;
use crate::schedule::EmissionPlan;
use crate::types::{AggregateCell, Assignment, GridCell, LatLngBounds, Point};
use crate::viewport::Viewport;
use serde::Serialize;
use std::collections::HashSet;

/// Result of binning a point set against one generation of cells.
#[derive(Debug, Default, Clone)]
pub struct Binning {
    pub visible: usize,
    pub assignments: Vec<Assignment>,
    pub aggregates: Vec<AggregateCell>,
    /// Malformed and unmatched points, in that order
    pub dropped: Vec<PointIssue>,
}

/// Filter → assign → aggregate.
pub fn bin_points(cells: &[GridCell], points: &[Point], bounds: &LatLngBounds) -> Binning {
    let filtered = filter_visible(points, bounds);
    let report = assign(cells, &filtered.visible);
    let aggregates = aggregate(&report.assignments);

    let mut dropped = filtered.malformed;
    dropped.extend(report.unmatched);

    Binning {
        visible: filtered.visible.len(),
        assignments: report.assignments,
        aggregates,
        dropped,
    }
}

/// Counts reported for every cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleSummary {
    pub generation: u64,
    pub cells: usize,
    pub visible_points: usize,
    pub assigned: usize,
    pub dropped: usize,
    pub aggregates: usize,
    pub scheduled: usize,
}

pub struct DrawCycle {
    pub generation: u64,
    pub viewport: Viewport,
    pub params: GridParams,
    /// Cell ids already scheduled in this cycle
    loaded: HashSet<String>,
}

impl DrawCycle {
    pub fn begin(
        generation: u64,
        viewport: Viewport,
        config: &GridConfig,
        projection: &dyn PixelProjection,
    ) -> GridResult<Self> {
        let params = GridParams::for_viewport(&viewport, config.cell_size, projection)?;
        log::debug!(
            "cycle {}: {}x{} px viewport at zoom {}, {} rows x {} cols",
            generation,
            viewport.size.width,
            viewport.size.height,
            viewport.zoom,
            params.rows,
            params.cols
        );
        Ok(Self {
            generation,
            viewport,
            params,
            loaded: HashSet::new(),
        })
    }

    pub fn generate_cells(&self, projection: &dyn PixelProjection) -> Vec<GridCell> {
        generate_cells(&self.params, projection)
    }

    pub fn is_loaded(&self, cell_id: &str) -> bool {
        self.loaded.contains(cell_id)
    }

    /// Bin `points` and build the emission plan for this cycle.
    pub fn plan(
        &mut self,
        cells: &[GridCell],
        points: &[Point],
        config: &GridConfig,
        factory: Option<&GlyphFactory>,
    ) -> (EmissionPlan, CycleSummary) {
        let delay = config.emission_delay();
        let mut plan = EmissionPlan::new(self.generation);
        plan.schedule_cells(cells, &config.style, delay, &mut self.loaded);

        let binning = if cells.is_empty() {
            Binning::default()
        } else {
            bin_points(cells, points, &self.viewport.bounds)
        };
        plan.schedule_glyphs(&binning.aggregates, delay, factory, &config.default_icon);

        let summary = CycleSummary {
            generation: self.generation,
            cells: cells.len(),
            visible_points: binning.visible,
            assigned: binning.assignments.len(),
            dropped: binning.dropped.len(),
            aggregates: binning.aggregates.len(),
            scheduled: plan.len(),
        };
        (plan, summary)
    }
}
