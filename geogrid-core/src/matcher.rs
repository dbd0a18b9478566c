//! Point-to-cell assignment
//!
//! Cell bounds are closed, so neighbouring cells share their edges. A point
//! on a shared edge belongs to the first containing cell in generation
//! order: the western cell on a constant-longitude edge (lower row) and the
//! northern cell on a constant-latitude edge (lower column).

use crate::error::PointIssue;
use crate::filter::VisiblePoint;
use crate::types::{Assignment, GridCell, LatLng};

/// Outcome of looking up one location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellMatch<'a> {
    Found(&'a GridCell),
    NotFound,
}

impl<'a> CellMatch<'a> {
    pub fn cell(self) -> Option<&'a GridCell> {
        match self {
            CellMatch::Found(cell) => Some(cell),
            CellMatch::NotFound => None,
        }
    }
}

/// First cell, in generation order, whose bounds contain `location`.
pub fn find_cell<'a>(cells: &'a [GridCell], location: &LatLng) -> CellMatch<'a> {
    cells
        .iter()
        .find(|cell| cell.bounds.contains(location))
        .map_or(CellMatch::NotFound, CellMatch::Found)
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct MatchReport {
    /// One assignment per matched point, in input order
    pub assignments: Vec<Assignment>,
    /// Visible points that fell inside no cell
    pub unmatched: Vec<PointIssue>,
}

/// Assign every visible point to exactly one cell. Points matching no cell
/// (edge rounding between the viewport and the reprojected grid) are
/// dropped and reported instead of failing the batch.
pub fn assign(cells: &[GridCell], points: &[VisiblePoint<'_>]) -> MatchReport {
    let mut report = MatchReport {
        assignments: Vec::with_capacity(points.len()),
        unmatched: Vec::new(),
    };

    for point in points {
        match find_cell(cells, &point.location) {
            CellMatch::Found(cell) => report.assignments.push(Assignment {
                point_id: point.id.to_string(),
                cell_id: cell.id.clone(),
                cell_centroid: cell.centroid,
            }),
            CellMatch::NotFound => {
                log::warn!("Point {} at {} matched no grid cell, dropping it", point.id, point.location);
                report.unmatched.push(PointIssue::Unmatched {
                    point_id: point.id.to_string(),
                });
            }
        }
    }

    report
}
