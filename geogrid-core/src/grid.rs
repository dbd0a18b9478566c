//! Cell grid generation
//!
//! The viewport's pixel plane is cut into square cells of `cell_size`
//! pixels, anchored at the pixel position of the viewport's north-west
//! corner. `row` walks along x (east), `col` walks along y (south).
//!
//! Cell `(row, col)` spans pixels `x ∈ [x0 + (row-1)·s, x0 + row·s]` and
//! `y ∈ [y0 + (col-1)·s, y0 + col·s]`, so row/col 0 sits just outside the
//! viewport, flush with its top-left origin. Indices run inclusively up to
//! the ceiled row/column counts, which over-generates one extra row and
//! column and guarantees partial cells at the far edges are covered.

use crate::error::{GridError, GridResult};
use crate::projection::PixelProjection;
use crate::types::{GridCell, LatLngBounds, PixelPoint};
use crate::viewport::Viewport;

/// Upper bound on the cells of one generation.
pub const MAX_CELLS: usize = 1_000_000;

/// Pixel-space layout of one generation's grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridParams {
    pub origin: PixelPoint,
    pub cell_size: f64,
    /// Number of cells needed to span the width (x axis)
    pub rows: u32,
    /// Number of cells needed to span the height (y axis)
    pub cols: u32,
    pub zoom: f64,
    /// Geographic bounds of the viewport the grid was laid over
    pub frame: LatLngBounds,
}

fn span(pixels: f64, cell_size: f64) -> Option<u32> {
    let n = (pixels / cell_size).ceil();
    if n.is_finite() && n < u32::MAX as f64 {
        Some(n as u32)
    } else {
        None
    }
}

impl GridParams {
    /// Lay a grid of `cell_size` pixel cells over `viewport`. Fails with
    /// [`GridError::InvalidViewport`] when the grid would exceed [`MAX_CELLS`].
    pub fn for_viewport(
        viewport: &Viewport,
        cell_size: f64,
        projection: &dyn PixelProjection,
    ) -> GridResult<Self> {
        let (rows, cols) = if viewport.size.is_empty() {
            (0, 0)
        } else {
            let too_many = || {
                GridError::invalid_viewport(format!(
                    "{}x{} px at cell size {} exceeds {} cells",
                    viewport.size.width, viewport.size.height, cell_size, MAX_CELLS
                ))
            };
            let rows = span(viewport.size.width, cell_size).ok_or_else(too_many)?;
            let cols = span(viewport.size.height, cell_size).ok_or_else(too_many)?;
            let count = (rows as usize + 1)
                .checked_mul(cols as usize + 1)
                .filter(|&n| n <= MAX_CELLS)
                .ok_or_else(too_many)?;
            log::trace!("grid of {} cells for {}x{} px", count, viewport.size.width, viewport.size.height);
            (rows, cols)
        };
        Ok(Self {
            origin: viewport.pixel_origin(projection),
            cell_size,
            rows,
            cols,
            zoom: viewport.zoom,
            frame: viewport.bounds,
        })
    }

    /// A zero-area viewport produces no grid at all.
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Number of cells [`generate_cells`] will emit.
    pub fn cell_count(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.rows as usize + 1) * (self.cols as usize + 1)
        }
    }

    /// Offset from the origin by whole cells.
    fn corner(&self, row: f64, col: f64) -> PixelPoint {
        self.origin.offset(row * self.cell_size, col * self.cell_size)
    }

    /// The two pixel corners of a cell: the far corner at `(row, col)` and
    /// the near corner one cell back at `(row-1, col-1)`.
    pub fn cell_pixel_corners(&self, row: u32, col: u32) -> (PixelPoint, PixelPoint) {
        let far = self.corner(row as f64, col as f64);
        let near = self.corner(row as f64 - 1.0, col as f64 - 1.0);
        (far, near)
    }

    /// Geographic bounds of a cell. The last row and column are stretched to
    /// the viewport's east and south edges, which the pixel round trip can
    /// otherwise miss by a rounding step when the size is a whole number of
    /// cells.
    pub fn cell_bounds(&self, row: u32, col: u32, projection: &dyn PixelProjection) -> LatLngBounds {
        let (far, near) = self.cell_pixel_corners(row, col);
        let mut bounds = LatLngBounds::from_corners(
            projection.unproject(far, self.zoom),
            projection.unproject(near, self.zoom),
        );
        if row == self.rows {
            bounds.east = bounds.east.max(self.frame.east);
        }
        if col == self.cols {
            bounds.south = bounds.south.min(self.frame.south);
        }
        bounds
    }
}

/// Generate every cell of the grid in row-major order (outer loop rows,
/// inner loop columns).
pub fn generate_cells(params: &GridParams, projection: &dyn PixelProjection) -> Vec<GridCell> {
    if params.is_empty() {
        return Vec::new();
    }

    let mut cells = Vec::with_capacity(params.cell_count());
    for row in 0..=params.rows {
        for col in 0..=params.cols {
            let bounds = params.cell_bounds(row, col, projection);
            cells.push(GridCell {
                id: GridCell::cell_id(row, col),
                row,
                col,
                bounds,
                centroid: bounds.center(),
            });
        }
    }
    log::trace!(
        "generated {} cells ({}x{} + edge) at origin ({:.1}, {:.1})",
        cells.len(),
        params.rows,
        params.cols,
        params.origin.x,
        params.origin.y
    );
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::LinearProjection;
    use crate::types::{LatLng, PixelSize};

    fn viewport_160() -> (Viewport, LinearProjection) {
        // 360 px per 360 degrees at zoom 0 keeps the numbers readable:
        // 1 px == 1 degree of longitude == 0.5 degree of latitude
        let proj = LinearProjection::new(360.0);
        let vp = Viewport::from_center(LatLng::new(0.0, 0.0), 0.0, PixelSize::new(160.0, 160.0), &proj);
        (vp, proj)
    }

    #[test]
    fn test_row_and_column_counts() {
        let (vp, proj) = viewport_160();
        let params = GridParams::for_viewport(&vp, 80.0, &proj).unwrap();
        assert_eq!((params.rows, params.cols), (2, 2));
        assert_eq!(params.cell_count(), 9);

        let params = GridParams::for_viewport(&vp, 70.0, &proj).unwrap();
        assert_eq!((params.rows, params.cols), (3, 3));
        assert_eq!(params.cell_count(), 16);
    }

    #[test]
    fn test_scenario_160_by_160() {
        let (vp, proj) = viewport_160();
        let params = GridParams::for_viewport(&vp, 80.0, &proj).unwrap();
        let cells = generate_cells(&params, &proj);
        let ids: Vec<_> = cells.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["0:0", "0:1", "0:2", "1:0", "1:1", "1:2", "2:0", "2:1", "2:2"]);
    }

    #[test]
    fn test_first_cell_is_flush_with_origin() {
        let (vp, proj) = viewport_160();
        let params = GridParams::for_viewport(&vp, 80.0, &proj).unwrap();
        let cells = generate_cells(&params, &proj);

        // cell 0:0 ends exactly at the viewport's north-west corner
        let first = &cells[0];
        assert!((first.bounds.east - vp.bounds.west).abs() < 1e-9);
        assert!((first.bounds.south - vp.bounds.north).abs() < 1e-9);

        // cell 1:1 starts there
        let inner = cells.iter().find(|c| c.id == "1:1").unwrap();
        assert!((inner.bounds.west - vp.bounds.west).abs() < 1e-9);
        assert!((inner.bounds.north - vp.bounds.north).abs() < 1e-9);
        assert!((inner.bounds.east - inner.bounds.west - 80.0).abs() < 1e-9);
        assert!((inner.bounds.north - inner.bounds.south - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_centroid_is_bounds_center() {
        let (vp, proj) = viewport_160();
        let params = GridParams::for_viewport(&vp, 80.0, &proj).unwrap();
        for cell in generate_cells(&params, &proj) {
            assert_eq!(cell.centroid, cell.bounds.center());
        }
    }

    #[test]
    fn test_zero_area_viewport_has_no_cells() {
        let proj = LinearProjection::default();
        let vp = Viewport::from_center(LatLng::new(0.0, 0.0), 3.0, PixelSize::new(0.0, 200.0), &proj);
        let params = GridParams::for_viewport(&vp, 80.0, &proj).unwrap();
        assert!(params.is_empty());
        assert!(generate_cells(&params, &proj).is_empty());
    }

    #[test]
    fn test_oversized_grid_is_rejected() {
        let proj = LinearProjection::default();
        let vp = Viewport::from_center(LatLng::new(0.0, 0.0), 3.0, PixelSize::new(1000.0, 1000.0), &proj);
        for cell_size in [1e-6, 0.5] {
            assert!(matches!(
                GridParams::for_viewport(&vp, cell_size, &proj),
                Err(GridError::InvalidViewport { .. })
            ));
        }
        // one over the cap once the edge row and column are added
        assert!(GridParams::for_viewport(&vp, 1.0, &proj).is_err());
        let params = GridParams::for_viewport(&vp, 2.0, &proj).unwrap();
        assert_eq!(params.cell_count(), 501 * 501);
    }

    #[test]
    fn test_far_edges_cover_whole_multiple_viewport() {
        let proj = LinearProjection::default();
        for (lat, lng, zoom) in [(48.85, 2.35, 12.0), (-33.9, 151.2, 7.0), (12.3, -45.6, 3.0), (0.1, 0.1, 9.0)] {
            let vp = Viewport::from_center(LatLng::new(lat, lng), zoom, PixelSize::new(1280.0, 800.0), &proj);
            let params = GridParams::for_viewport(&vp, 80.0, &proj).unwrap();
            let cells = generate_cells(&params, &proj);
            let last = cells.last().unwrap();
            assert_eq!(last.id, "16:10");
            assert!(last.bounds.east >= vp.bounds.east);
            assert!(last.bounds.south <= vp.bounds.south);
        }
    }
}
