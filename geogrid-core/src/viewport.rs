use crate::error::{GridError, GridResult};
use crate::projection::PixelProjection;
use crate::types::{LatLng, LatLngBounds, PixelPoint, PixelSize};
use serde::{Deserialize, Serialize};

/// The visible part of the map, in both geographic and pixel terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub bounds: LatLngBounds,
    pub size: PixelSize,
    pub zoom: f64,
}

impl Viewport {
    pub fn new(bounds: LatLngBounds, size: PixelSize, zoom: f64) -> Self {
        Self { bounds, size, zoom }
    }

    /// Build the viewport a map of `size` pixels would show when centred on
    /// `center` at `zoom`.
    pub fn from_center(
        center: LatLng,
        zoom: f64,
        size: PixelSize,
        projection: &dyn PixelProjection,
    ) -> Self {
        let c = projection.project(center, zoom);
        let nw = projection.unproject(c.offset(-size.width / 2.0, -size.height / 2.0), zoom);
        let se = projection.unproject(c.offset(size.width / 2.0, size.height / 2.0), zoom);
        Self {
            bounds: LatLngBounds::from_corners(nw, se),
            size,
            zoom,
        }
    }

    /// Pixel position of the north-west corner.
    pub fn pixel_origin(&self, projection: &dyn PixelProjection) -> PixelPoint {
        projection.project(self.bounds.north_west(), self.zoom)
    }

    pub fn validate(&self) -> GridResult<()> {
        if !self.zoom.is_finite() {
            return Err(GridError::invalid_viewport(format!("zoom must be finite, got {}", self.zoom)));
        }
        let b = &self.bounds;
        if ![b.south, b.west, b.north, b.east].iter().all(|v| v.is_finite()) {
            return Err(GridError::invalid_viewport("bounds must be finite"));
        }
        if b.south > b.north || b.west > b.east {
            return Err(GridError::invalid_viewport(format!(
                "bounds are inverted: south={} north={} west={} east={}",
                b.south, b.north, b.west, b.east
            )));
        }
        if !(self.size.width >= 0.0 && self.size.height >= 0.0)
            || !self.size.width.is_finite()
            || !self.size.height.is_finite()
        {
            return Err(GridError::invalid_viewport(format!(
                "pixel size must be finite and non-negative, got {}x{}",
                self.size.width, self.size.height
            )));
        }
        Ok(())
    }
}
