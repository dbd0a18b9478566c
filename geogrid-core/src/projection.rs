//! Geographic ↔ pixel mapping supplied by the hosting map surface.
//!
//! The grid engine never does projection math itself; it only asks a
//! [`PixelProjection`] to move corners between the two planes.

use crate::types::{LatLng, PixelPoint};

/// Bidirectional mapping between geographic coordinates and the map's pixel
/// plane at a given zoom level.
pub trait PixelProjection: Send + Sync {
    fn project(&self, latlng: LatLng, zoom: f64) -> PixelPoint;
    fn unproject(&self, point: PixelPoint, zoom: f64) -> LatLng;
}

/// Plain linear scaling of longitude/latitude onto a square world of
/// `tile_size * 2^zoom` pixels. Latitude runs north-down so that pixel y
/// grows southwards like a screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearProjection {
    pub tile_size: f64,
}

impl LinearProjection {
    pub fn new(tile_size: f64) -> Self {
        Self { tile_size }
    }

    fn world_size(&self, zoom: f64) -> f64 {
        self.tile_size * zoom.exp2()
    }
}

impl Default for LinearProjection {
    fn default() -> Self {
        Self { tile_size: 256.0 }
    }
}

impl PixelProjection for LinearProjection {
    fn project(&self, latlng: LatLng, zoom: f64) -> PixelPoint {
        let scale = self.world_size(zoom);
        PixelPoint::new(
            (latlng.lng + 180.0) / 360.0 * scale,
            (90.0 - latlng.lat) / 180.0 * scale,
        )
    }

    fn unproject(&self, point: PixelPoint, zoom: f64) -> LatLng {
        let scale = self.world_size(zoom);
        LatLng::new(
            90.0 - point.y / scale * 180.0,
            point.x / scale * 360.0 - 180.0,
        )
    }
}
