// GeoGrid Core Library
// Screen-space grid binning and aggregation for map viewports

//! GeoGrid Core
//!
//! Partitions a map viewport into a uniform grid of screen-space cells,
//! bins geo-located points into those cells, counts them per cell and
//! releases renderable cell and glyph commands on a staggered schedule.
//!
//! The hosting map supplies the geographic↔pixel mapping
//! ([`PixelProjection`]) and a [`RenderSurface`]; [`GridLayer`] ties the
//! pipeline together and redraws on every viewport change.

/// Core data types
pub mod types;

/// Geographic ↔ pixel mapping
pub mod projection;

/// Visible map region
pub mod viewport;

/// Cell grid generation
pub mod grid;

/// Viewport point filter
pub mod filter;

/// Point-to-cell matching
pub mod matcher;

/// Per-cell aggregation
pub mod aggregate;

/// Glyph descriptors and factories
pub mod glyph;

/// Staggered emission scheduling
pub mod schedule;

/// Render surface capability
pub mod surface;

/// Per-cycle pipeline context
pub mod cycle;

/// Viewport change controller
pub mod controller;

/// Grid configuration
pub mod config;

/// Error types
pub mod error;

// Re-export commonly used types
pub use types::*;
pub use projection::{LinearProjection, PixelProjection};
pub use viewport::Viewport;
pub use grid::{generate_cells, GridParams};
pub use filter::{filter_visible, FilterOutput, VisiblePoint};
pub use matcher::{assign, find_cell, CellMatch, MatchReport};
pub use aggregate::aggregate;
pub use glyph::{count_badge_factory, GlyphFactory, Icon, MarkerInfo};
pub use schedule::{spawn_plan, CycleHandle, Emission, EmissionPlan, ScheduledEmission};
pub use surface::{CellRectangle, GlyphMarker, RecordingSurface, RenderCommand, RenderSurface};
pub use cycle::{bin_points, Binning, CycleSummary, DrawCycle};
pub use controller::{GridLayer, GridLayerBuilder, ViewportEvent};
pub use config::{CellStyle, GridConfig};
pub use error::{GridError, GridResult, PointIssue};

/// Version information for the GeoGrid core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
