//! Viewport change controller
//!
//! [`GridLayer`] owns the configuration, the projection and the point set,
//! and reacts to viewport changes by clearing its previous output and
//! running a full draw cycle for the new viewport. There is no diffing:
//! every change regenerates everything, and the in-flight emissions of the
//! previous cycle are cancelled first.

use crate::config::GridConfig;
use crate::cycle::{CycleSummary, DrawCycle};
use crate::error::{GridError, GridResult};
use crate::glyph::GlyphFactory;
use crate::projection::PixelProjection;
use crate::schedule::{spawn_plan, CycleHandle};
use crate::surface::RenderSurface;
use crate::types::Point;
use crate::viewport::Viewport;
use parking_lot::Mutex;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Notifications from the hosting map surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportEvent {
    MoveEnd(Viewport),
    ZoomEnd(Viewport),
}

impl ViewportEvent {
    pub fn viewport(&self) -> &Viewport {
        match self {
            ViewportEvent::MoveEnd(vp) | ViewportEvent::ZoomEnd(vp) => vp,
        }
    }
}

pub struct GridLayerBuilder<S: RenderSurface> {
    config: GridConfig,
    projection: Option<Arc<dyn PixelProjection>>,
    points: Vec<Point>,
    glyph_factory: Option<GlyphFactory>,
    surface: PhantomData<fn() -> S>,
}

impl<S: RenderSurface> GridLayerBuilder<S> {
    pub fn new() -> Self {
        Self {
            config: GridConfig::default(),
            projection: None,
            points: Vec::new(),
            glyph_factory: None,
            surface: PhantomData,
        }
    }

    pub fn config(mut self, config: GridConfig) -> Self {
        self.config = config;
        self
    }

    pub fn projection(mut self, projection: Arc<dyn PixelProjection>) -> Self {
        self.projection = Some(projection);
        self
    }

    pub fn points(mut self, points: Vec<Point>) -> Self {
        self.points = points;
        self
    }

    pub fn glyph_factory(mut self, factory: GlyphFactory) -> Self {
        self.glyph_factory = Some(factory);
        self
    }

    pub fn build(self) -> GridResult<GridLayer<S>> {
        let projection = self.projection.ok_or_else(|| GridError::missing("projection"))?;
        self.config.validate()?;
        Ok(GridLayer {
            config: self.config,
            projection,
            points: self.points,
            glyph_factory: self.glyph_factory,
            surface: None,
            generation: Arc::new(AtomicU64::new(0)),
            in_flight: None,
            viewport: None,
        })
    }
}

impl<S: RenderSurface> Default for GridLayerBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Grid overlay bound to one render surface.
///
/// Building the layer does not draw. The first grid appears once the layer
/// is attached to a surface and [`GridLayer::add_grids`] is called with the
/// current viewport; every move or zoom afterwards redraws from scratch.
pub struct GridLayer<S: RenderSurface> {
    config: GridConfig,
    projection: Arc<dyn PixelProjection>,
    points: Vec<Point>,
    glyph_factory: Option<GlyphFactory>,
    surface: Option<Arc<Mutex<S>>>,
    /// Generation of the newest cycle; emissions of older cycles are stale
    generation: Arc<AtomicU64>,
    in_flight: Option<CycleHandle>,
    viewport: Option<Viewport>,
}

impl<S: RenderSurface> GridLayer<S> {
    pub fn builder() -> GridLayerBuilder<S> {
        GridLayerBuilder::new()
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Viewport of the latest cycle.
    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    pub fn in_flight(&self) -> Option<&CycleHandle> {
        self.in_flight.as_ref()
    }

    pub fn is_attached(&self) -> bool {
        self.surface.is_some()
    }

    /// Replace the point set; takes effect on the next cycle.
    pub fn set_points(&mut self, points: Vec<Point>) {
        self.points = points;
    }

    pub fn attach(&mut self, surface: Arc<Mutex<S>>) {
        if self.surface.is_some() {
            self.detach();
        }
        self.surface = Some(surface);
    }

    /// Cancel pending emissions, clear this layer's output and hand the
    /// surface back.
    pub fn detach(&mut self) -> Option<Arc<Mutex<S>>> {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.cancel_in_flight();
        let surface = self.surface.take()?;
        surface.lock().clear();
        Some(surface)
    }

    /// Draw the first grid for `viewport`.
    pub fn add_grids(&mut self, viewport: Viewport) -> GridResult<CycleSummary> {
        self.draw(viewport)
    }

    pub fn on_move_end(&mut self, viewport: Viewport) -> GridResult<CycleSummary> {
        self.draw(viewport)
    }

    pub fn on_zoom_end(&mut self, viewport: Viewport) -> GridResult<CycleSummary> {
        self.draw(viewport)
    }

    pub fn handle_event(&mut self, event: ViewportEvent) -> GridResult<CycleSummary> {
        match event {
            ViewportEvent::MoveEnd(viewport) => self.on_move_end(viewport),
            ViewportEvent::ZoomEnd(viewport) => self.on_zoom_end(viewport),
        }
    }

    /// Redraw on every event until the sender side is dropped.
    pub async fn listen(&mut self, mut events: mpsc::UnboundedReceiver<ViewportEvent>) -> GridResult<u64> {
        let mut cycles = 0;
        while let Some(event) = events.recv().await {
            log::trace!("viewport event {:?}", event);
            self.handle_event(event)?;
            cycles += 1;
        }
        Ok(cycles)
    }

    /// Wait for the current cycle's emissions to finish. Returns how many
    /// reached the surface.
    pub async fn settle(&mut self) -> usize {
        match self.in_flight.take() {
            Some(handle) => handle.join().await,
            None => 0,
        }
    }

    fn cancel_in_flight(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.cancel();
        }
    }

    fn draw(&mut self, viewport: Viewport) -> GridResult<CycleSummary> {
        let surface = self.surface.clone().ok_or(GridError::NotAttached)?;
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(GridError::missing("tokio runtime"));
        }
        viewport.validate()?;

        // an oversized grid is rejected before the previous output is touched
        let projection = self.projection.clone();
        let mut cycle = DrawCycle::begin(self.generation() + 1, viewport, &self.config, projection.as_ref())?;

        // retire the previous cycle before touching the surface
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.cancel_in_flight();
        surface.lock().clear();

        let cells = cycle.generate_cells(projection.as_ref());
        surface.lock().cells_generated(generation, &cells);

        let (plan, summary) = cycle.plan(&cells, &self.points, &self.config, self.glyph_factory.as_ref());
        if summary.dropped > 0 {
            log::warn!("cycle {}: dropped {} points", generation, summary.dropped);
        }
        log::debug!("cycle {}: {:?}", generation, summary);

        self.in_flight = Some(spawn_plan(plan, surface, self.generation.clone()));
        self.viewport = Some(viewport);
        Ok(summary)
    }
}

impl<S: RenderSurface> Drop for GridLayer<S> {
    fn drop(&mut self) {
        self.cancel_in_flight();
    }
}
