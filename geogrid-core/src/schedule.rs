//! Staggered emission
//!
//! A draw cycle turns its cells and aggregates into an [`EmissionPlan`]: an
//! explicit list of tasks, each with a nominal offset from the start of the
//! cycle. Items are released in reverse generation order, item `i` at
//! `delay * i`, so overlapping markers paint back-to-front. Rectangles and
//! glyphs share the clock; on equal offsets rectangles go first.
//!
//! The plan runs as one spawned task per cycle. Starting a new cycle aborts
//! the previous task and bumps the shared generation counter, so a stale
//! emission can never reach the surface.

use crate::glyph::{create_icon, GlyphFactory, Icon, MarkerInfo};
use crate::surface::{CellRectangle, GlyphMarker, RenderSurface};
use crate::config::CellStyle;
use crate::types::{AggregateCell, GridCell};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

#[derive(Debug, Clone, PartialEq)]
pub enum Emission {
    Cell(CellRectangle),
    Glyph(GlyphMarker),
}

impl Emission {
    pub fn cell_id(&self) -> &str {
        match self {
            Emission::Cell(rectangle) => &rectangle.cell_id,
            Emission::Glyph(glyph) => &glyph.cell_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledEmission {
    /// Nominal offset from the start of the cycle
    pub at: Duration,
    pub item: Emission,
}

/// Every emission of one draw cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionPlan {
    pub generation: u64,
    tasks: Vec<ScheduledEmission>,
}

fn offset(delay: Duration, index: usize) -> Duration {
    delay.saturating_mul(u32::try_from(index).unwrap_or(u32::MAX))
}

impl EmissionPlan {
    pub fn new(generation: u64) -> Self {
        Self { generation, tasks: Vec::new() }
    }

    /// Queue one rectangle per cell, last-generated first. Cells whose id is
    /// already in `loaded` are skipped but still consume their time slot.
    /// Returns how many rectangles were queued.
    pub fn schedule_cells(
        &mut self,
        cells: &[GridCell],
        style: &CellStyle,
        delay: Duration,
        loaded: &mut HashSet<String>,
    ) -> usize {
        let mut queued = 0;
        for (i, cell) in cells.iter().rev().enumerate() {
            if !loaded.insert(cell.id.clone()) {
                log::trace!("cell {} already scheduled this cycle", cell.id);
                continue;
            }
            self.tasks.push(ScheduledEmission {
                at: offset(delay, i),
                item: Emission::Cell(CellRectangle {
                    cell_id: cell.id.clone(),
                    bounds: cell.bounds,
                    style: style.clone(),
                }),
            });
            queued += 1;
        }
        queued
    }

    /// Queue one glyph per aggregate, last first.
    pub fn schedule_glyphs(
        &mut self,
        aggregates: &[AggregateCell],
        delay: Duration,
        factory: Option<&GlyphFactory>,
        default_icon: &Icon,
    ) -> usize {
        for (i, aggregate) in aggregates.iter().rev().enumerate() {
            let icon = create_icon(factory, default_icon, &MarkerInfo::from_aggregate(aggregate));
            self.tasks.push(ScheduledEmission {
                at: offset(delay, i),
                item: Emission::Glyph(GlyphMarker {
                    cell_id: aggregate.cell_id.clone(),
                    position: aggregate.position,
                    icon,
                    points: aggregate.members.clone(),
                }),
            });
        }
        aggregates.len()
    }

    pub fn tasks(&self) -> &[ScheduledEmission] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks in release order. The sort is stable, so rectangles (queued
    /// first) win ties and each kind keeps its reversed order.
    pub fn into_release_order(self) -> Vec<ScheduledEmission> {
        let mut tasks = self.tasks;
        tasks.sort_by_key(|t| t.at);
        tasks
    }
}

/// Handle on the running plan of one cycle.
#[derive(Debug)]
pub struct CycleHandle {
    pub generation: u64,
    scheduled: usize,
    emitted: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl CycleHandle {
    pub fn scheduled(&self) -> usize {
        self.scheduled
    }

    pub fn emitted(&self) -> usize {
        self.emitted.load(Ordering::Acquire)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop releasing this cycle's emissions.
    pub fn cancel(&self) {
        if !self.task.is_finished() {
            log::debug!(
                "cancelling cycle {} with {}/{} emissions released",
                self.generation,
                self.emitted(),
                self.scheduled
            );
        }
        self.task.abort();
    }

    /// Wait until the plan has run out (or was cancelled) and return the
    /// number of emissions that reached the surface.
    pub async fn join(self) -> usize {
        let emitted = self.emitted.clone();
        if let Err(err) = self.task.await {
            if !err.is_cancelled() {
                log::warn!("emission task for cycle {} failed: {}", self.generation, err);
            }
        }
        emitted.load(Ordering::Acquire)
    }
}

/// Run `plan` on the current tokio runtime. Each emission waits until its
/// offset past the call, then checks that its cycle is still `current` before touching the
/// surface.
pub fn spawn_plan<S: RenderSurface>(
    plan: EmissionPlan,
    surface: Arc<Mutex<S>>,
    current: Arc<AtomicU64>,
) -> CycleHandle {
    let generation = plan.generation;
    let scheduled = plan.len();
    let emitted = Arc::new(AtomicUsize::new(0));
    let counter = emitted.clone();
    let tasks = plan.into_release_order();
    // offsets count from the moment the plan is handed over, not from the
    // task's first poll
    let start = Instant::now();

    let task = tokio::spawn(async move {
        for task in tasks {
            sleep_until(start + task.at).await;
            // checked under the lock so a concurrent clear cannot interleave
            let mut surface = surface.lock();
            if current.load(Ordering::Acquire) != generation {
                log::debug!("dropping stale emissions of cycle {}", generation);
                return;
            }
            match task.item {
                Emission::Cell(rectangle) => surface.add_cell(generation, rectangle),
                Emission::Glyph(glyph) => surface.add_glyph(generation, glyph),
            }
            counter.fetch_add(1, Ordering::Release);
        }
        log::trace!("cycle {} released all {} emissions", generation, counter.load(Ordering::Acquire));
    });

    CycleHandle {
        generation,
        scheduled,
        emitted,
        task,
    }
}
