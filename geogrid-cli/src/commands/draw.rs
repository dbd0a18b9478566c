//! Draw command implementation - run draw cycles over a point set and export the render commands

use anyhow::{Context, Result};
use geogrid_core::{
    count_badge_factory, CycleSummary, GridConfig, GridLayer, LatLng, LatLngBounds, LinearProjection,
    PixelProjection, PixelSize, Point, RecordingSurface, RenderCommand, Viewport, ViewportEvent,
};
use parking_lot::Mutex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::error::{CliError, CliResult};

pub struct DrawArgs {
    pub points: PathBuf,
    pub out: Option<PathBuf>,
    pub center: Option<String>,
    pub zoom: f64,
    pub bounds: Option<String>,
    pub size: String,
    pub then: Vec<String>,
    pub cell_size: Option<f64>,
    pub delay_ms: Option<u64>,
    pub count_badges: bool,
}

#[derive(Debug, Serialize)]
struct DrawReport<'a> {
    generated_at: String,
    version: &'static str,
    grid: &'a GridConfig,
    cycles: Vec<CycleRecord>,
}

#[derive(Debug, Serialize)]
struct CycleRecord {
    trigger: &'static str,
    viewport: Viewport,
    summary: CycleSummary,
    emitted: usize,
    commands: Vec<RenderCommand>,
}

pub async fn execute(config: &Config, args: DrawArgs) -> Result<()> {
    log::info!("Starting grid draw");
    log::info!("Point set: {}", args.points.display());

    let points = load_points(&args.points)?;
    log::info!("Loaded {} points", points.len());

    let mut grid = config.grid.clone();
    if let Some(cell_size) = args.cell_size {
        grid.cell_size = cell_size;
    }
    if let Some(delay_ms) = args.delay_ms {
        grid.emission_delay_ms = delay_ms;
    }

    let projection = Arc::new(LinearProjection::new(config.output.tile_size));
    let size = parse_size(&args.size)?;
    let first = match (&args.center, &args.bounds) {
        (_, Some(bounds)) => fit_bounds(&parse_bounds(bounds)?, size, projection.as_ref()),
        (Some(center), None) => {
            Viewport::from_center(parse_lat_lng("--center", center)?.0, args.zoom, size, projection.as_ref())
        }
        (None, None) => {
            return Err(CliError::invalid_argument("--center", "either --center or --bounds is required").into())
        }
    };
    let events = follow_up_events(&args.then, &first, projection.as_ref())?;

    let mut builder = GridLayer::builder()
        .projection(projection.clone())
        .config(grid.clone())
        .points(points);
    if args.count_badges {
        builder = builder.glyph_factory(count_badge_factory());
    }
    let mut layer = builder.build().map_err(CliError::from)?;

    let surface = Arc::new(Mutex::new(RecordingSurface::new()));
    layer.attach(surface.clone());

    let mut cycles = Vec::with_capacity(events.len() + 1);
    let summary = layer.add_grids(first).map_err(CliError::from)?;
    cycles.push(record_cycle(&mut layer, &surface, "add", first, summary, config.output.live_only).await);

    for event in events {
        let (trigger, viewport) = match &event {
            ViewportEvent::MoveEnd(vp) => ("move_end", *vp),
            ViewportEvent::ZoomEnd(vp) => ("zoom_end", *vp),
        };
        let summary = layer.handle_event(event).map_err(CliError::from)?;
        cycles.push(record_cycle(&mut layer, &surface, trigger, viewport, summary, config.output.live_only).await);
    }
    layer.detach();

    let report = DrawReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        version: geogrid_core::VERSION,
        grid: &grid,
        cycles,
    };
    let json = if config.output.pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    }
    .context("Failed to serialize draw report")?;

    match args.out {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("Failed to write output file: {}", path.display()))?;
            log::info!("Wrote {} cycles to {}", report.cycles.len(), path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}

async fn record_cycle(
    layer: &mut GridLayer<RecordingSurface>,
    surface: &Arc<Mutex<RecordingSurface>>,
    trigger: &'static str,
    viewport: Viewport,
    summary: CycleSummary,
    live_only: bool,
) -> CycleRecord {
    let emitted = layer.settle().await;
    log::info!(
        "Cycle {} ({}): {} cells, {} aggregates, {} emitted",
        summary.generation,
        trigger,
        summary.cells,
        summary.aggregates,
        emitted
    );

    let recorded = RecordingSurface {
        commands: std::mem::take(&mut surface.lock().commands),
    };
    let commands = if live_only {
        recorded.live().to_vec()
    } else {
        recorded.commands
    };

    CycleRecord {
        trigger,
        viewport,
        summary,
        emitted,
        commands,
    }
}

fn load_points(path: &Path) -> Result<Vec<Point>> {
    if !path.exists() {
        return Err(CliError::file_not_found(path.to_path_buf()).into());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read point set: {}", path.display()))?;
    let points: Vec<Point> = serde_json::from_str(&content)
        .map_err(|e| CliError::parse(path.display().to_string(), e.to_string()))?;
    Ok(points)
}

fn parse_numbers(arg: &str, value: &str) -> CliResult<Vec<f64>> {
    value
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|_| CliError::invalid_argument(arg, format!("'{}' is not a number", part.trim())))
        })
        .collect()
}

/// Parse 'lat,lng' with an optional third zoom component.
fn parse_lat_lng(arg: &str, value: &str) -> CliResult<(LatLng, Option<f64>)> {
    match parse_numbers(arg, value)?.as_slice() {
        [lat, lng] => Ok((LatLng::new(*lat, *lng), None)),
        [lat, lng, zoom] => Ok((LatLng::new(*lat, *lng), Some(*zoom))),
        _ => Err(CliError::invalid_argument(arg, format!("expected 'lat,lng[,zoom]', got '{}'", value))),
    }
}

fn parse_bounds(value: &str) -> CliResult<LatLngBounds> {
    match parse_numbers("--bounds", value)?.as_slice() {
        [south, west, north, east] if south < north && west < east => {
            Ok(LatLngBounds::new(*south, *west, *north, *east))
        }
        [_, _, _, _] => Err(CliError::invalid_argument("--bounds", "south/west must be below north/east")),
        _ => Err(CliError::invalid_argument(
            "--bounds",
            format!("expected 'south,west,north,east', got '{}'", value),
        )),
    }
}

fn parse_size(value: &str) -> CliResult<PixelSize> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| CliError::invalid_argument("--size", format!("missing 'x' in '{}'", value)))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .ok_or_else(|| CliError::invalid_argument("--size", format!("'{}' is not a pixel count", part)))
    };
    Ok(PixelSize::new(parse(width)?, parse(height)?))
}

/// Largest zoom at which `bounds` still fits inside a viewport of `size`.
fn fit_bounds(bounds: &LatLngBounds, size: PixelSize, projection: &dyn PixelProjection) -> Viewport {
    let nw = projection.project(bounds.north_west(), 0.0);
    let se = projection.project(bounds.south_east(), 0.0);
    let span_x = (se.x - nw.x).abs().max(f64::EPSILON);
    let span_y = (se.y - nw.y).abs().max(f64::EPSILON);
    let zoom = (size.width / span_x).min(size.height / span_y).log2();
    let zoom = if zoom.is_finite() { zoom } else { 0.0 };
    Viewport::from_center(bounds.center(), zoom, size, projection)
}

fn follow_up_events(
    follow_ups: &[String],
    first: &Viewport,
    projection: &dyn PixelProjection,
) -> CliResult<Vec<ViewportEvent>> {
    let mut zoom = first.zoom;
    let mut events = Vec::with_capacity(follow_ups.len());
    for value in follow_ups {
        let (center, next_zoom) = parse_lat_lng("--then", value)?;
        let next_zoom = next_zoom.unwrap_or(zoom);
        let viewport = Viewport::from_center(center, next_zoom, first.size, projection);
        if next_zoom != zoom {
            events.push(ViewportEvent::ZoomEnd(viewport));
        } else {
            events.push(ViewportEvent::MoveEnd(viewport));
        }
        zoom = next_zoom;
    }
    Ok(events)
}
