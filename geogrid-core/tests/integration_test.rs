use geogrid_core::*;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// 1 px == 1° of longitude == 0.5° of latitude at zoom 0
fn projection() -> LinearProjection {
    LinearProjection::new(360.0)
}

fn viewport(width: f64, height: f64) -> Viewport {
    Viewport::from_center(LatLng::new(0.0, 0.0), 0.0, PixelSize::new(width, height), &projection())
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn layer(points: Vec<Point>, config: GridConfig) -> GridLayer<RecordingSurface> {
    GridLayer::builder()
        .projection(Arc::new(projection()))
        .config(config)
        .points(points)
        .build()
        .unwrap()
}

#[test]
fn test_grid_160_by_160() {
    let proj = projection();
    let params = GridParams::for_viewport(&viewport(160.0, 160.0), 80.0, &proj).unwrap();
    let cells = generate_cells(&params, &proj);

    assert_eq!(cells.len(), 9);
    assert_eq!(cells.first().unwrap().id, "0:0");
    assert_eq!(cells.last().unwrap().id, "2:2");
}

#[test]
fn test_three_points_single_aggregate() {
    let proj = projection();
    let vp = viewport(160.0, 160.0);
    let cells = generate_cells(&GridParams::for_viewport(&vp, 80.0, &proj).unwrap(), &proj);
    let points = vec![
        Point::new("a", LatLng::new(5.0, -5.0)),
        Point::new("b", LatLng::new(35.0, -75.0)),
        Point::new("c", LatLng::new(20.0, -40.0)),
    ];

    let binning = bin_points(&cells, &points, &vp.bounds);
    assert_eq!(binning.aggregates.len(), 1);
    let only = &binning.aggregates[0];
    assert_eq!(only.cell_id, "1:1");
    assert_eq!(only.count, 3);
    let cell = cells.iter().find(|c| c.id == "1:1").unwrap();
    assert_eq!(only.position, cell.centroid);
}

#[test]
fn test_boundary_point_goes_to_first_cell() {
    let proj = projection();
    let vp = viewport(160.0, 160.0);
    let cells = generate_cells(&GridParams::for_viewport(&vp, 80.0, &proj).unwrap(), &proj);

    // lng 0 separates rows 1 and 2; lat 0 separates cols 1 and 2
    let on_vertical = Point::new("v", LatLng::new(20.0, 0.0));
    let on_horizontal = Point::new("h", LatLng::new(0.0, -40.0));
    let on_corner = Point::new("x", LatLng::new(0.0, 0.0));
    let points = vec![on_vertical, on_horizontal, on_corner];

    for _ in 0..2 {
        let binning = bin_points(&cells, &points, &vp.bounds);
        let placed: Vec<_> = binning
            .assignments
            .iter()
            .map(|a| (a.point_id.as_str(), a.cell_id.as_str()))
            .collect();
        assert_eq!(placed, vec![("v", "1:1"), ("h", "1:1"), ("x", "1:1")]);
    }
}

#[test]
fn test_viewport_edges_are_covered() {
    let proj = projection();
    let vp = viewport(150.0, 130.0);
    let cells = generate_cells(&GridParams::for_viewport(&vp, 80.0, &proj).unwrap(), &proj);
    let b = vp.bounds;
    let points = vec![
        Point::new("nw", LatLng::new(b.north, b.west)),
        Point::new("ne", LatLng::new(b.north, b.east)),
        Point::new("sw", LatLng::new(b.south, b.west)),
        Point::new("se", LatLng::new(b.south, b.east)),
        Point::new("mid", b.center()),
    ];
    let binning = bin_points(&cells, &points, &b);
    assert_eq!(binning.visible, 5);
    assert_eq!(binning.assignments.len(), 5);
    assert!(binning.dropped.is_empty());
}

#[test]
fn test_edges_covered_when_size_is_whole_cells() {
    let proj = LinearProjection::default();
    for zoom in [3.0, 7.0, 12.0] {
        for (lat, lng) in [(48.85, 2.35), (-33.87, 151.21), (40.71, -74.01), (1.29, 103.85), (-22.9, -43.2)] {
            let vp = Viewport::from_center(LatLng::new(lat, lng), zoom, PixelSize::new(1280.0, 800.0), &proj);
            let cells = generate_cells(&GridParams::for_viewport(&vp, 80.0, &proj).unwrap(), &proj);
            let b = vp.bounds;
            let points = vec![
                Point::new("ne", LatLng::new(b.north, b.east)),
                Point::new("se", LatLng::new(b.south, b.east)),
                Point::new("sw", LatLng::new(b.south, b.west)),
                Point::new("e", LatLng::new(b.center().lat, b.east)),
                Point::new("s", LatLng::new(b.south, b.center().lng)),
            ];
            let binning = bin_points(&cells, &points, &b);
            assert_eq!(binning.visible, 5);
            assert!(binning.dropped.is_empty(), "dropped {:?} at {} {} z{}", binning.dropped, lat, lng, zoom);
        }
    }
}

#[test]
fn test_malformed_and_outside_points() {
    init_logging();
    let proj = projection();
    let vp = viewport(160.0, 160.0);
    let cells = generate_cells(&GridParams::for_viewport(&vp, 80.0, &proj).unwrap(), &proj);
    let points = vec![
        Point::without_location("nowhere"),
        Point::new("bad-lat", LatLng::new(120.0, 0.0)),
        Point::new("outside", LatLng::new(-60.0, 170.0)),
        Point::new("ok", LatLng::new(-10.0, 10.0)),
    ];
    let binning = bin_points(&cells, &points, &vp.bounds);
    assert_eq!(binning.visible, 1);
    assert_eq!(binning.aggregates.len(), 1);
    assert_eq!(binning.aggregates[0].cell_id, "2:2");
    let dropped: Vec<_> = binning.dropped.iter().map(|d| d.point_id()).collect();
    assert_eq!(dropped, vec!["nowhere", "bad-lat"]);
}

#[tokio::test(start_paused = true)]
async fn test_cells_generated_precedes_emissions() {
    let surface = Arc::new(Mutex::new(RecordingSurface::new()));
    let mut layer = layer(vec![Point::new("a", LatLng::new(5.0, -5.0))], GridConfig::default());
    layer.attach(surface.clone());

    layer.add_grids(viewport(160.0, 160.0)).unwrap();
    {
        let surface = surface.lock();
        assert_eq!(surface.commands.len(), 2);
        assert_eq!(surface.commands[0], RenderCommand::Clear);
        match &surface.commands[1] {
            RenderCommand::CellsGenerated { generation, cell_ids } => {
                assert_eq!(*generation, 1);
                assert_eq!(cell_ids.len(), 9);
                assert_eq!(cell_ids[0], "0:0");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    assert_eq!(layer.settle().await, 10);
    let surface = surface.lock();
    let cells = surface.live_cell_ids();
    assert_eq!(cells.first(), Some(&"2:2"));
    assert_eq!(cells.last(), Some(&"0:0"));
}

#[tokio::test(start_paused = true)]
async fn test_rectangle_style_is_forwarded() {
    let surface = Arc::new(Mutex::new(RecordingSurface::new()));
    let mut config = GridConfig::default();
    config.style.color = "#c00".to_string();
    config.style.fill_opacity = 0.4;
    let mut layer = layer(Vec::new(), config);
    layer.attach(surface.clone());
    layer.add_grids(viewport(80.0, 80.0)).unwrap();
    layer.settle().await;

    let surface = surface.lock();
    for command in surface.live() {
        if let RenderCommand::AddCell { rectangle, .. } = command {
            assert_eq!(rectangle.style.color, "#c00");
            assert_eq!(rectangle.style.fill_opacity, 0.4);
        }
    }
    assert!(surface.live_glyphs().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_new_cycle_cancels_stale_emissions() {
    init_logging();
    let surface = Arc::new(Mutex::new(RecordingSurface::new()));
    let config = GridConfig::default().with_emission_delay(Duration::from_millis(100));
    let mut layer = layer(vec![Point::new("a", LatLng::new(5.0, -5.0))], config);
    layer.attach(surface.clone());

    let first = layer.add_grids(viewport(160.0, 160.0)).unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;
    let second = layer.on_move_end(viewport(240.0, 160.0)).unwrap();
    assert_eq!(second.generation, first.generation + 1);

    // long after both plans would have finished
    tokio::time::sleep(Duration::from_secs(5)).await;
    layer.settle().await;

    let surface = surface.lock();
    let stale: usize = surface
        .commands
        .iter()
        .filter(|c| matches!(c, RenderCommand::AddCell { generation: 1, .. } | RenderCommand::AddGlyph { generation: 1, .. }))
        .count();
    assert!(stale < first.scheduled, "first cycle should have been cut short");

    let live = surface.live();
    assert!(live.iter().all(|c| match c {
        RenderCommand::AddCell { generation, .. } | RenderCommand::AddGlyph { generation, .. } => *generation == 2,
        RenderCommand::CellsGenerated { generation, .. } => *generation == 2,
        RenderCommand::Clear => false,
    }));
    assert_eq!(surface.live_cell_ids().len(), second.cells);
}

#[tokio::test(start_paused = true)]
async fn test_listen_redraws_per_event() {
    let surface = Arc::new(Mutex::new(RecordingSurface::new()));
    let mut layer = layer(vec![Point::new("a", LatLng::new(5.0, -5.0))], GridConfig::default());
    layer.attach(surface.clone());

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    tx.send(ViewportEvent::MoveEnd(viewport(160.0, 160.0))).unwrap();
    tx.send(ViewportEvent::ZoomEnd(Viewport::from_center(
        LatLng::new(0.0, 0.0),
        1.0,
        PixelSize::new(160.0, 160.0),
        &projection(),
    )))
    .unwrap();
    drop(tx);

    let cycles = layer.listen(rx).await.unwrap();
    assert_eq!(cycles, 2);
    assert_eq!(layer.generation(), 2);
    assert_eq!(layer.viewport().unwrap().zoom, 1.0);
    layer.settle().await;

    let surface = surface.lock();
    let clears = surface.commands.iter().filter(|c| **c == RenderCommand::Clear).count();
    assert_eq!(clears, 2);
    assert_eq!(surface.live_glyphs().len(), 1);
}

#[tokio::test]
async fn test_custom_glyph_factory_receives_points() {
    let surface = Arc::new(Mutex::new(RecordingSurface::new()));
    let mut layer = GridLayer::builder()
        .projection(Arc::new(projection()))
        .points(vec![
            Point::new("a", LatLng::new(5.0, -5.0)),
            Point::new("b", LatLng::new(6.0, -6.0)),
            Point::new("c", LatLng::new(-30.0, 70.0)),
        ])
        .glyph_factory(count_badge_factory())
        .build()
        .unwrap();
    layer.attach(surface.clone());
    layer.add_grids(viewport(160.0, 160.0)).unwrap();
    layer.settle().await;

    let surface = surface.lock();
    let mut glyphs: Vec<_> = surface
        .live_glyphs()
        .into_iter()
        .map(|g| (g.cell_id.clone(), g.points.len(), g.icon.html.clone().unwrap_or_default()))
        .collect();
    glyphs.sort();
    assert_eq!(
        glyphs,
        vec![
            ("1:1".to_string(), 2, "<div><span>2</span></div>".to_string()),
            ("2:2".to_string(), 1, "<div><span>1</span></div>".to_string()),
        ]
    );
}
