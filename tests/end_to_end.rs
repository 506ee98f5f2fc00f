use canopy3d::io::layout::{read_layout, write_layout};
use canopy3d::sim::cancel::CancelToken;
use canopy3d::sim::design::{plan_layout, solve_layout};
use canopy3d::sim::lighting::config::PlacementConfig;
use canopy3d::sim::lighting::placement::required_count;
use canopy3d::sim::lighting::sources::SourceModel;
use canopy3d::{
    DesignSession, EngineConfig, EngineError, Geometry, Obstacle, Point, Room, SourceCatalog,
    UnitSystem,
};

fn grow_room() -> (Geometry, SourceCatalog, EngineConfig) {
    let geometry = Geometry::new(
        Room::new(66.0, 22.0, 10.0).with_units(UnitSystem::Imperial),
        vec![],
    )
    .unwrap();
    let model = SourceModel::new("bar-1700", 1700.0, 680.0, 16.0, 3.0)
        .with_footprint(4.0, 4.0)
        .with_emitter_samples(4);
    let catalog = SourceCatalog::from_models([model]).unwrap();

    let mut config = EngineConfig::new();
    config.layout.surface_width = 4.0;
    config.layout.surface_depth = 8.0;
    config.layout.aisle_width = 2.0;
    config.layout.perimeter_clearance = 1.0;
    config.placement = PlacementConfig::for_model("bar-1700");
    config.grid.resolution = 1.0;
    config.grid.canopy_height = 3.0;
    config.targets.target_average = Some(850.0);
    config.targets.tolerance_avg = 85.0;
    config.targets.target_uniformity = Some(0.8);
    config.targets.photoperiod_hours = 12.0;
    (geometry, catalog, config)
}

fn small_room() -> (Geometry, SourceCatalog, EngineConfig) {
    let geometry = Geometry::new(
        Room::new(9.0, 5.0, 3.0),
        vec![Obstacle::column(4.5, 2.5, 0.4, 0.1)],
    )
    .unwrap();
    let catalog =
        SourceCatalog::from_models([SourceModel::new("m", 1200.0, 480.0, 2.0, 0.8)]).unwrap();
    let mut config = EngineConfig::new();
    config.placement = PlacementConfig::for_model("m");
    config.grid.resolution = 0.5;
    (geometry, catalog, config)
}

#[test]
fn test_plan_matches_coverage_count() {
    let (geometry, catalog, config) = grow_room();
    let layout = plan_layout(&geometry, &catalog, &config).unwrap();

    assert_eq!(layout.grow_surfaces.len(), 22);
    let area: f64 = layout.grow_surfaces.iter().map(|s| s.area()).sum();
    assert!((area - 704.0).abs() < 1e-9);

    let model = catalog.model("bar-1700").unwrap();
    assert_eq!(required_count(area, model, &config.placement), 44);
    assert_eq!(layout.source_instances.len(), 44);
    for s in &layout.source_instances {
        assert!((s.position.z - 6.0).abs() < 1e-9, "mounted 3 ft above the canopy");
    }
}

#[test]
fn test_optimizer_meets_targets() {
    let (geometry, catalog, config) = grow_room();
    let mut session = DesignSession::new(geometry, catalog, config).unwrap();
    session.generate().unwrap();

    let out = session.optimize().unwrap().expect("not cancelled");
    let m = out.solution.metrics;
    assert_eq!(out.iterations, 2);
    assert!((m.average - 850.0).abs() <= 85.0, "average {}", m.average);
    assert!(m.uniformity >= 0.8, "uniformity {}", m.uniformity);
    assert!(out.dimming < 1.0);

    let count = out.layout.source_instances.len();
    assert!((44..=88).contains(&count), "{count} sources");
    assert_eq!(m.active_sources, count);
    assert!((m.daily_light_integral - m.average * 12.0 * 3600.0 / 1.0e6).abs() < 1e-9);

    // The optimized layout is adopted and its solution cached
    assert!(!session.is_dirty());
    assert_eq!(session.metrics().unwrap(), m);
}

#[test]
fn test_point_sources_skip_repeated_layouts() {
    let (geometry, _, mut config) = grow_room();
    let catalog =
        SourceCatalog::from_models([SourceModel::new("bar-1700", 1700.0, 680.0, 16.0, 3.0)])
            .unwrap();
    config.layout.surface_width = 5.0;
    config.layout.surface_depth = 10.0;

    let layout = plan_layout(&geometry, &catalog, &config).unwrap();
    assert_eq!(layout.grow_surfaces.len(), 9);
    let area: f64 = layout.grow_surfaces.iter().map(|s| s.area()).sum();
    assert!((area - 450.0).abs() < 1e-9);
    let model = catalog.model("bar-1700").unwrap();
    assert_eq!(required_count(area, model, &config.placement), 29);

    let mut session = DesignSession::new(geometry, catalog, config).unwrap();
    session.generate().unwrap();
    let out = session.optimize().unwrap().expect("not cancelled");
    let m = out.solution.metrics;
    // Density 1.15 places as many sources as 1.0 and is never solved
    assert_eq!(out.iterations, 2);
    assert_eq!(out.trials.len(), 2);
    assert_ne!(out.trials[0].sources, out.trials[1].sources);
    assert!((out.density_scale - 1.3).abs() < 1e-9);
    assert_eq!(out.layout.source_instances.len(), 42);
    assert!((m.average - 850.0).abs() <= 85.0, "average {}", m.average);
    assert!(m.uniformity >= 0.8, "uniformity {}", m.uniformity);
}

#[test]
fn test_unreachable_target_keeps_layout() {
    let (geometry, catalog, mut config) = grow_room();
    config.targets.target_average = Some(1.0e5);
    config.optimizer.max_iterations = 3;
    let mut session = DesignSession::new(geometry, catalog, config).unwrap();
    let before = session.generate().unwrap().clone();

    match session.optimize() {
        Err(EngineError::TargetUnreachable { best, delta }) => {
            assert_eq!(best.iterations, 3);
            let sources: Vec<_> = best.trials.iter().map(|t| t.sources).collect();
            assert_eq!(sources, vec![44, 52, 60]);
            assert!(delta.average < 0.0);
            assert!(best.solution.metrics.average > 0.0);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(session.layout(), &before);
}

#[test]
fn test_surfaces_do_not_overlap() {
    let (geometry, catalog, mut config) = small_room();
    config.layout.auto_orient = true;
    let layout = plan_layout(&geometry, &catalog, &config).unwrap();
    let surfaces = &layout.grow_surfaces;
    assert!(!surfaces.is_empty());

    for (i, a) in surfaces.iter().enumerate() {
        let fa = a.footprint();
        assert!(geometry.rect_within_floor(&fa, config.layout.perimeter_clearance));
        assert!(!geometry.rect_intersects_obstacle(&fa, config.layout.obstacle_clearance));
        for b in &surfaces[i + 1..] {
            assert!(!fa.overlaps(&b.footprint()), "{} overlaps {}", a.id, b.id);
        }
    }
}

#[test]
fn test_flux_and_dimming_scale_linearly() {
    let (geometry, catalog, config) = small_room();
    let layout = plan_layout(&geometry, &catalog, &config).unwrap();
    let base = solve_layout(&geometry, &catalog, &layout, &config, &CancelToken::never()).unwrap();

    let bright =
        SourceCatalog::from_models([SourceModel::new("m", 3600.0, 480.0, 2.0, 0.8)]).unwrap();
    let tripled = solve_layout(&geometry, &bright, &layout, &config, &CancelToken::never()).unwrap();
    for (a, b) in base.grid.values.iter().zip(&tripled.grid.values) {
        assert!((b - 3.0 * a).abs() <= 1e-9 * a.max(1.0));
    }

    let mut dimmed = layout.clone();
    for s in &mut dimmed.source_instances {
        s.set_dimming(0.25).unwrap();
    }
    let quarter = solve_layout(&geometry, &catalog, &dimmed, &config, &CancelToken::never()).unwrap();
    assert!((quarter.metrics.average - 0.25 * base.metrics.average).abs() < 1e-9);
    assert!((quarter.metrics.uniformity - base.metrics.uniformity).abs() < 1e-9);
}

#[test]
fn test_uniformity_stays_in_unit_range() {
    let (geometry, catalog, config) = small_room();
    let mut session = DesignSession::new(geometry, catalog, config).unwrap();
    session.generate().unwrap();

    // Deterministic scatter of extra sources, some outside the canopy
    let mut state: u64 = 0x2545_f491;
    for _ in 0..12 {
        state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        let x = (state >> 33) as f64 / (1u64 << 31) as f64 * 9.0;
        let y = ((state >> 11) & 0xffff) as f64 / 65536.0 * 5.0;
        session.add_source("m", Point::new(x, y, 1.5 + x / 9.0)).unwrap();

        let m = session.metrics().unwrap();
        assert!((0.0..=1.0).contains(&m.uniformity), "uniformity {}", m.uniformity);
        assert!(m.min <= m.average && m.average <= m.max);
    }
}

#[test]
fn test_only_latest_solve_delivers_across_threads() {
    let (geometry, catalog, config) = small_room();
    let mut session = DesignSession::new(geometry, catalog, config).unwrap();
    session.generate().unwrap();

    let first = session.begin_solve();
    let second = session.begin_solve();
    let handles = [first, second].map(|request| std::thread::spawn(move || request.run()));
    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();

    assert!(results[0].is_none());
    let delivered: Vec<_> = results.into_iter().flatten().collect();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].revision, session.revision());
    let solved = delivered.into_iter().next().unwrap();
    assert!(session.install(solved));
    assert!(!session.is_dirty());
}

#[test]
fn test_cancelled_gate_abandons_solve() {
    let (geometry, catalog, config) = small_room();
    let mut session = DesignSession::new(geometry, catalog, config).unwrap();
    session.generate().unwrap();

    let request = session.begin_solve();
    session.gate().cancel();
    assert!(request.is_cancelled());
    assert!(request.run().unwrap().is_none());
    assert!(session.is_dirty());
}

#[test]
fn test_export_import_round_trip() -> anyhow::Result<()> {
    let (geometry, catalog, config) = small_room();
    let mut session = DesignSession::new(geometry.clone(), catalog.clone(), config.clone())?;
    session.generate()?;
    let id = session.layout().source_instances[0].id.clone();
    session.set_dimming(&id, 0.6)?;
    session.set_circuit(&id, Some("C2".to_string()))?;

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("layout.json");
    write_layout(&path, &session.export_record()?)?;

    let record = read_layout(&path)?;
    let mut restored = DesignSession::new(geometry, catalog, config)?;
    restored.import_record(&record)?;
    assert_eq!(restored.layout(), session.layout());
    assert_eq!(restored.metrics()?, session.metrics()?);
    assert_eq!(record.to_grid()?.map(|g| g.values), Some(session.solution()?.grid.values.clone()));
    Ok(())
}
