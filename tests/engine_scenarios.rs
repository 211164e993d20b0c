//! End-to-end scenarios driving the engine the way a scrolling host does.

mod common;

use std::fs;

use common::{FakeHost, date, engine_with_journal, entry, journal_events, quiet_engine, single};
use timelane::core::config::Config;
use timelane::engine::{EngineEvent, LayoutReport, TimelineEngine};
use timelane::layout::day_index::Placement;
use timelane::logger::jsonl::JsonlWriter;
use timelane::viewport::zoom_store::{FileZoomStore, ZoomStore};
use timelane::window::edge_trigger::{EdgeState, ScrollSample};
use timelane::window::manager::{Direction, ExtendOutcome};

fn limit_events(events: &[EngineEvent], direction: Direction) -> usize {
    events
        .iter()
        .filter(|e| **e == EngineEvent::LimitReached { direction })
        .count()
}

#[test]
fn scrolling_up_extends_until_the_limit() {
    let mut engine = quiet_engine(date(2024, 3, 15));
    let mut host = FakeHost::new(400.0);
    let mut events = Vec::new();
    let mut extensions = 0;

    for _ in 0..20 {
        host.wait(3_000);
        host.scroll_to(&mut engine, 400.0);
        let out = host.scroll_to(&mut engine, 100.0);
        if let Some(ext) = out.extension {
            assert_eq!(ext.direction, Direction::Past);
            extensions += 1;
            let fix = host.lay_out(&mut engine).expect("past extension is corrected");
            assert!(fix.height_delta > 0.0);
            assert!((fix.new_offset - (100.0 + fix.height_delta)).abs() < 1e-9);
        }
        events.extend(engine.drain_events());
        assert!(engine.window().past_months() <= 24);
    }

    assert_eq!(extensions, 12);
    assert_eq!(engine.window().past_months(), 24);
    assert_eq!(limit_events(&events, Direction::Past), 1);
    assert_eq!(engine.edge_state(Direction::Past), EdgeState::Disabled);
    assert_eq!(engine.day_index().first_date(), Some(date(2022, 3, 1)));
}

#[test]
fn scrolling_down_extends_without_correction() {
    let mut engine = quiet_engine(date(2024, 3, 15));
    let mut host = FakeHost::new(0.0);
    // 90 rows of 32px: bottom resting offset is 2880 - 600
    host.scroll_to(&mut engine, 2_000.0);
    let out = host.scroll_to(&mut engine, 2_200.0);
    let ext = out.extension.expect("future extension fires");
    assert_eq!(ext.direction, Direction::Future);
    assert_eq!(ext.outcome, ExtendOutcome::Extended { from: 1, to: 3 });
    assert_eq!(engine.day_index().last_date(), Some(date(2024, 6, 30)));

    assert!(host.lay_out(&mut engine).is_none());
    assert!(!engine.extension_pending());
    assert!(matches!(
        engine.edge_state(Direction::Future),
        EdgeState::Cooldown { .. }
    ));
}

#[test]
fn resting_at_absolute_edges_never_extends() {
    let mut engine = quiet_engine(date(2024, 3, 15));
    let mut host = FakeHost::new(0.0);
    host.scroll_to(&mut engine, 120.0);
    assert!(host.scroll_to(&mut engine, 0.0).extension.is_none());

    host.scroll_to(&mut engine, 2_100.0);
    assert!(host.scroll_to(&mut engine, 2_280.0).extension.is_none());
    assert_eq!(engine.window().past_months(), 1);
    assert_eq!(engine.window().future_months(), 1);
}

#[test]
fn zero_growth_disables_the_edge_once() {
    let mut engine = quiet_engine(date(2024, 3, 15));
    let mut host = FakeHost::new(0.0);
    let before = FakeHost::content_height(&engine);
    host.scroll_to(&mut engine, 400.0);
    assert!(host.scroll_to(&mut engine, 100.0).extension.is_some());

    // The host failed to render anything new.
    let fix = engine
        .after_layout(LayoutReport {
            content_height: before,
            month_offsets: Vec::new(),
        })
        .expect("past extension still reports an offset");
    assert!((fix.new_offset - 100.0).abs() < f64::EPSILON);
    assert_eq!(engine.edge_state(Direction::Past), EdgeState::Disabled);

    host.wait(10_000);
    host.scroll_to(&mut engine, 400.0);
    assert!(host.scroll_to(&mut engine, 100.0).extension.is_none());
    assert_eq!(limit_events(&engine.drain_events(), Direction::Past), 1);

    engine.recenter(date(2024, 3, 15)).unwrap();
    assert_eq!(engine.edge_state(Direction::Past), EdgeState::Idle);
}

#[test]
fn recenter_while_pending_skips_correction() {
    let mut engine = quiet_engine(date(2024, 3, 15));
    let mut host = FakeHost::new(0.0);
    host.scroll_to(&mut engine, 400.0);
    assert!(host.scroll_to(&mut engine, 100.0).extension.is_some());
    assert!(engine.extension_pending());

    engine.recenter(date(2024, 9, 1)).unwrap();
    assert!(host.lay_out(&mut engine).is_none());
    assert!(!engine.extension_pending());
    assert_eq!(engine.day_index().first_date(), Some(date(2024, 8, 1)));
}

#[test]
fn host_extend_is_refused_while_scroll_extension_pending() {
    let mut engine = quiet_engine(date(2024, 3, 15));
    let mut host = FakeHost::new(0.0);
    host.scroll_to(&mut engine, 400.0);
    host.scroll_to(&mut engine, 100.0);
    assert!(!engine.extend(Direction::Future, 2, host.clock));
    assert_eq!(engine.window().future_months(), 1);

    host.lay_out(&mut engine);
    assert!(engine.extend(Direction::Future, 2, host.clock));
    assert_eq!(engine.window().future_months(), 3);
}

#[test]
fn scroll_extension_waits_for_host_extension() {
    let mut engine = quiet_engine(date(2024, 3, 15));
    let mut host = FakeHost::new(0.0);
    host.scroll_to(&mut engine, 1_000.0);
    assert!(engine.extend(Direction::Future, 2, host.clock));

    host.scroll_to(&mut engine, 400.0);
    assert!(host.scroll_to(&mut engine, 100.0).extension.is_none());
    assert!(host.lay_out(&mut engine).is_none());

    host.wait(60_000);
    host.scroll_to(&mut engine, 400.0);
    let ext = host
        .scroll_to(&mut engine, 100.0)
        .extension
        .expect("past edge is free again");
    assert_eq!(ext.direction, Direction::Past);
    assert!(host.lay_out(&mut engine).is_some());
    assert!(!engine.extension_pending());
    assert_eq!(limit_events(&engine.drain_events(), Direction::Past), 0);
}

#[test]
fn past_extension_on_capped_window_compensates_prepended_rows() {
    let mut engine = quiet_engine(date(2024, 3, 15));
    engine.set_window(date(2024, 3, 15), 11, 24).unwrap();
    assert!(!engine.materialized_window().clamped);
    engine.drain_events();

    let mut host = FakeHost::new(0.0);
    host.scroll_to(&mut engine, 400.0);
    let ext = host
        .scroll_to(&mut engine, 100.0)
        .extension
        .expect("past extension fires");
    assert_eq!(ext.outcome, ExtendOutcome::Extended { from: 11, to: 13 });
    assert!(engine.materialized_window().clamped);
    assert_eq!(engine.day_index().first_date(), Some(date(2023, 2, 1)));
    assert_eq!(engine.day_index().last_date(), Some(date(2026, 1, 31)));

    // 59 days prepended, 59 days cut from the bottom.
    let fix = host.lay_out(&mut engine).expect("past extension is corrected");
    assert!(fix.height_delta.abs() < 1e-9);
    assert!((fix.new_offset - (100.0 + 59.0 * 32.0)).abs() < 1e-9);
    assert!(matches!(
        engine.edge_state(Direction::Past),
        EdgeState::Cooldown { .. }
    ));
    assert_eq!(limit_events(&engine.drain_events(), Direction::Past), 0);
}

#[test]
fn entries_flow_into_the_day_index() {
    let mut engine = quiet_engine(date(2024, 3, 15));
    engine.ingest_entries(vec![
        entry("E1", "2024-03-01", "2024-03-05"),
        entry("E2", "2024-03-03", "2024-03-08"),
        entry("E3", "2024-03-10", "2024-03-12"),
        entry("long", "2024-01-10", "2024-04-20"),
        single("gala", "2024-03-03"),
        entry("elsewhere", "2030-01-01", "2030-01-02"),
    ]);

    let lanes = engine.lane_assignment();
    assert_eq!(lanes.lane_of("long"), Some(0));
    assert_eq!(lanes.lane_of("E1"), Some(1));
    assert_eq!(lanes.lane_of("E2"), Some(2));
    assert_eq!(lanes.lane_of("gala"), Some(3));
    assert_eq!(lanes.lane_of("E3"), Some(1));
    assert_eq!(lanes.lane_of("elsewhere"), Some(0));

    let idx = engine.day_index();
    let feb1 = idx.cell(date(2024, 2, 1)).unwrap();
    assert_eq!(feb1.items.len(), 1);
    assert_eq!(feb1.items[0].placement, Placement::Continuation);
    assert_eq!(feb1.items[0].display_length, 29);

    let mar3: Vec<&str> = idx
        .cell(date(2024, 3, 3))
        .unwrap()
        .items
        .iter()
        .map(|i| i.id())
        .collect();
    assert_eq!(mar3, vec!["E1", "E2", "gala"]);
    assert!(idx.days().iter().all(|c| c.items.iter().all(|i| i.id() != "elsewhere")));

    let width = engine.geometry().content_width(lanes.lane_count());
    assert!((width - 420.0).abs() < f64::EPSILON);
}

#[test]
fn zoom_keeps_the_center_and_round_trips() {
    let mut engine = quiet_engine(date(2024, 3, 15));
    let mut host = FakeHost::new(0.0);
    host.scroll_to(&mut engine, 1_200.0);

    let out = engine.set_zoom(0.5).unwrap();
    assert!((out - ((1_200.0 + 300.0) * 0.5 - 300.0)).abs() < 1e-9);
    assert!((FakeHost::content_height(&engine) - 90.0 * 16.0).abs() < 1e-9);

    let back = engine.set_zoom(1.0).unwrap();
    assert!((back - 1_200.0).abs() < 1e-9);

    engine.zoom_by(-0.1).unwrap();
    engine.zoom_by(-0.1).unwrap();
    assert!((engine.zoom_factor() - 0.8).abs() < 1e-9);
    engine.reset_zoom();
    assert!((engine.zoom_factor() - 1.0).abs() < f64::EPSILON);
}

#[test]
fn zoom_does_not_trigger_extensions() {
    let mut engine = quiet_engine(date(2024, 3, 15));
    let mut host = FakeHost::new(0.0);
    host.scroll_to(&mut engine, 500.0);
    let offset = engine.set_zoom(0.5).unwrap();
    // Host applies the zoom offset; this sample is near the top but was not
    // user motion.
    let out = host.scroll_to(&mut engine, offset);
    assert!(out.extension.is_none());
}

#[test]
fn zoom_persists_through_a_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("view-preferences.json");
    FileZoomStore::new(&path).save(0.7).unwrap();

    let mut engine = quiet_engine(date(2024, 3, 15))
        .with_zoom_store(Box::new(FileZoomStore::new(&path)));
    assert!((engine.zoom_factor() - 0.7).abs() < f64::EPSILON);

    let mut host = FakeHost::new(0.0);
    engine.zoom_by(-0.1).unwrap();
    host.wait(10);
    engine.tick(host.clock);

    let stored = FileZoomStore::new(&path).load();
    let factor = stored.effective_factor(&Config::default().zoom);
    assert!((factor - 0.6).abs() < 1e-9);
}

#[test]
fn corrupt_zoom_file_falls_back_to_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("view-preferences.json");
    fs::write(&path, "zoom=lots").unwrap();
    let engine = quiet_engine(date(2024, 3, 15))
        .with_zoom_store(Box::new(FileZoomStore::new(&path)));
    assert!((engine.zoom_factor() - 1.0).abs() < f64::EPSILON);
}

#[test]
fn visible_month_follows_scroll() {
    let mut engine = quiet_engine(date(2024, 3, 15));
    let mut host = FakeHost::new(0.0);
    let out = host.scroll_to(&mut engine, 0.0);
    assert_eq!(out.visible_month.as_deref(), Some("February 2024"));
    let out = host.scroll_to(&mut engine, 800.0);
    assert_eq!(out.visible_month.as_deref(), Some("March 2024"));
    assert!(host.scroll_to(&mut engine, 820.0).visible_month.is_none());
    assert_eq!(engine.visible_month(1_700.0), "April 2024");

    let changes: Vec<EngineEvent> = engine
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, EngineEvent::VisibleMonthChanged { .. }))
        .collect();
    assert_eq!(changes.len(), 2);

    assert!(engine.show_floating_label(host.clock));
    host.wait(1_500);
    engine.tick(host.clock);
    assert!(!engine.show_floating_label(host.clock));
}

#[test]
fn measured_markers_drive_month_jumps() {
    let mut engine = quiet_engine(date(2024, 3, 15));
    let mut host = FakeHost::new(0.0);
    host.scroll_to(&mut engine, 0.0);
    engine.after_layout(LayoutReport {
        content_height: 3_000.0,
        month_offsets: vec![
            timelane::viewport::month_tracker::MonthMarker {
                month: date(2024, 2, 1),
                offset: 0.0,
            },
            timelane::viewport::month_tracker::MonthMarker {
                month: date(2024, 3, 1),
                offset: 1_050.0,
            },
        ],
    });
    assert_eq!(engine.scroll_target_for_month(date(2024, 3, 10)), Some(950.0));
    assert_eq!(engine.scroll_target_for_month(date(2024, 4, 1)), None);
}

#[test]
fn journal_records_engine_activity() {
    let dir = tempfile::tempdir().unwrap();
    let (mut engine, path) = engine_with_journal(dir.path(), date(2024, 3, 15));
    engine.ingest_entries(vec![
        entry("ok", "2024-03-01", "2024-03-02"),
        entry("inverted", "2024-03-09", "2024-03-01"),
        single("broken", "31/02/2024"),
    ]);
    engine.set_window(date(2024, 6, 15), 24, 24).unwrap();
    drop(engine);

    let events = journal_events(&path);
    for expected in [
        "engine_start",
        "entry_normalized",
        "entries_skipped",
        "entries_ingested",
        "window_clamped",
    ] {
        assert!(
            events.iter().any(|e| e == expected),
            "missing {expected} in {events:?}"
        );
    }
}

#[test]
fn config_file_shapes_the_engine() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        "[window]\ndefault_past_months = 2\ndefault_future_months = 0\n\n[scroll]\nthrottle_ms = 10\n",
    )
    .unwrap();
    let config = Config::load(Some(&path)).unwrap();
    let engine =
        TimelineEngine::with_journal(config, date(2024, 3, 15), JsonlWriter::disabled()).unwrap();
    assert_eq!(engine.day_index().first_date(), Some(date(2024, 1, 1)));
    assert_eq!(engine.day_index().last_date(), Some(date(2024, 3, 31)));
}

#[test]
fn invalid_config_is_rejected() {
    let mut config = Config::default();
    config.window.max_months = 0;
    let err = TimelineEngine::with_journal(config, date(2024, 3, 15), JsonlWriter::disabled())
        .err()
        .expect("invalid config fails");
    assert_eq!(err.code(), "TL-1001");
}

#[test]
fn throttle_holds_rapid_samples() {
    let mut engine = quiet_engine(date(2024, 3, 15));
    let t0 = std::time::Instant::now();
    let sample = |offset| ScrollSample {
        offset,
        viewport_height: 600.0,
        content_height: 2_880.0,
    };
    assert!(engine.on_scroll(sample(400.0), t0).processed);
    // Would fire if processed, but lands inside the throttle interval.
    let held = engine.on_scroll(sample(100.0), t0 + std::time::Duration::from_millis(5));
    assert!(!held.processed);
    assert!(!engine.extension_pending());
    let released = engine
        .tick(t0 + std::time::Duration::from_millis(50))
        .expect("trailing sample released");
    assert!(released.extension.is_some());
}
