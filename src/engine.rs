//! Timeline engine facade.
//!
//! Owns every piece of state (window, lanes, day index, zoom, edge triggers,
//! scroll anchor, month tracker) and exposes the host-facing operations.
//! Single-threaded: time is always passed in, never read from a clock.
//!
//! # Scroll protocol
//!
//! ```text
//! host scroll ─▶ on_scroll(sample, now) ─▶ maybe extend ─▶ host re-layout
//!                     ▲                                        │
//!                tick(now) (trailing sample, label timeout)    ▼
//!                                             after_layout(report) ─▶ correction
//! ```

#![allow(missing_docs)]

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use serde::Serialize;

use crate::core::config::Config;
use crate::core::dates::{date_key, month_label};
use crate::core::errors::{Result, TimelaneError};
use crate::layout::day_index::{DayIndex, IndexPolicy, build_day_index};
use crate::layout::entry::{ParsedEntry, TimeRangedEntry, parse_snapshot};
use crate::layout::geometry::LayoutGeometry;
use crate::layout::lanes::{LaneAssignment, assign_parsed};
use crate::logger::jsonl::{EventType, JournalEntry, JsonlWriter, Severity};
use crate::viewport::month_tracker::{MonthMarker, MonthTracker};
use crate::viewport::throttle::Throttle;
use crate::viewport::zoom::{TouchPoint, Viewport, ZoomChange, ZoomController};
use crate::viewport::zoom_store::{DebouncedSave, ZoomStore};
use crate::window::edge_trigger::{EdgeGuard, EdgeState, EdgeThresholds, ScrollSample};
use crate::window::manager::{
    DateWindowManager, Direction, ExtendOutcome, MaterializedWindow, month_starts,
};
use crate::window::scroll_anchor::{ScrollAnchor, ScrollAnchorController};

// ──────────────────── host-facing types ────────────────────

/// Notifications drained by the host with [`TimelineEngine::drain_events`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    /// An edge stopped extending for this session.
    LimitReached { direction: Direction },
    /// Entries excluded from the last snapshot.
    SkippedEntries { ids: Vec<String> },
    VisibleMonthChanged { label: String },
    /// The materialized window hit the safety cap.
    WindowClamped {
        requested_end: NaiveDate,
        clamped_end: NaiveDate,
    },
}

/// A window extension committed while handling a scroll sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extension {
    pub direction: Direction,
    pub outcome: ExtendOutcome,
}

/// What the engine did with one scroll sample.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrollOutcome {
    /// `false` when the sample was held back by the throttle.
    pub processed: bool,
    pub extension: Option<Extension>,
    /// New label when the visible month changed.
    pub visible_month: Option<String>,
}

/// Post-layout measurements from the host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutReport {
    pub content_height: f64,
    /// Measured month-marker offsets; empty keeps the current markers.
    pub month_offsets: Vec<MonthMarker>,
}

/// Scroll position the host should apply after a past extension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollCorrection {
    pub direction: Direction,
    pub new_offset: f64,
    pub height_delta: f64,
}

// ──────────────────── engine ────────────────────

/// The timeline layout and windowing engine.
pub struct TimelineEngine {
    config: Config,
    window: DateWindowManager,
    materialized: MaterializedWindow,
    entries: Vec<ParsedEntry>,
    lanes: LaneAssignment,
    day_index: DayIndex,
    zoom: ZoomController,
    zoom_store: Option<Box<dyn ZoomStore>>,
    zoom_save: DebouncedSave,
    edges: EdgeGuard,
    anchor: ScrollAnchorController,
    months: MonthTracker,
    throttle: Throttle<ScrollSample>,
    last_sample: Option<ScrollSample>,
    events: VecDeque<EngineEvent>,
    journal: JsonlWriter,
}

impl TimelineEngine {
    /// Build an engine around `anchor`. The config is validated and the
    /// journal opened from `config.journal`.
    pub fn new(config: Config, anchor: NaiveDate) -> Result<Self> {
        let journal = JsonlWriter::open(config.journal.clone());
        Self::with_journal(config, anchor, journal)
    }

    /// Like [`TimelineEngine::new`] with an explicit journal writer.
    pub fn with_journal(config: Config, anchor: NaiveDate, journal: JsonlWriter) -> Result<Self> {
        config.validate()?;
        let window = DateWindowManager::new(anchor, config.window.clone());
        let materialized = window.materialize()?;
        let zoom = ZoomController::new(config.zoom.clone(), config.zoom.default_factor);

        let mut engine = Self {
            window,
            materialized,
            entries: Vec::new(),
            lanes: LaneAssignment::default(),
            day_index: DayIndex::default(),
            zoom,
            zoom_store: None,
            zoom_save: DebouncedSave::default(),
            edges: EdgeGuard::new(EdgeThresholds::from(&config.scroll)),
            anchor: ScrollAnchorController::new(),
            months: MonthTracker::new(anchor, Duration::from_millis(config.month.label_timeout_ms)),
            throttle: Throttle::new(Duration::from_millis(config.scroll.throttle_ms)),
            last_sample: None,
            events: VecDeque::new(),
            journal,
            config,
        };
        engine.note_clamp(None);
        engine.rebuild_index();

        let hash = engine.config.stable_hash().unwrap_or_default();
        let entry = engine
            .window_entry(EventType::EngineStart, Severity::Info)
            .zoom(engine.zoom.factor())
            .details(format!("config_hash={hash}"));
        engine.journal.write_entry(&entry);
        Ok(engine)
    }

    /// Attach a zoom store and adopt its value (falling back on anything
    /// unusable).
    #[must_use]
    pub fn with_zoom_store(mut self, store: Box<dyn ZoomStore>) -> Self {
        let outcome = store.load();
        let factor = outcome.effective_factor(&self.config.zoom);
        self.zoom = ZoomController::new(self.config.zoom.clone(), factor);
        let severity = if outcome.is_ok(&self.config.zoom) {
            Severity::Info
        } else {
            Severity::Warning
        };
        self.journal.write_entry(
            &JournalEntry::new(EventType::ZoomLoaded, severity)
                .zoom(factor)
                .details(outcome.to_string()),
        );
        self.zoom_store = Some(store);
        self.rebuild_markers();
        self
    }

    // ──────────────────── entries ────────────────────

    /// Replace the entry snapshot and recompute lanes and the day index.
    pub fn ingest_entries(&mut self, raw: Vec<TimeRangedEntry>) {
        let parsed = parse_snapshot(&raw);
        let skipped_ids = parsed.skipped_ids();

        if !parsed.normalized.is_empty() {
            self.journal.write_entry(
                &JournalEntry::new(EventType::EntryNormalized, Severity::Warning)
                    .count(parsed.normalized.len())
                    .ids(parsed.normalized.clone())
                    .details("end before start; collapsed to a single day"),
            );
        }
        if !skipped_ids.is_empty() {
            self.journal.write_entry(
                &JournalEntry::new(EventType::EntriesSkipped, Severity::Warning)
                    .count(skipped_ids.len())
                    .ids(skipped_ids.clone()),
            );
            self.events
                .push_back(EngineEvent::SkippedEntries { ids: skipped_ids });
        }

        self.lanes = assign_parsed(&parsed.entries);
        self.entries = parsed.entries;
        self.rebuild_index();

        self.journal.write_entry(
            &JournalEntry::new(EventType::EntriesIngested, Severity::Info)
                .count(self.entries.len())
                .details(format!("lanes={}", self.lanes.lane_count())),
        );
    }

    // ──────────────────── window ────────────────────

    /// Replace the window. On a materialization failure the previous window
    /// is kept and the error returned.
    pub fn set_window(&mut self, anchor: NaiveDate, past: u32, future: u32) -> Result<()> {
        let previous = self.window.clone();
        self.window.set_window(anchor, past, future);
        self.months.set_anchor(anchor);
        self.commit_window(previous)
    }

    /// Host-driven extension. Skips the edge cooldown but otherwise goes
    /// through the same edge machine as scroll-triggered extensions. `false`
    /// when at bound, when the edge is disabled, when nothing changed, or
    /// while another extension awaits its layout report.
    pub fn extend(&mut self, direction: Direction, months: u32, now: Instant) -> bool {
        if self.anchor.is_pending() || !self.edges.fire(direction, now) {
            return false;
        }
        self.apply_extension(direction, months).is_some_and(ExtendOutcome::extended)
    }

    /// Jump to a new anchor with default extents. Re-enables both edges.
    pub fn recenter(&mut self, anchor: NaiveDate) -> Result<()> {
        let previous = self.window.clone();
        self.window.recenter(anchor);
        self.months.set_anchor(anchor);
        self.edges.reset();
        self.throttle.reset();
        self.commit_window(previous)?;
        let entry = self.window_entry(EventType::WindowRecentered, Severity::Info);
        self.journal.write_entry(&entry.details(format!("anchor={}", date_key(anchor))));
        Ok(())
    }

    // ──────────────────── scroll protocol ────────────────────

    /// Feed a raw scroll sample. Samples inside the throttle interval are
    /// held; the latest is released by [`TimelineEngine::tick`].
    pub fn on_scroll(&mut self, sample: ScrollSample, now: Instant) -> ScrollOutcome {
        match self.throttle.offer(sample, now) {
            Some(sample) => self.process_sample(sample, now),
            None => ScrollOutcome::default(),
        }
    }

    /// Periodic housekeeping: releases a trailing scroll sample, expires the
    /// floating label, and writes a debounced zoom save.
    pub fn tick(&mut self, now: Instant) -> Option<ScrollOutcome> {
        let outcome = self
            .throttle
            .poll(now)
            .map(|sample| self.process_sample(sample, now));
        self.months.expire_label(now);
        if self.zoom_save.due(now) && self.zoom_store.is_some() {
            // Failures are journaled by save_zoom.
            let _ = self.save_zoom(now);
        }
        outcome
    }

    /// Consume the host's post-layout report. Returns the corrected offset
    /// after a past extension.
    pub fn after_layout(&mut self, report: LayoutReport) -> Option<ScrollCorrection> {
        if !report.month_offsets.is_empty() {
            self.months.set_measured(report.month_offsets);
        }
        if let Some(sample) = self.last_sample.as_mut() {
            sample.content_height = report.content_height;
        }

        let resolution = self
            .anchor
            .resolve(report.content_height, self.window.generation())?;
        let direction = resolution.direction;

        if resolution.stale {
            self.edges.release(direction);
            self.journal.write_entry(
                &JournalEntry::new(EventType::ScrollCorrected, Severity::Info)
                    .direction(direction.as_str())
                    .details("window changed before layout; correction skipped"),
            );
            return None;
        }

        if self.edges.settle(direction, resolution.grew) {
            self.limit_reached(direction, "extension produced no new content");
        }

        let new_offset = resolution.new_offset?;
        if let Some(sample) = self.last_sample.as_mut() {
            sample.offset = new_offset;
        }
        self.edges.rebase(new_offset);
        self.journal.write_entry(
            &JournalEntry::new(EventType::ScrollCorrected, Severity::Info)
                .direction(direction.as_str())
                .offset(new_offset)
                .details(format!("height_delta={}", resolution.height_delta)),
        );
        Some(ScrollCorrection {
            direction,
            new_offset,
            height_delta: resolution.height_delta,
        })
    }

    // ──────────────────── zoom ────────────────────

    /// Set the zoom factor. Returns the offset that keeps the viewport
    /// center in place. Non-finite factors are rejected and the current
    /// factor kept.
    pub fn set_zoom(&mut self, factor: f64) -> Result<f64> {
        let viewport = self.viewport();
        let result = self.zoom.set_zoom(factor, viewport);
        self.finish_zoom(result)
    }

    /// Step the zoom factor by `delta`.
    pub fn zoom_by(&mut self, delta: f64) -> Result<f64> {
        let viewport = self.viewport();
        let result = self.zoom.zoom_by(delta, viewport);
        self.finish_zoom(result)
    }

    /// Back to the configured default factor.
    pub fn reset_zoom(&mut self) -> f64 {
        let viewport = self.viewport();
        let change = self.zoom.reset_zoom(viewport);
        self.apply_zoom_change(change)
    }

    /// Start a pinch. Returns `false` for a degenerate gesture.
    pub fn begin_pinch(&mut self, p1: TouchPoint, p2: TouchPoint) -> bool {
        self.zoom.begin_pinch(p1, p2)
    }

    /// Track a pinch. Returns the corrected offset, or `None` without an
    /// active gesture.
    pub fn update_pinch(&mut self, p1: TouchPoint, p2: TouchPoint) -> Option<f64> {
        let viewport = self.viewport();
        let change = self.zoom.update_pinch(p1, p2, viewport)?;
        Some(self.apply_zoom_change(change))
    }

    pub fn end_pinch(&mut self) -> bool {
        self.zoom.end_pinch()
    }

    /// Write the current factor to the attached store now.
    pub fn persist_zoom(&mut self, now: Instant) -> Result<()> {
        if self.zoom_store.is_none() {
            return Err(TimelaneError::Store {
                details: "no zoom store attached".to_string(),
            });
        }
        self.save_zoom(now)
    }

    #[must_use]
    pub const fn zoom_factor(&self) -> f64 {
        self.zoom.factor()
    }

    // ──────────────────── read model ────────────────────

    /// The per-day index; the sole read model for rendering.
    #[must_use]
    pub const fn day_index(&self) -> &DayIndex {
        &self.day_index
    }

    /// Label of the month nearest the viewport midpoint at `scroll_offset`.
    #[must_use]
    pub fn visible_month(&self, scroll_offset: f64) -> String {
        let height = self.last_sample.map_or(0.0, |s| s.viewport_height);
        month_label(self.months.month_at(scroll_offset, height))
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.events.drain(..).collect()
    }

    #[must_use]
    pub fn geometry(&self) -> LayoutGeometry {
        LayoutGeometry::new(&self.config.layout, self.zoom.factor())
    }

    #[must_use]
    pub const fn lane_assignment(&self) -> &LaneAssignment {
        &self.lanes
    }

    /// First day of every month in the materialized window.
    #[must_use]
    pub fn months(&self) -> Vec<NaiveDate> {
        month_starts(&self.materialized.range)
    }

    /// Row of `today`, if it is inside the window.
    #[must_use]
    pub fn today_index(&self, today: NaiveDate) -> Option<usize> {
        self.day_index.position_of(today)
    }

    /// Offset to scroll to so `month` sits just below the top.
    #[must_use]
    pub fn scroll_target_for_month(&self, month: NaiveDate) -> Option<f64> {
        self.months
            .marker_offset(month)
            .map(|offset| (offset - self.config.scroll.jump_margin_px).max(0.0))
    }

    #[must_use]
    pub fn show_floating_label(&self, now: Instant) -> bool {
        self.months.show_floating_label(now)
    }

    #[must_use]
    pub const fn window(&self) -> &DateWindowManager {
        &self.window
    }

    #[must_use]
    pub const fn materialized_window(&self) -> &MaterializedWindow {
        &self.materialized
    }

    #[must_use]
    pub const fn edge_state(&self, direction: Direction) -> EdgeState {
        self.edges.state(direction)
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// `true` while an extension awaits its layout report.
    #[must_use]
    pub const fn extension_pending(&self) -> bool {
        self.anchor.is_pending()
    }

    // ──────────────────── internals ────────────────────

    fn process_sample(&mut self, sample: ScrollSample, now: Instant) -> ScrollOutcome {
        self.last_sample = Some(sample);
        let mut outcome = ScrollOutcome {
            processed: true,
            ..ScrollOutcome::default()
        };

        if let Some(label) = self.months.observe(sample.offset, sample.viewport_height, now) {
            self.events.push_back(EngineEvent::VisibleMonthChanged {
                label: label.clone(),
            });
            outcome.visible_month = Some(label);
        }

        if self.anchor.is_pending() {
            // Keep the baseline current so the first sample after the report
            // is not read as one large jump.
            self.edges.rebase(sample.offset);
        } else if let Some(direction) = self.edges.observe(&sample, now) {
            let step = self.config.window.extend_step_months;
            if let Some(result @ ExtendOutcome::Extended { .. }) =
                self.apply_extension(direction, step)
            {
                outcome.extension = Some(Extension {
                    direction,
                    outcome: result,
                });
            }
        }
        outcome
    }

    /// Extend the window, capture the scroll anchor, and handle the bound.
    /// The edge for `direction` must already be pending; every path that does
    /// not leave an anchor behind settles it here. `None` when the window
    /// could not be materialized.
    fn apply_extension(&mut self, direction: Direction, months: u32) -> Option<ExtendOutcome> {
        let previous = self.window.clone();
        let before = self.materialized;
        let outcome = self.window.extend_outcome(direction, months);
        match outcome {
            ExtendOutcome::Extended { from, to } => {
                if self.commit_window(previous).is_err() {
                    self.edges.release(direction);
                    return None;
                }
                let captured = match self.last_sample {
                    Some(sample) => {
                        let anchor = self.scroll_anchor(direction, sample, before);
                        self.anchor.capture(anchor)
                    }
                    None => false,
                };
                if !captured {
                    self.edges.release(direction);
                }
                let entry = self
                    .window_entry(EventType::WindowExtended, Severity::Info)
                    .direction(direction.as_str())
                    .details(format!("months {from} -> {to}"));
                self.journal.write_entry(&entry);
            }
            ExtendOutcome::AtBound => {
                if self.edges.disable(direction) {
                    self.limit_reached(direction, "window extent at maximum");
                }
            }
            ExtendOutcome::Unchanged => self.edges.release(direction),
        }
        Some(outcome)
    }

    /// Anchor for an extension just committed over `before`. Days the
    /// safety cap cut from the bottom are measured with uniform rows.
    fn scroll_anchor(
        &self,
        direction: Direction,
        sample: ScrollSample,
        before: MaterializedWindow,
    ) -> ScrollAnchor {
        let after = self.materialized;
        let (edge_moved, trimmed_days) = match direction {
            Direction::Past => (
                after.start() < before.start(),
                (before.end() - after.end()).num_days().max(0),
            ),
            Direction::Future => (after.end() > before.end(), 0),
        };
        let trimmed_px = usize::try_from(trimmed_days)
            .map_or(0.0, |rows| self.geometry().row_offset(rows));
        ScrollAnchor {
            direction,
            offset_before: sample.offset,
            content_height_before: sample.content_height,
            trimmed_px,
            edge_moved,
            generation: self.window.generation(),
        }
    }

    /// Re-materialize after a window change; restore `previous` on failure.
    fn commit_window(&mut self, previous: DateWindowManager) -> Result<()> {
        match self.window.materialize() {
            Ok(materialized) => {
                let before = self.materialized;
                self.materialized = materialized;
                self.note_clamp(Some(before));
                self.rebuild_index();
                Ok(())
            }
            Err(err) => {
                self.window = previous;
                self.journal.write_entry(
                    &JournalEntry::new(EventType::Inconsistency, Severity::Error)
                        .failure(&err)
                        .details(format!("kept last good window: {err}")),
                );
                Err(err)
            }
        }
    }

    fn note_clamp(&mut self, before: Option<MaterializedWindow>) {
        let now = self.materialized;
        if !now.clamped || before == Some(now) {
            return;
        }
        self.events.push_back(EngineEvent::WindowClamped {
            requested_end: now.requested_end,
            clamped_end: now.end(),
        });
        let entry = self
            .window_entry(EventType::WindowClamped, Severity::Warning)
            .details(format!("requested end {}", date_key(now.requested_end)));
        self.journal.write_entry(&entry);
    }

    fn rebuild_index(&mut self) {
        let policy = IndexPolicy::from(&self.config.layout);
        self.day_index = build_day_index(&self.lanes, &self.materialized.range, &policy);
        self.rebuild_markers();
    }

    fn rebuild_markers(&mut self) {
        let months = month_starts(&self.materialized.range);
        let geometry = self.geometry();
        self.months
            .rebuild_uniform(&months, self.materialized.start(), &geometry);
    }

    fn limit_reached(&mut self, direction: Direction, why: &str) {
        self.events.push_back(EngineEvent::LimitReached { direction });
        let entry = self
            .window_entry(EventType::LimitReached, Severity::Warning)
            .direction(direction.as_str())
            .details(why);
        self.journal.write_entry(&entry);
    }

    fn viewport(&self) -> Viewport {
        self.last_sample.map_or(
            Viewport {
                offset: 0.0,
                height: 0.0,
            },
            |s| Viewport {
                offset: s.offset,
                height: s.viewport_height,
            },
        )
    }

    fn finish_zoom(&mut self, result: Result<ZoomChange>) -> Result<f64> {
        match result {
            Ok(change) => Ok(self.apply_zoom_change(change)),
            Err(err) => {
                self.journal.write_entry(
                    &JournalEntry::new(EventType::ZoomChanged, Severity::Warning)
                        .failure(&err)
                        .zoom(self.zoom.factor()),
                );
                Err(err)
            }
        }
    }

    fn apply_zoom_change(&mut self, change: ZoomChange) -> f64 {
        if !change.changed() {
            return change.new_offset;
        }
        let ratio = change.new_factor / change.old_factor;
        if let Some(sample) = self.last_sample.as_mut() {
            sample.offset = change.new_offset;
            sample.content_height *= ratio;
        }
        self.edges.rebase(change.new_offset);
        self.rebuild_markers();
        self.zoom_save.request();
        self.journal.write_entry(
            &JournalEntry::new(EventType::ZoomChanged, Severity::Info)
                .zoom(change.new_factor)
                .offset(change.new_offset),
        );
        change.new_offset
    }

    fn save_zoom(&mut self, now: Instant) -> Result<()> {
        let factor = self.zoom.factor();
        let Some(store) = self.zoom_store.as_mut() else {
            return Ok(());
        };
        self.zoom_save.mark_written(now);
        let saved = store.save(factor);
        if saved.is_err() {
            // Retried by tick once the debounce has passed.
            self.zoom_save.request();
        }
        match saved {
            Ok(()) => {
                self.journal.write_entry(
                    &JournalEntry::new(EventType::ZoomPersisted, Severity::Info).zoom(factor),
                );
                Ok(())
            }
            Err(err) => {
                self.journal.write_entry(
                    &JournalEntry::new(EventType::ZoomPersisted, Severity::Error)
                        .failure(&err)
                        .zoom(factor),
                );
                Err(err)
            }
        }
    }

    fn window_entry(&self, event: EventType, severity: Severity) -> JournalEntry {
        JournalEntry::new(event, severity).window(
            date_key(self.materialized.start()),
            date_key(self.materialized.end()),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::viewport::zoom_store::{LoadOutcome, MemoryZoomStore};

    /// Store whose first `fail_first` saves fail.
    struct FlakyStore {
        fail_first: u32,
        attempts: Rc<Cell<u32>>,
        saved: Rc<Cell<Option<f64>>>,
    }

    impl ZoomStore for FlakyStore {
        fn load(&self) -> LoadOutcome {
            LoadOutcome::Missing
        }

        fn save(&mut self, factor: f64) -> Result<()> {
            self.attempts.set(self.attempts.get() + 1);
            if self.attempts.get() <= self.fail_first {
                return Err(TimelaneError::Store {
                    details: "disk full".to_string(),
                });
            }
            self.saved.set(Some(factor));
            Ok(())
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn engine() -> TimelineEngine {
        TimelineEngine::with_journal(Config::default(), d(2024, 3, 15), JsonlWriter::disabled())
            .unwrap()
    }

    fn sample(offset: f64, content_height: f64) -> ScrollSample {
        ScrollSample {
            offset,
            viewport_height: 600.0,
            content_height,
        }
    }

    #[test]
    fn starts_with_three_month_window() {
        let e = engine();
        assert_eq!(e.day_index().first_date(), Some(d(2024, 2, 1)));
        assert_eq!(e.day_index().last_date(), Some(d(2024, 4, 30)));
        assert_eq!(e.months(), vec![d(2024, 2, 1), d(2024, 3, 1), d(2024, 4, 1)]);
        assert_eq!(e.today_index(d(2024, 2, 3)), Some(2));
    }

    #[test]
    fn ingest_reports_skipped_entries() {
        let mut e = engine();
        e.ingest_entries(vec![
            TimeRangedEntry::new("ok", "2024-03-01", Some("2024-03-03")),
            TimeRangedEntry::new("bad", "not a date", None),
        ]);
        assert_eq!(
            e.drain_events(),
            vec![EngineEvent::SkippedEntries {
                ids: vec!["bad".to_string()]
            }]
        );
        assert_eq!(e.lane_assignment().len(), 1);
        assert_eq!(e.day_index().item_count(), 3);
        assert!(e.drain_events().is_empty());
    }

    #[test]
    fn scroll_near_top_extends_and_corrects() {
        let mut e = engine();
        let t0 = Instant::now();
        let height = 90.0 * 32.0;
        e.on_scroll(sample(400.0, height), t0);
        let out = e.on_scroll(sample(100.0, height), t0 + Duration::from_millis(60));
        assert!(out.processed);
        assert_eq!(
            out.extension,
            Some(Extension {
                direction: Direction::Past,
                outcome: ExtendOutcome::Extended { from: 1, to: 3 },
            })
        );
        assert_eq!(e.day_index().first_date(), Some(d(2023, 12, 1)));
        assert!(e.extension_pending());

        let grown = height + 62.0 * 32.0;
        let fix = e
            .after_layout(LayoutReport {
                content_height: grown,
                month_offsets: Vec::new(),
            })
            .unwrap();
        assert_eq!(fix.direction, Direction::Past);
        assert!((fix.new_offset - (100.0 + 62.0 * 32.0)).abs() < 1e-9);
        assert!(!e.extension_pending());
        assert!(matches!(e.edge_state(Direction::Past), EdgeState::Cooldown { .. }));
    }

    #[test]
    fn throttled_samples_are_released_by_tick() {
        let mut e = engine();
        let t0 = Instant::now();
        assert!(e.on_scroll(sample(500.0, 3_000.0), t0).processed);
        assert!(!e.on_scroll(sample(520.0, 3_000.0), t0 + Duration::from_millis(10)).processed);
        assert!(e.tick(t0 + Duration::from_millis(20)).is_none());
        let released = e.tick(t0 + Duration::from_millis(50)).unwrap();
        assert!(released.processed);
    }

    #[test]
    fn host_extend_at_bound_emits_limit_once() {
        let mut e = engine();
        e.set_window(d(2024, 3, 15), 24, 1).unwrap();
        let now = Instant::now();
        assert!(!e.extend(Direction::Past, 2, now));
        assert!(!e.extend(Direction::Past, 2, now));
        let limits: Vec<EngineEvent> = e
            .drain_events()
            .into_iter()
            .filter(|ev| matches!(ev, EngineEvent::LimitReached { .. }))
            .collect();
        assert_eq!(
            limits,
            vec![EngineEvent::LimitReached {
                direction: Direction::Past
            }]
        );
        assert_eq!(e.edge_state(Direction::Past), EdgeState::Disabled);
    }

    #[test]
    fn recenter_reenables_edges() {
        let mut e = engine();
        e.set_window(d(2024, 3, 15), 24, 1).unwrap();
        e.extend(Direction::Past, 1, Instant::now());
        assert_eq!(e.edge_state(Direction::Past), EdgeState::Disabled);
        e.recenter(d(2025, 7, 4)).unwrap();
        assert_eq!(e.edge_state(Direction::Past), EdgeState::Idle);
        assert_eq!(e.day_index().first_date(), Some(d(2025, 6, 1)));
    }

    #[test]
    fn clamped_window_is_reported() {
        let mut e = engine();
        e.drain_events();
        e.set_window(d(2024, 6, 15), 24, 24).unwrap();
        let events = e.drain_events();
        assert!(events.contains(&EngineEvent::WindowClamped {
            requested_end: d(2026, 6, 30),
            clamped_end: d(2025, 5, 31),
        }));
        assert!(e.materialized_window().clamped);
    }

    #[test]
    fn failed_materialization_keeps_last_good_window() {
        let mut config = Config::default();
        config.window.safety_cap_months = 12;
        config.window.max_span_days = 200;
        let mut e =
            TimelineEngine::with_journal(config, d(2024, 3, 15), JsonlWriter::disabled()).unwrap();
        let before = *e.materialized_window();
        let err = e.set_window(d(2024, 3, 15), 12, 12).unwrap_err();
        assert_eq!(err.code(), "TL-2002");
        assert_eq!(*e.materialized_window(), before);
        assert_eq!(e.window().past_months(), 1);
        assert_eq!(e.day_index().first_date(), Some(d(2024, 2, 1)));
    }

    #[test]
    fn zoom_store_value_is_adopted_and_persisted() {
        let e = engine().with_zoom_store(Box::new(MemoryZoomStore::with_value(0.6)));
        assert!((e.zoom_factor() - 0.6).abs() < f64::EPSILON);

        let mut e = engine().with_zoom_store(Box::new(MemoryZoomStore::with_value(7.0)));
        assert!((e.zoom_factor() - 1.0).abs() < f64::EPSILON);
        e.set_zoom(0.8).unwrap();
        e.persist_zoom(Instant::now()).unwrap();
    }

    #[test]
    fn failed_zoom_save_is_retried_after_debounce() {
        let attempts = Rc::new(Cell::new(0));
        let saved = Rc::new(Cell::new(None));
        let store = FlakyStore {
            fail_first: 1,
            attempts: Rc::clone(&attempts),
            saved: Rc::clone(&saved),
        };
        let mut e = engine().with_zoom_store(Box::new(store));
        e.set_zoom(0.8).unwrap();

        let t0 = Instant::now();
        e.tick(t0);
        assert_eq!(attempts.get(), 1);
        assert_eq!(saved.get(), None);

        e.tick(t0 + Duration::from_millis(500));
        assert_eq!(attempts.get(), 1);

        e.tick(t0 + Duration::from_secs(2));
        assert_eq!(attempts.get(), 2);
        assert_eq!(saved.get(), Some(0.8));

        e.tick(t0 + Duration::from_secs(10));
        assert_eq!(attempts.get(), 2);
    }

    #[test]
    fn host_extension_blocks_scroll_extension_until_layout() {
        let mut e = engine();
        let t0 = Instant::now();
        let ms = Duration::from_millis;
        let height = 90.0 * 32.0;
        e.on_scroll(sample(1_000.0, height), t0);

        assert!(e.extend(Direction::Future, 2, t0));
        assert!(matches!(e.edge_state(Direction::Future), EdgeState::Pending { .. }));
        assert!(!e.extend(Direction::Past, 2, t0));

        e.on_scroll(sample(400.0, height), t0 + ms(100));
        let out = e.on_scroll(sample(100.0, height), t0 + ms(200));
        assert!(out.extension.is_none());
        assert_eq!(e.edge_state(Direction::Past), EdgeState::Idle);
        assert_eq!(e.window().past_months(), 1);

        // May and June were appended.
        let grown = height + 61.0 * 32.0;
        assert!(
            e.after_layout(LayoutReport {
                content_height: grown,
                month_offsets: Vec::new(),
            })
            .is_none()
        );
        assert!(!e.extension_pending());
        assert!(matches!(e.edge_state(Direction::Future), EdgeState::Cooldown { .. }));

        let later = t0 + Duration::from_secs(60);
        e.on_scroll(sample(400.0, grown), later);
        let out = e.on_scroll(sample(100.0, grown), later + ms(100));
        assert_eq!(out.extension.map(|x| x.direction), Some(Direction::Past));
    }

    #[test]
    fn host_extension_without_sample_settles_immediately() {
        let mut e = engine();
        let t0 = Instant::now();
        assert!(e.extend(Direction::Past, 2, t0));
        assert!(!e.extension_pending());
        assert_eq!(e.edge_state(Direction::Past), EdgeState::Cooldown { since: t0 });
        assert!(!e.extend(Direction::Future, 0, t0));
        assert!(matches!(e.edge_state(Direction::Future), EdgeState::Cooldown { .. }));
    }

    #[test]
    fn persist_without_store_is_an_error() {
        let mut e = engine();
        assert_eq!(e.persist_zoom(Instant::now()).unwrap_err().code(), "TL-3003");
    }

    #[test]
    fn rejected_zoom_keeps_factor() {
        let mut e = engine();
        e.set_zoom(0.7).unwrap();
        assert!(e.set_zoom(f64::INFINITY).is_err());
        assert!((e.zoom_factor() - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn scroll_target_subtracts_jump_margin() {
        let e = engine();
        assert_eq!(e.scroll_target_for_month(d(2024, 3, 1)), Some(29.0 * 32.0 - 100.0));
        assert_eq!(e.scroll_target_for_month(d(2024, 2, 1)), Some(0.0));
        assert_eq!(e.scroll_target_for_month(d(2030, 1, 1)), None);
    }
}
