#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use serde_json::Value;
use timelane::core::config::{Config, JournalConfig};
use timelane::engine::{LayoutReport, ScrollCorrection, ScrollOutcome, TimelineEngine};
use timelane::layout::entry::TimeRangedEntry;
use timelane::logger::jsonl::JsonlWriter;
use timelane::window::edge_trigger::ScrollSample;

pub const VIEWPORT_HEIGHT: f64 = 600.0;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
}

pub fn entry(id: &str, start: &str, end: &str) -> TimeRangedEntry {
    TimeRangedEntry::new(id, start, Some(end))
}

pub fn single(id: &str, day: &str) -> TimeRangedEntry {
    TimeRangedEntry::new(id, day, None)
}

/// Engine with a journal written under `dir`.
pub fn engine_with_journal(dir: &Path, anchor: NaiveDate) -> (TimelineEngine, PathBuf) {
    let path = dir.join("activity.jsonl");
    let mut config = Config::default();
    config.journal = JournalConfig {
        enabled: true,
        path: path.clone(),
        ..JournalConfig::default()
    };
    let journal = JsonlWriter::open(config.journal.clone());
    let engine = TimelineEngine::with_journal(config, anchor, journal).expect("engine builds");
    (engine, path)
}

pub fn quiet_engine(anchor: NaiveDate) -> TimelineEngine {
    TimelineEngine::with_journal(Config::default(), anchor, JsonlWriter::disabled())
        .expect("engine builds")
}

pub fn read_journal(path: &Path) -> Vec<Value> {
    let raw = fs::read_to_string(path).unwrap_or_default();
    raw.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("journal line is JSON"))
        .collect()
}

pub fn journal_events(path: &Path) -> Vec<String> {
    read_journal(path)
        .iter()
        .filter_map(|v| v["event"].as_str().map(str::to_string))
        .collect()
}

/// Minimal host: lays out uniform rows and reports back like a browser
/// would after each commit.
pub struct FakeHost {
    pub offset: f64,
    pub clock: Instant,
}

impl FakeHost {
    pub fn new(offset: f64) -> Self {
        Self {
            offset,
            clock: Instant::now(),
        }
    }

    pub fn content_height(engine: &TimelineEngine) -> f64 {
        engine.geometry().content_height(engine.day_index().len())
    }

    /// Scroll to `offset` after letting enough time pass for the throttle.
    pub fn scroll_to(&mut self, engine: &mut TimelineEngine, offset: f64) -> ScrollOutcome {
        self.clock += Duration::from_millis(100);
        self.offset = offset;
        engine.on_scroll(
            ScrollSample {
                offset,
                viewport_height: VIEWPORT_HEIGHT,
                content_height: Self::content_height(engine),
            },
            self.clock,
        )
    }

    /// Report the current layout and apply any correction.
    pub fn lay_out(&mut self, engine: &mut TimelineEngine) -> Option<ScrollCorrection> {
        let correction = engine.after_layout(LayoutReport {
            content_height: Self::content_height(engine),
            month_offsets: Vec::new(),
        });
        if let Some(fix) = correction {
            self.offset = fix.new_offset;
        }
        correction
    }

    pub fn wait(&mut self, ms: u64) {
        self.clock += Duration::from_millis(ms);
    }
}
