//! JSONL journal: append-only line-delimited JSON record of engine activity.
//!
//! Each line is a self-contained JSON object assembled in memory and written
//! with a single `write_all`, so a tailing reader never sees a partial line.
//!
//! Fallback chain:
//! 1. Primary file path
//! 2. Optional fallback path
//! 3. stderr with `[TL-JSONL]` prefix
//! 4. Silent discard (the host must never crash for journal failures)

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions, rename};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::config::JournalConfig;
use crate::core::errors::{Result, TimelaneError};

/// Severity level for journal records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Journal event types matching the engine's activity model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    EngineStart,
    EntriesIngested,
    EntriesSkipped,
    EntryNormalized,
    WindowExtended,
    WindowRecentered,
    WindowClamped,
    LimitReached,
    ScrollCorrected,
    ZoomChanged,
    ZoomLoaded,
    ZoomPersisted,
    Inconsistency,
}

/// A single journal record; all fields optional except `ts`, `event`, `severity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// ISO 8601 UTC timestamp.
    pub ts: String,
    pub event: EventType,
    pub severity: Severity,
    /// `past` or `future` for window events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    /// Number of entries involved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    /// Entry ids involved (skipped, normalized).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    /// Materialized window bounds as `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_end: Option<String>,
    /// Zoom factor after the event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
    /// Scroll offset after the event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<f64>,
    /// TL error code when the event reports a failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Freeform details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl JournalEntry {
    /// Create a new record stamped with the current UTC time.
    pub fn new(event: EventType, severity: Severity) -> Self {
        Self {
            ts: format_utc_now(),
            event,
            severity,
            direction: None,
            count: None,
            ids: None,
            window_start: None,
            window_end: None,
            zoom: None,
            offset: None,
            error_code: None,
            details: None,
        }
    }

    #[must_use]
    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    #[must_use]
    pub fn direction(mut self, direction: impl Into<String>) -> Self {
        self.direction = Some(direction.into());
        self
    }

    #[must_use]
    pub fn count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    #[must_use]
    pub fn ids(mut self, ids: Vec<String>) -> Self {
        self.ids = Some(ids);
        self
    }

    #[must_use]
    pub fn window(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.window_start = Some(start.into());
        self.window_end = Some(end.into());
        self
    }

    #[must_use]
    pub fn zoom(mut self, zoom: f64) -> Self {
        self.zoom = Some(zoom);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: f64) -> Self {
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub fn failure(mut self, err: &TimelaneError) -> Self {
        self.error_code = Some(err.code().to_string());
        self.details = Some(err.to_string());
        self
    }
}

/// Degradation state of the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Normal,
    Fallback,
    Stderr,
    Discard,
}

/// Append-only JSONL writer with rotation and multi-level fallback.
pub struct JsonlWriter {
    config: JournalConfig,
    writer: Option<BufWriter<File>>,
    state: WriterState,
    bytes_written: u64,
}

impl JsonlWriter {
    /// Open the journal. Falls through the degradation chain on failure.
    ///
    /// A disabled config yields a writer that discards every record.
    pub fn open(config: JournalConfig) -> Self {
        let enabled = config.enabled;
        let mut w = Self {
            config,
            writer: None,
            state: WriterState::Discard,
            bytes_written: 0,
        };
        if enabled {
            w.try_open_primary();
        }
        w
    }

    /// A writer that drops everything.
    pub fn disabled() -> Self {
        Self::open(JournalConfig {
            enabled: false,
            ..JournalConfig::default()
        })
    }

    /// Write a single record as one JSONL line.
    pub fn write_entry(&mut self, entry: &JournalEntry) {
        if self.state == WriterState::Discard {
            return;
        }
        let line = match serde_json::to_string(entry) {
            Ok(json) => format!("{json}\n"),
            Err(e) => {
                let _ = writeln!(io::stderr(), "[TL-JSONL] serialize error: {e}");
                return;
            }
        };
        self.write_line(&line);
    }

    /// Flush buffers.
    pub fn flush(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
    }

    /// Current degradation state.
    pub fn state(&self) -> &str {
        match self.state {
            WriterState::Normal => "normal",
            WriterState::Fallback => "fallback",
            WriterState::Stderr => "stderr",
            WriterState::Discard => "discard",
        }
    }

    /// Number of bytes written to the current file.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    // ──────────────────────── internals ────────────────────────

    fn write_line(&mut self, line: &str) {
        if self.bytes_written + line.len() as u64 > self.config.max_size_bytes
            && matches!(self.state, WriterState::Normal | WriterState::Fallback)
        {
            self.rotate();
        }

        match self.state {
            WriterState::Normal | WriterState::Fallback => {
                if let Some(w) = self.writer.as_mut() {
                    if w.write_all(line.as_bytes()).is_err() {
                        self.degrade();
                        self.write_line(line);
                        return;
                    }
                    self.bytes_written += line.len() as u64;
                } else {
                    self.degrade();
                    self.write_line(line);
                }
            }
            WriterState::Stderr => {
                let _ = write!(io::stderr(), "[TL-JSONL] {line}");
            }
            WriterState::Discard => {}
        }
    }

    fn try_open_primary(&mut self) {
        match open_append(&self.config.path) {
            Ok((file, size)) => {
                self.writer = Some(BufWriter::new(file));
                self.state = WriterState::Normal;
                self.bytes_written = size;
            }
            Err(_) => self.try_open_fallback(),
        }
    }

    fn try_open_fallback(&mut self) {
        let opened = self
            .config
            .fallback_path
            .as_deref()
            .map(|fb| (fb.to_path_buf(), open_append(fb)));
        match opened {
            Some((fb, Ok((file, size)))) => {
                let _ = writeln!(
                    io::stderr(),
                    "[TL-JSONL] primary path failed, using fallback: {}",
                    fb.display()
                );
                self.writer = Some(BufWriter::new(file));
                self.state = WriterState::Fallback;
                self.bytes_written = size;
            }
            Some((_, Err(_))) | None => {
                self.state = WriterState::Stderr;
                let _ = writeln!(
                    io::stderr(),
                    "[TL-JSONL] journal files unavailable, using stderr"
                );
            }
        }
    }

    fn degrade(&mut self) {
        self.writer = None;
        match self.state {
            WriterState::Normal => self.try_open_fallback(),
            WriterState::Fallback => {
                self.state = WriterState::Stderr;
                let _ = writeln!(io::stderr(), "[TL-JSONL] fallback write failed, using stderr");
            }
            WriterState::Stderr => self.state = WriterState::Discard,
            WriterState::Discard => {}
        }
    }

    fn rotate(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
        self.writer = None;

        let base = match self.state {
            WriterState::Normal => self.config.path.clone(),
            WriterState::Fallback => match &self.config.fallback_path {
                Some(p) => p.clone(),
                None => return,
            },
            _ => return,
        };

        // .N-1 -> .N, ..., current -> .1
        for i in (1..self.config.max_rotated_files).rev() {
            let _ = rename(rotated_name(&base, i), rotated_name(&base, i + 1));
        }
        let _ = fs::remove_file(rotated_name(&base, self.config.max_rotated_files.max(1) + 1));
        if self.config.max_rotated_files == 0 {
            let _ = fs::remove_file(&base);
        } else {
            let _ = rename(&base, rotated_name(&base, 1));
        }

        match open_append(&base) {
            Ok((file, _)) => {
                self.writer = Some(BufWriter::new(file));
                self.bytes_written = 0;
            }
            Err(_) => self.degrade(),
        }
    }
}

impl Drop for JsonlWriter {
    fn drop(&mut self) {
        self.flush();
    }
}

// ──────────────────────── helpers ────────────────────────

/// Open or create a file for appending. Returns `(File, current_size)`.
fn open_append(path: &Path) -> Result<(File, u64)> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| TimelaneError::io(parent, source))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| TimelaneError::io(path, source))?;
    let size = file.metadata().map(|m| m.len()).unwrap_or(0);
    Ok((file, size))
}

/// `foo.jsonl` -> `foo.jsonl.3`.
fn rotated_name(base: &Path, index: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
