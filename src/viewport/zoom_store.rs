//! Zoom factor persistence.
//!
//! The engine never talks to storage directly; it is handed a [`ZoomStore`].
//! Loading never fails: a missing, corrupt, unreadable or out-of-range value
//! resolves to [`FALLBACK_FACTOR`].
//!
//! # Persistence Strategy
//!
//! Atomic write: serialize → temp file → fsync → rename over target. Readers
//! never see a partial write. [`DebouncedSave`] coalesces rapid changes
//! (pinch gestures, wheel zoom) into one write.

#![allow(missing_docs)]

use std::fmt;
use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::core::config::ZoomConfig;
use crate::core::errors::{Result, TimelaneError};

// ──────────────────── constants ────────────────────

/// Current on-disk schema version.
const SCHEMA_VERSION: u32 = 1;

/// Factor used whenever the stored value cannot be trusted.
pub const FALLBACK_FACTOR: f64 = 1.0;

/// Minimum interval between debounced writes.
pub const WRITE_DEBOUNCE: Duration = Duration::from_secs(2);

// ──────────────────── stored model ────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StoredZoom {
    #[serde(default = "default_schema_version")]
    schema_version: u32,
    zoom_factor: f64,
}

const fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

// ──────────────────── load outcome ────────────────────

/// What a store found.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// A number was read; bounds are checked by [`LoadOutcome::effective_factor`].
    Loaded { factor: f64 },
    /// Nothing stored yet (first launch).
    Missing,
    /// Stored content is not a zoom factor.
    Corrupt { details: String },
    /// The store could not be read.
    IoError { details: String },
}

impl LoadOutcome {
    /// Factor to start with. Anything non-finite or outside the configured
    /// bounds falls back to [`FALLBACK_FACTOR`].
    #[must_use]
    pub fn effective_factor(&self, bounds: &ZoomConfig) -> f64 {
        match self {
            Self::Loaded { factor } if is_valid_factor(*factor, bounds) => *factor,
            _ => FALLBACK_FACTOR,
        }
    }

    /// `true` when the value was loaded and usable, or simply absent.
    #[must_use]
    pub fn is_ok(&self, bounds: &ZoomConfig) -> bool {
        match self {
            Self::Loaded { factor } => is_valid_factor(*factor, bounds),
            Self::Missing => true,
            Self::Corrupt { .. } | Self::IoError { .. } => false,
        }
    }
}

impl fmt::Display for LoadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loaded { factor } => write!(f, "loaded {factor}"),
            Self::Missing => write!(f, "missing"),
            Self::Corrupt { details } => write!(f, "corrupt: {details}"),
            Self::IoError { details } => write!(f, "io error: {details}"),
        }
    }
}

/// `true` for finite factors inside `[min_factor, max_factor]`.
#[must_use]
pub fn is_valid_factor(value: f64, bounds: &ZoomConfig) -> bool {
    value.is_finite() && value >= bounds.min_factor && value <= bounds.max_factor
}

// ──────────────────── store trait ────────────────────

/// Storage for the zoom factor across sessions.
pub trait ZoomStore {
    fn load(&self) -> LoadOutcome;
    fn save(&mut self, factor: f64) -> Result<()>;
}

/// In-memory store for hosts that persist elsewhere, and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryZoomStore {
    value: Option<f64>,
    saves: usize,
}

impl MemoryZoomStore {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            value: None,
            saves: 0,
        }
    }

    #[must_use]
    pub const fn with_value(value: f64) -> Self {
        Self {
            value: Some(value),
            saves: 0,
        }
    }

    #[must_use]
    pub const fn value(&self) -> Option<f64> {
        self.value
    }

    /// Number of successful saves.
    #[must_use]
    pub const fn saves(&self) -> usize {
        self.saves
    }
}

impl ZoomStore for MemoryZoomStore {
    fn load(&self) -> LoadOutcome {
        self.value
            .map_or(LoadOutcome::Missing, |factor| LoadOutcome::Loaded { factor })
    }

    fn save(&mut self, factor: f64) -> Result<()> {
        if !factor.is_finite() {
            return Err(TimelaneError::InvalidZoom {
                value: factor,
                details: "refusing to store a non-finite zoom factor".to_string(),
            });
        }
        self.value = Some(factor);
        self.saves += 1;
        Ok(())
    }
}

/// JSON file store: `{"schema_version":1,"zoom_factor":0.8}`.
#[derive(Debug, Clone)]
pub struct FileZoomStore {
    path: PathBuf,
}

impl FileZoomStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ZoomStore for FileZoomStore {
    fn load(&self) -> LoadOutcome {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return LoadOutcome::Missing,
            // Invalid UTF-8 is corrupt content, not an I/O error.
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                return LoadOutcome::Corrupt {
                    details: e.to_string(),
                };
            }
            Err(e) => {
                return LoadOutcome::IoError {
                    details: e.to_string(),
                };
            }
        };
        parse_stored(&content)
    }

    fn save(&mut self, factor: f64) -> Result<()> {
        if !factor.is_finite() {
            return Err(TimelaneError::InvalidZoom {
                value: factor,
                details: "refusing to store a non-finite zoom factor".to_string(),
            });
        }
        save_atomic(
            &StoredZoom {
                schema_version: SCHEMA_VERSION,
                zoom_factor: factor,
            },
            &self.path,
        )
        .map_err(|source| TimelaneError::io(&self.path, source))
    }
}

/// Accepts the current object form, or a bare number as older hosts wrote it.
fn parse_stored(content: &str) -> LoadOutcome {
    match serde_json::from_str::<StoredZoom>(content) {
        Ok(stored) => LoadOutcome::Loaded {
            factor: stored.zoom_factor,
        },
        Err(object_err) => match content.trim().parse::<f64>() {
            Ok(factor) => LoadOutcome::Loaded { factor },
            Err(_) => LoadOutcome::Corrupt {
                details: object_err.to_string(),
            },
        },
    }
}

fn save_atomic(stored: &StoredZoom, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(stored)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    // Same directory so the rename stays on one filesystem.
    let tmp_path = path.with_extension("json.tmp");
    {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
    }

    fs::rename(&tmp_path, path)
}

// ──────────────────── debounced save ────────────────────

/// Tracks whether a save is owed and when the last one happened.
#[derive(Debug, Clone)]
pub struct DebouncedSave {
    debounce: Duration,
    last_write: Option<Instant>,
    pending: bool,
}

impl Default for DebouncedSave {
    fn default() -> Self {
        Self::new(WRITE_DEBOUNCE)
    }
}

impl DebouncedSave {
    #[must_use]
    pub const fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            last_write: None,
            pending: false,
        }
    }

    pub fn request(&mut self) {
        self.pending = true;
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending
    }

    /// `true` if a save is owed and the debounce interval has elapsed.
    #[must_use]
    pub fn due(&self, now: Instant) -> bool {
        if !self.pending {
            return false;
        }
        self.last_write
            .is_none_or(|last| now.saturating_duration_since(last) >= self.debounce)
    }

    pub fn mark_written(&mut self, now: Instant) {
        self.pending = false;
        self.last_write = Some(now);
    }
}
