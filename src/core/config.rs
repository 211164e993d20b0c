//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, TimelaneError};

/// Full engine configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub layout: LayoutConfig,
    pub scroll: ScrollConfig,
    pub zoom: ZoomConfig,
    pub month: MonthConfig,
    pub journal: JournalConfig,
    pub paths: PathsConfig,
}

/// Date window extents and materialization safety bounds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WindowConfig {
    /// Extent restored by `recenter` on the past side.
    pub default_past_months: u32,
    /// Extent restored by `recenter` on the future side.
    pub default_future_months: u32,
    /// Upper bound for each extent.
    pub max_months: u32,
    /// Months added per scroll-triggered extension.
    pub extend_step_months: u32,
    /// Materialized spans longer than this are clamped.
    pub max_span_days: u32,
    /// Number of whole months kept when the span is clamped.
    pub safety_cap_months: u32,
}

/// Lane/day-index policy and pixel geometry of the presentation grid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    /// Entries longer than this many days get per-month representatives.
    pub long_span_threshold_days: u32,
    pub row_height_px: f64,
    pub column_width_px: f64,
    pub lane_inset_px: f64,
    pub card_width_px: f64,
    /// Vertical gap subtracted from every card height.
    pub card_gap_px: f64,
    pub min_content_width_px: f64,
    pub content_padding_px: f64,
}

/// Edge-trigger thresholds for window extension.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScrollConfig {
    /// Distance from an edge inside which an extension may fire.
    pub edge_buffer_px: f64,
    /// Minimum movement toward the edge since the last sample.
    pub min_scroll_delta_px: f64,
    /// Minimum time between two triggers on the same edge.
    pub cooldown_ms: u64,
    /// Scroll samples closer together than this are throttled.
    pub throttle_ms: u64,
    /// Offsets within this distance of an edge count as the absolute edge.
    pub edge_epsilon_px: f64,
    /// Space left above a month marker when jumping to it.
    pub jump_margin_px: f64,
}

/// Zoom bounds and step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ZoomConfig {
    pub min_factor: f64,
    pub max_factor: f64,
    pub step: f64,
    pub default_factor: f64,
}

/// Month header feedback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MonthConfig {
    /// Floating month label hides after this much scroll inactivity.
    pub label_timeout_ms: u64,
}

/// Activity journal (JSONL) settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct JournalConfig {
    pub enabled: bool,
    pub path: PathBuf,
    pub fallback_path: Option<PathBuf>,
    pub max_size_bytes: u64,
    pub max_rotated_files: u32,
}

/// Filesystem paths used by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    pub preferences_file: PathBuf,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            default_past_months: 1,
            default_future_months: 1,
            max_months: 24,
            extend_step_months: 2,
            max_span_days: 366 * 3,
            safety_cap_months: 36,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            long_span_threshold_days: 31,
            row_height_px: 32.0,
            column_width_px: 95.0,
            lane_inset_px: 10.0,
            card_width_px: 85.0,
            card_gap_px: 4.0,
            min_content_width_px: 300.0,
            content_padding_px: 40.0,
        }
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            edge_buffer_px: 150.0,
            min_scroll_delta_px: 30.0,
            cooldown_ms: 3_000,
            throttle_ms: 50,
            edge_epsilon_px: 1.0,
            jump_margin_px: 100.0,
        }
    }
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min_factor: 0.5,
            max_factor: 1.0,
            step: 0.1,
            default_factor: 1.0,
        }
    }
}

impl Default for MonthConfig {
    fn default() -> Self {
        Self {
            label_timeout_ms: 1_500,
        }
    }
}

impl Default for JournalConfig {
    fn default() -> Self {
        let data = data_dir();
        Self {
            enabled: false,
            path: data.join("activity.jsonl"),
            fallback_path: None,
            max_size_bytes: 16 * 1024 * 1024,
            max_rotated_files: 3,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = home_dir();
        Self {
            config_file: home_dir.join(".config").join("timelane").join("config.toml"),
            preferences_file: data_dir().join("view-preferences.json"),
        }
    }
}

fn home_dir() -> PathBuf {
    env::var_os("HOME").map_or_else(
        || {
            eprintln!("[TL-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths");
            PathBuf::from("/tmp")
        },
        PathBuf::from,
    )
}

fn data_dir() -> PathBuf {
    home_dir().join(".local").join("share").join("timelane")
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf)
                .map_err(|source| TimelaneError::io(&path_buf, source))?;
            Self::from_toml_str(&raw)?
        } else if is_explicit_path {
            return Err(TimelaneError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(env_var)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a TOML document without env overrides or validation.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Deterministic hash of the effective config for journal records.
    ///
    /// FNV-1a over the canonical JSON form, stable across processes.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    /// Apply `TIMELANE_*` overrides using `lookup` as the variable source.
    pub fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut u32_fields: [(&str, &mut u32); 7] = [
            (
                "TIMELANE_WINDOW_DEFAULT_PAST_MONTHS",
                &mut self.window.default_past_months,
            ),
            (
                "TIMELANE_WINDOW_DEFAULT_FUTURE_MONTHS",
                &mut self.window.default_future_months,
            ),
            ("TIMELANE_WINDOW_MAX_MONTHS", &mut self.window.max_months),
            (
                "TIMELANE_WINDOW_EXTEND_STEP_MONTHS",
                &mut self.window.extend_step_months,
            ),
            ("TIMELANE_WINDOW_MAX_SPAN_DAYS", &mut self.window.max_span_days),
            (
                "TIMELANE_WINDOW_SAFETY_CAP_MONTHS",
                &mut self.window.safety_cap_months,
            ),
            (
                "TIMELANE_LAYOUT_LONG_SPAN_THRESHOLD_DAYS",
                &mut self.layout.long_span_threshold_days,
            ),
        ];
        for (name, slot) in &mut u32_fields {
            if let Some(raw) = lookup(name) {
                **slot = parse_env_u32(name, &raw)?;
            }
        }

        let mut f64_fields: [(&str, &mut f64); 10] = [
            ("TIMELANE_LAYOUT_ROW_HEIGHT_PX", &mut self.layout.row_height_px),
            (
                "TIMELANE_LAYOUT_COLUMN_WIDTH_PX",
                &mut self.layout.column_width_px,
            ),
            (
                "TIMELANE_SCROLL_EDGE_BUFFER_PX",
                &mut self.scroll.edge_buffer_px,
            ),
            (
                "TIMELANE_SCROLL_MIN_DELTA_PX",
                &mut self.scroll.min_scroll_delta_px,
            ),
            (
                "TIMELANE_SCROLL_EDGE_EPSILON_PX",
                &mut self.scroll.edge_epsilon_px,
            ),
            (
                "TIMELANE_SCROLL_JUMP_MARGIN_PX",
                &mut self.scroll.jump_margin_px,
            ),
            ("TIMELANE_ZOOM_MIN_FACTOR", &mut self.zoom.min_factor),
            ("TIMELANE_ZOOM_MAX_FACTOR", &mut self.zoom.max_factor),
            ("TIMELANE_ZOOM_STEP", &mut self.zoom.step),
            ("TIMELANE_ZOOM_DEFAULT_FACTOR", &mut self.zoom.default_factor),
        ];
        for (name, slot) in &mut f64_fields {
            if let Some(raw) = lookup(name) {
                **slot = parse_env_f64(name, &raw)?;
            }
        }

        let mut u64_fields: [(&str, &mut u64); 3] = [
            ("TIMELANE_SCROLL_COOLDOWN_MS", &mut self.scroll.cooldown_ms),
            ("TIMELANE_SCROLL_THROTTLE_MS", &mut self.scroll.throttle_ms),
            (
                "TIMELANE_MONTH_LABEL_TIMEOUT_MS",
                &mut self.month.label_timeout_ms,
            ),
        ];
        for (name, slot) in &mut u64_fields {
            if let Some(raw) = lookup(name) {
                **slot = parse_env_u64(name, &raw)?;
            }
        }

        if let Some(raw) = lookup("TIMELANE_JOURNAL_ENABLED") {
            self.journal.enabled = parse_env_bool("TIMELANE_JOURNAL_ENABLED", &raw)?;
        }
        if let Some(raw) = lookup("TIMELANE_JOURNAL_PATH") {
            self.journal.path = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("TIMELANE_PREFERENCES_FILE") {
            self.paths.preferences_file = PathBuf::from(raw);
        }

        Ok(())
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        let window = &self.window;
        if window.max_months == 0 {
            return Err(invalid("window.max_months must be >= 1"));
        }
        if window.default_past_months > window.max_months
            || window.default_future_months > window.max_months
        {
            return Err(invalid(format!(
                "window default extents ({}/{}) must be <= window.max_months ({})",
                window.default_past_months, window.default_future_months, window.max_months
            )));
        }
        if window.extend_step_months == 0 {
            return Err(invalid("window.extend_step_months must be >= 1"));
        }
        if window.safety_cap_months == 0 || window.max_span_days < 28 {
            return Err(invalid(
                "window.safety_cap_months must be >= 1 and window.max_span_days >= 28",
            ));
        }

        if self.layout.long_span_threshold_days == 0 {
            return Err(invalid("layout.long_span_threshold_days must be >= 1"));
        }
        for (name, val) in [
            ("row_height_px", self.layout.row_height_px),
            ("column_width_px", self.layout.column_width_px),
            ("card_width_px", self.layout.card_width_px),
        ] {
            if !(val.is_finite() && val > 0.0) {
                return Err(invalid(format!("layout.{name} must be > 0, got {val}")));
            }
        }
        for (name, val) in [
            ("lane_inset_px", self.layout.lane_inset_px),
            ("card_gap_px", self.layout.card_gap_px),
            ("min_content_width_px", self.layout.min_content_width_px),
            ("content_padding_px", self.layout.content_padding_px),
            ("scroll.edge_buffer_px", self.scroll.edge_buffer_px),
            ("scroll.min_scroll_delta_px", self.scroll.min_scroll_delta_px),
            ("scroll.edge_epsilon_px", self.scroll.edge_epsilon_px),
            ("scroll.jump_margin_px", self.scroll.jump_margin_px),
        ] {
            if !(val.is_finite() && val >= 0.0) {
                return Err(invalid(format!("{name} must be >= 0, got {val}")));
            }
        }
        if self.scroll.edge_epsilon_px >= self.scroll.edge_buffer_px {
            return Err(invalid(
                "scroll.edge_epsilon_px must be < scroll.edge_buffer_px",
            ));
        }

        let zoom = &self.zoom;
        if !(zoom.min_factor.is_finite()
            && zoom.max_factor.is_finite()
            && zoom.min_factor > 0.0
            && zoom.min_factor < zoom.max_factor)
        {
            return Err(invalid(format!(
                "zoom bounds must satisfy 0 < min < max; got [{}, {}]",
                zoom.min_factor, zoom.max_factor
            )));
        }
        if !(zoom.min_factor..=zoom.max_factor).contains(&zoom.default_factor) {
            return Err(invalid(format!(
                "zoom.default_factor ({}) must lie in [{}, {}]",
                zoom.default_factor, zoom.min_factor, zoom.max_factor
            )));
        }
        if !(zoom.step.is_finite() && zoom.step > 0.0) {
            return Err(invalid(format!("zoom.step must be > 0, got {}", zoom.step)));
        }

        if self.journal.enabled && self.journal.max_size_bytes == 0 {
            return Err(invalid("journal.max_size_bytes must be > 0 when enabled"));
        }

        Ok(())
    }
}

fn invalid(details: impl Into<String>) -> TimelaneError {
    TimelaneError::InvalidConfig {
        details: details.into(),
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn parse_env_u32(name: &str, raw: &str) -> Result<u32> {
    raw.trim().parse::<u32>().map_err(|e| TimelaneError::InvalidConfig {
        details: format!("{name}={raw:?} is not a valid u32: {e}"),
    })
}

fn parse_env_u64(name: &str, raw: &str) -> Result<u64> {
    raw.trim().parse::<u64>().map_err(|e| TimelaneError::InvalidConfig {
        details: format!("{name}={raw:?} is not a valid u64: {e}"),
    })
}

fn parse_env_f64(name: &str, raw: &str) -> Result<f64> {
    raw.trim().parse::<f64>().map_err(|e| TimelaneError::InvalidConfig {
        details: format!("{name}={raw:?} is not a valid float: {e}"),
    })
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(TimelaneError::InvalidConfig {
            details: format!("{name}={raw:?} is not a valid boolean"),
        }),
    }
}
