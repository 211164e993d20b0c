//! Time-ranged entries as supplied by the host, and snapshot validation.
//!
//! The host hands over a full snapshot of raw entries. Dates arrive as
//! strings and are parsed here; anything that fails to parse is set aside as
//! a [`SkippedEntry`] instead of aborting the whole snapshot.

#![allow(missing_docs)]

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::dates::parse_entry_date;
use crate::layout::overlap::DateRange;

/// One entry of the caller-owned snapshot.
///
/// `metadata` is carried through to the day index untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRangedEntry {
    pub id: String,
    pub start: String,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl TimeRangedEntry {
    pub fn new(id: impl Into<String>, start: impl Into<String>, end: Option<&str>) -> Self {
        Self {
            id: id.into(),
            start: start.into(),
            end: end.map(str::to_string),
            metadata: serde_json::Value::Null,
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Why an entry was excluded from layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    InvalidStart,
    InvalidEnd,
    DuplicateId,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidStart => write!(f, "invalid start date"),
            Self::InvalidEnd => write!(f, "invalid end date"),
            Self::DuplicateId => write!(f, "duplicate id"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub id: String,
    pub reason: SkipReason,
}

/// An entry whose dates parsed. `ordinal` is its position in the snapshot
/// and serves as the stable tie-breaker for lane assignment.
#[derive(Debug, Clone)]
pub struct ParsedEntry {
    pub entry: Arc<TimeRangedEntry>,
    pub range: DateRange,
    pub ordinal: usize,
}

impl ParsedEntry {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.entry.id
    }
}

/// Result of validating a raw snapshot.
#[derive(Debug, Clone, Default)]
pub struct ParsedSnapshot {
    pub entries: Vec<ParsedEntry>,
    pub skipped: Vec<SkippedEntry>,
    /// Ids whose end preceded their start and were collapsed to one day.
    pub normalized: Vec<String>,
}

impl ParsedSnapshot {
    #[must_use]
    pub fn skipped_ids(&self) -> Vec<String> {
        self.skipped.iter().map(|s| s.id.clone()).collect()
    }
}

/// Parse every raw entry, keeping snapshot order.
pub fn parse_snapshot(raw: &[TimeRangedEntry]) -> ParsedSnapshot {
    let mut out = ParsedSnapshot::default();
    let mut seen: HashSet<&str> = HashSet::with_capacity(raw.len());

    for (ordinal, item) in raw.iter().enumerate() {
        let Some(start) = parse_entry_date(&item.start) else {
            out.skipped.push(SkippedEntry {
                id: item.id.clone(),
                reason: SkipReason::InvalidStart,
            });
            continue;
        };

        let end = match item.end.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw_end) => match parse_entry_date(raw_end) {
                Some(end) => Some(end),
                None => {
                    out.skipped.push(SkippedEntry {
                        id: item.id.clone(),
                        reason: SkipReason::InvalidEnd,
                    });
                    continue;
                }
            },
        };

        if !seen.insert(item.id.as_str()) {
            out.skipped.push(SkippedEntry {
                id: item.id.clone(),
                reason: SkipReason::DuplicateId,
            });
            continue;
        }

        if end.is_some_and(|e| e < start) {
            out.normalized.push(item.id.clone());
        }

        out.entries.push(ParsedEntry {
            entry: Arc::new(item.clone()),
            range: DateRange::new(start, end),
            ordinal,
        });
    }

    out
}
