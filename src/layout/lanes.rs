//! Greedy first-fit lane assignment for overlapping entries.
//!
//! Entries are visited by ascending start date (ties broken by snapshot
//! order) and each one takes the lowest lane whose occupants it does not
//! overlap. Because visiting order is by start, a lane is free for the
//! current entry exactly when the latest end already placed there is before
//! the current start, so one end date per lane replaces a full rescan of the
//! lane's occupants.

#![allow(missing_docs)]

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::layout::entry::{ParsedEntry, ParsedSnapshot, SkippedEntry, TimeRangedEntry, parse_snapshot};

/// One entry with its lane.
#[derive(Debug, Clone)]
pub struct LanedEntry {
    pub parsed: ParsedEntry,
    pub lane: usize,
}

/// Lane map derived from one snapshot. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct LaneAssignment {
    /// Entries in assignment order (start ascending, then snapshot order).
    ordered: Vec<LanedEntry>,
    by_id: HashMap<String, usize>,
    max_lane: usize,
}

impl LaneAssignment {
    /// Lane of an entry by id.
    #[must_use]
    pub fn lane_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).map(|&idx| self.ordered[idx].lane)
    }

    /// Highest lane in use; 0 when there are no entries.
    #[must_use]
    pub const fn max_lane(&self) -> usize {
        self.max_lane
    }

    /// Number of lanes the layout must reserve.
    #[must_use]
    pub fn lane_count(&self) -> usize {
        if self.ordered.is_empty() {
            0
        } else {
            self.max_lane + 1
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[LanedEntry] {
        &self.ordered
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// `(id, lane)` pairs in assignment order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.ordered.iter().map(|e| (e.parsed.id(), e.lane))
    }
}

/// Assign lanes to already-parsed entries.
#[must_use]
pub fn assign_parsed(entries: &[ParsedEntry]) -> LaneAssignment {
    let mut sorted: Vec<&ParsedEntry> = entries.iter().collect();
    sorted.sort_by_key(|e| (e.range.start(), e.ordinal));

    let mut lane_ends: Vec<NaiveDate> = Vec::new();
    let mut ordered = Vec::with_capacity(sorted.len());
    let mut by_id = HashMap::with_capacity(sorted.len());
    let mut max_lane = 0;

    for entry in sorted {
        let start = entry.range.start();
        let lane = match lane_ends.iter().position(|end| *end < start) {
            Some(free) => {
                lane_ends[free] = entry.range.end();
                free
            }
            None => {
                lane_ends.push(entry.range.end());
                lane_ends.len() - 1
            }
        };
        max_lane = max_lane.max(lane);
        by_id.insert(entry.id().to_string(), ordered.len());
        ordered.push(LanedEntry {
            parsed: entry.clone(),
            lane,
        });
    }

    LaneAssignment {
        ordered,
        by_id,
        max_lane,
    }
}

/// Parse a raw snapshot and assign lanes. Malformed entries are returned in
/// the skipped list; this never fails.
#[must_use]
pub fn assign_lanes(raw: &[TimeRangedEntry]) -> (LaneAssignment, Vec<SkippedEntry>) {
    let ParsedSnapshot {
        entries, skipped, ..
    } = parse_snapshot(raw);
    (assign_parsed(&entries), skipped)
}
