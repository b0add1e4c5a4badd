//! Slot intervals and per-machine occupancy calendars.
//!
//! A [`MachineCalendar`] tracks the blocked intervals of one machine:
//! the pre-commitment period, maintenance windows, and jobs already
//! placed during decoding. Blocked intervals are kept sorted by start
//! and pairwise disjoint.

use serde::{Deserialize, Serialize};

use super::Slot;

/// A slot interval [start, end).
///
/// Half-open interval: includes start, excludes end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Interval start (inclusive).
    pub start: Slot,
    /// Interval end (exclusive).
    pub end: Slot,
}

impl TimeWindow {
    /// Creates a new window.
    pub fn new(start: Slot, end: Slot) -> Self {
        Self { start, end }
    }

    /// Length in slots.
    #[inline]
    pub fn len(&self) -> Slot {
        self.end.saturating_sub(self.start)
    }

    /// Whether the window covers no slots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Whether a slot falls within this window.
    #[inline]
    pub fn contains(&self, slot: Slot) -> bool {
        slot >= self.start && slot < self.end
    }

    /// Whether two windows share at least one slot.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Number of slots shared with `[start, end)`.
    pub fn intersection_len(&self, start: Slot, end: Slot) -> Slot {
        let lo = self.start.max(start);
        let hi = self.end.min(end);
        hi.saturating_sub(lo)
    }
}

/// Occupancy calendar for a single machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MachineCalendar {
    blocked: Vec<TimeWindow>,
}

impl MachineCalendar {
    /// Builds a calendar from (possibly overlapping, unsorted) blocked windows.
    pub fn new(windows: impl IntoIterator<Item = TimeWindow>) -> Self {
        let mut windows: Vec<TimeWindow> = windows.into_iter().filter(|w| !w.is_empty()).collect();
        windows.sort();

        let mut blocked: Vec<TimeWindow> = Vec::with_capacity(windows.len());
        for w in windows {
            match blocked.last_mut() {
                Some(last) if w.start <= last.end => last.end = last.end.max(w.end),
                _ => blocked.push(w),
            }
        }
        Self { blocked }
    }

    /// Blocked intervals, sorted and disjoint.
    pub fn blocked(&self) -> &[TimeWindow] {
        &self.blocked
    }

    /// Whether a slot is free.
    pub fn is_free(&self, slot: Slot) -> bool {
        !self.blocked.iter().any(|w| w.contains(slot))
    }

    /// Earliest `t >= from` such that `[t, t + duration)` is free.
    ///
    /// The result may lie beyond the planning horizon; callers check it.
    pub fn earliest_fit(&self, from: Slot, duration: Slot) -> Slot {
        let mut t = from;
        let first = self.blocked.partition_point(|w| w.end <= from);
        for w in &self.blocked[first..] {
            if w.end <= t {
                continue;
            }
            if w.start >= t.saturating_add(duration) {
                break;
            }
            t = w.end;
        }
        t
    }

    /// Marks `window` as occupied. It must not overlap an existing block.
    pub fn reserve(&mut self, window: TimeWindow) {
        debug_assert!(!self.blocked.iter().any(|w| w.overlaps(&window)));
        let at = self.blocked.partition_point(|w| w.start < window.start);
        self.blocked.insert(at, window);
    }

    /// Blocked slots within `[start, end)`.
    pub fn blocked_in_range(&self, start: Slot, end: Slot) -> Slot {
        self.blocked
            .iter()
            .map(|w| w.intersection_len(start, end))
            .sum()
    }
}
