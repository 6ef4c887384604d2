// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounded per-node cache of recent measurements.

use kurbo::{Insets, Size};
use smallvec::SmallVec;

use crate::geometry::fits_within;

/// Default number of entries kept per cache.
pub const DEFAULT_CAPACITY: usize = 4;

/// One cached measurement.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MeasureRecord {
    /// Available size the measurement was taken with (before clamping).
    pub available: Size,
    /// Total size the node asked for.
    pub requested: Size,
    /// Edge sizes of the node's own decorations.
    pub edges: Insets,
    /// Span that overlaps content rather than stacking with it.
    pub shared: Size,
    /// Size reported by the content.
    pub content: Size,
}

impl MeasureRecord {
    /// Whether this record answers a query for `available`.
    ///
    /// Exact matches always qualify. Otherwise the cached budget must have been at
    /// least as large on both axes and the cached answer must still fit in the new,
    /// smaller budget. A larger budget is never answered from the cache, because
    /// wrapping content may use extra space differently.
    pub fn reusable_for(&self, available: Size) -> bool {
        if self.available == available {
            return true;
        }
        fits_within(available, self.available) && fits_within(self.requested, available)
    }
}

/// Most-recent-first list of measurements with a fixed capacity.
#[derive(Clone, Debug)]
pub struct MeasureCache {
    entries: SmallVec<[MeasureRecord; DEFAULT_CAPACITY]>,
    capacity: usize,
}

impl Default for MeasureCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl MeasureCache {
    /// Create an empty cache holding at most `capacity` entries (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: SmallVec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Look up a measurement usable for `available`.
    pub fn try_get(&self, available: Size) -> Option<MeasureRecord> {
        self.entries
            .iter()
            .find(|e| e.available == available)
            .or_else(|| self.entries.iter().find(|e| e.reusable_for(available)))
            .copied()
    }

    /// Look up a measurement, clearing the cache when the newest entry no longer fits.
    ///
    /// A budget that dropped below what the node last required means every older
    /// answer was computed for a layout that no longer exists.
    pub fn get_or_evict(&mut self, available: Size) -> Option<MeasureRecord> {
        let hit = self.try_get(available);
        if hit.is_none()
            && let Some(newest) = self.entries.first()
            && !fits_within(newest.requested, available)
        {
            self.entries.clear();
        }
        hit
    }

    /// Store a measurement as the newest entry, replacing any entry with the same
    /// available size and dropping the oldest entry beyond capacity.
    pub fn insert(&mut self, record: MeasureRecord) {
        if let Some(pos) = self
            .entries
            .iter()
            .position(|e| e.available == record.available)
        {
            self.entries.remove(pos);
        }
        self.entries.insert(0, record);
        self.entries.truncate(self.capacity);
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
