//! Per-tunnel store of the last ring of every generated segment.

use std::collections::BTreeMap;

use crate::SegmentEnd;

/// Cached segment end rings, keyed by segment index counted from the path
/// start.
///
/// The end ring of segment `i` is the start ring of segment `i + 1`; replaying
/// it keeps both meshes welded.
#[derive(Debug, Clone, Default)]
pub struct SegmentEndCache {
    ends: BTreeMap<usize, SegmentEnd>,
}

impl SegmentEndCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// End ring of `segment`, if it has been generated.
    pub fn get(&self, segment: usize) -> Option<&SegmentEnd> {
        self.ends.get(&segment)
    }

    /// Record the end ring of `segment`, replacing any older one.
    pub fn store(&mut self, segment: usize, end: SegmentEnd) {
        self.ends.insert(segment, end);
    }

    /// Forget the end ring of `segment`.
    pub fn remove(&mut self, segment: usize) -> Option<SegmentEnd> {
        self.ends.remove(&segment)
    }

    /// Forget every entry at or past `segment_count`.
    pub fn truncate(&mut self, segment_count: usize) -> Vec<usize> {
        let dropped = self.ends.split_off(&segment_count);
        dropped.into_keys().collect()
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.ends.clear();
    }

    /// Number of cached segment ends.
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    /// The entry with the highest segment index.
    pub fn last(&self) -> Option<(usize, &SegmentEnd)> {
        self.ends.iter().next_back().map(|(k, v)| (*k, v))
    }

    /// Cached segment indices in ascending order.
    pub fn segments(&self) -> impl Iterator<Item = usize> + '_ {
        self.ends.keys().copied()
    }
}
