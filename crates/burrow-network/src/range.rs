//! Edits, rebuild ranges and regeneration records.

use std::ops::Range;

use burrow_math::{Point3, Vec3};
use burrow_section::SectionMesh;

use crate::TunnelId;

/// Segments of a tunnel to rebuild, counted back from the free end.
///
/// `0` is the last segment. Iteration runs from `first_from_end` down to
/// `last_from_end`, which is from the path start towards the free end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildRange {
    /// Offset from the end of the first segment to rebuild.
    pub first_from_end: usize,
    /// Offset from the end of the last segment to rebuild.
    pub last_from_end: usize,
}

impl RebuildRange {
    /// Segments rebuilt after a drag: the last three plus any segment that
    /// was never built.
    pub const DRAG_DEPTH: usize = 2;

    /// Only the last segment.
    pub fn last() -> Self {
        Self::single(0)
    }

    /// One segment.
    pub fn single(from_end: usize) -> Self {
        Self {
            first_from_end: from_end,
            last_from_end: from_end,
        }
    }

    /// Every segment of a path with `segment_count` segments.
    pub fn all(segment_count: usize) -> Self {
        Self {
            first_from_end: segment_count.saturating_sub(1),
            last_from_end: 0,
        }
    }

    /// Range to rebuild after dragging a path of `segment_count` segments
    /// with `cached` segment ends on record.
    pub fn after_drag(segment_count: usize, cached: usize) -> Self {
        let last = segment_count.saturating_sub(1);
        let gap = last.saturating_sub(cached);
        Self {
            first_from_end: (last.min(Self::DRAG_DEPTH) + gap).min(last),
            last_from_end: 0,
        }
    }

    /// Segment indices counted from the path start, clamped to the path.
    pub fn segments(&self, segment_count: usize) -> Range<usize> {
        let Some(last) = segment_count.checked_sub(1) else {
            return 0..0;
        };
        let first = last - self.first_from_end.min(last);
        let end = last - self.last_from_end.min(last);
        if first > end {
            first..first
        } else {
            first..end + 1
        }
    }
}

/// Flags for a rebuild pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegenerateOptions {
    /// The pass follows a local size change; the last segment of the range
    /// keeps its cached end ring so the next segment stays welded.
    pub single_point_update: bool,
}

/// An edit of a tunnel path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathEdit {
    /// Move the free end to a local position.
    MoveEnd(Point3),
    /// Move the free end by a local offset.
    DragEnd(Vec3),
    /// Remove the last segment.
    Undo,
    /// Drop all generated state so the whole tunnel rebuilds.
    Reset,
}

/// What an edit requires from the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditOutcome {
    /// Segments to regenerate, if any.
    pub rebuild: Option<RebuildRange>,
    /// Segments, counted from the path start, whose meshes are gone.
    pub discarded: Vec<usize>,
}

/// Vertex and UV arrays produced for one segment.
#[derive(Debug, Clone)]
pub struct GeneratedSegment {
    /// Owning tunnel.
    pub tunnel: TunnelId,
    /// Segment index from the path start.
    pub segment: usize,
    /// Ground and wall arrays in tunnel-local space.
    pub mesh: SectionMesh,
    /// Number of rings.
    pub rings: usize,
    /// Triangles committed to the mesh builder.
    pub triangles: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_from_end() {
        let range = RebuildRange {
            first_from_end: 2,
            last_from_end: 0,
        };
        assert_eq!(range.segments(5), 2..5);
        assert_eq!(range.segments(2), 0..2);
        assert_eq!(range.segments(0), 0..0);
        assert_eq!(RebuildRange::single(1).segments(4), 2..3);
        assert_eq!(RebuildRange::all(6).segments(6), 0..6);
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let range = RebuildRange {
            first_from_end: 0,
            last_from_end: 2,
        };
        assert!(range.segments(5).is_empty());
    }

    #[test]
    fn test_after_drag_covers_unbuilt_gap() {
        assert_eq!(RebuildRange::after_drag(5, 5).first_from_end, 2);
        assert_eq!(RebuildRange::after_drag(5, 4).first_from_end, 2);
        assert_eq!(RebuildRange::after_drag(5, 2).first_from_end, 4);
        assert_eq!(RebuildRange::after_drag(5, 0).first_from_end, 4);
        assert_eq!(RebuildRange::after_drag(1, 0).first_from_end, 0);
        assert_eq!(RebuildRange::after_drag(2, 1).segments(2), 0..2);
    }
}
