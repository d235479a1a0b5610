//! Which ring a segment starts and ends on.

use tracing::trace;

use crate::{Ring, SegmentEnd, SegmentEndCache};

/// Where a boundary ring of a segment comes from.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RingSource {
    /// Compute the ring from the path.
    #[default]
    Fresh,
    /// Reuse a cached segment end, texture coordinates included.
    Replay(SegmentEnd),
    /// Use a ring provided by a neighbour, already in local space.
    Seed(Ring),
}

/// Facts about one segment in a rebuild pass.
#[derive(Debug, Clone, Default)]
pub struct SeamQuery {
    /// Segment index from the path start.
    pub segment: usize,
    /// Last segment of the tunnel.
    pub is_tunnel_last: bool,
    /// Last segment of the range being rebuilt.
    pub is_last_in_range: bool,
    /// The rebuild was triggered by a local height or width change.
    pub single_point_update: bool,
    /// A junction is attached to the tunnel end.
    pub junction_at_end: bool,
    /// First ring offered by a parent junction.
    pub start_seed: Option<Ring>,
    /// Last ring offered by a snapped neighbour.
    pub end_seed: Option<Ring>,
}

/// Start and end ring sources for one segment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeamPlan {
    /// Source of the first ring.
    pub start: RingSource,
    /// Source of the last ring.
    pub end: RingSource,
}

/// Decide the boundary rings of a segment.
///
/// The first ring replays the previous segment's cached end when there is
/// one, otherwise it takes the parent seed. The last ring is always fresh
/// while a junction sits on the tunnel end; a single-point update replays
/// the segment's own cached end so the following segment stays welded; a
/// snapped tunnel end takes its partner's ring.
pub fn plan(cache: &SegmentEndCache, query: SeamQuery) -> SeamPlan {
    let cached_previous = query
        .segment
        .checked_sub(1)
        .and_then(|previous| cache.get(previous));

    let start = match (cached_previous, query.start_seed) {
        (Some(end), _) => RingSource::Replay(end.clone()),
        (None, Some(seed)) if query.segment == 0 => RingSource::Seed(seed),
        _ => {
            if query.segment > 0 {
                trace!(segment = query.segment, "no cached end for previous segment");
            }
            RingSource::Fresh
        }
    };

    let own_end = cache.get(query.segment);
    let end = if query.junction_at_end && query.is_tunnel_last {
        RingSource::Fresh
    } else if query.single_point_update && query.is_last_in_range && own_end.is_some() {
        own_end.cloned().map(RingSource::Replay).unwrap_or_default()
    } else if query.is_tunnel_last && !query.single_point_update {
        query.end_seed.map(RingSource::Seed).unwrap_or_default()
    } else {
        RingSource::Fresh
    };

    SeamPlan { start, end }
}
