//! Registry records: tunnels, junctions and the links between them.

use std::collections::BTreeMap;

use burrow_junction::{ExitDirection, ExitRings, JunctionKind};
use burrow_math::Transform;
use burrow_path::Path;
use burrow_section::{ExitRing, Ring, SectionShape, SegmentEndCache};
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Handle of a tunnel in a [`Network`](crate::Network).
    pub struct TunnelId;
    /// Handle of a junction in a [`Network`](crate::Network).
    pub struct JunctionId;
}

/// One of the two ends of a tunnel path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathEnd {
    /// The first control point.
    Start,
    /// The last control point, the one that gets dragged.
    End,
}

/// One side of a symmetric end-to-end pairing.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    /// The partner tunnel; may be the tunnel itself for a loop.
    pub other: TunnelId,
    /// Which end of the partner is joined.
    pub other_end: PathEnd,
    /// Maps the partner's local space into this tunnel's local space.
    pub to_local: Transform,
}

/// Where a tunnel starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunnelOrigin {
    /// Placed freely; its start can snap.
    Root,
    /// Spawned from a junction exit.
    Junction {
        /// The parent junction.
        junction: JunctionId,
        /// The exit the tunnel leaves through.
        exit: ExitDirection,
    },
}

/// A tunnel: a path in its own local frame plus the generation state that
/// lets it be rebuilt incrementally.
#[derive(Debug, Clone)]
pub struct Tunnel {
    pub(crate) origin: TunnelOrigin,
    pub(crate) transform: Transform,
    pub(crate) path: Path,
    pub(crate) shape: SectionShape,
    pub(crate) segment_shapes: BTreeMap<usize, SectionShape>,
    pub(crate) ends: SegmentEndCache,
    pub(crate) start_ring: Option<Ring>,
    pub(crate) start_link: Option<Connection>,
    pub(crate) end_link: Option<Connection>,
    pub(crate) junction: Option<JunctionId>,
}

impl Tunnel {
    pub(crate) fn new(origin: TunnelOrigin, transform: Transform, path: Path, shape: SectionShape) -> Self {
        Self {
            origin,
            transform,
            path,
            shape,
            segment_shapes: BTreeMap::new(),
            ends: SegmentEndCache::new(),
            start_ring: None,
            start_link: None,
            end_link: None,
            junction: None,
        }
    }

    /// Local to world transform.
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Control points in local space.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the tunnel starts.
    pub fn origin(&self) -> TunnelOrigin {
        self.origin
    }

    /// Default cross-section.
    pub fn shape(&self) -> SectionShape {
        self.shape
    }

    /// Cross-section of `segment`, honouring per-segment resizes.
    pub fn shape_for(&self, segment: usize) -> SectionShape {
        self.segment_shapes.get(&segment).copied().unwrap_or(self.shape)
    }

    /// Cached segment end rings.
    pub fn ends(&self) -> &SegmentEndCache {
        &self.ends
    }

    /// First ring of segment 0, once generated.
    pub fn start_ring(&self) -> Option<&Ring> {
        self.start_ring.as_ref()
    }

    /// Junction attached to the end.
    pub fn junction(&self) -> Option<JunctionId> {
        self.junction
    }

    /// Pairing of the start, if snapped.
    pub fn start_connection(&self) -> Option<&Connection> {
        self.start_link.as_ref()
    }

    /// Pairing of the end, if snapped.
    pub fn end_connection(&self) -> Option<&Connection> {
        self.end_link.as_ref()
    }

    /// True when either end is snapped to a tunnel.
    pub fn is_connected(&self) -> bool {
        self.start_link.is_some() || self.end_link.is_some()
    }

    pub(crate) fn link_mut(&mut self, end: PathEnd) -> &mut Option<Connection> {
        match end {
            PathEnd::Start => &mut self.start_link,
            PathEnd::End => &mut self.end_link,
        }
    }

    /// Forget generated state past the current segment count.
    pub(crate) fn truncate(&mut self) -> Vec<usize> {
        let count = self.path.segment_count();
        self.segment_shapes.split_off(&count);
        let dropped = self.ends.truncate(count);
        if count == 0 {
            self.start_ring = None;
        }
        dropped
    }
}

/// A junction joining a parent tunnel end to up to three children.
#[derive(Debug, Clone)]
pub struct Junction {
    pub(crate) kind: JunctionKind,
    pub(crate) shape: SectionShape,
    pub(crate) transform: Transform,
    pub(crate) parent: Option<TunnelId>,
    pub(crate) children: Vec<(ExitDirection, TunnelId)>,
    pub(crate) entry: Option<ExitRing>,
    pub(crate) exits: ExitRings,
}

impl Junction {
    /// Which sides open.
    pub fn kind(&self) -> JunctionKind {
        self.kind
    }

    /// Cross-section.
    pub fn shape(&self) -> SectionShape {
        self.shape
    }

    /// Local to world transform.
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// The tunnel this junction sits on; `None` once that tunnel is removed.
    pub fn parent(&self) -> Option<TunnelId> {
        self.parent
    }

    /// Spawned child tunnels by exit.
    pub fn children(&self) -> &[(ExitDirection, TunnelId)] {
        &self.children
    }

    /// The parent ring the last walk started from.
    pub fn entry(&self) -> Option<&ExitRing> {
        self.entry.as_ref()
    }

    /// Most recently published exit rings, in local space.
    pub fn exits(&self) -> &ExitRings {
        &self.exits
    }
}
