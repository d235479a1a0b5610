//! Connection resolution: snapping free ends together and handing boundary
//! rings across tunnels and junctions.

use burrow_junction::ExitDirection;
use burrow_math::{lerp_point, normalize_or_zero, Point3, Transform, Vec3};
use burrow_path::PointKind;
use burrow_section::{ExitRing, Ring, SegmentEnd, SideMask};
use tracing::{debug, trace};

use crate::{Connection, JunctionId, Network, PathEnd, Result, Tunnel, TunnelId, TunnelOrigin};

/// A free end another tunnel may snap to, in world space.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    tunnel: TunnelId,
    end: PathEnd,
    position: Point3,
    /// Direction of travel through the end.
    direction: Vec3,
    distance: f64,
}

fn end_position(tunnel: &Tunnel, end: PathEnd) -> Option<Point3> {
    let point = match end {
        PathEnd::Start => tunnel.path.points().first(),
        PathEnd::End => tunnel.path.last_point(),
    }?;
    Some(tunnel.transform.apply_point(&point.position))
}

fn end_direction(tunnel: &Tunnel, end: PathEnd) -> Vec3 {
    let index = match end {
        PathEnd::Start => 0,
        PathEnd::End => tunnel.path.len().saturating_sub(1),
    };
    normalize_or_zero(&tunnel.transform.apply_vec(&tunnel.path.direction_at_point(index)))
}

/// True when `link` is empty or already pairs with `(id, end)`.
fn free_for(link: &Option<Connection>, id: TunnelId, end: PathEnd) -> bool {
    match link {
        None => true,
        Some(c) => c.other == id && c.other_end == end,
    }
}

impl Network {
    /// Snap a tunnel's free end to the closest free end in range.
    ///
    /// Candidates are the starts of tunnels without a parent junction, the
    /// ends of tunnels without a junction, and the tunnel's own start once
    /// it has two segments. A candidate qualifies when it is closer than the
    /// snap distance and does not lie behind the end's direction of travel.
    /// On a match the end takes the candidate's position and heading and
    /// both tunnels record the pairing; otherwise any pairing is cleared.
    pub fn try_snap_end(&mut self, id: TunnelId) -> Result<Option<Connection>> {
        let tunnel = self.get(id)?;
        if tunnel.junction.is_some() || tunnel.path.is_degenerate() {
            return Ok(None);
        }
        let Some(position) = end_position(tunnel, PathEnd::End) else {
            return Ok(None);
        };
        let direction = end_direction(tunnel, PathEnd::End);
        let threshold = self.config.snapping.snap_distance;

        let mut best: Option<Candidate> = None;
        for (other_id, other) in self.tunnels.iter() {
            if other.path.is_degenerate() {
                continue;
            }
            let mut ends = Vec::with_capacity(2);
            let own = other_id == id;
            if matches!(other.origin, TunnelOrigin::Root)
                && free_for(&other.start_link, id, PathEnd::End)
                && (!own || other.path.segment_count() >= 2)
            {
                ends.push(PathEnd::Start);
            }
            if !own && other.junction.is_none() && free_for(&other.end_link, id, PathEnd::End) {
                ends.push(PathEnd::End);
            }

            for end in ends {
                let Some(candidate) = end_position(other, end) else {
                    continue;
                };
                let distance = (candidate - position).norm();
                let facing = normalize_or_zero(&(candidate - position)).dot(&direction);
                trace!(?other_id, ?end, distance, facing, "snap candidate");
                if distance >= threshold || facing < 0.0 {
                    continue;
                }
                if best.is_some_and(|b| b.distance <= distance) {
                    continue;
                }
                best = Some(Candidate {
                    tunnel: other_id,
                    end,
                    position: candidate,
                    direction: end_direction(other, end),
                    distance,
                });
            }
        }

        self.clear_end_link(id);
        let Some(candidate) = best else {
            return Ok(None);
        };
        self.snap_to(id, candidate).map(Some)
    }

    fn snap_to(&mut self, id: TunnelId, candidate: Candidate) -> Result<Connection> {
        let snapping = self.config.snapping;
        let other_transform = self.get(candidate.tunnel)?.transform.clone();
        let tunnel = self.get_mut(id)?;
        let to_world = tunnel.transform.clone();
        let to_local = to_world.rigid_inverse();

        // Travel continues out of a start and back into an end.
        let heading = match candidate.end {
            PathEnd::Start => candidate.direction,
            PathEnd::End => -candidate.direction,
        };
        let position = to_local.apply_point(&candidate.position);
        let heading = normalize_or_zero(&to_local.apply_vec(&heading));

        let last = tunnel.path.len() - 1;
        if last >= 2 {
            let penultimate = tunnel.path.points()[last - 1].position;
            let approach = position - heading * snapping.approach_distance;
            tunnel.path.set_position(
                last - 1,
                lerp_point(&approach, &penultimate, snapping.approach_lerp),
            );
        }
        let chord = (position - tunnel.path.points()[last - 1].position).norm();
        tunnel.path.set_position(last, position);
        tunnel.path.set_tangent(last, heading * chord);

        let connection = Connection {
            other: candidate.tunnel,
            other_end: candidate.end,
            to_local: Transform::between(&other_transform, &to_world),
        };
        tunnel.end_link = Some(connection.clone());

        let partner = self.get_mut(candidate.tunnel)?;
        *partner.link_mut(candidate.end) = Some(Connection {
            other: id,
            other_end: PathEnd::End,
            to_local: Transform::between(&to_world, &other_transform),
        });
        debug!(?id, other = ?candidate.tunnel, end = ?candidate.end, "end snapped");
        Ok(connection)
    }

    /// Drop the pairing on a tunnel's end and on its partner.
    pub(crate) fn clear_end_link(&mut self, id: TunnelId) {
        let Some(tunnel) = self.tunnels.get_mut(id) else {
            return;
        };
        let Some(link) = tunnel.end_link.take() else {
            return;
        };
        if let Some(last) = tunnel.path.len().checked_sub(1) {
            tunnel.path.set_kind(last, PointKind::Curve);
        }
        if let Some(partner) = self.tunnels.get_mut(link.other) {
            let back = partner.link_mut(link.other_end);
            if back.as_ref().is_some_and(|c| c.other == id) {
                *back = None;
            }
        }
        debug!(?id, other = ?link.other, "end unsnapped");
    }

    /// Drop the pairing on a tunnel's start and on its partner.
    pub(crate) fn clear_start_link(&mut self, id: TunnelId) {
        let Some(link) = self.tunnels.get_mut(id).and_then(|t| t.start_link.take()) else {
            return;
        };
        if let Some(partner) = self.tunnels.get_mut(link.other) {
            let back = partner.link_mut(link.other_end);
            if back.as_ref().is_some_and(|c| c.other == id) {
                *back = None;
            }
            if link.other_end == PathEnd::End {
                if let Some(last) = partner.path.len().checked_sub(1) {
                    partner.path.set_kind(last, PointKind::Curve);
                }
            }
        }
    }

    /// Ring at `end` of a partner, as seen travelling into or out of it from
    /// the connected side, in the partner's local space.
    fn partner_ring(&self, link: &Connection, arriving: bool) -> Option<Ring> {
        let ring = self.end_ring(link.other, link.other_end)?;
        // Arriving at a start or leaving from an end keeps the direction of
        // travel; meeting end to end or start to start flips it.
        let same_direction = match (arriving, link.other_end) {
            (true, PathEnd::Start) | (false, PathEnd::End) => true,
            (true, PathEnd::End) | (false, PathEnd::Start) => false,
        };
        if same_direction {
            Some(ring)
        } else {
            let layout = self.config.layout;
            Some(SegmentEnd::from_ring(&layout, &ring).reversed().to_ring())
        }
    }

    /// First ring a tunnel must start on, in its local space.
    pub(crate) fn start_seed(&self, id: TunnelId) -> Option<Ring> {
        let tunnel = self.tunnels.get(id)?;
        match tunnel.origin {
            TunnelOrigin::Junction { junction, exit } => {
                let junction = self.junctions.get(junction)?;
                let ring = junction.exits.get(exit)?.to_ring();
                Some(ring.transformed(&Transform::between(&junction.transform, &tunnel.transform)))
            }
            TunnelOrigin::Root => {
                let link = tunnel.start_link.as_ref()?;
                let ring = self.partner_ring(link, false)?;
                Some(ring.transformed(&link.to_local))
            }
        }
    }

    /// Last ring a snapped tunnel must end on, in its local space.
    pub(crate) fn end_seed(&self, id: TunnelId) -> Option<Ring> {
        let tunnel = self.tunnels.get(id)?;
        if tunnel.junction.is_some() {
            return None;
        }
        let link = tunnel.end_link.as_ref()?;
        let ring = self.partner_ring(link, true)?;
        Some(ring.transformed(&link.to_local))
    }

    /// Walls tapering out of the tunnel start.
    pub(crate) fn start_taper(&self, id: TunnelId) -> SideMask {
        let Some(tunnel) = self.tunnels.get(id) else {
            return SideMask::NONE;
        };
        match tunnel.origin {
            TunnelOrigin::Junction { junction, exit } => {
                let Some(junction) = self.junctions.get(junction) else {
                    return SideMask::NONE;
                };
                let kind = junction.kind;
                match exit {
                    ExitDirection::Straight => SideMask {
                        right: kind.right_open(),
                        left: kind.left_open(),
                    },
                    ExitDirection::Right => SideMask {
                        right: true,
                        left: kind.straight_open(),
                    },
                    ExitDirection::Left => SideMask {
                        right: kind.straight_open(),
                        left: true,
                    },
                }
            }
            TunnelOrigin::Root if tunnel.start_link.is_some() => SideMask::BOTH,
            TunnelOrigin::Root => SideMask::NONE,
        }
    }

    /// Walls tapering into the tunnel end.
    pub(crate) fn end_taper(&self, id: TunnelId) -> SideMask {
        let Some(tunnel) = self.tunnels.get(id) else {
            return SideMask::NONE;
        };
        if let Some(junction) = tunnel.junction.and_then(|j| self.junctions.get(j)) {
            return SideMask {
                right: junction.kind.right_open(),
                left: junction.kind.left_open(),
            };
        }
        if tunnel.end_link.is_some() {
            SideMask::BOTH
        } else {
            SideMask::NONE
        }
    }

    /// Most recent exit ring of a junction, in the junction's local space.
    pub fn exit_ring(&self, id: JunctionId, direction: ExitDirection) -> Option<ExitRing> {
        self.junctions.get(id)?.exits.get(direction).cloned()
    }
}
