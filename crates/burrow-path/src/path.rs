//! The path curve and its distance queries.

use burrow_math::{flatten, up, Point3, Vec3};
use serde::{Deserialize, Serialize};

use crate::hermite::{parameter_at_length, HermiteSegment};

/// How a control point's tangent is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointKind {
    /// Tangent derived from the neighbouring points.
    #[default]
    Curve,
    /// Tangent set explicitly and kept across edits.
    CustomTangent,
    /// The segment leaving this point is a straight chord.
    Linear,
}

/// A control point of a tunnel path, in the tunnel's local space.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlPoint {
    /// Position of the point.
    pub position: Point3,
    /// Tangent at the point. Recomputed on every edit unless the kind is
    /// [`PointKind::CustomTangent`].
    pub tangent: Vec3,
    /// Tangent mode.
    pub kind: PointKind,
}

impl ControlPoint {
    /// An auto-tangent point.
    pub fn curve(position: Point3) -> Self {
        Self {
            position,
            tangent: Vec3::zeros(),
            kind: PointKind::Curve,
        }
    }

    /// A point with a fixed tangent.
    pub fn with_tangent(position: Point3, tangent: Vec3) -> Self {
        Self {
            position,
            tangent,
            kind: PointKind::CustomTangent,
        }
    }
}

/// An arc-length parametrized chain of cubic Hermite segments.
///
/// Fewer than two points is a valid, degenerate state: every query returns a
/// harmless default instead of failing.
#[derive(Debug, Clone)]
pub struct Path {
    points: Vec<ControlPoint>,
    /// Cumulative chord lengths per segment.
    tables: Vec<Vec<f64>>,
    /// Distance along the path at each control point.
    distances: Vec<f64>,
}

impl Path {
    /// Build a path from control points.
    pub fn new(points: Vec<ControlPoint>) -> Self {
        let mut path = Self {
            points,
            tables: Vec::new(),
            distances: Vec::new(),
        };
        path.update();
        path
    }

    /// Build an auto-tangent path through the given positions.
    pub fn from_positions(positions: &[Point3]) -> Self {
        Self::new(positions.iter().copied().map(ControlPoint::curve).collect())
    }

    /// The two-point path a freshly placed tunnel starts with.
    pub fn starter() -> Self {
        Self::new(vec![
            ControlPoint::with_tangent(Point3::origin(), Vec3::new(100.0, 0.0, 0.0)),
            ControlPoint::curve(Point3::new(300.0, 0.0, 0.0)),
        ])
    }

    /// Number of control points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when there are no control points at all.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True when the path cannot produce any segment.
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 2
    }

    /// Number of segments between consecutive points.
    pub fn segment_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    /// All control points.
    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    /// Control point by index.
    pub fn point(&self, index: usize) -> Option<&ControlPoint> {
        self.points.get(index)
    }

    /// The last control point (the free, draggable end).
    pub fn last_point(&self) -> Option<&ControlPoint> {
        self.points.last()
    }

    /// Move a control point.
    pub fn set_position(&mut self, index: usize, position: Point3) {
        if let Some(p) = self.points.get_mut(index) {
            p.position = position;
            self.update();
        }
    }

    /// Pin a control point's tangent.
    pub fn set_tangent(&mut self, index: usize, tangent: Vec3) {
        if let Some(p) = self.points.get_mut(index) {
            p.tangent = tangent;
            p.kind = PointKind::CustomTangent;
            self.update();
        }
    }

    /// Change a control point's tangent mode.
    pub fn set_kind(&mut self, index: usize, kind: PointKind) {
        if let Some(p) = self.points.get_mut(index) {
            p.kind = kind;
            self.update();
        }
    }

    /// Insert an auto-tangent point before `index` (clamped to the end).
    pub fn insert_point(&mut self, index: usize, position: Point3) {
        let index = index.min(self.points.len());
        self.points.insert(index, ControlPoint::curve(position));
        self.update();
    }

    /// Split the path at `distance`, returning the new point's index.
    ///
    /// Returns `None` for a degenerate path.
    pub fn insert_point_at_distance(&mut self, distance: f64) -> Option<usize> {
        let (segment, _) = self.locate(distance)?;
        let position = self.position_at_distance(distance);
        self.insert_point(segment + 1, position);
        Some(segment + 1)
    }

    /// Remove a control point.
    pub fn remove_point(&mut self, index: usize) -> Option<ControlPoint> {
        if index >= self.points.len() {
            return None;
        }
        let removed = self.points.remove(index);
        self.update();
        Some(removed)
    }

    /// Total arc length.
    pub fn total_length(&self) -> f64 {
        self.distances.last().copied().unwrap_or(0.0)
    }

    /// Arc length from the start to control point `index` (clamped).
    pub fn distance_at_point(&self, index: usize) -> f64 {
        match self.distances.get(index) {
            Some(d) => *d,
            None => self.total_length(),
        }
    }

    /// Arc length of segment `index`.
    pub fn segment_length(&self, index: usize) -> f64 {
        self.distance_between(index, index + 1)
    }

    /// Arc length between two control points.
    pub fn distance_between(&self, a: usize, b: usize) -> f64 {
        (self.distance_at_point(b) - self.distance_at_point(a)).abs()
    }

    /// Segment index and local parameter at `distance`.
    pub fn locate(&self, distance: f64) -> Option<(usize, f64)> {
        if self.is_degenerate() {
            return None;
        }
        let d = distance.clamp(0.0, self.total_length());
        let last = self.segment_count() - 1;
        // Segment whose end lies at or beyond `d`.
        let segment = self.distances[1..]
            .partition_point(|&end| end < d)
            .min(last);
        let local = d - self.distances[segment];
        Some((segment, parameter_at_length(&self.tables[segment], local)))
    }

    /// Position at `distance` along the path.
    pub fn position_at_distance(&self, distance: f64) -> Point3 {
        match self.locate(distance) {
            Some((segment, t)) => self.segment(segment).evaluate(t),
            None => self
                .points
                .first()
                .map(|p| p.position)
                .unwrap_or_else(Point3::origin),
        }
    }

    /// Unit direction of travel at `distance`.
    pub fn direction_at_distance(&self, distance: f64) -> Vec3 {
        let derivative = match self.locate(distance) {
            Some((segment, t)) => self.segment(segment).derivative(t),
            None => Vec3::x(),
        };
        derivative.try_normalize(1e-12).unwrap_or_else(Vec3::x)
    }

    /// Horizontal unit vector pointing to the right of travel at `distance`.
    pub fn right_at_distance(&self, distance: f64) -> Vec3 {
        let direction = self.direction_at_distance(distance);
        flatten(&direction.cross(&up())).unwrap_or_else(|| -Vec3::y())
    }

    /// Horizontal unit forward vector at `distance`, perpendicular to the right
    /// vector.
    pub fn forward_at_distance(&self, distance: f64) -> Vec3 {
        up().cross(&self.right_at_distance(distance))
    }

    /// Unit direction of travel at control point `index`.
    pub fn direction_at_point(&self, index: usize) -> Vec3 {
        self.direction_at_distance(self.distance_at_point(index))
    }

    fn segment(&self, index: usize) -> HermiteSegment {
        let a = &self.points[index];
        let b = &self.points[index + 1];
        HermiteSegment {
            p0: a.position,
            m0: a.tangent,
            p1: b.position,
            m1: b.tangent,
            linear: a.kind == PointKind::Linear,
        }
    }

    /// Recompute auto tangents and the arc-length tables.
    fn update(&mut self) {
        let n = self.points.len();
        for i in 0..n {
            if self.points[i].kind == PointKind::CustomTangent {
                continue;
            }
            let tangent = if n < 2 {
                Vec3::zeros()
            } else if i == 0 {
                self.points[1].position - self.points[0].position
            } else if i == n - 1 {
                self.points[i].position - self.points[i - 1].position
            } else if self.points[i].kind == PointKind::Linear {
                self.points[i + 1].position - self.points[i].position
            } else {
                (self.points[i + 1].position - self.points[i - 1].position) * 0.5
            };
            self.points[i].tangent = tangent;
        }

        self.tables = (0..self.segment_count())
            .map(|i| self.segment(i).arc_table())
            .collect();
        self.distances = Vec::with_capacity(n);
        let mut total = 0.0;
        if n > 0 {
            self.distances.push(0.0);
        }
        for table in &self.tables {
            total += table.last().copied().unwrap_or(0.0);
            self.distances.push(total);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn straight(points: usize, spacing: f64) -> Path {
        let positions: Vec<Point3> = (0..points)
            .map(|i| Point3::new(i as f64 * spacing, 0.0, 0.0))
            .collect();
        Path::from_positions(&positions)
    }

    #[test]
    fn test_straight_lengths() {
        let path = straight(3, 750.0);
        assert_eq!(path.segment_count(), 2);
        assert_relative_eq!(path.total_length(), 1500.0, epsilon = 1e-9);
        assert_relative_eq!(path.distance_at_point(1), 750.0, epsilon = 1e-9);
        assert_relative_eq!(path.segment_length(1), 750.0, epsilon = 1e-9);
    }

    #[test]
    fn test_position_and_frame_on_x_axis() {
        let path = straight(2, 300.0);
        let p = path.position_at_distance(120.0);
        assert_relative_eq!(p.x, 120.0, epsilon = 1e-6);
        let right = path.right_at_distance(120.0);
        assert_relative_eq!(right.y, -1.0, epsilon = 1e-12);
        let forward = path.forward_at_distance(120.0);
        assert_relative_eq!(forward.x, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_distance_clamped() {
        let path = straight(2, 300.0);
        assert_relative_eq!(path.position_at_distance(-10.0).x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(path.position_at_distance(1e6).x, 300.0, epsilon = 1e-9);
        assert_relative_eq!(path.distance_at_point(99), 300.0, epsilon = 1e-9);
    }

    #[test]
    fn test_degenerate_path_queries() {
        let path = Path::new(vec![ControlPoint::curve(Point3::new(1.0, 2.0, 3.0))]);
        assert!(path.is_degenerate());
        assert_eq!(path.segment_count(), 0);
        assert_eq!(path.total_length(), 0.0);
        assert_eq!(path.position_at_distance(5.0), Point3::new(1.0, 2.0, 3.0));
        assert_eq!(path.direction_at_distance(5.0), Vec3::x());
        assert!(path.locate(0.0).is_none());
    }

    #[test]
    fn test_insert_at_distance_keeps_straight_line() {
        let mut path = straight(2, 1000.0);
        let index = path.insert_point_at_distance(400.0).unwrap();
        assert_eq!(index, 1);
        assert_eq!(path.len(), 3);
        assert_relative_eq!(path.point(1).unwrap().position.x, 400.0, epsilon = 1e-6);
        assert_relative_eq!(path.total_length(), 1000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_remove_point() {
        let mut path = straight(4, 100.0);
        let removed = path.remove_point(2).unwrap();
        assert_relative_eq!(removed.position.x, 200.0);
        assert_eq!(path.len(), 3);
        assert!(path.remove_point(10).is_none());
    }

    #[test]
    fn test_custom_tangent_survives_update() {
        let mut path = straight(3, 100.0);
        path.set_tangent(2, Vec3::new(0.0, 50.0, 0.0));
        path.set_position(1, Point3::new(100.0, 10.0, 0.0));
        let p = path.point(2).unwrap();
        assert_eq!(p.kind, PointKind::CustomTangent);
        assert_eq!(p.tangent, Vec3::new(0.0, 50.0, 0.0));
    }

    #[test]
    fn test_curved_path_longer_than_chord() {
        let path = Path::from_positions(&[
            Point3::origin(),
            Point3::new(500.0, 500.0, 0.0),
            Point3::new(1000.0, 0.0, 0.0),
        ]);
        let chord = 2.0 * (500.0f64 * 500.0 * 2.0).sqrt();
        assert!(path.total_length() >= chord - 1e-6);
        let mid = path.position_at_distance(path.distance_at_point(1));
        assert_relative_eq!(mid.x, 500.0, epsilon = 1e-6);
        assert_relative_eq!(mid.y, 500.0, epsilon = 1e-6);
    }

    #[test]
    fn test_linear_segment() {
        let mut path = Path::from_positions(&[Point3::origin(), Point3::new(0.0, 100.0, 0.0)]);
        path.set_kind(0, PointKind::Linear);
        let p = path.position_at_distance(25.0);
        assert_relative_eq!(p.y, 25.0, epsilon = 1e-9);
        let right = path.right_at_distance(25.0);
        assert_relative_eq!(right.x, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_vertical_direction_right_fallback() {
        let path = Path::from_positions(&[Point3::origin(), Point3::new(0.0, 0.0, 100.0)]);
        assert_eq!(path.right_at_distance(50.0), -Vec3::y());
    }
}
