//! Point-spacing policy applied while the free end of a path is dragged.

use burrow_math::Point3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Path;

/// Local position the free end returns to when the last segment is undone.
pub const DEFAULT_END_POSITION: [f64; 3] = [200.0, 0.0, 0.0];

/// Spacing rules for control points near the free end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditPolicy {
    /// Longest allowed distance between the last two points before new
    /// points are inserted.
    pub max_spacing: f64,
    /// How far the last inserted point is pulled back from the regular
    /// spacing. Also the shortest last segment kept when more than three
    /// points exist.
    pub end_offset: f64,
}

impl Default for EditPolicy {
    fn default() -> Self {
        Self {
            max_spacing: 750.0,
            end_offset: 200.0,
        }
    }
}

/// What the spacing policy did to the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    /// Nothing changed.
    Unchanged,
    /// `count` points were inserted starting at index `first`.
    Inserted {
        /// Index of the first inserted point.
        first: usize,
        /// Number of inserted points.
        count: usize,
    },
    /// The penultimate point was removed, merging the last two segments.
    RemovedPenultimate {
        /// True when the removal was caused by the end doubling back.
        reversed: bool,
    },
}

/// What an undo did to the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoOutcome {
    /// The last point and its segment were removed.
    RemovedLast,
    /// Only two points remained; the free end was moved back home.
    ResetEnd,
    /// The path had no segment to undo.
    Unchanged,
}

impl EditPolicy {
    /// Enforce the spacing rules after the free end moved.
    pub fn apply(&self, path: &mut Path) -> DragOutcome {
        let n = path.len();
        if n < 2 {
            return DragOutcome::Unchanged;
        }

        if n > 2 {
            let last = path.direction_at_point(n - 1);
            let previous = path.direction_at_point(n - 2);
            if last.dot(&previous) < 0.0 {
                debug!(points = n, "free end doubled back, dropping penultimate point");
                path.remove_point(n - 2);
                return DragOutcome::RemovedPenultimate { reversed: true };
            }
        }

        let spacing = path.distance_between(n - 2, n - 1);
        let count = if self.max_spacing > 0.0 {
            (spacing / self.max_spacing).floor() as usize
        } else {
            0
        };

        if count > 0 {
            let first = n - 1;
            for i in 1..=count {
                let anchor = path.len() - 2;
                let mut distance = path.distance_at_point(anchor) + self.max_spacing;
                if i == count {
                    distance -= self.end_offset;
                }
                path.insert_point_at_distance(distance);
            }
            debug!(count, first, "inserted points behind the free end");
            return DragOutcome::Inserted { first, count };
        }

        if spacing < self.end_offset && n > 3 {
            debug!(spacing, "last segment too short, dropping penultimate point");
            path.remove_point(n - 2);
            return DragOutcome::RemovedPenultimate { reversed: false };
        }

        DragOutcome::Unchanged
    }

    /// Remove the last segment, or move the free end home when only one
    /// segment is left.
    pub fn undo(&self, path: &mut Path) -> UndoOutcome {
        match path.len() {
            0 | 1 => UndoOutcome::Unchanged,
            2 => {
                let [x, y, z] = DEFAULT_END_POSITION;
                path.set_position(1, Point3::new(x, y, z));
                UndoOutcome::ResetEnd
            }
            n => {
                path.remove_point(n - 1);
                UndoOutcome::RemovedLast
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn straight(xs: &[f64]) -> Path {
        let positions: Vec<Point3> = xs.iter().map(|&x| Point3::new(x, 0.0, 0.0)).collect();
        Path::from_positions(&positions)
    }

    #[test]
    fn test_short_drag_unchanged() {
        let mut path = straight(&[0.0, 300.0]);
        assert_eq!(EditPolicy::default().apply(&mut path), DragOutcome::Unchanged);
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn test_long_drag_inserts_points() {
        let mut path = straight(&[0.0, 1600.0]);
        let outcome = EditPolicy::default().apply(&mut path);
        assert_eq!(outcome, DragOutcome::Inserted { first: 1, count: 2 });
        assert_eq!(path.len(), 4);
        assert_relative_eq!(path.point(1).unwrap().position.x, 750.0, epsilon = 0.05);
        assert_relative_eq!(path.point(2).unwrap().position.x, 1300.0, epsilon = 0.05);
        assert_relative_eq!(path.point(3).unwrap().position.x, 1600.0, epsilon = 1e-9);
    }

    #[test]
    fn test_short_last_segment_removed_with_many_points() {
        let mut path = straight(&[0.0, 500.0, 1000.0, 1100.0]);
        let outcome = EditPolicy::default().apply(&mut path);
        assert_eq!(outcome, DragOutcome::RemovedPenultimate { reversed: false });
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn test_short_last_segment_kept_with_three_points() {
        let mut path = straight(&[0.0, 500.0, 600.0]);
        assert_eq!(EditPolicy::default().apply(&mut path), DragOutcome::Unchanged);
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn test_reversal_removes_penultimate() {
        let mut path = Path::from_positions(&[
            Point3::origin(),
            Point3::new(500.0, 0.0, 0.0),
            Point3::new(1000.0, 0.0, 0.0),
            Point3::new(700.0, 0.0, 0.0),
        ]);
        let outcome = EditPolicy::default().apply(&mut path);
        assert_eq!(outcome, DragOutcome::RemovedPenultimate { reversed: true });
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn test_undo() {
        let policy = EditPolicy::default();
        let mut path = straight(&[0.0, 500.0, 900.0]);
        assert_eq!(policy.undo(&mut path), UndoOutcome::RemovedLast);
        assert_eq!(path.len(), 2);
        assert_eq!(policy.undo(&mut path), UndoOutcome::ResetEnd);
        assert_eq!(path.len(), 2);
        assert_eq!(path.point(1).unwrap().position, Point3::new(200.0, 0.0, 0.0));
    }
}
