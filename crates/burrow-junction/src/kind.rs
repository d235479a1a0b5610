//! Junction types and exit directions.

use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

/// Which sides of a junction open into further tunnels.
///
/// The back side always connects to the parent tunnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JunctionKind {
    /// Straight on and to the right.
    Right,
    /// Straight on and to the left.
    Left,
    /// Right and left; straight on is walled off.
    RightLeft,
    /// Straight on, right and left.
    All,
}

impl JunctionKind {
    /// True when a tunnel leaves to the right.
    pub fn right_open(&self) -> bool {
        matches!(self, Self::Right | Self::RightLeft | Self::All)
    }

    /// True when a tunnel leaves to the left.
    pub fn left_open(&self) -> bool {
        matches!(self, Self::Left | Self::RightLeft | Self::All)
    }

    /// True when a tunnel continues straight on.
    pub fn straight_open(&self) -> bool {
        !matches!(self, Self::RightLeft)
    }

    /// True when `direction` is one of the exits.
    pub fn has_exit(&self, direction: ExitDirection) -> bool {
        match direction {
            ExitDirection::Straight => self.straight_open(),
            ExitDirection::Right => self.right_open(),
            ExitDirection::Left => self.left_open(),
        }
    }

    /// Exits in a fixed order.
    pub fn exits(&self) -> Vec<ExitDirection> {
        ExitDirection::ALL
            .into_iter()
            .filter(|d| self.has_exit(*d))
            .collect()
    }
}

/// Direction a child tunnel leaves a junction in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitDirection {
    /// Along the parent's direction of travel.
    Straight,
    /// Turned to the right of travel.
    Right,
    /// Turned to the left of travel.
    Left,
}

impl ExitDirection {
    /// Every direction.
    pub const ALL: [ExitDirection; 3] = [Self::Straight, Self::Right, Self::Left];

    /// Heading relative to the junction's forward axis, radians about +Z.
    pub fn yaw(&self) -> f64 {
        match self {
            Self::Straight => 0.0,
            Self::Right => -FRAC_PI_2,
            Self::Left => FRAC_PI_2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exits_per_kind() {
        use ExitDirection::*;
        assert_eq!(JunctionKind::Right.exits(), vec![Straight, Right]);
        assert_eq!(JunctionKind::Left.exits(), vec![Straight, Left]);
        assert_eq!(JunctionKind::RightLeft.exits(), vec![Right, Left]);
        assert_eq!(JunctionKind::All.exits(), vec![Straight, Right, Left]);
    }

    #[test]
    fn test_exit_yaw_matches_right_vector() {
        // Local right is -Y; turning right faces -Y.
        let yaw = ExitDirection::Right.yaw();
        assert!((yaw.cos()).abs() < 1e-12);
        assert!((yaw.sin() + 1.0).abs() < 1e-12);
    }
}
