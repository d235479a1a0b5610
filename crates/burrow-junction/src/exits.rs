//! Per-direction boundary rings published by a junction.

use burrow_section::ExitRing;

use crate::ExitDirection;

/// The exit rings of one junction, in junction-local space.
///
/// Directions the junction's kind does not open are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExitRings {
    /// Ring leaving straight on.
    pub straight: Option<ExitRing>,
    /// Ring leaving to the right.
    pub right: Option<ExitRing>,
    /// Ring leaving to the left.
    pub left: Option<ExitRing>,
}

impl ExitRings {
    /// Exit ring for `direction`.
    pub fn get(&self, direction: ExitDirection) -> Option<&ExitRing> {
        match direction {
            ExitDirection::Straight => self.straight.as_ref(),
            ExitDirection::Right => self.right.as_ref(),
            ExitDirection::Left => self.left.as_ref(),
        }
    }

    /// Directions that have a ring.
    pub fn directions(&self) -> impl Iterator<Item = ExitDirection> + '_ {
        ExitDirection::ALL
            .into_iter()
            .filter(|d| self.get(*d).is_some())
    }
}
