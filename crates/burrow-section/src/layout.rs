//! Ring topology: how many vertices each surface gets and in what order.

use serde::{Deserialize, Serialize};

/// The four surfaces of a tunnel cross-section, in winding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    /// Ground, swept from the left edge to the right edge.
    Floor,
    /// Right wall, rising from the floor.
    RightWall,
    /// Roof, swept from the right edge to the left edge.
    Roof,
    /// Left wall, descending back to the floor.
    LeftWall,
}

/// Vertex counts of a ring.
///
/// A ring holds `horizontal` floor vertices, `vertical` right wall vertices,
/// `horizontal` roof vertices and `vertical` left wall vertices. The last left
/// wall vertex repeats the first floor vertex so the loop closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingLayout {
    /// Vertices across the floor and across the roof.
    pub horizontal: usize,
    /// Vertices up each wall.
    pub vertical: usize,
}

impl Default for RingLayout {
    fn default() -> Self {
        Self {
            horizontal: 25,
            vertical: 20,
        }
    }
}

impl RingLayout {
    /// Create a layout.
    pub fn new(horizontal: usize, vertical: usize) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    /// True when rings can be built with this layout.
    pub fn is_valid(&self) -> bool {
        self.horizontal >= 2 && self.vertical >= 1
    }

    /// Vertices per ring.
    pub fn ring_len(&self) -> usize {
        2 * self.horizontal + 2 * self.vertical
    }

    /// Vertices of a ring that belong to the ground array.
    pub fn ground_len(&self) -> usize {
        self.horizontal
    }

    /// Vertices of a ring that belong to the wall array (both walls and roof).
    pub fn wall_len(&self) -> usize {
        self.horizontal + 2 * self.vertical
    }

    /// First ring position of the right wall.
    pub fn right_wall_start(&self) -> usize {
        self.horizontal
    }

    /// First ring position of the roof.
    pub fn roof_start(&self) -> usize {
        self.horizontal + self.vertical
    }

    /// First ring position of the left wall.
    pub fn left_wall_start(&self) -> usize {
        2 * self.horizontal + self.vertical
    }

    /// Surface that owns ring position `position`.
    pub fn surface_at(&self, position: usize) -> Surface {
        if position < self.right_wall_start() {
            Surface::Floor
        } else if position < self.roof_start() {
            Surface::RightWall
        } else if position < self.left_wall_start() {
            Surface::Roof
        } else {
            Surface::LeftWall
        }
    }
}
