#![warn(missing_docs)]

//! Junction generation for burrow tunnel networks.
//!
//! A junction widens the end of a parent tunnel into a square footprint and
//! opens it to the right, the left and/or straight on. The walk replays the
//! parent's end ring as its first row so the two meshes share a boundary,
//! then publishes one closed [`ExitRing`](burrow_section::ExitRing) per open
//! side for the child tunnels to start from.

mod exits;
mod generator;
mod kind;

pub use exits::ExitRings;
pub use generator::{JunctionGenerator, JunctionOutput, JunctionRequest};
pub use kind::{ExitDirection, JunctionKind};
