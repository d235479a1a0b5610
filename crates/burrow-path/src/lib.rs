#![warn(missing_docs)]

//! Editable tunnel paths for burrow.
//!
//! A [`Path`] is an ordered list of [`ControlPoint`]s joined by cubic Hermite
//! segments and parametrized by arc length. Ring generation samples it by
//! distance; the [`EditPolicy`] keeps the point spacing sane while the free
//! end is dragged around.

mod edit;
mod hermite;
mod path;

pub use edit::{DragOutcome, EditPolicy, UndoOutcome, DEFAULT_END_POSITION};
pub use path::{ControlPoint, Path, PointKind};
