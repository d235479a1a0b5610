#![warn(missing_docs)]

//! burrow: incremental tunnel-network meshes.
//!
//! Tunnels follow editable Hermite paths and are swept into deformed
//! cross-sections one segment at a time. Dragging a free end rebuilds only
//! the trailing segments, snapping welds ends together, and junctions merge
//! tunnels into a widened chamber with exits for child tunnels.
//!
//! This crate re-exports the workspace crates and adds TOML scenarios and
//! STL export on top of them.
//!
//! # Example
//!
//! ```rust,no_run
//! use burrow::{Scenario, export};
//!
//! let scenario = Scenario::from_toml_str(
//!     r#"
//!     [[tunnels]]
//!     name = "main"
//!     edits = [{ op = "drag", to = [1800.0, 400.0, 0.0] }]
//!
//!     [[junctions]]
//!     tunnel = "main"
//!     kind = "all"
//!     "#,
//! )
//! .unwrap();
//! let run = scenario.run().unwrap();
//! export::write_stl(&run.meshes.combined(), "network.stl").unwrap();
//! ```

mod error;
pub mod export;
pub mod scenario;

pub use burrow_junction as junction;
pub use burrow_math as math;
pub use burrow_mesh as mesh;
pub use burrow_network as network;
pub use burrow_path as path;
pub use burrow_section as section;

pub use burrow_junction::{ExitDirection, JunctionKind};
pub use burrow_math::{Point3, Transform, Vec3};
pub use burrow_mesh::TriangleMesh;
pub use burrow_network::{
    MeshBuilder, MeshCollector, MeshTarget, Network, NetworkConfig, NetworkError, PathEdit,
    PathEnd, TunnelId,
};
pub use burrow_path::Path;
pub use burrow_section::{RingLayout, SectionShape};
pub use error::{BurrowError, Result};
pub use scenario::{Scenario, ScenarioReport, ScenarioRun};
