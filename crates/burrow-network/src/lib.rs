#![warn(missing_docs)]

//! Tunnel networks for burrow.
//!
//! A [`Network`] owns every tunnel and junction and is the only way to edit
//! them. Edits report the trailing range of segments they invalidate;
//! [`Network::regenerate`] then rebuilds just that range, replaying cached end
//! rings and borrowing boundary rings from snapped partners and parent
//! junctions so every seam is shared vertex for vertex. Finished sections are
//! handed to a [`MeshBuilder`].
//!
//! # Example
//!
//! ```
//! use burrow_math::{Point3, Transform};
//! use burrow_network::{MeshCollector, Network, NetworkConfig};
//! use burrow_path::Path;
//!
//! let mut network = Network::new(NetworkConfig::default()).unwrap();
//! let mut meshes = MeshCollector::new();
//! let tunnel = network.add_tunnel(Transform::identity(), Path::starter());
//! network.regenerate_all(tunnel, &mut meshes).unwrap();
//!
//! let report = network
//!     .drag_end(tunnel, Point3::new(900.0, 200.0, 0.0), &mut meshes)
//!     .unwrap();
//! assert!(!report.generated.is_empty());
//! assert_eq!(meshes.len(), network.tunnel(tunnel).unwrap().path().segment_count());
//! ```

mod builder;
mod config;
mod error;
mod network;
mod range;
mod resolver;
mod tunnel;

pub use builder::{MeshBuilder, MeshCollector, MeshTarget};
pub use config::{NetworkConfig, SnapSettings};
pub use error::{NetworkError, Result};
pub use network::{DragReport, Network};
pub use range::{EditOutcome, GeneratedSegment, PathEdit, RebuildRange, RegenerateOptions};
pub use tunnel::{Connection, Junction, JunctionId, PathEnd, Tunnel, TunnelId, TunnelOrigin};
