//! Error types for network operations.

use thiserror::Error;

use crate::{JunctionId, TunnelId};

/// Errors returned at the network API boundary.
///
/// Mesh generation itself never fails; these cover bad handles, refused
/// edits and configuration problems.
#[derive(Error, Debug)]
pub enum NetworkError {
    /// No tunnel with this id.
    #[error("unknown tunnel {0:?}")]
    UnknownTunnel(TunnelId),

    /// No junction with this id.
    #[error("unknown junction {0:?}")]
    UnknownJunction(JunctionId),

    /// The tunnel end already carries a junction.
    #[error("tunnel {0:?} already ends in a junction")]
    JunctionAlreadyAttached(TunnelId),

    /// The tunnel path has fewer than two control points.
    #[error("tunnel {0:?} has a degenerate path")]
    DegeneratePath(TunnelId),

    /// Configuration values out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Configuration text could not be parsed.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Result type for network operations.
pub type Result<T> = std::result::Result<T, NetworkError>;
