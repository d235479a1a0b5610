use thiserror::Error;

/// Errors from scenarios and export.
#[derive(Error, Debug)]
pub enum BurrowError {
    /// A network operation failed.
    #[error(transparent)]
    Network(#[from] burrow_network::NetworkError),
    /// A scenario refers to a tunnel it never declared.
    #[error("unknown tunnel name: {0}")]
    UnknownName(String),
    /// Two tunnels share a name.
    #[error("duplicate tunnel name: {0}")]
    DuplicateName(String),
    /// A scenario file could not be parsed.
    #[error("scenario parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// An I/O error occurred during export.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The mesh has no triangles.
    #[error("Empty geometry")]
    EmptyGeometry,
}

/// Result alias for burrow operations.
pub type Result<T> = std::result::Result<T, BurrowError>;
