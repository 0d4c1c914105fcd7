use thiserror::Error;

/// Top-level error type for the selection core.
#[derive(Debug, Error)]
pub enum SelectError {
    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

/// Errors related to mesh adjacency.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(&'static str),

    #[error("invalid topology: {0}")]
    InvalidTopology(String),
}

/// Errors related to selection operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
}

/// Errors related to screen-space projection.
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("view-projection matrix is not invertible")]
    NotInvertible,

    #[error("point lies behind the camera")]
    BehindCamera,
}

/// Convenience type alias for results using [`SelectError`].
pub type Result<T> = std::result::Result<T, SelectError>;
