//! Error handling for the grid engine

use thiserror::Error;

/// Errors that abort a draw request before any computation happens.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("Missing collaborator: {name} must be supplied before drawing")]
    MissingCollaborator { name: String },

    #[error("Grid layer is not attached to a render surface")]
    NotAttached,

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Invalid viewport: {message}")]
    InvalidViewport { message: String },
}

impl GridError {
    pub fn missing<S: Into<String>>(name: S) -> Self {
        Self::MissingCollaborator { name: name.into() }
    }

    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig { message: message.into() }
    }

    pub fn invalid_viewport<S: Into<String>>(message: S) -> Self {
        Self::InvalidViewport { message: message.into() }
    }
}

/// Result type for grid operations
pub type GridResult<T> = Result<T, GridError>;

/// Per-point problem. These are logged and counted, never propagated to the
/// caller of a draw cycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PointIssue {
    #[error("point {point_id} has a missing or malformed location")]
    MalformedLocation { point_id: String },

    #[error("point {point_id} is visible but falls inside no generated cell")]
    Unmatched { point_id: String },
}

impl PointIssue {
    pub fn point_id(&self) -> &str {
        match self {
            Self::MalformedLocation { point_id } | Self::Unmatched { point_id } => point_id,
        }
    }
}
