use nearmap_core::FailureCode;
use thiserror::Error;

/// Failures from the map surface and its widget.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("map container '{0}' not found")]
    ContainerNotFound(String),

    #[error("map is not initialized")]
    NotInitialized,

    /// The widget rejected an operation after the map loaded.
    #[error("map widget error: {0}")]
    Widget(String),
}

impl MapError {
    #[must_use]
    pub fn failure_code(&self) -> FailureCode {
        match self {
            MapError::ContainerNotFound(_) => FailureCode::ContainerNotFound,
            MapError::NotInitialized => FailureCode::NotInitialized,
            MapError::Widget(_) => FailureCode::Unknown,
        }
    }
}
