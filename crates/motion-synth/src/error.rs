//! Motion synthesis error types

use input_injector::BackendError;
use input_types::GeometryError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MotionError {
    #[error("Invalid coordinate: ({x}, {y})")]
    InvalidCoordinate { x: f64, y: f64 },

    #[error("Degenerate motion: target equals start but a non-zero duration was requested")]
    DegenerateMotion,

    #[error("Duration {0:?} exceeds the representable nanosecond range")]
    DurationOutOfRange(std::time::Duration),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read cursor position: {0}")]
    Seed(#[from] BackendError),
}

impl From<GeometryError> for MotionError {
    fn from(err: GeometryError) -> Self {
        match err {
            GeometryError::InvalidCoordinate { x, y } => MotionError::InvalidCoordinate { x, y },
        }
    }
}

pub type MotionResult<T> = Result<T, MotionError>;
