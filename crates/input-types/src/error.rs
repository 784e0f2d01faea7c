//! Error types for geometry and input values

use thiserror::Error;

/// Geometry error
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeometryError {
    #[error("Invalid coordinate: ({x}, {y})")]
    InvalidCoordinate { x: f64, y: f64 },
}

/// Result type alias for geometry operations
pub type GeometryResult<T> = Result<T, GeometryError>;
