//! Input backend error types

use input_types::VirtualKeyCode;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    #[error("Permission denied - accessibility permission required")]
    PermissionDenied,

    #[error("Failed to inject input: {0}")]
    InjectionFailed(String),

    #[error("Key has no native mapping: {0:?}")]
    InvalidKeyCode(VirtualKeyCode),

    #[error("Invalid coordinates: ({x}, {y})")]
    InvalidCoordinates { x: f64, y: f64 },

    #[error("Platform not supported")]
    UnsupportedPlatform,

    #[error("Platform error: {0}")]
    Platform(String),
}

pub type BackendResult<T> = Result<T, BackendError>;
