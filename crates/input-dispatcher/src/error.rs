//! Dispatcher error types

use input_injector::BackendError;
use input_types::GeometryError;
use motion_synth::MotionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Motion(#[from] MotionError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Dispatcher busy: another job is running")]
    Busy,

    #[error("No key produces character {0:?}")]
    UnmappableCharacter(char),

    #[error("Chord holds {requested} keys, backend allows {limit}")]
    TooManyKeys { requested: usize, limit: u8 },

    #[error("Dispatcher worker stopped")]
    DispatcherStopped,

    #[error("Failed to start dispatcher worker: {0}")]
    Spawn(#[from] std::io::Error),
}

impl From<GeometryError> for DispatchError {
    fn from(err: GeometryError) -> Self {
        DispatchError::Motion(err.into())
    }
}

pub type DispatchResult<T> = Result<T, DispatchError>;
