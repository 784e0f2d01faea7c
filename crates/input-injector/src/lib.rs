//! Input Injector - OS-level input injection for Ghostinput
//!
//! One backend per platform behind the [`InputBackend`] trait, selected once
//! at startup by [`create_backend`].

mod error;
mod mock;
mod traits;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

pub use error::*;
pub use mock::*;
pub use traits::*;

#[cfg(target_os = "macos")]
pub use macos::MacOSBackend;

#[cfg(target_os = "windows")]
pub use self::windows::WindowsBackend;

/// Create the platform-appropriate input backend
pub fn create_backend() -> BackendResult<Box<dyn InputBackend>> {
    #[cfg(target_os = "macos")]
    {
        Ok(Box::new(MacOSBackend::new()?))
    }

    #[cfg(target_os = "windows")]
    {
        Ok(Box::new(WindowsBackend::new()?))
    }

    // TODO: uinput backend for Linux once the capability flags cover relative-only devices
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        tracing::error!("No input backend for {}", std::env::consts::OS);
        Err(BackendError::UnsupportedPlatform)
    }
}
