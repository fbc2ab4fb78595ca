use thiserror::Error;

use crate::camera::session::SessionState;

/// Failures reported by a media acquisition capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquisitionError {
    #[error("camera permission denied")]
    PermissionDenied,

    #[error("no camera found")]
    NotFound,

    #[error("media capture is not available on this platform")]
    CapabilityAbsent,

    #[error("acquisition failed: {0}")]
    Failed(String),
}

/// Capture subsystem errors.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("media unavailable: {0}")]
    MediaUnavailable(#[from] AcquisitionError),

    #[error("cannot {operation} while session is {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    #[error("no active video source")]
    NoActiveSource,

    #[error("a capture run is already in progress")]
    CaptureInProgress,

    #[error("video source was stopped during capture")]
    SourceLost,

    #[error("frame encoding failed: {0}")]
    Encode(String),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, CaptureError>;
