use std::sync::Arc;

use crate::camera::backend::MediaAcquisition;
use crate::camera::dummy::DummyCamera;

/// Outcome of resolving the media acquisition capability at startup.
#[derive(Clone)]
pub enum Capability {
    Available(Arc<dyn MediaAcquisition>),
    Unavailable,
}

impl Capability {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    pub fn acquisition(&self) -> Option<Arc<dyn MediaAcquisition>> {
        match self {
            Self::Available(acq) => Some(Arc::clone(acq)),
            Self::Unavailable => None,
        }
    }
}

impl std::fmt::Debug for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available(_) => f.write_str("Capability::Available"),
            Self::Unavailable => f.write_str("Capability::Unavailable"),
        }
    }
}

/// Select the acquisition capability for the current platform.
///
/// When `DUMMY_CAMERA=1` is set, a simulated camera is used. No native
/// backend is wired in yet, so every other configuration is unavailable.
pub fn resolve_capability() -> Capability {
    if DummyCamera::is_enabled() {
        tracing::info!("using dummy camera (DUMMY_CAMERA is set)");
        return Capability::Available(Arc::new(DummyCamera::new()));
    }

    tracing::warn!("no media acquisition capability available");
    Capability::Unavailable
}
