//! Stream session: acquisition and teardown of a single live source.
//!
//! State machine: `Idle → Acquiring → Live → Stopped`, with
//! `Acquiring → Idle` on failure. `Stopped` is terminal; streaming again
//! requires a new session, as stopped device tracks cannot be restarted.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::camera::backend::{LiveSource, MediaAcquisition};
use crate::camera::error::{AcquisitionError, CaptureError, Result};
use crate::camera::surface::RenderTarget;
use crate::camera::types::{Dimensions, MediaConstraints};

/// Lifecycle state of a stream session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Acquiring,
    Live,
    Stopped,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Acquiring => "acquiring",
            Self::Live => "live",
            Self::Stopped => "stopped",
        })
    }
}

struct SessionInner {
    state: SessionState,
    /// Present iff `state == Live`.
    source: Option<Arc<dyn LiveSource>>,
    target: Option<Arc<RenderTarget>>,
}

/// Owns the live video resource for one controller session.
pub struct StreamSession {
    acquisition: Option<Arc<dyn MediaAcquisition>>,
    dimensions: Dimensions,
    inner: Mutex<SessionInner>,
}

impl StreamSession {
    /// Create an idle session. `acquisition` is `None` when the platform
    /// has no media capability; `start` then fails with `MediaUnavailable`.
    pub fn new(acquisition: Option<Arc<dyn MediaAcquisition>>, dimensions: Dimensions) -> Self {
        Self {
            acquisition,
            dimensions,
            inner: Mutex::new(SessionInner {
                state: SessionState::Idle,
                source: None,
                target: None,
            }),
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    /// The render target while Live.
    pub fn render_target(&self) -> Option<Arc<RenderTarget>> {
        let inner = self.inner.lock();
        match inner.state {
            SessionState::Live => inner.target.clone(),
            _ => None,
        }
    }

    /// Request the camera and attach it to a new render target.
    pub async fn start(&self) -> Result<Arc<RenderTarget>> {
        {
            let mut inner = self.inner.lock();
            if inner.state != SessionState::Idle {
                return Err(CaptureError::InvalidState {
                    operation: "start",
                    state: inner.state,
                });
            }
            inner.state = SessionState::Acquiring;
        }

        let Some(acquisition) = self.acquisition.as_ref() else {
            self.inner.lock().state = SessionState::Idle;
            warn!("stream start failed: no media capability");
            return Err(AcquisitionError::CapabilityAbsent.into());
        };

        let constraints = MediaConstraints::video(self.dimensions);
        debug!("requesting camera at {}", self.dimensions);
        let source = match acquisition.request(&constraints).await {
            Ok(source) => source,
            Err(e) => {
                let mut inner = self.inner.lock();
                if inner.state == SessionState::Acquiring {
                    inner.state = SessionState::Idle;
                }
                warn!("stream start failed: {e}");
                return Err(e.into());
            }
        };

        let mut inner = self.inner.lock();
        if inner.state != SessionState::Acquiring {
            // Stopped while the request was pending.
            source.stop_tracks();
            return Err(CaptureError::InvalidState {
                operation: "start",
                state: inner.state,
            });
        }

        let target = Arc::new(RenderTarget::new(self.dimensions));
        target.attach(Arc::clone(&source));
        target.play();

        info!(
            "stream live: '{}' native {} shown at {}",
            source.label(),
            source.native_dimensions(),
            self.dimensions
        );

        inner.source = Some(source);
        inner.target = Some(Arc::clone(&target));
        inner.state = SessionState::Live;
        Ok(target)
    }

    /// Release the stream. Idempotent; a no-op when Idle.
    pub fn stop(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            SessionState::Idle | SessionState::Stopped => {}
            SessionState::Acquiring => {
                debug!("stream stopped while acquiring");
                inner.state = SessionState::Stopped;
            }
            SessionState::Live => {
                if let Some(source) = inner.source.take() {
                    source.stop_tracks();
                }
                if let Some(target) = inner.target.take() {
                    target.pause();
                    target.detach();
                }
                inner.state = SessionState::Stopped;
                info!("stream stopped");
            }
        }
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::dummy::DummyCamera;
    use std::time::Duration;

    fn dims() -> Dimensions {
        Dimensions::new(320, 180)
    }

    fn session_with(camera: &Arc<DummyCamera>) -> StreamSession {
        let acquisition: Arc<dyn MediaAcquisition> = camera.clone();
        StreamSession::new(Some(acquisition), dims())
    }

    #[tokio::test]
    async fn start_transitions_to_live() {
        let camera = Arc::new(DummyCamera::new());
        let session = session_with(&camera);
        assert_eq!(session.state(), SessionState::Idle);

        let target = session.start().await.unwrap();
        assert_eq!(session.state(), SessionState::Live);
        assert!(target.is_playing());
        assert_eq!(target.dimensions(), dims());
        assert!(Arc::ptr_eq(&target, &session.render_target().unwrap()));
        assert_eq!(camera.requests()[0].video, dims());
    }

    #[tokio::test]
    async fn start_while_live_is_invalid() {
        let camera = Arc::new(DummyCamera::new());
        let session = session_with(&camera);
        session.start().await.unwrap();

        let err = session.start().await.unwrap_err();
        assert!(matches!(
            err,
            CaptureError::InvalidState {
                state: SessionState::Live,
                ..
            }
        ));
        assert_eq!(camera.issued_streams().len(), 1);
    }

    #[tokio::test]
    async fn denied_start_returns_to_idle() {
        let camera = Arc::new(DummyCamera::new().with_permission_denied());
        let session = session_with(&camera);

        let err = session.start().await.unwrap_err();
        assert!(matches!(
            err,
            CaptureError::MediaUnavailable(AcquisitionError::PermissionDenied)
        ));
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.render_target().is_none());
    }

    #[tokio::test]
    async fn missing_capability_is_media_unavailable() {
        let session = StreamSession::new(None, dims());
        let err = session.start().await.unwrap_err();
        assert!(matches!(
            err,
            CaptureError::MediaUnavailable(AcquisitionError::CapabilityAbsent)
        ));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn stop_releases_tracks_and_detaches_target() {
        let camera = Arc::new(DummyCamera::new());
        let session = session_with(&camera);
        let target = session.start().await.unwrap();

        session.stop();
        assert_eq!(session.state(), SessionState::Stopped);
        assert!(session.render_target().is_none());
        assert!(!target.is_playing());
        assert!(!target.is_valid());
        assert!(target.source_label().is_none());
        assert!(!camera.issued_streams()[0].is_active());
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let camera = Arc::new(DummyCamera::new());
        let session = session_with(&camera);
        session.start().await.unwrap();
        session.stop();
        session.stop();
        assert_eq!(session.state(), SessionState::Stopped);
    }

    #[test]
    fn stop_when_idle_is_noop() {
        let session = StreamSession::new(None, dims());
        session.stop();
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn stopped_session_cannot_restart() {
        let camera = Arc::new(DummyCamera::new());
        let session = session_with(&camera);
        session.start().await.unwrap();
        session.stop();

        let err = session.start().await.unwrap_err();
        assert!(matches!(
            err,
            CaptureError::InvalidState {
                state: SessionState::Stopped,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_during_acquisition_releases_late_source() {
        let camera = Arc::new(DummyCamera::new().with_latency(Duration::from_millis(100)));
        let session = session_with(&camera);

        let (result, ()) = tokio::join!(session.start(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            assert_eq!(session.state(), SessionState::Acquiring);
            session.stop();
        });

        assert!(matches!(result, Err(CaptureError::InvalidState { .. })));
        assert_eq!(session.state(), SessionState::Stopped);
        assert!(!camera.issued_streams()[0].is_active());
    }

    #[tokio::test]
    async fn dropping_live_session_stops_tracks() {
        let camera = Arc::new(DummyCamera::new());
        {
            let session = session_with(&camera);
            session.start().await.unwrap();
        }
        assert!(!camera.issued_streams()[0].is_active());
    }
}
