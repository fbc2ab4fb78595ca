use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::camera::backend::{FrameEncoder, MediaAcquisition};
use crate::camera::error::{CaptureError, Result};
use crate::camera::resolve::Capability;
use crate::camera::session::{SessionState, StreamSession};
use crate::camera::surface::RenderTarget;
use crate::camera::types::EncodedFrame;
use crate::preview::encode::CanvasEncoder;
use crate::preview::sampler::FrameSampler;
use crate::settings::types::{CaptureConfig, ConfigError};

/// Facade sequencing stream sessions and capture runs.
///
/// The sampler is only ever handed the render target of a Live session.
pub struct CaptureController {
    config: CaptureConfig,
    acquisition: Option<Arc<dyn MediaAcquisition>>,
    session: Mutex<Option<Arc<StreamSession>>>,
    sampler: FrameSampler,
    preview: Mutex<Option<Arc<RenderTarget>>>,
}

impl CaptureController {
    /// Create a controller using the default canvas encoder.
    pub fn new(
        config: CaptureConfig,
        capability: Capability,
    ) -> std::result::Result<Self, ConfigError> {
        Self::with_encoder(config, capability, Arc::new(CanvasEncoder::new()))
    }

    /// Create a controller. Fails if `config` can never produce a frame.
    pub fn with_encoder(
        config: CaptureConfig,
        capability: Capability,
        encoder: Arc<dyn FrameEncoder>,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        if !capability.is_available() {
            warn!("capture controller created without a media capability");
        }
        info!(
            "capture controller: {}x{}, {} frames every {}ms as {}",
            config.width, config.height, config.frames, config.interval, config.format
        );
        Ok(Self {
            config,
            acquisition: capability.acquisition(),
            session: Mutex::new(None),
            sampler: FrameSampler::new(encoder),
            preview: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// The render target shown after a successful `start_video`.
    pub fn preview(&self) -> Option<Arc<RenderTarget>> {
        self.preview.lock().clone()
    }

    /// State of the current session; `Idle` if none was created yet.
    pub fn session_state(&self) -> SessionState {
        self.session
            .lock()
            .as_ref()
            .map_or(SessionState::Idle, |s| s.state())
    }

    /// Statistics of the last completed capture run.
    pub fn last_run(&self) -> Option<crate::diagnostics::stats::RunSnapshot> {
        self.sampler.last_run()
    }

    /// Session to start: the current one unless it has been stopped.
    fn session_for_start(&self) -> Arc<StreamSession> {
        let mut slot = self.session.lock();
        match slot.as_ref() {
            Some(session) if session.state() != SessionState::Stopped => Arc::clone(session),
            _ => {
                let session = Arc::new(StreamSession::new(
                    self.acquisition.clone(),
                    self.config.dimensions(),
                ));
                *slot = Some(Arc::clone(&session));
                session
            }
        }
    }

    fn live_session(&self) -> Option<Arc<StreamSession>> {
        self.session
            .lock()
            .as_ref()
            .filter(|s| s.state() == SessionState::Live)
            .cloned()
    }

    /// Start streaming and wait for the first frames to settle.
    ///
    /// Acquisition errors are returned unmodified; nothing is retried.
    pub async fn start_video(&self) -> Result<Arc<RenderTarget>> {
        let session = self.session_for_start();
        let target = session.start().await?;
        target.play();

        tokio::time::sleep(self.config.settle_delay()).await;

        if session.state() != SessionState::Live {
            warn!("stream stopped before it settled");
            return Err(CaptureError::SourceLost);
        }
        *self.preview.lock() = Some(Arc::clone(&target));
        Ok(target)
    }

    /// Stop streaming. A no-op when nothing is streaming.
    pub fn stop_video(&self) {
        if let Some(session) = self.session.lock().as_ref() {
            session.stop();
        }
        self.preview.lock().take();
    }

    /// Run one capture with the configured frame count and cadence.
    pub async fn record_video(&self) -> Result<Vec<EncodedFrame>> {
        let session = self.live_session().ok_or(CaptureError::NoActiveSource)?;
        let target = session
            .render_target()
            .ok_or(CaptureError::NoActiveSource)?;
        target.play();
        self.sampler
            .capture(Some(&target), &self.config.run_settings())
            .await
    }
}
