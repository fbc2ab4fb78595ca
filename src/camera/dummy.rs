use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::camera::backend::{LiveSource, MediaAcquisition};
use crate::camera::error::AcquisitionError;
use crate::camera::types::{Dimensions, MediaConstraints, RasterFrame};

const DUMMY_DEVICE_NAME: &str = "Dummy Test Camera";

/// Number of tracks a dummy stream owns. Audio is never captured.
const DUMMY_TRACK_COUNT: usize = 1;

/// How a dummy camera answers acquisition requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grant {
    Allow,
    Deny(DenyReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DenyReason {
    Permission,
    NoDevice,
}

/// A simulated camera stream producing a moving gradient test pattern.
pub struct DummyStream {
    dimensions: Dimensions,
    tracks: Vec<AtomicBool>,
    /// Incremented per frame read so successive frames differ.
    sequence: AtomicU64,
}

impl DummyStream {
    /// Create a live stream delivering frames at `dimensions`.
    pub fn new(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            tracks: (0..DUMMY_TRACK_COUNT)
                .map(|_| AtomicBool::new(true))
                .collect(),
            sequence: AtomicU64::new(0),
        }
    }

    /// Number of frames read so far.
    #[cfg(test)]
    pub(crate) fn frames_read(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }

    fn test_pattern(&self, seq: u64) -> Vec<u8> {
        let Dimensions { width, height } = self.dimensions;
        let shift = (seq % 256) as u32;
        let mut data = Vec::with_capacity(self.dimensions.rgb_len());
        for y in 0..height {
            for x in 0..width {
                data.push(((x + shift) % 256) as u8); // R
                data.push(((y * 2) % 256) as u8); // G
                data.push(128); // B
            }
        }
        data
    }
}

impl LiveSource for DummyStream {
    fn label(&self) -> &str {
        DUMMY_DEVICE_NAME
    }

    fn native_dimensions(&self) -> Dimensions {
        self.dimensions
    }

    fn current_frame(&self) -> Option<RasterFrame> {
        if !self.is_active() {
            return None;
        }
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        Some(RasterFrame {
            data: self.test_pattern(seq),
            dimensions: self.dimensions,
        })
    }

    fn stop_tracks(&self) {
        for track in &self.tracks {
            track.store(false, Ordering::Release);
        }
    }

    fn is_active(&self) -> bool {
        self.tracks.iter().any(|t| t.load(Ordering::Acquire))
    }
}

/// A fake media acquisition capability for testing without real hardware.
///
/// Grants streams at the requested resolution unless configured otherwise,
/// and keeps a handle to every stream it hands out so tests can observe
/// teardown.
///
/// Enable via `DUMMY_CAMERA=1` environment variable.
pub struct DummyCamera {
    grant: Grant,
    native: Option<Dimensions>,
    latency: Duration,
    issued: Mutex<Vec<Arc<DummyStream>>>,
    requests: Mutex<Vec<MediaConstraints>>,
}

impl DummyCamera {
    /// Create a camera that grants every request.
    pub fn new() -> Self {
        Self {
            grant: Grant::Allow,
            native: None,
            latency: Duration::ZERO,
            issued: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Whether the dummy camera is enabled via environment variable.
    pub fn is_enabled() -> bool {
        std::env::var("DUMMY_CAMERA").is_ok_and(|v| v == "1" || v == "true")
    }

    /// Deny every request as if the user refused the permission prompt.
    pub fn with_permission_denied(mut self) -> Self {
        self.grant = Grant::Deny(DenyReason::Permission);
        self
    }

    /// Report that no camera is connected.
    pub fn with_no_device(mut self) -> Self {
        self.grant = Grant::Deny(DenyReason::NoDevice);
        self
    }

    /// Deliver this resolution regardless of the requested constraints.
    pub fn with_native_resolution(mut self, width: u32, height: u32) -> Self {
        self.native = Some(Dimensions::new(width, height));
        self
    }

    /// Delay each request, simulating a permission prompt or device warm-up.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Every stream handed out so far, oldest first.
    pub fn issued_streams(&self) -> Vec<Arc<DummyStream>> {
        self.issued.lock().clone()
    }

    /// Constraints of every request received so far.
    pub fn requests(&self) -> Vec<MediaConstraints> {
        self.requests.lock().clone()
    }
}

impl Default for DummyCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaAcquisition for DummyCamera {
    async fn request(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<Arc<dyn LiveSource>, AcquisitionError> {
        self.requests.lock().push(*constraints);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match self.grant {
            Grant::Deny(DenyReason::Permission) => Err(AcquisitionError::PermissionDenied),
            Grant::Deny(DenyReason::NoDevice) => Err(AcquisitionError::NotFound),
            Grant::Allow => {
                let dimensions = self.native.unwrap_or(constraints.video);
                let stream = Arc::new(DummyStream::new(dimensions));
                self.issued.lock().push(Arc::clone(&stream));
                Ok(stream)
            }
        }
    }
}
