//! Render target that displays a live source.
//!
//! The owning `StreamSession` is the only component that attaches,
//! detaches, or invalidates a target. Samplers read from it.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::camera::backend::LiveSource;
use crate::camera::types::{Dimensions, RasterFrame};

struct TargetState {
    source: Option<Arc<dyn LiveSource>>,
    playing: bool,
}

/// Surface displaying a live source at fixed element dimensions.
pub struct RenderTarget {
    dimensions: Dimensions,
    state: Mutex<TargetState>,
    /// Cleared once when the owning session stops. Never set again.
    valid: AtomicBool,
}

impl RenderTarget {
    pub(crate) fn new(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            state: Mutex::new(TargetState {
                source: None,
                playing: false,
            }),
            valid: AtomicBool::new(true),
        }
    }

    pub(crate) fn attach(&self, source: Arc<dyn LiveSource>) {
        self.state.lock().source = Some(source);
    }

    /// Start playback. Has no effect without an attached source or after
    /// the target was invalidated.
    pub(crate) fn play(&self) {
        let mut state = self.state.lock();
        state.playing = state.source.is_some() && self.is_valid();
    }

    pub(crate) fn pause(&self) {
        self.state.lock().playing = false;
    }

    /// Pause and clear the source. In-flight samplers observe the target
    /// as invalid at their next tick.
    pub(crate) fn detach(&self) {
        self.valid.store(false, Ordering::Release);
        let mut state = self.state.lock();
        state.playing = false;
        state.source = None;
    }

    /// Element dimensions. Fixed for the lifetime of the target.
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    /// Label of the attached source, if any.
    pub fn source_label(&self) -> Option<String> {
        self.state
            .lock()
            .source
            .as_ref()
            .map(|s| s.label().to_string())
    }

    /// Read the frame currently displayed, at the source's native size.
    pub fn current_frame(&self) -> Option<RasterFrame> {
        let source = {
            let state = self.state.lock();
            if !state.playing {
                return None;
            }
            state.source.clone()?
        };
        source.current_frame()
    }
}

impl fmt::Debug for RenderTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderTarget")
            .field("dimensions", &self.dimensions)
            .field("playing", &self.is_playing())
            .field("valid", &self.is_valid())
            .finish()
    }
}
