//! Bounded, time-paced sampling of a render target into encoded frames.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::camera::backend::FrameEncoder;
use crate::camera::error::{CaptureError, Result};
use crate::camera::surface::RenderTarget;
use crate::camera::types::{EncodedFrame, ImageFormat};
use crate::diagnostics::stats::{RunSnapshot, RunStats};

/// Shortest cadence the ticker accepts.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Parameters of one capture run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSettings {
    pub frames: u32,
    pub interval: Duration,
    pub format: ImageFormat,
    /// Ignored by formats that do not use it.
    pub quality: Option<f32>,
}

/// Clears the active flag and the collected frames when a run ends,
/// including when its future is dropped mid-run.
struct ActiveRun<'a> {
    sampler: &'a FrameSampler,
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        self.sampler.collected.lock().clear();
        self.sampler.active.store(false, Ordering::Release);
    }
}

/// Produces a bounded sequence of encoded still frames from a live target.
///
/// Only one run may be active per sampler.
pub struct FrameSampler {
    encoder: Arc<dyn FrameEncoder>,
    active: AtomicBool,
    collected: Mutex<Vec<EncodedFrame>>,
    last_run: Mutex<Option<RunSnapshot>>,
}

impl FrameSampler {
    pub fn new(encoder: Arc<dyn FrameEncoder>) -> Self {
        Self {
            encoder,
            active: AtomicBool::new(false),
            collected: Mutex::new(Vec::new()),
            last_run: Mutex::new(None),
        }
    }

    /// Whether a run is currently in flight.
    #[cfg(test)]
    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Statistics of the last run that completed successfully.
    pub fn last_run(&self) -> Option<RunSnapshot> {
        self.last_run.lock().clone()
    }

    /// Sample `settings.frames` frames from `target`, one per interval tick.
    ///
    /// Geometry is read once from the target at the start of the run. Each
    /// tick draws, encodes, waits for the ticker, then confirms the source
    /// is still valid before storing the frame. Any failure discards the
    /// partial sequence.
    pub async fn capture(
        &self,
        target: Option<&RenderTarget>,
        settings: &RunSettings,
    ) -> Result<Vec<EncodedFrame>> {
        let target = match target {
            Some(t) if t.is_valid() && t.is_playing() => t,
            _ => return Err(CaptureError::NoActiveSource),
        };

        if self
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CaptureError::CaptureInProgress);
        }
        let _run = ActiveRun { sampler: self };
        self.collected.lock().clear();

        let dimensions = target.dimensions();
        let mut stats = RunStats::new();
        let mut ticker = tokio::time::interval(settings.interval.max(MIN_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        info!(
            "capture run started: {} frames every {:?} at {} as {}",
            settings.frames, settings.interval, dimensions, settings.format
        );

        for remaining in (1..=settings.frames).rev() {
            let raster = self.encoder.draw_from(target, dimensions)?;
            let frame = self
                .encoder
                .encode(&raster, settings.format, settings.quality)?;

            ticker.tick().await;
            if !target.is_valid() {
                warn!("capture run aborted with {remaining} frames remaining: source lost");
                return Err(CaptureError::SourceLost);
            }

            stats.record_frame(frame.len());
            debug!("frame captured ({} bytes), {} remaining", frame.len(), remaining - 1);
            self.collected.lock().push(frame);
        }

        let frames = std::mem::take(&mut *self.collected.lock());
        let snapshot = stats.snapshot();
        info!(
            "capture run complete: {} frames, {} bytes in {:.0}ms",
            snapshot.frame_count, snapshot.total_bytes, snapshot.elapsed_ms
        );
        *self.last_run.lock() = Some(snapshot);
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::backend::LiveSource;
    use crate::camera::dummy::DummyStream;
    use crate::camera::types::{Dimensions, RasterFrame};
    use std::sync::atomic::AtomicU32;
    use crate::preview::encode::CanvasEncoder;
    use tokio::time::Instant;

    fn live_target(dims: Dimensions) -> RenderTarget {
        let target = RenderTarget::new(dims);
        target.attach(Arc::new(DummyStream::new(dims)));
        target.play();
        target
    }

    fn settings(frames: u32, interval_ms: u64) -> RunSettings {
        RunSettings {
            frames,
            interval: Duration::from_millis(interval_ms),
            format: ImageFormat::Jpeg,
            quality: Some(0.4),
        }
    }

    fn sampler() -> FrameSampler {
        FrameSampler::new(Arc::new(CanvasEncoder::new()))
    }

    /// Encoder that tags each frame with its draw order.
    struct CountingEncoder {
        draws: Mutex<u8>,
    }

    impl FrameEncoder for CountingEncoder {
        fn draw_from(&self, target: &RenderTarget, dimensions: Dimensions) -> Result<RasterFrame> {
            if !target.is_valid() {
                return Err(CaptureError::SourceLost);
            }
            let mut draws = self.draws.lock();
            *draws += 1;
            Ok(RasterFrame {
                data: vec![*draws],
                dimensions,
            })
        }

        fn encode(
            &self,
            raster: &RasterFrame,
            format: ImageFormat,
            _quality: Option<f32>,
        ) -> Result<EncodedFrame> {
            Ok(EncodedFrame {
                format,
                dimensions: raster.dimensions,
                bytes: raster.data.clone(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn capture_returns_exact_frame_count() {
        let target = live_target(Dimensions::new(32, 18));
        let frames = sampler()
            .capture(Some(&target), &settings(5, 50))
            .await
            .unwrap();
        assert_eq!(frames.len(), 5);
        assert!(frames.iter().all(|f| !f.is_empty()));
        assert!(frames
            .iter()
            .all(|f| f.dimensions == Dimensions::new(32, 18)));
    }

    #[tokio::test(start_paused = true)]
    async fn capture_preserves_order() {
        let target = live_target(Dimensions::new(4, 4));
        let sampler = FrameSampler::new(Arc::new(CountingEncoder {
            draws: Mutex::new(0),
        }));
        let frames = sampler
            .capture(Some(&target), &settings(4, 10))
            .await
            .unwrap();
        let order: Vec<u8> = frames.iter().map(|f| f.bytes[0]).collect();
        assert_eq!(order, vec![1, 2, 3, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn capture_takes_count_times_interval() {
        let target = live_target(Dimensions::new(32, 18));
        let start = Instant::now();
        sampler()
            .capture(Some(&target), &settings(3, 100))
            .await
            .unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(300));
        assert!(elapsed < Duration::from_millis(350));
    }

    #[tokio::test]
    async fn capture_without_target_fails() {
        let result = sampler().capture(None, &settings(3, 10)).await;
        assert!(matches!(result, Err(CaptureError::NoActiveSource)));
    }

    #[tokio::test]
    async fn capture_from_paused_target_fails() {
        let target = live_target(Dimensions::new(8, 8));
        target.pause();
        let result = sampler().capture(Some(&target), &settings(3, 10)).await;
        assert!(matches!(result, Err(CaptureError::NoActiveSource)));
    }

    #[tokio::test]
    async fn zero_frames_returns_empty_sequence() {
        let target = live_target(Dimensions::new(8, 8));
        let frames = sampler()
            .capture(Some(&target), &settings(0, 10))
            .await
            .unwrap();
        assert!(frames.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_capture_is_rejected() {
        let target = live_target(Dimensions::new(16, 9));
        let sampler = sampler();
        let run = settings(3, 100);
        let (first, second) = tokio::join!(
            sampler.capture(Some(&target), &run),
            sampler.capture(Some(&target), &run),
        );
        assert_eq!(first.unwrap().len(), 3);
        assert!(matches!(second, Err(CaptureError::CaptureInProgress)));
        assert!(!sampler.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn detaching_mid_run_reports_source_lost() {
        let target = live_target(Dimensions::new(16, 9));
        let sampler = sampler();
        let run = settings(5, 100);
        let (result, ()) = tokio::join!(
            sampler.capture(Some(&target), &run),
            async {
                tokio::time::sleep(Duration::from_millis(250)).await;
                target.detach();
            }
        );
        assert!(matches!(result, Err(CaptureError::SourceLost)));
        assert!(!sampler.is_active());
        assert!(sampler.collected.lock().is_empty());
        assert!(sampler.last_run().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn sampler_is_reusable_after_run() {
        let target = live_target(Dimensions::new(16, 9));
        let sampler = sampler();
        let first = sampler
            .capture(Some(&target), &settings(2, 10))
            .await
            .unwrap();
        let second = sampler
            .capture(Some(&target), &settings(3, 10))
            .await
            .unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 3);
        assert!(sampler.collected.lock().is_empty());
        assert_eq!(sampler.last_run().unwrap().frame_count, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_run_releases_sampler() {
        let target = live_target(Dimensions::new(16, 9));
        let sampler = sampler();
        let run = settings(10, 100);
        let capture = sampler.capture(Some(&target), &run);
        let timed_out = tokio::time::timeout(Duration::from_millis(250), capture).await;
        assert!(timed_out.is_err());
        assert!(!sampler.is_active());
        assert!(sampler.collected.lock().is_empty());
    }

    /// Source whose delivered resolution grows with every frame read.
    struct ResizingStream {
        reads: AtomicU32,
    }

    impl ResizingStream {
        fn size_at(read: u32) -> Dimensions {
            Dimensions::new(16 + read * 24, 9 + read * 13)
        }
    }

    impl LiveSource for ResizingStream {
        fn label(&self) -> &str {
            "Resizing Camera"
        }

        fn native_dimensions(&self) -> Dimensions {
            Self::size_at(self.reads.load(Ordering::Relaxed))
        }

        fn current_frame(&self) -> Option<RasterFrame> {
            let read = self.reads.fetch_add(1, Ordering::Relaxed);
            let dimensions = Self::size_at(read);
            Some(RasterFrame {
                data: vec![read as u8; dimensions.rgb_len()],
                dimensions,
            })
        }

        fn stop_tracks(&self) {}

        fn is_active(&self) -> bool {
            true
        }
    }

    #[tokio::test(start_paused = true)]
    async fn geometry_stays_fixed_while_source_resizes() {
        let stream = Arc::new(ResizingStream {
            reads: AtomicU32::new(0),
        });
        let target = RenderTarget::new(Dimensions::new(32, 18));
        target.attach(stream.clone());
        target.play();

        let frames = sampler()
            .capture(Some(&target), &settings(4, 10))
            .await
            .unwrap();

        // Delivered sizes were 16x9, 40x22, 64x35, 88x48.
        assert_eq!(stream.reads.load(Ordering::Relaxed), 4);
        assert_eq!(stream.native_dimensions(), Dimensions::new(112, 61));
        assert_eq!(frames.len(), 4);
        assert!(frames
            .iter()
            .all(|f| f.dimensions == Dimensions::new(32, 18)));
    }
}
