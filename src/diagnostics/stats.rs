use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

/// Collects statistics for a single capture run.
pub struct RunStats {
    frame_count: u64,
    total_bytes: u64,
    start_time: Instant,
    last_frame_time: Option<Instant>,
    max_gap: Duration,
}

/// Snapshot of capture run statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSnapshot {
    pub frame_count: u64,
    pub total_bytes: u64,
    pub elapsed_ms: f64,
    pub fps: f64,
    pub max_gap_ms: f64,
    pub avg_frame_bytes: u64,
}

impl RunStats {
    /// Create new stats with zeroed counters, starting the run clock now.
    pub fn new() -> Self {
        Self {
            frame_count: 0,
            total_bytes: 0,
            start_time: Instant::now(),
            last_frame_time: None,
            max_gap: Duration::ZERO,
        }
    }

    /// Record a collected frame of `bytes` encoded length.
    pub fn record_frame(&mut self, bytes: usize) {
        let now = Instant::now();
        let gap = now - self.last_frame_time.unwrap_or(self.start_time);
        self.max_gap = self.max_gap.max(gap);
        self.last_frame_time = Some(now);
        self.frame_count += 1;
        self.total_bytes += bytes as u64;
    }

    /// Take a snapshot of the current statistics.
    pub fn snapshot(&self) -> RunSnapshot {
        let elapsed = self.start_time.elapsed();
        let elapsed_secs = elapsed.as_secs_f64();
        let fps = if elapsed_secs > 0.0 {
            self.frame_count as f64 / elapsed_secs
        } else {
            0.0
        };
        let avg_frame_bytes = if self.frame_count > 0 {
            self.total_bytes / self.frame_count
        } else {
            0
        };

        RunSnapshot {
            frame_count: self.frame_count,
            total_bytes: self.total_bytes,
            elapsed_ms: elapsed_secs * 1000.0,
            fps,
            max_gap_ms: self.max_gap.as_secs_f64() * 1000.0,
            avg_frame_bytes,
        }
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}
