use serde::Serialize;
use std::sync::Mutex;

/// Counters shared between the location feed, the frame feed and the session task.
pub struct SessionMetrics {
    inner: Mutex<MetricsSnapshot>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub fixes_accepted: u64,
    pub fixes_dropped: u64,
    pub fixes_evaluated: u64,
    pub frames_processed: u64,
    pub frames_dropped: u64,
    pub materialized: u64,
    pub dematerialized: u64,
    pub points_captured: u64,
    pub store_errors: u64,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut MetricsSnapshot)) {
        if let Ok(mut metrics) = self.inner.lock() {
            apply(&mut metrics);
        }
    }

    pub fn record_fix_accepted(&self) {
        self.update(|m| m.fixes_accepted += 1);
    }

    pub fn record_fix_dropped(&self) {
        self.update(|m| m.fixes_dropped += 1);
    }

    pub fn record_fix_evaluated(&self) {
        self.update(|m| m.fixes_evaluated += 1);
    }

    pub fn record_frame(&self) {
        self.update(|m| m.frames_processed += 1);
    }

    pub fn record_frame_dropped(&self) {
        self.update(|m| m.frames_dropped += 1);
    }

    pub fn record_materialized(&self) {
        self.update(|m| m.materialized += 1);
    }

    pub fn record_dematerialized(&self, released: usize) {
        self.update(|m| m.dematerialized += released as u64);
    }

    pub fn record_point(&self) {
        self.update(|m| m.points_captured += 1);
    }

    pub fn record_store_error(&self) {
        self.update(|m| m.store_errors += 1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self::new()
    }
}
