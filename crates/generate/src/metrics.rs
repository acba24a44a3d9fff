use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[derive(Default)]
pub struct RunMetrics {
    // Counters
    images_generated: AtomicUsize,
    batches_completed: AtomicUsize,

    // Timing (in microseconds)
    total_generation_time_us: AtomicU64,
    total_handoff_time_us: AtomicU64,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_image(&self, duration: Duration) {
        self.images_generated.fetch_add(1, Ordering::Relaxed);
        self.total_generation_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_batch(&self, handoff: Duration) {
        self.batches_completed.fetch_add(1, Ordering::Relaxed);
        self.total_handoff_time_us
            .fetch_add(handoff.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            images_generated: self.images_generated.load(Ordering::Relaxed),
            batches_completed: self.batches_completed.load(Ordering::Relaxed),
            avg_generation_time_ms: avg_time_ms(
                &self.total_generation_time_us,
                &self.images_generated,
            ),
            avg_handoff_time_ms: avg_time_ms(&self.total_handoff_time_us, &self.batches_completed),
        }
    }
}

fn avg_time_ms(total_us: &AtomicU64, count: &AtomicUsize) -> f64 {
    let total = total_us.load(Ordering::Relaxed) as f64;
    let cnt = count.load(Ordering::Relaxed) as f64;
    if cnt > 0.0 {
        total / cnt / 1000.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub images_generated: usize,
    pub batches_completed: usize,
    pub avg_generation_time_ms: f64,
    pub avg_handoff_time_ms: f64,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_averages() {
        let metrics = RunMetrics::new();
        metrics.record_image(Duration::from_millis(100));
        metrics.record_image(Duration::from_millis(300));
        metrics.record_batch(Duration::from_millis(50));

        let snap = metrics.snapshot();
        assert_eq!(snap.images_generated, 2);
        assert_eq!(snap.batches_completed, 1);
        assert!((snap.avg_generation_time_ms - 200.0).abs() < 1e-9);
        assert!((snap.avg_handoff_time_ms - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_snapshot_is_zero() {
        let snap = RunMetrics::new().snapshot();
        assert_eq!(snap.avg_generation_time_ms, 0.0);
        assert_eq!(snap.images_generated, 0);
    }
}
