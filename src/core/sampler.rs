use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::core::traits::probe::MemoryProbe;

/// Reference point that later samples are measured against.
#[derive(Clone, Copy, Debug)]
pub struct Baseline {
    pub memory_bytes: u64,
    pub started_at: Instant,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sample {
    /// Memory above the baseline, zero if usage dropped below it.
    pub memory_delta: u64,
    pub elapsed: Duration,
}

impl Sample {
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Reads the current memory figure and wall-clock time. Holds no state of
/// its own: baselines are owned by whoever asked for them.
#[derive(Clone, Debug)]
pub struct ResourceSampler {
    probe: Arc<dyn MemoryProbe>,
}

impl ResourceSampler {
    pub fn new(probe: Arc<dyn MemoryProbe>) -> Self {
        Self { probe }
    }

    pub fn baseline(&self) -> Baseline {
        Baseline {
            memory_bytes: self.probe.current_bytes(),
            started_at: Instant::now(),
        }
    }

    pub fn sample(&self, baseline: &Baseline) -> Sample {
        Sample {
            memory_delta: self
                .probe
                .current_bytes()
                .saturating_sub(baseline.memory_bytes),
            elapsed: baseline.started_at.elapsed(),
        }
    }
}

/// High-water mark of the memory deltas seen so far.
#[derive(Clone, Copy, Debug, Default)]
pub struct PeakTracker {
    peak: u64,
}

impl PeakTracker {
    pub fn observe(&mut self, memory_delta: u64) {
        self.peak = self.peak.max(memory_delta);
    }

    pub fn peak(&self) -> u64 {
        self.peak
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::probe::MockMemoryProbe;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn probe_with_readings(readings: Vec<u64>) -> Arc<dyn MemoryProbe> {
        let cursor = AtomicU64::new(0);
        let mut probe = MockMemoryProbe::new();
        probe.expect_current_bytes().returning(move || {
            let idx = cursor.fetch_add(1, Ordering::SeqCst) as usize;
            readings[idx.min(readings.len() - 1)]
        });
        Arc::new(probe)
    }

    #[tokio::test(start_paused = true)]
    async fn test_sample_is_relative_to_baseline() {
        let sampler = ResourceSampler::new(probe_with_readings(vec![1000, 1500]));

        let baseline = sampler.baseline();
        assert_eq!(baseline.memory_bytes, 1000);

        tokio::time::sleep(Duration::from_millis(30)).await;
        let sample = sampler.sample(&baseline);
        assert_eq!(sample.memory_delta, 500);
        assert_eq!(sample.elapsed_ms(), 30);
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_below_baseline_saturates() {
        let sampler = ResourceSampler::new(probe_with_readings(vec![1000, 200]));

        let baseline = sampler.baseline();
        let sample = sampler.sample(&baseline);
        assert_eq!(sample.memory_delta, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_baseline_absorbs_setup_memory() {
        let sampler = ResourceSampler::new(probe_with_readings(vec![100, 900, 950]));

        let _setup = sampler.baseline();
        let run = sampler.baseline();
        assert_eq!(sampler.sample(&run).memory_delta, 50);
    }

    #[test]
    fn test_peak_tracker_keeps_maximum() {
        let mut peak = PeakTracker::default();
        for delta in [10, 40, 20, 0] {
            peak.observe(delta);
        }
        assert_eq!(peak.peak(), 40);
    }
}
