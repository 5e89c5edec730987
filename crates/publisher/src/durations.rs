//! Start delays and processing times for publish jobs.

use std::time::Duration;

use creative_core::config::PublishConfig;
use creative_core::Platform;
use rand::Rng;

pub trait DurationSource: Send + Sync {
    /// Delay between the publish action and job `index` going in-progress.
    fn start_delay(&self, index: usize) -> Duration;

    /// Time a job spends in-progress before resolving.
    fn processing_time(&self, platform: Platform) -> Duration;
}

/// Staggered starts and `min + random(0..jitter)` processing times.
#[derive(Debug, Clone)]
pub struct RandomizedDurations {
    pub stagger: Duration,
    pub min_duration: Duration,
    pub jitter: Duration,
}

impl RandomizedDurations {
    pub fn from_config(config: &PublishConfig) -> Self {
        Self {
            stagger: Duration::from_millis(config.stagger_ms),
            min_duration: Duration::from_millis(config.min_duration_ms),
            jitter: Duration::from_millis(config.jitter_ms),
        }
    }
}

impl DurationSource for RandomizedDurations {
    fn start_delay(&self, index: usize) -> Duration {
        self.stagger * (index as u32 + 1)
    }

    fn processing_time(&self, _platform: Platform) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        let extra = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..jitter_ms)
        };
        self.min_duration + Duration::from_millis(extra)
    }
}

/// Deterministic durations, with an optional per-platform override.
#[derive(Debug, Clone, Default)]
pub struct FixedDurations {
    pub stagger: Duration,
    pub processing: Duration,
    pub overrides: Vec<(Platform, Duration)>,
}

impl FixedDurations {
    pub fn new(stagger: Duration, processing: Duration) -> Self {
        Self {
            stagger,
            processing,
            overrides: Vec::new(),
        }
    }

    /// No waiting at all.
    pub fn immediate() -> Self {
        Self::default()
    }

    pub fn with_processing(mut self, platform: Platform, processing: Duration) -> Self {
        self.overrides.push((platform, processing));
        self
    }
}

impl DurationSource for FixedDurations {
    fn start_delay(&self, index: usize) -> Duration {
        self.stagger * (index as u32 + 1)
    }

    fn processing_time(&self, platform: Platform) -> Duration {
        self.overrides
            .iter()
            .find(|(p, _)| *p == platform)
            .map(|(_, d)| *d)
            .unwrap_or(self.processing)
    }
}
