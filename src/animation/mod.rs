mod clip;
mod spring;
mod timeline;
mod timing;
mod transform;

pub use clip::{Clip, ClipRun, DEFAULT_DURATION_MS, Tween};
pub use spring::{SpringConfig, SpringState};
pub use timeline::{Position, Timeline};
pub use timing::{EaseDirection, TimingFunction};
pub use transform::Transform;

#[cfg(test)]
pub(crate) use clip::tests as clip_tests;

/// Configuration for the short clips pointer effects start on every event
#[derive(Clone, Debug)]
pub struct Transition {
    /// Duration of the animation in milliseconds
    pub duration_ms: f64,
    /// Timing function controlling the animation curve
    pub timing: TimingFunction,
}

impl Transition {
    /// Create a new transition with the given duration and timing function
    pub fn new(duration_ms: f64, timing: TimingFunction) -> Self {
        Self {
            duration_ms: duration_ms.max(0.0),
            timing,
        }
    }

    /// Create a spring-based transition with the given configuration
    pub fn spring(config: SpringConfig) -> Self {
        Self {
            duration_ms: 1000.0, // Spring duration is dynamic, this is max
            timing: TimingFunction::Spring(config),
        }
    }

    /// Set the duration of the animation
    pub fn duration(mut self, duration_ms: f64) -> Self {
        self.duration_ms = duration_ms.max(0.0);
        self
    }

    /// Set the timing function
    pub fn timing(mut self, timing: TimingFunction) -> Self {
        self.timing = timing;
        self
    }

    /// Eased progress `elapsed_ms` into the transition, 1.0 once finished.
    pub fn eased_at(&self, elapsed_ms: f64, spring: &mut SpringState) -> f32 {
        if self.duration_ms <= 0.0 || elapsed_ms >= self.duration_ms {
            return 1.0;
        }
        let elapsed_ms = elapsed_ms.max(0.0);
        match &self.timing {
            TimingFunction::Spring(config) => spring.sample((elapsed_ms / 1000.0) as f32, config),
            timing => timing.evaluate((elapsed_ms / self.duration_ms) as f32),
        }
    }
}

impl Default for Transition {
    /// Short power2.out follow, as used for pointer tracking
    fn default() -> Self {
        Self::new(400.0, TimingFunction::Power(2, EaseDirection::Out))
    }
}
