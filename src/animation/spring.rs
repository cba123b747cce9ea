/// Configuration for spring physics animation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpringConfig {
    /// Mass of the spring (default: 1.0)
    pub mass: f32,
    /// Stiffness of the spring (default: 100.0)
    pub stiffness: f32,
    /// Damping coefficient (default: 10.0)
    pub damping: f32,
}

impl SpringConfig {
    /// Default spring with pleasant overshoot
    pub const DEFAULT: Self = Self {
        mass: 1.0,
        stiffness: 180.0,
        damping: 11.0,
    };

    /// Bouncy spring with more overshoot
    pub const BOUNCY: Self = Self {
        mass: 1.0,
        stiffness: 200.0,
        damping: 10.0,
    };

    /// Snappy spring with quick response
    pub const SNAPPY: Self = Self {
        mass: 1.0,
        stiffness: 250.0,
        damping: 14.0,
    };

    /// Gentle spring with subtle motion
    pub const GENTLE: Self = Self {
        mass: 1.0,
        stiffness: 120.0,
        damping: 15.0,
    };
}

/// Fixed integration step used by [`SpringState::sample`].
const SAMPLE_STEP_SECS: f32 = 1.0 / 240.0;

/// State for spring physics simulation
#[derive(Clone, Debug)]
pub struct SpringState {
    /// Current position (0.0 = start, 1.0 = target)
    pub position: f32,
    /// Current velocity
    pub velocity: f32,
    /// Last evaluation time
    pub last_t: f32,
}

impl SpringState {
    /// Create a new spring state starting at position 0.0
    pub fn new() -> Self {
        Self {
            position: 0.0,
            velocity: 0.0,
            last_t: 0.0,
        }
    }

    /// Step the spring simulation forward using real elapsed time in seconds.
    /// Unlike normalized time (0.0 to 1.0), this allows the spring to continue
    /// oscillating until it naturally settles, regardless of any duration setting.
    ///
    /// `elapsed_secs` - Total elapsed time since animation started, in seconds
    /// Returns the current position (can overshoot 1.0)
    pub fn step(&mut self, elapsed_secs: f32, config: &SpringConfig) -> f32 {
        // Calculate delta time since last step
        let dt = (elapsed_secs - self.last_t).max(0.0);
        self.last_t = elapsed_secs;

        // Skip if time hasn't advanced
        if dt < 1e-6 {
            return self.position;
        }

        // Target is always 1.0 (we're animating from 0 to 1)
        let target = 1.0;

        // Cap individual timestep for numerical stability (~30fps minimum)
        let max_dt = 0.033;
        let capped_dt = dt.min(max_dt);

        // Spring force: F = -k * x
        let displacement = self.position - target;
        let spring_force = -config.stiffness * displacement;

        // Damping force: F = -c * v
        let damping_force = -config.damping * self.velocity;

        // Total force
        let force = spring_force + damping_force;

        // Acceleration: a = F / m
        let acceleration = force / config.mass;

        // Update velocity and position (using semi-implicit Euler)
        self.velocity += acceleration * capped_dt;
        self.position += self.velocity * capped_dt;

        // Return current position
        self.position
    }

    /// Position at `elapsed_secs`, independent of how the caller got there.
    ///
    /// Integrates in fixed sub-steps so that a seek (including backwards,
    /// which restarts the simulation) lands on the same value as ticking
    /// frame by frame at any rate.
    pub fn sample(&mut self, elapsed_secs: f32, config: &SpringConfig) -> f32 {
        let elapsed_secs = elapsed_secs.max(0.0);
        if elapsed_secs < self.last_t {
            *self = Self::new();
        }
        while self.last_t + SAMPLE_STEP_SECS <= elapsed_secs {
            let next = self.last_t + SAMPLE_STEP_SECS;
            self.step(next, config);
        }
        self.position
    }

    /// Check if the spring has settled (position near target, velocity near zero)
    pub fn is_settled(&self, threshold: f32) -> bool {
        (self.position - 1.0).abs() < threshold && self.velocity.abs() < threshold
    }
}

impl Default for SpringState {
    fn default() -> Self {
        Self::new()
    }
}
