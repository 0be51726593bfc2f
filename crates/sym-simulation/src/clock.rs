/// Tracks simulation time: a monotonic tick counter and the simulated
/// seconds accumulated from every step's `dt`.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    tick: u64,
    elapsed: f64,
}

impl SimClock {
    /// Create a clock at tick 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one tick of `dt` seconds. Returns the new tick number.
    pub fn advance(&mut self, dt: f64) -> u64 {
        self.tick += 1;
        self.elapsed += dt;
        self.tick
    }

    /// Return the current tick number.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Total simulated seconds since the start.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}
