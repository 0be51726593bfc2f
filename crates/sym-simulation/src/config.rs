use sym_core::{ExchangeConfig, Field, ResourceConfig, SpawnConfig, Vec3};

use crate::error::{SimError, SimResult};

/// Every tunable of a population in one value.
///
/// Two populations built from different configs never share state, so
/// differently tuned runs can live side by side in one process.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// RNG seed for deterministic simulation.
    pub seed: u64,
    /// Agents created by [`Population::seed_default`](crate::Population::seed_default).
    pub agent_count: usize,
    /// The circular region agents live in.
    pub field: Field,
    /// Agents closer than this on the ground plane may link.
    pub link_distance: f64,
    /// Resource ceiling, starting levels, and metabolism.
    pub resources: ResourceConfig,
    /// Strip and balance amounts.
    pub exchange: ExchangeConfig,
    /// Receptor count, speed, and adversarial odds of new agents.
    pub spawn: SpawnConfig,
    /// Maximum event log size (oldest events dropped when exceeded). 0 = unlimited.
    pub max_events: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            agent_count: 60,
            field: Field::default(),
            link_distance: 2.0,
            resources: ResourceConfig::default(),
            exchange: ExchangeConfig::default(),
            spawn: SpawnConfig::default(),
            max_events: 0,
        }
    }
}

impl SimConfig {
    /// Set the RNG seed for deterministic simulation.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set how many agents a default seeding creates.
    pub fn with_agent_count(mut self, count: usize) -> Self {
        self.agent_count = count;
        self
    }

    /// Set the field center and radius.
    pub fn with_field(mut self, center: Vec3, radius: f64) -> Self {
        self.field = Field::new(center, radius);
        self
    }

    /// Set the link distance threshold.
    pub fn with_link_distance(mut self, distance: f64) -> Self {
        self.link_distance = distance;
        self
    }

    /// Replace the resource tuning.
    pub fn with_resources(mut self, resources: ResourceConfig) -> Self {
        self.resources = resources;
        self
    }

    /// Replace the exchange tuning.
    pub fn with_exchange(mut self, exchange: ExchangeConfig) -> Self {
        self.exchange = exchange;
        self
    }

    /// Replace the spawn tuning.
    pub fn with_spawn(mut self, spawn: SpawnConfig) -> Self {
        self.spawn = spawn;
        self
    }

    /// Set the maximum event log size (0 = unlimited).
    pub fn with_max_events(mut self, max: usize) -> Self {
        self.max_events = max;
        self
    }

    /// Reject values that would break the resource or geometry invariants.
    pub fn validate(&self) -> SimResult<()> {
        let r = &self.resources;
        let s = &self.spawn;
        let e = &self.exchange;

        check(
            self.field.center.is_finite() && self.field.radius.is_finite() && self.field.radius > 0.0,
            "field radius must be positive and finite",
        )?;
        check(
            self.link_distance.is_finite() && self.link_distance >= 0.0,
            "link distance must be non-negative",
        )?;
        check(
            r.max_level.is_finite() && r.max_level > 0.0,
            "max resource level must be positive",
        )?;
        check(
            0.0 <= r.initial_min && r.initial_min <= r.initial_max && r.initial_max <= r.max_level,
            "initial resource range must satisfy 0 <= min <= max <= max_level",
        )?;
        check(
            0.0 <= r.generate_min && r.generate_min <= r.generate_max && r.generate_max.is_finite(),
            "generate range must satisfy 0 <= min <= max",
        )?;
        check(
            is_probability(r.generate_probability) && is_probability(r.metabolize_probability),
            "metabolism probabilities must lie in [0, 1]",
        )?;
        check(
            r.metabolize_amount.is_finite() && r.metabolize_amount >= 0.0,
            "metabolize amount must be non-negative",
        )?;
        check(r.starvation_kinds > 0, "starvation kinds must be at least 1")?;
        check(
            s.min_receptors <= s.max_receptors,
            "receptor count range must satisfy min <= max",
        )?;
        check(
            is_probability(s.adversarial_probability),
            "adversarial probability must lie in [0, 1]",
        )?;
        check(
            0.0 <= s.min_speed && s.min_speed <= s.max_speed && s.max_speed.is_finite(),
            "speed range must satisfy 0 <= min <= max",
        )?;
        check(
            [e.strip_cap, e.balance_margin, e.balance_step]
                .iter()
                .all(|v| v.is_finite() && *v >= 0.0),
            "exchange amounts must be non-negative",
        )?;
        Ok(())
    }
}

fn check(ok: bool, message: &str) -> SimResult<()> {
    if ok {
        Ok(())
    } else {
        Err(SimError::InvalidConfig(message.to_string()))
    }
}

fn is_probability(p: f64) -> bool {
    (0.0..=1.0).contains(&p)
}
