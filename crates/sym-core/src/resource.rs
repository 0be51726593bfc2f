use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// The fixed set of resources every agent carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Sugar.
    Sugar,
    /// Spice.
    Spice,
    /// Grain.
    Grain,
    /// Water.
    Water,
    /// Oil.
    Oil,
}

impl ResourceKind {
    /// Every kind, in pool order.
    pub const ALL: [ResourceKind; 5] = [
        Self::Sugar,
        Self::Spice,
        Self::Grain,
        Self::Water,
        Self::Oil,
    ];

    /// Number of kinds.
    pub const COUNT: usize = Self::ALL.len();

    fn index(self) -> usize {
        self as usize
    }

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sugar => "sugar",
            Self::Spice => "spice",
            Self::Grain => "grain",
            Self::Water => "water",
            Self::Oil => "oil",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::UnknownResource(s.to_string()))
    }
}

/// Tuning for resource levels and per-tick metabolism.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceConfig {
    /// Upper bound of every level (MAX_RESOURCE).
    pub max_level: f64,
    /// Lower bound of the random starting level.
    pub initial_min: f64,
    /// Upper bound of the random starting level.
    pub initial_max: f64,
    /// Chance per kind per tick that some resource is generated.
    pub generate_probability: f64,
    /// Smallest generated amount.
    pub generate_min: f64,
    /// Largest generated amount.
    pub generate_max: f64,
    /// Chance per kind per tick that the agent burns some resource.
    pub metabolize_probability: f64,
    /// Amount burned when metabolism fires.
    pub metabolize_amount: f64,
    /// How many kinds at exactly zero kill the agent.
    pub starvation_kinds: usize,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            max_level: 20.0,
            initial_min: 5.0,
            initial_max: 20.0,
            generate_probability: 0.01,
            generate_min: 0.1,
            generate_max: 1.0,
            metabolize_probability: 0.1,
            metabolize_amount: 0.01,
            starvation_kinds: 2,
        }
    }
}

/// Per-agent inventory. Every level stays within `0.0..=max_level`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourcePool {
    levels: [f64; ResourceKind::COUNT],
    max_level: f64,
}

impl ResourcePool {
    /// A pool with every kind at the same level (clamped into range).
    pub fn filled(level: f64, max_level: f64) -> Self {
        let level = level.clamp(0.0, max_level);
        Self {
            levels: [level; ResourceKind::COUNT],
            max_level,
        }
    }

    /// A pool with each kind drawn uniformly from the configured starting range.
    pub fn random(rng: &mut impl Rng, config: &ResourceConfig) -> Self {
        let lo = config.initial_min.clamp(0.0, config.max_level);
        let hi = config.initial_max.clamp(lo, config.max_level);
        let mut levels = [0.0; ResourceKind::COUNT];
        for level in &mut levels {
            *level = if hi > lo { rng.random_range(lo..=hi) } else { lo };
        }
        Self {
            levels,
            max_level: config.max_level,
        }
    }

    /// The ceiling this pool clamps to.
    pub fn max_level(&self) -> f64 {
        self.max_level
    }

    /// Current amount of `kind`.
    pub fn level(&self, kind: ResourceKind) -> f64 {
        self.levels[kind.index()]
    }

    /// Current amount of the named kind, or 0.0 if no such kind exists.
    pub fn level_named(&self, name: &str) -> f64 {
        name.parse::<ResourceKind>()
            .map(|k| self.level(k))
            .unwrap_or(0.0)
    }

    /// Add `amount` of `kind`, saturating at the ceiling.
    ///
    /// Negative amounts are rejected and leave the pool unchanged.
    pub fn generate(&mut self, kind: ResourceKind, amount: f64) -> CoreResult<()> {
        if amount < 0.0 || amount.is_nan() {
            return Err(CoreError::NegativeAmount { kind, amount });
        }
        self.deposit(kind, amount);
        Ok(())
    }

    /// Add a non-negative `amount`, saturating at the ceiling.
    pub(crate) fn deposit(&mut self, kind: ResourceKind, amount: f64) {
        let level = &mut self.levels[kind.index()];
        *level = (*level + amount.max(0.0)).min(self.max_level);
    }

    /// How much more of `kind` fits before the ceiling.
    pub fn headroom(&self, kind: ResourceKind) -> f64 {
        (self.max_level - self.level(kind)).max(0.0)
    }

    /// Remove `amount` of `kind`, flooring at zero.
    ///
    /// Returns whether at least `amount` was available beforehand. The
    /// subtraction happens either way. Negative amounts count as zero.
    pub fn metabolize(&mut self, kind: ResourceKind, amount: f64) -> bool {
        let amount = amount.max(0.0);
        let level = &mut self.levels[kind.index()];
        let sufficient = *level >= amount;
        *level = (*level - amount).max(0.0);
        sufficient
    }

    /// [`metabolize`](Self::metabolize) by name. Unknown names are an error and
    /// mutate nothing.
    pub fn metabolize_named(&mut self, name: &str, amount: f64) -> CoreResult<bool> {
        let kind = name.parse::<ResourceKind>()?;
        Ok(self.metabolize(kind, amount))
    }

    /// Overwrite a level, clamped into range.
    pub fn set_level(&mut self, kind: ResourceKind, level: f64) {
        self.levels[kind.index()] = level.clamp(0.0, self.max_level);
    }

    /// Sum across all kinds. Dashboards use this as an agent's health.
    pub fn total(&self) -> f64 {
        self.levels.iter().sum()
    }

    /// Kinds whose level is exactly zero.
    pub fn depleted(&self) -> Vec<ResourceKind> {
        ResourceKind::ALL
            .into_iter()
            .filter(|k| self.level(*k) == 0.0)
            .collect()
    }

    /// `(kind, level)` pairs in pool order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, f64)> + '_ {
        ResourceKind::ALL.into_iter().map(|k| (k, self.level(k)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn parse_kind_case_insensitive() {
        assert_eq!("Water".parse::<ResourceKind>().unwrap(), ResourceKind::Water);
        assert_eq!("oil".parse::<ResourceKind>().unwrap(), ResourceKind::Oil);
    }

    #[test]
    fn parse_unknown_kind_fails() {
        let err = "mithril".parse::<ResourceKind>().unwrap_err();
        assert_eq!(err, CoreError::UnknownResource("mithril".into()));
    }

    #[test]
    fn generate_saturates_at_max() {
        let mut pool = ResourcePool::filled(19.5, 20.0);
        pool.generate(ResourceKind::Sugar, 5.0).unwrap();
        assert_eq!(pool.level(ResourceKind::Sugar), 20.0);
    }

    #[test]
    fn headroom_shrinks_to_zero_at_ceiling() {
        let mut pool = ResourcePool::filled(18.5, 20.0);
        assert!((pool.headroom(ResourceKind::Grain) - 1.5).abs() < 1e-12);
        pool.set_level(ResourceKind::Grain, 20.0);
        assert_eq!(pool.headroom(ResourceKind::Grain), 0.0);
    }

    #[test]
    fn generate_negative_rejected() {
        let mut pool = ResourcePool::filled(10.0, 20.0);
        assert!(pool.generate(ResourceKind::Grain, -1.0).is_err());
        assert_eq!(pool.level(ResourceKind::Grain), 10.0);
    }

    #[test]
    fn metabolize_reports_shortfall_but_still_drains() {
        let mut pool = ResourcePool::filled(0.5, 20.0);
        assert!(!pool.metabolize(ResourceKind::Spice, 1.0));
        assert_eq!(pool.level(ResourceKind::Spice), 0.0);

        assert!(pool.metabolize(ResourceKind::Oil, 0.5));
        assert_eq!(pool.level(ResourceKind::Oil), 0.0);
    }

    #[test]
    fn named_access() {
        let mut pool = ResourcePool::filled(3.0, 20.0);
        assert_eq!(pool.level_named("water"), 3.0);
        assert_eq!(pool.level_named("unobtainium"), 0.0);
        assert_eq!(pool.metabolize_named("water", 1.0), Ok(true));
        assert!(pool.metabolize_named("unobtainium", 1.0).is_err());
        assert_eq!(pool.total(), 14.0);
    }

    #[test]
    fn depleted_lists_zero_kinds() {
        let mut pool = ResourcePool::filled(1.0, 20.0);
        pool.set_level(ResourceKind::Grain, 0.0);
        pool.metabolize(ResourceKind::Oil, 5.0);
        assert_eq!(pool.depleted(), vec![ResourceKind::Grain, ResourceKind::Oil]);
    }

    #[test]
    fn random_pool_within_initial_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let config = ResourceConfig::default();
        for _ in 0..50 {
            let pool = ResourcePool::random(&mut rng, &config);
            for (_, level) in pool.iter() {
                assert!((config.initial_min..=config.initial_max).contains(&level));
            }
        }
    }

    #[derive(Debug, Clone)]
    enum Op {
        Generate(usize, f64),
        Metabolize(usize, f64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..ResourceKind::COUNT, 0.0f64..50.0).prop_map(|(k, a)| Op::Generate(k, a)),
            (0..ResourceKind::COUNT, -5.0f64..50.0).prop_map(|(k, a)| Op::Metabolize(k, a)),
        ]
    }

    proptest! {
        #[test]
        fn levels_stay_in_bounds(start in 0.0f64..20.0, ops in prop::collection::vec(op(), 0..64)) {
            let mut pool = ResourcePool::filled(start, 20.0);
            for op in ops {
                match op {
                    Op::Generate(k, a) => pool.generate(ResourceKind::ALL[k], a).unwrap(),
                    Op::Metabolize(k, a) => { pool.metabolize(ResourceKind::ALL[k], a); }
                }
                for (_, level) in pool.iter() {
                    prop_assert!((0.0..=20.0).contains(&level));
                }
            }
        }
    }
}
