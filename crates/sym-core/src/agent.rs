use std::fmt;

use rand::Rng;
use slotmap::{Key, new_key_type};

use crate::geometry::{Field, Vec3};
use crate::receptor::{Orientation, Receptor, ReceptorId};
use crate::resource::{ResourceConfig, ResourceKind, ResourcePool};

new_key_type! {
    /// Generational handle to an agent.
    ///
    /// A handle outlives the agent it names. Once the slot is reused the
    /// version no longer matches and lookups fail instead of aliasing.
    pub struct AgentId;
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ffi = self.data().as_ffi();
        write!(f, "#{}v{}", ffi & 0xffff_ffff, ffi >> 32)
    }
}

/// How new agents are rolled.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnConfig {
    /// Fewest receptors an agent can have.
    pub min_receptors: u8,
    /// Most receptors an agent can have.
    pub max_receptors: u8,
    /// Chance that a new agent strips its peers instead of balancing.
    pub adversarial_probability: f64,
    /// Slowest starting speed, units per second.
    pub min_speed: f64,
    /// Fastest starting speed, units per second.
    pub max_speed: f64,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            min_receptors: 1,
            max_receptors: 4,
            adversarial_probability: 0.05,
            min_speed: 0.5,
            max_speed: 2.0,
        }
    }
}

/// Rules for moving resources across a link.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeConfig {
    /// Most an adversarial agent takes per kind per peer per tick.
    pub strip_cap: f64,
    /// Gap a balancing agent tolerates before giving anything away.
    pub balance_margin: f64,
    /// Most a balancing agent gives per kind per peer per tick.
    pub balance_step: f64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            strip_cap: 0.01,
            balance_margin: 0.5,
            balance_step: 0.01,
        }
    }
}

/// A single unit moved between two pools.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transfer {
    /// Which resource moved.
    pub kind: ResourceKind,
    /// How much left the giver.
    pub amount: f64,
    /// Whether it was taken rather than given.
    pub stripped: bool,
}

/// Outcome of a successful [`Agent::connect_if_possible`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkFormed {
    /// Receptor on the initiating agent.
    pub own: ReceptorId,
    /// Receptor on the other agent.
    pub other: ReceptorId,
}

/// An entity in the field.
///
/// Life is one-way: an agent starts alive and the only transition is
/// [`sever_all`](Self::sever_all), which leaves it dead with no links.
#[derive(Debug, Clone)]
pub struct Agent {
    id: AgentId,
    position: Vec3,
    velocity: Vec3,
    receptors: Vec<Receptor>,
    resources: ResourcePool,
    links: Vec<AgentId>,
    adversarial: bool,
    alive: bool,
}

impl Agent {
    /// An agent with explicit traits.
    pub fn new(
        id: AgentId,
        position: Vec3,
        velocity: Vec3,
        orientations: &[Orientation],
        resources: ResourcePool,
        adversarial: bool,
    ) -> Self {
        let receptors = orientations
            .iter()
            .take(usize::from(u8::MAX))
            .enumerate()
            .map(|(i, o)| Receptor::new(ReceptorId { agent: id, index: i as u8 }, *o))
            .collect();
        Self {
            id,
            position,
            velocity,
            receptors,
            resources,
            links: Vec::new(),
            adversarial,
            alive: true,
        }
    }

    /// An agent whose receptor count, orientations, heading, speed, adversarial
    /// flag and starting resources are all drawn from `rng`.
    pub fn random(
        id: AgentId,
        position: Vec3,
        rng: &mut impl Rng,
        spawn: &SpawnConfig,
        resources: &ResourceConfig,
    ) -> Self {
        let lo = spawn.min_receptors.min(spawn.max_receptors);
        let count = rng.random_range(lo..=spawn.max_receptors.max(lo));
        let orientations: Vec<Orientation> =
            (0..count).map(|_| Orientation::random(rng)).collect();

        let heading = rng.random_range(0.0..std::f64::consts::TAU);
        let speed = if spawn.max_speed > spawn.min_speed {
            rng.random_range(spawn.min_speed..=spawn.max_speed)
        } else {
            spawn.min_speed
        };
        let adversarial = rng.random_bool(spawn.adversarial_probability.clamp(0.0, 1.0));
        let pool = ResourcePool::random(rng, resources);

        Self::new(
            id,
            position,
            Vec3::planar(heading, speed),
            &orientations,
            pool,
            adversarial,
        )
    }

    /// This agent's handle.
    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Current position.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Current velocity.
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Teleport. Used when placing agents.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Receptors in creation order.
    pub fn receptors(&self) -> &[Receptor] {
        &self.receptors
    }

    /// Inventory.
    pub fn resources(&self) -> &ResourcePool {
        &self.resources
    }

    /// Mutable inventory.
    pub fn resources_mut(&mut self) -> &mut ResourcePool {
        &mut self.resources
    }

    /// Peers this agent is linked to, in the order the links formed.
    pub fn links(&self) -> &[AgentId] {
        &self.links
    }

    /// Number of linked peers.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Whether this agent is linked to `other`.
    pub fn is_linked_to(&self, other: AgentId) -> bool {
        self.links.contains(&other)
    }

    /// Whether another link can still form.
    pub fn has_spare_capacity(&self) -> bool {
        self.links.len() < self.receptors.len()
    }

    /// Strips linked peers instead of balancing with them.
    pub fn is_adversarial(&self) -> bool {
        self.adversarial
    }

    /// False once the agent has died.
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Move for `dt` seconds, bouncing off the field boundary.
    ///
    /// Linked agents hold still. Returns whether the boundary was hit.
    pub fn tick_movement(&mut self, dt: f64, field: &Field) -> bool {
        if !self.links.is_empty() {
            return false;
        }
        let bounce = field.advance(self.position, self.velocity, dt);
        self.position = bounce.position;
        self.velocity = bounce.velocity;
        bounce.reflected
    }

    /// Random generation and metabolism for every kind.
    ///
    /// Returns true when enough kinds sit at zero that the agent should die.
    /// The caller runs the death itself, because retracting links touches
    /// other agents.
    pub fn manage_resources(&mut self, rng: &mut impl Rng, config: &ResourceConfig) -> bool {
        for kind in ResourceKind::ALL {
            if rng.random_bool(config.generate_probability.clamp(0.0, 1.0)) {
                let amount = if config.generate_max > config.generate_min {
                    rng.random_range(config.generate_min..=config.generate_max)
                } else {
                    config.generate_min
                };
                self.resources.deposit(kind, amount);
            }
            if rng.random_bool(config.metabolize_probability.clamp(0.0, 1.0)) {
                self.resources.metabolize(kind, config.metabolize_amount);
            }
        }
        self.is_starving(config)
    }

    /// Whether at least `starvation_kinds` kinds are at zero.
    pub fn is_starving(&self, config: &ResourceConfig) -> bool {
        self.resources.depleted().len() >= config.starvation_kinds
    }

    /// Exchange resources with one linked peer.
    ///
    /// Adversarial agents take up to `strip_cap` of every kind, no more than
    /// the peer holds and no more than fits under their own ceiling, so the
    /// peer's loss always equals the gain. Others give
    /// up to `balance_step` of any kind they hold more than `balance_margin`
    /// above the peer, never dropping below the peer's new level plus the
    /// margin. Does nothing unless both agents are alive and linked.
    pub fn share_with(&mut self, peer: &mut Agent, config: &ExchangeConfig) -> Vec<Transfer> {
        let mut transfers = Vec::new();
        if !self.alive || !peer.alive || !self.is_linked_to(peer.id) {
            return transfers;
        }

        for kind in ResourceKind::ALL {
            let mine = self.resources.level(kind);
            let theirs = peer.resources.level(kind);

            if self.adversarial {
                let amount = config
                    .strip_cap
                    .max(0.0)
                    .min(theirs)
                    .min(self.resources.headroom(kind));
                if amount > 0.0 {
                    peer.resources.metabolize(kind, amount);
                    self.resources.deposit(kind, amount);
                    transfers.push(Transfer {
                        kind,
                        amount,
                        stripped: true,
                    });
                }
            } else {
                let gap = mine - theirs;
                if gap > config.balance_margin {
                    let amount = config
                        .balance_step
                        .max(0.0)
                        .min((gap - config.balance_margin) / 2.0);
                    if amount > 0.0 {
                        self.resources.metabolize(kind, amount);
                        peer.resources.deposit(kind, amount);
                        transfers.push(Transfer {
                            kind,
                            amount,
                            stripped: false,
                        });
                    }
                }
            }
        }
        transfers
    }

    /// Try to form one link with `other`.
    ///
    /// Needs both agents alive, unlinked to each other, closer than
    /// `max_distance` on the ground plane, and both below capacity. Receptor
    /// pairs are scanned with this agent's receptors outermost; the first
    /// compatible pair is bound and the search stops.
    pub fn connect_if_possible(&mut self, other: &mut Agent, max_distance: f64) -> Option<LinkFormed> {
        if self.id == other.id || !self.alive || !other.alive || self.is_linked_to(other.id) {
            return None;
        }
        if self.position.planar_distance(other.position) >= max_distance {
            return None;
        }
        if !self.has_spare_capacity() || !other.has_spare_capacity() {
            return None;
        }

        for own in self.receptors.iter_mut() {
            if let Some(theirs) = other.receptors.iter_mut().find(|r| own.can_link(r)) {
                own.bind(theirs);
                let formed = LinkFormed {
                    own: own.id(),
                    other: theirs.id(),
                };
                self.links.push(other.id);
                other.links.push(self.id);
                return Some(formed);
            }
        }
        None
    }

    /// Forget a dead peer: drop it from the link list and free every receptor
    /// bound to one of its receptors. Returns whether anything changed.
    pub fn retract_link_to(&mut self, dead: AgentId) -> bool {
        let before = self.links.len();
        self.links.retain(|id| *id != dead);
        let mut changed = self.links.len() != before;
        for receptor in &mut self.receptors {
            if receptor.link().is_some_and(|r| r.agent == dead) {
                receptor.unbind();
                changed = true;
            }
        }
        changed
    }

    /// The death transition on this agent's side.
    ///
    /// Unbinds every receptor, clears the link list and marks the agent dead.
    /// Returns the former peers so the caller can retract the other half of
    /// each link. A second call returns an empty list.
    pub fn sever_all(&mut self) -> Vec<AgentId> {
        if !self.alive {
            return Vec::new();
        }
        for receptor in &mut self.receptors {
            receptor.unbind();
        }
        self.alive = false;
        std::mem::take(&mut self.links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use slotmap::KeyData;

    fn id(index: u32) -> AgentId {
        KeyData::from_ffi((1 << 32) | u64::from(index)).into()
    }

    fn orient(degrees: &[u16]) -> Vec<Orientation> {
        degrees.iter().map(|d| Orientation::new(*d).unwrap()).collect()
    }

    fn agent(index: u32, x: f64, degrees: &[u16]) -> Agent {
        Agent::new(
            id(index),
            Vec3::new(x, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            &orient(degrees),
            ResourcePool::filled(10.0, 20.0),
            false,
        )
    }

    #[test]
    fn link_forms_within_distance() {
        let mut a = agent(0, 0.0, &[30]);
        let mut b = agent(1, 1.0, &[60]);
        let formed = a.connect_if_possible(&mut b, 2.0).unwrap();
        assert_eq!(formed.own.agent, a.id());
        assert_eq!(formed.other.agent, b.id());
        assert_eq!(a.link_count(), 1);
        assert_eq!(b.link_count(), 1);
        assert_eq!(a.receptors()[0].link(), Some(b.receptors()[0].id()));
        assert_eq!(b.receptors()[0].link(), Some(a.receptors()[0].id()));
    }

    #[test]
    fn no_link_when_too_far() {
        let mut a = agent(0, 0.0, &[30]);
        let mut b = agent(1, 10.0, &[60]);
        assert!(a.connect_if_possible(&mut b, 2.0).is_none());
        assert_eq!(a.link_count(), 0);
        assert_eq!(b.link_count(), 0);
    }

    #[test]
    fn no_link_without_complement() {
        let mut a = agent(0, 0.0, &[30, 15]);
        let mut b = agent(1, 1.0, &[30, 90]);
        assert!(a.connect_if_possible(&mut b, 2.0).is_none());
        assert!(b.receptors().iter().all(|r| !r.is_bound()));
    }

    #[test]
    fn only_one_link_per_pair() {
        let mut a = agent(0, 0.0, &[30, 45]);
        let mut b = agent(1, 1.0, &[60, 45]);
        assert!(a.connect_if_possible(&mut b, 2.0).is_some());
        assert!(a.connect_if_possible(&mut b, 2.0).is_none());
        assert!(b.connect_if_possible(&mut a, 2.0).is_none());
        assert_eq!(a.link_count(), 1);
        // First match wins: the 30/60 pair, not 45/45.
        assert!(a.receptors()[0].is_bound());
        assert!(!a.receptors()[1].is_bound());
    }

    #[test]
    fn capacity_limits_links() {
        let mut hub = agent(0, 0.0, &[45]);
        let mut b = agent(1, 0.5, &[45]);
        let mut c = agent(2, -0.5, &[45, 45]);
        assert!(hub.connect_if_possible(&mut b, 2.0).is_some());
        assert!(hub.connect_if_possible(&mut c, 2.0).is_none());
        assert!(!hub.has_spare_capacity());
        assert_eq!(c.link_count(), 0);
    }

    #[test]
    fn linked_agents_do_not_move() {
        let field = Field::default();
        let mut a = agent(0, 0.0, &[30]);
        let mut b = agent(1, 1.0, &[60]);
        a.connect_if_possible(&mut b, 2.0);
        a.tick_movement(1.0, &field);
        assert_eq!(a.position(), Vec3::ZERO);

        let mut free = agent(2, 0.0, &[30]);
        free.tick_movement(1.0, &field);
        assert_eq!(free.position(), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn unlinked_agent_reflects_at_boundary() {
        let field = Field::new(Vec3::ZERO, 5.0);
        let mut a = agent(0, 4.5, &[30]);
        assert!(a.tick_movement(1.0, &field));
        assert!(field.contains(a.position()));
        assert!(a.velocity().x < 0.0);
    }

    #[test]
    fn adversarial_strips_capped_amount() {
        let mut a = agent(0, 0.0, &[30]);
        a.adversarial = true;
        let mut b = agent(1, 1.0, &[60]);
        a.connect_if_possible(&mut b, 2.0);
        b.resources_mut().set_level(ResourceKind::Water, 5.0);
        let before = a.resources().level(ResourceKind::Water);

        let transfers = a.share_with(&mut b, &ExchangeConfig::default());
        assert_eq!(transfers.len(), ResourceKind::COUNT);
        let taken = 5.0 - b.resources().level(ResourceKind::Water);
        let gained = a.resources().level(ResourceKind::Water) - before;
        assert!(taken <= 0.01 + 1e-12);
        assert!((taken - gained).abs() < 1e-12);
    }

    #[test]
    fn strip_takes_only_what_exists() {
        let mut a = agent(0, 0.0, &[30]);
        a.adversarial = true;
        let mut b = agent(1, 1.0, &[60]);
        a.connect_if_possible(&mut b, 2.0);
        b.resources_mut().set_level(ResourceKind::Oil, 0.004);
        a.share_with(&mut b, &ExchangeConfig::default());
        assert_eq!(b.resources().level(ResourceKind::Oil), 0.0);
    }

    #[test]
    fn strip_at_ceiling_is_zero_sum() {
        let mut a = agent(0, 0.0, &[30]);
        a.adversarial = true;
        let mut b = agent(1, 1.0, &[60]);
        a.connect_if_possible(&mut b, 2.0);
        a.resources_mut().set_level(ResourceKind::Water, 20.0);
        a.resources_mut().set_level(ResourceKind::Sugar, 19.995);
        b.resources_mut().set_level(ResourceKind::Water, 5.0);

        let transfers = a.share_with(&mut b, &ExchangeConfig::default());
        assert!(transfers.iter().all(|t| t.kind != ResourceKind::Water));
        assert_eq!(b.resources().level(ResourceKind::Water), 5.0);
        assert_eq!(a.resources().level(ResourceKind::Water), 20.0);

        let sugar = transfers
            .iter()
            .find(|t| t.kind == ResourceKind::Sugar)
            .unwrap();
        assert!((sugar.amount - 0.005).abs() < 1e-12);
        assert!((b.resources().level(ResourceKind::Sugar) - (10.0 - sugar.amount)).abs() < 1e-12);
        assert!((a.resources().level(ResourceKind::Sugar) - 20.0).abs() < 1e-12);
        assert!(a.resources().level(ResourceKind::Sugar) <= 20.0);
    }

    #[test]
    fn balancing_moves_toward_poorer_peer() {
        let mut a = agent(0, 0.0, &[30]);
        let mut b = agent(1, 1.0, &[60]);
        a.connect_if_possible(&mut b, 2.0);
        b.resources_mut().set_level(ResourceKind::Grain, 2.0);

        let transfers = a.share_with(&mut b, &ExchangeConfig::default());
        assert_eq!(transfers.len(), 1);
        assert!((a.resources().level(ResourceKind::Grain) - 9.99).abs() < 1e-12);
        assert!((b.resources().level(ResourceKind::Grain) - 2.01).abs() < 1e-12);

        // The poorer side gives nothing back.
        assert!(b.share_with(&mut a, &ExchangeConfig::default()).is_empty());
    }

    #[test]
    fn balancing_respects_margin() {
        let config = ExchangeConfig {
            balance_step: 10.0,
            ..ExchangeConfig::default()
        };
        let mut a = agent(0, 0.0, &[30]);
        let mut b = agent(1, 1.0, &[60]);
        a.connect_if_possible(&mut b, 2.0);
        b.resources_mut().set_level(ResourceKind::Sugar, 8.0);
        a.share_with(&mut b, &config);
        let mine = a.resources().level(ResourceKind::Sugar);
        let theirs = b.resources().level(ResourceKind::Sugar);
        assert!(mine >= theirs + config.balance_margin - 1e-12);
    }

    #[test]
    fn share_requires_link() {
        let mut a = agent(0, 0.0, &[30]);
        a.adversarial = true;
        let mut b = agent(1, 1.0, &[60]);
        assert!(a.share_with(&mut b, &ExchangeConfig::default()).is_empty());
        assert_eq!(b.resources().total(), 50.0);
    }

    #[test]
    fn sever_and_retract_clear_both_sides() {
        let mut a = agent(0, 0.0, &[30]);
        let mut b = agent(1, 1.0, &[60]);
        a.connect_if_possible(&mut b, 2.0);

        let peers = a.sever_all();
        assert_eq!(peers, vec![b.id()]);
        assert!(!a.is_alive());
        assert!(a.receptors().iter().all(|r| !r.is_bound()));

        assert!(b.retract_link_to(a.id()));
        assert_eq!(b.link_count(), 0);
        assert!(b.receptors().iter().all(|r| !r.is_bound()));

        assert!(a.sever_all().is_empty());
        assert!(!b.retract_link_to(a.id()));
    }

    #[test]
    fn dead_agents_do_not_link() {
        let mut a = agent(0, 0.0, &[30]);
        let mut b = agent(1, 1.0, &[60]);
        b.sever_all();
        assert!(a.connect_if_possible(&mut b, 2.0).is_none());
    }

    #[test]
    fn starvation_with_two_empty_kinds() {
        let config = ResourceConfig {
            generate_probability: 0.0,
            metabolize_probability: 0.0,
            ..ResourceConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let mut a = agent(0, 0.0, &[30]);
        a.resources_mut().metabolize(ResourceKind::Sugar, 100.0);
        assert!(!a.manage_resources(&mut rng, &config));
        a.resources_mut().metabolize(ResourceKind::Spice, 100.0);
        assert!(a.manage_resources(&mut rng, &config));
    }

    #[test]
    fn random_agent_respects_spawn_config() {
        let mut rng = StdRng::seed_from_u64(99);
        let spawn = SpawnConfig::default();
        for i in 0..100 {
            let a = Agent::random(
                id(i),
                Vec3::ZERO,
                &mut rng,
                &spawn,
                &ResourceConfig::default(),
            );
            let n = a.receptors().len();
            assert!((1..=4).contains(&n));
            let speed = a.velocity().planar_length();
            assert!((0.5 - 1e-9..=2.0 + 1e-9).contains(&speed));
            assert_eq!(a.velocity().y, 0.0);
            assert!(a.is_alive());
        }
    }

    #[test]
    fn agent_id_display() {
        assert_eq!(id(3).to_string(), "#3v1");
    }
}
