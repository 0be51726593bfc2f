use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use slotmap::SlotMap;
use sym_core::{Agent, AgentId, CoreError, Orientation, ResourcePool, Vec3};

use crate::clock::SimClock;
use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::event::{DeathCause, EventLog, SimEvent, SimEventKind};

/// A request to place one agent with chosen traits.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentBlueprint {
    /// Starting position.
    pub position: Vec3,
    /// Starting velocity.
    pub velocity: Vec3,
    /// Receptor orientations in degrees.
    pub orientations: Vec<u16>,
    /// Whether the agent strips its peers.
    pub adversarial: bool,
    /// Fill every resource kind to this level. `None` rolls random levels.
    pub resource_level: Option<f64>,
}

impl AgentBlueprint {
    /// A stationary honest agent with no receptors at `position`.
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            orientations: Vec::new(),
            adversarial: false,
            resource_level: None,
        }
    }

    /// Set the starting velocity.
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Set the receptor orientations, in degrees.
    pub fn with_orientations(mut self, degrees: &[u16]) -> Self {
        self.orientations = degrees.to_vec();
        self
    }

    /// Make the agent adversarial.
    pub fn adversarial(mut self, adversarial: bool) -> Self {
        self.adversarial = adversarial;
        self
    }

    /// Start every resource kind at `level`.
    pub fn with_resource_level(mut self, level: f64) -> Self {
        self.resource_level = Some(level);
        self
    }
}

/// What one [`Population::step`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Tick number after the step.
    pub tick: u64,
    /// Links formed during discovery.
    pub links_formed: usize,
    /// Agents that died during resource management.
    pub deaths: usize,
    /// Individual resource transfers across links.
    pub transfers: usize,
    /// Dead agents swept out of the population.
    pub removed: usize,
    /// Agents that bounced off the boundary.
    pub reflections: usize,
}

/// Owns every live agent and drives the per-tick phases.
///
/// Agents are only inserted by seeding or spawning and only removed by the
/// sweep phase. Every other phase mutates agents in place, so handles taken
/// at the start of a phase stay valid for the whole phase. Links are only
/// ever changed by discovery and by the death transition; callers outside
/// get shared access to agents and mutable access to resource pools only.
#[derive(Debug)]
pub struct Population {
    config: SimConfig,
    agents: SlotMap<AgentId, Agent>,
    clock: SimClock,
    rng: StdRng,
    events: EventLog,
    deaths: u64,
}

impl Population {
    /// Create an empty population. The RNG is seeded from `config.seed`.
    pub fn new(config: SimConfig) -> SimResult<Self> {
        let rng = StdRng::seed_from_u64(config.seed);
        Self::with_rng(config, rng)
    }

    /// Create an empty population drawing from the given generator.
    pub fn with_rng(config: SimConfig, rng: StdRng) -> SimResult<Self> {
        config.validate()?;
        let events = EventLog::new(config.max_events);
        Ok(Self {
            config,
            agents: SlotMap::with_key(),
            clock: SimClock::new(),
            rng,
            events,
            deaths: 0,
        })
    }

    /// Create `count` random agents spread over the field.
    ///
    /// Positions use polar sampling: a uniform angle and a uniform radius, so
    /// density is higher near the center.
    pub fn seed(&mut self, count: usize) -> Vec<AgentId> {
        let field = self.config.field;
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            let angle = self.rng.random_range(0.0..std::f64::consts::TAU);
            let radius = self.rng.random_range(0.0..=field.radius);
            let position = field.center + Vec3::planar(angle, radius);
            let rng = &mut self.rng;
            let spawn = &self.config.spawn;
            let resources = &self.config.resources;
            let id = self
                .agents
                .insert_with_key(|id| Agent::random(id, position, rng, spawn, resources));
            ids.push(id);
        }
        self.emit(
            SimEventKind::Seeded { count },
            format!("seeded {count} agents"),
        );
        ids
    }

    /// Seed with the configured agent count.
    pub fn seed_default(&mut self) -> Vec<AgentId> {
        self.seed(self.config.agent_count)
    }

    /// Insert one agent exactly as described.
    ///
    /// The position must lie inside the field and both vectors must be
    /// finite; otherwise nothing is inserted.
    pub fn spawn(&mut self, blueprint: AgentBlueprint) -> SimResult<AgentId> {
        if !blueprint.position.is_finite() || !blueprint.velocity.is_finite() {
            return Err(SimError::InvalidConfig(
                "agent position and velocity must be finite".into(),
            ));
        }
        if !self.config.field.contains(blueprint.position) {
            return Err(SimError::InvalidConfig(format!(
                "agent position {} lies outside the field",
                blueprint.position
            )));
        }
        let orientations = blueprint
            .orientations
            .iter()
            .map(|d| Orientation::new(*d))
            .collect::<Result<Vec<_>, _>>()?;
        let pool = match blueprint.resource_level {
            Some(level) => ResourcePool::filled(level, self.config.resources.max_level),
            None => ResourcePool::random(&mut self.rng, &self.config.resources),
        };
        Ok(self.agents.insert_with_key(|id| {
            Agent::new(
                id,
                blueprint.position,
                blueprint.velocity,
                &orientations,
                pool,
                blueprint.adversarial,
            )
        }))
    }

    /// Advance one tick of `dt` seconds.
    ///
    /// Runs link discovery, resource management (which may kill agents),
    /// sharing, the dead-agent sweep and movement, each over the whole
    /// population before the next begins. A bad `dt` is rejected before
    /// anything changes.
    pub fn step(&mut self, dt: f64) -> SimResult<StepReport> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(SimError::InvalidTimeStep(dt));
        }
        let tick = self.clock.advance(dt);
        let links_formed = self.discover_links();
        let deaths = self.manage_resources();
        let transfers = self.share_resources();
        let removed = self.sweep();
        let reflections = self.move_agents(dt);
        Ok(StepReport {
            tick,
            links_formed,
            deaths,
            transfers,
            removed,
            reflections,
        })
    }

    /// Advance `n` ticks of `dt` seconds each.
    pub fn run(&mut self, n: u64, dt: f64) -> SimResult<()> {
        for _ in 0..n {
            self.step(dt)?;
        }
        Ok(())
    }

    /// Offer every unordered pair of agents one chance to link.
    ///
    /// Pairs are visited in slot order with the earlier agent initiating.
    /// Returns the number of links formed.
    pub fn discover_links(&mut self) -> usize {
        let ids: Vec<AgentId> = self.agents.keys().collect();
        let max_distance = self.config.link_distance;
        let mut formed = 0;
        for (i, &a) in ids.iter().enumerate() {
            for &b in &ids[i + 1..] {
                let Some([first, second]) = self.agents.get_disjoint_mut([a, b]) else {
                    continue;
                };
                if let Some(link) = first.connect_if_possible(second, max_distance) {
                    formed += 1;
                    self.events.push(SimEvent::new(
                        self.clock.tick(),
                        SimEventKind::LinkFormed {
                            a,
                            b,
                            a_receptor: link.own,
                            b_receptor: link.other,
                        },
                        format!(
                            "{a} linked with {b} ({} + {})",
                            first.receptors()[link.own.index as usize].orientation(),
                            second.receptors()[link.other.index as usize].orientation(),
                        ),
                    ));
                }
            }
        }
        formed
    }

    /// Run generation and metabolism on every live agent, killing the
    /// starving ones on the spot. Returns the number of deaths.
    pub fn manage_resources(&mut self) -> usize {
        let mut deaths = 0;
        let ids: Vec<AgentId> = self.agents.keys().collect();
        for id in ids {
            let depleted = match self.agents.get_mut(id) {
                Some(agent) if agent.is_alive() => {
                    if !agent.manage_resources(&mut self.rng, &self.config.resources) {
                        continue;
                    }
                    agent.resources().depleted()
                }
                _ => continue,
            };
            if self.kill(id, DeathCause::Starvation { depleted }) {
                deaths += 1;
            }
        }
        deaths
    }

    /// Let every live agent exchange resources with each of its peers.
    /// Returns the number of individual transfers.
    pub fn share_resources(&mut self) -> usize {
        let mut transfers = 0;
        let ids: Vec<AgentId> = self.agents.keys().collect();
        for id in ids {
            let peers = match self.agents.get(id) {
                Some(agent) if agent.is_alive() => agent.links().to_vec(),
                _ => continue,
            };
            for peer in peers {
                // A stale handle here means the peer is gone; skip it.
                if let Some([agent, other]) = self.agents.get_disjoint_mut([id, peer]) {
                    transfers += agent.share_with(other, &self.config.exchange).len();
                }
            }
        }
        transfers
    }

    /// Remove every dead agent. Their links were retracted when they died.
    pub fn sweep(&mut self) -> usize {
        let before = self.agents.len();
        self.agents.retain(|_, agent| agent.is_alive());
        let removed = before - self.agents.len();
        if removed > 0 {
            self.emit(
                SimEventKind::Swept { count: removed },
                format!("swept {removed} dead agents"),
            );
        }
        removed
    }

    /// Move every unlinked agent. Returns how many bounced off the boundary.
    pub fn move_agents(&mut self, dt: f64) -> usize {
        let field = self.config.field;
        let mut bounced = Vec::new();
        for agent in self.agents.values_mut() {
            if agent.is_alive() && agent.tick_movement(dt, &field) {
                bounced.push(agent.id());
            }
        }
        for &agent in &bounced {
            self.emit(
                SimEventKind::BoundaryReflected { agent },
                format!("{agent} bounced off the boundary"),
            );
        }
        bounced.len()
    }

    /// Kill an agent now. Returns false if it was already dead or unknown.
    pub fn die(&mut self, id: AgentId) -> bool {
        self.kill(id, DeathCause::Culled)
    }

    /// The death transition: retract every link touching `id` on both sides,
    /// then mark it dead. The agent stays stored until the next sweep.
    fn kill(&mut self, id: AgentId, cause: DeathCause) -> bool {
        let peers = match self.agents.get_mut(id) {
            Some(agent) if agent.is_alive() => agent.sever_all(),
            _ => return false,
        };
        for peer in peers {
            let retracted = self
                .agents
                .get_mut(peer)
                .is_some_and(|p| p.retract_link_to(id));
            if retracted {
                self.emit(
                    SimEventKind::LinkRetracted {
                        survivor: peer,
                        dead: id,
                    },
                    format!("{peer} lost its link to {id}"),
                );
            }
        }
        self.deaths += 1;
        let description = format!("{id} died of {cause}");
        self.emit(SimEventKind::AgentDied { agent: id, cause }, description);
        true
    }

    fn emit(&mut self, kind: SimEventKind, description: impl Into<String>) {
        self.events
            .push(SimEvent::new(self.clock.tick(), kind, description));
    }

    /// Check link symmetry, receptor consistency, capacity, resource bounds
    /// and that no agent references one outside the population.
    pub fn check_invariants(&self) -> SimResult<()> {
        for agent in self.agents.values() {
            let id = agent.id();
            let max = agent.resources().max_level();
            for (kind, level) in agent.resources().iter() {
                if !(0.0..=max).contains(&level) {
                    return violation(format!("{id} holds {level} {kind}, outside [0, {max}]"));
                }
            }

            if !agent.is_alive() {
                if agent.link_count() > 0 || agent.receptors().iter().any(|r| r.is_bound()) {
                    return violation(format!("dead agent {id} still has links"));
                }
                continue;
            }

            if agent.link_count() > agent.receptors().len() {
                return violation(format!(
                    "{id} has {} links but {} receptors",
                    agent.link_count(),
                    agent.receptors().len()
                ));
            }
            let unique: HashSet<AgentId> = agent.links().iter().copied().collect();
            if unique.len() != agent.link_count() {
                return violation(format!("{id} lists a peer twice"));
            }

            for &peer_id in agent.links() {
                let Some(peer) = self.agents.get(peer_id) else {
                    return violation(format!("{id} links to missing agent {peer_id}"));
                };
                if !peer.is_alive() {
                    return violation(format!("{id} links to dead agent {peer_id}"));
                }
                if !peer.is_linked_to(id) {
                    return violation(format!("{id} links to {peer_id} but not back"));
                }
            }

            let mut bound = 0;
            for receptor in agent.receptors() {
                let Some(target) = receptor.link() else {
                    continue;
                };
                bound += 1;
                let back = self
                    .agents
                    .get(target.agent)
                    .and_then(|p| p.receptors().get(target.index as usize))
                    .and_then(|r| r.link());
                if back != Some(receptor.id()) {
                    return violation(format!(
                        "receptor {} points at {target} which does not point back",
                        receptor.id()
                    ));
                }
                if !agent.is_linked_to(target.agent) {
                    return violation(format!(
                        "receptor {} is bound to {} which is not a linked peer",
                        receptor.id(),
                        target.agent
                    ));
                }
            }
            if bound != agent.link_count() {
                return violation(format!(
                    "{id} has {bound} bound receptors for {} links",
                    agent.link_count()
                ));
            }
        }
        Ok(())
    }

    /// Look up an agent. Stale handles yield `None`.
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id)
    }

    /// Mutable access to one agent's resource pool, for drivers that feed or
    /// drain an agent directly. Stale handles are [`CoreError::AgentNotFound`].
    pub fn resources_mut(&mut self, id: AgentId) -> SimResult<&mut ResourcePool> {
        self.agents
            .get_mut(id)
            .map(Agent::resources_mut)
            .ok_or(SimError::Core(CoreError::AgentNotFound(id)))
    }

    /// All stored agents in iteration order.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> + '_ {
        self.agents.values()
    }

    /// Number of stored agents.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether the population is empty.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Deaths since the population was created.
    pub fn total_deaths(&self) -> u64 {
        self.deaths
    }

    /// The configuration this population was built with.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// The simulation clock.
    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// The event log.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// The current tick number.
    pub fn current_tick(&self) -> u64 {
        self.clock.tick()
    }
}

fn violation(message: String) -> SimResult<()> {
    Err(SimError::InvariantViolation(message))
}
