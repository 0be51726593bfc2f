use std::fmt;

use sym_core::{AgentId, ReceptorId, ResourceKind};

/// Why an agent died.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeathCause {
    /// Too many resource kinds hit zero.
    Starvation {
        /// The kinds that were empty.
        depleted: Vec<ResourceKind>,
    },
    /// Removed by an explicit call.
    Culled,
}

impl fmt::Display for DeathCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Starvation { depleted } => {
                let names: Vec<&str> = depleted.iter().map(|k| k.as_str()).collect();
                write!(f, "starvation ({})", names.join(", "))
            }
            Self::Culled => write!(f, "culled"),
        }
    }
}

/// What kind of simulation event occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEventKind {
    /// The population was seeded.
    Seeded {
        /// How many agents were created.
        count: usize,
    },

    // Links
    /// Two agents bound a receptor pair.
    LinkFormed {
        /// The agent that initiated the link.
        a: AgentId,
        /// The other agent.
        b: AgentId,
        /// Receptor used on `a`.
        a_receptor: ReceptorId,
        /// Receptor used on `b`.
        b_receptor: ReceptorId,
    },
    /// A survivor dropped its link to an agent that died.
    LinkRetracted {
        /// The agent that kept living.
        survivor: AgentId,
        /// The agent that died.
        dead: AgentId,
    },

    // Lifecycle
    /// An agent died.
    AgentDied {
        /// The agent that died.
        agent: AgentId,
        /// The cause of death.
        cause: DeathCause,
    },
    /// Dead agents were removed from the population.
    Swept {
        /// How many were removed.
        count: usize,
    },

    // Movement
    /// An agent bounced off the field boundary.
    BoundaryReflected {
        /// The agent that bounced.
        agent: AgentId,
    },
}

impl SimEventKind {
    /// Check whether a given agent is involved in this event.
    pub fn involves(&self, id: AgentId) -> bool {
        match self {
            Self::Seeded { .. } | Self::Swept { .. } => false,
            Self::LinkFormed { a, b, .. } => *a == id || *b == id,
            Self::LinkRetracted { survivor, dead } => *survivor == id || *dead == id,
            Self::AgentDied { agent, .. } | Self::BoundaryReflected { agent } => *agent == id,
        }
    }
}

/// A record of something that happened during simulation.
#[derive(Debug, Clone)]
pub struct SimEvent {
    /// The simulation tick when this event occurred.
    pub tick: u64,
    /// The specific kind of event that occurred.
    pub kind: SimEventKind,
    /// A human-readable description of the event.
    pub description: String,
}

impl SimEvent {
    /// Create a new simulation event with the given tick, kind, and description.
    pub fn new(tick: u64, kind: SimEventKind, description: impl Into<String>) -> Self {
        Self {
            tick,
            kind,
            description: description.into(),
        }
    }
}

/// Accumulates events during a simulation run.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<SimEvent>,
    max_events: usize,
}

impl EventLog {
    /// Create a new event log with the given maximum capacity (0 = unlimited).
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Vec::new(),
            max_events,
        }
    }

    /// Append an event, dropping the oldest events if the log exceeds its capacity.
    pub fn push(&mut self, event: SimEvent) {
        self.events.push(event);
        if self.max_events > 0 && self.events.len() > self.max_events {
            let drain_count = self.events.len() - self.max_events;
            self.events.drain(..drain_count);
        }
    }

    /// Return a slice of all recorded events.
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Return all events that occurred at the given tick.
    pub fn events_at_tick(&self, tick: u64) -> Vec<&SimEvent> {
        self.events.iter().filter(|e| e.tick == tick).collect()
    }

    /// Return all events involving the given agent.
    pub fn events_for_agent(&self, id: AgentId) -> Vec<&SimEvent> {
        self.events.iter().filter(|e| e.kind.involves(id)).collect()
    }

    /// Return the number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Return `true` if no events have been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Remove all recorded events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
