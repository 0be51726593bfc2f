//! Read-only views of a population for renderers, dashboards and exports.
//!
//! Nothing here mutates the population. Views are plain owned data so a
//! frontend can hold them across frames.

use std::collections::BTreeMap;

use serde::Serialize;
use sym_core::{Agent, AgentId, ResourceKind, Vec3};

use crate::population::Population;

/// One link as a renderer draws it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkView {
    /// The linked peer.
    pub peer: AgentId,
    /// Where the peer currently is.
    pub peer_position: Vec3,
}

/// Everything a renderer reads about one agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentView {
    /// The agent.
    pub id: AgentId,
    /// Current position.
    pub position: Vec3,
    /// False only between a death and the next sweep.
    pub alive: bool,
    /// Drawn in a different color.
    pub adversarial: bool,
    /// Current links with peer positions.
    pub links: Vec<LinkView>,
}

impl AgentView {
    /// RGB color: blue for honest agents, red for adversarial ones.
    pub fn tint(&self) -> [f32; 3] {
        if self.adversarial {
            [1.0, 0.0, 0.0]
        } else {
            [0.0, 0.0, 1.0]
        }
    }
}

/// One bar of the health dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardRow {
    /// The agent.
    pub id: AgentId,
    /// Level of every resource kind.
    pub levels: BTreeMap<ResourceKind, f64>,
    /// Sum of all levels.
    pub health: f64,
    /// Number of linked peers.
    pub link_count: usize,
    /// Whether the agent strips its peers.
    pub adversarial: bool,
}

impl DashboardRow {
    fn of(agent: &Agent) -> Self {
        Self {
            id: agent.id(),
            levels: agent.resources().iter().collect(),
            health: agent.resources().total(),
            link_count: agent.link_count(),
            adversarial: agent.is_adversarial(),
        }
    }
}

/// A scrollable window over dashboard rows, least healthy first.
#[derive(Debug, Clone)]
pub struct Dashboard {
    rows: Vec<DashboardRow>,
    per_page: usize,
    offset: usize,
}

impl Dashboard {
    /// Wrap `rows` with a page size. Starts at the top.
    pub fn new(rows: Vec<DashboardRow>, per_page: usize) -> Self {
        Self {
            rows,
            per_page,
            offset: 0,
        }
    }

    /// Move the window by `amount` rows, clamped to the valid range.
    pub fn scroll(&mut self, amount: isize) {
        let max_offset = self.rows.len().saturating_sub(self.per_page);
        self.offset = self.offset.saturating_add_signed(amount).min(max_offset);
    }

    /// First visible row.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Rows currently in the window.
    pub fn visible(&self) -> &[DashboardRow] {
        let end = (self.offset + self.per_page).min(self.rows.len());
        &self.rows[self.offset..end]
    }

    /// All rows.
    pub fn rows(&self) -> &[DashboardRow] {
        &self.rows
    }

    /// Largest health across all rows, for scaling bars. 1.0 when there is
    /// nothing positive to scale against.
    pub fn max_health(&self) -> f64 {
        let max = self.rows.iter().map(|r| r.health).fold(0.0, f64::max);
        if max > 0.0 { max } else { 1.0 }
    }
}

/// Headline numbers for a population.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PopulationStats {
    /// Live agents.
    pub alive: usize,
    /// Distinct links (each counted once).
    pub links: usize,
    /// Live adversarial agents.
    pub adversarial: usize,
    /// Mean health of live agents, 0.0 when there are none.
    pub mean_health: f64,
    /// Deaths since the start of the run.
    pub deaths: u64,
}

/// A full read-only export of the population at one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulationSnapshot {
    /// Tick the snapshot was taken at.
    pub tick: u64,
    /// Simulated seconds at that tick.
    pub elapsed: f64,
    /// Headline numbers.
    pub stats: PopulationStats,
    /// Renderer view of every agent.
    pub agents: Vec<AgentView>,
    /// Dashboard rows, least healthy first.
    pub dashboard: Vec<DashboardRow>,
}

impl Population {
    /// Renderer view of every stored agent, in iteration order.
    pub fn render_view(&self) -> Vec<AgentView> {
        self.agents()
            .map(|agent| AgentView {
                id: agent.id(),
                position: agent.position(),
                alive: agent.is_alive(),
                adversarial: agent.is_adversarial(),
                links: agent
                    .links()
                    .iter()
                    .filter_map(|peer| {
                        self.get(*peer).map(|p| LinkView {
                            peer: *peer,
                            peer_position: p.position(),
                        })
                    })
                    .collect(),
            })
            .collect()
    }

    /// One row per live agent, least healthy first.
    pub fn dashboard(&self) -> Vec<DashboardRow> {
        let mut rows: Vec<DashboardRow> = self
            .agents()
            .filter(|a| a.is_alive())
            .map(DashboardRow::of)
            .collect();
        rows.sort_by(|a, b| a.health.total_cmp(&b.health));
        rows
    }

    /// Headline numbers.
    pub fn stats(&self) -> PopulationStats {
        let live: Vec<&Agent> = self.agents().filter(|a| a.is_alive()).collect();
        let link_ends: usize = live.iter().map(|a| a.link_count()).sum();
        let mean_health = if live.is_empty() {
            0.0
        } else {
            live.iter().map(|a| a.resources().total()).sum::<f64>() / live.len() as f64
        };
        PopulationStats {
            alive: live.len(),
            links: link_ends / 2,
            adversarial: live.iter().filter(|a| a.is_adversarial()).count(),
            mean_health,
            deaths: self.total_deaths(),
        }
    }

    /// Everything at once.
    pub fn snapshot(&self) -> PopulationSnapshot {
        PopulationSnapshot {
            tick: self.current_tick(),
            elapsed: self.clock().elapsed(),
            stats: self.stats(),
            agents: self.render_view(),
            dashboard: self.dashboard(),
        }
    }
}
