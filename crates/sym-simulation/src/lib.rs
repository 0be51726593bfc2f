//! Tick-based population simulation for Symbiont.
//!
//! A [`Population`] owns every agent of a run, the seeded RNG, the clock and
//! the event log, and advances them one phase-ordered tick at a time. All
//! tuning comes from a single [`SimConfig`] value. Renderers, dashboards and
//! drivers only read the views in [`view`].

/// Simulation clock for tracking ticks and simulated seconds.
pub mod clock;
/// Configuration types for simulation runs.
pub mod config;
/// Error types for the simulation crate.
pub mod error;
/// Simulation event types and the event log.
pub mod event;
/// The agent population and its per-tick phases.
pub mod population;
/// Read-only views for renderers, dashboards and exports.
pub mod view;

/// Re-export of [`clock::SimClock`].
pub use clock::SimClock;
/// Re-export of [`config::SimConfig`].
pub use config::SimConfig;
/// Re-exports of [`error::SimError`] and [`error::SimResult`].
pub use error::{SimError, SimResult};
/// Re-exports of the event types.
pub use event::{DeathCause, EventLog, SimEvent, SimEventKind};
/// Re-exports of [`population::Population`] and its helpers.
pub use population::{AgentBlueprint, Population, StepReport};
/// Re-exports of the view types.
pub use view::{AgentView, Dashboard, DashboardRow, LinkView, PopulationSnapshot, PopulationStats};
