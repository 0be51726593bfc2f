//! Core types for Symbiont: agents, receptors, resources, and the field they
//! move in.
//!
//! Everything here is plain data plus the operations that touch one agent or
//! one linked pair. Population-wide scheduling lives in `sym-simulation`.

/// Agents, their handles, and the per-agent tuning they read.
pub mod agent;
/// Error types used throughout the crate.
pub mod error;
/// Vectors and the circular field.
pub mod geometry;
/// Receptors, their orientations, and link binding.
pub mod receptor;
/// Resource kinds and per-agent pools.
pub mod resource;

/// Re-export agent types.
pub use agent::{Agent, AgentId, ExchangeConfig, LinkFormed, SpawnConfig, Transfer};
/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export geometry types.
pub use geometry::{Bounce, Field, Vec3};
/// Re-export receptor types.
pub use receptor::{Orientation, Receptor, ReceptorId};
/// Re-export resource types.
pub use resource::{ResourceConfig, ResourceKind, ResourcePool};
