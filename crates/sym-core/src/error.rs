use crate::agent::AgentId;
use crate::resource::ResourceKind;

/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors reported by agent and resource operations.
///
/// None of these are fatal: every operation that returns one leaves the
/// state it was asked to touch unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    /// A resource name outside the fixed set of kinds.
    #[error("unknown resource kind: \"{0}\"")]
    UnknownResource(String),

    /// A generate call with a negative amount.
    #[error("cannot generate a negative amount of {kind}: {amount}")]
    NegativeAmount {
        /// The kind the caller tried to generate.
        kind: ResourceKind,
        /// The rejected amount.
        amount: f64,
    },

    /// A receptor orientation outside the discrete set.
    #[error("invalid receptor orientation: {0} (expected one of 0, 15, 30, 45, 60, 75, 90)")]
    InvalidOrientation(u16),

    /// The handle does not refer to an agent that is still stored.
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),
}
