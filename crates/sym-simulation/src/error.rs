use sym_core::CoreError;

/// Alias for `Result<T, SimError>`.
pub type SimResult<T> = Result<T, SimError>;

/// Errors reported by the population and its configuration.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// An agent-level operation failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A configuration value is out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A negative or non-finite time step. Nothing was mutated.
    #[error("invalid time step: {0}")]
    InvalidTimeStep(f64),

    /// The link graph or a resource pool is inconsistent.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}
