//! Domain-level error taxonomy for evalgrid.

/// Errors produced by submission-shape validation.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("configuration must have a name")]
    MissingName,

    #[error("configuration must provide a target or a baseTarget")]
    MissingTarget,

    #[error("runsPerCase must be at least 1")]
    ZeroRunsPerCase,

    #[error("suites must not be empty")]
    EmptySuites,

    #[error("matrix axis '{0}' must not be empty")]
    EmptyMatrixAxis(&'static str),

    #[error("invalid configuration body: {0}")]
    Malformed(String),
}
