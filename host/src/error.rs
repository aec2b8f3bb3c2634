use thiserror::Error;

/// Failure of a spin request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpinError {
    /// A spin is already in flight. Nothing was changed.
    #[error("Wheel is already spinning")]
    AlreadySpinning,
    /// Mutation failed; the wheel has been rolled back to idle
    #[error("Error spinning wheel: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("Wheel needs at least one entry")]
    NoEntries,
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("{what} must be at least {min}")]
    TooSmall { what: &'static str, min: usize },
}
