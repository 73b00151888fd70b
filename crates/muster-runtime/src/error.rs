//! Runtime error types.

use muster_framework::RegistrationError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that stop a runtime from starting.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A feature declared an invalid handler.
    #[error("Feature registration failed: {0}")]
    Registration(#[from] RegistrationError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
