//! Configuration for Muster runtimes.
//!
//! Settings are layered with figment from defaults, config files and
//! `MUSTER_*` environment variables, then validated before use.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile};
pub use schema::{
    LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, MusterConfig, SchedulerConfig,
    SpanEventConfig,
};
pub use validation::validate_config;
