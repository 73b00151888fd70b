//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{LogOutput, LoggingConfig, MusterConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &MusterConfig) -> ConfigResult<()> {
    if config.engine.failure_reply.trim().is_empty() {
        return Err(ConfigError::validation(
            "engine.failure_reply must not be empty",
        ));
    }

    if config.scheduler.tick_interval_ms == 0 {
        return Err(ConfigError::validation(
            "scheduler.tick_interval_ms must be greater than 0",
        ));
    }

    validate_logging_config(&config.logging)?;

    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "logging.output = \"file\" requires logging.file_path",
        ));
    }

    if let Some(target) = logging.filters.keys().find(|target| target.trim().is_empty()) {
        return Err(ConfigError::validation(format!(
            "Invalid logging filter target: {target:?}"
        )));
    }

    Ok(())
}
