//! Errors reported by gateway collaborators.

use thiserror::Error;

use crate::id::GuildId;

/// Errors a [`Gateway`](crate::Gateway) implementation can return.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The gateway session is not established.
    #[error("gateway is not connected")]
    NotConnected,

    /// The platform did not answer in time.
    #[error("gateway request timed out")]
    Timeout,

    /// The platform refused the request.
    #[error("request rejected ({status}): {message}")]
    Rejected {
        /// Platform status code.
        status: u16,
        /// Platform error message.
        message: String,
    },

    /// The bot is not a member of the guild.
    #[error("unknown guild {0}")]
    UnknownGuild(GuildId),

    /// Payload could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

impl GatewayError {
    /// Creates an [`GatewayError::Other`] from any message.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
