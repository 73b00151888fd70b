//! Muster Runtime - composition root for Muster bots.
//!
//! This crate provides:
//! - Layered configuration (`ConfigLoader`, `MusterConfig`)
//! - Logging setup (`LoggingBuilder`)
//! - The event loop (`MusterRuntime`): per-stream workers, the interval
//!   tick task and graceful shutdown
//!
//! ```ignore
//! use muster_runtime::MusterRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let (gateway, events) = MyGateway::connect().await?;
//!
//!     let runtime = MusterRuntime::builder(gateway)
//!         .feature(Arc::new(Giveaway::default()))
//!         .build()?;
//!
//!     // Run until Ctrl+C
//!     runtime.run(events).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{ConfigError, ConfigLoader, ConfigResult, LoggingConfig, MusterConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{MusterRuntime, RuntimeBuilder};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros for feature code.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
