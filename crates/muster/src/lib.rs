//! # Muster
//!
//! A declarative command and event engine for chat bots.
//!
//! ## Overview
//!
//! Bot features are plain structs. Each lists its handlers once, together
//! with the triggers that run them, and the engine takes care of matching
//! gateway events, binding arguments, checking roles and dispatching.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐     ┌──────────┐     ┌───────────────────┐     ┌─────────────────┐
//! │ Gateway  │────▶│ Runtime  │────▶│ Engine            │────▶│ Feature handler │
//! │ (events) │     │ (queues) │     │ resolve/gate/bind │     │ sync / detached │
//! └──────────┘     └──────────┘     └───────────────────┘     └─────────────────┘
//!                       │                    ▲
//!                       └────── ticks ───────┘
//! ```
//!
//! - **Gateway**: the platform client; delivers events and executes replies
//! - **Runtime**: one ordered queue per event stream plus the interval ticker
//! - **Engine**: the trigger registry and the dispatch pipeline
//! - **Features**: user structs whose async methods are the handlers
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use muster::prelude::*;
//!
//! #[derive(Default)]
//! struct Ping;
//!
//! impl Ping {
//!     async fn ping(self: Arc<Self>, ctx: Invocation) -> HandlerResult {
//!         ctx.reply("pong").await?;
//!         Ok(())
//!     }
//! }
//!
//! impl Feature for Ping {
//!     fn register(r: &mut Registrar<Self>) {
//!         r.handler("ping", Self::ping).command("!ping");
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let (gateway, events) = MyGateway::connect().await?;
//!     MusterRuntime::builder(gateway)
//!         .feature(Arc::new(Ping))
//!         .build()?
//!         .run(events)
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: read `muster.toml` configuration files (default)
//! - `yaml-config`: read `muster.yaml` configuration files
//! - `json-log`: enable the JSON log format

pub use muster_core as core;
pub use muster_framework as framework;
pub use muster_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use muster::prelude::*;
/// ```
pub mod prelude {
    pub use std::sync::Arc;

    // Runtime - main entry point
    pub use muster_runtime::{ConfigLoader, MusterConfig, MusterRuntime};

    // Declaring features
    pub use muster_framework::{
        Feature, HandlerResult, Invocation, ParamSpec, ParamType, Payload, Registrar,
    };

    // Engine, for driving dispatch without the runtime
    pub use muster_framework::{Engine, EngineConfig};

    // Event model and gateway contract
    pub use muster_core::{
        BoxedGateway, ChannelId, Gateway, GatewayError, GatewayEvent, GatewayResult, GuildId,
        Message, OptionValue, Role, RoleId, User, UserId,
    };

    // Logging macros
    pub use muster_runtime::prelude::*;
}
