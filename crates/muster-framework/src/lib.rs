//! # Muster Framework
//!
//! The handler-dispatch engine behind Muster bots.
//!
//! Features declare their handlers once through an explicit builder; the
//! engine then routes every gateway event and scheduler tick to them:
//!
//! - [`Feature`] / [`Registrar`] for declaring handlers and their triggers
//! - [`TriggerRegistry`] grouping handlers by trigger kind and key
//! - Command resolution by longest prefix, quote-aware tokenizing and
//!   argument binding
//! - A role-based authorization gate
//! - A [`Dispatcher`] running handlers synchronously or fire-and-forget,
//!   with per-handler error isolation
//! - Slash-command schema generation and interaction binding
//! - Interval triggers driven by an external tick
//!
//! The chat platform itself stays behind the
//! [`Gateway`](muster_core::Gateway) trait.

pub mod args;
pub mod auth;
pub mod command;
pub mod context;
pub mod descriptor;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod feature;
pub mod handler;
pub mod interval;
pub mod param;
pub mod registry;
pub mod resolver;
pub mod slash;
pub mod trigger;

#[cfg(test)]
mod testing;

pub use args::Args;
pub use auth::{RoleRequirement, authorize};
pub use command::{bind_tokens, tokenize};
pub use context::{Invocation, Payload};
pub use descriptor::{ExecutionMode, HandlerDescriptor, HandlerId};
pub use dispatcher::{Call, Dispatcher, FailurePolicy, ModePolicy};
pub use engine::{Engine, EngineBuilder, EngineConfig};
pub use error::{ArgError, BindError, HandlerError, HandlerResult, RegistrationError};
pub use feature::{Feature, HandlerDraft, Registrar};
pub use handler::{BoxFuture, BoxedHandler, ErasedHandler, Handler};
pub use interval::IntervalScheduler;
pub use param::{ParamSpec, ParamType};
pub use registry::{CommandHelp, RegistryBuilder, TriggerRegistry};
pub use resolver::CommandMatch;
pub use trigger::{Trigger, TriggerKind};
