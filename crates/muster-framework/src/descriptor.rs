//! Handler descriptors: one per (handler, trigger) pair.

use std::fmt;
use std::sync::Arc;

use crate::auth::RoleRequirement;
use crate::context::Invocation;
use crate::error::HandlerResult;
use crate::handler::{BoxFuture, BoxedHandler};
use crate::param::ParamSpec;
use crate::trigger::{Trigger, TriggerKind};

/// Whether the dispatcher waits for a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Awaited before the next handler for the same trigger runs.
    #[default]
    Sync,
    /// Spawned onto the runtime and not awaited.
    FireAndForget,
}

/// Identity of a descriptor inside one registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub(crate) usize);

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything the engine knows about one registered handler/trigger pair.
///
/// Created once while the registry is built and immutable afterwards.
pub struct HandlerDescriptor {
    pub(crate) id: HandlerId,
    pub(crate) owner: &'static str,
    pub(crate) name: Arc<str>,
    pub(crate) trigger: Trigger,
    pub(crate) params: Arc<[ParamSpec]>,
    pub(crate) mode: ExecutionMode,
    pub(crate) required_roles: Arc<[RoleRequirement]>,
    pub(crate) usage: Option<Arc<str>>,
    pub(crate) description: Option<Arc<str>>,
    pub(crate) handler: BoxedHandler,
}

impl HandlerDescriptor {
    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Type name of the feature that declared the handler.
    pub fn owner(&self) -> &'static str {
        self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    pub fn kind(&self) -> TriggerKind {
        self.trigger.kind()
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn required_roles(&self) -> &[RoleRequirement] {
        &self.required_roles
    }

    pub fn usage(&self) -> Option<&str> {
        self.usage.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Invokes the underlying handler.
    pub(crate) fn call(&self, ctx: Invocation) -> BoxFuture<'static, HandlerResult> {
        self.handler.call(ctx)
    }
}

impl fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("trigger", &self.trigger)
            .field("mode", &self.mode)
            .field("params", &self.params.len())
            .field("required_roles", &self.required_roles)
            .finish_non_exhaustive()
    }
}
