//! The dispatch engine.
//!
//! [`Engine`] owns the trigger registry, the dispatcher and the interval
//! scheduler, and routes every [`GatewayEvent`] and tick through them:
//!
//! ```text
//! message      → resolve command → gate → tokenize + bind → dispatch (sync)
//!              → message listeners → mention listeners
//! component    → exact id lookup → gate → dispatch
//! slash        → name lookup → acknowledge → gate → bind options → dispatch (detached)
//! ready        → arm scheduler → register slash commands → ready listeners
//! tick         → due interval handlers → dispatch
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let engine = Engine::builder(gateway)
//!     .config(EngineConfig::default())
//!     .feature(Arc::new(Attendance::default()))?
//!     .build()?;
//!
//! engine.handle(event).await;
//! engine.tick(Instant::now()).await;
//! ```
//!
//! `Engine` also implements `tower::Service<GatewayEvent>`, so it can be
//! wrapped in Tower middleware by the runtime.

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};

use muster_core::{
    BoxedGateway, ComponentInteraction, GatewayEvent, GuildId, Message, Ready, SlashInteraction,
    UserId,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tower::Service;
use tracing::{Instrument, debug, debug_span, info, trace, warn};

use crate::args::Args;
use crate::auth::CallerRoles;
use crate::command::{bind_tokens, tokenize};
use crate::context::Payload;
use crate::descriptor::HandlerDescriptor;
use crate::dispatcher::{Call, Dispatcher, FailurePolicy, ModePolicy};
use crate::error::RegistrationError;
use crate::feature::Feature;
use crate::handler::BoxFuture;
use crate::interval::IntervalScheduler;
use crate::registry::{RegistryBuilder, TriggerRegistry};
use crate::resolver::CommandMatch;
use crate::slash;
use crate::trigger::TriggerKind;

/// Engine behaviour switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Replied when a text command without a usage hint fails.
    pub failure_reply: String,
    /// Skip messages written by other bots.
    pub ignore_bots: bool,
    /// Register slash commands with every guild on `Ready`.
    pub register_slash_commands: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            failure_reply: "Sorry, that command failed.".to_string(),
            ignore_bots: true,
            register_slash_commands: true,
        }
    }
}

struct EngineInner {
    registry: TriggerRegistry,
    gateway: BoxedGateway,
    dispatcher: Dispatcher,
    scheduler: IntervalScheduler,
    bot_user: RwLock<Option<UserId>>,
    config: EngineConfig,
}

/// Routes gateway events and ticks to registered handlers.
///
/// Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    /// Starts building an engine over `gateway`.
    pub fn builder(gateway: BoxedGateway) -> EngineBuilder {
        EngineBuilder::new(gateway)
    }

    /// Creates an engine from an already built registry.
    pub fn new(registry: TriggerRegistry, gateway: BoxedGateway, config: EngineConfig) -> Self {
        let dispatcher = Dispatcher::new(Arc::clone(&gateway), config.failure_reply.as_str());
        Self {
            inner: Arc::new(EngineInner {
                registry,
                gateway,
                dispatcher,
                scheduler: IntervalScheduler::new(),
                bot_user: RwLock::new(None),
                config,
            }),
        }
    }

    pub fn registry(&self) -> &TriggerRegistry {
        &self.inner.registry
    }

    pub fn scheduler(&self) -> &IntervalScheduler {
        &self.inner.scheduler
    }

    pub fn gateway(&self) -> &BoxedGateway {
        &self.inner.gateway
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// The bot's own user id, once a `Ready` event has been seen.
    pub fn bot_user(&self) -> Option<UserId> {
        *self.inner.bot_user.read()
    }

    /// Handles one gateway event.
    ///
    /// Returns once every synchronous handler for the event has finished.
    /// Handler failures are logged and never surface here.
    pub async fn handle(&self, event: GatewayEvent) {
        let span = debug_span!("dispatch", event = event.event_name());
        let payload = Arc::new(Payload::Event(event));
        self.route(&payload).instrument(span).await;
    }

    /// Runs every interval handler that is due at `now`.
    ///
    /// Ticks before the first `Ready` event are ignored.
    pub async fn tick(&self, now: Instant) {
        let due = self
            .inner
            .scheduler
            .take_due(self.inner.registry.intervals(), now);
        if due.is_empty() {
            return;
        }

        debug!(handlers = due.len(), "Interval handlers due");
        let payload = Arc::new(Payload::Tick(now));
        let calls = due.into_iter().map(|h| Call::new(h, Args::new())).collect();
        self.inner
            .dispatcher
            .dispatch(&payload, calls, ModePolicy::Declared, FailurePolicy::LogOnly)
            .instrument(debug_span!("tick"))
            .await;
    }

    /// Registers the slash-command schemas with `guilds`, or with every guild
    /// the gateway reports when `guilds` is empty.
    ///
    /// Returns the number of guilds that accepted the registration.
    pub async fn register_slash_commands(&self, guilds: &[GuildId]) -> usize {
        let schemas = self.inner.registry.slash_schemas();
        if schemas.is_empty() {
            return 0;
        }

        let guilds = if guilds.is_empty() {
            match self.inner.gateway.guilds().await {
                Ok(guilds) => guilds,
                Err(e) => {
                    warn!(error = %e, "Failed to list guilds for slash registration");
                    return 0;
                }
            }
        } else {
            guilds.to_vec()
        };

        slash::register_commands(&self.inner.gateway, &guilds, schemas).await
    }

    async fn route(&self, payload: &Arc<Payload>) {
        let Payload::Event(event) = payload.as_ref() else {
            return;
        };
        let registry = &self.inner.registry;

        match event {
            GatewayEvent::Message(message) => self.on_message(payload, event, message).await,
            GatewayEvent::Component(component) => {
                self.on_component(payload, event, component).await
            }
            GatewayEvent::SlashCommand(interaction) => {
                self.on_slash(payload, event, interaction).await
            }
            GatewayEvent::Ready(ready) => self.on_ready(payload, event, ready).await,
            GatewayEvent::Reaction(_) => {
                self.run_listeners(payload, event, registry.listeners(TriggerKind::Reaction))
                    .await
            }
            GatewayEvent::MemberJoined(_) => {
                self.run_listeners(payload, event, registry.listeners(TriggerKind::UserJoined))
                    .await
            }
            GatewayEvent::MemberUpdated(_) => {
                self.run_listeners(payload, event, registry.listeners(TriggerKind::MemberUpdated))
                    .await
            }
            GatewayEvent::VoiceStateUpdated(_) => {
                let listeners = registry.listeners(TriggerKind::VoiceStateChange);
                self.run_listeners(payload, event, listeners).await
            }
        }
    }

    async fn on_message(&self, payload: &Arc<Payload>, event: &GatewayEvent, message: &Message) {
        let bot_user = self.bot_user();
        if bot_user == Some(message.author.id) {
            trace!("Ignoring own message");
            return;
        }
        if message.author.bot && self.inner.config.ignore_bots {
            trace!(author = %message.author.id, "Ignoring bot message");
            return;
        }

        let registry = &self.inner.registry;
        let mut roles = CallerRoles::new(&self.inner.gateway, event);

        if let Some(matched) = registry.resolve_command(&message.content) {
            self.run_command(payload, &mut roles, matched).await;
        }

        let listeners = gate(&mut roles, registry.listeners(TriggerKind::Message)).await;
        self.dispatch_plain(payload, listeners).await;

        if bot_user.is_some_and(|bot| message.mentions_user(bot)) {
            let listeners = gate(&mut roles, registry.listeners(TriggerKind::Mention)).await;
            self.dispatch_plain(payload, listeners).await;
        }
    }

    async fn run_command(
        &self,
        payload: &Arc<Payload>,
        roles: &mut CallerRoles<'_>,
        matched: CommandMatch<'_>,
    ) {
        let handler = matched.handler;
        debug!(command = matched.key, handler = handler.name(), "Command matched");
        if !roles.permits(handler).await {
            return;
        }

        let dispatcher = &self.inner.dispatcher;
        match bind_tokens(handler.params(), tokenize(matched.remainder)) {
            Ok(args) => {
                let calls = vec![Call::new(Arc::clone(handler), args)];
                dispatcher
                    .dispatch(payload, calls, ModePolicy::Declared, FailurePolicy::ReplyUsage)
                    .await;
            }
            Err(e) => {
                dispatcher
                    .report(handler, payload, &e, FailurePolicy::ReplyUsage)
                    .await
            }
        }
    }

    async fn on_component(
        &self,
        payload: &Arc<Payload>,
        event: &GatewayEvent,
        component: &ComponentInteraction,
    ) {
        let handlers = self
            .inner
            .registry
            .components(component.kind, &component.custom_id);
        if handlers.is_empty() {
            trace!(custom_id = %component.custom_id, "No handler for component");
            return;
        }
        self.run_listeners(payload, event, handlers).await;
    }

    async fn on_slash(
        &self,
        payload: &Arc<Payload>,
        event: &GatewayEvent,
        interaction: &SlashInteraction,
    ) {
        let handlers = self.inner.registry.slash_handlers(&interaction.name);
        if handlers.is_empty() {
            debug!(command = %interaction.name, "No handler for slash command");
            return;
        }

        if let Err(e) = self.inner.gateway.acknowledge(interaction.id).await {
            warn!(command = %interaction.name, error = %e, "Failed to acknowledge interaction");
        }

        let mut roles = CallerRoles::new(&self.inner.gateway, event);
        let mut calls = Vec::with_capacity(handlers.len());
        for handler in handlers {
            if roles.permits(handler).await {
                let args = slash::bind_options(handler, interaction);
                calls.push(Call::new(Arc::clone(handler), args));
            }
        }

        self.inner
            .dispatcher
            .dispatch(payload, calls, ModePolicy::Detached, FailurePolicy::LogOnly)
            .await;
    }

    async fn on_ready(&self, payload: &Arc<Payload>, event: &GatewayEvent, ready: &Ready) {
        *self.inner.bot_user.write() = Some(ready.user.id);
        if self.inner.scheduler.mark_ready() {
            info!(
                user = %ready.user.name,
                guilds = ready.guilds.len(),
                "Gateway ready, interval triggers armed"
            );
        }

        if self.inner.config.register_slash_commands {
            self.register_slash_commands(&ready.guilds).await;
        }

        let listeners = self.inner.registry.listeners(TriggerKind::Ready);
        self.run_listeners(payload, event, listeners).await;
    }

    async fn run_listeners(
        &self,
        payload: &Arc<Payload>,
        event: &GatewayEvent,
        handlers: &[Arc<HandlerDescriptor>],
    ) {
        if handlers.is_empty() {
            return;
        }
        let mut roles = CallerRoles::new(&self.inner.gateway, event);
        let allowed = gate(&mut roles, handlers).await;
        self.dispatch_plain(payload, allowed).await;
    }

    async fn dispatch_plain(&self, payload: &Arc<Payload>, handlers: Vec<Arc<HandlerDescriptor>>) {
        if handlers.is_empty() {
            return;
        }
        let calls = handlers
            .into_iter()
            .map(|handler| Call::new(handler, Args::new()))
            .collect();
        self.inner
            .dispatcher
            .dispatch(payload, calls, ModePolicy::Declared, FailurePolicy::LogOnly)
            .await;
    }
}

async fn gate(
    roles: &mut CallerRoles<'_>,
    handlers: &[Arc<HandlerDescriptor>],
) -> Vec<Arc<HandlerDescriptor>> {
    let mut allowed = Vec::with_capacity(handlers.len());
    for handler in handlers {
        if roles.permits(handler).await {
            allowed.push(Arc::clone(handler));
        }
    }
    allowed
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("handlers", &self.inner.registry.len())
            .field("ready", &self.inner.scheduler.is_ready())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl Service<GatewayEvent> for Engine {
    type Response = ();
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<(), Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, event: GatewayEvent) -> Self::Future {
        let engine = self.clone();
        Box::pin(async move {
            engine.handle(event).await;
            Ok(())
        })
    }
}

/// Builder for [`Engine`].
pub struct EngineBuilder {
    gateway: BoxedGateway,
    config: EngineConfig,
    registry: RegistryBuilder,
}

impl EngineBuilder {
    pub fn new(gateway: BoxedGateway) -> Self {
        Self {
            gateway,
            config: EngineConfig::default(),
            registry: RegistryBuilder::new(),
        }
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a feature object.
    pub fn add_feature<F: Feature>(&mut self, feature: Arc<F>) -> Result<(), RegistrationError> {
        self.registry.add_feature(feature)
    }

    /// Registers a feature object (builder pattern).
    pub fn feature<F: Feature>(mut self, feature: Arc<F>) -> Result<Self, RegistrationError> {
        self.add_feature(feature)?;
        Ok(self)
    }

    /// Builds the registry and the engine.
    pub fn build(self) -> Result<Engine, RegistrationError> {
        let registry = self.registry.build()?;
        Ok(Engine::new(registry, self.gateway, self.config))
    }
}
