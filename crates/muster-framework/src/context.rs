//! The invocation context handed to handlers.

use std::sync::Arc;
use std::time::Duration;

use muster_core::{
    BoxedGateway, ChannelId, ComponentInteraction, GatewayError, GatewayEvent, GatewayResult,
    GuildId, MemberJoin, MemberUpdate, Message, Reaction, Ready, SlashInteraction, UserId,
    VoiceStateUpdate,
};
use tokio::time::Instant;

use crate::args::Args;
use crate::descriptor::HandlerDescriptor;

/// What caused a dispatch.
#[derive(Debug, Clone)]
pub enum Payload {
    /// An event delivered by the gateway.
    Event(GatewayEvent),
    /// A scheduler tick, with the time it was taken.
    Tick(Instant),
}

/// Everything a handler receives for one invocation.
///
/// The payload is shared between all handlers dispatched for the same
/// event; the bound arguments belong to this handler alone.
#[derive(Clone)]
pub struct Invocation {
    payload: Arc<Payload>,
    args: Args,
    gateway: BoxedGateway,
    handler: Arc<HandlerDescriptor>,
}

impl Invocation {
    pub(crate) fn new(
        payload: Arc<Payload>,
        args: Args,
        gateway: BoxedGateway,
        handler: Arc<HandlerDescriptor>,
    ) -> Self {
        Self {
            payload,
            args,
            gateway,
            handler,
        }
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub(crate) fn shared_payload(&self) -> Arc<Payload> {
        Arc::clone(&self.payload)
    }

    /// The gateway event, unless this is a tick.
    pub fn event(&self) -> Option<&GatewayEvent> {
        match self.payload.as_ref() {
            Payload::Event(event) => Some(event),
            Payload::Tick(_) => None,
        }
    }

    /// The tick time, if this invocation came from the scheduler.
    pub fn tick(&self) -> Option<Instant> {
        match self.payload.as_ref() {
            Payload::Tick(at) => Some(*at),
            Payload::Event(_) => None,
        }
    }

    pub fn message(&self) -> Option<&Message> {
        match self.event()? {
            GatewayEvent::Message(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn component(&self) -> Option<&ComponentInteraction> {
        match self.event()? {
            GatewayEvent::Component(component) => Some(component),
            _ => None,
        }
    }

    pub fn slash(&self) -> Option<&SlashInteraction> {
        match self.event()? {
            GatewayEvent::SlashCommand(interaction) => Some(interaction),
            _ => None,
        }
    }

    pub fn reaction(&self) -> Option<&Reaction> {
        match self.event()? {
            GatewayEvent::Reaction(reaction) => Some(reaction),
            _ => None,
        }
    }

    pub fn member_join(&self) -> Option<&MemberJoin> {
        match self.event()? {
            GatewayEvent::MemberJoined(join) => Some(join),
            _ => None,
        }
    }

    pub fn member_update(&self) -> Option<&MemberUpdate> {
        match self.event()? {
            GatewayEvent::MemberUpdated(update) => Some(update),
            _ => None,
        }
    }

    pub fn voice_state(&self) -> Option<&VoiceStateUpdate> {
        match self.event()? {
            GatewayEvent::VoiceStateUpdated(state) => Some(state),
            _ => None,
        }
    }

    pub fn ready(&self) -> Option<&Ready> {
        match self.event()? {
            GatewayEvent::Ready(ready) => Some(ready),
            _ => None,
        }
    }

    /// Arguments bound to this handler's declared parameters.
    pub fn args(&self) -> &Args {
        &self.args
    }

    pub fn gateway(&self) -> &BoxedGateway {
        &self.gateway
    }

    /// The descriptor this invocation runs under.
    pub fn handler(&self) -> &HandlerDescriptor {
        &self.handler
    }

    pub fn caller(&self) -> Option<UserId> {
        self.event().and_then(GatewayEvent::caller)
    }

    pub fn guild_id(&self) -> Option<GuildId> {
        self.event().and_then(GatewayEvent::guild_id)
    }

    pub fn channel_id(&self) -> Option<ChannelId> {
        self.event().and_then(GatewayEvent::channel_id)
    }

    /// Replies to whatever triggered this invocation.
    ///
    /// Slash interactions get an interaction response; everything else with
    /// a channel gets a message in that channel.
    pub async fn reply(&self, content: &str) -> GatewayResult<()> {
        if let Some(interaction) = self.slash() {
            return self.gateway.respond(interaction.id, content).await;
        }
        let channel = self
            .channel_id()
            .ok_or_else(|| GatewayError::other("event has no channel to reply to"))?;
        self.gateway.send_message(channel, content).await?;
        Ok(())
    }

    /// Asks the caller a question and waits for their next message.
    ///
    /// `Ok(None)` means the caller did not answer within `timeout`.
    pub async fn prompt(&self, question: &str, timeout: Duration) -> GatewayResult<Option<Message>> {
        let (Some(channel), Some(user)) = (self.channel_id(), self.caller()) else {
            return Err(GatewayError::other("event has no caller to prompt"));
        };
        self.reply(question).await?;
        self.gateway.prompt(channel, user, timeout).await
    }
}

impl std::fmt::Debug for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invocation")
            .field("payload", &self.payload)
            .field("args", &self.args)
            .field("handler", &self.handler.name())
            .finish_non_exhaustive()
    }
}
