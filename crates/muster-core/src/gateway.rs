//! The gateway contract.
//!
//! A [`Gateway`] is everything the engine needs from the chat platform:
//! posting messages, waiting for a user's reply, role lookups for the
//! authorization gate, and slash-command registration. Connection handling
//! and event decoding stay on the implementor's side.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::GatewayResult;
use crate::event::{Message, Role};
use crate::id::{ChannelId, GuildId, InteractionId, MessageId, UserId};
use crate::schema::CommandSchema;

/// Capabilities the engine consumes from a connected chat platform.
#[async_trait]
pub trait Gateway: Send + Sync + 'static {
    /// Posts `content` to `channel`, returning the new message id.
    async fn send_message(&self, channel: ChannelId, content: &str) -> GatewayResult<MessageId>;

    /// Waits for the next message `user` posts in `channel`.
    ///
    /// Returns `Ok(None)` when `timeout` elapses first; callers treat that as
    /// the user giving up.
    async fn prompt(
        &self,
        channel: ChannelId,
        user: UserId,
        timeout: Duration,
    ) -> GatewayResult<Option<Message>>;

    /// Lists the guilds the bot is connected to.
    async fn guilds(&self) -> GatewayResult<Vec<GuildId>>;

    /// Resolves the roles `user` holds in `guild`.
    async fn member_roles(&self, guild: GuildId, user: UserId) -> GatewayResult<Vec<Role>>;

    /// Replaces the slash commands registered in `guild`.
    async fn register_commands(
        &self,
        guild: GuildId,
        commands: &[CommandSchema],
    ) -> GatewayResult<()>;

    /// Acknowledges an interaction so the platform does not time it out.
    async fn acknowledge(&self, _interaction: InteractionId) -> GatewayResult<()> {
        Ok(())
    }

    /// Sends a response to an acknowledged interaction.
    async fn respond(&self, interaction: InteractionId, content: &str) -> GatewayResult<()>;
}

/// A shared gateway trait object.
pub type BoxedGateway = Arc<dyn Gateway>;
