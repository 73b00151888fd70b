//! # Muster Core
//!
//! Platform-neutral building blocks shared by the Muster crates:
//!
//! - [`GatewayEvent`] and its payloads, the events a chat gateway delivers
//! - [`Gateway`], the capabilities the engine consumes from the platform
//! - [`CommandSchema`], the slash-command definitions handed to the gateway
//! - Snowflake-style identifiers such as [`UserId`] and [`GuildId`]

pub mod error;
pub mod event;
pub mod gateway;
pub mod id;
pub mod schema;

pub use error::{GatewayError, GatewayResult};
pub use event::{
    ComponentInteraction, ComponentKind, EventStream, GatewayEvent, InteractionOption,
    MemberJoin, MemberUpdate, Message, OptionValue, Reaction, Ready, Role, SlashInteraction,
    User, VoiceStateUpdate,
};
pub use gateway::{BoxedGateway, Gateway};
pub use id::{ChannelId, GuildId, InteractionId, MessageId, RoleId, UserId};
pub use schema::{ChoiceValue, CommandOption, CommandSchema, OptionChoice, OptionKind};
