//! Gateway event payloads.
//!
//! These are the platform-neutral shapes a gateway client produces. The
//! engine never talks to the wire; an adapter decodes whatever the platform
//! sends into a [`GatewayEvent`] and feeds it in.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::{ChannelId, GuildId, InteractionId, MessageId, RoleId, UserId};

/// A user account as seen in an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Whether the account is an automated one.
    #[serde(default)]
    pub bot: bool,
}

/// A guild role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
}

/// A message posted in a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    /// `None` for direct messages.
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    pub author: User,
    pub content: String,
    /// Users mentioned in the message body.
    #[serde(default)]
    pub mentions: Vec<UserId>,
}

impl Message {
    /// Returns `true` if `user` is mentioned in this message.
    pub fn mentions_user(&self, user: UserId) -> bool {
        self.mentions.contains(&user)
    }
}

/// Which kind of message component was used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Button,
    SelectMenu,
}

/// A click on a button or a pick from a select menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentInteraction {
    pub id: InteractionId,
    pub kind: ComponentKind,
    /// The developer-defined component id.
    pub custom_id: String,
    /// Selected values (select menus only).
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub message_id: Option<MessageId>,
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    pub user: User,
}

/// A reaction added to or removed from a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub message_id: MessageId,
    pub channel_id: ChannelId,
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    pub user_id: UserId,
    pub emoji: String,
    /// `false` when the reaction was removed.
    pub added: bool,
}

/// A user joined a guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberJoin {
    pub guild_id: GuildId,
    pub user: User,
}

/// A guild member's roles or nickname changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberUpdate {
    pub guild_id: GuildId,
    pub user: User,
    pub roles: Vec<RoleId>,
    #[serde(default)]
    pub nickname: Option<String>,
}

/// A user joined, left or moved between voice channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceStateUpdate {
    pub guild_id: GuildId,
    pub user_id: UserId,
    /// `None` when the user left voice.
    #[serde(default)]
    pub channel_id: Option<ChannelId>,
    #[serde(default)]
    pub previous_channel_id: Option<ChannelId>,
}

/// The gateway session is established.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ready {
    /// The bot's own account.
    pub user: User,
    /// Guilds the bot is connected to.
    #[serde(default)]
    pub guilds: Vec<GuildId>,
}

/// A typed option value supplied with a slash interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum OptionValue {
    Text(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    User(UserId),
    Channel(ChannelId),
    Role(RoleId),
}

impl OptionValue {
    /// Short name of the carried type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Number(_) => "number",
            Self::Boolean(_) => "boolean",
            Self::User(_) => "user",
            Self::Channel(_) => "channel",
            Self::Role(_) => "role",
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(v) => f.write_str(v),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Number(v) => write!(f, "{v}"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::User(v) => f.write_str(&v.mention()),
            Self::Channel(v) => f.write_str(&v.mention()),
            Self::Role(v) => write!(f, "<@&{v}>"),
        }
    }
}

/// One named option of a slash interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionOption {
    pub name: String,
    pub value: OptionValue,
}

/// A platform-native slash command invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlashInteraction {
    pub id: InteractionId,
    /// The invoked command name, without the leading slash.
    pub name: String,
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    pub user: User,
    #[serde(default)]
    pub options: Vec<InteractionOption>,
}

impl SlashInteraction {
    /// Finds a supplied option by case-insensitive name.
    pub fn option(&self, name: &str) -> Option<&OptionValue> {
        self.options
            .iter()
            .find(|opt| opt.name.eq_ignore_ascii_case(name))
            .map(|opt| &opt.value)
    }
}

/// The independent streams events are serviced on.
///
/// Events of one stream are handled one after another; different streams
/// run concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventStream {
    Messages,
    Components,
    Reactions,
    Interactions,
    Members,
    Lifecycle,
}

impl EventStream {
    /// All streams, in a fixed order.
    pub const ALL: [EventStream; 6] = [
        Self::Messages,
        Self::Components,
        Self::Reactions,
        Self::Interactions,
        Self::Members,
        Self::Lifecycle,
    ];
}

/// Every event a gateway client can deliver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayEvent {
    Message(Message),
    Component(ComponentInteraction),
    Reaction(Reaction),
    MemberJoined(MemberJoin),
    MemberUpdated(MemberUpdate),
    VoiceStateUpdated(VoiceStateUpdate),
    Ready(Ready),
    SlashCommand(SlashInteraction),
}

impl GatewayEvent {
    /// A short, stable name for logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::Component(c) => match c.kind {
                ComponentKind::Button => "button_click",
                ComponentKind::SelectMenu => "select_menu",
            },
            Self::Reaction(r) if r.added => "reaction_added",
            Self::Reaction(_) => "reaction_removed",
            Self::MemberJoined(_) => "member_joined",
            Self::MemberUpdated(_) => "member_updated",
            Self::VoiceStateUpdated(_) => "voice_state_updated",
            Self::Ready(_) => "ready",
            Self::SlashCommand(_) => "slash_command",
        }
    }

    /// The stream this event is serviced on.
    pub fn stream(&self) -> EventStream {
        match self {
            Self::Message(_) => EventStream::Messages,
            Self::Component(_) => EventStream::Components,
            Self::Reaction(_) => EventStream::Reactions,
            Self::SlashCommand(_) => EventStream::Interactions,
            Self::MemberJoined(_) | Self::MemberUpdated(_) | Self::VoiceStateUpdated(_) => {
                EventStream::Members
            }
            Self::Ready(_) => EventStream::Lifecycle,
        }
    }

    /// The guild the event happened in, if any.
    pub fn guild_id(&self) -> Option<GuildId> {
        match self {
            Self::Message(m) => m.guild_id,
            Self::Component(c) => c.guild_id,
            Self::Reaction(r) => r.guild_id,
            Self::MemberJoined(j) => Some(j.guild_id),
            Self::MemberUpdated(u) => Some(u.guild_id),
            Self::VoiceStateUpdated(v) => Some(v.guild_id),
            Self::Ready(_) => None,
            Self::SlashCommand(s) => s.guild_id,
        }
    }

    /// The channel replies to this event should go to, if any.
    pub fn channel_id(&self) -> Option<ChannelId> {
        match self {
            Self::Message(m) => Some(m.channel_id),
            Self::Component(c) => Some(c.channel_id),
            Self::Reaction(r) => Some(r.channel_id),
            Self::VoiceStateUpdated(v) => v.channel_id,
            Self::SlashCommand(s) => Some(s.channel_id),
            Self::MemberJoined(_) | Self::MemberUpdated(_) | Self::Ready(_) => None,
        }
    }

    /// The user whose action caused the event, if any.
    pub fn caller(&self) -> Option<UserId> {
        match self {
            Self::Message(m) => Some(m.author.id),
            Self::Component(c) => Some(c.user.id),
            Self::Reaction(r) => Some(r.user_id),
            Self::MemberJoined(j) => Some(j.user.id),
            Self::MemberUpdated(u) => Some(u.user.id),
            Self::VoiceStateUpdated(v) => Some(v.user_id),
            Self::SlashCommand(s) => Some(s.user.id),
            Self::Ready(_) => None,
        }
    }
}
