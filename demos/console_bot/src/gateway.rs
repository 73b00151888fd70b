//! A gateway over the terminal.
//!
//! Every line typed on stdin becomes a message from the local user in a
//! single guild channel. A few line shapes produce other events:
//!
//! ```text
//! /attendance class=tank     slash command with options
//! [attendance-healer]        button click
//! +ana                       a new member joins the guild
//! ```
//!
//! Everything the bot sends is printed to stdout.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use muster::core::{
    ChannelId, CommandSchema, ComponentInteraction, ComponentKind, Gateway, GatewayError,
    GatewayEvent, GatewayResult, GuildId, InteractionId, InteractionOption, MemberJoin, Message,
    MessageId, OptionValue, Ready, Role, RoleId, SlashInteraction, User, UserId,
};
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// The only guild the console knows.
pub const GUILD: GuildId = GuildId(1);
/// The only channel the console knows.
pub const CHANNEL: ChannelId = ChannelId(100);

const BOT_ID: UserId = UserId(999);
const FIRST_ROLE_ID: u64 = 500;

struct PendingPrompt {
    channel: ChannelId,
    user: UserId,
    reply: oneshot::Sender<Message>,
}

/// Terminal-backed [`Gateway`].
pub struct ConsoleGateway {
    me: User,
    roles: Vec<Role>,
    next_id: AtomicU64,
    pending: Mutex<Vec<PendingPrompt>>,
}

impl ConsoleGateway {
    /// Creates a console where `me` types and holds the named roles.
    pub fn new(me: User, role_names: &[String]) -> Self {
        let roles = role_names
            .iter()
            .zip(FIRST_ROLE_ID..)
            .map(|(name, id)| Role {
                id: RoleId(id),
                name: name.clone(),
            })
            .collect();
        Self {
            me,
            roles,
            next_id: AtomicU64::new(1000),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// The account the bot itself uses.
    pub fn bot_user() -> User {
        User {
            id: BOT_ID,
            name: "muster".into(),
            bot: true,
        }
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Feeds stdin into `events` until EOF, starting with a ready event.
    pub async fn pump(self: Arc<Self>, events: mpsc::Sender<GatewayEvent>) {
        let ready = GatewayEvent::Ready(Ready {
            user: Self::bot_user(),
            guilds: vec![GUILD],
        });
        if events.send(ready).await.is_err() {
            return;
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Failed to read from stdin");
                    break;
                }
            };

            let event = match self.parse_line(line.trim()) {
                Some(GatewayEvent::Message(msg)) => match self.answer_prompt(msg) {
                    Some(msg) => GatewayEvent::Message(msg),
                    None => continue,
                },
                Some(event) => event,
                None => continue,
            };
            if events.send(event).await.is_err() {
                break;
            }
        }
        debug!("Console input closed");
    }

    /// Turns one input line into an event.
    fn parse_line(&self, line: &str) -> Option<GatewayEvent> {
        if line.is_empty() {
            return None;
        }

        if let Some(rest) = line.strip_prefix('/') {
            let mut parts = rest.split_whitespace();
            let name = parts.next()?.to_string();
            let options = parts
                .filter_map(|part| part.split_once('='))
                .map(|(key, raw)| InteractionOption {
                    name: key.to_string(),
                    value: parse_option_value(raw),
                })
                .collect();
            return Some(GatewayEvent::SlashCommand(SlashInteraction {
                id: InteractionId(self.next_id()),
                name,
                guild_id: Some(GUILD),
                channel_id: CHANNEL,
                user: self.me.clone(),
                options,
            }));
        }

        if let Some(custom_id) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            return Some(GatewayEvent::Component(ComponentInteraction {
                id: InteractionId(self.next_id()),
                kind: ComponentKind::Button,
                custom_id: custom_id.trim().to_string(),
                values: Vec::new(),
                message_id: None,
                guild_id: Some(GUILD),
                channel_id: CHANNEL,
                user: self.me.clone(),
            }));
        }

        if let Some(name) = line.strip_prefix('+') {
            return Some(GatewayEvent::MemberJoined(MemberJoin {
                guild_id: GUILD,
                user: User {
                    id: UserId(self.next_id()),
                    name: name.trim().to_string(),
                    bot: false,
                },
            }));
        }

        let mentions = line
            .split_whitespace()
            .filter(|token| token.starts_with("<@"))
            .filter_map(UserId::from_mention)
            .collect();
        Some(GatewayEvent::Message(Message {
            id: MessageId(self.next_id()),
            guild_id: Some(GUILD),
            channel_id: CHANNEL,
            author: self.me.clone(),
            content: line.to_string(),
            mentions,
        }))
    }

    /// Hands `msg` to a prompt waiting on its author, or gives it back.
    fn answer_prompt(&self, msg: Message) -> Option<Message> {
        let mut pending = self.pending.lock();
        pending.retain(|p| !p.reply.is_closed());
        let Some(index) = pending
            .iter()
            .position(|p| p.channel == msg.channel_id && p.user == msg.author.id)
        else {
            return Some(msg);
        };
        pending.remove(index).reply.send(msg).err()
    }
}

fn parse_option_value(raw: &str) -> OptionValue {
    if let Ok(value) = raw.parse::<i64>() {
        return OptionValue::Integer(value);
    }
    if let Ok(value) = raw.parse::<bool>() {
        return OptionValue::Boolean(value);
    }
    if raw.starts_with("<@")
        && let Some(user) = UserId::from_mention(raw)
    {
        return OptionValue::User(user);
    }
    OptionValue::Text(raw.to_string())
}

#[async_trait]
impl Gateway for ConsoleGateway {
    async fn send_message(&self, channel: ChannelId, content: &str) -> GatewayResult<MessageId> {
        if channel != CHANNEL {
            return Err(GatewayError::other(format!("unknown channel {channel}")));
        }
        println!("muster> {content}");
        Ok(MessageId(self.next_id()))
    }

    async fn prompt(
        &self,
        channel: ChannelId,
        user: UserId,
        timeout: Duration,
    ) -> GatewayResult<Option<Message>> {
        let (reply, answer) = oneshot::channel();
        self.pending.lock().push(PendingPrompt {
            channel,
            user,
            reply,
        });

        match tokio::time::timeout(timeout, answer).await {
            Ok(Ok(msg)) => Ok(Some(msg)),
            Ok(Err(_)) => Err(GatewayError::NotConnected),
            Err(_) => Ok(None),
        }
    }

    async fn guilds(&self) -> GatewayResult<Vec<GuildId>> {
        Ok(vec![GUILD])
    }

    async fn member_roles(&self, guild: GuildId, user: UserId) -> GatewayResult<Vec<Role>> {
        if guild != GUILD {
            return Err(GatewayError::UnknownGuild(guild));
        }
        if user == self.me.id {
            Ok(self.roles.clone())
        } else {
            Ok(Vec::new())
        }
    }

    async fn register_commands(
        &self,
        guild: GuildId,
        commands: &[CommandSchema],
    ) -> GatewayResult<()> {
        if guild != GUILD {
            return Err(GatewayError::UnknownGuild(guild));
        }
        let names: Vec<&str> = commands.iter().map(|c| c.name.as_str()).collect();
        info!(%guild, commands = ?names, "Console accepted slash commands");
        Ok(())
    }

    async fn acknowledge(&self, interaction: InteractionId) -> GatewayResult<()> {
        debug!(%interaction, "Interaction acknowledged");
        Ok(())
    }

    async fn respond(&self, _interaction: InteractionId, content: &str) -> GatewayResult<()> {
        println!("muster (reply)> {content}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn console() -> ConsoleGateway {
        let me = User {
            id: UserId(1),
            name: "ana".into(),
            bot: false,
        };
        ConsoleGateway::new(me, &["Officer".to_string()])
    }

    #[test]
    fn test_plain_line_is_a_message_with_mentions() {
        let gateway = console();
        let Some(GatewayEvent::Message(msg)) = gateway.parse_line("hey <@999> !remind 5 x") else {
            panic!("expected a message");
        };
        assert_eq!(msg.mentions, vec![BOT_ID]);
        assert_eq!(msg.guild_id, Some(GUILD));
        assert_eq!(msg.author.name, "ana");
    }

    #[test]
    fn test_slash_line_parses_typed_options() {
        let gateway = console();
        let Some(GatewayEvent::SlashCommand(slash)) =
            gateway.parse_line("/roll sides=20 loud=true label=big")
        else {
            panic!("expected a slash command");
        };
        assert_eq!(slash.name, "roll");
        assert_eq!(slash.option("sides"), Some(&OptionValue::Integer(20)));
        assert_eq!(slash.option("loud"), Some(&OptionValue::Boolean(true)));
        assert_eq!(slash.option("label"), Some(&OptionValue::Text("big".into())));
    }

    #[test]
    fn test_button_and_join_lines() {
        let gateway = console();
        let Some(GatewayEvent::Component(click)) = gateway.parse_line("[attendance-dps]") else {
            panic!("expected a button click");
        };
        assert_eq!(click.custom_id, "attendance-dps");

        let Some(GatewayEvent::MemberJoined(join)) = gateway.parse_line("+bo") else {
            panic!("expected a member join");
        };
        assert_eq!(join.user.name, "bo");
        assert!(gateway.parse_line("").is_none());
    }

    #[tokio::test]
    async fn test_prompt_takes_the_next_line() {
        let gateway = Arc::new(console());

        let waiter = {
            let gateway = Arc::clone(&gateway);
            tokio::spawn(async move {
                gateway
                    .prompt(CHANNEL, UserId(1), Duration::from_secs(5))
                    .await
            })
        };
        while gateway.pending.lock().is_empty() {
            tokio::task::yield_now().await;
        }

        let Some(GatewayEvent::Message(msg)) = gateway.parse_line("yes") else {
            panic!("expected a message");
        };
        assert!(gateway.answer_prompt(msg).is_none());

        let answer = waiter.await.unwrap().unwrap();
        assert_eq!(answer.map(|m| m.content), Some("yes".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_prompt_times_out() {
        let gateway = console();
        let answer = gateway
            .prompt(CHANNEL, UserId(1), Duration::from_secs(30))
            .await
            .unwrap();
        assert!(answer.is_none());

        let Some(GatewayEvent::Message(msg)) = gateway.parse_line("late") else {
            panic!("expected a message");
        };
        assert!(gateway.answer_prompt(msg).is_some());
    }

    #[tokio::test]
    async fn test_roles_belong_to_the_local_user() {
        let gateway = console();
        let roles = gateway.member_roles(GUILD, UserId(1)).await.unwrap();
        assert_eq!(roles[0].name, "Officer");
        assert!(gateway.member_roles(GUILD, UserId(2)).await.unwrap().is_empty());
        assert!(gateway.member_roles(GuildId(7), UserId(1)).await.is_err());
    }
}
