//! Test doubles shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use muster_core::{
    BoxedGateway, ChannelId, CommandSchema, ComponentInteraction, ComponentKind, Gateway,
    GatewayError, GatewayEvent, GatewayResult, GuildId, InteractionId, InteractionOption, Message,
    MessageId, OptionValue, Ready, Role, RoleId, SlashInteraction, User, UserId,
};
use parking_lot::Mutex;
use tokio::sync::{Notify, mpsc};

use crate::context::Invocation;
use crate::error::HandlerResult;
use crate::feature::{Feature, Registrar};

pub(crate) const GUILD: GuildId = GuildId(1);
pub(crate) const CHANNEL: ChannelId = ChannelId(10);

/// A gateway that records every call and answers from canned data.
#[derive(Default)]
pub(crate) struct RecordingGateway {
    sent: Mutex<Vec<(ChannelId, String)>>,
    responses: Mutex<Vec<(InteractionId, String)>>,
    acknowledged: Mutex<Vec<InteractionId>>,
    registered: Mutex<Vec<(GuildId, Vec<CommandSchema>)>>,
    roles: Mutex<HashMap<(GuildId, UserId), Vec<Role>>>,
    failing_guilds: Mutex<HashSet<GuildId>>,
    guilds: Mutex<Vec<GuildId>>,
    role_lookups: AtomicUsize,
}

impl RecordingGateway {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn boxed(self: &Arc<Self>) -> BoxedGateway {
        Arc::clone(self) as BoxedGateway
    }

    /// Gives `user` the named roles in the test guild.
    pub(crate) fn grant(&self, user: u64, roles: &[(u64, &str)]) {
        let roles = roles
            .iter()
            .map(|(id, name)| Role {
                id: RoleId(*id),
                name: name.to_string(),
            })
            .collect();
        self.roles.lock().insert((GUILD, UserId(user)), roles);
    }

    /// Makes every request against `guild` fail.
    pub(crate) fn fail_guild(&self, guild: GuildId) {
        self.failing_guilds.lock().insert(guild);
    }

    pub(crate) fn set_guilds(&self, guilds: &[GuildId]) {
        *self.guilds.lock() = guilds.to_vec();
    }

    pub(crate) fn sent(&self) -> Vec<(ChannelId, String)> {
        self.sent.lock().clone()
    }

    pub(crate) fn responses(&self) -> Vec<(InteractionId, String)> {
        self.responses.lock().clone()
    }

    pub(crate) fn acknowledged(&self) -> Vec<InteractionId> {
        self.acknowledged.lock().clone()
    }

    pub(crate) fn registered(&self) -> Vec<(GuildId, Vec<CommandSchema>)> {
        self.registered.lock().clone()
    }

    pub(crate) fn role_lookups(&self) -> usize {
        self.role_lookups.load(Ordering::SeqCst)
    }

    fn check(&self, guild: GuildId) -> GatewayResult<()> {
        if self.failing_guilds.lock().contains(&guild) {
            return Err(GatewayError::Rejected {
                status: 403,
                message: "missing access".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Gateway for RecordingGateway {
    async fn send_message(&self, channel: ChannelId, content: &str) -> GatewayResult<MessageId> {
        let mut sent = self.sent.lock();
        sent.push((channel, content.to_string()));
        Ok(MessageId(sent.len() as u64))
    }

    async fn prompt(
        &self,
        _channel: ChannelId,
        _user: UserId,
        _timeout: Duration,
    ) -> GatewayResult<Option<Message>> {
        Ok(None)
    }

    async fn guilds(&self) -> GatewayResult<Vec<GuildId>> {
        Ok(self.guilds.lock().clone())
    }

    async fn member_roles(&self, guild: GuildId, user: UserId) -> GatewayResult<Vec<Role>> {
        self.role_lookups.fetch_add(1, Ordering::SeqCst);
        self.check(guild)?;
        Ok(self
            .roles
            .lock()
            .get(&(guild, user))
            .cloned()
            .unwrap_or_default())
    }

    async fn register_commands(
        &self,
        guild: GuildId,
        commands: &[CommandSchema],
    ) -> GatewayResult<()> {
        self.check(guild)?;
        self.registered.lock().push((guild, commands.to_vec()));
        Ok(())
    }

    async fn acknowledge(&self, interaction: InteractionId) -> GatewayResult<()> {
        self.acknowledged.lock().push(interaction);
        Ok(())
    }

    async fn respond(&self, interaction: InteractionId, content: &str) -> GatewayResult<()> {
        self.responses.lock().push((interaction, content.to_string()));
        Ok(())
    }
}

/// A feature whose declarations come from a plain function, so each test
/// can register exactly the handlers it needs.
pub(crate) struct Scripted {
    setup: fn(&mut Registrar<Scripted>),
    log: mpsc::UnboundedSender<String>,
    pub(crate) release: Notify,
}

impl Scripted {
    pub(crate) fn new(
        setup: fn(&mut Registrar<Scripted>),
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
        let (log, rx) = mpsc::unbounded_channel();
        let feature = Arc::new(Self {
            setup,
            log,
            release: Notify::new(),
        });
        (feature, rx)
    }

    fn record(&self, ctx: &Invocation) {
        let args: Vec<String> = ctx
            .args()
            .iter()
            .map(|(_, value)| value.map(ToString::to_string).unwrap_or_else(|| "-".into()))
            .collect();
        let entry = if args.is_empty() {
            ctx.handler().name().to_string()
        } else {
            format!("{}:{}", ctx.handler().name(), args.join("|"))
        };
        let _ = self.log.send(entry);
    }

    /// Records its name and bound arguments.
    pub(crate) async fn echo(self: Arc<Self>, ctx: Invocation) -> HandlerResult {
        self.record(&ctx);
        Ok(())
    }

    pub(crate) async fn fail(self: Arc<Self>, _ctx: Invocation) -> HandlerResult {
        Err("boom".into())
    }

    pub(crate) async fn explode(self: Arc<Self>, _ctx: Invocation) -> HandlerResult {
        panic!("kaboom")
    }

    /// Blocks until `release` is notified, then records.
    pub(crate) async fn wait(self: Arc<Self>, ctx: Invocation) -> HandlerResult {
        self.release.notified().await;
        self.record(&ctx);
        Ok(())
    }

    /// Replies "pong" and records.
    pub(crate) async fn pong(self: Arc<Self>, ctx: Invocation) -> HandlerResult {
        ctx.reply("pong").await?;
        self.record(&ctx);
        Ok(())
    }
}

impl Feature for Scripted {
    fn register(registrar: &mut Registrar<Self>) {
        let setup = registrar.feature().setup;
        setup(registrar);
    }
}

/// Everything recorded so far, without waiting.
pub(crate) fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
    let mut entries = Vec::new();
    while let Ok(entry) = rx.try_recv() {
        entries.push(entry);
    }
    entries
}

pub(crate) fn user(id: u64) -> User {
    User {
        id: UserId(id),
        name: format!("user{id}"),
        bot: false,
    }
}

pub(crate) fn message(author: u64, content: &str) -> GatewayEvent {
    GatewayEvent::Message(Message {
        id: MessageId(100),
        guild_id: Some(GUILD),
        channel_id: CHANNEL,
        author: user(author),
        content: content.to_string(),
        mentions: Vec::new(),
    })
}

pub(crate) fn direct_message(author: u64, content: &str) -> GatewayEvent {
    let GatewayEvent::Message(mut msg) = message(author, content) else {
        unreachable!()
    };
    msg.guild_id = None;
    GatewayEvent::Message(msg)
}

pub(crate) fn button(user_id: u64, custom_id: &str) -> GatewayEvent {
    GatewayEvent::Component(ComponentInteraction {
        id: InteractionId(200),
        kind: ComponentKind::Button,
        custom_id: custom_id.to_string(),
        values: Vec::new(),
        message_id: Some(MessageId(100)),
        guild_id: Some(GUILD),
        channel_id: CHANNEL,
        user: user(user_id),
    })
}

pub(crate) fn ready(bot: u64, guilds: &[GuildId]) -> GatewayEvent {
    let mut account = user(bot);
    account.bot = true;
    GatewayEvent::Ready(Ready {
        user: account,
        guilds: guilds.to_vec(),
    })
}

pub(crate) fn slash(user_id: u64, name: &str, options: &[(&str, OptionValue)]) -> GatewayEvent {
    GatewayEvent::SlashCommand(SlashInteraction {
        id: InteractionId(300),
        name: name.to_string(),
        guild_id: Some(GUILD),
        channel_id: CHANNEL,
        user: user(user_id),
        options: options
            .iter()
            .map(|(name, value)| InteractionOption {
                name: name.to_string(),
                value: value.clone(),
            })
            .collect(),
    })
}
