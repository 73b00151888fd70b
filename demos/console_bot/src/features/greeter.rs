//! Welcomes new members and answers `!help`.

use std::sync::{Arc, OnceLock};

use muster::core::ChannelId;
use muster::framework::{CommandHelp, Feature, HandlerResult, Invocation, Registrar};
use tracing::info;

pub struct Greeter {
    welcome_channel: ChannelId,
    help: OnceLock<Vec<CommandHelp>>,
}

impl Greeter {
    pub fn new(welcome_channel: ChannelId) -> Self {
        Self {
            welcome_channel,
            help: OnceLock::new(),
        }
    }

    /// Sets the command list `!help` prints. Only the first call counts.
    pub fn set_help(&self, help: Vec<CommandHelp>) {
        let _ = self.help.set(help);
    }

    pub fn help_text(&self) -> String {
        let Some(help) = self.help.get().filter(|help| !help.is_empty()) else {
            return "No commands available.".to_string();
        };
        let lines: Vec<String> = help
            .iter()
            .map(|entry| {
                let usage = entry.usage.as_deref().unwrap_or(&entry.key);
                match &entry.description {
                    Some(description) => format!("{usage}  - {description}"),
                    None => usage.to_string(),
                }
            })
            .collect();
        format!("Commands:\n{}", lines.join("\n"))
    }

    async fn help(self: Arc<Self>, ctx: Invocation) -> HandlerResult {
        ctx.reply(&self.help_text()).await?;
        Ok(())
    }

    async fn welcome(self: Arc<Self>, ctx: Invocation) -> HandlerResult {
        let join = ctx.member_join().ok_or("welcome expects a member join")?;
        let content = format!(
            "Welcome, {}! Type `!attendance` to see the raid roster.",
            join.user.id.mention()
        );
        ctx.gateway()
            .send_message(self.welcome_channel, &content)
            .await?;
        Ok(())
    }

    async fn mentioned(self: Arc<Self>, ctx: Invocation) -> HandlerResult {
        ctx.reply("Hi! Type `!help` to see what I can do.").await?;
        Ok(())
    }

    async fn ready(self: Arc<Self>, ctx: Invocation) -> HandlerResult {
        if let Some(ready) = ctx.ready() {
            info!(user = %ready.user.name, guilds = ready.guilds.len(), "Connected");
        }
        Ok(())
    }
}

impl Feature for Greeter {
    fn register(r: &mut Registrar<Self>) {
        r.handler("help", Self::help)
            .command("!help")
            .description("List commands");
        r.handler("welcome", Self::welcome).on_user_joined();
        r.handler("mentioned", Self::mentioned).on_mention();
        r.handler("ready", Self::ready).on_ready();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_text_prefers_usage() {
        let greeter = Greeter::new(ChannelId(1));
        assert_eq!(greeter.help_text(), "No commands available.");

        greeter.set_help(vec![
            CommandHelp {
                key: "!remind".into(),
                usage: Some("!remind <minutes> <text>".into()),
                description: Some("Ping you after a delay".into()),
            },
            CommandHelp {
                key: "!help".into(),
                usage: None,
                description: None,
            },
        ]);
        assert_eq!(
            greeter.help_text(),
            "Commands:\n!remind <minutes> <text>  - Ping you after a delay\n!help"
        );
    }
}
