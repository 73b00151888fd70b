//! Raid roster: members sign up by class, officers manage it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use muster::core::{User, UserId};
use muster::framework::{Feature, HandlerResult, Invocation, ParamSpec, Registrar};
use parking_lot::Mutex;
use tracing::info;

use super::caller;

const CONFIRM_TIMEOUT: Duration = Duration::from_secs(30);
const BUTTON_PREFIX: &str = "attendance-";

/// The part a member plays in the raid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Class {
    Tank,
    Healer,
    Dps,
}

impl Class {
    pub const ALL: [Class; 3] = [Self::Tank, Self::Healer, Self::Dps];

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "tank" => Some(Self::Tank),
            "healer" | "heal" => Some(Self::Healer),
            "dps" => Some(Self::Dps),
            _ => None,
        }
    }

    fn from_button(custom_id: &str) -> Option<Self> {
        custom_id.strip_prefix(BUTTON_PREFIX).and_then(Self::parse)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tank => "tank",
            Self::Healer => "healer",
            Self::Dps => "dps",
        }
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
struct Signup {
    name: String,
    class: Class,
}

/// The raid roster and the officers' note.
#[derive(Debug, Default)]
pub struct Attendance {
    roster: Mutex<BTreeMap<UserId, Signup>>,
    note: Mutex<Option<String>>,
}

impl Attendance {
    /// Signs `user` up, replacing any earlier class.
    pub fn sign_up(&self, user: &User, class: Class) {
        self.roster.lock().insert(
            user.id,
            Signup {
                name: user.name.clone(),
                class,
            },
        );
    }

    pub fn class_of(&self, user: UserId) -> Option<Class> {
        self.roster.lock().get(&user).map(|signup| signup.class)
    }

    pub fn note(&self) -> Option<String> {
        self.note.lock().clone()
    }

    /// Renders the roster grouped by class.
    pub fn roster_text(&self) -> String {
        let roster = self.roster.lock();
        let mut text = match self.note().as_deref() {
            Some(note) => format!("Raid: {note}\n"),
            None => String::new(),
        };
        if roster.is_empty() {
            text.push_str("No one has signed up yet.");
            return text;
        }

        let lines: Vec<String> = Class::ALL
            .iter()
            .map(|class| {
                let names: Vec<&str> = roster
                    .values()
                    .filter(|signup| signup.class == *class)
                    .map(|signup| signup.name.as_str())
                    .collect();
                format!("{class} ({}): {}", names.len(), names.join(", "))
            })
            .collect();
        text.push_str(&lines.join("\n"));
        text
    }

    async fn show(self: Arc<Self>, ctx: Invocation) -> HandlerResult {
        if let Some(requested) = ctx.args().opt_text("class")? {
            let Some(class) = Class::parse(requested) else {
                ctx.reply(&format!(
                    "Unknown class '{requested}'. Pick tank, healer or dps."
                ))
                .await?;
                return Ok(());
            };
            let user = caller(&ctx).ok_or("attendance needs a caller")?;
            self.sign_up(user, class);
        }

        let mut text = self.roster_text();
        if let Some(class) = caller(&ctx).and_then(|user| self.class_of(user.id)) {
            text.push_str(&format!("\nYou are signed up as {class}."));
        }
        ctx.reply(&text).await?;
        Ok(())
    }

    async fn join(self: Arc<Self>, ctx: Invocation) -> HandlerResult {
        let click = ctx.component().ok_or("join expects a button click")?;
        let class = Class::from_button(&click.custom_id)
            .ok_or_else(|| format!("unknown signup button '{}'", click.custom_id))?;
        self.sign_up(&click.user, class);
        ctx.reply(&format!("{} joined as {class}.", click.user.name))
            .await?;
        Ok(())
    }

    async fn update(self: Arc<Self>, ctx: Invocation) -> HandlerResult {
        let note = ctx.args().text("note")?;
        *self.note.lock() = Some(note.to_string());
        info!(note, "Raid note updated");
        ctx.reply("Raid note updated.").await?;
        Ok(())
    }

    async fn clear(self: Arc<Self>, ctx: Invocation) -> HandlerResult {
        let answer = ctx
            .prompt(
                "Clear the whole roster? Type `yes` to confirm.",
                CONFIRM_TIMEOUT,
            )
            .await?;

        let reply = match answer {
            Some(msg) if msg.content.trim().eq_ignore_ascii_case("yes") => {
                let removed = {
                    let mut roster = self.roster.lock();
                    let removed = roster.len();
                    roster.clear();
                    removed
                };
                format!("Roster cleared, {removed} signups removed.")
            }
            Some(_) => "Roster left as is.".to_string(),
            None => "No answer, roster left as is.".to_string(),
        };
        ctx.reply(&reply).await?;
        Ok(())
    }
}

impl Feature for Attendance {
    fn register(r: &mut Registrar<Self>) {
        r.handler("show", Self::show)
            .command("!attendance")
            .slash("attendance", "Show the raid roster or sign up")
            .param(
                ParamSpec::text("class")
                    .optional()
                    .choice("Tank", "tank")
                    .choice("Healer", "healer")
                    .choice("DPS", "dps")
                    .describe("Sign up as this class"),
            )
            .usage("!attendance [tank|healer|dps]")
            .description("Show the roster, or sign up");

        r.handler("update", Self::update)
            .command("!attendance update")
            .param(ParamSpec::text("note").argument(0))
            .require_role("Officer")
            .usage("!attendance update <note>")
            .description("Set the raid note");

        r.handler("clear", Self::clear)
            .command("!attendance clear")
            .require_role("Officer")
            .description("Empty the roster");

        let join = r.handler("join", Self::join);
        for class in Class::ALL {
            join.button(format!("{BUTTON_PREFIX}{class}"));
        }
    }
}
