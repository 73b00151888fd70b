//! `!remind <minutes> <text>`, delivered by the scheduler.

use std::sync::Arc;
use std::time::Duration;

use muster::core::{ChannelId, UserId};
use muster::framework::{Feature, HandlerResult, Invocation, ParamSpec, Registrar};
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::caller;

/// Longest reminder accepted, one week.
const MAX_MINUTES: i64 = 7 * 24 * 60;

#[derive(Debug, Clone, PartialEq)]
struct Reminder {
    due: Instant,
    channel: ChannelId,
    user: UserId,
    text: String,
}

/// Pending reminders, checked on every scheduler pass.
#[derive(Debug, Default)]
pub struct Reminders {
    pending: Mutex<Vec<Reminder>>,
}

impl Reminders {
    /// Removes and returns the reminders due at `now`, oldest first.
    fn take_due(&self, now: Instant) -> Vec<Reminder> {
        let mut pending = self.pending.lock();
        let (mut due, rest): (Vec<_>, Vec<_>) = pending.drain(..).partition(|r| r.due <= now);
        *pending = rest;
        due.sort_by_key(|r| r.due);
        due
    }

    async fn remind(self: Arc<Self>, ctx: Invocation) -> HandlerResult {
        let minutes = ctx.args().integer("minutes")?;
        let text = ctx.args().text("text")?;
        if !(1..=MAX_MINUTES).contains(&minutes) {
            ctx.reply(&format!("Pick between 1 and {MAX_MINUTES} minutes."))
                .await?;
            return Ok(());
        }

        let user = caller(&ctx).ok_or("remind needs a caller")?.id;
        let channel = ctx.channel_id().ok_or("remind needs a channel")?;
        self.pending.lock().push(Reminder {
            due: Instant::now() + Duration::from_secs(minutes.unsigned_abs() * 60),
            channel,
            user,
            text: text.to_string(),
        });
        ctx.reply(&format!("I'll remind you in {minutes} min."))
            .await?;
        Ok(())
    }

    async fn deliver(self: Arc<Self>, ctx: Invocation) -> HandlerResult {
        let now = ctx.tick().unwrap_or_else(Instant::now);
        let due = self.take_due(now);
        if !due.is_empty() {
            debug!(count = due.len(), "Delivering reminders");
        }
        for reminder in due {
            let content = format!("{} reminder: {}", reminder.user.mention(), reminder.text);
            if let Err(e) = ctx.gateway().send_message(reminder.channel, &content).await {
                warn!(error = %e, user = %reminder.user, "Failed to deliver reminder");
            }
        }
        Ok(())
    }
}

impl Feature for Reminders {
    fn register(r: &mut Registrar<Self>) {
        r.handler("remind", Self::remind)
            .command("!remind")
            .param(ParamSpec::integer("minutes"))
            .param(ParamSpec::text("text").argument(1))
            .usage("!remind <minutes> <text>")
            .description("Ping you after a delay");

        r.handler("deliver", Self::deliver)
            .every(0, 15)
            .fire_and_forget();
    }
}
