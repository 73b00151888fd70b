//! The bot's features.

mod attendance;
mod greeter;
mod reminders;

pub use attendance::Attendance;
pub use greeter::Greeter;
pub use reminders::Reminders;

use muster::core::User;
use muster::framework::Invocation;

/// The user behind a message, button click or slash command.
fn caller(ctx: &Invocation) -> Option<&User> {
    ctx.message()
        .map(|msg| &msg.author)
        .or_else(|| ctx.slash().map(|slash| &slash.user))
        .or_else(|| ctx.component().map(|component| &component.user))
}
