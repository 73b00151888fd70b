//! Trigger kinds and declarations.

use std::fmt;
use std::time::Duration;

/// The kind of event a handler is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    Command,
    ButtonClick,
    SelectMenu,
    Message,
    Ready,
    Reaction,
    Mention,
    UserJoined,
    MemberUpdated,
    VoiceStateChange,
    Interval,
    SlashCommand,
}

impl TriggerKind {
    /// Stable lowercase name, used in logs and errors.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::ButtonClick => "button_click",
            Self::SelectMenu => "select_menu",
            Self::Message => "message",
            Self::Ready => "ready",
            Self::Reaction => "reaction",
            Self::Mention => "mention",
            Self::UserJoined => "user_joined",
            Self::MemberUpdated => "member_updated",
            Self::VoiceStateChange => "voice_state_change",
            Self::Interval => "interval",
            Self::SlashCommand => "slash_command",
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared trigger with its key, if the kind has one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// A text command prefix such as `!attendance`.
    Command(String),
    /// A button custom id.
    ButtonClick(String),
    /// A select-menu custom id.
    SelectMenu(String),
    Message,
    Ready,
    Reaction,
    Mention,
    UserJoined,
    MemberUpdated,
    VoiceStateChange,
    /// A recurring interval.
    Interval(Duration),
    /// A platform-native slash command.
    SlashCommand { name: String, description: String },
}

impl Trigger {
    /// Builds an interval trigger from minutes and seconds.
    ///
    /// Saturates at `u64::MAX` seconds.
    pub fn interval(minutes: u64, seconds: u64) -> Self {
        Self::Interval(Duration::from_secs(
            minutes.saturating_mul(60).saturating_add(seconds),
        ))
    }

    /// Returns the kind of this trigger.
    pub fn kind(&self) -> TriggerKind {
        match self {
            Self::Command(_) => TriggerKind::Command,
            Self::ButtonClick(_) => TriggerKind::ButtonClick,
            Self::SelectMenu(_) => TriggerKind::SelectMenu,
            Self::Message => TriggerKind::Message,
            Self::Ready => TriggerKind::Ready,
            Self::Reaction => TriggerKind::Reaction,
            Self::Mention => TriggerKind::Mention,
            Self::UserJoined => TriggerKind::UserJoined,
            Self::MemberUpdated => TriggerKind::MemberUpdated,
            Self::VoiceStateChange => TriggerKind::VoiceStateChange,
            Self::Interval(_) => TriggerKind::Interval,
            Self::SlashCommand { .. } => TriggerKind::SlashCommand,
        }
    }

    /// Returns the lookup key for keyed kinds.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Command(key) | Self::ButtonClick(key) | Self::SelectMenu(key) => Some(key),
            Self::SlashCommand { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interval(every) => write!(f, "interval({}s)", every.as_secs()),
            other => match other.key() {
                Some(key) => write!(f, "{}({key})", other.kind()),
                None => f.write_str(other.kind().as_str()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_from_minutes_and_seconds() {
        assert_eq!(
            Trigger::interval(2, 30),
            Trigger::Interval(Duration::from_secs(150))
        );
    }

    #[test]
    fn test_interval_saturates_instead_of_overflowing() {
        assert_eq!(
            Trigger::interval(u64::MAX, 30),
            Trigger::Interval(Duration::from_secs(u64::MAX))
        );
        assert_eq!(
            Trigger::interval(1, u64::MAX),
            Trigger::Interval(Duration::from_secs(u64::MAX))
        );
    }

    #[test]
    fn test_keys_and_display() {
        let slash = Trigger::SlashCommand {
            name: "roll".into(),
            description: "Roll dice".into(),
        };
        assert_eq!(slash.kind(), TriggerKind::SlashCommand);
        assert_eq!(slash.key(), Some("roll"));
        assert_eq!(Trigger::Mention.key(), None);
        assert_eq!(Trigger::Command("!bet".into()).to_string(), "command(!bet)");
        assert_eq!(Trigger::interval(1, 0).to_string(), "interval(60s)");
    }
}
