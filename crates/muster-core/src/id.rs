//! Snowflake-style identifiers used throughout the event model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Returns the raw numeric value.
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Identifies a user account.
    UserId
);
define_id!(
    /// Identifies a text or voice channel.
    ChannelId
);
define_id!(
    /// Identifies a guild (community server).
    GuildId
);
define_id!(
    /// Identifies a role inside a guild.
    RoleId
);
define_id!(
    /// Identifies a posted message.
    MessageId
);
define_id!(
    /// Identifies a structured interaction awaiting acknowledgement.
    InteractionId
);

/// Strips `<{sigil}...>` mention wrapping and parses the id inside.
///
/// A bare numeric id is accepted as well.
fn parse_wrapped(input: &str, sigils: &[&str]) -> Option<u64> {
    let input = input.trim();
    if let Some(inner) = input.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
        return sigils
            .iter()
            .find_map(|sigil| inner.strip_prefix(sigil))
            .and_then(|digits| digits.parse().ok());
    }
    input.parse().ok()
}

impl UserId {
    /// Parses `<@id>`, `<@!id>` or a bare id.
    pub fn from_mention(input: &str) -> Option<Self> {
        // `<@!` must be tried before `<@`, and `<@&` is a role mention.
        if input.trim_start().starts_with("<@&") {
            return None;
        }
        parse_wrapped(input, &["@!", "@"]).map(Self)
    }

    /// Formats this id as a user mention.
    pub fn mention(self) -> String {
        format!("<@{}>", self.0)
    }
}

impl ChannelId {
    /// Parses `<#id>` or a bare id.
    pub fn from_mention(input: &str) -> Option<Self> {
        parse_wrapped(input, &["#"]).map(Self)
    }

    /// Formats this id as a channel mention.
    pub fn mention(self) -> String {
        format!("<#{}>", self.0)
    }
}

impl RoleId {
    /// Parses `<@&id>` or a bare id.
    pub fn from_mention(input: &str) -> Option<Self> {
        parse_wrapped(input, &["@&"]).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_mention_forms() {
        assert_eq!(UserId::from_mention("<@42>"), Some(UserId(42)));
        assert_eq!(UserId::from_mention("<@!42>"), Some(UserId(42)));
        assert_eq!(UserId::from_mention("42"), Some(UserId(42)));
        assert_eq!(UserId::from_mention("<@&42>"), None);
        assert_eq!(UserId::from_mention("someone"), None);
    }

    #[test]
    fn test_channel_and_role_mentions() {
        assert_eq!(ChannelId::from_mention("<#7>"), Some(ChannelId(7)));
        assert_eq!(ChannelId::from_mention("<@7>"), None);
        assert_eq!(RoleId::from_mention("<@&9>"), Some(RoleId(9)));
        assert_eq!(RoleId::from_mention("9"), Some(RoleId(9)));
    }

    #[test]
    fn test_display_and_mention() {
        assert_eq!(UserId(5).to_string(), "5");
        assert_eq!(UserId(5).mention(), "<@5>");
        assert_eq!(ChannelId(6).mention(), "<#6>");
    }
}
