//! Command resolution.

use std::sync::Arc;

use crate::descriptor::HandlerDescriptor;
use crate::registry::TriggerRegistry;

/// The outcome of resolving a text command.
#[derive(Debug, Clone, Copy)]
pub struct CommandMatch<'a> {
    /// The registered key that matched.
    pub key: &'a str,
    /// The first handler registered under that key.
    pub handler: &'a Arc<HandlerDescriptor>,
    /// The text after the key, leading whitespace removed.
    pub remainder: &'a str,
}

/// Strips `prefix` from `text`, ignoring case.
///
/// Characters are compared one to one by their lowercase mapping, so `Ä`
/// matches `ä`. Folds that change the character count (`ß` to `ss`) do not
/// match.
pub fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let mut chars = text.char_indices();
    for expected in prefix.chars() {
        let (_, actual) = chars.next()?;
        if actual != expected && !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
    }
    let end = chars.next().map_or(text.len(), |(index, _)| index);
    Some(&text[end..])
}

/// Compares two command keys, ignoring case the way resolution does.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    strip_prefix_ignore_case(a, b).is_some_and(str::is_empty)
}

impl TriggerRegistry {
    /// Resolves a message to a command handler.
    ///
    /// The longest registered key that prefixes `text` (ignoring case) wins,
    /// so `!attendance update` beats `!attendance`. Among handlers sharing the
    /// winning key the first registered is chosen.
    pub fn resolve_command<'a>(&'a self, text: &'a str) -> Option<CommandMatch<'a>> {
        let (entry, rest) = self
            .commands
            .iter()
            .filter_map(|entry| strip_prefix_ignore_case(text, &entry.key).map(|rest| (entry, rest)))
            .max_by_key(|(entry, _)| entry.key.len())?;

        let handler = entry.handlers.first()?;
        Some(CommandMatch {
            key: &entry.key,
            handler,
            remainder: rest.trim_start(),
        })
    }
}
