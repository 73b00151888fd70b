//! Parameter declarations.

use std::fmt;

use muster_core::{ChoiceValue, OptionChoice, OptionKind};

/// The semantic type of a declared parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    Text,
    Integer64,
    /// A 32-bit integer. Accepted for text commands; slash commands reject
    /// it at registration.
    Integer32,
    Number,
    Boolean,
    User,
    Channel,
    Role,
}

impl ParamType {
    /// Returns the slash-command option kind, or `None` when the type cannot
    /// be exposed as one.
    pub fn option_kind(self) -> Option<OptionKind> {
        match self {
            Self::Text => Some(OptionKind::String),
            Self::Integer64 => Some(OptionKind::Integer),
            Self::Number => Some(OptionKind::Number),
            Self::Boolean => Some(OptionKind::Boolean),
            Self::User => Some(OptionKind::User),
            Self::Channel => Some(OptionKind::Channel),
            Self::Role => Some(OptionKind::Role),
            Self::Integer32 => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer64 => "integer",
            Self::Integer32 => "32-bit integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::User => "user",
            Self::Channel => "channel",
            Self::Role => "role",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared handler parameter.
///
/// The invocation context is implicit and never declared; parameters
/// describe only the arguments that follow it.
///
/// ```rust,ignore
/// ParamSpec::integer("minutes");
/// ParamSpec::text("prize").argument(1);
/// ParamSpec::text("class")
///     .choice("Tank", "tank")
///     .choice("Healer", "healer")
///     .describe("The role you will play");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub ty: ParamType,
    pub optional: bool,
    pub choices: Vec<OptionChoice>,
    /// Explicit token index; the parameter takes every token from here on.
    pub argument_index: Option<usize>,
    pub description: Option<String>,
}

impl ParamSpec {
    /// Declares a required parameter.
    pub fn new(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
            choices: Vec::new(),
            argument_index: None,
            description: None,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Text)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Integer64)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Number)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Boolean)
    }

    pub fn user(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::User)
    }

    pub fn channel(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Channel)
    }

    pub fn role(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Role)
    }

    /// Marks the parameter as optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Binds the parameter to every token from `index` to the end.
    pub fn argument(mut self, index: usize) -> Self {
        self.argument_index = Some(index);
        self
    }

    /// Adds a predefined choice (slash commands).
    pub fn choice(mut self, name: impl Into<String>, value: impl Into<ChoiceValue>) -> Self {
        self.choices.push(OptionChoice {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Sets the description shown next to the option.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
