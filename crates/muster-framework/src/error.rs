//! Error types for the Muster framework.

use thiserror::Error;

use crate::param::ParamType;

/// A boxed error returned by handlers.
///
/// Handlers may fail with any error type; `?` converts into this.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// The result every handler returns.
pub type HandlerResult = Result<(), HandlerError>;

/// Raised while building the trigger registry. Always fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A slash-command parameter has a type the platform cannot express.
    #[error(
        "slash command '{command}' ({owner}::{handler}): parameter '{parameter}' has unsupported type {ty}"
    )]
    UnsupportedParameterType {
        owner: &'static str,
        handler: String,
        command: String,
        parameter: String,
        ty: ParamType,
    },

    /// A handler was declared without any trigger.
    #[error("handler {owner}::{handler} declares no trigger")]
    NoTriggers { owner: &'static str, handler: String },

    /// A command text, component id or slash name is empty.
    #[error("handler {owner}::{handler} declares an empty {kind} key")]
    EmptyKey {
        owner: &'static str,
        handler: String,
        kind: &'static str,
    },

    /// An interval trigger of zero length.
    #[error("handler {owner}::{handler} declares a zero-length interval")]
    ZeroInterval { owner: &'static str, handler: String },

    /// Two parameters are bound to the same token index.
    #[error("handler {owner}::{handler}: parameters '{first}' and '{second}' share argument index {index}")]
    InvalidArgumentBinding {
        owner: &'static str,
        handler: String,
        first: String,
        second: String,
        index: usize,
    },
}

/// Raised while binding command tokens to declared parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// A required parameter received no token.
    #[error("missing argument '{name}'")]
    MissingArgument { name: String },

    /// A token could not be converted to the parameter's type.
    #[error("argument '{name}': expected {expected}, got '{value}'")]
    InvalidValue {
        name: String,
        expected: ParamType,
        value: String,
    },
}

/// Raised when a handler reads a bound argument with the wrong accessor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgError {
    /// No parameter with that name was declared.
    #[error("no parameter named '{0}'")]
    Unknown(String),

    /// The parameter is required but absent (optional parameters read as `None`).
    #[error("argument '{0}' was not supplied")]
    Missing(String),

    /// The value has a different type than requested.
    #[error("argument '{name}' is {actual}, not {requested}")]
    WrongType {
        name: String,
        requested: &'static str,
        actual: &'static str,
    },
}
