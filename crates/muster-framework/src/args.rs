//! Bound handler arguments.

use muster_core::{ChannelId, OptionValue, RoleId, UserId};

use crate::error::ArgError;

/// Argument values bound to a handler's declared parameters, in
/// declaration order.
///
/// Text commands and slash interactions both produce `Args`; handlers read
/// them through the typed accessors:
///
/// ```rust,ignore
/// let minutes = ctx.args().integer("minutes")?;
/// let prize = ctx.args().text("prize")?;
/// let target = ctx.args().opt_user("target")?;
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    values: Vec<(String, Option<OptionValue>)>,
}

macro_rules! copy_accessors {
    ($($req:ident, $opt:ident, $variant:ident => $ty:ty, $label:literal;)*) => {
        $(
            #[doc = concat!("Reads an optional ", $label, " argument.")]
            pub fn $opt(&self, name: &str) -> Result<Option<$ty>, ArgError> {
                match self.slot(name)? {
                    None => Ok(None),
                    Some(OptionValue::$variant(value)) => Ok(Some(*value)),
                    Some(other) => Err(ArgError::WrongType {
                        name: name.to_string(),
                        requested: $label,
                        actual: other.type_name(),
                    }),
                }
            }

            #[doc = concat!("Reads a required ", $label, " argument.")]
            pub fn $req(&self, name: &str) -> Result<$ty, ArgError> {
                self.$opt(name)?
                    .ok_or_else(|| ArgError::Missing(name.to_string()))
            }
        )*
    };
}

impl Args {
    /// Creates an empty argument set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an argument set from `(name, value)` pairs.
    pub fn from_values(values: Vec<(String, Option<OptionValue>)>) -> Self {
        Self { values }
    }

    /// Number of declared parameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates `(name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&OptionValue>)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_ref()))
    }

    /// Returns the raw value of `name`, if declared and supplied.
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.slot(name).ok().flatten()
    }

    fn slot(&self, name: &str) -> Result<Option<&OptionValue>, ArgError> {
        self.values
            .iter()
            .find(|(declared, _)| declared == name)
            .map(|(_, value)| value.as_ref())
            .ok_or_else(|| ArgError::Unknown(name.to_string()))
    }

    /// Reads an optional text argument.
    pub fn opt_text(&self, name: &str) -> Result<Option<&str>, ArgError> {
        match self.slot(name)? {
            None => Ok(None),
            Some(OptionValue::Text(value)) => Ok(Some(value)),
            Some(other) => Err(ArgError::WrongType {
                name: name.to_string(),
                requested: "text",
                actual: other.type_name(),
            }),
        }
    }

    /// Reads a required text argument.
    pub fn text(&self, name: &str) -> Result<&str, ArgError> {
        self.opt_text(name)?
            .ok_or_else(|| ArgError::Missing(name.to_string()))
    }

    /// Reads an optional number argument. Integers widen to `f64`.
    pub fn opt_number(&self, name: &str) -> Result<Option<f64>, ArgError> {
        match self.slot(name)? {
            None => Ok(None),
            Some(OptionValue::Number(value)) => Ok(Some(*value)),
            Some(OptionValue::Integer(value)) => Ok(Some(*value as f64)),
            Some(other) => Err(ArgError::WrongType {
                name: name.to_string(),
                requested: "number",
                actual: other.type_name(),
            }),
        }
    }

    /// Reads a required number argument.
    pub fn number(&self, name: &str) -> Result<f64, ArgError> {
        self.opt_number(name)?
            .ok_or_else(|| ArgError::Missing(name.to_string()))
    }

    copy_accessors! {
        integer, opt_integer, Integer => i64, "integer";
        boolean, opt_boolean, Boolean => bool, "boolean";
        user, opt_user, User => UserId, "user";
        channel, opt_channel, Channel => ChannelId, "channel";
        role, opt_role, Role => RoleId, "role";
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Args {
        Args::from_values(vec![
            ("amount".into(), Some(OptionValue::Integer(50))),
            ("target".into(), Some(OptionValue::User(UserId(7)))),
            ("note".into(), None),
        ])
    }

    #[test]
    fn test_typed_reads() {
        let args = sample();
        assert_eq!(args.integer("amount"), Ok(50));
        assert_eq!(args.number("amount"), Ok(50.0));
        assert_eq!(args.user("target"), Ok(UserId(7)));
        assert_eq!(args.opt_text("note"), Ok(None));
    }

    #[test]
    fn test_read_errors() {
        let args = sample();
        assert_eq!(args.text("note"), Err(ArgError::Missing("note".into())));
        assert_eq!(args.text("nope"), Err(ArgError::Unknown("nope".into())));
        assert!(matches!(
            args.boolean("amount"),
            Err(ArgError::WrongType {
                requested: "boolean",
                actual: "integer",
                ..
            })
        ));
    }
}
