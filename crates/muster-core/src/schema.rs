//! Slash-command schemas handed to the gateway for registration.

use serde::{Deserialize, Serialize};

/// The platform option type a parameter is exposed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    String,
    Integer,
    Number,
    Boolean,
    User,
    Channel,
    Role,
}

/// A predefined choice value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChoiceValue {
    Integer(i64),
    Number(f64),
    Text(String),
}

impl From<&str> for ChoiceValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ChoiceValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for ChoiceValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for ChoiceValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// One entry of an option's choice list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionChoice {
    pub name: String,
    pub value: ChoiceValue,
}

/// One option of a slash command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOption {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: OptionKind,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<OptionChoice>,
}

/// A complete slash-command definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSchema {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub options: Vec<CommandOption>,
}

impl CommandSchema {
    /// Serializes the schema to a JSON value.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_json_shape() {
        let schema = CommandSchema {
            name: "coinflip".into(),
            description: "Flip a coin".into(),
            options: vec![CommandOption {
                name: "call".into(),
                description: "heads or tails".into(),
                kind: OptionKind::String,
                required: true,
                choices: vec![
                    OptionChoice {
                        name: "Heads".into(),
                        value: "heads".into(),
                    },
                    OptionChoice {
                        name: "Tails".into(),
                        value: "tails".into(),
                    },
                ],
            }],
        };

        let json = schema.to_json().unwrap();
        assert_eq!(json["options"][0]["type"], "string");
        assert_eq!(json["options"][0]["required"], true);
        assert_eq!(json["options"][0]["choices"][1]["value"], "tails");
    }

    #[test]
    fn test_empty_choices_are_omitted() {
        let option = CommandOption {
            name: "amount".into(),
            description: "amount".into(),
            kind: OptionKind::Integer,
            required: false,
            choices: Vec::new(),
        };
        let json = serde_json::to_value(&option).unwrap();
        assert!(json.get("choices").is_none());
    }
}
