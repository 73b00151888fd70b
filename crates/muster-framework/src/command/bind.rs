//! Binding command tokens to declared parameters.

use muster_core::{ChannelId, OptionValue, RoleId, UserId};

use crate::args::Args;
use crate::error::BindError;
use crate::param::{ParamSpec, ParamType};

/// Binds `tokens` to `params` and converts each value to its declared type.
///
/// Parameters without an explicit index take the token at their own
/// declaration position. Parameters with an explicit index are processed
/// from the highest index down: each takes every remaining token from its
/// index on, joined with single spaces, and the pool shrinks to the tokens
/// before that index. Tokens left unclaimed are ignored.
pub fn bind_tokens(params: &[ParamSpec], tokens: Vec<String>) -> Result<Args, BindError> {
    let mut raw: Vec<Option<String>> = vec![None; params.len()];
    let mut pool = tokens;

    let mut explicit: Vec<(usize, usize)> = params
        .iter()
        .enumerate()
        .filter_map(|(slot, spec)| spec.argument_index.map(|index| (slot, index)))
        .collect();
    explicit.sort_by(|a, b| b.1.cmp(&a.1));

    for (slot, index) in explicit {
        if index < pool.len() {
            raw[slot] = Some(pool[index..].join(" "));
            pool.truncate(index);
        }
    }

    for (slot, spec) in params.iter().enumerate() {
        if spec.argument_index.is_none() {
            raw[slot] = pool.get(slot).cloned();
        }
    }

    let values = params
        .iter()
        .zip(raw)
        .map(|(spec, token)| {
            let value = match token {
                Some(token) => Some(convert(spec, token)?),
                None if spec.optional => None,
                None => {
                    return Err(BindError::MissingArgument {
                        name: spec.name.clone(),
                    });
                }
            };
            Ok((spec.name.clone(), value))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Args::from_values(values))
}

fn convert(spec: &ParamSpec, token: String) -> Result<OptionValue, BindError> {
    let value = match spec.ty {
        ParamType::Text => return Ok(OptionValue::Text(token)),
        ParamType::Integer64 => token.parse().ok().map(OptionValue::Integer),
        ParamType::Integer32 => token
            .parse::<i32>()
            .ok()
            .map(|v| OptionValue::Integer(i64::from(v))),
        ParamType::Number => token
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(OptionValue::Number),
        ParamType::Boolean => parse_bool(&token).map(OptionValue::Boolean),
        ParamType::User => UserId::from_mention(&token).map(OptionValue::User),
        ParamType::Channel => ChannelId::from_mention(&token).map(OptionValue::Channel),
        ParamType::Role => RoleId::from_mention(&token).map(OptionValue::Role),
    };

    value.ok_or(BindError::InvalidValue {
        name: spec.name.clone(),
        expected: spec.ty,
        value: token,
    })
}

fn parse_bool(token: &str) -> Option<bool> {
    match token.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_positional_binding() {
        let params = [ParamSpec::integer("amount"), ParamSpec::user("target")];
        let args = bind_tokens(&params, tokens(&["250", "<@!99>"])).unwrap();
        assert_eq!(args.integer("amount"), Ok(250));
        assert_eq!(args.user("target"), Ok(UserId(99)));
    }

    #[test]
    fn test_slurp_rest_binding() {
        let params = [ParamSpec::text("first"), ParamSpec::text("tail").argument(1)];
        let args = bind_tokens(&params, tokens(&["a", "b", "c"])).unwrap();
        assert_eq!(args.text("first"), Ok("a"));
        assert_eq!(args.text("tail"), Ok("b c"));
    }

    #[test]
    fn test_multiple_explicit_bindings_descend() {
        let params = [
            ParamSpec::integer("minutes").argument(0),
            ParamSpec::text("title").argument(1),
        ];
        let args = bind_tokens(&params, tokens(&["15", "Mythic", "raid", "night"])).unwrap();
        // Index 1 takes everything from 1 on, index 0 what is left before it.
        assert_eq!(args.text("title"), Ok("Mythic raid night"));
        assert_eq!(args.integer("minutes"), Ok(15));
    }

    #[test]
    fn test_explicit_index_past_end_is_absent() {
        let params = [
            ParamSpec::text("first"),
            ParamSpec::text("tail").argument(3).optional(),
        ];
        let args = bind_tokens(&params, tokens(&["a", "b"])).unwrap();
        assert_eq!(args.text("first"), Ok("a"));
        assert_eq!(args.opt_text("tail"), Ok(None));
    }

    #[test]
    fn test_extra_tokens_are_ignored() {
        let params = [ParamSpec::text("only")];
        let args = bind_tokens(&params, tokens(&["x", "y"])).unwrap();
        assert_eq!(args.text("only"), Ok("x"));
    }

    #[test]
    fn test_missing_required_argument() {
        let params = [ParamSpec::text("name"), ParamSpec::integer("count")];
        let err = bind_tokens(&params, tokens(&["bob"])).unwrap_err();
        assert_eq!(
            err,
            BindError::MissingArgument {
                name: "count".into()
            }
        );
    }

    #[test]
    fn test_optional_argument_may_be_absent() {
        let params = [ParamSpec::integer("count").optional()];
        let args = bind_tokens(&params, Vec::new()).unwrap();
        assert_eq!(args.opt_integer("count"), Ok(None));
    }

    #[test]
    fn test_invalid_values() {
        let params = [ParamSpec::integer("bet")];
        let err = bind_tokens(&params, tokens(&["lots"])).unwrap_err();
        assert!(matches!(err, BindError::InvalidValue { ref name, .. } if name == "bet"));

        let narrow = [ParamSpec::new("small", ParamType::Integer32)];
        assert!(bind_tokens(&narrow, tokens(&["4294967296"])).is_err());
        assert!(bind_tokens(&narrow, tokens(&["-12"])).is_ok());
    }

    #[test]
    fn test_boolean_and_mentions() {
        let params = [
            ParamSpec::boolean("public"),
            ParamSpec::channel("where"),
            ParamSpec::role("who"),
        ];
        let args = bind_tokens(&params, tokens(&["YES", "<#12>", "<@&34>"])).unwrap();
        assert_eq!(args.boolean("public"), Ok(true));
        assert_eq!(args.channel("where"), Ok(ChannelId(12)));
        assert_eq!(args.role("who"), Ok(RoleId(34)));
    }
}
