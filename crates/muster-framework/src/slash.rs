//! Slash-command schemas and interaction binding.

use std::collections::HashSet;

use muster_core::{
    BoxedGateway, CommandOption, CommandSchema, GuildId, OptionValue, SlashInteraction,
};
use tracing::{info, warn};

use crate::args::Args;
use crate::descriptor::HandlerDescriptor;
use crate::error::RegistrationError;
use crate::trigger::Trigger;

/// Builds the schema of one slash-command descriptor.
///
/// Returns `None` for descriptors of other kinds.
pub fn schema_for(
    descriptor: &HandlerDescriptor,
) -> Option<Result<CommandSchema, RegistrationError>> {
    let Trigger::SlashCommand { name, description } = descriptor.trigger() else {
        return None;
    };

    let options = descriptor
        .params()
        .iter()
        .map(|spec| {
            let kind = spec.ty.option_kind().ok_or_else(|| {
                RegistrationError::UnsupportedParameterType {
                    owner: descriptor.owner(),
                    handler: descriptor.name().to_string(),
                    command: name.clone(),
                    parameter: spec.name.clone(),
                    ty: spec.ty,
                }
            })?;
            Ok(CommandOption {
                name: spec.name.clone(),
                description: spec.description.clone().unwrap_or_else(|| spec.name.clone()),
                kind,
                required: !spec.optional,
                choices: spec.choices.clone(),
            })
        })
        .collect::<Result<Vec<_>, RegistrationError>>();

    Some(options.map(|options| CommandSchema {
        name: name.clone(),
        description: description.clone(),
        options,
    }))
}

/// Builds one schema per distinct slash-command name, in registration order.
///
/// When several handlers share a name, the first one defines the schema.
pub fn build_schemas<'a>(
    descriptors: impl IntoIterator<Item = &'a HandlerDescriptor>,
) -> Result<Vec<CommandSchema>, RegistrationError> {
    let mut seen = HashSet::new();
    let mut schemas = Vec::new();

    for descriptor in descriptors {
        let Some(schema) = schema_for(descriptor) else {
            continue;
        };
        let schema = schema?;
        if seen.insert(schema.name.clone()) {
            schemas.push(schema);
        }
    }

    Ok(schemas)
}

/// Binds the interaction's options to the handler's parameters.
///
/// Options are matched by case-insensitive name; parameters without a
/// supplied option are absent.
pub fn bind_options(descriptor: &HandlerDescriptor, interaction: &SlashInteraction) -> Args {
    let values = descriptor
        .params()
        .iter()
        .map(|spec| {
            let value: Option<OptionValue> = interaction.option(&spec.name).cloned();
            (spec.name.clone(), value)
        })
        .collect();
    Args::from_values(values)
}

/// Registers `schemas` with every guild in `guilds`.
///
/// A failure in one guild is logged and does not stop the others. Returns the
/// number of guilds that accepted the registration.
pub async fn register_commands(
    gateway: &BoxedGateway,
    guilds: &[GuildId],
    schemas: &[CommandSchema],
) -> usize {
    if schemas.is_empty() {
        return 0;
    }

    let mut registered = 0;
    for guild in guilds {
        match gateway.register_commands(*guild, schemas).await {
            Ok(()) => {
                registered += 1;
                info!(%guild, commands = schemas.len(), "Slash commands registered");
            }
            Err(e) => warn!(%guild, error = %e, "Failed to register slash commands"),
        }
    }
    registered
}

#[cfg(test)]
mod tests {
    use muster_core::{ChoiceValue, GatewayEvent, OptionKind};

    use super::*;
    use crate::feature::Registrar;
    use crate::param::ParamSpec;
    use crate::registry::TriggerRegistry;
    use crate::testing::{RecordingGateway, Scripted, slash};

    fn registry(setup: fn(&mut Registrar<Scripted>)) -> TriggerRegistry {
        let (feature, _rx) = Scripted::new(setup);
        TriggerRegistry::builder()
            .feature(feature)
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_schema_options_follow_params() {
        let registry = registry(|r| {
            r.handler("signup", Scripted::echo)
                .slash("signup", "Sign up for the raid")
                .param(
                    ParamSpec::text("class")
                        .choice("Tank", "tank")
                        .choice("Healer", "healer")
                        .describe("Your role"),
                )
                .param(ParamSpec::user("for").optional())
                .param(ParamSpec::number("gear"));
        });

        let schema = &registry.slash_schemas()[0];
        assert_eq!(schema.description, "Sign up for the raid");

        let kinds: Vec<_> = schema.options.iter().map(|o| o.kind).collect();
        assert_eq!(kinds, [OptionKind::String, OptionKind::User, OptionKind::Number]);

        let class = &schema.options[0];
        assert_eq!(class.description, "Your role");
        assert_eq!(class.choices.len(), 2);
        assert_eq!(class.choices[1].value, ChoiceValue::Text("healer".into()));

        // Descriptions default to the parameter name.
        assert_eq!(schema.options[1].description, "for");
        assert!(!schema.options[1].required);
        assert!(schema.options[2].required);
    }

    #[test]
    fn test_first_handler_defines_shared_schema() {
        let registry = registry(|r| {
            r.handler("a", Scripted::echo)
                .slash("roll", "First")
                .param(ParamSpec::integer("sides"));
            r.handler("b", Scripted::echo).slash("roll", "Second");
            r.handler("c", Scripted::echo).slash("flip", "Flip a coin");
        });

        let schemas = registry.slash_schemas();
        assert_eq!(schemas.len(), 2);
        assert_eq!(schemas[0].description, "First");
        assert_eq!(schemas[0].options.len(), 1);
        assert_eq!(schemas[1].name, "flip");
        assert_eq!(registry.slash_handlers("roll").len(), 2);
    }

    #[test]
    fn test_bind_options_matches_names_ignoring_case() {
        let registry = registry(|r| {
            r.handler("give", Scripted::echo)
                .slash("give", "Give gold")
                .param(ParamSpec::user("target"))
                .param(ParamSpec::integer("amount").optional());
        });
        let handler = &registry.slash_handlers("give")[0];

        let GatewayEvent::SlashCommand(interaction) = slash(
            7,
            "give",
            &[
                ("Target", OptionValue::User(muster_core::UserId(8))),
                ("unknown", OptionValue::Boolean(true)),
            ],
        ) else {
            unreachable!()
        };

        let args = bind_options(handler, &interaction);
        assert_eq!(args.len(), 2);
        assert_eq!(args.user("target").unwrap(), muster_core::UserId(8));
        assert_eq!(args.opt_integer("amount").unwrap(), None);
    }

    #[tokio::test]
    async fn test_register_commands_continues_past_failures() {
        let gateway = RecordingGateway::new();
        gateway.fail_guild(GuildId(1));
        let registry = registry(|r| {
            r.handler("roll", Scripted::echo).slash("roll", "Roll");
        });

        let accepted = register_commands(
            &gateway.boxed(),
            &[GuildId(1), GuildId(2)],
            registry.slash_schemas(),
        )
        .await;
        assert_eq!(accepted, 1);
        assert_eq!(gateway.registered()[0].0, GuildId(2));

        // Nothing to register means no requests.
        assert_eq!(register_commands(&gateway.boxed(), &[GuildId(3)], &[]).await, 0);
        assert_eq!(gateway.registered().len(), 1);
    }
}
