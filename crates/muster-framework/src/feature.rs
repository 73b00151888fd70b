//! Declaring handlers on feature objects.
//!
//! A feature is a plain struct holding its own state. It lists its handlers
//! once, in [`Feature::register`], and the registry turns every declaration
//! into descriptors:
//!
//! ```rust,ignore
//! struct Giveaway { entrants: Mutex<Vec<UserId>> }
//!
//! impl Feature for Giveaway {
//!     fn register(r: &mut Registrar<Self>) {
//!         r.handler("start", Self::start)
//!             .command("!giveaway start")
//!             .param(ParamSpec::integer("minutes"))
//!             .param(ParamSpec::text("prize").argument(1))
//!             .require_role("Officer")
//!             .usage("!giveaway start <minutes> <prize>");
//!
//!         r.handler("join", Self::join).button("giveaway-join");
//!         r.handler("draw", Self::draw).every(1, 0).fire_and_forget();
//!     }
//! }
//! ```

use std::any::type_name;
use std::collections::HashMap;
use std::sync::Arc;

use muster_core::RoleId;

use crate::auth::RoleRequirement;
use crate::descriptor::{ExecutionMode, HandlerDescriptor, HandlerId};
use crate::error::RegistrationError;
use crate::handler::{BoxedHandler, Handler, bind_handler};
use crate::param::ParamSpec;
use crate::trigger::Trigger;

/// A feature object whose handlers are registered with the engine.
pub trait Feature: Send + Sync + Sized + 'static {
    /// Declares this feature's handlers.
    fn register(registrar: &mut Registrar<Self>);
}

/// Collects handler declarations for one feature instance.
pub struct Registrar<F> {
    owner: Arc<F>,
    drafts: Vec<HandlerDraft>,
}

impl<F: Feature> Registrar<F> {
    pub(crate) fn new(owner: Arc<F>) -> Self {
        Self {
            owner,
            drafts: Vec::new(),
        }
    }

    /// The feature instance being registered.
    ///
    /// Lets a feature derive its declarations from its own state, such as a
    /// configurable command prefix.
    pub fn feature(&self) -> &F {
        &self.owner
    }

    /// Declares a handler and returns its draft for further configuration.
    pub fn handler<H>(&mut self, name: impl Into<String>, handler: H) -> &mut HandlerDraft
    where
        H: Handler<F>,
    {
        let bound = bind_handler(Arc::clone(&self.owner), handler);
        let index = self.drafts.len();
        self.drafts
            .push(HandlerDraft::new(type_name::<F>(), name.into(), bound));
        &mut self.drafts[index]
    }

    pub(crate) fn into_drafts(self) -> Vec<HandlerDraft> {
        self.drafts
    }
}

/// A handler declaration under construction.
pub struct HandlerDraft {
    owner: &'static str,
    name: String,
    handler: BoxedHandler,
    triggers: Vec<Trigger>,
    params: Vec<ParamSpec>,
    mode: ExecutionMode,
    required_roles: Vec<RoleRequirement>,
    usage: Option<String>,
    description: Option<String>,
}

impl HandlerDraft {
    fn new(owner: &'static str, name: String, handler: BoxedHandler) -> Self {
        Self {
            owner,
            name,
            handler,
            triggers: Vec::new(),
            params: Vec::new(),
            mode: ExecutionMode::Sync,
            required_roles: Vec::new(),
            usage: None,
            description: None,
        }
    }

    /// Adds any trigger.
    pub fn trigger(&mut self, trigger: Trigger) -> &mut Self {
        self.triggers.push(trigger);
        self
    }

    /// Runs on messages starting with `text`.
    ///
    /// Matching ignores case character by character, non-ASCII letters
    /// included.
    pub fn command(&mut self, text: impl Into<String>) -> &mut Self {
        self.trigger(Trigger::Command(text.into()))
    }

    /// Runs when the button with this custom id is clicked.
    pub fn button(&mut self, id: impl Into<String>) -> &mut Self {
        self.trigger(Trigger::ButtonClick(id.into()))
    }

    /// Runs when the select menu with this custom id is used.
    pub fn select_menu(&mut self, id: impl Into<String>) -> &mut Self {
        self.trigger(Trigger::SelectMenu(id.into()))
    }

    /// Runs on every message.
    pub fn on_message(&mut self) -> &mut Self {
        self.trigger(Trigger::Message)
    }

    /// Runs when the gateway session becomes ready.
    pub fn on_ready(&mut self) -> &mut Self {
        self.trigger(Trigger::Ready)
    }

    /// Runs when a reaction is added or removed.
    pub fn on_reaction(&mut self) -> &mut Self {
        self.trigger(Trigger::Reaction)
    }

    /// Runs on messages that mention the bot.
    pub fn on_mention(&mut self) -> &mut Self {
        self.trigger(Trigger::Mention)
    }

    pub fn on_user_joined(&mut self) -> &mut Self {
        self.trigger(Trigger::UserJoined)
    }

    pub fn on_member_updated(&mut self) -> &mut Self {
        self.trigger(Trigger::MemberUpdated)
    }

    pub fn on_voice_state(&mut self) -> &mut Self {
        self.trigger(Trigger::VoiceStateChange)
    }

    /// Runs on the scheduler every `minutes:seconds`.
    pub fn every(&mut self, minutes: u64, seconds: u64) -> &mut Self {
        self.trigger(Trigger::interval(minutes, seconds))
    }

    /// Exposes the handler as a platform slash command.
    pub fn slash(&mut self, name: impl Into<String>, description: impl Into<String>) -> &mut Self {
        self.trigger(Trigger::SlashCommand {
            name: name.into(),
            description: description.into(),
        })
    }

    /// Declares the next parameter.
    pub fn param(&mut self, spec: ParamSpec) -> &mut Self {
        self.params.push(spec);
        self
    }

    /// Requires the caller to hold a role with this exact name.
    pub fn require_role(&mut self, name: impl Into<String>) -> &mut Self {
        self.required_roles.push(RoleRequirement::Name(name.into()));
        self
    }

    /// Requires the caller to hold the role with this id.
    pub fn require_role_id(&mut self, id: impl Into<RoleId>) -> &mut Self {
        self.required_roles.push(RoleRequirement::Id(id.into()));
        self
    }

    /// Detaches the handler instead of awaiting it.
    pub fn fire_and_forget(&mut self) -> &mut Self {
        self.mode = ExecutionMode::FireAndForget;
        self
    }

    /// Usage hint replied when the text command fails.
    pub fn usage(&mut self, text: impl Into<String>) -> &mut Self {
        self.usage = Some(text.into());
        self
    }

    pub fn description(&mut self, text: impl Into<String>) -> &mut Self {
        self.description = Some(text.into());
        self
    }

    fn validate(&self) -> Result<(), RegistrationError> {
        if self.triggers.is_empty() {
            return Err(RegistrationError::NoTriggers {
                owner: self.owner,
                handler: self.name.clone(),
            });
        }

        for trigger in &self.triggers {
            if trigger.key().is_some_and(|key| key.trim().is_empty()) {
                return Err(RegistrationError::EmptyKey {
                    owner: self.owner,
                    handler: self.name.clone(),
                    kind: trigger.kind().as_str(),
                });
            }
            if matches!(trigger, Trigger::Interval(every) if every.is_zero()) {
                return Err(RegistrationError::ZeroInterval {
                    owner: self.owner,
                    handler: self.name.clone(),
                });
            }
            if let Trigger::SlashCommand { name, .. } = trigger
                && let Some(spec) = self
                    .params
                    .iter()
                    .find(|spec| spec.ty.option_kind().is_none())
            {
                return Err(RegistrationError::UnsupportedParameterType {
                    owner: self.owner,
                    handler: self.name.clone(),
                    command: name.clone(),
                    parameter: spec.name.clone(),
                    ty: spec.ty,
                });
            }
        }

        let mut seen: HashMap<usize, &str> = HashMap::new();
        for spec in &self.params {
            let Some(index) = spec.argument_index else {
                continue;
            };
            if let Some(first) = seen.insert(index, &spec.name) {
                return Err(RegistrationError::InvalidArgumentBinding {
                    owner: self.owner,
                    handler: self.name.clone(),
                    first: first.to_string(),
                    second: spec.name.clone(),
                    index,
                });
            }
        }

        Ok(())
    }

    /// Validates the draft and expands it into one descriptor per trigger.
    pub(crate) fn expand(
        self,
        next_id: &mut usize,
    ) -> Result<Vec<HandlerDescriptor>, RegistrationError> {
        self.validate()?;

        let name: Arc<str> = self.name.into();
        let params: Arc<[ParamSpec]> = self.params.into();
        let required_roles: Arc<[RoleRequirement]> = self.required_roles.into();
        let usage: Option<Arc<str>> = self.usage.map(Into::into);
        let description: Option<Arc<str>> = self.description.map(Into::into);

        let descriptors = self
            .triggers
            .into_iter()
            .map(|trigger| {
                let id = HandlerId(*next_id);
                *next_id += 1;
                HandlerDescriptor {
                    id,
                    owner: self.owner,
                    name: Arc::clone(&name),
                    trigger,
                    params: Arc::clone(&params),
                    mode: self.mode,
                    required_roles: Arc::clone(&required_roles),
                    usage: usage.clone(),
                    description: description.clone(),
                    handler: Arc::clone(&self.handler),
                }
            })
            .collect();

        Ok(descriptors)
    }
}

