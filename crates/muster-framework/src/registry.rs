//! The trigger registry.
//!
//! Built once from every feature object at composition time and read-only
//! afterwards, so it is shared between event streams without locking.

use std::collections::HashMap;
use std::sync::Arc;

use muster_core::{CommandSchema, ComponentKind};
use tracing::{debug, info};

use crate::descriptor::HandlerDescriptor;
use crate::error::RegistrationError;
use crate::feature::{Feature, Registrar};
use crate::resolver::eq_ignore_case;
use crate::slash;
use crate::trigger::{Trigger, TriggerKind};

/// Handlers sharing one command key.
#[derive(Debug)]
pub(crate) struct CommandEntry {
    /// The key as first declared.
    pub(crate) key: String,
    pub(crate) handlers: Vec<Arc<HandlerDescriptor>>,
}

/// A help line for one command key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandHelp {
    pub key: String,
    pub usage: Option<String>,
    pub description: Option<String>,
}

/// All registered handlers, grouped by trigger kind and key.
#[derive(Debug, Default)]
pub struct TriggerRegistry {
    pub(crate) commands: Vec<CommandEntry>,
    buttons: HashMap<String, Vec<Arc<HandlerDescriptor>>>,
    select_menus: HashMap<String, Vec<Arc<HandlerDescriptor>>>,
    slash_commands: HashMap<String, Vec<Arc<HandlerDescriptor>>>,
    slash_schemas: Vec<CommandSchema>,
    intervals: Vec<Arc<HandlerDescriptor>>,
    listeners: HashMap<TriggerKind, Vec<Arc<HandlerDescriptor>>>,
    handler_count: usize,
}

impl TriggerRegistry {
    /// Starts building a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Total number of descriptors.
    pub fn len(&self) -> usize {
        self.handler_count
    }

    pub fn is_empty(&self) -> bool {
        self.handler_count == 0
    }

    /// Handlers bound to exactly this component id, in registration order.
    pub fn components(&self, kind: ComponentKind, custom_id: &str) -> &[Arc<HandlerDescriptor>] {
        let map = match kind {
            ComponentKind::Button => &self.buttons,
            ComponentKind::SelectMenu => &self.select_menus,
        };
        map.get(custom_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Handlers of an unkeyed kind (message, ready, reaction, ...).
    pub fn listeners(&self, kind: TriggerKind) -> &[Arc<HandlerDescriptor>] {
        self.listeners
            .get(&kind)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Handlers bound to exactly this slash-command name.
    pub fn slash_handlers(&self, name: &str) -> &[Arc<HandlerDescriptor>] {
        self.slash_commands
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// One schema per distinct slash-command name.
    pub fn slash_schemas(&self) -> &[CommandSchema] {
        &self.slash_schemas
    }

    /// Interval handlers, in registration order.
    pub fn intervals(&self) -> &[Arc<HandlerDescriptor>] {
        &self.intervals
    }

    /// Help lines for every command key, taken from its first handler.
    pub fn command_help(&self) -> Vec<CommandHelp> {
        self.commands
            .iter()
            .filter_map(|entry| {
                entry.handlers.first().map(|handler| CommandHelp {
                    key: entry.key.clone(),
                    usage: handler.usage().map(str::to_string),
                    description: handler.description().map(str::to_string),
                })
            })
            .collect()
    }

    fn insert(&mut self, descriptor: HandlerDescriptor) {
        let descriptor = Arc::new(descriptor);
        self.handler_count += 1;

        match descriptor.trigger().clone() {
            Trigger::Command(key) => {
                match self
                    .commands
                    .iter_mut()
                    .find(|entry| eq_ignore_case(&entry.key, &key))
                {
                    Some(entry) => entry.handlers.push(descriptor),
                    None => self.commands.push(CommandEntry {
                        key,
                        handlers: vec![descriptor],
                    }),
                }
            }
            Trigger::ButtonClick(id) => self.buttons.entry(id).or_default().push(descriptor),
            Trigger::SelectMenu(id) => self.select_menus.entry(id).or_default().push(descriptor),
            Trigger::SlashCommand { name, .. } => {
                self.slash_commands.entry(name).or_default().push(descriptor);
            }
            Trigger::Interval(_) => self.intervals.push(descriptor),
            other => {
                let kind = other.kind();
                self.listeners.entry(kind).or_default().push(descriptor);
            }
        }
    }
}

/// Collects features and builds a [`TriggerRegistry`].
#[derive(Default)]
pub struct RegistryBuilder {
    descriptors: Vec<HandlerDescriptor>,
    next_id: usize,
    features: usize,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every handler `owner` declares.
    ///
    /// Fails on the first invalid declaration; nothing of the feature is
    /// registered in that case.
    pub fn add_feature<F: Feature>(&mut self, owner: Arc<F>) -> Result<(), RegistrationError> {
        let mut registrar = Registrar::new(owner);
        F::register(&mut registrar);

        let mut next_id = self.next_id;
        let mut expanded = Vec::new();
        for draft in registrar.into_drafts() {
            expanded.extend(draft.expand(&mut next_id)?);
        }

        debug!(
            feature = std::any::type_name::<F>(),
            descriptors = expanded.len(),
            "Feature registered"
        );
        self.next_id = next_id;
        self.features += 1;
        self.descriptors.extend(expanded);
        Ok(())
    }

    /// Registers a feature (builder pattern).
    pub fn feature<F: Feature>(mut self, owner: Arc<F>) -> Result<Self, RegistrationError> {
        self.add_feature(owner)?;
        Ok(self)
    }

    /// Groups all descriptors and generates slash-command schemas.
    pub fn build(self) -> Result<TriggerRegistry, RegistrationError> {
        let slash_schemas = slash::build_schemas(&self.descriptors)?;

        let mut registry = TriggerRegistry {
            slash_schemas,
            ..TriggerRegistry::default()
        };
        for descriptor in self.descriptors {
            registry.insert(descriptor);
        }

        info!(
            features = self.features,
            handlers = registry.len(),
            commands = registry.commands.len(),
            slash_commands = registry.slash_schemas.len(),
            intervals = registry.intervals.len(),
            "Trigger registry built"
        );
        Ok(registry)
    }
}
