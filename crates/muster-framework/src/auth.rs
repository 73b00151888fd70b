//! Role-based authorization gate.

use muster_core::{BoxedGateway, GatewayEvent, Role, RoleId};
use tracing::{debug, warn};

use crate::descriptor::HandlerDescriptor;

/// One role a caller must hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoleRequirement {
    /// Matches a role by its exact name.
    Name(String),
    /// Matches a role by id.
    Id(RoleId),
}

impl RoleRequirement {
    /// Returns `true` if `role` satisfies this requirement.
    pub fn is_met_by(&self, role: &Role) -> bool {
        match self {
            Self::Name(name) => role.name == *name,
            Self::Id(id) => role.id == *id,
        }
    }
}

/// Returns `true` if `roles` satisfies every requirement.
///
/// Requirements are combined with AND: a caller holding only some of the
/// required roles is denied. No requirements always authorizes.
pub fn authorize(requirements: &[RoleRequirement], roles: &[Role]) -> bool {
    requirements
        .iter()
        .all(|requirement| roles.iter().any(|role| requirement.is_met_by(role)))
}

/// Checks handlers' role requirements against the caller of an event.
///
/// The caller's roles are fetched from the gateway at most once per event,
/// and only if some handler actually requires a role.
pub(crate) struct CallerRoles<'a> {
    gateway: &'a BoxedGateway,
    event: &'a GatewayEvent,
    roles: Option<Option<Vec<Role>>>,
}

impl<'a> CallerRoles<'a> {
    pub(crate) fn new(gateway: &'a BoxedGateway, event: &'a GatewayEvent) -> Self {
        Self {
            gateway,
            event,
            roles: None,
        }
    }

    /// Returns `true` if the event's caller may run `handler`.
    pub(crate) async fn permits(&mut self, handler: &HandlerDescriptor) -> bool {
        let requirements = handler.required_roles();
        if requirements.is_empty() {
            return true;
        }

        let allowed = match self.resolve().await {
            Some(roles) => authorize(requirements, roles),
            None => false,
        };

        if !allowed {
            debug!(
                handler = handler.name(),
                owner = handler.owner(),
                caller = ?self.event.caller(),
                "Caller lacks required roles, skipping handler"
            );
        }
        allowed
    }

    async fn resolve(&mut self) -> Option<&[Role]> {
        if self.roles.is_none() {
            let fetched = match (self.event.guild_id(), self.event.caller()) {
                (Some(guild), Some(user)) => {
                    match self.gateway.member_roles(guild, user).await {
                        Ok(roles) => Some(roles),
                        Err(e) => {
                            warn!(%guild, %user, error = %e, "Failed to resolve caller roles");
                            None
                        }
                    }
                }
                _ => None,
            };
            self.roles = Some(fetched);
        }
        self.roles.as_ref().and_then(|roles| roles.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(id: u64, name: &str) -> Role {
        Role {
            id: RoleId(id),
            name: name.into(),
        }
    }

    #[test]
    fn test_no_requirements_authorizes() {
        assert!(authorize(&[], &[]));
    }

    #[test]
    fn test_requirements_are_anded() {
        let required = [
            RoleRequirement::Name("Officer".into()),
            RoleRequirement::Name("Raider".into()),
        ];
        let both = [role(1, "Officer"), role(2, "Raider"), role(3, "Member")];
        let only_one = [role(1, "Officer"), role(3, "Member")];

        assert!(authorize(&required, &both));
        assert!(!authorize(&required, &only_one));
    }

    #[test]
    fn test_name_and_id_requirements() {
        let required = [RoleRequirement::Id(RoleId(5)), RoleRequirement::Name("GM".into())];
        assert!(authorize(&required, &[role(5, "Banker"), role(6, "GM")]));
        assert!(!authorize(&required, &[role(6, "GM")]));
        // Names match exactly.
        assert!(!authorize(
            &[RoleRequirement::Name("GM".into())],
            &[role(6, "gm")]
        ));
    }
}
