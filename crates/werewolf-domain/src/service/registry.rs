//! Role Registry - Lookup table from role to capabilities
//!
//! Filled once at setup (built-in roles, custom roles, limit overrides)
//! and read-only for the rest of the game.

use std::collections::BTreeMap;

use crate::model::role::{Ability, Capabilities, Faction, Role, UsageLimit};

/// A role identifier the registry does not know
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl core::fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Unknown role: {}", self.0)
    }
}

/// Role → Capabilities
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoleRegistry {
    roles: BTreeMap<Role, Capabilities>,
}

impl RoleRegistry {
    /// A registry with no roles at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// The six classic roles with their default limits
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        for role in Role::builtins() {
            if let Some(caps) = Capabilities::builtin(&role) {
                registry.register(role, caps);
            }
        }
        registry
    }

    /// Add or replace a role. Returns the capabilities it replaced.
    pub fn register(&mut self, role: Role, capabilities: Capabilities) -> Option<Capabilities> {
        self.roles.insert(role, capabilities)
    }

    /// Builder variant of [`register`](Self::register)
    pub fn with_role(mut self, role: Role, capabilities: Capabilities) -> Self {
        self.register(role, capabilities);
        self
    }

    pub fn capabilities_of(&self, role: &Role) -> Result<&Capabilities, UnknownRole> {
        self.roles
            .get(role)
            .ok_or_else(|| UnknownRole(role.id().to_string()))
    }

    pub fn faction_of(&self, role: &Role) -> Result<Faction, UnknownRole> {
        self.capabilities_of(role).map(|caps| caps.faction)
    }

    /// Override the usage limit of one ability of a role
    pub fn set_limit(
        &mut self,
        role: &Role,
        ability: Ability,
        limit: UsageLimit,
    ) -> Result<(), UnknownRole> {
        let caps = self
            .roles
            .get_mut(role)
            .ok_or_else(|| UnknownRole(role.id().to_string()))?;
        caps.limits.insert(ability, limit);
        Ok(())
    }

    /// Turn a configured role name into a registered role
    ///
    /// Built-in names are matched case-insensitively; anything else must
    /// have been registered as a custom role under exactly that name.
    pub fn resolve_name(&self, name: &str) -> Result<Role, UnknownRole> {
        let role = Role::builtin(name).unwrap_or_else(|| Role::Custom(name.trim().to_string()));
        if self.roles.contains_key(&role) {
            Ok(role)
        } else {
            Err(UnknownRole(name.trim().to_string()))
        }
    }

    pub fn contains(&self, role: &Role) -> bool {
        self.roles.contains_key(role)
    }

    pub fn roles(&self) -> impl Iterator<Item = (&Role, &Capabilities)> {
        self.roles.iter()
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::IndependentGoal;

    #[test]
    fn test_standard_registry() {
        let registry = RoleRegistry::standard();

        assert_eq!(registry.len(), 6);
        assert_eq!(registry.faction_of(&Role::Werewolf), Ok(Faction::Werewolf));
        assert_eq!(registry.faction_of(&Role::Hunter), Ok(Faction::Village));
        assert!(registry
            .capabilities_of(&Role::Seer)
            .unwrap()
            .has(Ability::Inspect));
    }

    #[test]
    fn test_unknown_role() {
        let registry = RoleRegistry::standard();
        let err = registry
            .capabilities_of(&Role::Custom("tanner".into()))
            .unwrap_err();

        assert_eq!(err, UnknownRole("tanner".into()));
        assert_eq!(err.to_string(), "Unknown role: tanner");
        assert!(registry.resolve_name("tanner").is_err());
    }

    #[test]
    fn test_custom_role() {
        let tanner = Capabilities::new(Faction::Independent).with_goal(IndependentGoal::VotedOut);
        let registry = RoleRegistry::standard().with_role(Role::Custom("tanner".into()), tanner);

        assert_eq!(
            registry.resolve_name(" tanner "),
            Ok(Role::Custom("tanner".into()))
        );
        assert_eq!(registry.resolve_name("WITCH"), Ok(Role::Witch));
    }

    #[test]
    fn test_set_limit() {
        let mut registry = RoleRegistry::standard();
        registry
            .set_limit(&Role::Witch, Ability::Save, UsageLimit::PerGame(2))
            .unwrap();

        let witch = registry.capabilities_of(&Role::Witch).unwrap();
        assert_eq!(witch.limit(Ability::Save), UsageLimit::PerGame(2));
        assert_eq!(witch.limit(Ability::Poison), UsageLimit::PerGame(1));

        assert!(registry
            .set_limit(&Role::Custom("x".into()), Ability::Kill, UsageLimit::Unlimited)
            .is_err());
    }
}
