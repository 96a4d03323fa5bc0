//! Role - What an agent can do and which side it plays for
//!
//! Role is a Value Object - two roles with the same variant are equal.
//! The behaviour of a role lives in its [`Capabilities`], which the
//! registry hands out. Hybrid roles are a `Custom` variant carrying an
//! explicit ability list, never a hierarchy of role types.

use std::collections::BTreeMap;

/// The side an agent wins with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Faction {
    Werewolf,
    Village,
    Independent,
}

impl Faction {
    pub fn display_name(&self) -> &'static str {
        match self {
            Faction::Werewolf => "Werewolf",
            Faction::Village => "Village",
            Faction::Independent => "Independent",
        }
    }
}

impl core::fmt::Display for Faction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Role variants
///
/// The six classic roles are built in. Anything else is declared at setup
/// as `Custom` and must be registered before a game can use it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Werewolf,
    Villager,
    /// Inspects one agent per night
    Seer,
    /// One save and one poison per game
    Witch,
    /// Takes someone down when dying
    Hunter,
    /// Shields one agent per night from the werewolves
    Guard,
    /// A configured role identified by name
    Custom(String),
}

impl Role {
    /// Stable identifier used in configuration files
    pub fn id(&self) -> &str {
        match self {
            Role::Werewolf => "werewolf",
            Role::Villager => "villager",
            Role::Seer => "seer",
            Role::Witch => "witch",
            Role::Hunter => "hunter",
            Role::Guard => "guard",
            Role::Custom(id) => id,
        }
    }

    /// Parse one of the built-in identifiers
    pub fn builtin(id: &str) -> Option<Role> {
        match id.trim().to_ascii_lowercase().as_str() {
            "werewolf" => Some(Role::Werewolf),
            "villager" => Some(Role::Villager),
            "seer" => Some(Role::Seer),
            "witch" => Some(Role::Witch),
            "hunter" => Some(Role::Hunter),
            "guard" => Some(Role::Guard),
            _ => None,
        }
    }

    /// All built-in roles
    pub fn builtins() -> [Role; 6] {
        [
            Role::Werewolf,
            Role::Villager,
            Role::Seer,
            Role::Witch,
            Role::Hunter,
            Role::Guard,
        ]
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// A single ability a role may hold
///
/// The declaration order is the night precedence order used by the
/// resolver: kills are gathered first, then shields, saves, poison and
/// finally inspections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Ability {
    Kill,
    Protect,
    Save,
    Poison,
    Inspect,
    /// Follow-up elimination when the holder dies
    Retaliate,
}

impl Ability {
    /// Whether this ability is submitted during the Night phase
    pub fn is_night_ability(&self) -> bool {
        !matches!(self, Ability::Retaliate)
    }

    pub fn id(&self) -> &'static str {
        match self {
            Ability::Kill => "kill",
            Ability::Protect => "protect",
            Ability::Save => "save",
            Ability::Poison => "poison",
            Ability::Inspect => "inspect",
            Ability::Retaliate => "retaliate",
        }
    }

    pub fn parse(id: &str) -> Option<Ability> {
        match id.trim().to_ascii_lowercase().as_str() {
            "kill" => Some(Ability::Kill),
            "protect" => Some(Ability::Protect),
            "save" => Some(Ability::Save),
            "poison" => Some(Ability::Poison),
            "inspect" => Some(Ability::Inspect),
            "retaliate" => Some(Ability::Retaliate),
            _ => None,
        }
    }
}

impl core::fmt::Display for Ability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// How often an ability may be used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageLimit {
    Unlimited,
    PerGame(u32),
}

impl UsageLimit {
    /// Remaining uses given how many were spent (`None` = unlimited)
    pub fn remaining(&self, used: u32) -> Option<u32> {
        match self {
            UsageLimit::Unlimited => None,
            UsageLimit::PerGame(max) => Some(max.saturating_sub(used)),
        }
    }

    pub fn allows(&self, used: u32) -> bool {
        self.remaining(used).map_or(true, |left| left > 0)
    }
}

/// What an inspecting role learns about its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealPolicy {
    /// Nothing is shown
    None,
    /// The target's faction
    Faction,
    /// The target's exact role
    Role,
}

/// Private win conditions for Independent roles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndependentGoal {
    /// Wins the moment the village votes this agent out
    VotedOut,
    /// Wins when only holders of this goal remain alive
    LastStanding,
}

/// Everything the engine needs to know about a role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    pub faction: Faction,
    pub abilities: Vec<Ability>,
    pub limits: BTreeMap<Ability, UsageLimit>,
    pub reveal: RevealPolicy,
    /// Sees the other members of its faction (werewolves)
    pub knows_faction_mates: bool,
    pub independent_goal: Option<IndependentGoal>,
}

impl Capabilities {
    /// A role with no abilities
    pub fn new(faction: Faction) -> Self {
        Self {
            faction,
            abilities: Vec::new(),
            limits: BTreeMap::new(),
            reveal: RevealPolicy::None,
            knows_faction_mates: false,
            independent_goal: None,
        }
    }

    /// Builder: add an ability
    pub fn with_ability(mut self, ability: Ability) -> Self {
        if !self.abilities.contains(&ability) {
            self.abilities.push(ability);
        }
        self
    }

    /// Builder: cap an ability
    pub fn with_limit(mut self, ability: Ability, limit: UsageLimit) -> Self {
        self.limits.insert(ability, limit);
        self
    }

    pub fn with_reveal(mut self, reveal: RevealPolicy) -> Self {
        self.reveal = reveal;
        self
    }

    pub fn knowing_faction_mates(mut self) -> Self {
        self.knows_faction_mates = true;
        self
    }

    pub fn with_goal(mut self, goal: IndependentGoal) -> Self {
        self.independent_goal = Some(goal);
        self
    }

    pub fn has(&self, ability: Ability) -> bool {
        self.abilities.contains(&ability)
    }

    pub fn limit(&self, ability: Ability) -> UsageLimit {
        self.limits
            .get(&ability)
            .copied()
            .unwrap_or(UsageLimit::Unlimited)
    }

    /// Whether the role acts at night at all
    pub fn acts_at_night(&self) -> bool {
        self.abilities.iter().any(Ability::is_night_ability)
    }

    /// Capabilities of a built-in role
    pub fn builtin(role: &Role) -> Option<Self> {
        let caps = match role {
            Role::Werewolf => Capabilities::new(Faction::Werewolf)
                .with_ability(Ability::Kill)
                .knowing_faction_mates(),
            Role::Villager => Capabilities::new(Faction::Village),
            Role::Seer => Capabilities::new(Faction::Village)
                .with_ability(Ability::Inspect)
                .with_reveal(RevealPolicy::Faction),
            Role::Witch => Capabilities::new(Faction::Village)
                .with_ability(Ability::Save)
                .with_ability(Ability::Poison)
                .with_limit(Ability::Save, UsageLimit::PerGame(1))
                .with_limit(Ability::Poison, UsageLimit::PerGame(1)),
            Role::Hunter => Capabilities::new(Faction::Village)
                .with_ability(Ability::Retaliate)
                .with_limit(Ability::Retaliate, UsageLimit::PerGame(1)),
            Role::Guard => Capabilities::new(Faction::Village).with_ability(Ability::Protect),
            Role::Custom(_) => return None,
        };
        Some(caps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_parse_round_trip() {
        for role in Role::builtins() {
            assert_eq!(Role::builtin(role.id()), Some(role.clone()));
        }
        assert_eq!(Role::builtin(" Seer "), Some(Role::Seer));
        assert_eq!(Role::builtin("tanner"), None);
    }

    #[test]
    fn test_witch_limits() {
        let witch = Capabilities::builtin(&Role::Witch).unwrap();
        assert!(witch.has(Ability::Save));
        assert!(witch.has(Ability::Poison));
        assert_eq!(witch.limit(Ability::Save), UsageLimit::PerGame(1));
        assert!(witch.limit(Ability::Save).allows(0));
        assert!(!witch.limit(Ability::Save).allows(1));
    }

    #[test]
    fn test_hunter_does_not_act_at_night() {
        let hunter = Capabilities::builtin(&Role::Hunter).unwrap();
        assert!(!hunter.acts_at_night());
        assert!(Capabilities::builtin(&Role::Guard).unwrap().acts_at_night());
    }

    #[test]
    fn test_custom_has_no_builtin_capabilities() {
        assert!(Capabilities::builtin(&Role::Custom("tanner".into())).is_none());
    }

    #[test]
    fn test_unlimited_remaining() {
        assert_eq!(UsageLimit::Unlimited.remaining(99), None);
        assert_eq!(UsageLimit::PerGame(2).remaining(1), Some(1));
        assert_eq!(UsageLimit::PerGame(1).remaining(3), Some(0));
    }
}
