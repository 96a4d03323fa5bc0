//! Agent - A seat at the table
//!
//! Agent is an Entity (has identity).
//! The same AgentId refers to the same player for the whole game, whoever
//! (human, script or model) is making its decisions.
//!
//! IMPORTANT: only the controller flips an agent from alive to dead, by
//! applying an outcome the resolver or the tally produced.

use super::role::{Faction, Role};

/// Unique identifier for an Agent
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for AgentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AgentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Why an agent died
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeathCause {
    WerewolfKill,
    Poison,
    /// Taken down by a dying agent's retaliation
    Retaliation,
    Vote,
}

impl DeathCause {
    pub fn display_name(&self) -> &'static str {
        match self {
            DeathCause::WerewolfKill => "killed by werewolves",
            DeathCause::Poison => "poisoned",
            DeathCause::Retaliation => "shot in retaliation",
            DeathCause::Vote => "voted out",
        }
    }
}

/// A recorded death
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Death {
    pub agent: AgentId,
    pub round: u32,
    pub cause: DeathCause,
    /// The agent responsible, when a single one is (retaliation, poison)
    pub by: Option<AgentId>,
}

impl Death {
    pub fn new(agent: AgentId, round: u32, cause: DeathCause) -> Self {
        Self {
            agent,
            round,
            cause,
            by: None,
        }
    }

    /// Builder: record who caused the death
    pub fn by(mut self, agent: AgentId) -> Self {
        self.by = Some(agent);
        self
    }
}

/// Agent - identity, role and life state
#[derive(Debug, Clone)]
pub struct Agent {
    /// Unique identifier (Entity identity)
    id: AgentId,
    /// Display name
    name: String,
    /// Position at the table, used for speaking order and tie-breaks
    seat: usize,
    /// Assigned at setup, never changes
    role: Role,
    faction: Faction,
    /// Set once, when the agent dies
    death: Option<Death>,
}

impl Agent {
    pub fn new(
        id: AgentId,
        name: impl Into<String>,
        seat: usize,
        role: Role,
        faction: Faction,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            seat,
            role,
            faction,
            death: None,
        }
    }

    // ========== Getters ==========

    pub fn id(&self) -> &AgentId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn seat(&self) -> usize {
        self.seat
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn faction(&self) -> Faction {
        self.faction
    }

    pub fn is_alive(&self) -> bool {
        self.death.is_none()
    }

    pub fn death(&self) -> Option<&Death> {
        self.death.as_ref()
    }

    // ========== State Transitions ==========

    /// Mark the agent dead. Returns false if it already was.
    pub(crate) fn kill(&mut self, death: Death) -> bool {
        if self.death.is_some() {
            return false;
        }
        self.death = Some(death);
        true
    }
}

impl PartialEq for Agent {
    fn eq(&self, other: &Self) -> bool {
        // Entity equality: same ID = same entity
        self.id == other.id
    }
}

impl Eq for Agent {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_creation() {
        let agent = Agent::new(AgentId::new("p1"), "Alice", 0, Role::Seer, Faction::Village);

        assert_eq!(agent.id().as_str(), "p1");
        assert_eq!(agent.name(), "Alice");
        assert_eq!(agent.role(), &Role::Seer);
        assert!(agent.is_alive());
    }

    #[test]
    fn test_agent_dies_once() {
        let mut agent = Agent::new(AgentId::new("p1"), "Alice", 0, Role::Villager, Faction::Village);

        assert!(agent.kill(Death::new(AgentId::new("p1"), 1, DeathCause::WerewolfKill)));
        assert!(!agent.kill(Death::new(AgentId::new("p1"), 2, DeathCause::Vote)));
        assert_eq!(agent.death().unwrap().cause, DeathCause::WerewolfKill);
        assert!(!agent.is_alive());
    }

    #[test]
    fn test_entity_equality() {
        let a = Agent::new(AgentId::new("p1"), "Alice", 0, Role::Villager, Faction::Village);
        let b = Agent::new(AgentId::new("p1"), "Other", 4, Role::Werewolf, Faction::Werewolf);

        // Same ID = same entity (even if other fields differ)
        assert_eq!(a, b);
    }
}
