//! GameState - The single source of truth of a game
//!
//! GameState is an Aggregate Root: agents, usage counters and the outcome
//! history only change through its methods, and those methods are only
//! called by the controller.
//!
//! ## Lifecycle
//!
//! ```text
//! GameSetup ──validate──> GameState(Setup) ──advance──> Night ──> ... ──> Terminated
//! ```

use std::collections::{BTreeMap, BTreeSet};

use super::agent::{Agent, AgentId, Death};
use super::outcome::{DayOutcome, NightOutcome};
use super::phase::{Phase, PhaseError};
use super::role::{Ability, Capabilities, Faction, Role};
use super::rules::Rules;
use super::view::AgentView;
use crate::service::registry::RoleRegistry;
use crate::service::win::{WinEvaluator, WinResult};

/// Smallest table the engine accepts
pub const MIN_AGENTS: usize = 3;

/// One seat as declared in the configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSpec {
    pub id: AgentId,
    pub name: String,
    pub role: Role,
}

impl PlayerSpec {
    pub fn new(id: impl Into<AgentId>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
        }
    }
}

/// Structural problems found at Setup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    TooFewAgents { found: usize, min: usize },
    DuplicateAgent(AgentId),
    UnknownRole(String),
    NoWerewolves,
    /// Werewolves must be strictly fewer than half of the table
    TooManyWerewolves { werewolves: usize, agents: usize },
    /// The table already satisfies a win condition before the first night
    AlreadyDecided(Faction),
    InvalidRule(String),
}

impl core::fmt::Display for SetupError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SetupError::TooFewAgents { found, min } => {
                write!(f, "Too few agents: {} (need at least {})", found, min)
            }
            SetupError::DuplicateAgent(id) => write!(f, "Duplicate agent id: {}", id),
            SetupError::UnknownRole(role) => write!(f, "Unknown role: {}", role),
            SetupError::NoWerewolves => write!(f, "No werewolf-faction agent at the table"),
            SetupError::TooManyWerewolves { werewolves, agents } => write!(
                f,
                "Too many werewolves: {} of {} agents (must be fewer than half)",
                werewolves, agents
            ),
            SetupError::AlreadyDecided(faction) => {
                write!(f, "Win condition already met at setup: {}", faction)
            }
            SetupError::InvalidRule(reason) => write!(f, "Invalid rule: {}", reason),
        }
    }
}

/// A state the engine must never reach
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation(pub String);

impl core::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Invariant violated: {}", self.0)
    }
}

/// What an utterance is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechKind {
    Discussion,
    LastWords,
}

/// A public utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Speech {
    pub round: u32,
    pub phase: Phase,
    pub speaker: AgentId,
    pub kind: SpeechKind,
    pub text: String,
}

/// Everything needed to start a game
#[derive(Debug, Clone)]
pub struct GameSetup {
    /// In seating order
    pub players: Vec<PlayerSpec>,
    pub registry: RoleRegistry,
    pub rules: Rules,
}

impl GameSetup {
    /// Standard roles, default rules
    pub fn new(players: Vec<PlayerSpec>) -> Self {
        Self {
            players,
            registry: RoleRegistry::standard(),
            rules: Rules::default(),
        }
    }

    pub fn with_registry(mut self, registry: RoleRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_rules(mut self, rules: Rules) -> Self {
        self.rules = rules;
        self
    }

    /// Check the table is playable
    pub fn validate(&self) -> Result<(), SetupError> {
        self.seat_agents().map(|_| ())
    }

    /// Validate and seat everyone. The game starts in `Setup`, round 0.
    pub fn into_state(self) -> Result<GameState, SetupError> {
        let agents = self.seat_agents()?;
        Ok(GameState {
            round: 0,
            phase: Phase::Setup,
            agents,
            registry: self.registry,
            rules: self.rules,
            usage: BTreeMap::new(),
            nights: Vec::new(),
            days: Vec::new(),
            speeches: Vec::new(),
        })
    }

    fn seat_agents(&self) -> Result<Vec<Agent>, SetupError> {
        if self.rules.max_vote_attempts == 0 {
            return Err(SetupError::InvalidRule(
                "max_vote_attempts must be at least 1".into(),
            ));
        }
        if self.rules.max_rounds == 0 {
            return Err(SetupError::InvalidRule("max_rounds must be at least 1".into()));
        }
        if self.players.len() < MIN_AGENTS {
            return Err(SetupError::TooFewAgents {
                found: self.players.len(),
                min: MIN_AGENTS,
            });
        }

        let mut seen = BTreeSet::new();
        let mut agents = Vec::with_capacity(self.players.len());
        for (seat, player) in self.players.iter().enumerate() {
            if player.id.as_str().trim().is_empty() {
                return Err(SetupError::InvalidRule(format!(
                    "agent at seat {} has an empty id",
                    seat
                )));
            }
            if !seen.insert(player.id.clone()) {
                return Err(SetupError::DuplicateAgent(player.id.clone()));
            }
            let faction = self
                .registry
                .faction_of(&player.role)
                .map_err(|e| SetupError::UnknownRole(e.0))?;
            agents.push(Agent::new(
                player.id.clone(),
                player.name.clone(),
                seat,
                player.role.clone(),
                faction,
            ));
        }

        let werewolves = agents
            .iter()
            .filter(|a| a.faction() == Faction::Werewolf)
            .count();
        if werewolves == 0 {
            return Err(SetupError::NoWerewolves);
        }
        if werewolves * 2 >= agents.len() {
            return Err(SetupError::TooManyWerewolves {
                werewolves,
                agents: agents.len(),
            });
        }

        if let WinResult::Winner(faction) =
            WinEvaluator::new().evaluate(&agents, &self.registry, &self.rules)
        {
            return Err(SetupError::AlreadyDecided(faction));
        }

        Ok(agents)
    }
}

/// Full game state. Owned and written by the controller only.
#[derive(Debug, Clone)]
pub struct GameState {
    round: u32,
    phase: Phase,
    /// Seating order
    agents: Vec<Agent>,
    registry: RoleRegistry,
    rules: Rules,
    /// Ability uses spent so far
    usage: BTreeMap<(AgentId, Ability), u32>,
    nights: Vec<NightOutcome>,
    days: Vec<DayOutcome>,
    speeches: Vec<Speech>,
}

impl GameState {
    // ========== Getters ==========

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, id: &AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id() == id)
    }

    pub fn is_alive(&self, id: &AgentId) -> bool {
        self.agent(id).is_some_and(Agent::is_alive)
    }

    /// Living agents in seating order
    pub fn living(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter().filter(|a| a.is_alive())
    }

    pub fn living_ids(&self) -> Vec<AgentId> {
        self.living().map(|a| a.id().clone()).collect()
    }

    pub fn capabilities(&self, id: &AgentId) -> Option<&Capabilities> {
        self.agent(id)
            .and_then(|a| self.registry.capabilities_of(a.role()).ok())
    }

    pub fn used(&self, id: &AgentId, ability: Ability) -> u32 {
        self.usage
            .get(&(id.clone(), ability))
            .copied()
            .unwrap_or(0)
    }

    /// Uses left for an ability the agent holds (`None` = unlimited)
    pub fn remaining(&self, id: &AgentId, ability: Ability) -> Option<u32> {
        self.capabilities(id)
            .and_then(|caps| caps.limit(ability).remaining(self.used(id, ability)))
    }

    /// Holds the ability and has a use left
    pub fn can_use(&self, id: &AgentId, ability: Ability) -> bool {
        self.capabilities(id).is_some_and(|caps| {
            caps.has(ability) && caps.limit(ability).allows(self.used(id, ability))
        })
    }

    pub fn night_outcomes(&self) -> &[NightOutcome] {
        &self.nights
    }

    pub fn day_outcomes(&self) -> &[DayOutcome] {
        &self.days
    }

    pub fn speeches(&self) -> &[Speech] {
        &self.speeches
    }

    /// Who this agent shielded on the previous night
    pub fn last_protected(&self, guard: &AgentId) -> Option<&AgentId> {
        let previous = self.round.checked_sub(1)?;
        self.nights
            .iter()
            .rev()
            .find(|night| night.round == previous)?
            .accepted
            .iter()
            .find(|a| &a.actor == guard && a.ability == Ability::Protect)
            .and_then(|a| a.target.as_ref())
    }

    pub fn is_terminated(&self) -> bool {
        self.phase == Phase::Terminated
    }

    pub fn evaluate_win(&self) -> WinResult {
        WinEvaluator::new().evaluate(&self.agents, &self.registry, &self.rules)
    }

    /// Role-filtered projection for one agent
    pub fn view_for(&self, id: &AgentId) -> Option<AgentView> {
        AgentView::project(self, id)
    }

    // ========== State Transitions ==========

    /// Move to the next phase. Entering Night starts a new round.
    pub fn advance(&mut self, next: Phase) -> Result<(), PhaseError> {
        if !self.phase.can_transition_to(next) {
            return Err(PhaseError {
                from: self.phase,
                to: next,
            });
        }
        if next == Phase::Night {
            self.round += 1;
        }
        self.phase = next;
        Ok(())
    }

    /// Charge accepted actions, apply deaths, keep the outcome
    pub fn apply_night(&mut self, outcome: NightOutcome) -> Result<(), InvariantViolation> {
        if outcome.round != self.round {
            return Err(InvariantViolation(format!(
                "night outcome for round {} applied in round {}",
                outcome.round, self.round
            )));
        }
        self.check_deaths(&outcome.deaths)?;

        for action in &outcome.accepted {
            *self
                .usage
                .entry((action.actor.clone(), action.ability))
                .or_insert(0) += 1;
        }
        self.kill_all(&outcome.deaths);
        self.nights.push(outcome);
        Ok(())
    }

    pub fn apply_day(&mut self, outcome: DayOutcome) -> Result<(), InvariantViolation> {
        if outcome.round != self.round {
            return Err(InvariantViolation(format!(
                "day outcome for round {} applied in round {}",
                outcome.round, self.round
            )));
        }
        self.check_deaths(&outcome.deaths)?;
        self.kill_all(&outcome.deaths);
        self.days.push(outcome);
        Ok(())
    }

    pub fn record_speech(&mut self, speech: Speech) {
        self.speeches.push(speech);
    }

    /// Spend one retaliation of a dying agent
    pub fn record_retaliation_use(&mut self, agent: &AgentId) {
        *self
            .usage
            .entry((agent.clone(), Ability::Retaliate))
            .or_insert(0) += 1;
    }

    /// Checks that must hold after every mutation
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut ids = BTreeSet::new();
        for agent in &self.agents {
            if !ids.insert(agent.id()) {
                return Err(InvariantViolation(format!(
                    "two agents share identity {}",
                    agent.id()
                )));
            }
            if let Some(death) = agent.death() {
                if death.agent != *agent.id() {
                    return Err(InvariantViolation(format!(
                        "death record of {} attached to {}",
                        death.agent,
                        agent.id()
                    )));
                }
            }
        }
        for ((id, ability), used) in &self.usage {
            let within = self
                .capabilities(id)
                .is_some_and(|caps| caps.has(*ability) && caps.limit(*ability).allows(used - 1));
            if !within {
                return Err(InvariantViolation(format!(
                    "{} used {} {} times beyond its limit",
                    id, ability, used
                )));
            }
        }
        if self.phase != Phase::Setup && self.round == 0 {
            return Err(InvariantViolation("game left setup in round 0".into()));
        }
        Ok(())
    }

    fn check_deaths(&self, deaths: &[Death]) -> Result<(), InvariantViolation> {
        let mut seen = BTreeSet::new();
        for death in deaths {
            if !self.is_alive(&death.agent) {
                return Err(InvariantViolation(format!(
                    "{} cannot die: not a living agent",
                    death.agent
                )));
            }
            if !seen.insert(&death.agent) {
                return Err(InvariantViolation(format!("{} dies twice", death.agent)));
            }
        }
        Ok(())
    }

    fn kill_all(&mut self, deaths: &[Death]) {
        for death in deaths {
            if let Some(agent) = self.agents.iter_mut().find(|a| a.id() == &death.agent) {
                agent.kill(death.clone());
            }
        }
    }
}
