//! Outcomes - What a night or a day resolved to
//!
//! Outcomes are produced by the resolver and the tally, then applied by the
//! controller. Nothing here mutates an agent.

use std::collections::BTreeMap;

use super::action::{InvalidAction, NightAction};
use super::agent::{AgentId, Death};
use super::role::{Faction, Role};
use super::vote::VoteOutcome;

/// What a private reveal discloses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealInfo {
    Faction(Faction),
    Role(Role),
}

impl core::fmt::Display for RevealInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RevealInfo::Faction(faction) => write!(f, "{}", faction),
            RevealInfo::Role(role) => write!(f, "{}", role),
        }
    }
}

/// Information shown to one agent only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reveal {
    pub round: u32,
    /// The only agent allowed to see this
    pub to: AgentId,
    pub target: AgentId,
    pub info: RevealInfo,
}

/// Fate of an agent touched by tonight's actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NightFate {
    Died,
    /// Attacked, but a shield or a save held
    Protected,
    /// Targeted by a non-lethal action only
    Survived,
}

/// Resolution of one night
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NightOutcome {
    pub round: u32,
    /// The werewolves' chosen victim after aggregation
    pub lethal_target: Option<AgentId>,
    pub fates: BTreeMap<AgentId, NightFate>,
    /// Deaths in resolution order, retaliations appended last
    pub deaths: Vec<Death>,
    pub reveals: Vec<Reveal>,
    /// Actions that took effect (charged against usage limits)
    pub accepted: Vec<NightAction>,
    pub rejected: Vec<InvalidAction>,
    /// A guard covered the lethal target
    pub shielded: bool,
    /// A witch saved the lethal target
    pub saved: bool,
    /// The lethal target was both shielded and saved and died anyway
    pub double_protected: bool,
}

impl NightOutcome {
    pub fn new(round: u32) -> Self {
        Self {
            round,
            ..Default::default()
        }
    }

    pub fn died(&self, agent: &AgentId) -> bool {
        self.deaths.iter().any(|d| &d.agent == agent)
    }

    pub fn fate_of(&self, agent: &AgentId) -> Option<NightFate> {
        self.fates.get(agent).copied()
    }

    /// Append a death caused by a retaliation
    pub fn record_retaliation(&mut self, death: Death) {
        self.fates.insert(death.agent.clone(), NightFate::Died);
        self.deaths.push(death);
    }
}

/// Resolution of one day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayOutcome {
    pub round: u32,
    /// The first vote
    pub vote: VoteOutcome,
    /// The runoff, if the tie policy called one
    pub runoff: Option<VoteOutcome>,
    /// Vote elimination and any retaliations it triggered
    pub deaths: Vec<Death>,
}

impl DayOutcome {
    /// The vote whose decision stands
    pub fn final_vote(&self) -> &VoteOutcome {
        self.runoff.as_ref().unwrap_or(&self.vote)
    }

    pub fn eliminated(&self) -> Option<&AgentId> {
        self.final_vote().eliminated()
    }
}
