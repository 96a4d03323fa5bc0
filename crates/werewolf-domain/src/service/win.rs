//! Win Evaluator - Has the game ended, and for whom?
//!
//! Checked in this order:
//! 1. Independent goals (voted out, last standing)
//! 2. Village: no werewolf-faction agent alive
//! 3. Werewolf: no other agent alive, or parity when the rule is on

use crate::model::agent::{Agent, DeathCause};
use crate::model::role::{Faction, IndependentGoal};
use crate::model::rules::Rules;
use crate::service::registry::RoleRegistry;

/// Result of a win check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinResult {
    Continue,
    Winner(Faction),
}

impl WinResult {
    pub fn winner(&self) -> Option<Faction> {
        match self {
            WinResult::Continue => None,
            WinResult::Winner(faction) => Some(*faction),
        }
    }

    pub fn is_over(&self) -> bool {
        matches!(self, WinResult::Winner(_))
    }
}

pub struct WinEvaluator;

impl WinEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate the table. Takes every agent, dead ones included, because
    /// some independent goals depend on how an agent died.
    pub fn evaluate(&self, agents: &[Agent], registry: &RoleRegistry, rules: &Rules) -> WinResult {
        let goal_of = |agent: &Agent| {
            registry
                .capabilities_of(agent.role())
                .ok()
                .and_then(|caps| caps.independent_goal)
        };

        // Independent goals come first
        let voted_out = agents.iter().any(|a| {
            goal_of(a) == Some(IndependentGoal::VotedOut)
                && a.death().is_some_and(|d| d.cause == DeathCause::Vote)
        });
        if voted_out {
            return WinResult::Winner(Faction::Independent);
        }

        let living: Vec<&Agent> = agents.iter().filter(|a| a.is_alive()).collect();
        if !living.is_empty()
            && living
                .iter()
                .all(|a| goal_of(*a) == Some(IndependentGoal::LastStanding))
        {
            return WinResult::Winner(Faction::Independent);
        }

        let werewolves = living
            .iter()
            .filter(|a| a.faction() == Faction::Werewolf)
            .count();
        let others = living.len() - werewolves;

        if werewolves == 0 {
            return WinResult::Winner(Faction::Village);
        }
        if others == 0 || (rules.werewolf_parity_win && werewolves >= others) {
            return WinResult::Winner(Faction::Werewolf);
        }

        WinResult::Continue
    }
}

impl Default for WinEvaluator {
    fn default() -> Self {
        Self::new()
    }
}
