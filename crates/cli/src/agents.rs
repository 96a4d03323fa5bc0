//! Random agents for simulated games

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use engine::{DecisionError, DecisionMaker};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use werewolf_domain::{
    Ability, AgentId, AgentView, Ballot, Faction, Intent, RevealInfo, Role, SpeechKind,
};

/// Chance that a witch spends a potion on a given night
const POTION_CHANCE: f64 = 0.25;
/// Chance of abstaining from a vote
const ABSTAIN_CHANCE: f64 = 0.1;

/// Plays at random among the moves its view allows
///
/// Create one per agent: each owns its generator, so a seed replays the
/// same game whatever order concurrent requests are served in.
#[derive(Debug)]
pub struct RandomDecisionMaker {
    rng: Mutex<Pcg64>,
}

impl RandomDecisionMaker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(Pcg64::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut Pcg64) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }
}

/// Candidates that are not known allies
fn suspects(view: &AgentView) -> Vec<AgentId> {
    view.candidates
        .iter()
        .filter(|c| !view.allies.contains(c))
        .cloned()
        .collect()
}

/// A candidate this agent has seen revealed as a werewolf
fn known_wolf(view: &AgentView) -> Option<AgentId> {
    view.reveals
        .iter()
        .filter(|r| view.candidates.contains(&r.target))
        .find(|r| match &r.info {
            RevealInfo::Faction(faction) => *faction == Faction::Werewolf,
            RevealInfo::Role(role) => *role == Role::Werewolf,
        })
        .map(|r| r.target.clone())
}

#[async_trait]
impl DecisionMaker for RandomDecisionMaker {
    async fn night_action(&self, view: AgentView) -> Result<Vec<Intent>, DecisionError> {
        let suspects = suspects(&view);
        let inspected: Vec<&AgentId> = view.reveals.iter().map(|r| &r.target).collect();

        Ok(self.with_rng(|rng| {
            let mut intents = Vec::new();
            for (ability, left) in &view.abilities {
                if !ability.is_night_ability() || *left == Some(0) {
                    continue;
                }
                let pool: Vec<&AgentId> = match ability {
                    Ability::Kill => suspects.iter().collect(),
                    Ability::Inspect => view
                        .candidates
                        .iter()
                        .filter(|c| !inspected.contains(c))
                        .collect(),
                    Ability::Save | Ability::Poison => {
                        if !rng.gen_bool(POTION_CHANCE) {
                            continue;
                        }
                        view.candidates.iter().collect()
                    }
                    _ => view.candidates.iter().collect(),
                };
                if let Some(target) = pool.choose(&mut *rng) {
                    intents.push(Intent::new(*ability, (*target).clone()));
                }
            }
            intents
        }))
    }

    async fn vote(&self, view: AgentView) -> Result<Ballot, DecisionError> {
        if let Some(wolf) = known_wolf(&view) {
            return Ok(Ballot::For(wolf));
        }
        let suspects = suspects(&view);
        Ok(self.with_rng(|rng| {
            if rng.gen_bool(ABSTAIN_CHANCE) {
                return Ballot::Abstain;
            }
            suspects
                .choose(&mut *rng)
                .cloned()
                .map_or(Ballot::Abstain, Ballot::For)
        }))
    }

    async fn utterance(&self, view: AgentView) -> Result<String, DecisionError> {
        if view.speaking == Some(SpeechKind::LastWords) {
            return Ok(format!("{} leaves the table. Good luck, everyone.", view.name));
        }
        if let Some(wolf) = known_wolf(&view) {
            return Ok(format!("I know {} is a werewolf.", wolf));
        }
        let suspects = suspects(&view);
        Ok(self.with_rng(|rng| match suspects.choose(&mut *rng) {
            Some(target) => format!("I have a bad feeling about {}.", target),
            None => String::new(),
        }))
    }

    async fn retaliate(&self, view: AgentView) -> Result<Option<AgentId>, DecisionError> {
        if let Some(wolf) = known_wolf(&view) {
            return Ok(Some(wolf));
        }
        let suspects = suspects(&view);
        Ok(self.with_rng(|rng| suspects.choose(&mut *rng).cloned()))
    }
}
