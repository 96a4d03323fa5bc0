//! Action Resolver - Turns a night's actions into deaths and reveals
//!
//! Precedence is fixed and does not depend on the order actions arrived:
//!
//! ```text
//! 1. Kill     majority of kill proposals, ties to the earliest seat
//! 2. Protect  guard shields are candidate protections
//! 3. Save     witch saves cancel the lethal kill
//!             shield + save on the victim cancel out (double protection)
//! 4. Poison   one independent death per night, shields do not stop it
//! 5. Inspect  reveals only, resolved last
//! ```
//!
//! Actions are validated one by one in that order (then by actor seat).
//! A rejected action is a no-op and never aborts the night.
//!
//! Retaliation is requested by the controller once the night or the vote
//! has produced its deaths; [`ActionResolver::retaliate`] validates the
//! chosen target.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::action::{InvalidAction, InvalidReason, NightAction};
use crate::model::agent::{Agent, AgentId, Death, DeathCause};
use crate::model::outcome::{NightFate, NightOutcome, Reveal, RevealInfo};
use crate::model::role::{Ability, RevealPolicy};
use crate::model::state::GameState;

pub struct ActionResolver;

impl ActionResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve one night. Pure: the state is only read.
    pub fn resolve(&self, actions: &[NightAction], state: &GameState) -> NightOutcome {
        let round = state.round();
        let mut outcome = NightOutcome::new(round);

        let mut ordered: Vec<&NightAction> = actions.iter().collect();
        ordered.sort_by_key(|a| (a.ability, seat_of(state, &a.actor)));

        for action in ordered {
            match self.validate(action, state, &outcome.accepted) {
                Ok(()) => outcome.accepted.push(action.clone()),
                Err(reason) => outcome.rejected.push(InvalidAction::new(action, reason)),
            }
        }

        let shields = targets_of(&outcome.accepted, Ability::Protect);
        let saves = targets_of(&outcome.accepted, Ability::Save);
        let lethal = lethal_target(&outcome.accepted, state);

        let mut deaths = Vec::new();
        let mut fates = BTreeMap::new();

        if let Some(victim) = &lethal {
            let shielded = shields.contains(victim);
            let saved = saves.contains(victim);
            let dies = match (shielded, saved) {
                (true, true) => state.rules().double_protection_kills,
                (true, false) | (false, true) => false,
                (false, false) => true,
            };

            outcome.shielded = shielded;
            outcome.saved = saved;
            outcome.double_protected = shielded && saved && dies;

            if dies {
                deaths.push(Death::new(victim.clone(), round, DeathCause::WerewolfKill));
                fates.insert(victim.clone(), NightFate::Died);
            } else {
                fates.insert(victim.clone(), NightFate::Protected);
            }
        }

        // At most one poison was accepted
        let poison = outcome
            .accepted
            .iter()
            .find(|a| a.ability == Ability::Poison)
            .and_then(|a| a.target.clone().map(|target| (a.actor.clone(), target)));
        if let Some((witch, target)) = poison {
            let death = Death::new(target.clone(), round, DeathCause::Poison).by(witch);
            match deaths.iter_mut().find(|d| d.agent == target) {
                Some(existing) => *existing = death,
                None => deaths.push(death),
            }
            fates.insert(target, NightFate::Died);
        }

        for target in outcome.accepted.iter().filter_map(|a| a.target.as_ref()) {
            fates.entry(target.clone()).or_insert(NightFate::Survived);
        }

        // Inspections last
        for action in outcome
            .accepted
            .iter()
            .filter(|a| a.ability == Ability::Inspect)
        {
            if let Some(reveal) = reveal_for(state, action) {
                outcome.reveals.push(reveal);
            }
        }

        outcome.lethal_target = lethal;
        outcome.deaths = deaths;
        outcome.fates = fates;
        outcome
    }

    /// Check one action against the state and the actions accepted so far
    fn validate(
        &self,
        action: &NightAction,
        state: &GameState,
        accepted: &[NightAction],
    ) -> Result<(), InvalidReason> {
        let actor = state
            .agent(&action.actor)
            .ok_or(InvalidReason::UnknownActor)?;
        if !actor.is_alive() {
            return Err(InvalidReason::ActorDead);
        }

        let caps = state
            .capabilities(&action.actor)
            .ok_or(InvalidReason::MissingAbility)?;
        if !caps.has(action.ability) {
            return Err(InvalidReason::MissingAbility);
        }
        if !action.ability.is_night_ability() {
            return Err(InvalidReason::NotANightAbility);
        }
        if accepted
            .iter()
            .any(|a| a.actor == action.actor && a.ability == action.ability)
        {
            return Err(InvalidReason::DuplicateAction);
        }
        if !caps
            .limit(action.ability)
            .allows(state.used(&action.actor, action.ability))
        {
            return Err(InvalidReason::UsageExhausted);
        }
        if action.ability == Ability::Kill && state.round() == 1 && !state.rules().first_night_kill
        {
            return Err(InvalidReason::NoKillTonight);
        }

        let target_id = action.target.as_ref().ok_or(InvalidReason::MissingTarget)?;
        let target = state
            .agent(target_id)
            .ok_or(InvalidReason::UnknownTarget)?;
        if !target.is_alive() {
            return Err(InvalidReason::TargetDead);
        }
        let on_self = target_id == &action.actor;

        match action.ability {
            Ability::Kill => {
                if on_self {
                    return Err(InvalidReason::SelfTarget);
                }
                if target.faction() == actor.faction() {
                    return Err(InvalidReason::FactionMate);
                }
            }
            Ability::Protect => {
                if !state.rules().guard_repeat_target
                    && state.last_protected(&action.actor) == Some(target_id)
                {
                    return Err(InvalidReason::RepeatProtect);
                }
            }
            Ability::Save => {}
            Ability::Poison => {
                if on_self {
                    return Err(InvalidReason::SelfTarget);
                }
                if accepted.iter().any(|a| a.ability == Ability::Poison) {
                    return Err(InvalidReason::NightLimitReached);
                }
                if accepted.iter().any(|a| {
                    a.actor == action.actor
                        && a.ability == Ability::Save
                        && a.target.as_ref() == Some(target_id)
                }) {
                    return Err(InvalidReason::SaveAndPoisonSameTarget);
                }
            }
            Ability::Inspect => {
                if on_self {
                    return Err(InvalidReason::SelfTarget);
                }
            }
            Ability::Retaliate => return Err(InvalidReason::NotANightAbility),
        }

        Ok(())
    }

    /// Whether `death` grants its agent a retaliation
    ///
    /// `Ok(false)` when the agent holds no retaliation at all, `Err` when it
    /// holds one that cannot be used (exhausted, or suppressed by poison).
    pub fn retaliation_right(&self, state: &GameState, death: &Death) -> Result<bool, InvalidAction> {
        let Some(caps) = state.capabilities(&death.agent) else {
            return Ok(false);
        };
        if !caps.has(Ability::Retaliate) {
            return Ok(false);
        }

        let attempt = NightAction {
            actor: death.agent.clone(),
            ability: Ability::Retaliate,
            target: None,
        };
        if !caps
            .limit(Ability::Retaliate)
            .allows(state.used(&death.agent, Ability::Retaliate))
        {
            return Err(InvalidAction::new(&attempt, InvalidReason::UsageExhausted));
        }
        if death.cause == DeathCause::Poison && state.rules().poison_suppresses_retaliation {
            return Err(InvalidAction::new(&attempt, InvalidReason::Suppressed));
        }
        Ok(true)
    }

    /// Agents a retaliator may take down: alive and not already dying
    pub fn retaliation_candidates(
        &self,
        state: &GameState,
        pending: &[Death],
        retaliator: &AgentId,
    ) -> Vec<AgentId> {
        state
            .living()
            .map(Agent::id)
            .filter(|id| *id != retaliator && !pending.iter().any(|d| &d.agent == *id))
            .cloned()
            .collect()
    }

    /// Validate a retaliation target. `None` means the retaliator passed.
    ///
    /// `pending` holds the deaths of the resolution in progress, which are
    /// not applied to the state yet.
    pub fn retaliate(
        &self,
        state: &GameState,
        pending: &[Death],
        retaliator: &AgentId,
        target: Option<&AgentId>,
    ) -> Result<Option<Death>, InvalidAction> {
        let Some(target) = target else {
            return Ok(None);
        };
        let attempt = NightAction {
            actor: retaliator.clone(),
            ability: Ability::Retaliate,
            target: Some(target.clone()),
        };

        if target == retaliator {
            return Err(InvalidAction::new(&attempt, InvalidReason::SelfTarget));
        }
        let agent = state
            .agent(target)
            .ok_or_else(|| InvalidAction::new(&attempt, InvalidReason::UnknownTarget))?;
        if !agent.is_alive() || pending.iter().any(|d| &d.agent == target) {
            return Err(InvalidAction::new(&attempt, InvalidReason::TargetDead));
        }

        Ok(Some(
            Death::new(target.clone(), state.round(), DeathCause::Retaliation)
                .by(retaliator.clone()),
        ))
    }
}

impl Default for ActionResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn seat_of(state: &GameState, id: &AgentId) -> usize {
    state.agent(id).map_or(usize::MAX, Agent::seat)
}

fn targets_of(actions: &[NightAction], ability: Ability) -> BTreeSet<AgentId> {
    actions
        .iter()
        .filter(|a| a.ability == ability)
        .filter_map(|a| a.target.clone())
        .collect()
}

/// Majority of kill proposals; a tie goes to the earliest seat
fn lethal_target(accepted: &[NightAction], state: &GameState) -> Option<AgentId> {
    let mut counts: BTreeMap<&AgentId, u32> = BTreeMap::new();
    for target in accepted
        .iter()
        .filter(|a| a.ability == Ability::Kill)
        .filter_map(|a| a.target.as_ref())
    {
        *counts.entry(target).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .max_by(|(a, count_a), (b, count_b)| {
            count_a
                .cmp(count_b)
                .then_with(|| seat_of(state, b).cmp(&seat_of(state, a)))
        })
        .map(|(id, _)| id.clone())
}

fn reveal_for(state: &GameState, action: &NightAction) -> Option<Reveal> {
    let caps = state.capabilities(&action.actor)?;
    let target_id = action.target.as_ref()?;
    let target = state.agent(target_id)?;

    let info = match caps.reveal {
        RevealPolicy::None => return None,
        RevealPolicy::Faction => RevealInfo::Faction(target.faction()),
        RevealPolicy::Role => RevealInfo::Role(target.role().clone()),
    };

    Some(Reveal {
        round: state.round(),
        to: action.actor.clone(),
        target: target_id.clone(),
        info,
    })
}
