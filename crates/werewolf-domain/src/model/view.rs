//! AgentView - What one agent is allowed to know
//!
//! A view is an owned snapshot built by a pure projection over
//! [`GameState`]. Decision makers only ever receive views, never the state.
//!
//! Everyone sees the seating, who is alive, public deaths, speeches and
//! ballots. On top of that an agent sees its own role and remaining uses,
//! its faction mates if its role knows them, and reveals addressed to it.

use super::agent::{AgentId, DeathCause};
use super::outcome::Reveal;
use super::phase::Phase;
use super::role::{Ability, Faction, Role};
use super::state::{GameState, Speech, SpeechKind};
use super::vote::Vote;

/// A seat as everyone sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatInfo {
    pub id: AgentId,
    pub name: String,
    pub seat: usize,
    pub alive: bool,
}

/// How a death was announced
///
/// Night deaths do not say whether it was the werewolves or the witch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicDeathKind {
    Night,
    Vote,
    Retaliation,
}

impl From<DeathCause> for PublicDeathKind {
    fn from(cause: DeathCause) -> Self {
        match cause {
            DeathCause::WerewolfKill | DeathCause::Poison => PublicDeathKind::Night,
            DeathCause::Vote => PublicDeathKind::Vote,
            DeathCause::Retaliation => PublicDeathKind::Retaliation,
        }
    }
}

/// One entry of the public history
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicRecord {
    Death {
        round: u32,
        agent: AgentId,
        kind: PublicDeathKind,
    },
    Speech(Speech),
    Votes {
        round: u32,
        ballots: Vec<Vote>,
        eliminated: Option<AgentId>,
        runoff: bool,
    },
}

/// Role-filtered projection of the game for one agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentView {
    pub me: AgentId,
    pub name: String,
    pub role: Role,
    pub faction: Faction,
    pub alive: bool,
    /// Abilities held, with uses left (`None` = unlimited)
    pub abilities: Vec<(Ability, Option<u32>)>,
    pub round: u32,
    pub phase: Phase,
    pub seats: Vec<SeatInfo>,
    /// Faction mates, when the role knows them
    pub allies: Vec<AgentId>,
    /// Private information addressed to this agent
    pub reveals: Vec<Reveal>,
    pub history: Vec<PublicRecord>,
    /// Who may be chosen in the current request
    pub candidates: Vec<AgentId>,
    /// Set when the agent is asked to speak
    pub speaking: Option<SpeechKind>,
}

impl AgentView {
    /// Build the view of `id`. `None` if the agent is not in the game.
    pub fn project(state: &GameState, id: &AgentId) -> Option<AgentView> {
        let me = state.agent(id)?;
        let caps = state.capabilities(id);

        let abilities = caps
            .map(|caps| {
                caps.abilities
                    .iter()
                    .map(|ability| (*ability, state.remaining(id, *ability)))
                    .collect()
            })
            .unwrap_or_default();

        let allies = if caps.is_some_and(|caps| caps.knows_faction_mates) {
            state
                .agents()
                .iter()
                .filter(|a| a.id() != id && a.faction() == me.faction())
                .map(|a| a.id().clone())
                .collect()
        } else {
            Vec::new()
        };

        let seats = state
            .agents()
            .iter()
            .map(|a| SeatInfo {
                id: a.id().clone(),
                name: a.name().to_string(),
                seat: a.seat(),
                alive: a.is_alive(),
            })
            .collect();

        let reveals = state
            .night_outcomes()
            .iter()
            .flat_map(|night| night.reveals.iter())
            .filter(|reveal| &reveal.to == id)
            .cloned()
            .collect();

        let candidates = state
            .living()
            .filter(|a| a.id() != id)
            .map(|a| a.id().clone())
            .collect();

        Some(AgentView {
            me: id.clone(),
            name: me.name().to_string(),
            role: me.role().clone(),
            faction: me.faction(),
            alive: me.is_alive(),
            abilities,
            round: state.round(),
            phase: state.phase(),
            seats,
            allies,
            reveals,
            history: public_history(state),
            candidates,
            speaking: None,
        })
    }

    /// Replace the default candidates (every other living agent)
    pub fn with_candidates(mut self, candidates: Vec<AgentId>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn speaking(mut self, kind: SpeechKind) -> Self {
        self.speaking = Some(kind);
        self
    }

    pub fn has_ability(&self, ability: Ability) -> bool {
        self.abilities
            .iter()
            .any(|(held, left)| *held == ability && left.map_or(true, |n| n > 0))
    }

    pub fn living(&self) -> impl Iterator<Item = &SeatInfo> {
        self.seats.iter().filter(|s| s.alive)
    }
}

/// Public history, in the order things happened
fn public_history(state: &GameState) -> Vec<PublicRecord> {
    let mut history = Vec::new();

    for round in 1..=state.round() {
        if let Some(night) = state.night_outcomes().iter().find(|n| n.round == round) {
            history.extend(night.deaths.iter().map(|d| PublicRecord::Death {
                round,
                agent: d.agent.clone(),
                kind: d.cause.into(),
            }));
        }

        let speeches = state.speeches().iter().filter(|s| s.round == round);
        history.extend(
            speeches
                .clone()
                .filter(|s| s.phase != Phase::VoteResolution)
                .cloned()
                .map(PublicRecord::Speech),
        );

        if let Some(day) = state.day_outcomes().iter().find(|d| d.round == round) {
            for vote in std::iter::once(&day.vote).chain(day.runoff.iter()) {
                history.push(PublicRecord::Votes {
                    round,
                    ballots: vote.tally.ballots.clone(),
                    eliminated: vote.eliminated().cloned(),
                    runoff: vote.runoff,
                });
            }
            history.extend(day.deaths.iter().map(|d| PublicRecord::Death {
                round,
                agent: d.agent.clone(),
                kind: d.cause.into(),
            }));
        }

        history.extend(
            speeches
                .filter(|s| s.phase == Phase::VoteResolution)
                .cloned()
                .map(PublicRecord::Speech),
        );
    }

    history
}
