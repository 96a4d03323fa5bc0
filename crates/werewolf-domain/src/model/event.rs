//! Events emitted by the controller
//!
//! These are used for logging, transcripts and statistics.
//! The engine itself never reads them back - it just reports what
//! happened, in order.

use super::action::InvalidAction;
use super::agent::{AgentId, DeathCause};
use super::outcome::RevealInfo;
use super::phase::Phase;
use super::role::Faction;
use super::vote::VoteRejection;

/// Why a default decision was substituted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultReason {
    Timeout,
    Error(String),
}

impl core::fmt::Display for DefaultReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DefaultReason::Timeout => write!(f, "decision timed out"),
            DefaultReason::Error(message) => write!(f, "decision failed: {}", message),
        }
    }
}

/// A structured game event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    GameStarted {
        agents: usize,
    },
    PhaseEntered {
        round: u32,
        phase: Phase,
    },
    /// A night action or retaliation was treated as a no-op
    ActionRejected {
        round: u32,
        action: InvalidAction,
    },
    /// Night actions were resolved into deaths (in order)
    NightResolved {
        round: u32,
        deaths: Vec<AgentId>,
        rejected: usize,
    },
    /// The werewolves' victim survived behind a shield
    Protected {
        round: u32,
        agent: AgentId,
    },
    /// The werewolves' victim survived thanks to a save
    Saved {
        round: u32,
        agent: AgentId,
    },
    /// Shield and save on the same victim cancelled out
    DoubleProtection {
        round: u32,
        agent: AgentId,
    },
    /// Private information handed to one agent
    Reveal {
        round: u32,
        to: AgentId,
        target: AgentId,
        info: RevealInfo,
    },
    Death {
        round: u32,
        agent: AgentId,
        cause: DeathCause,
        by: Option<AgentId>,
    },
    RetaliationTriggered {
        round: u32,
        agent: AgentId,
    },
    Utterance {
        round: u32,
        speaker: AgentId,
        text: String,
    },
    LastWords {
        round: u32,
        speaker: AgentId,
        text: String,
    },
    VoteRejected {
        round: u32,
        voter: AgentId,
        reason: VoteRejection,
    },
    VoteTallied {
        round: u32,
        counts: Vec<(AgentId, u32)>,
        abstentions: u32,
        eliminated: Option<AgentId>,
        runoff: bool,
    },
    RunoffStarted {
        round: u32,
        candidates: Vec<AgentId>,
    },
    DecisionDefaulted {
        round: u32,
        phase: Phase,
        agent: AgentId,
        reason: DefaultReason,
    },
    /// `winner` is `None` when the round cap ended the game
    GameOver {
        round: u32,
        winner: Option<Faction>,
    },
}

impl GameEvent {
    pub fn round(&self) -> u32 {
        match self {
            GameEvent::GameStarted { .. } => 0,
            GameEvent::PhaseEntered { round, .. }
            | GameEvent::ActionRejected { round, .. }
            | GameEvent::NightResolved { round, .. }
            | GameEvent::Protected { round, .. }
            | GameEvent::Saved { round, .. }
            | GameEvent::DoubleProtection { round, .. }
            | GameEvent::Reveal { round, .. }
            | GameEvent::Death { round, .. }
            | GameEvent::RetaliationTriggered { round, .. }
            | GameEvent::Utterance { round, .. }
            | GameEvent::LastWords { round, .. }
            | GameEvent::VoteRejected { round, .. }
            | GameEvent::VoteTallied { round, .. }
            | GameEvent::RunoffStarted { round, .. }
            | GameEvent::DecisionDefaulted { round, .. }
            | GameEvent::GameOver { round, .. } => *round,
        }
    }

    /// Short snake_case name of the event
    pub fn kind(&self) -> &'static str {
        match self {
            GameEvent::GameStarted { .. } => "game_started",
            GameEvent::PhaseEntered { .. } => "phase_entered",
            GameEvent::ActionRejected { .. } => "action_rejected",
            GameEvent::NightResolved { .. } => "night_resolved",
            GameEvent::Protected { .. } => "protected",
            GameEvent::Saved { .. } => "saved",
            GameEvent::DoubleProtection { .. } => "double_protection",
            GameEvent::Reveal { .. } => "reveal",
            GameEvent::Death { .. } => "death",
            GameEvent::RetaliationTriggered { .. } => "retaliation_triggered",
            GameEvent::Utterance { .. } => "utterance",
            GameEvent::LastWords { .. } => "last_words",
            GameEvent::VoteRejected { .. } => "vote_rejected",
            GameEvent::VoteTallied { .. } => "vote_tallied",
            GameEvent::RunoffStarted { .. } => "runoff_started",
            GameEvent::DecisionDefaulted { .. } => "decision_defaulted",
            GameEvent::GameOver { .. } => "game_over",
        }
    }

    /// The agent the event is mainly about
    pub fn agent(&self) -> Option<&AgentId> {
        match self {
            GameEvent::ActionRejected { action, .. } => Some(&action.actor),
            GameEvent::Protected { agent, .. }
            | GameEvent::Saved { agent, .. }
            | GameEvent::DoubleProtection { agent, .. }
            | GameEvent::Death { agent, .. }
            | GameEvent::RetaliationTriggered { agent, .. }
            | GameEvent::DecisionDefaulted { agent, .. } => Some(agent),
            GameEvent::Reveal { to, .. } => Some(to),
            GameEvent::Utterance { speaker, .. } | GameEvent::LastWords { speaker, .. } => {
                Some(speaker)
            }
            GameEvent::VoteRejected { voter, .. } => Some(voter),
            _ => None,
        }
    }

    /// Errors the engine recovered from (no-op actions, defaults)
    pub fn is_recovered_error(&self) -> bool {
        matches!(
            self,
            GameEvent::ActionRejected { .. }
                | GameEvent::VoteRejected { .. }
                | GameEvent::DecisionDefaulted { .. }
        )
    }

    /// Whether every agent may see this event
    pub fn is_public(&self) -> bool {
        !matches!(
            self,
            GameEvent::ActionRejected { .. }
                | GameEvent::Protected { .. }
                | GameEvent::Saved { .. }
                | GameEvent::DoubleProtection { .. }
                | GameEvent::Reveal { .. }
                | GameEvent::DecisionDefaulted { .. }
        )
    }
}
