//! Phase - The state machine of a round
//!
//! ```text
//! Setup → Night → NightResolution → DayAnnouncement → Discussion
//!       → Voting → VoteResolution → Night ...
//! ```
//!
//! Transitions are strictly sequential. The only jump allowed is to
//! `Terminated`, which a win check may trigger from any phase.

/// A phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Setup,
    Night,
    NightResolution,
    DayAnnouncement,
    Discussion,
    Voting,
    VoteResolution,
    Terminated,
}

impl Phase {
    /// The phase that normally follows this one
    pub fn successor(&self) -> Option<Phase> {
        match self {
            Phase::Setup => Some(Phase::Night),
            Phase::Night => Some(Phase::NightResolution),
            Phase::NightResolution => Some(Phase::DayAnnouncement),
            Phase::DayAnnouncement => Some(Phase::Discussion),
            Phase::Discussion => Some(Phase::Voting),
            Phase::Voting => Some(Phase::VoteResolution),
            Phase::VoteResolution => Some(Phase::Night),
            Phase::Terminated => None,
        }
    }

    pub fn can_transition_to(&self, next: Phase) -> bool {
        if *self == Phase::Terminated {
            return false;
        }
        next == Phase::Terminated || self.successor() == Some(next)
    }

    /// Whether agents are asked for decisions in this phase
    pub fn requires_input(&self) -> bool {
        matches!(self, Phase::Night | Phase::Discussion | Phase::Voting)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Phase::Setup => "Setup",
            Phase::Night => "Night",
            Phase::NightResolution => "NightResolution",
            Phase::DayAnnouncement => "DayAnnouncement",
            Phase::Discussion => "Discussion",
            Phase::Voting => "Voting",
            Phase::VoteResolution => "VoteResolution",
            Phase::Terminated => "Terminated",
        }
    }
}

impl core::fmt::Display for Phase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// An illegal phase transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseError {
    pub from: Phase,
    pub to: Phase,
}

impl core::fmt::Display for PhaseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Invalid phase transition: {} -> {}", self.from, self.to)
    }
}
