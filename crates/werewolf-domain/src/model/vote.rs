//! Votes, tallies and vote outcomes

use std::collections::BTreeMap;

use super::agent::AgentId;

/// What a voter put in the box
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ballot {
    For(AgentId),
    Abstain,
}

/// One vote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub voter: AgentId,
    pub ballot: Ballot,
}

impl Vote {
    pub fn for_target(voter: impl Into<AgentId>, target: impl Into<AgentId>) -> Self {
        Self {
            voter: voter.into(),
            ballot: Ballot::For(target.into()),
        }
    }

    pub fn abstain(voter: impl Into<AgentId>) -> Self {
        Self {
            voter: voter.into(),
            ballot: Ballot::Abstain,
        }
    }
}

/// Why a ballot did not count as cast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteRejection {
    /// The voter is dead or not in the game; the ballot is dropped
    VoterNotEligible,
    /// Second ballot from the same voter; dropped
    DuplicateVoter,
    /// Target is dead or unknown; counted as abstain
    TargetNotEligible,
    /// Counted as abstain
    SelfVote,
    /// Runoff ballot for someone who is not a candidate; counted as abstain
    NotACandidate,
}

impl VoteRejection {
    pub fn description(&self) -> &'static str {
        match self {
            VoteRejection::VoterNotEligible => "voter is not eligible",
            VoteRejection::DuplicateVoter => "voter already voted",
            VoteRejection::TargetNotEligible => "target is not a living agent",
            VoteRejection::SelfVote => "cannot vote for self",
            VoteRejection::NotACandidate => "target is not a runoff candidate",
        }
    }
}

impl core::fmt::Display for VoteRejection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Full count of a vote, kept for audit
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VoteTally {
    /// Votes received per target (targets with zero votes are absent)
    pub counts: BTreeMap<AgentId, u32>,
    pub abstentions: u32,
    /// Ballots as counted, in voter seat order
    pub ballots: Vec<Vote>,
    pub rejected: Vec<(AgentId, VoteRejection)>,
}

impl VoteTally {
    /// Number of votes cast for a target
    pub fn votes_for(&self, target: &AgentId) -> u32 {
        self.counts.get(target).copied().unwrap_or(0)
    }

    /// Votes cast for someone plus abstentions
    pub fn total(&self) -> u32 {
        self.counts.values().sum::<u32>() + self.abstentions
    }

    pub fn top_count(&self) -> u32 {
        self.counts.values().copied().max().unwrap_or(0)
    }

    /// Everyone sharing the highest count
    pub fn leaders(&self) -> Vec<AgentId> {
        let top = self.top_count();
        if top == 0 {
            return Vec::new();
        }
        self.counts
            .iter()
            .filter(|(_, count)| **count == top)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Voters who cast a ballot for someone
    pub fn participants(&self) -> Vec<AgentId> {
        self.ballots
            .iter()
            .filter(|v| matches!(v.ballot, Ballot::For(_)))
            .map(|v| v.voter.clone())
            .collect()
    }
}

/// What the vote decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteDecision {
    Eliminate(AgentId),
    NoElimination,
    /// The top was tied and the runoff policy applies
    Runoff(Vec<AgentId>),
}

/// Vote outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteOutcome {
    pub tally: VoteTally,
    pub decision: VoteDecision,
    /// Set on the outcome of a runoff
    pub runoff: bool,
}

impl VoteOutcome {
    pub fn eliminated(&self) -> Option<&AgentId> {
        match &self.decision {
            VoteDecision::Eliminate(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_tie(&self) -> bool {
        self.tally.leaders().len() > 1
    }
}
