//! Vote Tally - Turn a box of ballots into an elimination
//!
//! With one ballot per voter, the order ballots arrive in never changes the
//! result. Every eligible voter ends up with exactly one counted ballot;
//! missing and invalid ballots count as abstentions.

use std::collections::BTreeSet;

use crate::model::agent::AgentId;
use crate::model::rules::TiePolicy;
use crate::model::vote::{Ballot, Vote, VoteDecision, VoteOutcome, VoteRejection, VoteTally};

pub struct VoteCounter;

impl VoteCounter {
    pub fn new() -> Self {
        Self
    }

    /// Count a regular vote
    ///
    /// `living` is in seating order. A tie at the top either eliminates
    /// nobody or asks for a runoff between the tied agents, per `policy`.
    pub fn tally(&self, votes: &[Vote], living: &[AgentId], policy: TiePolicy) -> VoteOutcome {
        let tally = count(votes, living, living, VoteRejection::TargetNotEligible);
        let leaders = in_seat_order(tally.leaders(), living);

        let decision = match leaders.len() {
            0 => VoteDecision::NoElimination,
            1 => VoteDecision::Eliminate(leaders[0].clone()),
            _ => match policy {
                TiePolicy::NoElimination => VoteDecision::NoElimination,
                TiePolicy::Runoff => VoteDecision::Runoff(leaders),
            },
        };

        VoteOutcome {
            tally,
            decision,
            runoff: false,
        }
    }

    /// Count a runoff between tied candidates
    ///
    /// Only `eligible` agents vote (those who did not abstain the first
    /// time) and only candidates can receive votes. A second tie ends
    /// with no elimination.
    pub fn tally_runoff(
        &self,
        votes: &[Vote],
        eligible: &[AgentId],
        candidates: &[AgentId],
    ) -> VoteOutcome {
        let tally = count(votes, eligible, candidates, VoteRejection::NotACandidate);
        let leaders = tally.leaders();

        let decision = if leaders.len() == 1 {
            VoteDecision::Eliminate(leaders[0].clone())
        } else {
            VoteDecision::NoElimination
        };

        VoteOutcome {
            tally,
            decision,
            runoff: true,
        }
    }
}

impl Default for VoteCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// One counted ballot per voter, in voter order. Ballots for anyone
/// outside `targets` become abstentions rejected with `miss`.
fn count(
    votes: &[Vote],
    voters: &[AgentId],
    targets: &[AgentId],
    miss: VoteRejection,
) -> VoteTally {
    let mut tally = VoteTally::default();
    let mut cast: Vec<Option<Ballot>> = vec![None; voters.len()];
    let mut seen = BTreeSet::new();

    for vote in votes {
        let Some(position) = voters.iter().position(|v| v == &vote.voter) else {
            tally
                .rejected
                .push((vote.voter.clone(), VoteRejection::VoterNotEligible));
            continue;
        };
        if !seen.insert(&vote.voter) {
            tally
                .rejected
                .push((vote.voter.clone(), VoteRejection::DuplicateVoter));
            continue;
        }

        let ballot = match &vote.ballot {
            Ballot::Abstain => Ballot::Abstain,
            Ballot::For(target) if target == &vote.voter => {
                tally
                    .rejected
                    .push((vote.voter.clone(), VoteRejection::SelfVote));
                Ballot::Abstain
            }
            Ballot::For(target) if !targets.contains(target) => {
                tally.rejected.push((vote.voter.clone(), miss));
                Ballot::Abstain
            }
            Ballot::For(target) => Ballot::For(target.clone()),
        };
        cast[position] = Some(ballot);
    }

    for (voter, ballot) in voters.iter().zip(cast) {
        let ballot = ballot.unwrap_or(Ballot::Abstain);
        match &ballot {
            Ballot::For(target) => *tally.counts.entry(target.clone()).or_insert(0) += 1,
            Ballot::Abstain => tally.abstentions += 1,
        }
        tally.ballots.push(Vote {
            voter: voter.clone(),
            ballot,
        });
    }

    tally
}

fn in_seat_order(mut ids: Vec<AgentId>, seating: &[AgentId]) -> Vec<AgentId> {
    ids.sort_by_key(|id| seating.iter().position(|s| s == id).unwrap_or(usize::MAX));
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<AgentId> {
        names.iter().map(|n| AgentId::new(*n)).collect()
    }

    #[test]
    fn test_strict_majority_eliminates() {
        let living = ids(&["a", "b", "c", "d"]);
        let votes = vec![
            Vote::for_target("a", "b"),
            Vote::for_target("c", "b"),
            Vote::for_target("b", "a"),
            Vote::abstain("d"),
        ];

        let outcome = VoteCounter::new().tally(&votes, &living, TiePolicy::NoElimination);

        assert_eq!(outcome.decision, VoteDecision::Eliminate(AgentId::new("b")));
        assert_eq!(outcome.tally.votes_for(&AgentId::new("b")), 2);
        assert_eq!(outcome.tally.total(), 4);
        assert!(!outcome.is_tie());
    }

    #[test]
    fn test_two_way_tie_no_elimination() {
        // {B, B, C, C, abstain}
        let living = ids(&["a", "b", "c", "d", "e"]);
        let votes = vec![
            Vote::for_target("a", "b"),
            Vote::for_target("c", "b"),
            Vote::for_target("b", "c"),
            Vote::for_target("d", "c"),
            Vote::abstain("e"),
        ];

        let outcome = VoteCounter::new().tally(&votes, &living, TiePolicy::NoElimination);

        assert_eq!(outcome.decision, VoteDecision::NoElimination);
        assert!(outcome.is_tie());
        assert_eq!(outcome.eliminated(), None);
        assert_eq!(outcome.tally.abstentions, 1);
    }

    #[test]
    fn test_tie_asks_for_runoff_in_seat_order() {
        let living = ids(&["a", "b", "c", "d", "e"]);
        let votes = vec![
            Vote::for_target("a", "c"),
            Vote::for_target("b", "c"),
            Vote::for_target("c", "b"),
            Vote::for_target("d", "b"),
        ];

        let outcome = VoteCounter::new().tally(&votes, &living, TiePolicy::Runoff);

        assert_eq!(outcome.decision, VoteDecision::Runoff(ids(&["b", "c"])));
        // e never voted
        assert_eq!(outcome.tally.participants(), ids(&["a", "b", "c", "d"]));
    }

    #[test]
    fn test_missing_and_invalid_votes_count_as_abstain() {
        let living = ids(&["a", "b", "c"]);
        let votes = vec![
            Vote::for_target("a", "a"),
            Vote::for_target("b", "ghost"),
            Vote::for_target("ghost", "a"),
            Vote::for_target("b", "c"),
        ];

        let outcome = VoteCounter::new().tally(&votes, &living, TiePolicy::NoElimination);

        assert_eq!(outcome.tally.abstentions, 3);
        assert_eq!(outcome.tally.total() as usize, living.len());
        assert_eq!(outcome.decision, VoteDecision::NoElimination);
        assert_eq!(
            outcome.tally.rejected,
            vec![
                (AgentId::new("a"), VoteRejection::SelfVote),
                (AgentId::new("b"), VoteRejection::TargetNotEligible),
                (AgentId::new("ghost"), VoteRejection::VoterNotEligible),
                (AgentId::new("b"), VoteRejection::DuplicateVoter),
            ]
        );
    }

    #[test]
    fn test_sum_of_counts_equals_living() {
        let living = ids(&["a", "b", "c", "d", "e", "f"]);
        let votes = vec![
            Vote::for_target("a", "b"),
            Vote::for_target("b", "c"),
            Vote::for_target("c", "a"),
            Vote::abstain("d"),
            Vote::for_target("f", "b"),
        ];

        let outcome = VoteCounter::new().tally(&votes, &living, TiePolicy::NoElimination);
        let counted: u32 = outcome.tally.counts.values().sum();

        assert_eq!((counted + outcome.tally.abstentions) as usize, living.len());
        assert_eq!(outcome.tally.ballots.len(), living.len());
        // b strictly exceeds everyone else
        let top = outcome.tally.votes_for(&AgentId::new("b"));
        assert!(outcome
            .tally
            .counts
            .iter()
            .filter(|(id, _)| id.as_str() != "b")
            .all(|(_, count)| *count < top));
        assert_eq!(outcome.eliminated(), Some(&AgentId::new("b")));
    }

    #[test]
    fn test_order_of_ballots_does_not_matter() {
        let living = ids(&["a", "b", "c", "d"]);
        let mut votes = vec![
            Vote::for_target("a", "c"),
            Vote::for_target("b", "c"),
            Vote::for_target("c", "d"),
            Vote::abstain("d"),
        ];
        let counter = VoteCounter::new();
        let forward = counter.tally(&votes, &living, TiePolicy::NoElimination);
        votes.reverse();
        let backward = counter.tally(&votes, &living, TiePolicy::NoElimination);

        assert_eq!(forward, backward);
    }

    #[test]
    fn test_runoff() {
        let eligible = ids(&["a", "b", "c", "d"]);
        let candidates = ids(&["b", "c"]);
        let votes = vec![
            Vote::for_target("a", "b"),
            Vote::for_target("b", "c"),
            Vote::for_target("c", "b"),
            Vote::for_target("d", "a"),
            Vote::for_target("e", "b"),
        ];

        let outcome = VoteCounter::new().tally_runoff(&votes, &eligible, &candidates);

        assert!(outcome.runoff);
        assert_eq!(outcome.decision, VoteDecision::Eliminate(AgentId::new("b")));
        assert!(outcome
            .tally
            .rejected
            .contains(&(AgentId::new("d"), VoteRejection::NotACandidate)));
        assert!(outcome
            .tally
            .rejected
            .contains(&(AgentId::new("e"), VoteRejection::VoterNotEligible)));
    }

    #[test]
    fn test_runoff_tie_eliminates_nobody() {
        let eligible = ids(&["a", "b"]);
        let candidates = ids(&["a", "b"]);
        let votes = vec![Vote::for_target("a", "b"), Vote::for_target("b", "a")];

        let outcome = VoteCounter::new().tally_runoff(&votes, &eligible, &candidates);

        assert_eq!(outcome.decision, VoteDecision::NoElimination);
    }
}
