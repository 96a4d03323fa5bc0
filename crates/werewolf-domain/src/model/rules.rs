//! Rules - Table rules fixed at setup

/// What happens when the top of a vote is tied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TiePolicy {
    /// Nobody is eliminated this round
    #[default]
    NoElimination,
    /// One more vote between the tied candidates. Agents who abstained in
    /// the first vote sit it out. A second tie eliminates nobody.
    Runoff,
}

/// Order in which living agents speak during Discussion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeakingOrder {
    /// Always from the lowest living seat upwards
    #[default]
    Seating,
    /// Living agents in seat order, starting one further along each round
    Rotating,
}

/// Rule set of a game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rules {
    pub tie_policy: TiePolicy,
    pub speaking_order: SpeakingOrder,
    /// Number of speaking passes per day
    pub discussion_rounds: u32,
    /// When false, werewolves only meet on night one
    pub first_night_kill: bool,
    /// When false, a guard cannot shield the same agent two nights running
    pub guard_repeat_target: bool,
    /// Guard and witch both covering the victim cancel out and the victim dies
    pub double_protection_kills: bool,
    /// A poisoned agent loses its retaliation
    pub poison_suppresses_retaliation: bool,
    /// Werewolves also win once they are at least as many as everyone else
    pub werewolf_parity_win: bool,
    /// Agents voted out, or killed on the first night, get a final utterance
    pub last_words: bool,
    /// How many times an invalid ballot is re-requested before it counts as abstain
    pub max_vote_attempts: u32,
    /// The game stops without a winner after this many rounds
    pub max_rounds: u32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            tie_policy: TiePolicy::NoElimination,
            speaking_order: SpeakingOrder::Seating,
            discussion_rounds: 1,
            first_night_kill: true,
            guard_repeat_target: true,
            double_protection_kills: true,
            poison_suppresses_retaliation: true,
            werewolf_parity_win: false,
            last_words: false,
            max_vote_attempts: 1,
            max_rounds: 30,
        }
    }
}
