//! Night actions and why they get rejected

use super::agent::AgentId;
use super::role::Ability;

/// What a decision maker asks to do tonight.
///
/// The controller stamps the actor, so an agent can never act on
/// someone else's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
    pub ability: Ability,
    pub target: Option<AgentId>,
}

impl Intent {
    pub fn new(ability: Ability, target: impl Into<AgentId>) -> Self {
        Self {
            ability,
            target: Some(target.into()),
        }
    }
}

/// A submitted night action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NightAction {
    pub actor: AgentId,
    pub ability: Ability,
    pub target: Option<AgentId>,
}

impl NightAction {
    pub fn new(actor: impl Into<AgentId>, ability: Ability, target: impl Into<AgentId>) -> Self {
        Self {
            actor: actor.into(),
            ability,
            target: Some(target.into()),
        }
    }

    pub fn from_intent(actor: AgentId, intent: Intent) -> Self {
        Self {
            actor,
            ability: intent.ability,
            target: intent.target,
        }
    }
}

/// Reasons an action is treated as a no-op
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    UnknownActor,
    ActorDead,
    MissingAbility,
    NotANightAbility,
    UsageExhausted,
    MissingTarget,
    UnknownTarget,
    TargetDead,
    SelfTarget,
    FactionMate,
    /// Guard shielding the same agent two nights running
    RepeatProtect,
    /// The same actor used the same ability twice tonight
    DuplicateAction,
    /// Only one poison resolves per night
    NightLimitReached,
    SaveAndPoisonSameTarget,
    /// Werewolves do not kill on the first night under these rules
    NoKillTonight,
    /// Retaliation after a suppressing death (poison)
    Suppressed,
}

impl InvalidReason {
    pub fn description(&self) -> &'static str {
        match self {
            InvalidReason::UnknownActor => "actor is not part of this game",
            InvalidReason::ActorDead => "actor is dead",
            InvalidReason::MissingAbility => "actor's role lacks this ability",
            InvalidReason::NotANightAbility => "ability cannot be used at night",
            InvalidReason::UsageExhausted => "usage limit exhausted",
            InvalidReason::MissingTarget => "ability needs a target",
            InvalidReason::UnknownTarget => "target is not part of this game",
            InvalidReason::TargetDead => "target is not alive",
            InvalidReason::SelfTarget => "cannot target self",
            InvalidReason::FactionMate => "cannot target a faction mate",
            InvalidReason::RepeatProtect => "cannot protect the same agent two nights in a row",
            InvalidReason::DuplicateAction => "ability already used tonight",
            InvalidReason::NightLimitReached => "another poison already resolves tonight",
            InvalidReason::SaveAndPoisonSameTarget => "save and poison on the same target",
            InvalidReason::NoKillTonight => "no kill on the first night",
            InvalidReason::Suppressed => "retaliation suppressed by cause of death",
        }
    }
}

impl core::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// An action that was rejected and treated as a no-op
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidAction {
    pub actor: AgentId,
    pub ability: Ability,
    pub target: Option<AgentId>,
    pub reason: InvalidReason,
}

impl InvalidAction {
    pub fn new(action: &NightAction, reason: InvalidReason) -> Self {
        Self {
            actor: action.actor.clone(),
            ability: action.ability,
            target: action.target.clone(),
            reason,
        }
    }
}

impl core::fmt::Display for InvalidAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.target {
            Some(target) => write!(
                f,
                "Invalid action: {} {} {}: {}",
                self.actor, self.ability, target, self.reason
            ),
            None => write!(f, "Invalid action: {} {}: {}", self.actor, self.ability, self.reason),
        }
    }
}
