//! # Werewolf Domain Layer
//!
//! The rulebook of the game - pure logic with zero external dependencies.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Domain Layer (This Crate)                     │
//! │  ┌─────────────────────────────────────────────────────────────┐│
//! │  │  model/   - Agents, roles, actions, votes, outcomes, state  ││
//! │  │  service/ - Registry, resolver, tally, win evaluator        ││
//! │  └─────────────────────────────────────────────────────────────┘│
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Golden Rule
//!
//! **This crate has ZERO external dependencies and performs no I/O.**
//!
//! Every service is a function over a [`GameState`] snapshot that returns an
//! outcome. Only the controller in the `engine` crate applies outcomes, so
//! the same sequence of decisions always produces the same game.

pub mod model;
pub mod service;

// Re-export commonly used types
pub use model::{
    action::{Intent, InvalidAction, InvalidReason, NightAction},
    agent::{Agent, AgentId, Death, DeathCause},
    event::{DefaultReason, GameEvent},
    outcome::{DayOutcome, NightFate, NightOutcome, Reveal, RevealInfo},
    phase::{Phase, PhaseError},
    role::{Ability, Capabilities, Faction, IndependentGoal, RevealPolicy, Role, UsageLimit},
    rules::{Rules, SpeakingOrder, TiePolicy},
    state::{GameSetup, GameState, InvariantViolation, PlayerSpec, SetupError, Speech, SpeechKind},
    view::{AgentView, PublicDeathKind, PublicRecord, SeatInfo},
    vote::{Ballot, Vote, VoteDecision, VoteOutcome, VoteRejection, VoteTally},
};

pub use service::{
    registry::{RoleRegistry, UnknownRole},
    resolver::ActionResolver,
    tally::VoteCounter,
    win::{WinEvaluator, WinResult},
};
