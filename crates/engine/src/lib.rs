//! # Werewolf Engine
//!
//! The game controller: owns the [`GameState`](werewolf_domain::GameState),
//! drives the phase cycle, asks each agent's [`DecisionMaker`] for its
//! moves under a time limit and applies what the domain services resolve.
//!
//! ```text
//! Night ──(concurrent requests)──> ActionResolver ──> apply ──> win check
//!   └─> Day: last words, discussion (sequential), vote ──> VoteCounter ──> apply ──> win check
//! ```

pub mod controller;
pub mod decision;
pub mod scripted;
pub mod timing;

pub use controller::{GameController, GameReport};
pub use decision::{DecisionError, DecisionMaker};
pub use scripted::{Call, ScriptedDecisionMaker};
pub use timing::{Request, TimeLimits};
