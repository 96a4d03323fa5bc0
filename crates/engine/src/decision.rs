//! Decision Maker - The port through which agents play
//!
//! One decision maker drives each agent: a human prompt, a script, a
//! language model. The controller only ever hands it an [`AgentView`], so
//! whatever sits behind the trait sees exactly what its agent may see.

use async_trait::async_trait;
use thiserror::Error;
use werewolf_domain::{AgentId, AgentView, Ballot, Intent};

/// Failure reported by a decision maker
///
/// The controller never propagates these: the agent gets a default
/// decision and the failure is logged.
#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("decision maker unavailable: {0}")]
    Unavailable(String),

    #[error("malformed decision: {0}")]
    Malformed(String),

    #[error("{0}")]
    Other(String),
}

/// Decision Maker Trait
///
/// This is a PORT in hexagonal architecture. Requests may run concurrently
/// (night actions, votes), so implementations must be shareable.
#[async_trait]
pub trait DecisionMaker: Send + Sync {
    /// Night abilities to use. An empty list means no action.
    async fn night_action(&self, view: AgentView) -> Result<Vec<Intent>, DecisionError>;

    /// Ballot for the current vote; `view.candidates` lists valid targets
    async fn vote(&self, view: AgentView) -> Result<Ballot, DecisionError>;

    /// Something to say. `view.speaking` tells discussion from last words.
    async fn utterance(&self, view: AgentView) -> Result<String, DecisionError>;

    /// Target of a retaliation on death, or `None` to pass
    async fn retaliate(&self, view: AgentView) -> Result<Option<AgentId>, DecisionError> {
        let _ = view;
        Ok(None)
    }
}
