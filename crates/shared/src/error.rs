//! Error types for the werewolf engine

use thiserror::Error;
use werewolf_domain::{AgentId, InvalidAction, InvariantViolation, Phase, PhaseError, SetupError};

/// Error thrown when a configured role is not registered
#[derive(Debug, Error)]
#[error("Role '{role_id}' not found. Available roles: {}", available_roles.join(", "))]
pub struct RoleNotFoundError {
    pub role_id: String,
    pub available_roles: Vec<String>,
}

/// Problems found while loading or validating a configuration.
/// Always raised at Setup, never once a game runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unsupported config format '{0}' (expected .yaml, .yml or .json)")]
    UnsupportedFormat(String),

    #[error(transparent)]
    RoleNotFound(#[from] RoleNotFoundError),

    #[error("Unknown ability '{ability}' for role '{role}'")]
    UnknownAbility { role: String, ability: String },

    #[error("Invalid setup: {0}")]
    Setup(SetupError),

    #[error("Configuration error: {0}")]
    Invalid(String),
}

impl From<SetupError> for ConfigError {
    fn from(err: SetupError) -> Self {
        ConfigError::Setup(err)
    }
}

/// Engine-wide error taxonomy
///
/// Only `Configuration` and `InternalInvariantViolation` halt a game; the
/// other two are recovered from and end up in the event log.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("{0}")]
    InvalidAction(InvalidAction),

    #[error("Decision of {agent} timed out in {phase} (round {round})")]
    DecisionTimeout { agent: AgentId, phase: Phase, round: u32 },

    #[error("Internal invariant violation: {0}")]
    InternalInvariantViolation(String),
}

impl EngineError {
    /// Whether this error stops the game
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::Configuration(_) | EngineError::InternalInvariantViolation(_)
        )
    }
}

impl From<InvalidAction> for EngineError {
    fn from(err: InvalidAction) -> Self {
        EngineError::InvalidAction(err)
    }
}

impl From<InvariantViolation> for EngineError {
    fn from(err: InvariantViolation) -> Self {
        EngineError::InternalInvariantViolation(err.0)
    }
}

impl From<PhaseError> for EngineError {
    fn from(err: PhaseError) -> Self {
        EngineError::InternalInvariantViolation(err.to_string())
    }
}

impl From<SetupError> for EngineError {
    fn from(err: SetupError) -> Self {
        EngineError::Configuration(ConfigError::Setup(err))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
