//! Werewolf CLI - Command-line edge of the engine

pub mod agents;
pub mod commands;
