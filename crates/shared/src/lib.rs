//! # Werewolf Shared
//!
//! Configuration loading and the error taxonomy used across the engine
//! and the CLI.

pub mod config;
pub mod error;

// Re-exports
pub use config::*;
pub use error::*;
