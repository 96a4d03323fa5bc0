//! # Werewolf Audit
//!
//! Ordered, structured journal of a game for transcripts and statistics.

mod event_log;

pub use event_log::{EventEntry, EventLog, EventStats, EventType};
