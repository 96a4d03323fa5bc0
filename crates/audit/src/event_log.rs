//! EventLog - Journal of one game

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::VecDeque;
use werewolf_domain::{Faction, GameEvent, Phase};

/// One row of the journal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEntry {
    pub timestamp: String,
    pub game_id: String,
    /// Position in the game, starting at 0
    pub sequence: u64,
    pub round: u32,
    pub phase: String,
    pub event_type: EventType,
    pub agent: Option<String>,
    pub target: Option<String>,
    /// Visible to every agent during the game
    pub public: bool,
    /// False for errors the engine recovered from
    pub success: bool,
    pub reason: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Types of game events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    GameStarted,
    PhaseEntered,
    ActionRejected,
    NightResolved,
    Protected,
    Saved,
    DoubleProtection,
    Reveal,
    Death,
    RetaliationTriggered,
    Utterance,
    LastWords,
    VoteRejected,
    VoteTallied,
    RunoffStarted,
    DecisionDefaulted,
    GameOver,
}

/// Event log of a single game
#[derive(Debug)]
pub struct EventLog {
    game_id: String,
    entries: VecDeque<EventEntry>,
    max_entries: usize,
    next_sequence: u64,
    phase: Phase,
}

impl EventLog {
    /// Create a log with a fresh game id
    pub fn new(max_entries: usize) -> Self {
        Self::with_game_id(uuid::Uuid::new_v4().to_string(), max_entries)
    }

    /// Create a log that keeps every entry of the game
    pub fn unbounded() -> Self {
        Self::new(usize::MAX)
    }

    pub fn with_game_id(game_id: impl Into<String>, max_entries: usize) -> Self {
        Self {
            game_id: game_id.into(),
            entries: VecDeque::with_capacity(max_entries.min(1024)),
            max_entries,
            next_sequence: 0,
            phase: Phase::Setup,
        }
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    /// Append an entry, dropping the oldest one when full
    pub fn log(&mut self, entry: EventEntry) {
        if self.entries.len() >= self.max_entries {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Record a game event
    pub fn record(&mut self, event: &GameEvent) {
        if let GameEvent::PhaseEntered { phase, .. } = event {
            self.phase = *phase;
        }
        let phase = match event {
            GameEvent::DecisionDefaulted { phase, .. } => *phase,
            _ => self.phase,
        };

        let (event_type, target, reason, metadata) = describe(event);
        let entry = EventEntry {
            timestamp: chrono::Utc::now().to_rfc3339(),
            game_id: self.game_id.clone(),
            sequence: self.next_sequence,
            round: event.round(),
            phase: phase.to_string(),
            event_type,
            agent: event.agent().map(|a| a.to_string()),
            target,
            public: event.is_public(),
            success: !event.is_recovered_error(),
            reason,
            metadata,
        };
        self.next_sequence += 1;
        self.log(entry);
    }

    pub fn entries(&self) -> impl Iterator<Item = &EventEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get recent entries, newest first
    pub fn recent(&self, limit: usize) -> Vec<&EventEntry> {
        self.entries.iter().rev().take(limit).collect()
    }

    /// Get recent recovered errors (rejected actions and ballots, defaults)
    pub fn recovered_errors(&self, limit: usize) -> Vec<&EventEntry> {
        self.entries
            .iter()
            .rev()
            .filter(|e| !e.success)
            .take(limit)
            .collect()
    }

    /// Get statistics
    pub fn stats(&self) -> EventStats {
        let count = |kind: EventType| self.entries.iter().filter(|e| e.event_type == kind).count();
        let winner = self
            .entries
            .iter()
            .rev()
            .find(|e| e.event_type == EventType::GameOver)
            .and_then(|e| e.target.clone());

        EventStats {
            total_entries: self.entries.len(),
            recovered_errors: self.entries.iter().filter(|e| !e.success).count(),
            deaths: count(EventType::Death),
            defaults: count(EventType::DecisionDefaulted),
            rounds: self.entries.iter().map(|e| e.round).max().unwrap_or(0),
            winner,
        }
    }

    /// Export as JSON
    pub fn export_json(&self) -> serde_json::Value {
        serde_json::to_value(self.entries.iter().collect::<Vec<_>>()).unwrap_or_default()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Log statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventStats {
    pub total_entries: usize,
    pub recovered_errors: usize,
    pub deaths: usize,
    pub defaults: usize,
    pub rounds: u32,
    /// Winning faction, `"none"` for a capped game, absent while running
    pub winner: Option<String>,
}

type Described = (
    EventType,
    Option<String>,
    Option<String>,
    Option<serde_json::Value>,
);

/// Event type, target, reason and metadata of an event
fn describe(event: &GameEvent) -> Described {
    match event {
        GameEvent::GameStarted { agents } => (
            EventType::GameStarted,
            None,
            None,
            Some(json!({ "agents": agents })),
        ),
        GameEvent::PhaseEntered { .. } => (EventType::PhaseEntered, None, None, None),
        GameEvent::ActionRejected { action, .. } => (
            EventType::ActionRejected,
            action.target.as_ref().map(|t| t.to_string()),
            Some(action.reason.to_string()),
            Some(json!({ "ability": action.ability.id() })),
        ),
        GameEvent::NightResolved { deaths, rejected, .. } => (
            EventType::NightResolved,
            None,
            None,
            Some(json!({
                "deaths": deaths.iter().map(|d| d.to_string()).collect::<Vec<_>>(),
                "rejected": rejected,
            })),
        ),
        GameEvent::Protected { .. } => (EventType::Protected, None, None, None),
        GameEvent::Saved { .. } => (EventType::Saved, None, None, None),
        GameEvent::DoubleProtection { .. } => (
            EventType::DoubleProtection,
            None,
            Some("shield and save cancelled out".to_string()),
            None,
        ),
        GameEvent::Reveal { target, info, .. } => (
            EventType::Reveal,
            Some(target.to_string()),
            None,
            Some(json!({ "info": info.to_string() })),
        ),
        GameEvent::Death { cause, by, .. } => (
            EventType::Death,
            None,
            Some(cause.display_name().to_string()),
            by.as_ref().map(|by| json!({ "by": by.to_string() })),
        ),
        GameEvent::RetaliationTriggered { .. } => (EventType::RetaliationTriggered, None, None, None),
        GameEvent::Utterance { text, .. } => (
            EventType::Utterance,
            None,
            None,
            Some(json!({ "text": text })),
        ),
        GameEvent::LastWords { text, .. } => (
            EventType::LastWords,
            None,
            None,
            Some(json!({ "text": text })),
        ),
        GameEvent::VoteRejected { reason, .. } => (
            EventType::VoteRejected,
            None,
            Some(reason.to_string()),
            None,
        ),
        GameEvent::VoteTallied {
            counts,
            abstentions,
            eliminated,
            runoff,
            ..
        } => (
            EventType::VoteTallied,
            eliminated.as_ref().map(|e| e.to_string()),
            None,
            Some(json!({
                "counts": counts
                    .iter()
                    .map(|(id, n)| (id.to_string(), *n))
                    .collect::<std::collections::BTreeMap<_, _>>(),
                "abstentions": abstentions,
                "runoff": runoff,
            })),
        ),
        GameEvent::RunoffStarted { candidates, .. } => (
            EventType::RunoffStarted,
            None,
            None,
            Some(json!({
                "candidates": candidates.iter().map(|c| c.to_string()).collect::<Vec<_>>(),
            })),
        ),
        GameEvent::DecisionDefaulted { reason, .. } => (
            EventType::DecisionDefaulted,
            None,
            Some(reason.to_string()),
            None,
        ),
        GameEvent::GameOver { winner, .. } => (
            EventType::GameOver,
            Some(winner.map_or("none", |f: Faction| f.display_name()).to_string()),
            None,
            None,
        ),
    }
}
