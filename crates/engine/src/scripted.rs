//! Scripted decision maker for tests and replays
//!
//! Answers come from a script keyed by agent and round. Anything not
//! scripted gets a passive answer: no night action, abstain, a stock line,
//! no retaliation.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use werewolf_domain::{AgentId, AgentView, Ballot, Intent, SpeechKind};

use crate::decision::{DecisionError, DecisionMaker};
use crate::timing::Request;

/// One request received by the script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub agent: AgentId,
    pub request: Request,
    pub round: u32,
}

#[derive(Debug, Default)]
pub struct ScriptedDecisionMaker {
    nights: BTreeMap<(AgentId, u32), Vec<Intent>>,
    votes: Mutex<BTreeMap<(AgentId, u32), VecDeque<Ballot>>>,
    lines: BTreeMap<AgentId, String>,
    retaliations: BTreeMap<AgentId, AgentId>,
    delays: BTreeMap<AgentId, Duration>,
    failing: BTreeSet<AgentId>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedDecisionMaker {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Script ==========

    /// Night intents of `agent` in `round`
    pub fn on_night(mut self, agent: &str, round: u32, intents: Vec<Intent>) -> Self {
        self.nights.insert((AgentId::new(agent), round), intents);
        self
    }

    /// Queue a ballot of `agent` in `round`. Queued ballots answer the
    /// requests of that round in order: retries first, then the runoff.
    pub fn on_vote(mut self, agent: &str, round: u32, ballot: Ballot) -> Self {
        self.votes
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .entry((AgentId::new(agent), round))
            .or_default()
            .push_back(ballot);
        self
    }

    /// Shorthand for a ballot against `target`
    pub fn votes_for(self, agent: &str, round: u32, target: &str) -> Self {
        self.on_vote(agent, round, Ballot::For(AgentId::new(target)))
    }

    pub fn on_utterance(mut self, agent: &str, text: impl Into<String>) -> Self {
        self.lines.insert(AgentId::new(agent), text.into());
        self
    }

    pub fn on_retaliate(mut self, agent: &str, target: &str) -> Self {
        self.retaliations
            .insert(AgentId::new(agent), AgentId::new(target));
        self
    }

    /// Make every answer of `agent` take `delay`
    pub fn with_delay(mut self, agent: &str, delay: Duration) -> Self {
        self.delays.insert(AgentId::new(agent), delay);
        self
    }

    /// Make every answer of `agent` an error
    pub fn failing(mut self, agent: &str) -> Self {
        self.failing.insert(AgentId::new(agent));
        self
    }

    // ========== Getters ==========

    /// Requests received so far, in arrival order
    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Agents asked for `request`, in arrival order
    pub fn asked(&self, request: Request) -> Vec<AgentId> {
        self.calls()
            .into_iter()
            .filter(|c| c.request == request)
            .map(|c| c.agent)
            .collect()
    }

    async fn receive(&self, view: &AgentView, request: Request) -> Result<(), DecisionError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Call {
                agent: view.me.clone(),
                request,
                round: view.round,
            });

        if let Some(delay) = self.delays.get(&view.me) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(&view.me) {
            return Err(DecisionError::Unavailable(format!(
                "scripted failure for {}",
                view.me
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DecisionMaker for ScriptedDecisionMaker {
    async fn night_action(&self, view: AgentView) -> Result<Vec<Intent>, DecisionError> {
        self.receive(&view, Request::NightAction).await?;
        Ok(self
            .nights
            .get(&(view.me, view.round))
            .cloned()
            .unwrap_or_default())
    }

    async fn vote(&self, view: AgentView) -> Result<Ballot, DecisionError> {
        self.receive(&view, Request::Vote).await?;
        let ballot = self
            .votes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&(view.me, view.round))
            .and_then(VecDeque::pop_front);
        Ok(ballot.unwrap_or(Ballot::Abstain))
    }

    async fn utterance(&self, view: AgentView) -> Result<String, DecisionError> {
        let request = match view.speaking {
            Some(SpeechKind::LastWords) => Request::LastWords,
            _ => Request::Utterance,
        };
        self.receive(&view, request).await?;
        Ok(self
            .lines
            .get(&view.me)
            .cloned()
            .unwrap_or_else(|| format!("{} has nothing to add.", view.name)))
    }

    async fn retaliate(&self, view: AgentView) -> Result<Option<AgentId>, DecisionError> {
        self.receive(&view, Request::Retaliation).await?;
        Ok(self.retaliations.get(&view.me).cloned())
    }
}
