//! GameController - Drives one game from Setup to Terminated
//!
//! The controller is the only writer of the [`GameState`]. Rule decisions
//! belong to the domain services; the controller asks agents, hands their
//! answers to the services and applies the outcomes in order.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use audit::EventLog;
use shared::{ConfigError, EngineError, GamePlan, TimeLimits};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};
use werewolf_domain::{
    ActionResolver, AgentId, AgentView, Ballot, DayOutcome, Death, DeathCause, DefaultReason,
    Faction, GameEvent, GameSetup, GameState, InvalidAction, NightAction, NightFate, NightOutcome,
    Phase, SpeakingOrder, Speech, SpeechKind, Vote, VoteCounter, VoteDecision, VoteOutcome,
    VoteRejection, WinResult,
};

use crate::decision::{DecisionError, DecisionMaker};
use crate::timing::{self, Request};

type Answer<T> = Result<T, DefaultReason>;

/// Result of a finished game
#[derive(Debug)]
pub struct GameReport {
    /// `None` when the round cap stopped the game
    pub winner: Option<Faction>,
    pub rounds: u32,
    pub events: Vec<GameEvent>,
    pub log: EventLog,
    pub state: GameState,
}

impl GameReport {
    pub fn game_id(&self) -> &str {
        self.log.game_id()
    }

    /// Dead agents in order of death
    pub fn deaths(&self) -> Vec<(&AgentId, DeathCause)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                GameEvent::Death { agent, cause, .. } => Some((agent, *cause)),
                _ => None,
            })
            .collect()
    }

    /// Events of one kind, by snake_case name
    pub fn events_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a GameEvent> + 'a {
        self.events.iter().filter(move |e| e.kind() == kind)
    }
}

pub struct GameController {
    state: GameState,
    makers: BTreeMap<AgentId, Arc<dyn DecisionMaker>>,
    limits: TimeLimits,
    resolver: ActionResolver,
    counter: VoteCounter,
    log: EventLog,
    events: Vec<GameEvent>,
    sink: Option<UnboundedSender<GameEvent>>,
    winner: Option<Faction>,
}

impl GameController {
    /// Validate the setup and seat one decision maker per agent
    pub fn new(
        setup: GameSetup,
        limits: TimeLimits,
        makers: BTreeMap<AgentId, Arc<dyn DecisionMaker>>,
    ) -> Result<Self, EngineError> {
        limits.validate()?;
        let state = setup.into_state()?;
        if let Some(missing) = state.agents().iter().find(|a| !makers.contains_key(a.id())) {
            return Err(ConfigError::Invalid(format!(
                "no decision maker for agent '{}'",
                missing.id()
            ))
            .into());
        }

        Ok(Self {
            state,
            makers,
            limits,
            resolver: ActionResolver::new(),
            counter: VoteCounter::new(),
            log: EventLog::unbounded(),
            events: Vec::new(),
            sink: None,
            winner: None,
        })
    }

    pub fn from_plan(
        plan: GamePlan,
        makers: BTreeMap<AgentId, Arc<dyn DecisionMaker>>,
    ) -> Result<Self, EngineError> {
        Self::new(plan.setup, plan.time_limits, makers)
    }

    /// Let one decision maker play every seat
    pub fn with_shared_maker(
        setup: GameSetup,
        limits: TimeLimits,
        maker: Arc<dyn DecisionMaker>,
    ) -> Result<Self, EngineError> {
        let makers = setup
            .players
            .iter()
            .map(|p| (p.id.clone(), Arc::clone(&maker)))
            .collect();
        Self::new(setup, limits, makers)
    }

    pub fn with_event_log(mut self, log: EventLog) -> Self {
        self.log = log;
        self
    }

    /// Also forward every event to `sink`
    pub fn with_event_sink(mut self, sink: UnboundedSender<GameEvent>) -> Self {
        self.sink = Some(sink);
        self
    }

    // ========== Getters ==========

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    // ========== Game Loop ==========

    /// Play until a faction wins or the round cap is reached
    ///
    /// Only configuration problems and internal invariant violations come
    /// back as errors; misbehaving agents are defaulted and logged.
    pub async fn run(mut self) -> Result<GameReport, EngineError> {
        let agents = self.state.agents().len();
        info!(game_id = self.log.game_id(), agents, "🐺 Game started");
        self.emit(GameEvent::GameStarted { agents });

        while !self.state.is_terminated() {
            if self.state.round() >= self.state.rules().max_rounds {
                warn!(
                    rounds = self.state.round(),
                    "Round cap reached, stopping without a winner"
                );
                self.finish(None)?;
                break;
            }

            self.play_night().await?;
            if self.state.is_terminated() {
                break;
            }
            self.play_day().await?;
        }

        Ok(self.into_report())
    }

    async fn play_night(&mut self) -> Result<(), EngineError> {
        self.enter(Phase::Night)?;
        let round = self.state.round();

        let requests: Vec<AgentView> = self
            .state
            .living()
            .filter_map(|a| self.state.view_for(a.id()))
            .filter(|view| {
                view.abilities
                    .iter()
                    .any(|(ability, left)| ability.is_night_ability() && *left != Some(0))
            })
            .collect();
        let answers = self
            .ask_all(requests, Request::NightAction, |maker, view| async move {
                maker.night_action(view).await
            })
            .await;

        let mut actions = Vec::new();
        for (agent, answer) in answers {
            match answer {
                Ok(intents) => actions.extend(
                    intents
                        .into_iter()
                        .map(|intent| NightAction::from_intent(agent.clone(), intent)),
                ),
                Err(reason) => self.defaulted(&agent, Request::NightAction, reason),
            }
        }
        debug!(round, actions = actions.len(), "Night actions collected");

        self.enter(Phase::NightResolution)?;
        let mut outcome = self.resolver.resolve(&actions, &self.state);
        for rejected in outcome.rejected.clone() {
            self.reject(rejected);
        }

        let mut deaths = std::mem::take(&mut outcome.deaths);
        let resolved = deaths.len();
        self.run_retaliations(&mut deaths).await;
        let retaliations = deaths.split_off(resolved);
        outcome.deaths = deaths;
        for death in retaliations {
            outcome.record_retaliation(death);
        }

        let private = night_private_events(&outcome);
        let summary = GameEvent::NightResolved {
            round,
            deaths: outcome.deaths.iter().map(|d| d.agent.clone()).collect(),
            rejected: outcome.rejected.len(),
        };
        let deaths = outcome.deaths.clone();

        self.state.apply_night(outcome)?;
        self.state.check_invariants()?;

        for event in private {
            self.emit(event);
        }
        self.emit(summary);
        self.announce_deaths(&deaths);
        info!(round, deaths = deaths.len(), "🌙 Night resolved");

        self.check_win()?;
        Ok(())
    }

    async fn play_day(&mut self) -> Result<(), EngineError> {
        self.enter(Phase::DayAnnouncement)?;
        let round = self.state.round();

        if self.state.rules().last_words && round == 1 {
            let victims: Vec<AgentId> = self
                .state
                .night_outcomes()
                .last()
                .map(|night| {
                    night
                        .deaths
                        .iter()
                        .filter(|d| d.cause != DeathCause::Retaliation)
                        .map(|d| d.agent.clone())
                        .collect()
                })
                .unwrap_or_default();
            for victim in victims {
                self.last_words(&victim).await;
            }
        }

        self.enter(Phase::Discussion)?;
        self.discuss().await;

        self.enter(Phase::Voting)?;
        let (first, runoff) = self.vote().await;

        self.enter(Phase::VoteResolution)?;
        let eliminated = runoff.as_ref().unwrap_or(&first).eliminated().cloned();
        let mut deaths = Vec::new();
        if let Some(agent) = &eliminated {
            deaths.push(Death::new(agent.clone(), round, DeathCause::Vote));
        }
        self.run_retaliations(&mut deaths).await;

        let outcome = DayOutcome {
            round,
            vote: first,
            runoff,
            deaths: deaths.clone(),
        };
        self.state.apply_day(outcome)?;
        self.state.check_invariants()?;
        self.announce_deaths(&deaths);

        if self.check_win()? {
            return Ok(());
        }
        if let Some(agent) = eliminated {
            if self.state.rules().last_words {
                self.last_words(&agent).await;
            }
        }
        Ok(())
    }

    // ========== Day Steps ==========

    async fn discuss(&mut self) {
        let passes = self.state.rules().discussion_rounds;
        for pass in 1..=passes {
            for speaker in self.speaking_order() {
                let Some(view) = self.state.view_for(&speaker) else {
                    continue;
                };
                let answer = self
                    .ask_one(
                        view.speaking(SpeechKind::Discussion),
                        Request::Utterance,
                        |maker, view| async move { maker.utterance(view).await },
                    )
                    .await;
                match answer {
                    Ok(text) if text.trim().is_empty() => debug!(speaker = %speaker, "Passed"),
                    Ok(text) => self.speak(&speaker, SpeechKind::Discussion, text),
                    Err(reason) => self.defaulted(&speaker, Request::Utterance, reason),
                }
            }
            debug!(pass, passes, "Discussion pass finished");
        }
    }

    /// Living agents in the order they speak this round
    fn speaking_order(&self) -> Vec<AgentId> {
        let mut order = self.state.living_ids();
        if self.state.rules().speaking_order == SpeakingOrder::Rotating && !order.is_empty() {
            let shift = self.state.round().saturating_sub(1) as usize % order.len();
            order.rotate_left(shift);
        }
        order
    }

    async fn last_words(&mut self, agent: &AgentId) {
        let Some(view) = self.state.view_for(agent) else {
            return;
        };
        let answer = self
            .ask_one(
                view.speaking(SpeechKind::LastWords),
                Request::LastWords,
                |maker, view| async move { maker.utterance(view).await },
            )
            .await;
        match answer {
            Ok(text) if text.trim().is_empty() => {}
            Ok(text) => self.speak(agent, SpeechKind::LastWords, text),
            Err(reason) => self.defaulted(agent, Request::LastWords, reason),
        }
    }

    fn speak(&mut self, speaker: &AgentId, kind: SpeechKind, text: String) {
        let round = self.state.round();
        self.state.record_speech(Speech {
            round,
            phase: self.state.phase(),
            speaker: speaker.clone(),
            kind,
            text: text.clone(),
        });
        let speaker = speaker.clone();
        self.emit(match kind {
            SpeechKind::Discussion => GameEvent::Utterance {
                round,
                speaker,
                text,
            },
            SpeechKind::LastWords => GameEvent::LastWords {
                round,
                speaker,
                text,
            },
        });
    }

    /// First vote, plus the runoff when the tie policy calls for one
    async fn vote(&mut self) -> (VoteOutcome, Option<VoteOutcome>) {
        let round = self.state.round();
        let living = self.state.living_ids();
        let policy = self.state.rules().tie_policy;

        let ballots = self
            .collect_ballots(&living, &living, VoteRejection::TargetNotEligible)
            .await;
        let first = self.counter.tally(&ballots, &living, policy);
        self.announce_tally(&first);

        let candidates = match &first.decision {
            VoteDecision::Runoff(candidates) => candidates.clone(),
            _ => return (first, None),
        };
        info!(round, candidates = candidates.len(), "⚖️ Runoff vote");
        self.emit(GameEvent::RunoffStarted {
            round,
            candidates: candidates.clone(),
        });

        let eligible = first.tally.participants();
        let ballots = self
            .collect_ballots(&eligible, &candidates, VoteRejection::NotACandidate)
            .await;
        let runoff = self.counter.tally_runoff(&ballots, &eligible, &candidates);
        self.announce_tally(&runoff);
        (first, Some(runoff))
    }

    /// Ask every voter for a ballot. Invalid ballots are re-requested
    /// until `max_vote_attempts` is used up; the last answer stands.
    /// Each refused attempt is logged as `VoteRejected`, with `miss` for
    /// ballots naming someone outside `candidates`.
    async fn collect_ballots(
        &mut self,
        voters: &[AgentId],
        candidates: &[AgentId],
        miss: VoteRejection,
    ) -> Vec<Vote> {
        let round = self.state.round();
        let attempts = self.state.rules().max_vote_attempts;
        let mut ballots: BTreeMap<AgentId, Ballot> = BTreeMap::new();
        let mut pending = voters.to_vec();

        for attempt in 1..=attempts {
            let requests = pending
                .iter()
                .filter_map(|voter| {
                    let others = candidates.iter().filter(|c| *c != voter).cloned().collect();
                    self.state
                        .view_for(voter)
                        .map(|view| view.with_candidates(others))
                })
                .collect();
            let answers = self
                .ask_all(requests, Request::Vote, |maker, view| async move {
                    maker.vote(view).await
                })
                .await;

            pending.clear();
            for (voter, answer) in answers {
                let ballot = answer.unwrap_or_else(|reason| {
                    self.defaulted(&voter, Request::Vote, reason);
                    Ballot::Abstain
                });
                let refused = match &ballot {
                    Ballot::Abstain => None,
                    Ballot::For(target) if target == &voter => Some(VoteRejection::SelfVote),
                    Ballot::For(target) if !candidates.contains(target) => Some(miss),
                    Ballot::For(_) => None,
                };
                // The last attempt is left to the counter, which rejects it
                if let (Some(reason), true) = (refused, attempt < attempts) {
                    debug!(voter = %voter, attempt, reason = %reason, "Invalid ballot, asking again");
                    self.emit(GameEvent::VoteRejected {
                        round,
                        voter: voter.clone(),
                        reason,
                    });
                    pending.push(voter.clone());
                }
                ballots.insert(voter, ballot);
            }
            if pending.is_empty() {
                break;
            }
        }

        voters
            .iter()
            .filter_map(|voter| {
                ballots.remove(voter).map(|ballot| Vote {
                    voter: voter.clone(),
                    ballot,
                })
            })
            .collect()
    }

    fn announce_tally(&mut self, outcome: &VoteOutcome) {
        let round = self.state.round();
        for (voter, reason) in &outcome.tally.rejected {
            debug!(voter = %voter, reason = %reason, "Ballot rejected");
            self.emit(GameEvent::VoteRejected {
                round,
                voter: voter.clone(),
                reason: *reason,
            });
        }

        let eliminated = outcome.eliminated().cloned();
        match &eliminated {
            Some(agent) => info!(round, eliminated = %agent, "🗳️ Vote decided"),
            None => info!(round, "🗳️ Vote eliminated nobody"),
        }
        self.emit(GameEvent::VoteTallied {
            round,
            counts: outcome
                .tally
                .counts
                .iter()
                .map(|(id, n)| (id.clone(), *n))
                .collect(),
            abstentions: outcome.tally.abstentions,
            eliminated,
            runoff: outcome.runoff,
        });
    }

    // ========== Deaths ==========

    /// Walk the pending deaths and let each retaliator take one more agent
    /// down. Deaths appended here are walked too, so chains resolve.
    async fn run_retaliations(&mut self, deaths: &mut Vec<Death>) {
        let mut next = 0;
        while next < deaths.len() {
            let death = deaths[next].clone();
            next += 1;

            match self.resolver.retaliation_right(&self.state, &death) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(refused) => {
                    self.reject(refused);
                    continue;
                }
            }
            self.state.record_retaliation_use(&death.agent);

            let candidates =
                self.resolver
                    .retaliation_candidates(&self.state, deaths.as_slice(), &death.agent);
            let Some(view) = self.state.view_for(&death.agent) else {
                continue;
            };
            let choice = match self
                .ask_one(
                    view.with_candidates(candidates),
                    Request::Retaliation,
                    |maker, view| async move { maker.retaliate(view).await },
                )
                .await
            {
                Ok(choice) => choice,
                Err(reason) => {
                    self.defaulted(&death.agent, Request::Retaliation, reason);
                    None
                }
            };

            match self.resolver.retaliate(
                &self.state,
                deaths.as_slice(),
                &death.agent,
                choice.as_ref(),
            ) {
                Ok(Some(shot)) => {
                    info!(agent = %death.agent, target = %shot.agent, "🏹 Retaliation");
                    deaths.push(shot);
                }
                Ok(None) => debug!(agent = %death.agent, "Retaliation passed"),
                Err(invalid) => self.reject(invalid),
            }
        }
    }

    fn announce_deaths(&mut self, deaths: &[Death]) {
        for death in deaths {
            if let (DeathCause::Retaliation, Some(by)) = (death.cause, &death.by) {
                self.emit(GameEvent::RetaliationTriggered {
                    round: death.round,
                    agent: by.clone(),
                });
            }
            info!(agent = %death.agent, cause = death.cause.display_name(), "💀 Death");
            self.emit(GameEvent::Death {
                round: death.round,
                agent: death.agent.clone(),
                cause: death.cause,
                by: death.by.clone(),
            });
        }
    }

    // ========== Termination ==========

    /// Evaluate the win conditions; terminate the game if one holds
    fn check_win(&mut self) -> Result<bool, EngineError> {
        match self.state.evaluate_win() {
            WinResult::Winner(faction) => {
                self.finish(Some(faction))?;
                Ok(true)
            }
            WinResult::Continue => Ok(false),
        }
    }

    fn finish(&mut self, winner: Option<Faction>) -> Result<(), EngineError> {
        self.enter(Phase::Terminated)?;
        self.winner = winner;
        let round = self.state.round();
        match winner {
            Some(faction) => info!(round, winner = %faction, "🏆 Game over"),
            None => info!(round, "🏁 Game over without a winner"),
        }
        self.emit(GameEvent::GameOver { round, winner });
        Ok(())
    }

    fn into_report(self) -> GameReport {
        GameReport {
            winner: self.winner,
            rounds: self.state.round(),
            events: self.events,
            log: self.log,
            state: self.state,
        }
    }

    // ========== Plumbing ==========

    fn enter(&mut self, phase: Phase) -> Result<(), EngineError> {
        self.state.advance(phase)?;
        let round = self.state.round();
        debug!(round, phase = %phase, "Phase entered");
        self.emit(GameEvent::PhaseEntered { round, phase });
        Ok(())
    }

    fn emit(&mut self, event: GameEvent) {
        self.log.record(&event);
        let closed = self
            .sink
            .as_ref()
            .is_some_and(|sink| sink.send(event.clone()).is_err());
        if closed {
            debug!("Event sink closed");
            self.sink = None;
        }
        self.events.push(event);
    }

    fn reject(&mut self, action: InvalidAction) {
        let error = EngineError::from(action.clone());
        debug!(error = %error, "Action rejected");
        self.emit(GameEvent::ActionRejected {
            round: self.state.round(),
            action,
        });
    }

    fn defaulted(&mut self, agent: &AgentId, request: Request, reason: DefaultReason) {
        let round = self.state.round();
        let phase = self.state.phase();
        match &reason {
            DefaultReason::Timeout => {
                let error = EngineError::DecisionTimeout {
                    agent: agent.clone(),
                    phase,
                    round,
                };
                warn!(error = %error, request = request.name(), "⏱️ Decision defaulted");
            }
            DefaultReason::Error(message) => {
                warn!(agent = %agent, request = request.name(), error = %message, "⚠️ Decision defaulted");
            }
        }
        self.emit(GameEvent::DecisionDefaulted {
            round,
            phase,
            agent: agent.clone(),
            reason,
        });
    }

    /// Ask several agents at once; answers come back in request order
    async fn ask_all<T, F, Fut>(
        &self,
        requests: Vec<AgentView>,
        request: Request,
        ask: F,
    ) -> Vec<(AgentId, Answer<T>)>
    where
        T: Send + 'static,
        F: Fn(Arc<dyn DecisionMaker>, AgentView) -> Fut,
        Fut: Future<Output = Result<T, DecisionError>> + Send + 'static,
    {
        let limit = request.limit(&self.limits);
        let handles: Vec<_> = requests
            .into_iter()
            .filter_map(|view| {
                let maker = Arc::clone(self.makers.get(&view.me)?);
                let agent = view.me.clone();
                let decision = ask(maker, view);
                Some((agent, tokio::spawn(timing::bounded(limit, decision))))
            })
            .collect();

        let mut answers = Vec::with_capacity(handles.len());
        for (agent, handle) in handles {
            let answer = match handle.await {
                Ok(answer) => answer,
                Err(err) => Err(DefaultReason::Error(err.to_string())),
            };
            answers.push((agent, answer));
        }
        answers
    }

    async fn ask_one<T, F, Fut>(&self, view: AgentView, request: Request, ask: F) -> Answer<T>
    where
        F: FnOnce(Arc<dyn DecisionMaker>, AgentView) -> Fut,
        Fut: Future<Output = Result<T, DecisionError>>,
    {
        let Some(maker) = self.makers.get(&view.me).map(Arc::clone) else {
            return Err(DefaultReason::Error(format!(
                "no decision maker for {}",
                view.me
            )));
        };
        timing::bounded(request.limit(&self.limits), ask(maker, view)).await
    }
}

/// Events only the engine and the concerned agents see
fn night_private_events(outcome: &NightOutcome) -> Vec<GameEvent> {
    let round = outcome.round;
    let mut events = Vec::new();

    if let Some(target) = &outcome.lethal_target {
        if outcome.double_protected {
            events.push(GameEvent::DoubleProtection {
                round,
                agent: target.clone(),
            });
        } else {
            let held = outcome.fate_of(target) == Some(NightFate::Protected);
            if held && outcome.shielded {
                events.push(GameEvent::Protected {
                    round,
                    agent: target.clone(),
                });
            }
            if held && outcome.saved {
                events.push(GameEvent::Saved {
                    round,
                    agent: target.clone(),
                });
            }
        }
    }

    events.extend(outcome.reveals.iter().map(|reveal| GameEvent::Reveal {
        round,
        to: reveal.to.clone(),
        target: reveal.target.clone(),
        info: reveal.info.clone(),
    }));
    events
}
