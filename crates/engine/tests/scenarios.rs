//! Whole games played with scripted agents

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use audit::EventType;
use engine::{DecisionMaker, GameController, GameReport, Request, ScriptedDecisionMaker, TimeLimits};
use werewolf_domain::{
    Ability, AgentId, Ballot, DeathCause, DefaultReason, Faction, GameEvent, GameSetup, Intent,
    InvalidReason, Phase, PlayerSpec, RevealInfo, Role, Rules, SpeakingOrder, TiePolicy,
    VoteRejection,
};

fn table(seats: &[(&str, Role)]) -> GameSetup {
    GameSetup::new(
        seats
            .iter()
            .map(|(id, role)| PlayerSpec::new(*id, id.to_uppercase(), role.clone()))
            .collect(),
    )
}

/// One werewolf and four villagers
fn small_village() -> GameSetup {
    table(&[
        ("w1", Role::Werewolf),
        ("v1", Role::Villager),
        ("v2", Role::Villager),
        ("v3", Role::Villager),
        ("v4", Role::Villager),
    ])
}

fn one_round() -> Rules {
    Rules {
        max_rounds: 1,
        ..Rules::default()
    }
}

async fn play_with(
    setup: GameSetup,
    limits: TimeLimits,
    script: ScriptedDecisionMaker,
) -> (GameReport, Arc<ScriptedDecisionMaker>) {
    let script = Arc::new(script);
    let controller = GameController::with_shared_maker(setup, limits, script.clone())
        .expect("valid setup");
    let report = controller.run().await.expect("game completes");
    (report, script)
}

async fn play(setup: GameSetup, script: ScriptedDecisionMaker) -> (GameReport, Arc<ScriptedDecisionMaker>) {
    play_with(setup, TimeLimits::default(), script).await
}

fn deaths(report: &GameReport) -> Vec<(String, DeathCause)> {
    report
        .deaths()
        .into_iter()
        .map(|(agent, cause)| (agent.to_string(), cause))
        .collect()
}

fn id(s: &str) -> AgentId {
    AgentId::new(s)
}

#[tokio::test]
async fn test_village_wins_by_voting_out_the_wolf() {
    let setup = table(&[
        ("w1", Role::Werewolf),
        ("seer", Role::Seer),
        ("v1", Role::Villager),
        ("v2", Role::Villager),
        ("v3", Role::Villager),
    ]);
    let script = ScriptedDecisionMaker::new()
        .on_night("w1", 1, vec![Intent::new(Ability::Kill, "v1")])
        .on_night("seer", 1, vec![Intent::new(Ability::Inspect, "w1")])
        .votes_for("seer", 1, "w1")
        .votes_for("v2", 1, "w1")
        .votes_for("v3", 1, "w1")
        .votes_for("w1", 1, "seer");

    let (report, _) = play(setup, script).await;

    assert_eq!(report.winner, Some(Faction::Village));
    assert_eq!(report.rounds, 1);
    assert_eq!(
        deaths(&report),
        vec![
            ("v1".to_string(), DeathCause::WerewolfKill),
            ("w1".to_string(), DeathCause::Vote),
        ]
    );
    assert!(report.state.is_terminated());

    let view = report.state.view_for(&id("seer")).unwrap();
    assert_eq!(view.reveals.len(), 1);
    assert_eq!(view.reveals[0].info, RevealInfo::Faction(Faction::Werewolf));

    let stats = report.log.stats();
    assert_eq!(stats.winner.as_deref(), Some("Village"));
    assert_eq!(stats.deaths, 2);
    assert_eq!(stats.recovered_errors, 0);
}

#[tokio::test]
async fn test_only_night_actors_are_asked_at_night() {
    let setup = table(&[
        ("w1", Role::Werewolf),
        ("seer", Role::Seer),
        ("hunter", Role::Hunter),
        ("v1", Role::Villager),
        ("v2", Role::Villager),
    ])
    .with_rules(one_round());

    let (_, script) = play(setup, ScriptedDecisionMaker::new()).await;

    // night requests run concurrently, arrival order is not fixed
    let mut asked = script.asked(Request::NightAction);
    asked.sort();
    assert_eq!(asked, vec![id("seer"), id("w1")]);
}

#[tokio::test]
async fn test_double_protection_kills_the_victim() {
    let setup = table(&[
        ("w1", Role::Werewolf),
        ("witch", Role::Witch),
        ("guard", Role::Guard),
        ("v1", Role::Villager),
        ("v2", Role::Villager),
        ("v3", Role::Villager),
    ])
    .with_rules(one_round());
    let script = ScriptedDecisionMaker::new()
        .on_night("w1", 1, vec![Intent::new(Ability::Kill, "v1")])
        .on_night("guard", 1, vec![Intent::new(Ability::Protect, "v1")])
        .on_night("witch", 1, vec![Intent::new(Ability::Save, "v1")]);

    let (report, _) = play(setup, script).await;

    assert_eq!(deaths(&report), vec![("v1".to_string(), DeathCause::WerewolfKill)]);
    assert_eq!(report.events_of("double_protection").count(), 1);
    assert_eq!(report.events_of("saved").count(), 0);
    assert_eq!(report.state.remaining(&id("witch"), Ability::Save), Some(0));
    assert_eq!(report.winner, None);
}

#[tokio::test]
async fn test_shield_alone_keeps_the_victim_alive() {
    let setup = table(&[
        ("w1", Role::Werewolf),
        ("guard", Role::Guard),
        ("v1", Role::Villager),
        ("v2", Role::Villager),
        ("v3", Role::Villager),
    ])
    .with_rules(one_round());
    let script = ScriptedDecisionMaker::new()
        .on_night("w1", 1, vec![Intent::new(Ability::Kill, "v1")])
        .on_night("guard", 1, vec![Intent::new(Ability::Protect, "v1")]);

    let (report, _) = play(setup, script).await;

    assert!(deaths(&report).is_empty());
    assert!(report.state.is_alive(&id("v1")));
    assert!(report.events.iter().any(|e| matches!(
        e,
        GameEvent::Protected { agent, .. } if agent == &id("v1")
    )));
    assert!(report.events.iter().any(|e| matches!(
        e,
        GameEvent::NightResolved { deaths, .. } if deaths.is_empty()
    )));
}

#[tokio::test]
async fn test_hunter_takes_the_wolf_down_at_night() {
    let setup = table(&[
        ("w1", Role::Werewolf),
        ("hunter", Role::Hunter),
        ("v1", Role::Villager),
        ("v2", Role::Villager),
        ("v3", Role::Villager),
    ]);
    let script = ScriptedDecisionMaker::new()
        .on_night("w1", 1, vec![Intent::new(Ability::Kill, "hunter")])
        .on_retaliate("hunter", "w1");

    let (report, script) = play(setup, script).await;

    assert_eq!(
        deaths(&report),
        vec![
            ("hunter".to_string(), DeathCause::WerewolfKill),
            ("w1".to_string(), DeathCause::Retaliation),
        ]
    );
    assert_eq!(report.winner, Some(Faction::Village));
    assert_eq!(report.rounds, 1);
    assert_eq!(script.asked(Request::Retaliation), vec![id("hunter")]);
    assert!(report.events.iter().any(|e| matches!(
        e,
        GameEvent::RetaliationTriggered { agent, .. } if agent == &id("hunter")
    )));
    // Game ended at night, nobody was asked to vote
    assert!(script.asked(Request::Vote).is_empty());
}

#[tokio::test]
async fn test_voted_out_hunter_retaliates() {
    let setup = table(&[
        ("w1", Role::Werewolf),
        ("hunter", Role::Hunter),
        ("v1", Role::Villager),
        ("v2", Role::Villager),
        ("v3", Role::Villager),
    ]);
    let script = ScriptedDecisionMaker::new()
        .votes_for("w1", 1, "hunter")
        .votes_for("v1", 1, "hunter")
        .on_retaliate("hunter", "w1");

    let (report, _) = play(setup, script).await;

    assert_eq!(
        deaths(&report),
        vec![
            ("hunter".to_string(), DeathCause::Vote),
            ("w1".to_string(), DeathCause::Retaliation),
        ]
    );
    assert_eq!(report.winner, Some(Faction::Village));
}

#[tokio::test]
async fn test_poison_suppresses_retaliation() {
    let setup = table(&[
        ("w1", Role::Werewolf),
        ("witch", Role::Witch),
        ("hunter", Role::Hunter),
        ("v1", Role::Villager),
        ("v2", Role::Villager),
        ("v3", Role::Villager),
    ])
    .with_rules(one_round());
    let script = ScriptedDecisionMaker::new()
        .on_night("w1", 1, vec![Intent::new(Ability::Kill, "v1")])
        .on_night("witch", 1, vec![Intent::new(Ability::Poison, "hunter")])
        .on_retaliate("hunter", "w1");

    let (report, script) = play(setup, script).await;

    let dead = deaths(&report);
    assert!(dead.contains(&("v1".to_string(), DeathCause::WerewolfKill)));
    assert!(dead.contains(&("hunter".to_string(), DeathCause::Poison)));
    assert!(report.state.is_alive(&id("w1")));
    assert!(script.asked(Request::Retaliation).is_empty());
    assert!(report.events.iter().any(|e| matches!(
        e,
        GameEvent::ActionRejected { action, .. } if action.reason == InvalidReason::Suppressed
    )));
}

#[tokio::test]
async fn test_tie_eliminates_nobody() {
    let setup = small_village().with_rules(one_round());
    let script = ScriptedDecisionMaker::new()
        .votes_for("v1", 1, "v2")
        .votes_for("v2", 1, "v1");

    let (report, _) = play(setup, script).await;

    assert!(deaths(&report).is_empty());
    assert_eq!(report.winner, None);
    assert!(report.events.iter().any(|e| matches!(
        e,
        GameEvent::VoteTallied { eliminated: None, abstentions: 3, .. }
    )));
}

#[tokio::test]
async fn test_runoff_breaks_the_tie() {
    let setup = small_village().with_rules(Rules {
        tie_policy: TiePolicy::Runoff,
        ..one_round()
    });
    let script = ScriptedDecisionMaker::new()
        // first vote: v1 and v2 tied at two, w1 abstains
        .votes_for("v1", 1, "v2")
        .votes_for("v2", 1, "v1")
        .votes_for("v3", 1, "v2")
        .votes_for("v4", 1, "v1")
        // runoff
        .votes_for("v1", 1, "v2")
        .votes_for("v2", 1, "v1")
        .votes_for("v3", 1, "v2")
        .votes_for("v4", 1, "v2");

    let (report, script) = play(setup, script).await;

    assert!(report.events.iter().any(|e| matches!(
        e,
        GameEvent::RunoffStarted { candidates, .. } if candidates == &vec![id("v1"), id("v2")]
    )));
    assert_eq!(deaths(&report), vec![("v2".to_string(), DeathCause::Vote)]);

    // w1 abstained and sits the runoff out
    let w1_votes = script
        .asked(Request::Vote)
        .into_iter()
        .filter(|a| a == &id("w1"))
        .count();
    assert_eq!(w1_votes, 1);

    let day = &report.state.day_outcomes()[0];
    assert!(day.runoff.is_some());
    assert_eq!(day.eliminated(), Some(&id("v2")));
}

#[tokio::test]
async fn test_invalid_ballot_is_asked_again() {
    let setup = small_village().with_rules(Rules {
        max_vote_attempts: 2,
        ..Rules::default()
    });
    let script = ScriptedDecisionMaker::new()
        .on_vote("v1", 1, Ballot::For(id("v1")))
        .votes_for("v1", 1, "w1")
        .votes_for("v2", 1, "w1");

    let (report, script) = play(setup, script).await;

    let v1_votes = script
        .asked(Request::Vote)
        .into_iter()
        .filter(|a| a == &id("v1"))
        .count();
    assert_eq!(v1_votes, 2);
    let rejected: Vec<_> = report
        .events
        .iter()
        .filter_map(|e| match e {
            GameEvent::VoteRejected { voter, reason, .. } => Some((voter.clone(), *reason)),
            _ => None,
        })
        .collect();
    assert_eq!(rejected, vec![(id("v1"), VoteRejection::SelfVote)]);
    assert_eq!(report.log.stats().recovered_errors, 1);
    assert_eq!(report.winner, Some(Faction::Village));
}

#[tokio::test]
async fn test_every_refused_attempt_is_logged() {
    let setup = small_village().with_rules(Rules {
        max_vote_attempts: 3,
        ..one_round()
    });
    let script = ScriptedDecisionMaker::new()
        .votes_for("v1", 1, "ghost")
        .on_vote("v1", 1, Ballot::For(id("v1")))
        .on_vote("v1", 1, Ballot::Abstain);

    let (report, script) = play(setup, script).await;

    let v1_votes = script
        .asked(Request::Vote)
        .into_iter()
        .filter(|a| a == &id("v1"))
        .count();
    assert_eq!(v1_votes, 3);
    let reasons: Vec<_> = report
        .events
        .iter()
        .filter_map(|e| match e {
            GameEvent::VoteRejected {
                voter,
                reason,
                round,
            } if voter == &id("v1") => Some((*round, *reason)),
            _ => None,
        })
        .collect();
    assert_eq!(
        reasons,
        vec![
            (1, VoteRejection::TargetNotEligible),
            (1, VoteRejection::SelfVote),
        ]
    );

    let errors = report.log.recovered_errors(10);
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| e.phase == "Voting" && e.round == 1));
    assert!(errors.iter().all(|e| e.agent.as_deref() == Some("v1")));
}

#[tokio::test]
async fn test_invalid_ballot_counts_as_abstain() {
    let setup = small_village();
    let script = ScriptedDecisionMaker::new()
        .on_vote("v1", 1, Ballot::For(id("v1")))
        .votes_for("v2", 1, "w1");

    let (report, _) = play(setup, script).await;

    assert!(report.events.iter().any(|e| matches!(
        e,
        GameEvent::VoteRejected { voter, reason: VoteRejection::SelfVote, .. } if voter == &id("v1")
    )));
    assert_eq!(report.winner, Some(Faction::Village));
    assert_eq!(report.log.stats().recovered_errors, 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_agent_is_defaulted() {
    let setup = small_village().with_rules(one_round());
    let script = ScriptedDecisionMaker::new()
        .on_night("w1", 1, vec![Intent::new(Ability::Kill, "v1")])
        .with_delay("w1", Duration::from_secs(120));

    let (report, _) =
        play_with(setup, TimeLimits::uniform(Duration::from_secs(1)), script).await;

    assert!(deaths(&report).is_empty());
    let defaulted: Vec<_> = report
        .events
        .iter()
        .filter_map(|e| match e {
            GameEvent::DecisionDefaulted { phase, agent, reason, .. } => {
                Some((*phase, agent.clone(), reason.clone()))
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        defaulted,
        vec![
            (Phase::Night, id("w1"), DefaultReason::Timeout),
            (Phase::Discussion, id("w1"), DefaultReason::Timeout),
            (Phase::Voting, id("w1"), DefaultReason::Timeout),
        ]
    );
}

#[tokio::test]
async fn test_failing_agent_is_defaulted() {
    let setup = small_village().with_rules(one_round());
    let script = ScriptedDecisionMaker::new().failing("v3");

    let (report, _) = play(setup, script).await;

    assert_eq!(report.winner, None);
    let reasons: Vec<_> = report
        .events
        .iter()
        .filter_map(|e| match e {
            GameEvent::DecisionDefaulted { agent, reason, .. } if agent == &id("v3") => {
                Some(reason.clone())
            }
            _ => None,
        })
        .collect();
    assert_eq!(reasons.len(), 2);
    assert!(matches!(reasons[0], DefaultReason::Error(_)));
}

#[tokio::test]
async fn test_rotating_speaking_order() {
    let setup = small_village().with_rules(Rules {
        speaking_order: SpeakingOrder::Rotating,
        max_rounds: 2,
        ..Rules::default()
    });

    let (report, script) = play(setup, ScriptedDecisionMaker::new()).await;

    let speakers = |round: u32| -> Vec<AgentId> {
        script
            .calls()
            .into_iter()
            .filter(|c| c.request == Request::Utterance && c.round == round)
            .map(|c| c.agent)
            .collect()
    };
    assert_eq!(speakers(1), vec![id("w1"), id("v1"), id("v2"), id("v3"), id("v4")]);
    assert_eq!(speakers(2), vec![id("v1"), id("v2"), id("v3"), id("v4"), id("w1")]);

    assert_eq!(report.rounds, 2);
    assert_eq!(report.winner, None);
    assert_eq!(report.state.speeches().len(), 10);
}

#[tokio::test]
async fn test_later_speakers_hear_earlier_ones() {
    let setup = small_village().with_rules(one_round());
    let script = ScriptedDecisionMaker::new().on_utterance("w1", "I am a simple villager.");

    let (report, _) = play(setup, script).await;

    let speeches = report.state.speeches();
    assert_eq!(speeches[0].speaker, id("w1"));
    assert_eq!(speeches[0].text, "I am a simple villager.");
    assert_eq!(report.events_of("utterance").count(), 5);
}

#[tokio::test]
async fn test_last_words_after_first_night() {
    let setup = small_village().with_rules(Rules {
        last_words: true,
        ..one_round()
    });
    let script = ScriptedDecisionMaker::new()
        .on_night("w1", 1, vec![Intent::new(Ability::Kill, "v1")])
        .on_utterance("v1", "It was w1.");

    let (report, script) = play(setup, script).await;

    assert_eq!(script.asked(Request::LastWords), vec![id("v1")]);
    assert!(report.events.iter().any(|e| matches!(
        e,
        GameEvent::LastWords { speaker, text, .. } if speaker == &id("v1") && text == "It was w1."
    )));
    // the dead do not join the discussion
    assert!(!script.asked(Request::Utterance).contains(&id("v1")));
}

#[tokio::test]
async fn test_retaliation_victims_get_no_last_words() {
    let setup = table(&[
        ("w1", Role::Werewolf),
        ("w2", Role::Werewolf),
        ("hunter", Role::Hunter),
        ("v1", Role::Villager),
        ("v2", Role::Villager),
        ("v3", Role::Villager),
        ("v4", Role::Villager),
    ])
    .with_rules(Rules {
        last_words: true,
        ..one_round()
    });
    let script = ScriptedDecisionMaker::new()
        .on_night("w1", 1, vec![Intent::new(Ability::Kill, "hunter")])
        .on_night("w2", 1, vec![Intent::new(Ability::Kill, "hunter")])
        .on_retaliate("hunter", "v1");

    let (report, script) = play(setup, script).await;

    assert_eq!(
        deaths(&report),
        vec![
            ("hunter".to_string(), DeathCause::WerewolfKill),
            ("v1".to_string(), DeathCause::Retaliation),
        ]
    );
    assert_eq!(script.asked(Request::LastWords), vec![id("hunter")]);
    assert_eq!(report.events_of("last_words").count(), 1);
}

#[tokio::test]
async fn test_village_wins_right_after_the_last_wolf_is_voted_out() {
    let setup = table(&[
        ("w1", Role::Werewolf),
        ("w2", Role::Werewolf),
        ("v1", Role::Villager),
        ("v2", Role::Villager),
        ("v3", Role::Villager),
        ("v4", Role::Villager),
        ("v5", Role::Villager),
    ]);
    let mut script = ScriptedDecisionMaker::new();
    for voter in ["v1", "v2", "v3"] {
        script = script.votes_for(voter, 1, "w1").votes_for(voter, 2, "w2");
    }

    let (report, script) = play(setup, script).await;

    assert_eq!(report.winner, Some(Faction::Village));
    assert_eq!(report.rounds, 2);
    assert_eq!(
        deaths(&report),
        vec![
            ("w1".to_string(), DeathCause::Vote),
            ("w2".to_string(), DeathCause::Vote),
        ]
    );
    assert!(!report.events.iter().any(|e| matches!(
        e,
        GameEvent::PhaseEntered { phase: Phase::Night, round: 3 }
    )));
    assert!(script.calls().iter().all(|c| c.round <= 2));
    assert!(matches!(
        report.events.last(),
        Some(GameEvent::GameOver { round: 2, winner: Some(Faction::Village) })
    ));
}

#[tokio::test]
async fn test_poisoned_victim_is_not_reported_protected() {
    let setup = table(&[
        ("w1", Role::Werewolf),
        ("guard", Role::Guard),
        ("witch", Role::Witch),
        ("v1", Role::Villager),
        ("v2", Role::Villager),
        ("v3", Role::Villager),
        ("v4", Role::Villager),
    ])
    .with_rules(one_round());
    let script = ScriptedDecisionMaker::new()
        .on_night("w1", 1, vec![Intent::new(Ability::Kill, "v1")])
        .on_night("guard", 1, vec![Intent::new(Ability::Protect, "v1")])
        .on_night("witch", 1, vec![Intent::new(Ability::Poison, "v1")]);

    let (report, _) = play(setup, script).await;

    assert_eq!(deaths(&report), vec![("v1".to_string(), DeathCause::Poison)]);
    assert_eq!(report.events_of("protected").count(), 0);
}

#[tokio::test]
async fn test_long_game_keeps_its_whole_transcript() {
    let setup = small_village().with_rules(Rules {
        discussion_rounds: 2_100,
        ..one_round()
    });

    let (report, _) = play(setup, ScriptedDecisionMaker::new()).await;

    assert!(report.events.len() > 10_000);
    assert_eq!(report.log.len(), report.events.len());
    assert_eq!(
        report.log.entries().next().map(|e| e.event_type),
        Some(EventType::GameStarted)
    );
    let json = report.log.export_json();
    assert_eq!(json.as_array().map(Vec::len), Some(report.events.len()));
}

#[tokio::test]
async fn test_werewolf_parity_win() {
    let setup = table(&[
        ("w1", Role::Werewolf),
        ("v1", Role::Villager),
        ("v2", Role::Villager),
    ])
    .with_rules(Rules {
        werewolf_parity_win: true,
        ..Rules::default()
    });
    let script =
        ScriptedDecisionMaker::new().on_night("w1", 1, vec![Intent::new(Ability::Kill, "v1")]);

    let (report, _) = play(setup, script).await;

    assert_eq!(report.winner, Some(Faction::Werewolf));
    assert_eq!(report.rounds, 1);
}

#[tokio::test]
async fn test_round_cap_stops_the_game() {
    let setup = small_village().with_rules(Rules {
        max_rounds: 3,
        ..Rules::default()
    });

    let (report, _) = play(setup, ScriptedDecisionMaker::new()).await;

    assert_eq!(report.winner, None);
    assert_eq!(report.rounds, 3);
    assert!(matches!(
        report.events.last(),
        Some(GameEvent::GameOver { winner: None, round: 3 })
    ));
    assert_eq!(report.log.stats().winner.as_deref(), Some("none"));
}

#[tokio::test]
async fn test_events_reach_the_sink() {
    let (sender, mut receiver) = tokio::sync::mpsc::unbounded_channel();
    let script: Arc<dyn DecisionMaker> = Arc::new(ScriptedDecisionMaker::new());
    let controller = GameController::with_shared_maker(
        small_village().with_rules(one_round()),
        TimeLimits::default(),
        script,
    )
    .unwrap()
    .with_event_sink(sender);

    let report = controller.run().await.unwrap();

    let mut forwarded = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        forwarded.push(event);
    }
    assert_eq!(forwarded, report.events);
    assert_eq!(report.log.len(), report.events.len());
}

#[test]
fn test_missing_decision_maker_is_a_configuration_error() {
    let err = GameController::new(small_village(), TimeLimits::default(), BTreeMap::new())
        .err()
        .unwrap();
    assert!(err.is_fatal());
    assert!(err.to_string().contains("no decision maker"));
}

#[test]
fn test_unplayable_table_is_rejected() {
    let setup = table(&[
        ("w1", Role::Werewolf),
        ("w2", Role::Werewolf),
        ("v1", Role::Villager),
        ("v2", Role::Villager),
    ]);
    let script: Arc<dyn DecisionMaker> = Arc::new(ScriptedDecisionMaker::new());
    let err = GameController::with_shared_maker(setup, TimeLimits::default(), script)
        .err()
        .unwrap();
    assert!(err.is_fatal());
}
