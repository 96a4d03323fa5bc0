//! werewolf run command

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use engine::{DecisionMaker, GameController, GameReport};
use shared::{EngineError, GameConfig, GamePlan};
use tracing::info;

use crate::agents::RandomDecisionMaker;

#[derive(Debug, Args)]
pub struct RunCommand {
    /// Configuration file (.yaml, .yml or .json)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Number of games to play
    #[arg(short, long, default_value_t = 1)]
    pub games: u32,

    /// Seed of the random agents
    #[arg(short, long, default_value_t = 42)]
    pub seed: u64,

    /// Directory receiving the event log of each game as JSON
    #[arg(short, long)]
    pub export: Option<PathBuf>,

    /// Pause between games, in milliseconds
    #[arg(long, default_value_t = 0)]
    pub delay_ms: u64,
}

impl RunCommand {
    pub async fn run(&self) -> anyhow::Result<()> {
        let plan = GameConfig::from_file(&self.config)?.build()?;
        if let Some(dir) = &self.export {
            std::fs::create_dir_all(dir)?;
        }

        for game in 0..self.games {
            if game > 0 && self.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            }
            let seed = self.seed.wrapping_add(u64::from(game) * 1_000);
            let report = play(plan.clone(), seed).await?;
            let stats = report.log.stats();

            println!(
                "Game {} ({}): winner {} after {} rounds, {} deaths, {} recovered errors",
                game + 1,
                report.game_id(),
                report.winner.map_or("nobody", |f| f.display_name()),
                report.rounds,
                stats.deaths,
                stats.recovered_errors,
            );

            if let Some(dir) = &self.export {
                let path = export(&report, dir, game + 1)?;
                info!(path = %path.display(), "📝 Event log written");
            }
        }
        Ok(())
    }
}

/// Play one game with a random agent in every seat
pub async fn play(plan: GamePlan, seed: u64) -> Result<GameReport, EngineError> {
    let makers: BTreeMap<_, Arc<dyn DecisionMaker>> = plan
        .setup
        .players
        .iter()
        .enumerate()
        .map(|(seat, player)| {
            let agent = RandomDecisionMaker::new(seed.wrapping_add(seat as u64));
            (player.id.clone(), Arc::new(agent) as Arc<dyn DecisionMaker>)
        })
        .collect();

    GameController::from_plan(plan, makers)?.run().await
}

/// Write the event log of a game, returning the file path
pub fn export(report: &GameReport, dir: &Path, number: u32) -> anyhow::Result<PathBuf> {
    let path = dir.join(format!("game-{:03}-{}.json", number, report.game_id()));
    std::fs::write(&path, serde_json::to_string_pretty(&report.log.export_json())?)?;
    Ok(path)
}
