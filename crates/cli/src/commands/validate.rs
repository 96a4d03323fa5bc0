//! werewolf validate command

use clap::Args;
use shared::GameConfig;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ValidateCommand {
    /// Configuration file (.yaml, .yml or .json)
    #[arg(short, long)]
    pub config: PathBuf,
}

impl ValidateCommand {
    pub fn run(&self) -> anyhow::Result<()> {
        let config = GameConfig::from_file(&self.config)?;
        let plan = config.build()?;
        let rules = &plan.setup.rules;

        println!("✓ {} is a valid game", self.config.display());
        println!("  Agents: {}", plan.setup.players.len());
        for player in &plan.setup.players {
            println!("    {:<12} {}", player.id.as_str(), player.role);
        }
        println!(
            "  Ties: {:?}, speaking order: {:?}, round cap: {}",
            rules.tie_policy, rules.speaking_order, rules.max_rounds
        );
        Ok(())
    }
}
