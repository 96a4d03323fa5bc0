//! werewolf init command

use anyhow::bail;
use clap::Args;
use shared::GameConfig;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct InitCommand {
    /// Directory to write the configuration into
    #[arg(default_value = ".")]
    pub directory: PathBuf,

    /// Write JSON instead of YAML
    #[arg(long)]
    pub json: bool,

    /// Overwrite an existing configuration
    #[arg(long)]
    pub force: bool,
}

impl InitCommand {
    pub fn run(&self) -> anyhow::Result<()> {
        let path = self.write()?;
        println!("✓ Sample game written to {}", path.display());
        println!("  Play it with: werewolf run --config {}", path.display());
        Ok(())
    }

    /// Write the sample configuration, returning its path
    pub fn write(&self) -> anyhow::Result<PathBuf> {
        std::fs::create_dir_all(&self.directory)?;
        let path = self.target();
        if path.exists() && !self.force {
            bail!("{} already exists (use --force to overwrite)", path.display());
        }

        let config = GameConfig::sample();
        let content = if self.json {
            serde_json::to_string_pretty(&config)?
        } else {
            config.to_yaml()?
        };
        std::fs::write(&path, content)?;
        Ok(path)
    }

    fn target(&self) -> PathBuf {
        let file = if self.json { "werewolf.json" } else { "werewolf.yaml" };
        Path::new(&self.directory).join(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init(directory: &Path, json: bool, force: bool) -> InitCommand {
        InitCommand {
            directory: directory.to_path_buf(),
            json,
            force,
        }
    }

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();

        let yaml = init(dir.path(), false, false).write().unwrap();
        let json = init(dir.path(), true, false).write().unwrap();

        assert_eq!(GameConfig::from_file(&yaml).unwrap(), GameConfig::sample());
        assert_eq!(GameConfig::from_file(&json).unwrap(), GameConfig::sample());
    }

    #[test]
    fn test_init_keeps_existing_config() {
        let dir = tempfile::tempdir().unwrap();
        init(dir.path(), false, false).write().unwrap();

        assert!(init(dir.path(), false, false).write().is_err());
        assert!(init(dir.path(), false, true).write().is_ok());
    }
}
