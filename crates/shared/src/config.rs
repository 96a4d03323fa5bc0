//! Configuration types for a game
//!
//! A [`GameConfig`] is read once (YAML or JSON), validated, and turned into
//! a domain [`GameSetup`] plus the [`TimeLimits`] of each phase. Nothing
//! here is consulted again once the game has started.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use werewolf_domain::{
    Ability, Capabilities, Faction, GameSetup, IndependentGoal, PlayerSpec, RevealPolicy, Role,
    RoleRegistry, Rules, SpeakingOrder, TiePolicy, UsageLimit,
};

use crate::error::{ConfigError, RoleNotFoundError};

/// Root of a game configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GameConfig {
    /// Seats, in order
    pub players: Vec<PlayerConfig>,

    #[serde(default)]
    pub rules: RulesConfig,

    /// Per-role ability limit overrides: `role -> ability -> limit`
    #[serde(default)]
    pub usage_limits: BTreeMap<String, BTreeMap<String, LimitConfig>>,

    #[serde(default)]
    pub time_limits: TimeLimits,

    #[serde(default)]
    pub custom_roles: Vec<CustomRoleConfig>,
}

/// One seat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PlayerConfig {
    pub id: String,

    /// Display name (defaults to the id)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub role: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiePolicyConfig {
    #[default]
    NoElimination,
    Runoff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeakingOrderConfig {
    #[default]
    Seating,
    Rotating,
}

/// Table rules; every field is optional in the file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct RulesConfig {
    pub tie_policy: TiePolicyConfig,
    pub speaking_order: SpeakingOrderConfig,
    pub discussion_rounds: u32,
    pub first_night_kill: bool,
    pub guard_repeat_target: bool,
    pub double_protection_kills: bool,
    pub poison_suppresses_retaliation: bool,
    pub werewolf_parity_win: bool,
    pub last_words: bool,
    pub max_vote_attempts: u32,
    pub max_rounds: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self::from(&Rules::default())
    }
}

impl From<&Rules> for RulesConfig {
    fn from(rules: &Rules) -> Self {
        Self {
            tie_policy: match rules.tie_policy {
                TiePolicy::NoElimination => TiePolicyConfig::NoElimination,
                TiePolicy::Runoff => TiePolicyConfig::Runoff,
            },
            speaking_order: match rules.speaking_order {
                SpeakingOrder::Seating => SpeakingOrderConfig::Seating,
                SpeakingOrder::Rotating => SpeakingOrderConfig::Rotating,
            },
            discussion_rounds: rules.discussion_rounds,
            first_night_kill: rules.first_night_kill,
            guard_repeat_target: rules.guard_repeat_target,
            double_protection_kills: rules.double_protection_kills,
            poison_suppresses_retaliation: rules.poison_suppresses_retaliation,
            werewolf_parity_win: rules.werewolf_parity_win,
            last_words: rules.last_words,
            max_vote_attempts: rules.max_vote_attempts,
            max_rounds: rules.max_rounds,
        }
    }
}

impl RulesConfig {
    pub fn to_rules(&self) -> Rules {
        Rules {
            tie_policy: match self.tie_policy {
                TiePolicyConfig::NoElimination => TiePolicy::NoElimination,
                TiePolicyConfig::Runoff => TiePolicy::Runoff,
            },
            speaking_order: match self.speaking_order {
                SpeakingOrderConfig::Seating => SpeakingOrder::Seating,
                SpeakingOrderConfig::Rotating => SpeakingOrder::Rotating,
            },
            discussion_rounds: self.discussion_rounds,
            first_night_kill: self.first_night_kill,
            guard_repeat_target: self.guard_repeat_target,
            double_protection_kills: self.double_protection_kills,
            poison_suppresses_retaliation: self.poison_suppresses_retaliation,
            werewolf_parity_win: self.werewolf_parity_win,
            last_words: self.last_words,
            max_vote_attempts: self.max_vote_attempts,
            max_rounds: self.max_rounds,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitKeyword {
    Unlimited,
}

/// Either a number of uses per game or `unlimited`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LimitConfig {
    Uses(u32),
    Keyword(LimitKeyword),
}

impl From<LimitConfig> for UsageLimit {
    fn from(limit: LimitConfig) -> Self {
        match limit {
            LimitConfig::Uses(n) => UsageLimit::PerGame(n),
            LimitConfig::Keyword(LimitKeyword::Unlimited) => UsageLimit::Unlimited,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactionConfig {
    Werewolf,
    Village,
    Independent,
}

impl From<FactionConfig> for Faction {
    fn from(faction: FactionConfig) -> Self {
        match faction {
            FactionConfig::Werewolf => Faction::Werewolf,
            FactionConfig::Village => Faction::Village,
            FactionConfig::Independent => Faction::Independent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealConfig {
    #[default]
    None,
    Faction,
    Role,
}

impl From<RevealConfig> for RevealPolicy {
    fn from(reveal: RevealConfig) -> Self {
        match reveal {
            RevealConfig::None => RevealPolicy::None,
            RevealConfig::Faction => RevealPolicy::Faction,
            RevealConfig::Role => RevealPolicy::Role,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalConfig {
    VotedOut,
    LastStanding,
}

impl From<GoalConfig> for IndependentGoal {
    fn from(goal: GoalConfig) -> Self {
        match goal {
            GoalConfig::VotedOut => IndependentGoal::VotedOut,
            GoalConfig::LastStanding => IndependentGoal::LastStanding,
        }
    }
}

/// A role beyond the six built-in ones
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CustomRoleConfig {
    pub name: String,
    pub faction: FactionConfig,

    #[serde(default)]
    pub abilities: Vec<String>,

    #[serde(default)]
    pub limits: BTreeMap<String, LimitConfig>,

    #[serde(default)]
    pub reveal: RevealConfig,

    #[serde(default)]
    pub knows_faction_mates: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<GoalConfig>,
}

impl CustomRoleConfig {
    fn capabilities(&self) -> Result<Capabilities, ConfigError> {
        let mut caps = Capabilities::new(self.faction.into()).with_reveal(self.reveal.into());
        for name in &self.abilities {
            caps = caps.with_ability(parse_ability(&self.name, name)?);
        }
        for (name, limit) in &self.limits {
            let ability = parse_ability(&self.name, name)?;
            if !caps.has(ability) {
                return Err(ConfigError::Invalid(format!(
                    "role '{}' sets a limit on '{}' which it does not have",
                    self.name, name
                )));
            }
            caps = caps.with_limit(ability, (*limit).into());
        }
        if self.knows_faction_mates {
            caps = caps.knowing_faction_mates();
        }
        if let Some(goal) = self.goal {
            if self.faction != FactionConfig::Independent {
                return Err(ConfigError::Invalid(format!(
                    "role '{}' has an independent goal but is not independent",
                    self.name
                )));
            }
            caps = caps.with_goal(goal.into());
        }
        Ok(caps)
    }
}

/// Per-phase decision time limits, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct TimeLimits {
    pub night_ms: u64,
    pub discussion_ms: u64,
    pub vote_ms: u64,
    /// Retaliation target and last words
    pub death_ms: u64,
}

impl Default for TimeLimits {
    fn default() -> Self {
        Self {
            night_ms: 30_000,
            discussion_ms: 60_000,
            vote_ms: 30_000,
            death_ms: 30_000,
        }
    }
}

impl TimeLimits {
    /// The same limit for every phase
    pub fn uniform(limit: Duration) -> Self {
        let ms = limit.as_millis().min(u64::MAX as u128) as u64;
        Self {
            night_ms: ms,
            discussion_ms: ms,
            vote_ms: ms,
            death_ms: ms,
        }
    }

    pub fn night(&self) -> Duration {
        Duration::from_millis(self.night_ms)
    }

    pub fn discussion(&self) -> Duration {
        Duration::from_millis(self.discussion_ms)
    }

    pub fn vote(&self) -> Duration {
        Duration::from_millis(self.vote_ms)
    }

    pub fn death(&self) -> Duration {
        Duration::from_millis(self.death_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = [
            ("night_ms", self.night_ms),
            ("discussion_ms", self.discussion_ms),
            ("vote_ms", self.vote_ms),
            ("death_ms", self.death_ms),
        ];
        match limits.iter().find(|(_, ms)| *ms == 0) {
            Some((name, _)) => Err(ConfigError::Invalid(format!(
                "time limit {} must be greater than zero",
                name
            ))),
            None => Ok(()),
        }
    }
}

/// A validated configuration, ready to start a game
#[derive(Debug, Clone)]
pub struct GamePlan {
    pub setup: GameSetup,
    pub time_limits: TimeLimits,
}

impl GameConfig {
    /// Load configuration from a YAML or JSON file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml(&content),
            "json" => Self::from_json(&content),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// The classic 8-agent table: 2 werewolves, seer, witch, hunter, 3 villagers
    pub fn sample() -> Self {
        let seats = [
            ("alice", "Alice", "werewolf"),
            ("bob", "Bob", "werewolf"),
            ("carol", "Carol", "seer"),
            ("dave", "Dave", "witch"),
            ("erin", "Erin", "hunter"),
            ("frank", "Frank", "villager"),
            ("grace", "Grace", "villager"),
            ("heidi", "Heidi", "villager"),
        ];
        Self {
            players: seats
                .iter()
                .map(|(id, name, role)| PlayerConfig {
                    id: id.to_string(),
                    name: Some(name.to_string()),
                    role: role.to_string(),
                })
                .collect(),
            rules: RulesConfig::default(),
            usage_limits: BTreeMap::new(),
            time_limits: TimeLimits::default(),
            custom_roles: Vec::new(),
        }
    }

    /// Build the role registry: built-ins, then custom roles, then overrides
    pub fn registry(&self) -> Result<RoleRegistry, ConfigError> {
        let mut registry = RoleRegistry::standard();

        for custom in &self.custom_roles {
            let name = custom.name.trim();
            if name.is_empty() {
                return Err(ConfigError::Invalid("custom role with an empty name".into()));
            }
            if Role::builtin(name).is_some() {
                return Err(ConfigError::Invalid(format!(
                    "custom role '{}' shadows a built-in role",
                    name
                )));
            }
            let role = Role::Custom(name.to_string());
            if registry.register(role, custom.capabilities()?).is_some() {
                return Err(ConfigError::Invalid(format!(
                    "custom role '{}' declared twice",
                    name
                )));
            }
        }

        for (role_name, limits) in &self.usage_limits {
            let role = resolve_role(&registry, role_name)?;
            for (ability_name, limit) in limits {
                let ability = parse_ability(role_name, ability_name)?;
                let holds = registry
                    .capabilities_of(&role)
                    .map(|caps| caps.has(ability))
                    .unwrap_or(false);
                if !holds {
                    return Err(ConfigError::Invalid(format!(
                        "role '{}' has no ability '{}' to limit",
                        role_name, ability_name
                    )));
                }
                registry
                    .set_limit(&role, ability, (*limit).into())
                    .map_err(|e| unknown_role(&registry, &e.0))?;
            }
        }

        Ok(registry)
    }

    /// Validate everything and produce the game to run
    pub fn build(&self) -> Result<GamePlan, ConfigError> {
        let registry = self.registry()?;
        self.time_limits.validate()?;

        let mut players = Vec::with_capacity(self.players.len());
        for player in &self.players {
            let role = resolve_role(&registry, &player.role)?;
            let name = player.name.clone().unwrap_or_else(|| player.id.clone());
            players.push(PlayerSpec::new(player.id.as_str(), name, role));
        }

        let setup = GameSetup::new(players)
            .with_registry(registry)
            .with_rules(self.rules.to_rules());
        setup.validate()?;

        Ok(GamePlan {
            setup,
            time_limits: self.time_limits,
        })
    }
}

fn resolve_role(registry: &RoleRegistry, name: &str) -> Result<Role, ConfigError> {
    registry
        .resolve_name(name)
        .map_err(|e| unknown_role(registry, &e.0))
}

fn unknown_role(registry: &RoleRegistry, name: &str) -> ConfigError {
    RoleNotFoundError {
        role_id: name.to_string(),
        available_roles: registry.roles().map(|(role, _)| role.id().to_string()).collect(),
    }
    .into()
}

fn parse_ability(role: &str, name: &str) -> Result<Ability, ConfigError> {
    Ability::parse(name).ok_or_else(|| ConfigError::UnknownAbility {
        role: role.to_string(),
        ability: name.to_string(),
    })
}
