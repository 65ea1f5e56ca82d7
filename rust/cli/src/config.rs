//! Layered CLI configuration: built-in defaults, then the TOML file named by
//! `TACTICA_CONFIG`, then `TACTICA_*` environment variables. Command-line
//! flags win over all of them and are applied by the commands themselves.

use serde::{Deserialize, Serialize};
use std::fs;
use std::str::FromStr;
use tactica_server::EngineSettings;

pub const CONFIG_ENV: &str = "TACTICA_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub settings: EngineSettings,
    pub seed: Option<u64>,
    pub bot: String,
}

impl Default for Config {
    /// Headless runs use short timers; a bot never needs thinking time.
    fn default() -> Self {
        Self {
            settings: EngineSettings {
                turn_duration_ms: 500,
                transition_delay_ms: 10,
                combat_round_ms: 200,
                ..EngineSettings::default()
            },
            seed: None,
            bot: "baseline".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    Default,
    File,
    Env,
}

#[derive(Debug, Clone, Copy)]
pub struct ConfigSources {
    pub turn_duration_ms: ValueSource,
    pub transition_delay_ms: ValueSource,
    pub combat_round_ms: ValueSource,
    pub statistics_retention_secs: ValueSource,
    pub actions_per_turn: ValueSource,
    pub wins_to_victory: ValueSource,
    pub seed: ValueSource,
    pub bot: ValueSource,
}

impl Default for ConfigSources {
    fn default() -> Self {
        Self {
            turn_duration_ms: ValueSource::Default,
            transition_delay_ms: ValueSource::Default,
            combat_round_ms: ValueSource::Default,
            statistics_retention_secs: ValueSource::Default,
            actions_per_turn: ValueSource::Default,
            wins_to_victory: ValueSource::Default,
            seed: ValueSource::Default,
            bot: ValueSource::Default,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigResolved {
    pub config: Config,
    pub sources: ConfigSources,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "cannot read {}: {}", CONFIG_ENV, e),
            ConfigError::Parse(e) => write!(f, "cannot parse config file: {}", e),
            ConfigError::Invalid(msg) => write!(f, "{}", msg),
        }
    }
}

pub fn load_with_sources() -> Result<ConfigResolved, ConfigError> {
    let mut cfg = Config::default();
    let mut sources = ConfigSources::default();

    if let Ok(path) = std::env::var(CONFIG_ENV)
        && !path.is_empty()
    {
        let s = fs::read_to_string(path)?;
        let f: FileConfig = toml::from_str(&s)?;
        if let Some(v) = f.turn_duration_ms {
            cfg.settings.turn_duration_ms = v;
            sources.turn_duration_ms = ValueSource::File;
        }
        if let Some(v) = f.transition_delay_ms {
            cfg.settings.transition_delay_ms = v;
            sources.transition_delay_ms = ValueSource::File;
        }
        if let Some(v) = f.combat_round_ms {
            cfg.settings.combat_round_ms = v;
            sources.combat_round_ms = ValueSource::File;
        }
        if let Some(v) = f.statistics_retention_secs {
            cfg.settings.statistics_retention_secs = v;
            sources.statistics_retention_secs = ValueSource::File;
        }
        if let Some(v) = f.actions_per_turn {
            cfg.settings.actions_per_turn = v;
            sources.actions_per_turn = ValueSource::File;
        }
        if let Some(v) = f.wins_to_victory {
            cfg.settings.wins_to_victory = v;
            sources.wins_to_victory = ValueSource::File;
        }
        if let Some(v) = f.seed {
            cfg.seed = Some(v);
            sources.seed = ValueSource::File;
        }
        if let Some(v) = f.bot {
            cfg.bot = v;
            sources.bot = ValueSource::File;
        }
    }

    if let Some(v) = env_parsed("TACTICA_TURN_DURATION_MS")? {
        cfg.settings.turn_duration_ms = v;
        sources.turn_duration_ms = ValueSource::Env;
    }
    if let Some(v) = env_parsed("TACTICA_TRANSITION_DELAY_MS")? {
        cfg.settings.transition_delay_ms = v;
        sources.transition_delay_ms = ValueSource::Env;
    }
    if let Some(v) = env_parsed("TACTICA_COMBAT_ROUND_MS")? {
        cfg.settings.combat_round_ms = v;
        sources.combat_round_ms = ValueSource::Env;
    }
    if let Some(v) = env_parsed("TACTICA_STATISTICS_RETENTION_SECS")? {
        cfg.settings.statistics_retention_secs = v;
        sources.statistics_retention_secs = ValueSource::Env;
    }
    if let Some(v) = env_parsed("TACTICA_ACTIONS_PER_TURN")? {
        cfg.settings.actions_per_turn = v;
        sources.actions_per_turn = ValueSource::Env;
    }
    if let Some(v) = env_parsed("TACTICA_WINS_TO_VICTORY")? {
        cfg.settings.wins_to_victory = v;
        sources.wins_to_victory = ValueSource::Env;
    }
    if let Some(v) = env_parsed("TACTICA_SEED")? {
        cfg.seed = Some(v);
        sources.seed = ValueSource::Env;
    }
    if let Ok(bot) = std::env::var("TACTICA_BOT")
        && !bot.is_empty()
    {
        cfg.bot = bot;
        sources.bot = ValueSource::Env;
    }

    cfg.settings
        .validate()
        .map_err(|e| ConfigError::Invalid(e.to_string()))?;
    Ok(ConfigResolved {
        config: cfg,
        sources,
    })
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    turn_duration_ms: Option<u64>,
    #[serde(default)]
    transition_delay_ms: Option<u64>,
    #[serde(default)]
    combat_round_ms: Option<u64>,
    #[serde(default)]
    statistics_retention_secs: Option<u64>,
    #[serde(default)]
    actions_per_turn: Option<u32>,
    #[serde(default)]
    wins_to_victory: Option<u32>,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    bot: Option<String>,
}

/// An unset or empty variable is `None`; anything else must parse.
fn env_parsed<T: FromStr>(name: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(name) {
        Ok(raw) if !raw.is_empty() => raw
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(format!("Invalid {}: {}", name, raw))),
        _ => Ok(None),
    }
}
