use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::network::layer::WeightInit;
use crate::network::optimizer::OptimizerKind;

/// Top-level configuration, loadable from TOML. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub agent: AgentConfig,
    pub lookahead: LookAheadConfig,
    pub game: GameConfig,
    pub training: TrainerConfig,
}

/// Hyperparameters of the double-Q agent and its two perceptrons.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub exploration: f32,
    /// Learning rate of both perceptrons.
    pub alpha: f32,
    pub gamma: f32,
    pub experience_replays: usize,
    pub double_q_learning_steps: usize,
    pub lookahead_prob: f32,
    pub models_dir: PathBuf,
    pub optimizer: OptimizerKind,
    pub init: WeightInit,
    pub init_std: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            exploration: 0.05,
            alpha: 0.1,
            gamma: 0.9,
            experience_replays: 4,
            double_q_learning_steps: 100,
            lookahead_prob: 0.1,
            models_dir: PathBuf::from("models"),
            optimizer: OptimizerKind::Adam,
            init: WeightInit::Zeros,
            init_std: 0.01,
        }
    }
}

/// Genetic search over action sequences.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookAheadConfig {
    pub population: usize,
    pub generations: usize,
    /// Length of every candidate action sequence.
    pub depth: usize,
    /// Sequences carried unchanged into the next generation.
    pub elite: usize,
    pub mutation_rate: f32,
}

impl Default for LookAheadConfig {
    fn default() -> Self {
        LookAheadConfig {
            population: 30,
            generations: 10,
            depth: 5,
            elite: 6,
            mutation_rate: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub size: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig { size: 4 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub num_games: usize,
    /// Hard cap on moves per game.
    pub max_moves: usize,
    /// Save both perceptrons every this many games. 0 saves only at the end.
    pub save_every: usize,
    pub stats_path: Option<PathBuf>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            num_games: 1000,
            max_moves: 5000,
            save_every: 100,
            stats_path: Some(PathBuf::from("stats.csv")),
        }
    }
}

fn probability(name: &str, value: f32) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::Validation(format!("{} must be in [0, 1]", name)));
    }
    Ok(())
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            log::warn!("config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let agent = &self.agent;
        probability("agent.exploration", agent.exploration)?;
        probability("agent.lookahead_prob", agent.lookahead_prob)?;
        probability("agent.gamma", agent.gamma)?;
        if !(agent.alpha > 0.0) {
            return Err(ConfigError::Validation("agent.alpha must be > 0".into()));
        }
        if agent.double_q_learning_steps == 0 {
            return Err(ConfigError::Validation(
                "agent.double_q_learning_steps must be > 0".into(),
            ));
        }
        if agent.init == WeightInit::Normal && !(agent.init_std > 0.0) {
            return Err(ConfigError::Validation(
                "agent.init_std must be > 0 for normal init".into(),
            ));
        }

        let lookahead = &self.lookahead;
        probability("lookahead.mutation_rate", lookahead.mutation_rate)?;
        if lookahead.population < 2 {
            return Err(ConfigError::Validation(
                "lookahead.population must be >= 2".into(),
            ));
        }
        if lookahead.elite == 0 || lookahead.elite > lookahead.population {
            return Err(ConfigError::Validation(
                "lookahead.elite must be in [1, lookahead.population]".into(),
            ));
        }
        if lookahead.depth == 0 {
            return Err(ConfigError::Validation("lookahead.depth must be > 0".into()));
        }

        if self.game.size < 2 {
            return Err(ConfigError::Validation("game.size must be >= 2".into()));
        }

        if self.training.num_games == 0 {
            return Err(ConfigError::Validation(
                "training.num_games must be > 0".into(),
            ));
        }
        if self.training.max_moves == 0 {
            return Err(ConfigError::Validation(
                "training.max_moves must be > 0".into(),
            ));
        }
        Ok(())
    }
}
