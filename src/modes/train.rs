//! Training mode for the tabular Q-learner
//!
//! Runs episodes in any `Environment`, choosing epsilon-greedy actions and
//! applying one Q-update per step. Progress is logged periodically,
//! checkpoints are written along the way, and the final table is saved at the
//! end.
//!
//! # Example
//!
//! ```rust,no_run
//! use arcade_rl::game::GameConfig;
//! use arcade_rl::modes::{TrainConfig, TrainMode};
//! use arcade_rl::rl::{Discretizer, SnakeEnvironment};
//! use std::path::PathBuf;
//!
//! # fn main() -> anyhow::Result<()> {
//! let game_config = GameConfig::default();
//! let discretizer = Discretizer::for_snake(&game_config);
//! let env = SnakeEnvironment::new(game_config, 7)?;
//!
//! let config = TrainConfig::new(10_000, PathBuf::from("models/snake.json"));
//! let mut train_mode = TrainMode::new(env, discretizer, config)?;
//! train_mode.run()?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::metrics::{EpisodeEnd, TrainingStats};
use crate::render::Flow;
use crate::rl::{
    Discretizer, Environment, EpsilonSchedule, LearnerConfig, ModelMetadata, TabularLearner,
    save_q_table,
};

/// Configuration for training mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Number of episodes to train
    pub num_episodes: usize,

    /// Path to save the final Q-table
    pub save_path: PathBuf,

    /// Save a checkpoint every N episodes
    pub checkpoint_frequency: usize,

    /// Log training progress every N episodes
    pub log_frequency: usize,

    /// Seed for action selection
    pub seed: u64,

    /// Draw every step through the environment's renderer
    pub render: bool,

    /// Q-learning hyperparameters
    pub learner: LearnerConfig,

    /// Exploration schedule
    pub epsilon: EpsilonSchedule,
}

impl TrainConfig {
    /// Create a new training configuration with defaults
    ///
    /// # Example
    ///
    /// ```rust
    /// use arcade_rl::modes::TrainConfig;
    /// use std::path::PathBuf;
    ///
    /// let config = TrainConfig::new(10000, PathBuf::from("models/snake.json"));
    /// assert_eq!(config.log_frequency, 100);
    /// ```
    pub fn new(num_episodes: usize, save_path: PathBuf) -> Self {
        Self {
            num_episodes,
            save_path,
            checkpoint_frequency: 1000,
            log_frequency: 100,
            seed: 0,
            render: false,
            learner: LearnerConfig::default(),
            epsilon: EpsilonSchedule::default(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.num_episodes == 0 {
            return Err("num_episodes must be at least 1".to_string());
        }
        if self.checkpoint_frequency == 0 || self.log_frequency == 0 {
            return Err("checkpoint and log frequencies must be at least 1".to_string());
        }
        self.learner.validate()?;
        self.epsilon.validate()
    }
}

/// Totals of one finished episode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeReport {
    pub reward: f32,
    pub steps: usize,
    pub score: u32,
    pub end: EpisodeEnd,
}

/// Training mode for the tabular Q-learner
pub struct TrainMode<E: Environment> {
    /// Environment providing experience
    env: E,

    /// Learner being trained
    learner: TabularLearner,

    /// Maps observations to Q-table keys
    discretizer: Discretizer,

    /// Training statistics tracker
    stats: TrainingStats,

    config: TrainConfig,

    /// Random source for exploration
    rng: SmallRng,

    /// Current episode number
    current_episode: usize,

    /// Total steps across all episodes
    total_steps: usize,

    /// Set when the renderer asks to stop
    stop_requested: bool,
}

impl<E: Environment> TrainMode<E> {
    /// Create a training mode with an empty Q-table
    pub fn new(env: E, discretizer: Discretizer, config: TrainConfig) -> Result<Self> {
        let learner = TabularLearner::new(env.action_count(), config.learner.clone());
        Self::with_learner(env, learner, discretizer, config)
    }

    /// Continue training an existing learner
    pub fn with_learner(
        env: E,
        learner: TabularLearner,
        discretizer: Discretizer,
        config: TrainConfig,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow!("Invalid training config: {e}"))?;

        if discretizer.dims() != env.observation_size() {
            bail!(
                "discretizer has {} dimensions but {} observations have {} values",
                discretizer.dims(),
                env.name(),
                env.observation_size()
            );
        }
        if learner.action_count() != env.action_count() {
            bail!(
                "learner has {} actions but {} has {}",
                learner.action_count(),
                env.name(),
                env.action_count()
            );
        }

        let rng = SmallRng::seed_from_u64(config.seed);

        Ok(Self {
            env,
            learner,
            discretizer,
            // 100-episode rolling window
            stats: TrainingStats::new(100),
            config,
            rng,
            current_episode: 0,
            total_steps: 0,
            stop_requested: false,
        })
    }

    /// Run the training loop
    ///
    /// Trains for the configured number of episodes, or until an attached
    /// renderer asks to stop, then saves the final Q-table.
    pub fn run(&mut self) -> Result<()> {
        // A rendering session owns the terminal until close
        if !self.config.render {
            self.print_header();
        }

        for episode in 0..self.config.num_episodes {
            self.current_episode = episode;

            let report = self.run_episode()?;
            self.stats
                .record_episode(report.reward, report.steps, report.score, report.end);
            self.stats.record_exploration(
                self.config.epsilon.value(episode + 1),
                self.learner.len(),
            );

            if (episode + 1) % self.config.log_frequency == 0 {
                self.print_progress(episode + 1);
            }

            if (episode + 1) % self.config.checkpoint_frequency == 0 {
                self.save_checkpoint()?;
            }

            if self.stop_requested {
                info!(episode = episode + 1, "training stopped by viewer");
                break;
            }
        }

        self.env.close().context("Failed to close renderer")?;
        self.save_model()?;

        println!("\nTraining complete!");
        println!("Final Q-table saved to: {:?}", self.config.save_path);
        println!("\nFinal Statistics:");
        println!("{}", self.stats.format_summary());

        Ok(())
    }

    /// Run a single training episode
    ///
    /// An environment error abandons the episode; it is reported as
    /// `EpisodeEnd::Aborted` rather than failing the whole run.
    pub fn run_episode(&mut self) -> Result<EpisodeReport> {
        let epsilon = self.config.epsilon.value(self.current_episode);
        let mut report = EpisodeReport {
            reward: 0.0,
            steps: 0,
            score: 0,
            end: EpisodeEnd::Aborted,
        };

        let mut key = match self.env.reset() {
            Ok((observation, _)) => self.discretizer.discretize(&observation),
            Err(err) => {
                warn!(episode = self.current_episode, %err, "reset failed, episode aborted");
                return Ok(report);
            }
        };

        loop {
            let action = self.learner.select_action(&key, epsilon, &mut self.rng);

            let step = match self.env.step(action) {
                Ok(step) => step,
                Err(err) => {
                    warn!(
                        episode = self.current_episode,
                        step = report.steps,
                        %err,
                        "episode aborted"
                    );
                    report.end = EpisodeEnd::Aborted;
                    break;
                }
            };

            report.reward += step.reward;
            report.steps += 1;
            self.total_steps += 1;

            let next_key = self.discretizer.discretize(&step.observation);
            if step.terminated && !self.learner.config().terminal_bootstrap {
                self.learner.update_terminal(&key, action, step.reward);
            } else {
                self.learner.update(&key, action, step.reward, &next_key);
            }
            key = next_key;

            if self.config.render && self.env.render()? == Flow::Quit {
                self.stop_requested = true;
            }

            if step.terminated {
                report.end = EpisodeEnd::Terminated;
                break;
            }
            if step.truncated {
                report.end = EpisodeEnd::Truncated;
                break;
            }
            if self.stop_requested {
                report.end = EpisodeEnd::Aborted;
                break;
            }
        }

        report.score = self.env.score();
        Ok(report)
    }

    pub fn learner(&self) -> &TabularLearner {
        &self.learner
    }

    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    fn metadata(&self) -> Result<ModelMetadata> {
        let game_config = self
            .env
            .game_config()
            .context("Failed to serialize game config")?;
        Ok(ModelMetadata::new(
            self.env.name(),
            game_config,
            &self.learner,
            &self.discretizer,
            self.total_steps,
            self.stats.total_episodes(),
        ))
    }

    /// Save a checkpoint next to the final model
    fn save_checkpoint(&self) -> Result<()> {
        let checkpoint_path = self
            .config
            .save_path
            .parent()
            .unwrap_or(Path::new("."))
            .join(format!("checkpoint_ep{}.json", self.current_episode + 1));

        save_q_table(&self.learner, &self.metadata()?, &checkpoint_path)
            .with_context(|| format!("Failed to save checkpoint to {:?}", checkpoint_path))?;

        info!(path = ?checkpoint_path, states = self.learner.len(), "checkpoint saved");

        Ok(())
    }

    fn save_model(&self) -> Result<()> {
        save_q_table(&self.learner, &self.metadata()?, &self.config.save_path).with_context(
            || format!("Failed to save final Q-table to {:?}", self.config.save_path),
        )
    }

    fn print_header(&self) {
        println!("{}", "=".repeat(70));
        println!("Q-Learning Training - {}", self.env.name());
        println!("{}", "=".repeat(70));
        println!("Episodes: {}", self.config.num_episodes);
        println!(
            "Observation: {} values, {} actions",
            self.env.observation_size(),
            self.env.action_count()
        );
        println!("Learner Config:");
        println!("  Alpha: {}", self.config.learner.alpha);
        println!("  Gamma: {}", self.config.learner.gamma);
        println!(
            "  Terminal bootstrap: {}",
            self.config.learner.terminal_bootstrap
        );
        println!(
            "  Epsilon: {} -> {} (x{} per episode)",
            self.config.epsilon.start, self.config.epsilon.min, self.config.epsilon.decay
        );
        println!("Checkpoints: Every {} episodes", self.config.checkpoint_frequency);
        println!("Logging: Every {} episodes", self.config.log_frequency);
        println!("Save path: {:?}", self.config.save_path);
        println!("{}", "=".repeat(70));
        println!();
    }

    fn print_progress(&self, episode: usize) {
        info!(
            "[Episode {}/{}] {}",
            episode,
            self.config.num_episodes,
            self.stats.format_summary()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arcade::{BreakoutConfig, VolleyConfig};
    use crate::game::GameConfig;
    use crate::rl::{BreakoutEnvironment, SnakeEnvironment, VolleyEnvironment, load_q_table};
    use tempfile::TempDir;

    fn snake_mode(config: TrainConfig) -> TrainMode<SnakeEnvironment> {
        let mut game_config = GameConfig::small();
        game_config.max_steps = 50;
        let discretizer = Discretizer::for_snake(&game_config);
        let env = SnakeEnvironment::new(game_config, 3).unwrap();
        TrainMode::new(env, discretizer, config).unwrap()
    }

    #[test]
    fn test_train_config_creation() {
        let config = TrainConfig::new(1000, PathBuf::from("test.json"));
        assert_eq!(config.num_episodes, 1000);
        assert_eq!(config.save_path, PathBuf::from("test.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_train_config_validation() {
        let mut config = TrainConfig::new(0, PathBuf::from("test.json"));
        assert!(config.validate().is_err());

        config.num_episodes = 10;
        config.learner.alpha = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_mismatched_discretizer() {
        let game_config = GameConfig::small();
        let env = SnakeEnvironment::new(game_config, 1).unwrap();
        let discretizer = Discretizer::for_volley(&VolleyConfig::default());
        let config = TrainConfig::new(1, PathBuf::from("unused.json"));

        assert!(TrainMode::new(env, discretizer, config).is_err());
    }

    #[test]
    fn test_run_single_episode() {
        let temp_dir = TempDir::new().unwrap();
        let config = TrainConfig::new(1, temp_dir.path().join("model.json"));
        let mut train_mode = snake_mode(config);

        let report = train_mode.run_episode().unwrap();
        assert!(report.steps > 0);
        assert!(report.steps <= 50);
        assert_ne!(report.end, EpisodeEnd::Aborted);
        assert_eq!(train_mode.total_steps(), report.steps);
        assert!(!train_mode.learner().is_empty());
    }

    #[test]
    fn test_run_saves_model_and_checkpoints() {
        let temp_dir = TempDir::new().unwrap();
        let save_path = temp_dir.path().join("models").join("snake.json");
        let mut config = TrainConfig::new(4, save_path.clone());
        config.checkpoint_frequency = 2;
        config.log_frequency = 2;

        let mut train_mode = snake_mode(config);
        train_mode.run().unwrap();

        assert_eq!(train_mode.stats().total_episodes(), 4);
        assert!(save_path.exists());
        assert!(temp_dir.path().join("models").join("checkpoint_ep2.json").exists());
        assert!(temp_dir.path().join("models").join("checkpoint_ep4.json").exists());

        let (learner, metadata) = load_q_table(&save_path).unwrap();
        assert_eq!(metadata.game, "snake");
        assert_eq!(metadata.episodes_trained, 4);
        assert_eq!(metadata.training_steps, train_mode.total_steps());
        assert!(metadata.trained_on(&train_mode.env.game_config().unwrap()));
        assert_eq!(learner.len(), train_mode.learner().len());
    }

    #[test]
    fn test_epsilon_recorded_after_episode() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = TrainConfig::new(2, temp_dir.path().join("model.json"));
        config.epsilon.decay = 0.5;

        let mut train_mode = snake_mode(config);
        train_mode.run().unwrap();

        assert!((train_mode.stats().epsilon() - 0.25).abs() < 1e-9);
        assert_eq!(train_mode.stats().table_size(), train_mode.learner().len());
    }

    #[test]
    fn test_same_seed_same_training() {
        let temp_dir = TempDir::new().unwrap();
        let mut first = snake_mode(TrainConfig::new(3, temp_dir.path().join("a.json")));
        let mut second = snake_mode(TrainConfig::new(3, temp_dir.path().join("b.json")));

        for _ in 0..3 {
            assert_eq!(
                first.run_episode().unwrap(),
                second.run_episode().unwrap()
            );
        }
        assert_eq!(first.learner().len(), second.learner().len());
    }

    #[test]
    fn test_trains_variant_games() {
        let temp_dir = TempDir::new().unwrap();

        let mut volley_config = VolleyConfig::default();
        volley_config.max_steps = 30;
        let discretizer = Discretizer::for_volley(&volley_config);
        let env = VolleyEnvironment::new(volley_config, 5).unwrap();
        let mut volley = TrainMode::new(
            env,
            discretizer,
            TrainConfig::new(2, temp_dir.path().join("volley.json")),
        )
        .unwrap();
        volley.run().unwrap();
        assert_eq!(volley.stats().total_episodes(), 2);

        let mut breakout_config = BreakoutConfig::default();
        breakout_config.max_steps = 30;
        let discretizer = Discretizer::for_breakout(&breakout_config);
        let env = BreakoutEnvironment::new(breakout_config, 5).unwrap();
        let mut breakout = TrainMode::new(
            env,
            discretizer,
            TrainConfig::new(2, temp_dir.path().join("breakout.json")),
        )
        .unwrap();
        breakout.run().unwrap();

        let (_, metadata) = load_q_table(&temp_dir.path().join("breakout.json")).unwrap();
        assert_eq!(metadata.game, "breakout");
    }
}
