//! Evaluation mode for trained Q-tables
//!
//! Loads a saved Q-table and plays greedy episodes with it. States the table
//! never visited get a uniformly random action. Optionally every step is
//! drawn through the environment's renderer with a delay between frames.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::render::Flow;
use crate::rl::{Discretizer, Environment, ModelMetadata, TabularLearner, load_q_table};

/// Configuration for evaluation mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Number of episodes to play
    pub num_episodes: usize,

    /// Draw every step through the environment's renderer
    pub render: bool,

    /// Pause between rendered frames
    pub tick_delay: Duration,

    /// Seed for actions on unseen states
    pub seed: u64,
}

impl EvalConfig {
    pub fn new(num_episodes: usize) -> Self {
        Self {
            num_episodes,
            render: false,
            tick_delay: Duration::from_millis(50),
            seed: 0,
        }
    }
}

/// Outcome of one evaluation episode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeSummary {
    pub reward: f32,
    pub steps: usize,
    pub score: u32,
    /// Steps that hit a state missing from the table
    pub unseen_states: usize,
}

/// Results of an evaluation run
#[derive(Debug, Clone, Default)]
pub struct EvalReport {
    pub episodes: Vec<EpisodeSummary>,
}

impl EvalReport {
    pub fn mean_reward(&self) -> f32 {
        if self.episodes.is_empty() {
            0.0
        } else {
            self.episodes.iter().map(|e| e.reward).sum::<f32>() / self.episodes.len() as f32
        }
    }

    pub fn mean_steps(&self) -> f32 {
        if self.episodes.is_empty() {
            0.0
        } else {
            self.episodes.iter().map(|e| e.steps).sum::<usize>() as f32
                / self.episodes.len() as f32
        }
    }
}

/// Plays greedy episodes with a trained learner
pub struct EvalMode<E: Environment> {
    env: E,
    learner: TabularLearner,
    discretizer: Discretizer,
    config: EvalConfig,
    rng: SmallRng,
    should_quit: bool,
}

impl<E: Environment> EvalMode<E> {
    pub fn new(
        env: E,
        learner: TabularLearner,
        discretizer: Discretizer,
        config: EvalConfig,
    ) -> Result<Self> {
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
                "Q-table has {} actions but {} has {}",
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
            config,
            rng,
            should_quit: false,
        })
    }

    /// Load a saved Q-table and check that it was trained on this game and
    /// configuration
    pub fn from_file(env: E, model_path: &Path, config: EvalConfig) -> Result<Self> {
        let (learner, metadata) = load_q_table(model_path)
            .with_context(|| format!("Failed to load Q-table from {:?}", model_path))?;

        if metadata.game != env.name() {
            bail!(
                "Q-table at {:?} was trained on {}, not {}",
                model_path,
                metadata.game,
                env.name()
            );
        }

        let game_config = env
            .game_config()
            .context("Failed to serialize game config")?;
        if !metadata.trained_on(&game_config) {
            bail!(
                "Q-table at {:?} was trained on a different {} config: {}",
                model_path,
                env.name(),
                metadata.game_config
            );
        }

        // A rendering session owns the terminal until close
        if !config.render {
            print_model_info(model_path, &metadata, learner.len());
        }
        let discretizer = metadata.discretizer;
        Self::new(env, learner, discretizer, config)
    }

    /// Play the configured number of episodes and print a summary
    pub fn run(&mut self) -> Result<EvalReport> {
        let mut report = EvalReport::default();

        for episode in 0..self.config.num_episodes {
            let Some(summary) = self.run_episode()? else {
                break;
            };
            if summary.unseen_states > 0 {
                debug!(episode = episode + 1, unseen = summary.unseen_states, "unseen states");
            }
            report.episodes.push(summary);

            if self.should_quit {
                break;
            }
        }

        self.env.close().context("Failed to close renderer")?;

        println!("{}", "=".repeat(60));
        println!("Evaluation - {}", self.env.name());
        println!("{}", "=".repeat(60));
        for (i, summary) in report.episodes.iter().enumerate() {
            println!(
                "Episode {}: reward {:.2}, steps {}, score {}",
                i + 1,
                summary.reward,
                summary.steps,
                summary.score
            );
        }
        println!(
            "Mean reward over {} episodes: {:.2}",
            report.episodes.len(),
            report.mean_reward()
        );
        info!(
            episodes = report.episodes.len(),
            mean_reward = report.mean_reward(),
            mean_steps = report.mean_steps(),
            "evaluation complete"
        );

        Ok(report)
    }

    /// Play one greedy episode; `None` if the viewer quit before it started
    fn run_episode(&mut self) -> Result<Option<EpisodeSummary>> {
        let mut summary = EpisodeSummary {
            reward: 0.0,
            steps: 0,
            score: 0,
            unseen_states: 0,
        };

        let (mut observation, _) = match self.env.reset() {
            Ok(reset) => reset,
            Err(err) => {
                warn!(%err, "reset failed, episode skipped");
                return Ok(Some(summary));
            }
        };

        if self.config.render && self.draw()? == Flow::Quit {
            return Ok(None);
        }

        loop {
            let key = self.discretizer.discretize(&observation);
            let action = match self.learner.greedy_action(&key) {
                Some(action) => action,
                None => {
                    summary.unseen_states += 1;
                    self.rng.gen_range(0..self.env.action_count())
                }
            };

            let step = match self.env.step(action) {
                Ok(step) => step,
                Err(err) => {
                    warn!(step = summary.steps, %err, "episode aborted");
                    break;
                }
            };
            summary.reward += step.reward;
            summary.steps += 1;
            observation = step.observation;

            if self.config.render && self.draw()? == Flow::Quit {
                self.should_quit = true;
                break;
            }

            if step.terminated || step.truncated {
                break;
            }
        }

        summary.score = self.env.score();
        Ok(Some(summary))
    }

    fn draw(&mut self) -> Result<Flow> {
        let flow = self.env.render()?;
        if !self.config.tick_delay.is_zero() {
            std::thread::sleep(self.config.tick_delay);
        }
        Ok(flow)
    }
}

fn print_model_info(model_path: &Path, metadata: &ModelMetadata, states: usize) {
    println!("{}", "=".repeat(60));
    println!("Loaded Q-Table Information");
    println!("{}", "=".repeat(60));
    println!("Model path: {:?}", model_path);
    println!("Game: {}", metadata.game);
    println!("Episodes trained: {}", metadata.episodes_trained);
    println!("Training steps: {}", metadata.training_steps);
    println!("States: {}", states);
    println!("Version: {}", metadata.version);
    println!("{}", "=".repeat(60));
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameConfig;
    use crate::rl::environment::tests::CountingRenderer;
    use crate::rl::{LearnerConfig, SnakeEnvironment, StateKey, save_q_table};
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    fn small_snake() -> (SnakeEnvironment, Discretizer) {
        let mut config = GameConfig::small();
        config.max_steps = 40;
        let discretizer = Discretizer::for_snake(&config);
        (SnakeEnvironment::new(config, 11).unwrap(), discretizer)
    }

    #[test]
    fn test_report_means() {
        let mut report = EvalReport::default();
        assert_eq!(report.mean_reward(), 0.0);

        for (reward, steps) in [(2.0, 10), (4.0, 30)] {
            report.episodes.push(EpisodeSummary {
                reward,
                steps,
                score: 0,
                unseen_states: 0,
            });
        }
        assert!((report.mean_reward() - 3.0).abs() < 1e-5);
        assert!((report.mean_steps() - 20.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_table_plays_random_actions() {
        let (env, discretizer) = small_snake();
        let learner = TabularLearner::new(4, LearnerConfig::default());
        let mut eval = EvalMode::new(env, learner, discretizer, EvalConfig::new(2)).unwrap();

        let report = eval.run().unwrap();
        assert_eq!(report.episodes.len(), 2);
        for summary in &report.episodes {
            assert!(summary.steps > 0 && summary.steps <= 40);
            assert_eq!(summary.unseen_states, summary.steps);
        }
    }

    #[test]
    fn test_greedy_action_from_table() {
        let (mut env, discretizer) = small_snake();
        env.seed(21);
        let (observation, _) = env.reset().unwrap();
        let key: StateKey = discretizer.discretize(&observation);

        let mut learner = TabularLearner::new(4, LearnerConfig::default());
        learner.update_terminal(&key, 2, 5.0);

        // The episode starts from the same state the key came from
        env.seed(21);
        let mut eval = EvalMode::new(env, learner, discretizer, EvalConfig::new(1)).unwrap();
        let summary = eval.run_episode().unwrap().unwrap();
        assert!(summary.unseen_states < summary.steps);
    }

    fn save_for(path: &Path, game: &str, config: &GameConfig) {
        let learner = TabularLearner::new(4, LearnerConfig::default());
        let metadata = ModelMetadata::new(
            game,
            serde_json::to_value(config).unwrap(),
            &learner,
            &Discretizer::for_snake(config),
            0,
            0,
        );
        save_q_table(&learner, &metadata, path).unwrap();
    }

    #[test]
    fn test_from_file_checks_game() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.json");
        let (env, _) = small_snake();
        let config = env.config().clone();

        save_for(&path, "breakout", &config);
        assert!(EvalMode::from_file(env, &path, EvalConfig::new(1)).is_err());

        let (env, _) = small_snake();
        save_for(&path, "snake", &config);
        assert!(EvalMode::from_file(env, &path, EvalConfig::new(1)).is_ok());
    }

    #[test]
    fn test_from_file_rejects_other_board_size() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.json");
        save_for(&path, "snake", &GameConfig::new(20, 20));

        let (env, _) = small_snake();
        let err = EvalMode::from_file(env, &path, EvalConfig::new(1))
            .err()
            .unwrap();
        assert!(err.to_string().contains("different snake config"));

        // Only the step budget differs: still the same game
        let mut config = GameConfig::small();
        config.max_steps = 500;
        save_for(&path, "snake", &config);
        let (env, _) = small_snake();
        assert!(EvalMode::from_file(env, &path, EvalConfig::new(1)).is_ok());
    }

    #[test]
    fn test_render_draws_every_step() {
        let (mut env, discretizer) = small_snake();
        let frames = Rc::new(RefCell::new(0));
        let closed = Rc::new(RefCell::new(false));
        env.attach_renderer(Box::new(CountingRenderer {
            frames: frames.clone(),
            closed: closed.clone(),
        }));

        let learner = TabularLearner::new(4, LearnerConfig::default());
        let mut config = EvalConfig::new(1);
        config.render = true;
        config.tick_delay = Duration::ZERO;

        let mut eval = EvalMode::new(env, learner, discretizer, config).unwrap();
        let report = eval.run().unwrap();

        // One frame after reset plus one per step
        assert_eq!(*frames.borrow(), report.episodes[0].steps + 1);
        assert!(*closed.borrow());
    }
}
