use serde::Serialize;
use tracing::{debug, warn};

use super::environment::{Display, Environment, Observation, Step, decode_action};
use super::observation::{SNAKE_OBSERVATION_SIZE, snake_observation};
use crate::error::EnvError;
use crate::game::{CollisionType, Direction, GameConfig, GameEngine, GameState, Position};
use crate::render::{Flow, Render};

/// Diagnostic record for a snake step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnakeInfo {
    pub head: Position,
    pub food: Position,
    pub length: usize,
    pub direction: Direction,
    pub pending_direction: Direction,
    pub alive: bool,
    /// Squared head-to-food distance
    pub distance: i64,
    pub step: u32,
    pub score: u32,
    pub collision: Option<CollisionType>,
}

/// Snake environment for reinforcement learning
///
/// Wraps the game engine and provides:
/// - 7-value observations (see `snake_observation`)
/// - Discrete action space (4 actions: Up, Down, Left, Right)
/// - Food, death and distance-shaped step rewards
pub struct SnakeEnvironment {
    engine: GameEngine,
    display: Display<GameState>,
}

impl SnakeEnvironment {
    /// Create a new Snake environment
    pub fn new(config: GameConfig, seed: u64) -> Result<Self, EnvError> {
        Ok(Self::from_engine(GameEngine::new(config, seed)?))
    }

    /// Wrap an existing engine, keeping its current state
    pub fn from_engine(engine: GameEngine) -> Self {
        Self {
            engine,
            display: Display::new(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        self.engine.config()
    }

    fn info(&self, collision: Option<CollisionType>) -> SnakeInfo {
        let state = self.engine.state();
        SnakeInfo {
            head: state.snake.head(),
            food: state.food,
            length: state.snake.len(),
            direction: state.snake.direction(),
            pending_direction: state.snake.pending_direction(),
            alive: state.is_alive(),
            distance: state.food_distance(),
            step: state.steps,
            score: state.score,
            collision,
        }
    }

    fn truncated(&self) -> bool {
        self.engine.state().steps >= self.engine.config().max_steps
    }

    /// Step cost plus the normalized decrease in squared food distance
    fn shaped_reward(&self, prev_distance: i64) -> f32 {
        let config = self.engine.config();
        let max_distance = self.engine.arena().max_squared_distance();
        let progress = if max_distance > 0 {
            (prev_distance - self.engine.state().food_distance()) as f64 / max_distance as f64
        } else {
            0.0
        };
        config.step_penalty + config.shaping_coef * progress as f32
    }
}

impl Environment for SnakeEnvironment {
    type State = GameState;
    type Info = SnakeInfo;

    fn name(&self) -> &'static str {
        "snake"
    }

    fn action_count(&self) -> usize {
        Direction::ALL.len()
    }

    fn observation_size(&self) -> usize {
        SNAKE_OBSERVATION_SIZE
    }

    fn game_config(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self.engine.config())
    }

    fn seed(&mut self, seed: u64) {
        self.engine.seed(seed);
    }

    fn reset(&mut self) -> Result<(Observation, SnakeInfo), EnvError> {
        let state = self.engine.reset()?;
        Ok((snake_observation(state), self.info(None)))
    }

    fn step(&mut self, action: usize) -> Result<Step<SnakeInfo>, EnvError> {
        let direction = decode_action(&Direction::ALL, action)?;

        if !self.engine.state().is_alive() {
            debug!(action, "step after episode end");
            return Ok(Step {
                observation: snake_observation(self.engine.state()),
                reward: 0.0,
                terminated: true,
                truncated: self.truncated(),
                info: self.info(None),
            });
        }

        let prev_distance = self.engine.state().food_distance();
        let outcome = self.engine.tick(direction)?;
        let config = self.engine.config();

        let (reward, terminated) = if outcome.consumed {
            (config.food_reward, false)
        } else if !outcome.alive {
            if config.death_ends_episode {
                (config.death_penalty, true)
            } else {
                let penalty = config.death_penalty;
                if let Err(err) = self.engine.respawn_snake() {
                    warn!(%err, "could not respawn snake");
                    return Err(err.into());
                }
                (penalty, false)
            }
        } else {
            (self.shaped_reward(prev_distance), false)
        };

        Ok(Step {
            observation: snake_observation(self.engine.state()),
            reward,
            terminated,
            truncated: self.truncated(),
            info: self.info(outcome.collision),
        })
    }

    fn state(&self) -> &GameState {
        self.engine.state()
    }

    fn score(&self) -> u32 {
        self.engine.state().score
    }

    fn attach_renderer(&mut self, renderer: Box<dyn Render<GameState>>) {
        self.display.attach(renderer);
    }

    fn render(&mut self) -> anyhow::Result<Flow> {
        self.display.draw(self.engine.state())
    }

    fn close(&mut self) -> anyhow::Result<()> {
        self.display.close()
    }
}
